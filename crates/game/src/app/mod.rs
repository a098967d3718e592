mod bootstrap;
pub mod gameplay;
mod session;

pub use bootstrap::{build_app, AppWiring, BootstrapError};
pub use session::{PlaySession, PlayState};
