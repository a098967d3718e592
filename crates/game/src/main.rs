use tracing::error;

mod app;

fn main() {
    let wiring = match app::build_app() {
        Ok(wiring) => wiring,
        Err(err) => {
            // Tracing may not be initialized if startup failed early.
            eprintln!("startup failed: {err}");
            std::process::exit(1);
        }
    };
    if let Err(err) = engine::run_app(wiring.config, wiring.session) {
        error!(%err, "event_loop_failed");
        std::process::exit(1);
    }
}
