use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub mod app;
pub mod content;

pub use app::{
    run_app, AnchorArena, AnchorError, AnchorId, Animator, AppError, Camera, InputAction,
    InputSnapshot, Level, LevelError, LogSoundboard, LoopConfig, LoopMetricsSnapshot,
    MetricsHandle, Overworld, OverworldError, PixelSurface, PlacedPosition, Rect, Renderer,
    Session, Soundboard, TickEvent, TickRoster, Ticker, TileDefs, Tileset, Vec2, Viewport,
    VisibleSection,
};
pub use content::{
    parse_ani, parse_tiledefs, AniDef, FileKind, FileStore, Gallery, LevelParseError, LevelParser,
    ParsedLevel, ResourceError, Tile, TileCode, TileCodeError, TileCodec,
};

pub const ROOT_ENV_VAR: &str = "OVERGROVE_ROOT";

/// Fixed world geometry. Every spatial unit in the engine derives from these
/// two numbers: tiles are `tile_grid` pixels square, levels are `level_grid`
/// tiles square.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub tile_grid: u32,
    pub level_grid: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tile_grid: 16,
            level_grid: 64,
        }
    }
}

impl GameConfig {
    /// Side length of one level in pixels.
    pub fn level_span(&self) -> u32 {
        self.tile_grid * self.level_grid
    }
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub asset_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "OVERGROVE_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and an assets/ directory."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and an assets/ directory.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/overgrove\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    let asset_dir = root.join("assets");
    Ok(AppPaths { root, asset_dir })
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let raw = PathBuf::from(value);
            let normalized = normalize_path(&raw);
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            for candidate in exe_dir.ancestors() {
                if is_repo_marker(candidate) {
                    return Ok(normalize_path(candidate));
                }
            }

            Err(StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_repo_marker(path: &Path) -> bool {
    path.join("Cargo.toml").is_file() && path.join("assets").is_dir()
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_marker_requires_cargo_toml() {
        let cwd = env::current_dir().expect("cwd");
        assert!(!is_repo_marker(&cwd.join("definitely_not_a_marker")));
    }

    #[test]
    fn level_span_is_tile_times_level_grid() {
        let config = GameConfig::default();
        assert_eq!(config.level_span(), 1024);
    }
}
