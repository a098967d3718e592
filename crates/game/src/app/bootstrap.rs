use std::fs;
use std::path::{Path, PathBuf};

use engine::{
    parse_ani, parse_tiledefs, resolve_app_paths, AnchorArena, Animator, AppPaths, Camera,
    FileKind, FileStore, Gallery, GameConfig, Level, LevelParser, LogSoundboard, LoopConfig,
    Overworld, StartupError, TileDefs, Tileset, Viewport,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::gameplay::player::Player;
use super::session::{PlaySession, PlayState};

const CONFIG_FILE: &str = "overgrove.json";
const GEAR_ANIS: [&str; 3] = ["idle", "walk", "sword"];

pub struct AppWiring {
    pub config: LoopConfig,
    pub session: Box<PlaySession>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to read config {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: serde_path_to_error::Error<serde_json::Error>,
    },
    #[error("no level could be loaded; the overworld is empty")]
    EmptyWorld,
}

/// Optional `overgrove.json` at the project root overriding the defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct GameFileConfig {
    window_title: String,
    tileset: String,
    world: Vec<Vec<Option<String>>>,
    start_level: String,
    start_x: f32,
    start_y: f32,
    camera_padding: f32,
    target_tps: u32,
    head: String,
    body: String,
    sword: String,
    game: GameConfig,
}

impl Default for GameFileConfig {
    fn default() -> Self {
        Self {
            window_title: "Overgrove".to_string(),
            tileset: "pics1".to_string(),
            world: vec![
                row(["level39", "level16", "level18"]),
                row(["level14", "level13", "level17"]),
                row(["level38", "level9", "level10"]),
            ],
            start_level: "level13".to_string(),
            start_x: 30.0,
            start_y: 30.0,
            camera_padding: 64.0,
            target_tps: 60,
            head: "head17".to_string(),
            body: "body".to_string(),
            sword: "sword1".to_string(),
            game: GameConfig::default(),
        }
    }
}

fn row(names: [&str; 3]) -> Vec<Option<String>> {
    names.iter().map(|name| Some(name.to_string())).collect()
}

pub fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Overgrove Startup ===");

    let paths = resolve_app_paths()?;
    info!(
        root = %paths.root.display(),
        asset_dir = %paths.asset_dir.display(),
        "startup"
    );
    let file_config = load_file_config(&paths.root)?;

    let loop_config = LoopConfig {
        window_title: file_config.window_title.clone(),
        target_tps: file_config.target_tps,
        ..LoopConfig::default()
    };
    let viewport = Viewport {
        width: loop_config.viewport_width,
        height: loop_config.viewport_height,
    };
    let session = build_session(&paths, &file_config, viewport)?;

    Ok(AppWiring {
        config: loop_config,
        session: Box::new(session),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn load_file_config(root: &Path) -> Result<GameFileConfig, BootstrapError> {
    let path = root.join(CONFIG_FILE);
    if !path.is_file() {
        info!(path = %path.display(), "config_file_absent_using_defaults");
        return Ok(GameFileConfig::default());
    }
    let raw = fs::read_to_string(&path).map_err(|source| BootstrapError::ReadConfig {
        path: path.clone(),
        source,
    })?;
    let mut deserializer = serde_json::Deserializer::from_str(&raw);
    serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|source| BootstrapError::ParseConfig { path, source })
}

fn build_session(
    paths: &AppPaths,
    file_config: &GameFileConfig,
    viewport: Viewport,
) -> Result<PlaySession, BootstrapError> {
    let config = file_config.game;
    let mut files = FileStore::new(&paths.asset_dir);
    let mut gallery = Gallery::new(paths.asset_dir.join("images"));
    gallery.register_category("TILESET", "tiles");
    gallery.register_category("SPRITES", "sprites");
    gallery.register_category("HEAD", "heads");
    gallery.register_category("BODY", "bodies");
    gallery.register_category("SWORD", "swords");

    // Tileset: image plus tile definitions. Either half may be missing;
    // the session still starts with placeholder pixels / no types.
    let tiledefs = match files.load_text(FileKind::Tiledefs, &file_config.tileset) {
        Ok(text) => TileDefs::from_parsed(&parse_tiledefs(&text)),
        Err(error) => {
            warn!(tileset = file_config.tileset.as_str(), %error, "tiledefs_unavailable");
            TileDefs::new()
        }
    };
    let image = gallery.image("TILESET", &file_config.tileset).clone();
    let tileset = Tileset::new(&file_config.tileset, image, tiledefs);

    // Levels: parse, composite, and place each named cell of the world
    // grid. A level that fails to load leaves a hole, not a dead session.
    let parser = LevelParser::new();
    let mut overworld = Overworld::new("map1");
    for (y, names) in file_config.world.iter().enumerate() {
        for (x, name) in names.iter().enumerate() {
            let Some(name) = name else {
                continue;
            };
            match load_level(&mut files, &parser, name, &config) {
                Some(mut level) => {
                    level.render(&config, &tileset);
                    overworld.add_level(level, x as u32, y as u32);
                }
                None => warn!(level = name.as_str(), "level_unavailable"),
            }
        }
    }
    if overworld.width() == 0 {
        return Err(BootstrapError::EmptyWorld);
    }

    // Player gear animations.
    let mut animator = Animator::new();
    for name in GEAR_ANIS {
        match files.load_text(FileKind::Ani, name) {
            Ok(text) => animator.add(name, parse_ani(name, &text)),
            Err(error) => warn!(ani = name, %error, "ani_unavailable"),
        }
    }

    let mut arena = AnchorArena::new();
    let start_level = if overworld.level(&file_config.start_level).is_some() {
        file_config.start_level.clone()
    } else {
        // Fall back to any placed level rather than refusing to start.
        let fallback = first_level_name(&overworld).ok_or(BootstrapError::EmptyWorld)?;
        warn!(
            requested = file_config.start_level.as_str(),
            fallback = fallback.as_str(),
            "start_level_missing"
        );
        fallback
    };
    let mut player = Player::new(
        &mut arena,
        &config,
        &start_level,
        file_config.start_x,
        file_config.start_y,
    );
    player.skin("HEAD", &file_config.head);
    player.skin("BODY", &file_config.body);
    player.skin("SWORD", &file_config.sword);
    animator.set_active("idle", player.dir().index());

    let mut camera = Camera::new(file_config.camera_padding);
    camera.update(
        &overworld,
        player.level(),
        arena.position(player.anchor),
        viewport,
        &config,
    );

    info!(
        world_width = overworld.width(),
        world_height = overworld.height(),
        start_level = start_level.as_str(),
        "session_built"
    );

    Ok(PlaySession::new(PlayState {
        config,
        viewport,
        camera,
        overworld,
        tileset,
        arena,
        player,
        animator,
        gallery,
        soundboard: Box::new(LogSoundboard),
        input: engine::InputSnapshot::empty(),
        quit: false,
    }))
}

fn load_level(
    files: &mut FileStore,
    parser: &LevelParser,
    name: &str,
    config: &GameConfig,
) -> Option<Level> {
    let text = match files.load_text(FileKind::Level, name) {
        Ok(text) => text,
        Err(error) => {
            warn!(level = name, %error, "level_load_failed");
            return None;
        }
    };
    let parsed = parser.parse(&text);
    match Level::new(name, parsed.board, config) {
        Ok(level) => Some(level),
        Err(error) => {
            warn!(level = name, %error, "level_board_malformed");
            None
        }
    }
}

fn first_level_name(overworld: &Overworld) -> Option<String> {
    for y in 0..overworld.height() as i32 {
        for x in 0..overworld.width() as i32 {
            if let Some(level) = overworld.level_at(x, y) {
                return Some(level.name().to_string());
            }
        }
    }
    None
}
