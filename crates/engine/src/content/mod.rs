pub mod ani_format;
pub mod gallery;
pub mod level_format;
pub mod store;
pub mod tile_codec;
pub mod tiledefs_format;

pub use ani_format::{parse_ani, AniDef, AniFrame, AniLayer, AniOption, AniSprite, SpritePlacement};
pub use gallery::Gallery;
pub use level_format::{
    LevelLink, LevelNpc, LevelParseError, LevelParser, LevelSign, LinkDest, ParsedLevel,
};
pub use store::{FileKind, FileStore, ResourceError, DEFAULT_CACHE_TTL};
pub use tile_codec::{Tile, TileCode, TileCodeError, TileCodec, INVALID_TILESET};
pub use tiledefs_format::{parse_tiledefs, ParsedTiledefs};
