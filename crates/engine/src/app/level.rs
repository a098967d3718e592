use std::collections::{BTreeMap, HashSet};

use thiserror::Error;
use tracing::warn;

use crate::content::{Tile, TileCodec};
use crate::GameConfig;

use super::rendering::PixelSurface;
use super::tiledefs::TileDefs;

/// A tileset: the source image levels stamp from plus the tile definitions
/// giving codes their types.
#[derive(Debug, Clone)]
pub struct Tileset {
    name: String,
    image: PixelSurface,
    tiledefs: TileDefs,
    codec: TileCodec,
}

impl Tileset {
    pub fn new(name: &str, image: PixelSurface, tiledefs: TileDefs) -> Self {
        Self {
            name: name.to_string(),
            image,
            tiledefs,
            codec: TileCodec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image(&self) -> &PixelSurface {
        &self.image
    }

    pub fn tiledefs(&self) -> &TileDefs {
        &self.tiledefs
    }

    pub fn codec(&self) -> &TileCodec {
        &self.codec
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelError {
    #[error("level board has {actual} rows, expected {expected}")]
    BadRowCount { expected: usize, actual: usize },
    #[error("level board row {row} has {actual} tiles, expected {expected}")]
    BadRowWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkDecodeError {
    #[error("encoded matrix row length {0} is not a multiple of 6")]
    BadMatrixLength(usize),
    #[error("encoded position list length {0} is not a multiple of 4")]
    BadPositionLength(usize),
    #[error("invalid hex digits in encoded chunk: {0:?}")]
    BadHex(String),
}

/// Tile identity as stored in a chunk pattern key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePattern {
    pub tileset: u8,
    pub tx: u8,
    pub ty: u8,
}

/// Encode a tile matrix into a pattern key: each tile is six hex digits
/// (tileset, source x, source y), rows joined with `_`.
pub fn encode_matrix_id(matrix: &[Vec<Tile>]) -> String {
    matrix
        .iter()
        .map(|row| {
            row.iter()
                .map(|tile| format!("{:02x}{:02x}{:02x}", tile.tileset, tile.tx, tile.ty))
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("_")
}

pub fn decode_matrix_id(encoded: &str) -> Result<Vec<Vec<TilePattern>>, ChunkDecodeError> {
    encoded
        .split('_')
        .map(|row| {
            if row.len() % 6 != 0 || row.is_empty() {
                return Err(ChunkDecodeError::BadMatrixLength(row.len()));
            }
            row.as_bytes()
                .chunks(6)
                .map(|chunk| {
                    let tileset = hex_byte(&chunk[0..2])?;
                    let tx = hex_byte(&chunk[2..4])?;
                    let ty = hex_byte(&chunk[4..6])?;
                    Ok(TilePattern { tileset, tx, ty })
                })
                .collect()
        })
        .collect()
}

/// Pack a board position as two zero-padded hex bytes, x then y.
pub fn encode_position(x: u8, y: u8) -> String {
    format!("{x:02x}{y:02x}")
}

/// Split a concatenated position list into 4-character groups and decode.
pub fn decode_positions(encoded: &str) -> Result<Vec<(u8, u8)>, ChunkDecodeError> {
    if encoded.len() % 4 != 0 {
        return Err(ChunkDecodeError::BadPositionLength(encoded.len()));
    }
    encoded
        .as_bytes()
        .chunks(4)
        .map(|chunk| Ok((hex_byte(&chunk[0..2])?, hex_byte(&chunk[2..4])?)))
        .collect()
}

fn hex_byte(digits: &[u8]) -> Result<u8, ChunkDecodeError> {
    std::str::from_utf8(digits)
        .ok()
        .and_then(|s| u8::from_str_radix(s, 16).ok())
        .ok_or_else(|| {
            ChunkDecodeError::BadHex(String::from_utf8_lossy(digits).into_owned())
        })
}

/// Group a board's cells by tile identity: scan row-major, and for each
/// unvisited cell sweep the whole grid for identical tiles, packing every
/// match's position under one pattern key. The result is a pure function of
/// the board, with deterministic key order.
///
/// Quadratic in cell count in this direct form; a 64x64 board is 4096 cells,
/// which stays cheap, and the sweep happens once per level render.
pub fn encode_chunks(board: &[Vec<Tile>]) -> BTreeMap<String, String> {
    let mut chunks = BTreeMap::new();
    if board.is_empty() {
        return chunks;
    }
    let height = board.len();
    let width = board[0].len();
    let mut visited = vec![false; height * width];

    for y in 0..height {
        for x in 0..width {
            if visited[y * width + x] {
                continue;
            }
            // Each unvisited cell seeds a 1x1 pattern.
            let seed = board[y][x];
            let matrix_id = encode_matrix_id(&[vec![seed]]);
            let positions = chunks.entry(matrix_id).or_insert_with(String::new);
            for (yy, row) in board.iter().enumerate() {
                for (xx, tile) in row.iter().enumerate() {
                    if !visited[yy * width + xx] && tile.identity() == seed.identity() {
                        positions.push_str(&encode_position(xx as u8, yy as u8));
                        visited[yy * width + xx] = true;
                    }
                }
            }
        }
    }
    chunks
}

/// One level of the overworld: a fixed square board of tiles, the per-cell
/// type sets derived from the tileset's definitions, and the bitmap the
/// board composites into.
#[derive(Debug, Clone)]
pub struct Level {
    name: String,
    board: Vec<Vec<Tile>>,
    tile_types: Vec<HashSet<String>>,
    bitmap: PixelSurface,
    stamp: PixelSurface,
    position: (u32, u32),
    rendered: bool,
    level_grid: u32,
}

impl Level {
    pub fn new(name: &str, board: Vec<Vec<Tile>>, config: &GameConfig) -> Result<Self, LevelError> {
        let expected = config.level_grid as usize;
        if board.len() != expected {
            return Err(LevelError::BadRowCount {
                expected,
                actual: board.len(),
            });
        }
        for (row, tiles) in board.iter().enumerate() {
            if tiles.len() != expected {
                return Err(LevelError::BadRowWidth {
                    row,
                    expected,
                    actual: tiles.len(),
                });
            }
        }
        let span = config.level_span();
        Ok(Self {
            name: name.to_string(),
            board,
            tile_types: Vec::new(),
            bitmap: PixelSurface::new(span, span),
            stamp: PixelSurface::new(config.tile_grid, config.tile_grid),
            position: (0, 0),
            rendered: false,
            level_grid: config.level_grid,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> (u32, u32) {
        self.position
    }

    pub(crate) fn set_position(&mut self, x: u32, y: u32) {
        self.position = (x, y);
    }

    pub fn bitmap(&self) -> &PixelSurface {
        &self.bitmap
    }

    pub fn is_rendered(&self) -> bool {
        self.rendered
    }

    pub fn board(&self) -> &[Vec<Tile>] {
        &self.board
    }

    /// Composite the board: derive per-cell type sets, group cells into
    /// chunks, and stamp each unique pattern onto the bitmap at every
    /// position it occupies. Runs once per level per session.
    pub fn render(&mut self, config: &GameConfig, tileset: &Tileset) {
        self.build_tile_types(tileset);
        let chunks = encode_chunks(&self.board);
        self.blit(&chunks, config, tileset);
        self.rendered = true;
    }

    fn build_tile_types(&mut self, tileset: &Tileset) {
        let grid = self.level_grid as usize;
        let mut types = Vec::with_capacity(grid * grid);
        for row in &self.board {
            for tile in row {
                let cell: HashSet<String> = tileset
                    .tiledefs()
                    .types_by_code(tile.code)
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                types.push(cell);
            }
        }
        self.tile_types = types;
    }

    /// Stamp-render the chunk map onto the level bitmap: each unique
    /// pattern is rasterized once onto the scratch stamp, then copied to
    /// every position it occurs at.
    fn blit(&mut self, chunks: &BTreeMap<String, String>, config: &GameConfig, tileset: &Tileset) {
        let units = config.tile_grid;
        for (encoded_matrix, encoded_positions) in chunks {
            let matrix = match decode_matrix_id(encoded_matrix) {
                Ok(matrix) => matrix,
                Err(error) => {
                    warn!(level = %self.name, %error, "chunk_matrix_undecodable");
                    continue;
                }
            };
            let positions = match decode_positions(encoded_positions) {
                Ok(positions) => positions,
                Err(error) => {
                    warn!(level = %self.name, %error, "chunk_positions_undecodable");
                    continue;
                }
            };
            deboss(&mut self.stamp, &matrix, tileset, units);
            for (x, y) in positions {
                self.bitmap.copy_from(
                    &self.stamp,
                    0,
                    0,
                    self.stamp.width(),
                    self.stamp.height(),
                    (x as u32 * units) as i32,
                    (y as u32 * units) as i32,
                );
            }
        }
    }

    pub fn tile_types_at(&self, x: i32, y: i32) -> Option<&HashSet<String>> {
        if x < 0 || y < 0 || x >= self.level_grid as i32 || y >= self.level_grid as i32 {
            return None;
        }
        self.tile_types
            .get((y as u32 * self.level_grid + x as u32) as usize)
    }

    /// Out-of-range cells report no types, so probes fail open at edges;
    /// boundary handoff decides whether an edge actually blocks.
    pub fn tile_has_type(&self, x: i32, y: i32, type_name: &str) -> bool {
        self.tile_types_at(x, y)
            .is_some_and(|types| types.contains(type_name))
    }
}

/// Rasterize one tile pattern onto the scratch stamp at tile resolution.
fn deboss(stamp: &mut PixelSurface, matrix: &[Vec<TilePattern>], tileset: &Tileset, units: u32) {
    let height = matrix.len() as u32;
    let width = matrix.first().map(|row| row.len()).unwrap_or(0) as u32;
    stamp.resize(width * units, height * units);
    for (ly, row) in matrix.iter().enumerate() {
        for (lx, tile) in row.iter().enumerate() {
            if tile.tileset == crate::content::INVALID_TILESET {
                continue; // sentinel tiles leave the cell at clear color
            }
            stamp.copy_from(
                tileset.image(),
                (tile.tx as u32 * units) as i32,
                (tile.ty as u32 * units) as i32,
                units,
                units,
                (lx as u32 * units) as i32,
                (ly as u32 * units) as i32,
            );
        }
    }
}
