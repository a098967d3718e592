use std::fmt;

use thiserror::Error;

/// Tiles per block row before the scanline index wraps into the next
/// 16-column block.
pub const TILE_WRAP: u32 = 16;
/// Tileset image geometry: 2048x512 px at 16 px tiles.
pub const TILESET_COLUMNS: u32 = 128;
pub const TILESET_ROWS: u32 = 32;
/// Tiles per wrapping block (16 columns x 32 rows).
pub const TILE_BLOCK: u32 = TILESET_ROWS * TILE_WRAP;
pub const TOTAL_TILES: u32 = TILESET_COLUMNS * TILESET_ROWS;

const DEFAULT_CHARSET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Sentinel tileset index marking a tile that failed to decode.
pub const INVALID_TILESET: u8 = u8::MAX;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TileCodeError {
    #[error("tile code must be exactly 2 ASCII characters, got {0:?}")]
    BadLength(String),
    #[error("tile code character {character:?} is not in the tileset alphabet")]
    InvalidCharacter { character: char },
    #[error("tile coordinates ({tx}, {ty}) fall outside the {TILESET_COLUMNS}x{TILESET_ROWS} tileset grid")]
    OutOfBounds { tx: u32, ty: u32 },
}

/// A 2-character encoded tile reference. Validated for shape at
/// construction; alphabet membership is checked when decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCode([u8; 2]);

impl TileCode {
    pub fn new(code: &str) -> Result<Self, TileCodeError> {
        let bytes = code.as_bytes();
        if bytes.len() != 2 || !code.chars().all(|c| c.is_ascii_graphic()) {
            return Err(TileCodeError::BadLength(code.to_string()));
        }
        Ok(Self([bytes[0], bytes[1]]))
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("??")
    }
}

impl fmt::Display for TileCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decoded board cell. Identity for compositing is
/// `(tileset, tx, ty)`; `code` is the encoded form kept for type lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub tileset: u8,
    pub tx: u8,
    pub ty: u8,
    pub code: TileCode,
}

impl Tile {
    /// Sentinel standing in for a board pair that failed to decode.
    pub fn invalid() -> Self {
        Self {
            tileset: INVALID_TILESET,
            tx: 0,
            ty: 0,
            code: TileCode(*b"??"),
        }
    }

    pub fn is_invalid(&self) -> bool {
        self.tileset == INVALID_TILESET
    }

    pub fn identity(&self) -> (u8, u8, u8) {
        (self.tileset, self.tx, self.ty)
    }
}

/// Encodes and decodes tileset-relative (x, y) coordinates to and from
/// 2-character base-64 codes.
///
/// The tileset is read as repeating 16-column blocks laid side by side:
/// a tile's global scanline index is `block * TILE_BLOCK + offset` where
/// `offset = local_y * 16 + local_x`. The 12-bit index is spelled as two
/// alphabet characters, high digit first.
#[derive(Debug, Clone)]
pub struct TileCodec {
    charset: [u8; 64],
}

impl Default for TileCodec {
    fn default() -> Self {
        Self {
            charset: *DEFAULT_CHARSET,
        }
    }
}

impl TileCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Custom decode alphabet, for tilesets authored with a nonstandard
    /// character order.
    pub fn with_charset(charset: [u8; 64]) -> Self {
        Self { charset }
    }

    pub fn encode(&self, tx: u32, ty: u32) -> Result<TileCode, TileCodeError> {
        if tx >= TILESET_COLUMNS || ty >= TILESET_ROWS {
            return Err(TileCodeError::OutOfBounds { tx, ty });
        }
        let block = tx / TILE_WRAP;
        let local_x = tx % TILE_WRAP;
        let offset = ty * TILE_WRAP + local_x;
        let index = block * TILE_BLOCK + offset;
        Ok(TileCode([
            self.charset[(index / 64) as usize],
            self.charset[(index % 64) as usize],
        ]))
    }

    pub fn decode(&self, code: TileCode) -> Result<Tile, TileCodeError> {
        let high = self.digit(code.0[0])?;
        let low = self.digit(code.0[1])?;
        let index = high * 64 + low;
        let block = index / TILE_BLOCK;
        let offset = index % TILE_BLOCK;
        let tx = (offset % TILE_WRAP) + block * TILE_WRAP;
        let ty = offset / TILE_WRAP;
        Ok(Tile {
            tileset: 0,
            tx: tx as u8,
            ty: ty as u8,
            code,
        })
    }

    pub fn decode_str(&self, code: &str) -> Result<Tile, TileCodeError> {
        self.decode(TileCode::new(code)?)
    }

    fn digit(&self, byte: u8) -> Result<u32, TileCodeError> {
        self.charset
            .iter()
            .position(|&c| c == byte)
            .map(|p| p as u32)
            .ok_or(TileCodeError::InvalidCharacter {
                character: byte as char,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tile_encodes_to_double_a() {
        let codec = TileCodec::new();
        let code = codec.encode(0, 0).expect("encode");
        assert_eq!(code.as_str(), "AA");
    }

    #[test]
    fn block_boundary_jumps_the_scanline_index() {
        let codec = TileCodec::new();
        // Tile (16, 0) starts the second 16-column block: index 512 = 8*64.
        let code = codec.encode(16, 0).expect("encode");
        assert_eq!(code.as_str(), "IA");
    }

    #[test]
    fn decode_is_the_exact_inverse_of_encode() {
        let codec = TileCodec::new();
        for ty in 0..TILESET_ROWS {
            for tx in 0..TILESET_COLUMNS {
                let code = codec.encode(tx, ty).expect("encode");
                let tile = codec.decode(code).expect("decode");
                assert_eq!((tile.tx as u32, tile.ty as u32), (tx, ty), "code {code}");
            }
        }
    }

    #[test]
    fn decode_rejects_characters_outside_the_alphabet() {
        let codec = TileCodec::new();
        let error = codec.decode_str("!A").expect_err("must fail");
        assert_eq!(
            error,
            TileCodeError::InvalidCharacter { character: '!' }
        );
    }

    #[test]
    fn encode_rejects_out_of_bounds_coordinates() {
        let codec = TileCodec::new();
        assert!(matches!(
            codec.encode(TILESET_COLUMNS, 0),
            Err(TileCodeError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn tile_code_rejects_wrong_lengths() {
        assert!(TileCode::new("A").is_err());
        assert!(TileCode::new("AAA").is_err());
        assert!(TileCode::new("AA").is_ok());
    }

    #[test]
    fn invalid_sentinel_is_marked() {
        assert!(Tile::invalid().is_invalid());
        let codec = TileCodec::new();
        assert!(!codec.decode_str("zz").expect("decode").is_invalid());
    }
}
