use thiserror::Error;
use tracing::warn;

use super::tile_codec::{Tile, TileCode, TileCodec};

const SECTION_KEYWORDS: [&str; 4] = ["BOARD", "LINK", "SIGN", "NPC"];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LevelParseError {
    #[error("board row tile data too short: expected {expected} characters, got {actual}")]
    RowDataTooShort { expected: usize, actual: usize },
}

/// Where a link drops the player on the far side.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkDest {
    Point { x: f32, y: f32 },
    Aligned { align: String, offset: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelLink {
    pub target: String,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub dest: LinkDest,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelSign {
    pub x: f32,
    pub y: f32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelNpc {
    /// `None` means the file used `-` and the id is auto-assigned.
    pub id: Option<String>,
    pub x: f32,
    pub y: f32,
    pub script: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedLevel {
    pub version: Option<String>,
    pub board: Vec<Vec<Tile>>,
    pub links: Vec<LevelLink>,
    pub signs: Vec<LevelSign>,
    pub npcs: Vec<LevelNpc>,
}

/// Parser for the line-oriented `.nw` level format: a version line followed
/// by `BOARD`, `LINK`, `SIGN`/`SIGNEND` and `NPC`/`NPCEND` sections.
/// Unrecognized directives are skipped so newer files still load.
#[derive(Debug, Default)]
pub struct LevelParser {
    codec: TileCodec,
}

impl LevelParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn codec(&self) -> &TileCodec {
        &self.codec
    }

    /// Decode one board row's concatenated tile codes. A pair that fails to
    /// decode becomes the invalid sentinel so one corrupt tile cannot sink
    /// the row; too little data rejects the whole row.
    pub fn parse_board_row(&self, data: &str, width: usize) -> Result<Vec<Tile>, LevelParseError> {
        let expected = width * 2;
        if data.len() < expected {
            return Err(LevelParseError::RowDataTooShort {
                expected,
                actual: data.len(),
            });
        }
        let mut row = Vec::with_capacity(width);
        for pair in 0..width {
            let bytes = &data.as_bytes()[pair * 2..pair * 2 + 2];
            let tile = match std::str::from_utf8(bytes) {
                Ok(chunk) => TileCode::new(chunk)
                    .and_then(|code| self.codec.decode(code))
                    .unwrap_or_else(|error| {
                        warn!(tile = pair, code = chunk, %error, "board_tile_decode_failed");
                        Tile::invalid()
                    }),
                Err(_) => {
                    warn!(tile = pair, "board_tile_decode_failed");
                    Tile::invalid()
                }
            };
            row.push(tile);
        }
        Ok(row)
    }

    pub fn parse(&self, text: &str) -> ParsedLevel {
        let lines: Vec<&str> = text.lines().collect();
        let mut result = ParsedLevel::default();
        let mut i = 0;

        // The first non-empty line that is not a section keyword is the
        // version identifier.
        while i < lines.len() && lines[i].trim().is_empty() {
            i += 1;
        }
        if i < lines.len() && !starts_with_keyword(lines[i]) {
            result.version = Some(lines[i].trim().to_string());
            i += 1;
        }

        while i < lines.len() {
            let line = lines[i].trim();
            if line.is_empty() {
                i += 1;
                continue;
            }

            if line.starts_with("BOARD") {
                self.parse_board_line(line, &mut result);
                i += 1;
                continue;
            }

            if line.starts_with("LINK") {
                parse_link_line(line, &mut result);
                i += 1;
                continue;
            }

            if line.starts_with("SIGN") && line != "SIGNEND" {
                i = parse_sign_block(&lines, i, &mut result);
                continue;
            }

            if line.starts_with("NPC") && line != "NPCEND" {
                i = parse_npc_block(&lines, i, &mut result);
                continue;
            }

            // Unrecognized directives are skipped without error.
            i += 1;
        }

        result
    }

    fn parse_board_line(&self, line: &str, result: &mut ParsedLevel) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 6 {
            warn!(line, "invalid_board_line");
            return;
        }
        let (Ok(row_index), Ok(width)) = (tokens[2].parse::<usize>(), tokens[3].parse::<usize>())
        else {
            warn!(line, "invalid_board_line");
            return;
        };
        // Tokens past the header are joined to tolerate stray spaces in the
        // tile data.
        let data: String = tokens[5..].concat();
        match self.parse_board_row(&data, width) {
            Ok(row) => {
                if result.board.len() <= row_index {
                    result.board.resize(row_index + 1, Vec::new());
                }
                result.board[row_index] = row;
            }
            Err(error) => {
                warn!(row = row_index, %error, "board_row_rejected");
            }
        }
    }
}

fn starts_with_keyword(line: &str) -> bool {
    SECTION_KEYWORDS
        .iter()
        .any(|keyword| line.starts_with(keyword))
}

fn parse_link_line(line: &str, result: &mut ParsedLevel) {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 8 {
        warn!(line, "invalid_link_line");
        return;
    }
    let coords: Vec<f32> = tokens[2..6]
        .iter()
        .filter_map(|token| token.parse().ok())
        .collect();
    if coords.len() != 4 {
        warn!(line, "invalid_link_line");
        return;
    }
    // The trailing pair is either a destination point or an alignment rule:
    // whichever way the sixth token parses decides.
    let dest = match tokens[6].parse::<f32>() {
        Ok(x) => LinkDest::Point {
            x,
            y: tokens[7].parse().unwrap_or(0.0),
        },
        Err(_) => LinkDest::Aligned {
            align: tokens[6].to_string(),
            offset: tokens[7].parse().unwrap_or(0.0),
        },
    };
    result.links.push(LevelLink {
        target: tokens[1].to_string(),
        x: coords[0],
        y: coords[1],
        w: coords[2],
        h: coords[3],
        dest,
    });
}

fn parse_sign_block(lines: &[&str], start: usize, result: &mut ParsedLevel) -> usize {
    let tokens: Vec<&str> = lines[start].trim().split_whitespace().collect();
    if tokens.len() < 3 {
        warn!(line = lines[start], "invalid_sign_header");
        return start + 1;
    }
    let x = tokens[1].parse().unwrap_or(0.0);
    let y = tokens[2].parse().unwrap_or(0.0);

    let mut i = start + 1;
    let mut text_lines = Vec::new();
    while i < lines.len() && lines[i].trim() != "SIGNEND" {
        text_lines.push(lines[i]);
        i += 1;
    }
    if i >= lines.len() {
        // Unterminated block: drop this sign, keep parsing the file.
        warn!(x, y, "sign_block_unterminated");
        return i;
    }
    i += 1; // consume SIGNEND

    result.signs.push(LevelSign {
        x,
        y,
        text: text_lines.join("\n"),
    });
    i
}

fn parse_npc_block(lines: &[&str], start: usize, result: &mut ParsedLevel) -> usize {
    let tokens: Vec<&str> = lines[start].trim().split_whitespace().collect();
    if tokens.len() < 4 {
        warn!(line = lines[start], "invalid_npc_header");
        return start + 1;
    }
    let id = (tokens[1] != "-").then(|| tokens[1].to_string());
    let x = tokens[2].parse().unwrap_or(0.0);
    let y = tokens[3].parse().unwrap_or(0.0);

    let mut i = start + 1;
    let mut script_lines = Vec::new();
    while i < lines.len() && lines[i].trim() != "NPCEND" {
        script_lines.push(lines[i]);
        i += 1;
    }
    if i >= lines.len() {
        warn!(x, y, "npc_block_unterminated");
        return i;
    }
    i += 1; // consume NPCEND

    result.npcs.push(LevelNpc {
        id,
        x,
        y,
        script: script_lines.join("\n"),
    });
    i
}
