use std::collections::BTreeMap;

use tracing::warn;

const ANI_KEYWORDS: [&str; 6] = ["OPTS", "OPTSEND", "ANI", "ANIEND", "SPRITE", "ATTR"];

#[derive(Debug, Clone, PartialEq)]
pub enum AniOption {
    Flag,
    Value(String),
}

/// One reusable sprite cutout: a source rectangle within the image that the
/// sprite's `group` resolves to (SPRITES, HEAD, BODY, SWORD, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct AniSprite {
    pub id: u32,
    pub group: String,
    pub sx: i32,
    pub sy: i32,
    pub width: u32,
    pub height: u32,
    pub label: String,
}

/// A sprite placed at an integer offset within a frame layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpritePlacement {
    pub sprite: u32,
    pub dx: i32,
    pub dy: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AniLayer {
    pub placements: Vec<SpritePlacement>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AniFrame {
    pub layers: Vec<AniLayer>,
}

/// A parsed animation definition: sprite table, frame sequence, and the
/// OPTS block (flags plus key-value settings).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AniDef {
    pub name: String,
    pub sprites: Vec<AniSprite>,
    pub frames: Vec<AniFrame>,
    pub options: BTreeMap<String, AniOption>,
    pub groups: Vec<String>,
}

impl AniDef {
    pub fn is_flag_set(&self, name: &str) -> bool {
        matches!(self.options.get(name), Some(AniOption::Flag))
    }

    pub fn option_value(&self, name: &str) -> Option<&str> {
        match self.options.get(name) {
            Some(AniOption::Value(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Continuous anis keep cycling while active (walk); stances hold.
    pub fn is_continuous(&self) -> bool {
        self.is_flag_set("CONTINUOUS") || self.is_flag_set("LOOP")
    }

    pub fn sprite(&self, id: u32) -> Option<&AniSprite> {
        self.sprites.iter().find(|sprite| sprite.id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    None,
    Opts,
    Ani,
}

/// Parses the animation definition text format: an `OPTS`/`OPTSEND` block,
/// `SPRITE` table lines, and an `ANI`/`ANIEND` block of blank-line-separated
/// frames where each line is one layer of comma-separated
/// `spriteId x y` placements.
pub fn parse_ani(name: &str, text: &str) -> AniDef {
    let mut def = AniDef {
        name: name.to_string(),
        ..AniDef::default()
    };
    let mut region = Region::None;
    let mut current_frame: Vec<String> = Vec::new();

    for raw in text.lines() {
        let line = raw.trim();

        if line.starts_with("OPTS") && region != Region::Opts {
            region = Region::Opts;
        } else if line.starts_with("OPTSEND") && region == Region::Opts {
            region = Region::None;
        } else if line.starts_with("ANI") && region != Region::Ani {
            region = Region::Ani;
        } else if line.starts_with("ANIEND") && region == Region::Ani {
            flush_frame(&mut current_frame, &mut def);
            region = Region::None;
        } else if line.starts_with("SPRITE") {
            if let Some(sprite) = parse_sprite_line(line) {
                if !def.groups.contains(&sprite.group) {
                    def.groups.push(sprite.group.clone());
                }
                def.sprites.push(sprite);
            }
        } else if region == Region::Opts {
            parse_opts_line(line, &mut def.options);
        } else if region == Region::Ani {
            if line.is_empty() {
                flush_frame(&mut current_frame, &mut def);
            } else {
                current_frame.push(line.to_string());
            }
        }
    }
    flush_frame(&mut current_frame, &mut def);

    def
}

fn flush_frame(current_frame: &mut Vec<String>, def: &mut AniDef) {
    if current_frame.is_empty() {
        return;
    }
    let mut frame = AniFrame::default();
    for line in current_frame.drain(..) {
        let mut layer = AniLayer::default();
        for part in line.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let fields: Vec<i32> = part
                .split_whitespace()
                .filter_map(|field| field.parse().ok())
                .collect();
            let [sprite, dx, dy] = fields[..] else {
                warn!(placement = part, "ani_placement_malformed");
                continue;
            };
            if sprite < 0 {
                warn!(placement = part, "ani_placement_malformed");
                continue;
            }
            layer.placements.push(SpritePlacement {
                sprite: sprite as u32,
                dx,
                dy,
            });
        }
        frame.layers.push(layer);
    }
    def.frames.push(frame);
}

fn parse_sprite_line(line: &str) -> Option<AniSprite> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 7 {
        warn!(line, "ani_sprite_malformed");
        return None;
    }
    let numbers: Vec<i32> = [parts[1], parts[3], parts[4], parts[5], parts[6]]
        .iter()
        .filter_map(|field| field.parse().ok())
        .collect();
    let [id, sx, sy, width, height] = numbers[..] else {
        warn!(line, "ani_sprite_malformed");
        return None;
    };
    if id < 0 || width < 0 || height < 0 {
        warn!(line, "ani_sprite_malformed");
        return None;
    }
    Some(AniSprite {
        id: id as u32,
        group: parts[2].to_string(),
        sx,
        sy,
        width: width as u32,
        height: height as u32,
        label: parts[7..].join(" "),
    })
}

fn parse_opts_line(line: &str, options: &mut BTreeMap<String, AniOption>) {
    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts[..] {
        [] => {}
        _ if ANI_KEYWORDS.contains(&parts[0]) => {
            warn!(line, "ani_option_shadows_keyword");
        }
        [flag] => {
            options.insert(flag.to_string(), AniOption::Flag);
        }
        [key, value] => {
            options.insert(key.to_string(), AniOption::Value(value.to_string()));
        }
        _ => {}
    }
}
