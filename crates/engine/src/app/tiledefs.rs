use std::collections::{BTreeMap, HashSet};

use tracing::warn;

use crate::content::tiledefs_format::ParsedTiledefs;
use crate::content::{TileCode, TileCodeError, TileCodec};

/// Named type sets over tile codes (`BLOCK`, `NONBLOCK`, ...). A code may
/// belong to any number of types; membership drives collision and other
/// per-tile behavior.
#[derive(Debug, Clone, Default)]
pub struct TileDefs {
    defs: BTreeMap<String, HashSet<TileCode>>,
}

impl TileDefs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a parsed tile definitions file. Codes that are
    /// not exactly two characters are skipped with a warning so one typo
    /// cannot reject the whole file.
    pub fn from_parsed(parsed: &ParsedTiledefs) -> Self {
        let mut defs = Self::new();
        for (type_name, codes) in &parsed.defs {
            defs.add_type(type_name);
            for code in codes {
                if let Err(error) = defs.add_code(type_name, code) {
                    warn!(type_name = type_name.as_str(), code = code.as_str(), %error, "tiledef_code_rejected");
                }
            }
        }
        defs
    }

    pub fn add_type(&mut self, type_name: &str) {
        self.defs.entry(type_name.to_string()).or_default();
    }

    pub fn remove_type(&mut self, type_name: &str) {
        self.defs.remove(type_name);
    }

    pub fn add_code(&mut self, type_name: &str, code: &str) -> Result<(), TileCodeError> {
        let code = TileCode::new(code)?;
        self.defs.entry(type_name.to_string()).or_default().insert(code);
        Ok(())
    }

    pub fn add_codes<'a>(
        &mut self,
        type_name: &str,
        codes: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), TileCodeError> {
        for code in codes {
            self.add_code(type_name, code)?;
        }
        Ok(())
    }

    /// Removing the last code of a type removes the type entry entirely, so
    /// lookups never see stale empty sets.
    pub fn remove_codes<'a>(&mut self, type_name: &str, codes: impl IntoIterator<Item = &'a str>) {
        let Some(set) = self.defs.get_mut(type_name) else {
            return;
        };
        for code in codes {
            if let Ok(code) = TileCode::new(code) {
                set.remove(&code);
            }
        }
        if set.is_empty() {
            self.defs.remove(type_name);
        }
    }

    pub fn types_by_code(&self, code: TileCode) -> HashSet<&str> {
        self.defs
            .iter()
            .filter(|(_, codes)| codes.contains(&code))
            .map(|(type_name, _)| type_name.as_str())
            .collect()
    }

    /// Lookup by tileset-space coordinates; requires the codec that encodes
    /// (x, y) into the code alphabet.
    pub fn types_by_tile(&self, x: u32, y: u32, codec: &TileCodec) -> HashSet<&str> {
        match codec.encode(x, y) {
            Ok(code) => self.types_by_code(code),
            Err(error) => {
                warn!(x, y, %error, "tiledef_lookup_out_of_tileset");
                HashSet::new()
            }
        }
    }

    pub fn type_count(&self) -> usize {
        self.defs.len()
    }
}
