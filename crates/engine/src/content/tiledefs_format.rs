use std::collections::BTreeMap;

/// Parsed tile definition file: type name -> tile codes, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTiledefs {
    pub defs: BTreeMap<String, Vec<String>>,
    pub types: Vec<String>,
}

/// Parses the tile definitions text format. An uppercase-only line opens a
/// named block, the exact `END<NAME>` marker closes it, and every line in
/// between is a comma-separated list of 2-character tile codes.
pub fn parse_tiledefs(text: &str) -> ParsedTiledefs {
    let mut parsed = ParsedTiledefs::default();
    let mut current_type: Option<String> = None;

    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        match current_type.as_deref() {
            None => {
                if is_type_opener(line) {
                    parsed.defs.entry(line.to_string()).or_default();
                    parsed.types.push(line.to_string());
                    current_type = Some(line.to_string());
                }
                // Anything else outside a block is ignored.
            }
            Some(open_type) => {
                if line == format!("END{open_type}") {
                    current_type = None;
                } else if let Some(codes) = parsed.defs.get_mut(open_type) {
                    codes.extend(
                        line.split(',')
                            .map(str::trim)
                            .filter(|item| !item.is_empty())
                            .map(str::to_string),
                    );
                }
            }
        }
    }

    parsed
}

fn is_type_opener(line: &str) -> bool {
    !line.is_empty() && line.chars().all(|c| c.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_collects_comma_separated_codes() {
        let parsed = parse_tiledefs("BLOCK\nAA,BB\nCC\nENDBLOCK\n");
        assert_eq!(parsed.types, vec!["BLOCK"]);
        assert_eq!(
            parsed.defs["BLOCK"],
            vec!["AA".to_string(), "BB".to_string(), "CC".to_string()]
        );
    }

    #[test]
    fn end_marker_must_match_the_open_block() {
        // ENDNONBLOCK does not close a BLOCK section, so the line reads as
        // more codes for the open block.
        let parsed = parse_tiledefs("BLOCK\nENDNONBLOCK\nENDBLOCK\nNONBLOCK\nZZ\nENDNONBLOCK\n");
        assert_eq!(parsed.defs["BLOCK"], vec!["ENDNONBLOCK".to_string()]);
        assert_eq!(parsed.defs["NONBLOCK"], vec!["ZZ".to_string()]);
    }

    #[test]
    fn lines_outside_blocks_are_ignored() {
        let parsed = parse_tiledefs("just a comment\nBLOCK\nAA\nENDBLOCK\ntrailing noise\n");
        assert_eq!(parsed.types, vec!["BLOCK"]);
        assert_eq!(parsed.defs["BLOCK"], vec!["AA".to_string()]);
    }

    #[test]
    fn multiple_blocks_keep_file_order() {
        let parsed = parse_tiledefs("NONBLOCK\nAA\nENDNONBLOCK\nBLOCK\nBB\nENDBLOCK\n");
        assert_eq!(parsed.types, vec!["NONBLOCK", "BLOCK"]);
    }
}
