use poise::serenity_prelude::Colour;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("`{0}` is not a valid colour, expected 6 hex digits such as ff0000 or #FF0000")]
pub struct ColourParseError(pub String);

/// Parses `rrggbb` or `#rrggbb`, in any letter case.
pub fn parse_hex_colour(input: &str) -> Result<Colour, ColourParseError> {
    let trimmed = input.trim();
    let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ColourParseError(input.to_string()));
    }
    u32::from_str_radix(hex, 16)
        .map(Colour::new)
        .map_err(|_| ColourParseError(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_both_notations() {
        let bare = parse_hex_colour("ff0000").unwrap();
        let hashed = parse_hex_colour("#FF0000").unwrap();

        assert_eq!(bare, hashed);
        assert_eq!(bare.0, 0xFF0000);
    }

    #[test]
    fn rejects_anything_else() {
        for input in ["zzzzzz", "#ff00", "ff00000", "##ff0000", "+f0000", "", "#"] {
            assert_eq!(
                parse_hex_colour(input),
                Err(ColourParseError(input.to_string())),
                "{input:?} should be rejected"
            );
        }
    }
}
