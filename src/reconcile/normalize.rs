//! Identity key normalization
//!
//! Collapses the display-name variants different sources produce for the same
//! player into one stable lookup key.

/// Normalize a raw player name into its identity key.
///
/// Lowercases, drops apostrophes so `O'Brien` and `OBrien` agree, maps all
/// other punctuation to spaces and collapses runs of whitespace. Non-ASCII
/// letters are kept as-is, so accented names stay distinct from their
/// unaccented spellings.
pub fn name_key(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '\'' | '\u{2019}'))
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn casing_and_whitespace_collapse() {
        assert_eq!(name_key("  Scottie   SCHEFFLER "), "scottie scheffler");
        assert_eq!(name_key("Jon Rahm"), "jon rahm");
    }

    #[test]
    fn apostrophes_are_dropped_not_split() {
        assert_eq!(name_key("Shane O'Brien"), "shane obrien");
        assert_eq!(name_key("Shane OBrien"), "shane obrien");
        assert_eq!(name_key("Shane O\u{2019}Brien"), "shane obrien");
    }

    #[test]
    fn other_punctuation_becomes_a_separator() {
        assert_eq!(name_key("Smith-Jones"), "smith jones");
        assert_eq!(name_key("J.T. Poston"), "j t poston");
    }

    #[test]
    fn accented_names_survive() {
        assert_eq!(name_key("Ludvig Åberg"), "ludvig åberg");
        assert_eq!(name_key("Joaquín Niemann"), "joaquín niemann");
    }

    #[test]
    fn empty_input_gives_empty_key() {
        assert_eq!(name_key("   "), "");
        assert_eq!(name_key("..."), "");
    }
}
