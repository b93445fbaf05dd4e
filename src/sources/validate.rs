//! Name plausibility validation.
//!
//! Scraped tables mix player rows with furniture: header rows, status
//! markers (CUT, WD), totals. Sources drop rows whose name cannot be a real
//! golfer and count them as skipped on the run record instead of letting
//! them reach the reconciler.

/// Reasons a fetched name is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameRejection {
    /// Empty or whitespace-only
    Empty,
    /// No alphabetic characters at all
    PurelyNumeric,
    /// A lone token; player names carry a separating space
    MissingSeparator,
    /// Contains a marker that is never part of a player name
    ForbiddenToken,
    /// Longer than any plausible name
    TooLong,
}

impl NameRejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            NameRejection::Empty => "empty",
            NameRejection::PurelyNumeric => "purely_numeric",
            NameRejection::MissingSeparator => "missing_separator",
            NameRejection::ForbiddenToken => "forbidden_token",
            NameRejection::TooLong => "too_long",
        }
    }
}

/// Markers that show up in scraped name cells but are never players.
const FORBIDDEN_TOKENS: &[&str] = &[
    "cut", "wd", "dq", "mc", "mdf", "pos", "player", "total", "thru", "projected", "amateur",
];

const MAX_NAME_CHARS: usize = 100;

/// Checks that a raw name is plausibly a player.
pub fn check_name(name: &str) -> Result<(), NameRejection> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(NameRejection::Empty);
    }
    if trimmed.chars().count() > MAX_NAME_CHARS {
        return Err(NameRejection::TooLong);
    }
    if !trimmed.chars().any(|c| c.is_alphabetic()) {
        return Err(NameRejection::PurelyNumeric);
    }
    if !trimmed.contains(char::is_whitespace) {
        return Err(NameRejection::MissingSeparator);
    }
    for token in trimmed.split_whitespace() {
        let token = token
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        if FORBIDDEN_TOKENS.contains(&token.as_str()) {
            return Err(NameRejection::ForbiddenToken);
        }
    }

    Ok(())
}

/// Cleans an incoming country value: trimmed and uppercased, and only kept
/// when it is 2-3 ASCII letters. Anything else is treated as absent so junk
/// cannot displace a known country later.
pub fn normalize_country(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    let len = trimmed.chars().count();
    if !(2..=3).contains(&len) {
        return None;
    }
    if !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some(trimmed.to_ascii_uppercase())
}
