//! Parses compact time expressions like `5s`, `10m`, `2h`, `1d` or `4h2m`.

use std::sync::LazyLock;

use chrono::TimeDelta;
use regex::Regex;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)([smhd])").expect("token regex is valid"));

/// The expression contained no `<integer><unit>` token, or a value was too
/// large to represent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time format '{input}': use tokens like 5s, 10m, 2h, 1d, or combinations like 4h2m")]
pub struct InvalidFormat {
    pub input: String,
}

/// Sums every `<integer><unit>` token in `input` (case-insensitive, no
/// separators required). Duplicate units add up rather than overwrite.
pub fn parse_duration(input: &str) -> Result<TimeDelta, InvalidFormat> {
    let invalid = || InvalidFormat {
        input: input.to_string(),
    };
    let lowered = input.to_lowercase();
    let mut seconds: i64 = 0;
    let mut matched = false;
    for token in TOKEN_RE.captures_iter(&lowered) {
        let value: i64 = token[1].parse().map_err(|_| invalid())?;
        let factor = match &token[2] {
            "s" => 1,
            "m" => 60,
            "h" => 3600,
            "d" => 86400,
            // unreachable, the unit class only admits the four above
            _ => return Err(invalid()),
        };
        seconds = value
            .checked_mul(factor)
            .and_then(|s| seconds.checked_add(s))
            .ok_or_else(invalid)?;
        matched = true;
    }
    if !matched {
        return Err(invalid());
    }
    Ok(TimeDelta::seconds(seconds))
}
