//! Human-readable duration parsing for lookback windows and timeouts.
//!
//! Accepts compact forms (`"30s"`, `"5m"`, `"1h30m"`, `"500ms"`, `"2d"`),
//! spelled-out units (`"10 minutes"`, `"1 hour 15 mins"`), and bare
//! numbers, which are read as seconds.

use std::time::Duration;

/// Lookback used when a metric's window is missing or unparsable.
pub const DEFAULT_LOOKBACK: Duration = Duration::from_secs(5 * 60);

/// Parse a duration string. Returns `None` for empty or malformed input.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(secs) = s.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let mut total = Duration::ZERO;
    let mut rest = s;
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits == 0 {
            return None;
        }
        let amount: u64 = rest[..digits].parse().ok()?;
        rest = rest[digits..].trim_start();

        let unit_len = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let unit = unit_millis(&rest[..unit_len])?;
        rest = rest[unit_len..].trim_start_matches([' ', ',']);

        total = total.checked_add(Duration::from_millis(amount.checked_mul(unit)?))?;
    }
    Some(total)
}

fn unit_millis(unit: &str) -> Option<u64> {
    let millis = match unit.to_ascii_lowercase().as_str() {
        "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => 1,
        "s" | "sec" | "secs" | "second" | "seconds" => 1_000,
        "m" | "min" | "mins" | "minute" | "minutes" => 60_000,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3_600_000,
        "d" | "day" | "days" => 86_400_000,
        "w" | "week" | "weeks" => 604_800_000,
        _ => return None,
    };
    Some(millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_compact_units() {
        assert_eq!(parse_duration("30s"), Some(Duration::from_secs(30)));
        assert_eq!(parse_duration("5m"), Some(Duration::from_secs(300)));
        assert_eq!(parse_duration("2h"), Some(Duration::from_secs(7200)));
        assert_eq!(parse_duration("500ms"), Some(Duration::from_millis(500)));
        assert_eq!(parse_duration("1d"), Some(Duration::from_secs(86_400)));
    }

    #[test]
    fn parse_compound() {
        assert_eq!(parse_duration("1h30m"), Some(Duration::from_secs(5400)));
        assert_eq!(parse_duration("1m 30s"), Some(Duration::from_secs(90)));
    }

    #[test]
    fn parse_spelled_out() {
        assert_eq!(parse_duration("10 minutes"), Some(Duration::from_secs(600)));
        assert_eq!(
            parse_duration("1 hour, 15 mins"),
            Some(Duration::from_secs(4500))
        );
    }

    #[test]
    fn parse_plain_number_as_seconds() {
        assert_eq!(parse_duration("45"), Some(Duration::from_secs(45)));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("soon"), None);
        assert_eq!(parse_duration("5 fortnights"), None);
        assert_eq!(parse_duration("m5"), None);
        assert_eq!(parse_duration("-5m"), None);
    }
}
