//! Human-readable formatting for reports and logs.

use puddel_types::TOKEN_UNIT;

const UNITS: [(u64, &str); 5] = [(7 * 86_400, "w"), (86_400, "d"), (3_600, "h"), (60, "m"), (1, "s")];

/// A duration as its largest unit plus the next one when non-zero, e.g.
/// `1w 3d` or `2h 5m`.
pub fn format_duration(secs: u64) -> String {
    if secs == 0 {
        return "0s".to_string();
    }
    let mut rest = secs;
    let mut parts = Vec::with_capacity(2);
    for (size, unit) in UNITS {
        if parts.len() == 2 {
            break;
        }
        let count = rest / size;
        rest %= size;
        if count > 0 {
            parts.push(format!("{count}{unit}"));
        } else if !parts.is_empty() {
            break;
        }
    }
    parts.join(" ")
}

/// Raw units as whole tokens with up to four decimals, e.g. `1234.5`.
pub fn format_amount(raw: u128) -> String {
    let whole = raw / TOKEN_UNIT;
    let frac = (raw % TOKEN_UNIT) / (TOKEN_UNIT / 10_000);
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:04}");
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(59), "59s");
        assert_eq!(format_duration(7 * 86_400), "1w");
        assert_eq!(format_duration(10 * 86_400 + 3_600), "1w 3d");
        assert_eq!(format_duration(3_700), "1h 1m");
        // Units are adjacent: a zero middle unit ends the output.
        assert_eq!(format_duration(86_400 + 30), "1d");
    }

    #[test]
    fn amounts() {
        assert_eq!(format_amount(0), "0");
        assert_eq!(format_amount(3 * TOKEN_UNIT), "3");
        assert_eq!(format_amount(TOKEN_UNIT + TOKEN_UNIT / 2), "1.5");
        assert_eq!(format_amount(TOKEN_UNIT / 10_000), "0.0001");
        // Below display precision.
        assert_eq!(format_amount(1), "0");
    }
}
