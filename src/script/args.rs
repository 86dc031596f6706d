//! Lenient argument coercion. Script text is hand-written, so every helper
//! here degrades to `None` or a caller-supplied default instead of failing.

use once_cell::sync::Lazy;
use regex::Regex;

static AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^([+-])\s*(?:(?:VARIABLE|VAR)\s+(\d+)|(\d+))\s*(%)?$").unwrap()
});

/// Reads a leading integer the way authors expect: surrounding whitespace
/// and trailing text are ignored, so `"60 frames"` is 60.
pub fn parse_int(s: &str) -> Option<i32> {
    let s = s.trim_start();
    let (sign, digits) = match s.as_bytes().first() {
        Some(b'-') => (-1i64, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let value: i64 = digits[..end].parse().ok()?;
    i32::try_from(sign * value).ok()
}

/// Reads a leading decimal number, ignoring trailing text.
pub fn parse_float(s: &str) -> Option<f64> {
    let s = s.trim();
    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in s.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '.' if !seen_dot => seen_dot = true,
            c if c.is_ascii_digit() => {}
            _ => break,
        }
        end = i + c.len_utf8();
    }
    s[..end].parse().ok()
}

/// The integer argument, or `default` when it is absent, unparseable or
/// zero.
pub fn int_or(arg: Option<&str>, default: i32) -> i32 {
    match arg.and_then(parse_int) {
        Some(0) | None => default,
        Some(value) => value,
    }
}

/// A frame count argument, or `default` when it is absent, unparseable or
/// not positive.
pub fn frames_or(arg: Option<&str>, default: u32) -> u32 {
    match arg.and_then(parse_int) {
        Some(value) if value > 0 => value as u32,
        _ => default,
    }
}

/// The number before a trailing `%`, e.g. `"150%"` is 150.
pub fn parse_percent(s: &str) -> Option<f64> {
    let number = s.trim().strip_suffix('%')?;
    parse_float(number)
}

/// Whether an argument spells a boolean true, as in `IMMORTAL: targets, true`.
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_uppercase().as_str() {
        "TRUE" | "ON" => Some(true),
        "FALSE" | "OFF" => Some(false),
        _ => None,
    }
}

/// A signed change to a stat pool: a flat value, a variable's value, either
/// optionally taken as a percentage of the pool's maximum.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Amount {
    pub negative: bool,
    pub source: AmountSource,
    pub percent: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AmountSource {
    Value(i32),
    Variable(u32),
}

impl Amount {
    /// Parses `+50`, `-25%`, `+VARIABLE 3` and `-VAR 3%`.
    pub fn parse(s: &str) -> Option<Self> {
        let captures = AMOUNT.captures(s.trim())?;
        let negative = &captures[1] == "-";
        let source = match (captures.get(2), captures.get(3)) {
            (Some(id), _) => AmountSource::Variable(id.as_str().parse().ok()?),
            (None, Some(value)) => AmountSource::Value(value.as_str().parse().ok()?),
            (None, None) => return None,
        };

        Some(Self {
            negative,
            source,
            percent: captures.get(4).is_some(),
        })
    }

    /// Resolves the signed delta for a pool whose maximum is `max`. Percent
    /// amounts are rounded to the nearest whole point.
    pub fn resolve(&self, variable: impl Fn(u32) -> i32, max: i32) -> i32 {
        let base = match self.source {
            AmountSource::Value(value) => value,
            AmountSource::Variable(id) => variable(id),
        };
        let magnitude = if self.percent {
            (max as f64 * base as f64 / 100.).round() as i32
        } else {
            base
        };
        if self.negative {
            magnitude.saturating_neg()
        } else {
            magnitude
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_int_reads_leading_digits() {
        assert_eq!(parse_int("60"), Some(60));
        assert_eq!(parse_int(" -12 frames"), Some(-12));
        assert_eq!(parse_int("+7"), Some(7));
        assert_eq!(parse_int("frames"), None);
        assert_eq!(parse_int(""), None);
        assert_eq!(parse_int("-"), None);
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(parse_float("1.5"), Some(1.5));
        assert_eq!(parse_float("-0.25x"), Some(-0.25));
        assert_eq!(parse_float("x"), None);
    }

    #[test]
    fn test_defaults_follow_falsy_values() {
        assert_eq!(int_or(Some("0"), 100), 100);
        assert_eq!(int_or(Some("abc"), 100), 100);
        assert_eq!(int_or(Some("40"), 100), 40);
        assert_eq!(frames_or(None, 30), 30);
        assert_eq!(frames_or(Some("-5"), 30), 30);
    }

    #[test]
    fn test_percent() {
        assert_eq!(parse_percent("150%"), Some(150.));
        assert_eq!(parse_percent("150"), None);
    }

    #[test]
    fn test_amount_forms() {
        assert_eq!(
            Amount::parse("+50%"),
            Some(Amount {
                negative: false,
                source: AmountSource::Value(50),
                percent: true
            })
        );
        assert_eq!(
            Amount::parse("-variable 3"),
            Some(Amount {
                negative: true,
                source: AmountSource::Variable(3),
                percent: false
            })
        );
        assert_eq!(Amount::parse("50"), None);
        assert_eq!(Amount::parse("+abc"), None);
    }

    #[test]
    fn test_percent_amount_uses_max_at_resolution() {
        let amount = Amount::parse("-50%").unwrap();
        assert_eq!(amount.resolve(|_| 0, 100), -50);
        assert_eq!(amount.resolve(|_| 0, 125), -63);

        let amount = Amount::parse("+VAR 2%").unwrap();
        assert_eq!(amount.resolve(|id| id as i32 * 10, 300), 60);
    }
}
