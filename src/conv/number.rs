/// Pieces of a numeric literal after sign and base detection
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NumberParts {
    /// True when a `-` sign was found
    pub negative: bool,
    /// Radix selected by the `0b`/`0o`/`0x` prefix, 10 otherwise
    pub base: u32,
    /// Integer digits (lowercase)
    pub integer: String,
    /// Fraction digits (lowercase), empty when there is no fraction
    pub decimal: String,
}

const PREFIXES: [(&str, u32); 3] = [("0b", 2), ("0o", 8), ("0x", 16)];

fn is_digit_of(c: char, base: u32) -> bool {
    c.is_digit(base)
}

impl NumberParts {
    /// Splits `input` into sign, base, integer and fraction digits.
    ///
    /// Leading characters that are not digits of the detected base are skipped
    /// and anything after the last digit run is ignored, so `"0o78721"` yields
    /// the integer part `"7"`.
    pub fn parse(input: &str) -> Self {
        let lower = input.to_ascii_lowercase();
        let mut buf = lower.as_str();
        let mut negative = false;
        if let Some(cut) = buf.find('+') {
            buf = &buf[cut + 1..];
        }
        if let Some(cut) = buf.find('-') {
            buf = &buf[cut + 1..];
            negative = true;
        }
        let mut base = 10;
        let first = PREFIXES
            .iter()
            .filter_map(|&(prefix, radix)| buf.find(prefix).map(|cut| (cut, prefix.len(), radix)))
            .min_by_key(|(cut, _, _)| *cut);
        if let Some((cut, len, radix)) = first {
            base = radix;
            buf = &buf[cut + len..];
        }
        if let Some(cut) = buf.find(|c| is_digit_of(c, base)) {
            buf = &buf[cut..];
        }
        let end = buf.find(|c| !is_digit_of(c, base)).unwrap_or(buf.len());
        let integer = buf[..end].to_string();
        let mut decimal = String::new();
        if let Some(rest) = buf[end..].strip_prefix('.') {
            let stop = rest.find(|c| !is_digit_of(c, base)).unwrap_or(rest.len());
            decimal = rest[..stop].to_string();
        }
        NumberParts {
            negative,
            base,
            integer,
            decimal,
        }
    }
}

fn digit(c: char) -> u32 {
    c.to_digit(36).unwrap_or(0)
}

/// Parses the integer part of a numeric literal: `Σ digit[i] * base^(len-1-i)`.
///
/// Overflow wraps. Any fraction is discarded.
pub fn parse_int(input: &str) -> i64 {
    let parts = NumberParts::parse(input);
    let base = i64::from(parts.base);
    let sum = parts.integer.chars().fold(0i64, |acc, c| {
        acc.wrapping_mul(base).wrapping_add(i64::from(digit(c)))
    });
    if parts.negative {
        sum.wrapping_neg()
    } else {
        sum
    }
}

/// Parses a numeric literal with an optional fraction in any supported base.
///
/// The value is `Σ digit[i] * base^(high-i)` over the integer digits followed by
/// the fraction digits, where `high = len(integer) - 1`.
pub fn parse_float(input: &str) -> f64 {
    let parts = NumberParts::parse(input);
    let base = f64::from(parts.base);
    let plain: Vec<u32> = parts
        .integer
        .chars()
        .chain(parts.decimal.chars())
        .map(digit)
        .collect();

    // Exact mantissa divided once keeps decimal literals like 2.1121 correctly rounded.
    let mantissa = plain.iter().try_fold(0u64, |acc, d| {
        acc.checked_mul(u64::from(parts.base))?
            .checked_add(u64::from(*d))
    });
    let sum = match mantissa {
        Some(m) if m < (1u64 << 53) => {
            m as f64 / base.powi(parts.decimal.len() as i32)
        }
        _ => {
            let mut high = parts.integer.len() as i32;
            plain.iter().fold(0.0, |acc, d| {
                high -= 1;
                acc + f64::from(*d) * base.powi(high)
            })
        }
    };
    if parts.negative {
        -sum
    } else {
        sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parts() {
        let info = NumberParts::parse("fsdfjj0x32332.3232weqw");
        assert_eq!(info.integer, "32332");
        assert_eq!(info.decimal, "3232");
        assert_eq!(info.base, 16);
        assert!(!info.negative);

        let info = NumberParts::parse("-1.223");
        assert_eq!(info.integer, "1");
        assert_eq!(info.decimal, "223");
        assert_eq!(info.base, 10);
        assert!(info.negative);

        let info = NumberParts::parse("0x2.0323fgdf");
        assert_eq!(info.integer, "2");
        assert_eq!(info.decimal, "0323f");

        let info = NumberParts::parse("0o78721");
        assert_eq!(info.integer, "7");
        assert_eq!(info.decimal, "");
        assert_eq!(info.base, 8);

        let info = NumberParts::parse("-0b10010.11001");
        assert_eq!(info.integer, "10010");
        assert_eq!(info.decimal, "11001");
        assert_eq!(info.base, 2);
        assert!(info.negative);
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("0xff"), 255);
        assert_eq!(parse_int("0o71"), 57);
        assert_eq!(parse_int("0b10"), 2);
        assert_eq!(parse_int("4454"), 4454);
        assert_eq!(parse_int("0x12.212"), 18);
        assert_eq!(parse_int("-42"), -42);
        assert_eq!(parse_int("203.312"), 203);
        assert_eq!(parse_int(""), 0);
    }

    #[test]
    fn test_hex_digits_that_look_like_prefixes() {
        assert_eq!(parse_int("0x0b"), 11);
        assert_eq!(parse_int("0xa0b1"), 0xa0b1);
        assert_eq!(parse_int("-0x0o"), 0);
        assert_eq!(parse_float("0x0b.8"), 11.5);
        assert_eq!(NumberParts::parse("0x0b").base, 16);
        assert_eq!(NumberParts::parse("0b0x").base, 2);
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(parse_float("0x1.f"), 1.9375);
        assert_eq!(parse_float("0o1.7"), 1.875);
        assert_eq!(parse_float("0b1.1101"), 1.8125);
        assert_eq!(parse_float("2.1121"), 2.1121);
        assert_eq!(parse_float("2"), 2.0);
        assert_eq!(parse_float("-203.312"), -203.312);
    }
}
