//! Positional argument access for action parsing

use std::str::FromStr;

use crate::error::ParseError;

/// Positional arguments of a decoded action.
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    fields: &'a [String],
}

impl<'a> Args<'a> {
    /// Wraps decoded argument fields.
    pub fn new(fields: &'a [String]) -> Self {
        Self { fields }
    }

    /// Returns the number of arguments.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fails unless exactly `expected` arguments are present.
    pub fn expect(&self, tag: &'static str, expected: usize) -> Result<(), ParseError> {
        if self.fields.len() == expected {
            Ok(())
        } else {
            Err(ParseError::ArgumentCount {
                tag,
                expected,
                actual: self.fields.len(),
            })
        }
    }

    /// Parses argument `idx` as a canonical integer.
    pub fn int<T: FromStr>(&self, idx: usize, field: &'static str) -> Result<T, ParseError> {
        parse_int(self.text(idx), field)
    }

    /// Parses argument `idx` as an integer within `min..=max`.
    pub fn int_in(
        &self,
        idx: usize,
        field: &'static str,
        min: i64,
        max: i64,
    ) -> Result<i64, ParseError> {
        let value = self.int::<i64>(idx, field)?;
        if (min..=max).contains(&value) {
            Ok(value)
        } else {
            Err(ParseError::OutOfRange { field, value })
        }
    }

    /// Returns argument `idx` verbatim, or an empty string if absent.
    pub fn text(&self, idx: usize) -> &'a str {
        self.fields.get(idx).map(String::as_str).unwrap_or("")
    }
}

/// Parses an integer written the way the encoder writes it.
///
/// Only `0`, or an optional `-` followed by digits without a leading zero,
/// is accepted, so every accepted value re-encodes to the same text.
pub fn parse_int<T: FromStr>(value: &str, field: &'static str) -> Result<T, ParseError> {
    let digits = value.strip_prefix('-').unwrap_or(value);
    let canonical = !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && (digits == "0" || !digits.starts_with('0'))
        && !(value.starts_with('-') && digits == "0");
    if !canonical {
        return Err(ParseError::invalid_number(field, value));
    }
    value
        .parse::<T>()
        .map_err(|_| ParseError::invalid_number(field, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_canonical() {
        assert_eq!(parse_int::<i32>("0", "n"), Ok(0));
        assert_eq!(parse_int::<i32>("-15", "n"), Ok(-15));
        assert_eq!(parse_int::<u32>("2024", "n"), Ok(2024));
    }

    #[test]
    fn test_parse_int_rejects_non_canonical() {
        for bad in ["", "-", "-0", "007", "+3", "1e3", " 1", "0x1"] {
            assert!(parse_int::<i64>(bad, "n").is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_parse_int_rejects_overflow_and_sign() {
        assert!(parse_int::<u8>("256", "n").is_err());
        assert!(parse_int::<u32>("-1", "n").is_err());
    }

    #[test]
    fn test_expect_counts() {
        let fields = vec!["1".to_string(), "2".to_string()];
        let args = Args::new(&fields);
        assert!(args.expect("NAV", 2).is_ok());
        assert_eq!(
            args.expect("NAV", 1),
            Err(ParseError::ArgumentCount {
                tag: "NAV",
                expected: 1,
                actual: 2
            })
        );
        assert_eq!(args.int_in(1, "page", 1, 1), Err(ParseError::OutOfRange { field: "page", value: 2 }));
    }
}
