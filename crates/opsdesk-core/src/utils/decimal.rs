//! Decimal amounts carried as strings.
//!
//! The backend serializes money as decimal strings ("1200.50"). Amounts
//! are never converted to floats; they are validated and normalized to at
//! least two fractional digits, and numbers that arrive as JSON numbers
//! are turned into the same string form.

use serde::{Deserialize, Deserializer};

/// Normalize a user- or server-supplied decimal string.
///
/// Trims whitespace, drops `,` thousands separators, accepts one optional
/// leading `-` and at most one `.`, and pads the fraction to two digits.
/// Returns `None` for blank or malformed input.
pub fn normalize_decimal(input: &str) -> Option<String> {
    let cleaned: String = input.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }

    let (negative, unsigned) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.as_str()),
    };

    let (whole, fraction) = match unsigned.split_once('.') {
        Some((w, f)) => (w, f),
        None => (unsigned, ""),
    };

    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
        return None;
    }

    let whole = match whole.trim_start_matches('0') {
        "" => "0",
        w => w,
    };
    let mut fraction = fraction.to_string();
    while fraction.len() < 2 {
        fraction.push('0');
    }

    let is_zero = whole == "0" && fraction.chars().all(|c| c == '0');
    let sign = if negative && !is_zero { "-" } else { "" };
    Some(format!("{}{}.{}", sign, whole, fraction))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDecimal {
    Text(String),
    Int(i64),
    Float(f64),
}

impl RawDecimal {
    fn into_text(self) -> String {
        match self {
            RawDecimal::Text(s) => s,
            RawDecimal::Int(i) => i.to_string(),
            RawDecimal::Float(f) => f.to_string(),
        }
    }
}

/// `#[serde(with = "decimal_string")]` for required amounts.
pub mod decimal_string {
    use super::*;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &str, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        let raw = RawDecimal::deserialize(deserializer)?.into_text();
        normalize_decimal(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid decimal amount {:?}", raw)))
    }
}

/// `#[serde(default, with = "option_decimal_string")]` for optional amounts.
/// `null` and blank strings read as `None`.
pub mod option_decimal_string {
    use super::*;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_str(v),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        let Some(raw) = Option::<RawDecimal>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let raw = raw.into_text();
        if raw.trim().is_empty() {
            return Ok(None);
        }
        normalize_decimal(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid decimal amount {:?}", raw)))
    }
}
