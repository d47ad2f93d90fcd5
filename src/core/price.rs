//! Price normalization.
//!
//! Prices reach the client in two shapes: plain numbers from the menu API, and
//! currency-formatted strings such as `"₹150"` from older stored carts and display code.
//! Both must total up the same way, so every calculation goes through
//! [`PriceValue::amount`].

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A price as it was received, either numeric or formatted text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceValue {
    /// Numeric price
    Amount(f64),
    /// Text price, possibly with a currency symbol or separators
    Text(String),
}

impl PriceValue {
    /// Returns the numeric amount.
    ///
    /// Text is normalized by dropping every character that is not an ASCII digit or `.`
    /// before parsing, so `"₹1,250.50"` becomes `1250.5`. Anything after a second `.` is
    /// ignored.
    ///
    /// # Errors
    /// Returns [`Error::InvalidPrice`] when nothing parsable remains or the amount is
    /// negative or not finite.
    pub fn amount(&self) -> Result<f64> {
        let amount = match self {
            Self::Amount(value) => *value,
            Self::Text(raw) => parse_price_text(raw)?,
        };

        if !amount.is_finite() || amount < 0.0 {
            return Err(Error::InvalidPrice {
                raw: self.to_string(),
            });
        }
        Ok(amount)
    }
}

impl From<f64> for PriceValue {
    fn from(value: f64) -> Self {
        Self::Amount(value)
    }
}

impl From<&str> for PriceValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl fmt::Display for PriceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Amount(value) => write!(f, "{value}"),
            Self::Text(raw) => f.write_str(raw),
        }
    }
}

fn parse_price_text(raw: &str) -> Result<f64> {
    let mut seen_dot = false;
    let digits: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .take_while(|c| {
            if *c == '.' {
                if seen_dot {
                    return false;
                }
                seen_dot = true;
            }
            true
        })
        .collect();

    digits.parse::<f64>().map_err(|_| Error::InvalidPrice {
        raw: raw.to_string(),
    })
}

/// Formats an amount in rupees, dropping the fraction for whole amounts.
#[must_use]
pub fn format_rupees(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("₹{amount:.0}")
    } else {
        format!("₹{amount:.2}")
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_numeric_price() {
        assert_eq!(PriceValue::Amount(150.0).amount().unwrap(), 150.0);
    }

    #[test]
    fn test_currency_formatted_price() {
        assert_eq!(PriceValue::from("₹150").amount().unwrap(), 150.0);
        assert_eq!(PriceValue::from("INR 99.50").amount().unwrap(), 99.5);
        assert_eq!(PriceValue::from("₹1,250").amount().unwrap(), 1250.0);
    }

    #[test]
    fn test_unparsable_price() {
        let result = PriceValue::from("free").amount();
        assert!(matches!(result, Err(Error::InvalidPrice { .. })));

        let result = PriceValue::from(".").amount();
        assert!(matches!(result, Err(Error::InvalidPrice { .. })));
    }

    #[test]
    fn test_trailing_dot_segments_are_ignored() {
        assert_eq!(PriceValue::from("1.2.3").amount().unwrap(), 1.2);
    }

    #[test]
    fn test_negative_or_nan_price() {
        assert!(PriceValue::Amount(-1.0).amount().is_err());
        assert!(PriceValue::Amount(f64::NAN).amount().is_err());
    }

    #[test]
    fn test_deserialize_both_shapes() {
        let values: Vec<PriceValue> = serde_json::from_str(r#"[120, "₹80"]"#).unwrap();
        assert_eq!(values[0], PriceValue::Amount(120.0));
        assert_eq!(values[1], PriceValue::Text("₹80".to_string()));
    }

    #[test]
    fn test_format_rupees() {
        assert_eq!(format_rupees(300.0), "₹300");
        assert_eq!(format_rupees(12.5), "₹12.50");
    }
}
