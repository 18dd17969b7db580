//! Money helpers shared by the wire models and the ledger
//!
//! All monetary values are `Decimal`. Rounding to cents happens once, when a
//! final amount is produced, never in the middle of a calculation.

use rust_decimal::prelude::*;

/// Decimal places kept for monetary values
pub const DECIMAL_PLACES: u32 = 2;

/// Round a monetary value to cents (half away from zero) with a fixed scale of 2,
/// so `2.8` is carried as `2.80` and zero as `0.00`.
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(DECIMAL_PLACES);
    rounded
}

/// Parse a decimal string as stored in the database or sent by a client.
pub fn parse_money(value: &str) -> Result<Decimal, rust_decimal::Error> {
    Decimal::from_str_exact(value.trim()).map(round_money)
}

/// Keep a percentage at full precision with at least 2 decimals, so `8` is
/// carried as `8.00` while `8.875` stays `8.875`.
pub fn normalize_rate(value: Decimal) -> Decimal {
    let mut rate = value.normalize();
    if rate.scale() < DECIMAL_PLACES {
        rate.rescale(DECIMAL_PLACES);
    }
    rate
}

/// Parse a stored percentage without rounding it to cents.
pub fn parse_rate(value: &str) -> Result<Decimal, rust_decimal::Error> {
    Decimal::from_str_exact(value.trim()).map(normalize_rate)
}

/// Fixed-point (2 decimal) string serialization for monetary fields.
///
/// Serializes as `"37.77"`. Deserializes from a decimal string or a JSON number.
pub mod fixed2 {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::round_money(*value).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        Ok(super::round_money(value))
    }

    /// Same encoding for optional fields
    pub mod option {
        use rust_decimal::Decimal;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(value: &Option<Decimal>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(v) => super::serialize(v, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let value = Option::<Decimal>::deserialize(deserializer)?;
            Ok(value.map(super::super::round_money))
        }
    }
}

/// String serialization for percentages. Never rounds.
pub mod rate {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::normalize_rate(*value).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        Ok(super::normalize_rate(value))
    }

    pub mod option {
        use rust_decimal::Decimal;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(value: &Option<Decimal>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(v) => super::serialize(v, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let value = Option::<Decimal>::deserialize(deserializer)?;
            Ok(value.map(super::super::normalize_rate))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Amounts {
        #[serde(with = "fixed2")]
        total: Decimal,
        #[serde(default, with = "fixed2::option")]
        tip: Option<Decimal>,
    }

    #[test]
    fn test_round_money_fixes_scale() {
        assert_eq!(round_money(dec!(2.7976)).to_string(), "2.80");
        assert_eq!(round_money(Decimal::ZERO).to_string(), "0.00");
        assert_eq!(round_money(dec!(12.23)).to_string(), "12.23");
    }

    #[test]
    fn test_round_money_half_away_from_zero() {
        assert_eq!(round_money(dec!(0.125)), dec!(0.13));
        assert_eq!(round_money(dec!(-0.125)), dec!(-0.13));
    }

    #[test]
    fn test_accumulation_has_no_drift() {
        let mut total = Decimal::ZERO;
        for _ in 0..1000 {
            total += dec!(0.01);
        }
        assert_eq!(round_money(total).to_string(), "10.00");
    }

    #[test]
    fn test_fixed2_serializes_as_string() {
        let a = Amounts {
            total: dec!(37.77),
            tip: None,
        };
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["total"], "37.77");
        assert!(json["tip"].is_null());
    }

    #[test]
    fn test_fixed2_accepts_numbers_and_strings() {
        let from_str: Amounts = serde_json::from_str(r#"{"total":"50.00","tip":"1.5"}"#).unwrap();
        let from_num: Amounts = serde_json::from_str(r#"{"total":50,"tip":1.5}"#).unwrap();
        assert_eq!(from_str.total, dec!(50.00));
        assert_eq!(from_num.total, dec!(50.00));
        assert_eq!(from_str.tip, Some(dec!(1.50)));
        assert_eq!(from_num.tip, Some(dec!(1.50)));
    }

    #[test]
    fn test_rates_keep_precision() {
        assert_eq!(normalize_rate(dec!(8)).to_string(), "8.00");
        assert_eq!(normalize_rate(dec!(8.8750)).to_string(), "8.875");
        assert_eq!(parse_rate("8.875").unwrap(), dec!(8.875));

        #[derive(Deserialize, Serialize)]
        struct Rated {
            #[serde(with = "rate")]
            rate: Decimal,
        }
        let r: Rated = serde_json::from_str(r#"{"rate":8.875}"#).unwrap();
        assert_eq!(r.rate, dec!(8.875));
        assert_eq!(serde_json::to_value(&r).unwrap()["rate"], "8.875");
    }

    #[test]
    fn test_parse_money() {
        assert_eq!(parse_money(" 34.97 ").unwrap(), dec!(34.97));
        assert!(parse_money("abc").is_err());
    }
}
