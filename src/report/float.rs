//! Serde helpers for `f64` fields that may be non-finite.
//!
//! JSON has no NaN or infinity, and `serde_json` would write `null` and then refuse to read it
//! back into an `f64`. These helpers write non-finite values as the strings `"NaN"`, `"inf"`
//! and `"-inf"` and accept either form when reading.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

#[derive(Deserialize)]
#[serde(untagged)]
enum Repr {
    Number(f64),
    Text(String),
}

pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else if value.is_nan() {
        serializer.serialize_str("NaN")
    } else if value.is_sign_positive() {
        serializer.serialize_str("inf")
    } else {
        serializer.serialize_str("-inf")
    }
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match Repr::deserialize(deserializer)? {
        Repr::Number(value) => Ok(value),
        Repr::Text(text) => match text.as_str() {
            "NaN" => Ok(f64::NAN),
            "inf" => Ok(f64::INFINITY),
            "-inf" => Ok(f64::NEG_INFINITY),
            other => Err(D::Error::custom(format!("invalid number `{}`", other))),
        },
    }
}

#[derive(Serialize, Deserialize)]
struct Wrapped(#[serde(serialize_with = "serialize", deserialize_with = "deserialize")] f64);

pub mod option {
    use super::Wrapped;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        value.map(Wrapped).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|w| w.0))
    }
}

pub mod map {
    use super::{BTreeMap, Wrapped};
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &BTreeMap<String, f64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(value.len()))?;
        for (key, &v) in value {
            map.serialize_entry(key, &Wrapped(v))?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, f64>, D::Error> {
        let raw = BTreeMap::<String, Wrapped>::deserialize(deserializer)?;
        Ok(raw.into_iter().map(|(k, w)| (k, w.0)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    struct Sample {
        #[serde(with = "super")]
        x: f64,
        #[serde(default, with = "option")]
        y: Option<f64>,
        #[serde(with = "map")]
        z: BTreeMap<String, f64>,
    }

    #[test]
    fn test_non_finite_values_survive_json() {
        let mut z = BTreeMap::new();
        z.insert("inf".to_string(), f64::INFINITY);
        z.insert("one".to_string(), 1.0);
        let sample = Sample {
            x: f64::NAN,
            y: Some(f64::NEG_INFINITY),
            z,
        };

        let json = serde_json::to_string(&sample).unwrap();
        assert_eq!(json, r#"{"x":"NaN","y":"-inf","z":{"inf":"inf","one":1.0}}"#);

        let back: Sample = serde_json::from_str(&json).unwrap();
        assert!(back.x.is_nan());
        assert_eq!(back.y, Some(f64::NEG_INFINITY));
        assert_eq!(back.z["inf"], f64::INFINITY);
        assert_eq!(back.z["one"], 1.0);
    }

    #[test]
    fn test_reads_plain_numbers_and_null() {
        let back: Sample = serde_json::from_str(r#"{"x":3,"y":null,"z":{}}"#).unwrap();
        assert_eq!(back.x, 3.0);
        assert_eq!(back.y, None);

        assert!(serde_json::from_str::<Sample>(r#"{"x":"three","z":{}}"#).is_err());
    }
}
