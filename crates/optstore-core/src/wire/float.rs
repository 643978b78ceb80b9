//! JSON-safe encoding for doubles that may be infinite.
//!
//! `serde_json` writes non-finite floats as `null`, which cannot be read back.
//! Bounds are routinely infinite, so those fields go through these helpers:
//! finite values stay numbers, the rest become `"inf"`, `"-inf"` or `"nan"`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum Extended {
    Finite(f64),
    Named(String),
}

fn encode(value: f64) -> Extended {
    if value.is_finite() {
        Extended::Finite(value)
    } else if value.is_nan() {
        Extended::Named("nan".to_string())
    } else if value > 0.0 {
        Extended::Named("inf".to_string())
    } else {
        Extended::Named("-inf".to_string())
    }
}

fn decode<E: serde::de::Error>(value: Extended) -> Result<f64, E> {
    match value {
        Extended::Finite(value) => Ok(value),
        Extended::Named(name) => match name.as_str() {
            "inf" => Ok(f64::INFINITY),
            "-inf" => Ok(f64::NEG_INFINITY),
            "nan" => Ok(f64::NAN),
            other => Err(E::custom(format!("unknown double literal '{other}'"))),
        },
    }
}

pub mod scalar {
    use super::*;

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        encode(*value).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        decode(Extended::deserialize(deserializer)?)
    }
}

pub mod vec {
    use super::*;

    pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|value| encode(*value)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        Vec::<Extended>::deserialize(deserializer)?
            .into_iter()
            .map(decode)
            .collect()
    }
}
