//! Lenient readers and lossless writers for upload and report fields.

use std::fmt;

use serde::de::{self, IgnoredAny, Visitor};
use serde::{Deserialize, Deserializer, Serializer};

use crate::domain::Location;

const INFINITY: &str = "Infinity";
const NEG_INFINITY: &str = "-Infinity";
const NAN: &str = "NaN";

/// Writes finite values as numbers and non-finite ones as `"Infinity"`, `"-Infinity"` or `"NaN"`.
pub fn serialize_f64<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.is_nan() {
        serializer.serialize_str(NAN)
    } else if value.is_infinite() {
        serializer.serialize_str(if *value > 0.0 { INFINITY } else { NEG_INFINITY })
    } else {
        serializer.serialize_f64(*value)
    }
}

struct F64Visitor;

impl<'de> Visitor<'de> for F64Visitor {
    type Value = f64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number, null or a non-finite label")
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<f64, E> {
        Ok(value)
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<f64, E> {
        Ok(value as f64)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<f64, E> {
        Ok(value as f64)
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<f64, E> {
        Ok(match value.trim() {
            INFINITY | "inf" => f64::INFINITY,
            NEG_INFINITY | "-inf" => f64::NEG_INFINITY,
            NAN => f64::NAN,
            other => other.parse().unwrap_or(f64::NAN),
        })
    }

    fn visit_unit<E: de::Error>(self) -> Result<f64, E> {
        Ok(f64::NAN)
    }

    fn visit_none<E: de::Error>(self) -> Result<f64, E> {
        Ok(f64::NAN)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<f64, D::Error> {
        deserializer.deserialize_any(self)
    }
}

/// Reads numbers, `null` (as NaN) and the labels written by [`serialize_f64`].
pub fn deserialize_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(F64Visitor)
}

struct ResidueVisitor;

impl<'de> Visitor<'de> for ResidueVisitor {
    type Value = u32;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative residue number")
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<u32, E> {
        u32::try_from(value).map_err(|_| E::custom(format!("residue {value} out of range")))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<u32, E> {
        u32::try_from(value).map_err(|_| E::custom(format!("residue {value} out of range")))
    }

    // 805.0 is common in spreadsheet exports; fractions are truncated.
    fn visit_f64<E: de::Error>(self, value: f64) -> Result<u32, E> {
        if value.is_finite() && value >= 0.0 && value <= f64::from(u32::MAX) {
            Ok(value.trunc() as u32)
        } else {
            Err(E::custom(format!("residue {value} out of range")))
        }
    }
}

/// Residue positions and lengths given as integers or integral floats.
pub fn deserialize_residue<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(ResidueVisitor)
}

pub fn deserialize_optional_residue<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Residue(#[serde(deserialize_with = "deserialize_residue")] u32);

    Ok(Option::<Residue>::deserialize(deserializer)?.map(|Residue(value)| value))
}

/// Peptide locations are reassigned during merging, so unknown values fall back to the default.
pub fn deserialize_lenient_location<'de, D>(deserializer: D) -> Result<Location, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Known(Location),
        Other(IgnoredAny),
    }

    Ok(match Loose::deserialize(deserializer)? {
        Loose::Known(location) => location,
        Loose::Other(_) => Location::default(),
    })
}
