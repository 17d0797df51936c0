//! Lenient field decoders for Phabricator's JSON.
//!
//! The PHP side encodes many integers as strings (`"id": "85"`), empty
//! maps as `[]`, and missing lists as `null`. These helpers are used with
//! `#[serde(default, deserialize_with = "...")]` on result records.

use std::collections::HashMap;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Deserialize)]
#[serde(untagged)]
enum IntOrString {
    Int(i64),
    Str(String),
}

impl IntOrString {
    fn into_i64<E: serde::de::Error>(self) -> Result<i64, E> {
        match self {
            IntOrString::Int(n) => Ok(n),
            IntOrString::Str(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("expected integer, got {s:?}"))),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MapOrList<T> {
    Map(HashMap<String, T>),
    List(Vec<Value>),
}

/// An integer that may arrive as a JSON number or a numeric string.
pub fn int<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    IntOrString::deserialize(d)?.into_i64()
}

/// Like [`int`], with `null` and `""` mapping to `None`.
pub fn opt_int<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    match Option::<IntOrString>::deserialize(d)? {
        None => Ok(None),
        Some(IntOrString::Str(s)) if s.trim().is_empty() => Ok(None),
        Some(v) => v.into_i64().map(Some),
    }
}

/// A list of integers, each possibly a numeric string; `null` is empty.
pub fn int_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<i64>, D::Error> {
    Option::<Vec<IntOrString>>::deserialize(d)?
        .unwrap_or_default()
        .into_iter()
        .map(IntOrString::into_i64)
        .collect()
}

/// A string that may arrive as a number (timestamps, counters).
pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    match Option::<Value>::deserialize(d)? {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(D::Error::custom(format!("expected string, got {other}"))),
    }
}

/// A list where `null` means empty.
pub fn list<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(Option::<Vec<T>>::deserialize(d)?.unwrap_or_default())
}

/// A string-keyed map where `null` and `[]` mean empty.
pub fn map<'de, D, T>(d: D) -> Result<HashMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<MapOrList<T>>::deserialize(d)? {
        None => Ok(HashMap::new()),
        Some(MapOrList::Map(m)) => Ok(m),
        Some(MapOrList::List(items)) if items.is_empty() => Ok(HashMap::new()),
        Some(MapOrList::List(_)) => Err(D::Error::custom("expected object, got non-empty array")),
    }
}

/// A list that PHP may also send as an object keyed `"0"`, `"1"`, ...
/// Object values come back ordered by numeric key.
pub fn seq<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<Value>::deserialize(d)? {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|v| T::deserialize(v).map_err(D::Error::custom))
            .collect(),
        Some(Value::Object(entries)) => {
            let mut keyed: Vec<(i64, Value)> = entries
                .into_iter()
                .map(|(k, v)| {
                    k.parse()
                        .map(|idx| (idx, v))
                        .map_err(|_| D::Error::custom(format!("expected index key, got {k:?}")))
                })
                .collect::<Result<_, _>>()?;
            keyed.sort_by_key(|(idx, _)| *idx);
            keyed
                .into_iter()
                .map(|(_, v)| T::deserialize(v).map_err(D::Error::custom))
                .collect()
        }
        Some(other) => Err(D::Error::custom(format!("expected list, got {other}"))),
    }
}
