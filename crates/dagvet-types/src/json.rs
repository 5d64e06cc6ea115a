//! JSON view of [`Value`], following the DAG-JSON convention for links.
//!
//! A link is written as `{"/": "<cid>"}` and bytes as
//! `{"/": {"bytes": "<hex>"}}`. Used by tooling to build blocks from JSON
//! documents and to print decoded blocks; it is not part of the wire format.

use std::collections::BTreeMap;

use serde_json::{Map as JsonMap, Number, Value as Json};

use crate::error::TypeError;
use crate::object::parse_cid;
use crate::value::Value;

impl Value {
    /// Convert a JSON document into a [`Value`].
    pub fn from_json(json: &Json) -> Result<Self, TypeError> {
        Ok(match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => number_to_value(n)?,
            Json::String(s) => Value::String(s.clone()),
            Json::Array(items) => Value::List(
                items
                    .iter()
                    .map(Value::from_json)
                    .collect::<Result<_, _>>()?,
            ),
            Json::Object(obj) => {
                if let Some(special) = reserved_slash(obj)? {
                    return Ok(special);
                }
                let mut map = BTreeMap::new();
                for (k, v) in obj {
                    map.insert(k.clone(), Value::from_json(v)?);
                }
                Value::Map(map)
            }
        })
    }

    /// Render this value as JSON.
    ///
    /// Integers outside the `i64`/`u64` range are rendered as strings.
    pub fn to_json(&self) -> Json {
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Integer(i) => {
                if let Ok(v) = i64::try_from(*i) {
                    Json::from(v)
                } else if let Ok(v) = u64::try_from(*i) {
                    Json::from(v)
                } else {
                    Json::String(i.to_string())
                }
            }
            Value::Float(f) => Number::from_f64(*f).map(Json::Number).unwrap_or(Json::Null),
            Value::String(s) => Json::String(s.clone()),
            Value::Bytes(b) => {
                let mut inner = JsonMap::new();
                inner.insert("bytes".into(), Json::String(hex::encode(b)));
                let mut outer = JsonMap::new();
                outer.insert("/".into(), Json::Object(inner));
                Json::Object(outer)
            }
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::Link(cid) => {
                let mut obj = JsonMap::new();
                obj.insert("/".into(), Json::String(cid.to_string()));
                Json::Object(obj)
            }
        }
    }
}

fn number_to_value(n: &Number) -> Result<Value, TypeError> {
    if let Some(i) = n.as_i64() {
        Ok(Value::Integer(i.into()))
    } else if let Some(u) = n.as_u64() {
        Ok(Value::Integer(u.into()))
    } else if let Some(f) = n.as_f64() {
        Ok(Value::Float(f))
    } else {
        Err(TypeError::UnsupportedJson(n.to_string()))
    }
}

/// Objects with a single `"/"` key encode links and bytes.
fn reserved_slash(obj: &JsonMap<String, Json>) -> Result<Option<Value>, TypeError> {
    if obj.len() != 1 {
        return Ok(None);
    }
    match obj.get("/") {
        Some(Json::String(s)) => Ok(Some(Value::Link(parse_cid(s)?))),
        Some(Json::Object(inner)) if inner.len() == 1 => match inner.get("bytes") {
            Some(Json::String(h)) => hex::decode(h)
                .map(|b| Some(Value::Bytes(b)))
                .map_err(|e| TypeError::InvalidHex(e.to_string())),
            _ => Ok(None),
        },
        _ => Ok(None),
    }
}
