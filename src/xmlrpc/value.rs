// Copyright 2014-2015 Galen Clark Haynes
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The XML-RPC value model.
//!
//! `Value` is a closed set of cases, one per wire type. Typed Rust callers
//! build values through the `From` conversions below; dynamically typed data
//! (JSON) goes through [`Value::from_json`], which is the only place the
//! integer/double decision is made at runtime.

use std::collections::BTreeMap;
use std::ops::Index;

use indexmap::IndexMap;
use serde_json::{Map, Number};
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::error::{Error, Result};
use crate::xmlrpc::iso8601::{self, DateTime};

/// Represents an XML-RPC data value
#[derive(Clone, PartialEq, Debug)]
pub enum Value {
    Nil,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
    DateTime(DateTime),
    Array(Array),
    Struct(Struct),
}

pub type Array = Vec<Value>;
pub type Struct = IndexMap<String, Value>;

static NIL: Value = Value::Nil;

impl Value {
    /// The element name this value is written as inside `<value>`.
    pub fn type_name(&self) -> &'static str {
        match *self {
            Value::Nil => "nil",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "int",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::DateTime(_) => "dateTime.iso8601",
            Value::Array(_) => "array",
            Value::Struct(_) => "struct",
        }
    }

    /// Classifies a dynamically typed JSON value.
    ///
    /// Numbers with no fractional part become `Integer`, everything else
    /// `Double`. Negative zero is kept as a `Double` so its sign survives, and
    /// whole numbers written as floats beyond the `i64` range stay `Double`.
    /// Integer literals beyond the `i64` range are `UnsupportedValueType`.
    pub fn from_json(json: &serde_json::Value) -> Result<Value> {
        match *json {
            serde_json::Value::Null => Ok(Value::Nil),
            serde_json::Value::Bool(b) => Ok(Value::Boolean(b)),
            serde_json::Value::Number(ref n) => classify_number(n),
            serde_json::Value::String(ref s) => Ok(Value::String(s.clone())),
            serde_json::Value::Array(ref items) => items
                .iter()
                .map(Value::from_json)
                .collect::<Result<Array>>()
                .map(Value::Array),
            serde_json::Value::Object(ref map) => {
                let mut members = Struct::with_capacity(map.len());
                for (key, item) in map {
                    members.insert(key.clone(), Value::from_json(item)?);
                }
                Ok(Value::Struct(members))
            }
        }
    }

    /// Renders the value as JSON. Timestamps become their ISO-8601 text and
    /// non-finite doubles become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match *self {
            Value::Nil => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(b),
            Value::Integer(i) => serde_json::Value::Number(i.into()),
            Value::Double(f) => Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(ref s) => serde_json::Value::String(s.clone()),
            Value::DateTime(ref dt) => serde_json::Value::String(iso8601::encode_iso8601(dt)),
            Value::Array(ref items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Struct(ref members) => {
                let mut map = Map::with_capacity(members.len());
                for (key, item) in members {
                    map.insert(key.clone(), item.to_json());
                }
                serde_json::Value::Object(map)
            }
        }
    }

    /// If the value is a struct, looks up `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match *self {
            Value::Struct(ref members) => members.get(key),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(*self, Value::Nil)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Boolean(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Integer(i) => Some(i),
            _ => None,
        }
    }

    /// Returns a double, widening integers.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Double(f) => Some(f),
            Value::Integer(i) => Some(i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match *self {
            Value::String(ref s) => Some(s),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&DateTime> {
        match *self {
            Value::DateTime(ref dt) => Some(dt),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match *self {
            Value::Array(ref items) => Some(items),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&Struct> {
        match *self {
            Value::Struct(ref members) => Some(members),
            _ => None,
        }
    }
}

fn classify_number(n: &Number) -> Result<Value> {
    if let Some(i) = n.as_i64() {
        return Ok(Value::Integer(i));
    }
    if n.is_u64() {
        return Err(Error::UnsupportedValueType(format!(
            "integer {} does not fit in 64 signed bits",
            n
        )));
    }
    let f = n
        .as_f64()
        .ok_or_else(|| Error::UnsupportedValueType(format!("number {}", n)))?;
    if f.fract() != 0.0 || !f.is_finite() || (f == 0.0 && f.is_sign_negative()) {
        return Ok(Value::Double(f));
    }
    // 2^63 is the first integral f64 past i64::MAX
    if f >= -9_223_372_036_854_775_808.0 && f < 9_223_372_036_854_775_808.0 {
        Ok(Value::Integer(f as i64))
    } else {
        Ok(Value::Double(f))
    }
}

impl<'a> Index<&'a str> for Value {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        self.get(key).unwrap_or(&NIL)
    }
}

impl Index<usize> for Value {
    type Output = Value;

    fn index(&self, idx: usize) -> &Value {
        match *self {
            Value::Array(ref items) => items.get(idx).unwrap_or(&NIL),
            _ => &NIL,
        }
    }
}

macro_rules! from_integer {
    ($($t:ty), +) => (
        $(impl From<$t> for Value {
            fn from(v: $t) -> Value { Value::Integer(i64::from(v)) }
        })+
    )
}

from_integer! { i8, i16, i32, i64, u8, u16, u32 }

impl TryFrom<u64> for Value {
    type Error = Error;

    fn try_from(v: u64) -> Result<Value> {
        i64::try_from(v)
            .map(Value::Integer)
            .map_err(|_| Error::UnsupportedValueType(format!("integer {} does not fit in 64 signed bits", v)))
    }
}

impl TryFrom<usize> for Value {
    type Error = Error;

    fn try_from(v: usize) -> Result<Value> {
        Value::try_from(v as u64)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Value {
        Value::Double(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Value {
        Value::Double(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Value {
        Value::Boolean(v)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Value {
        Value::Nil
    }
}

impl<'a> From<&'a str> for Value {
    fn from(v: &'a str) -> Value {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Value {
        Value::String(v)
    }
}

impl From<DateTime> for Value {
    fn from(v: DateTime) -> Value {
        Value::DateTime(v)
    }
}

impl From<PrimitiveDateTime> for Value {
    fn from(v: PrimitiveDateTime) -> Value {
        Value::DateTime(DateTime::naive(v))
    }
}

impl From<OffsetDateTime> for Value {
    fn from(v: OffsetDateTime) -> Value {
        Value::DateTime(DateTime::from(v))
    }
}

impl<A: Into<Value>> From<Vec<A>> for Value {
    fn from(v: Vec<A>) -> Value {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl From<Struct> for Value {
    fn from(v: Struct) -> Value {
        Value::Struct(v)
    }
}

impl<A: Into<Value>> From<BTreeMap<String, A>> for Value {
    fn from(v: BTreeMap<String, A>) -> Value {
        Value::Struct(v.into_iter().map(|(k, item)| (k, item.into())).collect())
    }
}

impl<A: Into<Value>> From<Option<A>> for Value {
    fn from(v: Option<A>) -> Value {
        match v {
            None => Value::Nil,
            Some(value) => value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_classify_json_scalars() {
        assert_eq!(Value::Nil, Value::from_json(&json!(null)).unwrap());
        assert_eq!(Value::Boolean(true), Value::from_json(&json!(true)).unwrap());
        assert_eq!(Value::Integer(4), Value::from_json(&json!(4)).unwrap());
        assert_eq!(Value::Integer(-12), Value::from_json(&json!(-12)).unwrap());
        assert_eq!(Value::Double(4.5), Value::from_json(&json!(4.5)).unwrap());
        assert_eq!(
            Value::String("hi".to_string()),
            Value::from_json(&json!("hi")).unwrap()
        );
    }

    #[test]
    fn test_classify_integral_double_as_integer() {
        assert_eq!(Value::Integer(4), Value::from_json(&json!(4.0)).unwrap());
        assert_eq!(Value::Integer(1_000_000), Value::from_json(&json!(1e6)).unwrap());
    }

    #[test]
    fn test_classify_negative_zero_stays_double() {
        let value = Value::from_json(&json!(-0.0)).unwrap();
        match value {
            Value::Double(f) => assert!(f == 0.0 && f.is_sign_negative()),
            other => panic!("expected a double, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_huge_integer_is_unsupported() {
        let err = Value::from_json(&json!(u64::MAX)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedValueType(_)));
    }

    #[test]
    fn test_classify_huge_whole_double_stays_double() {
        assert_eq!(Value::Double(1e300), Value::from_json(&json!(1e300)).unwrap());
        assert_eq!(Value::Double(-1e19), Value::from_json(&json!(-1e19)).unwrap());
    }

    #[test]
    fn test_classify_nested_keeps_member_order() {
        let value = Value::from_json(&json!([1, ["a", {"z": true, "a": null}]])).unwrap();
        let inner = &value[1];
        assert_eq!(Some("a"), inner[0].as_str());
        let keys: Vec<&str> = inner[1].as_struct().unwrap().keys().map(|k| k.as_str()).collect();
        assert_eq!(vec!["z", "a"], keys);
    }

    #[test]
    fn test_to_json() {
        let mut members = Struct::new();
        members.insert("k".to_string(), Value::from(vec![1, 2]));
        members.insert("nan".to_string(), Value::Double(f64::NAN));
        let value = Value::Struct(members);
        assert_eq!(json!({"k": [1, 2], "nan": null}), value.to_json());
    }

    #[test]
    fn test_typed_conversions() {
        assert_eq!(Value::Integer(7), Value::from(7u8));
        assert_eq!(Value::Double(0.5), Value::from(0.5f32));
        assert_eq!(Value::Nil, Value::from(None::<i32>));
        assert_eq!(Value::Boolean(false), Value::from(Some(false)));
        assert!(matches!(Value::try_from(u64::MAX), Err(Error::UnsupportedValueType(_))));
        assert_eq!(Value::Integer(3), Value::try_from(3usize).unwrap());
    }

    #[test]
    fn test_index_misses_are_nil() {
        let value = Value::from(vec!["x"]);
        assert_eq!(Some("x"), value[0].as_str());
        assert!(value[3].is_nil());
        assert!(value["key"].is_nil());
    }
}
