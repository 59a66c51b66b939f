// Copyright 2014-2015 Galen Clark Haynes
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

// Rust XML-RPC library

#![forbid(non_camel_case_types)]

//! XML-RPC serialization, both directions
//!
//! # What is XML-RPC?
//!
//! A remote procedure call protocol that sends a method name and an ordered
//! list of params as an XML document, using a small fixed set of value types.
//!
//! Basic documentation found on Wikipedia
//! http://en.wikipedia.org/wiki/XML-RPC
//!
//! Full specification of the XML-RPC protocol is found here:
//! http://xmlrpc.scripting.com/spec.html
//!
//! Additional errata and hints can be found here:
//! http://effbot.org/zone/xmlrpc-errata.htm
//!

pub mod decoding;
pub mod encoding;
pub mod iso8601;
pub mod protocol;
pub mod value;

pub use self::decoding::{decode_call, decode_response, decode_response_from, Decoded, Decoder, Event};
pub use self::encoding::{encode_call, encode_call_with, encode_fault, encode_response, encode_response_with, Encoder};
pub use self::iso8601::{decode_iso8601, encode_iso8601, DateTime};
pub use self::protocol::{Fault, Request, Response};
pub use self::value::{Array, Struct, Value};

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::{datetime, offset};

    use super::*;
    use crate::error::Error;

    fn round_trip(value: &Value) -> Value {
        let body = encode_call("m", std::slice::from_ref(value)).unwrap();
        let mut params = decode_response(&body).unwrap();
        assert_eq!(1, params.len());
        params.remove(0)
    }

    #[test]
    fn test_round_trip_scalars() {
        let samples = vec![
            Value::Nil,
            Value::Boolean(true),
            Value::Boolean(false),
            Value::Integer(0),
            Value::Integer(i64::from(i32::MIN)),
            Value::Integer(i64::MAX),
            Value::Double(4.5),
            Value::Double(0.1),
            Value::Double(-1.0e-7),
            Value::Double(1.7976931348623157e308),
            Value::from(""),
            Value::from("  spaced  "),
            Value::from("<tag attr=\"x\"> & 'quotes'"),
            Value::from("naïve ☃"),
            Value::DateTime(DateTime::naive(datetime!(1998-07-17 14:08:55))),
            Value::DateTime(DateTime::with_offset(datetime!(2020-02-29 12:00:00), offset!(+1))),
        ];
        for value in samples.iter() {
            assert_eq!(*value, round_trip(value));
        }
    }

    #[test]
    fn test_round_trip_negative_zero() {
        let value = round_trip(&Value::Double(-0.0));
        assert!(matches!(value, Value::Double(_)));
        assert_eq!(Value::Double(0.0), value);
    }

    #[test]
    fn test_round_trip_nested() {
        let value = Value::from_json(&json!([1, ["a", {"k": true}]])).unwrap();
        let body = encode_call("m", &[value.clone()]).unwrap();
        assert!(body.contains("<array><data><value><int>1</int></value><value><array>"));
        assert!(body.contains("<struct><member><name>k</name>"));
        assert_eq!(value, decode_response(&body).unwrap()[0]);
    }

    #[test]
    fn test_round_trip_deep_nesting() {
        let mut value = Value::Integer(7);
        for depth in 0..64 {
            value = if depth % 2 == 0 {
                Value::Array(vec![value, Value::Nil])
            } else {
                let mut members = Struct::new();
                members.insert(format!("level{}", depth), value);
                members.insert("after".to_string(), Value::from("x"));
                Value::Struct(members)
            };
        }
        assert_eq!(value, round_trip(&value));
    }

    #[test]
    fn test_round_trip_struct_order() {
        let value = Value::from_json(&json!({"zulu": 1, "alpha": 2.5, "mike": [null]})).unwrap();
        let decoded = round_trip(&value);
        let keys: Vec<&str> = decoded.as_struct().unwrap().keys().map(|k| k.as_str()).collect();
        assert_eq!(vec!["zulu", "alpha", "mike"], keys);
        assert_eq!(value, decoded);
    }

    #[test]
    fn test_numeric_split() {
        let four = Value::from_json(&json!(4)).unwrap();
        let four_and_half = Value::from_json(&json!(4.5)).unwrap();
        let body = encode_call("m", &[four, four_and_half]).unwrap();
        assert!(body.contains("<int>4</int>"));
        assert!(body.contains("<double>4.5</double>"));
        assert_eq!(
            vec![Value::Integer(4), Value::Double(4.5)],
            decode_response(&body).unwrap()
        );
    }

    #[test]
    fn test_empty_params() {
        let call = encode_call("m", &[]).unwrap();
        assert_eq!(Vec::<Value>::new(), decode_response(&call).unwrap());
        let response = encode_response(&[]).unwrap();
        assert_eq!(Vec::<Value>::new(), decode_response(&response).unwrap());
    }

    #[test]
    fn test_call_round_trip() {
        let params = vec![Value::from("user"), Value::from(vec![1, 2, 3])];
        let body = encode_call("system.multicall", &params).unwrap();
        assert_eq!(
            ("system.multicall".to_string(), params),
            decode_call(&body).unwrap()
        );
    }

    #[test]
    fn test_fault_round_trip() {
        let body = encode_fault(&Fault::new(3, "no such user")).unwrap();
        match decode_response(&body) {
            Err(Error::Fault(fault)) => assert_eq!(Fault::new(3, "no such user"), fault),
            other => panic!("unexpected {:?}", other),
        }
    }
}
