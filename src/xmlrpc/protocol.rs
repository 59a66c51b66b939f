// Copyright 2014-2015 Galen Clark Haynes
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

// XML-RPC request/response envelopes

use crate::error::{Error, Result};
use crate::xmlrpc::decoding;
use crate::xmlrpc::encoding;
use crate::xmlrpc::value::{Struct, Value};

/// A method call: a name and its ordered params.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: String,
    pub params: Vec<Value>,
}

#[derive(Debug)]
pub struct Response {
    pub body: String,
}

/// The error half of a `methodResponse`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub code: i64,
    pub message: String,
}

impl Request {
    pub fn new(method: &str) -> Request {
        Request {
            method: method.to_string(),
            params: Vec::new(),
        }
    }

    pub fn argument<T: Into<Value>>(mut self, value: T) -> Request {
        self.params.push(value.into());
        self
    }

    /// The `methodCall` document for this request.
    pub fn body(&self) -> Result<String> {
        encoding::encode_call(&self.method, &self.params)
    }

    pub fn from_body(body: &str) -> Result<Request> {
        let (method, params) = decoding::decode_call(body)?;
        Ok(Request { method, params })
    }
}

impl Response {
    pub fn new(body: &str) -> Response {
        Response {
            body: body.to_string(),
        }
    }

    /// The decoded params, or `Error::Fault` when the server answered with one.
    pub fn result(&self) -> Result<Vec<Value>> {
        decoding::decode_response(&self.body)
    }
}

impl Fault {
    pub fn new(code: i64, message: &str) -> Fault {
        Fault {
            code,
            message: message.to_string(),
        }
    }

    /// The `faultCode`/`faultString` struct carried on the wire.
    pub fn to_value(&self) -> Value {
        let mut members = Struct::with_capacity(2);
        members.insert("faultCode".to_string(), Value::Integer(self.code));
        members.insert("faultString".to_string(), Value::String(self.message.clone()));
        Value::Struct(members)
    }

    pub fn from_value(value: &Value) -> Result<Fault> {
        match (value["faultCode"].as_i64(), value["faultString"].as_str()) {
            (Some(code), Some(message)) => Ok(Fault::new(code, message)),
            _ => Err(Error::MalformedDocument(format!(
                "fault <{}> lacks an int faultCode and a string faultString",
                value.type_name()
            ))),
        }
    }
}
