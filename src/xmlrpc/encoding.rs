// Copyright 2014-2015 Galen Clark Haynes
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

// XML-RPC serialization

use std::io::Write;

use xml::writer::{EmitterConfig, EventWriter, XmlEvent};

use crate::config::EncoderConfig;
use crate::error::{Error, Result};
use crate::xmlrpc::iso8601;
use crate::xmlrpc::protocol::Fault;
use crate::xmlrpc::value::Value;

/// Shortcut function to encode a method call into an XML `String`
pub fn encode_call(method: &str, params: &[Value]) -> Result<String> {
    encode_call_with(&EncoderConfig::default(), method, params)
}

pub fn encode_call_with(config: &EncoderConfig, method: &str, params: &[Value]) -> Result<String> {
    debug!("encoding call {} with {} param(s)", method, params.len());
    let mut encoder = Encoder::new(Vec::new(), config);
    encoder.emit_call(method, params)?;
    Ok(String::from_utf8(encoder.into_inner())?)
}

/// Encodes a successful `methodResponse` carrying `params`.
pub fn encode_response(params: &[Value]) -> Result<String> {
    encode_response_with(&EncoderConfig::default(), params)
}

pub fn encode_response_with(config: &EncoderConfig, params: &[Value]) -> Result<String> {
    debug!("encoding response with {} param(s)", params.len());
    let mut encoder = Encoder::new(Vec::new(), config);
    encoder.emit_response(params)?;
    Ok(String::from_utf8(encoder.into_inner())?)
}

/// Encodes a `methodResponse` carrying a fault.
pub fn encode_fault(fault: &Fault) -> Result<String> {
    debug!("encoding fault {}", fault.code);
    let mut encoder = Encoder::new(Vec::new(), &EncoderConfig::default());
    encoder.emit_fault(fault)?;
    Ok(String::from_utf8(encoder.into_inner())?)
}

/// A structure for implementing serialization to XML-RPC.
///
/// All text goes through the xml-rs emitter, which escapes it. Values are
/// written depth first; a value that contains itself cannot be built with
/// owned children, so recursion always terminates.
pub struct Encoder<W: Write> {
    writer: EventWriter<W>,
}

impl<W: Write> Encoder<W> {
    /// Creates a new XML-RPC encoder whose output will be written to the sink
    /// specified.
    pub fn new(sink: W, config: &EncoderConfig) -> Encoder<W> {
        let writer = EmitterConfig::new()
            .write_document_declaration(config.write_declaration)
            .perform_indent(config.indent)
            .create_writer(sink);
        Encoder { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    pub fn emit_call(&mut self, method: &str, params: &[Value]) -> Result<()> {
        self.start("methodCall")?;
        self.leaf("methodName", method)?;
        self.emit_params(params)?;
        self.end()
    }

    pub fn emit_response(&mut self, params: &[Value]) -> Result<()> {
        self.start("methodResponse")?;
        self.emit_params(params)?;
        self.end()
    }

    pub fn emit_fault(&mut self, fault: &Fault) -> Result<()> {
        self.start("methodResponse")?;
        self.start("fault")?;
        self.emit_value(&fault.to_value())?;
        self.end()?;
        self.end()
    }

    fn emit_params(&mut self, params: &[Value]) -> Result<()> {
        self.start("params")?;
        for param in params {
            self.start("param")?;
            self.emit_value(param)?;
            self.end()?;
        }
        self.end()
    }

    /// Writes one `<value>` element and everything below it.
    pub fn emit_value(&mut self, value: &Value) -> Result<()> {
        trace!("encoding <{}>", value.type_name());
        self.start("value")?;
        match *value {
            Value::Nil => {
                self.start("nil")?;
                self.end()?;
            }
            Value::Boolean(b) => self.leaf("boolean", if b { "1" } else { "0" })?,
            Value::Integer(i) => self.leaf("int", &i.to_string())?,
            Value::Double(f) => {
                if !f.is_finite() {
                    return Err(Error::Serialization(format!(
                        "{} has no XML-RPC double representation",
                        f
                    )));
                }
                self.leaf("double", &f.to_string())?
            }
            Value::String(ref s) => self.leaf("string", s)?,
            Value::DateTime(ref dt) => {
                let year = dt.datetime.year();
                if !(0..=9999).contains(&year) {
                    return Err(Error::Serialization(format!(
                        "year {} has no four-digit dateTime.iso8601 form",
                        year
                    )));
                }
                self.leaf("dateTime.iso8601", &iso8601::encode_iso8601(dt))?
            }
            Value::Array(ref items) => {
                self.start("array")?;
                self.start("data")?;
                for item in items {
                    self.emit_value(item)?;
                }
                self.end()?;
                self.end()?;
            }
            Value::Struct(ref members) => {
                self.start("struct")?;
                for (name, item) in members {
                    self.start("member")?;
                    self.leaf("name", name)?;
                    self.emit_value(item)?;
                    self.end()?;
                }
                self.end()?;
            }
        }
        self.end()
    }

    fn leaf(&mut self, tag: &str, text: &str) -> Result<()> {
        if let Some(c) = text.chars().find(|c| !is_xml_char(*c)) {
            return Err(Error::Serialization(format!(
                "<{}> text contains U+{:04X}, which XML 1.0 cannot carry",
                tag, c as u32
            )));
        }
        self.start(tag)?;
        if !text.is_empty() {
            self.writer.write(XmlEvent::characters(text))?;
        }
        self.end()
    }

    fn start(&mut self, tag: &str) -> Result<()> {
        self.writer.write(XmlEvent::start_element(tag))?;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.writer.write(XmlEvent::end_element())?;
        Ok(())
    }
}

// The XML 1.0 `Char` production. xml-rs escapes markup and writes anything else as is.
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::xmlrpc::decoding::decode_response;
    use crate::xmlrpc::iso8601::DateTime;
    use crate::xmlrpc::value::Struct;

    fn bare() -> EncoderConfig {
        EncoderConfig {
            write_declaration: false,
            indent: false,
        }
    }

    fn encode_one(value: Value) -> String {
        encode_call_with(&bare(), "m", &[value]).unwrap()
    }

    #[test]
    fn test_encode() {
        let expected = "<methodCall><methodName>method_name_value</methodName><params>\
                        <param><value><string>string_value</string></value></param>\
                        <param><value><double>4.2</double></value></param>\
                        <param><value><boolean>1</boolean></value></param>\
                        </params></methodCall>";

        let params = vec![
            Value::from("string_value"),
            Value::from(4.2),
            Value::from(true),
        ];
        let body = encode_call_with(&bare(), "method_name_value", &params).unwrap();

        assert_eq!(expected, body);
    }

    #[test]
    fn test_declaration_is_written_by_default() {
        let body = encode_call("m", &[]).unwrap();
        assert!(body.starts_with("<?xml"));
        assert!(body.contains("<methodName>m</methodName>"));
    }

    #[test]
    fn test_encode_booleans() {
        let body = encode_call_with(&bare(), "m", &[Value::Boolean(true), Value::Boolean(false)]).unwrap();
        let first = body.find("<boolean>1</boolean>").unwrap();
        let second = body.find("<boolean>0</boolean>").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_encode_numbers() {
        assert!(encode_one(Value::Integer(4)).contains("<value><int>4</int></value>"));
        assert!(encode_one(Value::Integer(-17)).contains("<int>-17</int>"));
        assert!(encode_one(Value::Double(4.5)).contains("<value><double>4.5</double></value>"));
        assert!(encode_one(Value::Double(-0.0)).contains("<double>-0</double>"));
    }

    #[test]
    fn test_encode_non_finite_double_fails() {
        let err = encode_call("m", &[Value::Double(f64::NAN)]).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
        let err = encode_call("m", &[Value::from(vec![f64::INFINITY])]).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_encode_escapes_text() {
        let body = encode_one(Value::from("a < b & c"));
        assert!(body.contains("<string>a &lt; b &amp; c</string>"));
        let body = encode_call_with(&bare(), "x<y", &[]).unwrap();
        assert!(body.contains("<methodName>x&lt;y</methodName>"));
    }

    #[test]
    fn test_encode_rejects_non_xml_chars() {
        let err = encode_call("m", &[Value::from("a\u{1}b")]).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));

        let mut members = Struct::new();
        members.insert("bad\u{FFFF}".to_string(), Value::Nil);
        let err = encode_call("m", &[Value::Struct(members)]).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));

        let err = encode_call("m\u{0}", &[]).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));

        let body = encode_one(Value::from("tab\there\nline"));
        assert_eq!(vec![Value::from("tab\there\nline")], decode_response(&body).unwrap());
    }

    #[test]
    fn test_encode_nil_and_datetime() {
        let body = encode_one(Value::Nil);
        assert!(body.contains("<value><nil"));
        assert!(!body.contains("</value></value>"));

        let dt = DateTime::naive(datetime!(1998-07-17 14:08:55));
        let body = encode_one(Value::DateTime(dt));
        assert!(body.contains("<dateTime.iso8601>19980717T14:08:55</dateTime.iso8601>"));
    }

    #[test]
    fn test_encode_rejects_years_outside_four_digits() {
        for dt in [datetime!(-0001-01-01 00:00:00), datetime!(-9999-12-31 23:59:59)] {
            let err = encode_call("m", &[Value::DateTime(DateTime::naive(dt))]).unwrap_err();
            assert!(matches!(err, Error::Serialization(_)));
        }
        let body = encode_one(Value::DateTime(DateTime::naive(datetime!(0000-01-01 00:00:00))));
        assert!(body.contains("<dateTime.iso8601>00000101T00:00:00</dateTime.iso8601>"));
    }

    #[test]
    fn test_encode_nested() {
        let mut members = Struct::new();
        members.insert("k".to_string(), Value::Boolean(true));
        let value = Value::Array(vec![
            Value::Integer(1),
            Value::Array(vec![Value::from("a"), Value::Struct(members)]),
        ]);
        let expected = "<value><array><data>\
                        <value><int>1</int></value>\
                        <value><array><data>\
                        <value><string>a</string></value>\
                        <value><struct><member><name>k</name><value><boolean>1</boolean></value></member></struct></value>\
                        </data></array></value>\
                        </data></array></value>";
        assert!(encode_one(value).contains(expected));
    }

    #[test]
    fn test_encode_struct_in_insertion_order() {
        let mut members = Struct::new();
        members.insert("zeta".to_string(), Value::Integer(1));
        members.insert("alpha".to_string(), Value::Integer(2));
        let body = encode_one(Value::Struct(members));
        assert!(body.find("<name>zeta</name>").unwrap() < body.find("<name>alpha</name>").unwrap());
    }

    #[test]
    fn test_encode_is_idempotent() {
        let params = vec![
            Value::from(vec![Value::from(1), Value::from("two"), Value::Nil]),
            Value::Double(0.1),
        ];
        assert_eq!(encode_call("m", &params).unwrap(), encode_call("m", &params).unwrap());
    }

    #[test]
    fn test_encode_response_and_fault() {
        let body = encode_response_with(&bare(), &[Value::Integer(1)]).unwrap();
        assert_eq!(
            "<methodResponse><params><param><value><int>1</int></value></param></params></methodResponse>",
            body
        );

        let body = encode_fault(&Fault::new(4, "Too many parameters.")).unwrap();
        assert!(body.contains("<fault><value><struct>"));
        assert!(body.contains("<name>faultCode</name><value><int>4</int></value>"));
        assert!(body.contains("<name>faultString</name><value><string>Too many parameters.</string></value>"));
    }
}
