// Copyright 2014-2015 Galen Clark Haynes
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Streaming XML-RPC decoding.
//!
//! [`Decoder`] is a pull-based automaton: the caller feeds it one tokenizer
//! [`Event`] at a time and gets back each `<param>` value as soon as its
//! closing tag is seen. Nesting is tracked with an explicit stack holding one
//! frame per open element, so arrays and structs of any depth decode without
//! recursion and without ever building a document tree.
//!
//! [`Decoder::run`] drives the automaton from the xml-rs pull parser, which is
//! what [`decode_response`] and [`decode_call`] use.

use std::fmt;
use std::io::Read;

use xml::reader::{ParserConfig, XmlEvent};

use crate::error::{Error, Result};
use crate::xmlrpc::iso8601;
use crate::xmlrpc::protocol::Fault;
use crate::xmlrpc::value::{Struct, Value};

/// Shortcut function to decode the params of a `methodResponse`.
///
/// A `<fault>` response fails with [`Error::Fault`].
pub fn decode_response(xml: &str) -> Result<Vec<Value>> {
    decode_response_from(xml.as_bytes())
}

pub fn decode_response_from<R: Read>(source: R) -> Result<Vec<Value>> {
    Decoder::new().run(source).map(|decoded| decoded.params)
}

/// Decodes a `methodCall` into its method name and params.
pub fn decode_call(xml: &str) -> Result<(String, Vec<Value>)> {
    let decoded = Decoder::new().run(xml.as_bytes())?;
    match decoded.method_name {
        Some(name) => Ok((name, decoded.params)),
        None => Err(Error::MalformedDocument(
            "methodCall without a <methodName>".to_string(),
        )),
    }
}

/// One tokenizer notification, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event<'a> {
    StartElement(&'a str),
    EndElement(&'a str),
    /// Text content. One text node may arrive split over several events.
    Characters(&'a str),
    EndDocument,
}

/// Everything a full decode pass produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    /// Set when the document was a `methodCall`.
    pub method_name: Option<String>,
    pub params: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LeafKind {
    Boolean,
    Int,
    Double,
    String,
    Nil,
    DateTime,
}

impl LeafKind {
    fn from_tag(tag: &str) -> Option<LeafKind> {
        match tag {
            "boolean" => Some(LeafKind::Boolean),
            "int" | "i4" => Some(LeafKind::Int),
            "double" => Some(LeafKind::Double),
            "string" => Some(LeafKind::String),
            "nil" => Some(LeafKind::Nil),
            "dateTime.iso8601" => Some(LeafKind::DateTime),
            _ => None,
        }
    }

    fn interpret(self, tag: &str, text: String) -> Result<Value> {
        let malformed_number = |text: &str| Error::MalformedNumber {
            tag: tag.to_string(),
            text: text.to_string(),
        };
        match self {
            LeafKind::Boolean => Ok(Value::Boolean(text.trim() == "1")),
            LeafKind::Int => text
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| malformed_number(&text)),
            LeafKind::Double => text
                .trim()
                .parse::<f64>()
                .map(Value::Double)
                .map_err(|_| malformed_number(&text)),
            LeafKind::String => Ok(Value::String(text)),
            LeafKind::Nil => Ok(Value::Nil),
            LeafKind::DateTime => iso8601::decode_iso8601(text.trim()).map(Value::DateTime),
        }
    }
}

/// One open element.
#[derive(Debug)]
enum Frame {
    /// `methodCall`, `methodResponse`, `params` and anything else outside a
    /// param that carries no data.
    Envelope(String),
    MethodName(String),
    Param(Option<Value>),
    Fault(Option<Value>),
    /// The typed child once it has closed, and any bare text, which is a
    /// string when no type element shows up.
    Value { typed: Option<Value>, text: String },
    Leaf { kind: LeafKind, tag: String, text: String },
    Array(Vec<Value>),
    Data(Vec<Value>),
    Struct(Struct),
    Member { name: Option<String>, value: Option<Value> },
    Name(String),
}

impl Frame {
    fn tag(&self) -> &str {
        match *self {
            Frame::Envelope(ref tag) => tag,
            Frame::MethodName(_) => "methodName",
            Frame::Param(_) => "param",
            Frame::Fault(_) => "fault",
            Frame::Value { .. } => "value",
            Frame::Leaf { ref tag, .. } => tag,
            Frame::Array(_) => "array",
            Frame::Data(_) => "data",
            Frame::Struct(_) => "struct",
            Frame::Member { .. } => "member",
            Frame::Name(_) => "name",
        }
    }
}

fn is_value_content(tag: &str) -> bool {
    LeafKind::from_tag(tag).is_some()
        || matches!(tag, "value" | "array" | "data" | "struct" | "member" | "name")
}

fn malformed<T>(reason: impl fmt::Display) -> Result<T> {
    Err(Error::MalformedDocument(reason.to_string()))
}

/// The decode automaton. One instance decodes one document.
pub struct Decoder<'a> {
    stack: Vec<Frame>,
    method_name: Option<String>,
    fault: Option<Fault>,
    ended: bool,
    trace: Option<Box<dyn FnMut(&Event<'_>) + 'a>>,
}

impl<'a> Default for Decoder<'a> {
    fn default() -> Self {
        Decoder::new()
    }
}

impl<'a> Decoder<'a> {
    pub fn new() -> Decoder<'a> {
        Decoder {
            stack: Vec::new(),
            method_name: None,
            fault: None,
            ended: false,
            trace: None,
        }
    }

    /// Calls `trace` with every event before it is processed.
    pub fn with_trace<F>(mut self, trace: F) -> Decoder<'a>
    where
        F: FnMut(&Event<'_>) + 'a,
    {
        self.trace = Some(Box::new(trace));
        self
    }

    /// Current nesting depth.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Parses `source` with xml-rs and feeds every event through the automaton.
    pub fn run<R: Read>(mut self, source: R) -> Result<Decoded> {
        let reader = ParserConfig::new()
            .cdata_to_characters(true)
            .ignore_comments(true)
            .create_reader(source);

        let mut params = Vec::new();
        for event in reader {
            let completed = match event? {
                XmlEvent::StartElement { ref name, .. } => {
                    self.feed(Event::StartElement(&name.local_name))?
                }
                XmlEvent::EndElement { ref name } => self.feed(Event::EndElement(&name.local_name))?,
                XmlEvent::Characters(ref text)
                | XmlEvent::Whitespace(ref text)
                | XmlEvent::CData(ref text) => self.feed(Event::Characters(text))?,
                XmlEvent::EndDocument => self.feed(Event::EndDocument)?,
                _ => None,
            };
            params.extend(completed);
        }

        let method_name = self.finish()?;
        debug!("decoded {} param(s)", params.len());
        Ok(Decoded {
            method_name,
            params,
        })
    }

    /// Advances the automaton by one event.
    ///
    /// Returns the value of a `<param>` when this event closes it.
    pub fn feed(&mut self, event: Event<'_>) -> Result<Option<Value>> {
        trace!("{:?} at depth {}", event, self.stack.len());
        if let Some(ref mut trace) = self.trace {
            trace(&event);
        }
        if self.ended {
            return malformed(format!("{:?} after the end of the document", event));
        }

        match event {
            Event::StartElement(tag) => self.start_element(tag).map(|_| None),
            Event::EndElement(tag) => self.end_element(tag),
            Event::Characters(text) => {
                self.characters(text);
                Ok(None)
            }
            Event::EndDocument => {
                self.ended = true;
                self.check_closed().map(|_| None)
            }
        }
    }

    /// Ends the pass, returning the method name of a `methodCall`.
    ///
    /// Fails if an element is still open, or with [`Error::Fault`] if the
    /// document was a fault response.
    pub fn finish(self) -> Result<Option<String>> {
        self.check_closed()?;
        match self.fault {
            Some(fault) => Err(Error::Fault(fault)),
            None => Ok(self.method_name),
        }
    }

    fn check_closed(&self) -> Result<()> {
        match self.stack.last() {
            Some(frame) => malformed(format!(
                "document ended with <{}> still open ({} unclosed)",
                frame.tag(),
                self.stack.len()
            )),
            None => Ok(()),
        }
    }

    fn start_element(&mut self, tag: &str) -> Result<()> {
        let frame = match self.stack.last_mut() {
            None | Some(Frame::Envelope(_)) => match tag {
                "param" => Frame::Param(None),
                "fault" => Frame::Fault(None),
                "methodName" => Frame::MethodName(String::new()),
                _ if is_value_content(tag) => return malformed(format!("<{}> outside of a param", tag)),
                _ => Frame::Envelope(tag.to_string()),
            },
            Some(Frame::Param(_)) | Some(Frame::Fault(_)) | Some(Frame::Data(_)) => match tag {
                "value" => Frame::Value {
                    typed: None,
                    text: String::new(),
                },
                _ => return malformed(format!("<{}> where a <value> was expected", tag)),
            },
            Some(Frame::Value { typed: Some(v), .. }) => {
                return malformed(format!("<{}> after <{}> in the same value", tag, v.type_name()));
            }
            Some(Frame::Value { typed: None, .. }) => match tag {
                "array" => Frame::Array(Vec::new()),
                "struct" => Frame::Struct(Struct::new()),
                _ => match LeafKind::from_tag(tag) {
                    Some(kind) => Frame::Leaf {
                        kind,
                        tag: tag.to_string(),
                        text: String::new(),
                    },
                    None => return Err(Error::UnknownType(tag.to_string())),
                },
            },
            Some(Frame::Array(_)) => match tag {
                "data" => Frame::Data(Vec::new()),
                _ => return malformed(format!("<{}> inside <array>, expected <data>", tag)),
            },
            Some(Frame::Struct(_)) => match tag {
                "member" => Frame::Member {
                    name: None,
                    value: None,
                },
                _ => return malformed(format!("<{}> inside <struct>, expected <member>", tag)),
            },
            Some(Frame::Member { name, .. }) => match tag {
                "name" if name.is_some() => return malformed("<member> with two names"),
                "name" => Frame::Name(String::new()),
                "value" => Frame::Value {
                    typed: None,
                    text: String::new(),
                },
                _ => return malformed(format!("<{}> inside <member>", tag)),
            },
            Some(frame) => {
                return malformed(format!("<{}> inside <{}> text", tag, frame.tag()));
            }
        };
        self.stack.push(frame);
        Ok(())
    }

    fn characters(&mut self, chunk: &str) {
        match self.stack.last_mut() {
            Some(Frame::Leaf { text, .. })
            | Some(Frame::Name(text))
            | Some(Frame::MethodName(text))
            | Some(Frame::Value { typed: None, text }) => text.push_str(chunk),
            // whitespace between structural tags
            _ => {}
        }
    }

    fn end_element(&mut self, tag: &str) -> Result<Option<Value>> {
        let frame = match self.stack.pop() {
            Some(frame) => frame,
            None => return malformed(format!("unexpected </{}>", tag)),
        };
        if frame.tag() != tag {
            return malformed(format!("expected </{}>, found </{}>", frame.tag(), tag));
        }

        match frame {
            Frame::Envelope(_) => {}
            Frame::MethodName(name) => self.method_name = Some(name),
            Frame::Param(Some(value)) => return Ok(Some(value)),
            Frame::Param(None) => return malformed("<param> without a <value>"),
            Frame::Fault(Some(value)) => self.fault = Some(Fault::from_value(&value)?),
            Frame::Fault(None) => return malformed("<fault> without a <value>"),
            Frame::Leaf { kind, tag, text } => {
                let value = kind.interpret(&tag, text)?;
                self.attach_typed(value)?;
            }
            Frame::Array(items) => self.attach_typed(Value::Array(items))?,
            Frame::Struct(members) => self.attach_typed(Value::Struct(members))?,
            Frame::Data(items) => match self.stack.last_mut() {
                Some(Frame::Array(array)) => array.extend(items),
                _ => return malformed("<data> outside of <array>"),
            },
            Frame::Value { typed, text } => {
                let value = typed.unwrap_or(Value::String(text));
                self.attach_value(value)?;
            }
            Frame::Name(key) => match self.stack.last_mut() {
                Some(Frame::Member { name, .. }) => *name = Some(key),
                _ => return malformed("<name> outside of <member>"),
            },
            Frame::Member { name, value } => {
                let (key, value) = match (name, value) {
                    (Some(key), Some(value)) => (key, value),
                    (None, _) => return malformed("<member> without a <name>"),
                    (_, None) => return malformed("<member> without a <value>"),
                };
                match self.stack.last_mut() {
                    Some(Frame::Struct(members)) => {
                        members.insert(key, value);
                    }
                    _ => return malformed("<member> outside of <struct>"),
                }
            }
        }
        Ok(None)
    }

    /// Hands a closed type element to its `<value>`.
    fn attach_typed(&mut self, value: Value) -> Result<()> {
        match self.stack.last_mut() {
            Some(Frame::Value { typed, .. }) if typed.is_none() => {
                *typed = Some(value);
                Ok(())
            }
            _ => malformed(format!("<{}> outside of a <value>", value.type_name())),
        }
    }

    /// Hands a closed `<value>` to whatever holds it.
    fn attach_value(&mut self, value: Value) -> Result<()> {
        let slot = match self.stack.last_mut() {
            Some(Frame::Data(items)) => {
                items.push(value);
                return Ok(());
            }
            Some(Frame::Param(slot))
            | Some(Frame::Fault(slot))
            | Some(Frame::Member { value: slot, .. }) => slot,
            _ => return malformed("stray <value>"),
        };
        if slot.is_some() {
            return malformed("two <value> elements where one was expected");
        }
        *slot = Some(value);
        Ok(())
    }
}
