//! Format adapters: external text in, UDM tree out, and back.
//!
//! Every adapter implements [`FormatParser`] or [`FormatSerializer`] (most
//! implement both), so the pipeline never knows which concrete format it is
//! moving data through. Object attributes survive formats without a native
//! attribute notion by round-tripping as `@`-prefixed keys.

pub mod csv;
pub mod json;
pub mod yaml;

use std::fmt;

use crate::ast::Format;
use crate::udm::Node;

#[derive(Debug)]
pub enum FormatError {
    /// Format declared in the grammar but not shipped by this build
    Unsupported(Format),
    /// Input text the format's own parser rejected
    Syntax(String),
    /// Structurally valid input the UDM (or the target format) cannot hold
    Shape(String),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::Unsupported(format) => {
                write!(f, "format '{}' is not supported by this build", format)
            }
            FormatError::Syntax(message) => write!(f, "syntax error: {}", message),
            FormatError::Shape(message) => write!(f, "shape error: {}", message),
        }
    }
}

impl std::error::Error for FormatError {}

/// Parses external text into a UDM tree.
pub trait FormatParser {
    fn parse(&self, text: &str) -> Result<Node, FormatError>;
}

/// Serializes a UDM tree to external text.
pub trait FormatSerializer {
    fn serialize(&self, node: &Node) -> Result<String, FormatError>;
}

pub fn parser_for(format: Format) -> Result<Box<dyn FormatParser>, FormatError> {
    match format {
        Format::Json => Ok(Box::new(json::JsonAdapter::new(false))),
        Format::Yaml => Ok(Box::new(yaml::YamlAdapter)),
        Format::Csv => Ok(Box::new(csv::CsvAdapter)),
        Format::Xml => Err(FormatError::Unsupported(Format::Xml)),
    }
}

pub fn serializer_for(format: Format, pretty: bool) -> Result<Box<dyn FormatSerializer>, FormatError> {
    match format {
        Format::Json => Ok(Box::new(json::JsonAdapter::new(pretty))),
        Format::Yaml => Ok(Box::new(yaml::YamlAdapter)),
        Format::Csv => Ok(Box::new(csv::CsvAdapter)),
        Format::Xml => Err(FormatError::Unsupported(Format::Xml)),
    }
}
