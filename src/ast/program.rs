use std::fmt;

use crate::ast::{Expr, Statement};

/// Concrete data format named in a script header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
    Csv,
    /// Declared for header compatibility; no adapter ships for it yet.
    Xml,
}

impl Format {
    /// Parse a header format name (`input json`, `output yaml`, ...).
    pub fn from_name(name: &str) -> Option<Format> {
        match name {
            "json" => Some(Format::Json),
            "yaml" => Some(Format::Yaml),
            "csv" => Some(Format::Csv),
            "xml" => Some(Format::Xml),
            _ => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Json => "json",
            Format::Yaml => "yaml",
            Format::Csv => "csv",
            Format::Xml => "xml",
        };
        write!(f, "{}", name)
    }
}

/// Script front matter: version directive plus input/output declarations.
///
/// ```text
/// %graft 1.0
/// input json
/// output yaml
/// ---
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub version: String,
    pub input: Format,
    pub output: Format,
}

impl Default for Header {
    /// Header assumed for bare expressions compiled without front matter.
    fn default() -> Self {
        Header {
            version: "1.0".to_string(),
            input: Format::Json,
            output: Format::Json,
        }
    }
}

/// A complete compiled script.
///
/// Immutable once built; a `Program` is safe to share across threads and
/// evaluate concurrently against different inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub header: Header,

    /// Top-level statements (function definitions), in source order
    pub statements: Vec<Statement>,

    /// The single expression producing the output document
    pub body: Expr,
}
