//! Script compilation: header parsing plus the lex/parse pipeline.
//!
//! A script is a header block, a `---` separator line, and a body
//! expression:
//!
//! ```text
//! %graft 1.0
//! input json
//! output yaml
//! ---
//! input.orders |> filter(o => o.total > 100)
//! ```
//!
//! The body is lexed with its real line numbers so diagnostics point into
//! the file the user wrote, not into a detached body string.

use std::fmt;

use crate::ast::{Expr, Format, Header, Program};
use crate::lexer::{LexError, Lexer};
use crate::parser::{ParseError, Parser};

#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    /// Malformed header block, reported by 1-based line number
    Header { line: usize, message: String },
    Lex(LexError),
    Parse(ParseError),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Header { line, message } => {
                write!(f, "Header error at line {}: {}", line, message)
            }
            CompileError::Lex(e) => write!(f, "{}", e),
            CompileError::Parse(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<LexError> for CompileError {
    fn from(e: LexError) -> Self {
        CompileError::Lex(e)
    }
}

impl From<ParseError> for CompileError {
    fn from(e: ParseError) -> Self {
        CompileError::Parse(e)
    }
}

/// Compile a full script (header, separator, body) into a program.
pub fn compile(source: &str) -> Result<Program, CompileError> {
    let lines: Vec<&str> = source.lines().collect();

    let mut version: Option<String> = None;
    let mut input: Option<Format> = None;
    let mut output: Option<Format> = None;
    let mut separator: Option<usize> = None;

    for (index, raw) in lines.iter().enumerate() {
        let line_number = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        if line == "---" {
            separator = Some(line_number);
            break;
        }

        if let Some(rest) = line.strip_prefix('%') {
            let mut parts = rest.split_whitespace();
            match (parts.next(), parts.next(), parts.next()) {
                (Some("graft"), Some(v), None) => {
                    if version.is_some() {
                        return Err(CompileError::Header {
                            line: line_number,
                            message: "duplicate %graft directive".to_string(),
                        });
                    }
                    version = Some(v.to_string());
                }
                _ => {
                    return Err(CompileError::Header {
                        line: line_number,
                        message: format!("unrecognized directive '%{}'", rest),
                    });
                }
            }
            continue;
        }

        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(keyword @ ("input" | "output")), Some(name), None) => {
                let format = Format::from_name(name).ok_or_else(|| CompileError::Header {
                    line: line_number,
                    message: format!("unknown format '{}'", name),
                })?;
                let slot = if keyword == "input" { &mut input } else { &mut output };
                if slot.is_some() {
                    return Err(CompileError::Header {
                        line: line_number,
                        message: format!("duplicate '{}' declaration", keyword),
                    });
                }
                *slot = Some(format);
            }
            _ => {
                return Err(CompileError::Header {
                    line: line_number,
                    message: format!("unrecognized header line '{}'", line),
                });
            }
        }
    }

    let separator = separator.ok_or(CompileError::Header {
        line: lines.len().max(1),
        message: "missing '---' separator between header and body".to_string(),
    })?;
    let version = version.ok_or(CompileError::Header {
        line: separator,
        message: "missing %graft version directive".to_string(),
    })?;
    let input = input.ok_or(CompileError::Header {
        line: separator,
        message: "missing 'input' format declaration".to_string(),
    })?;
    let output = output.ok_or(CompileError::Header {
        line: separator,
        message: "missing 'output' format declaration".to_string(),
    })?;

    let body = lines[separator..].join("\n");
    let tokens = Lexer::with_start_line(&body, separator + 1).tokenize()?;
    let mut program = Parser::new(tokens).parse_program()?;
    program.header = Header {
        version,
        input,
        output,
    };
    Ok(program)
}

/// Compile a bare expression with no header, for embedding and the REPL
/// style of use in tests.
pub fn compile_expression(source: &str) -> Result<Expr, CompileError> {
    let tokens = Lexer::new(source).tokenize()?;
    Ok(Parser::new(tokens).parse()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_a_minimal_script() {
        let program = compile("%graft 1.0\ninput json\noutput yaml\n---\ninput.a").unwrap();
        assert_eq!(program.header.version, "1.0");
        assert_eq!(program.header.input, Format::Json);
        assert_eq!(program.header.output, Format::Yaml);
    }

    #[test]
    fn header_comments_and_blank_lines_are_skipped() {
        let source = "// orders report\n%graft 1.0\n\ninput json\noutput json\n---\n1";
        assert!(compile(source).is_ok());
    }

    #[test]
    fn missing_separator_is_a_header_error() {
        let result = compile("%graft 1.0\ninput json\noutput json\n1 + 2");
        assert!(matches!(result, Err(CompileError::Header { .. })));
    }

    #[test]
    fn unknown_format_names_the_line() {
        let result = compile("%graft 1.0\ninput toml\noutput json\n---\n1");
        assert!(matches!(result, Err(CompileError::Header { line: 2, .. })));
    }

    #[test]
    fn body_diagnostics_use_file_line_numbers() {
        // body starts at line 5; the stray '&' is on line 6
        let source = "%graft 1.0\ninput json\noutput json\n---\n1 +\n& 2";
        match compile(source) {
            Err(CompileError::Lex(e)) => assert_eq!(e.pos.line, 6),
            other => panic!("expected a lex error, got {:?}", other),
        }
    }

    #[test]
    fn missing_input_declaration_is_rejected() {
        let result = compile("%graft 1.0\noutput json\n---\n1");
        assert!(matches!(result, Err(CompileError::Header { .. })));
    }
}
