//! Validate graft scripts without executing them

use super::CliError;
use crate::ast::Header;
use crate::script;

/// Compile a script and report its header on success.
pub fn execute_check(source: &str) -> Result<Header, CliError> {
    let program = script::compile(source)?;
    Ok(program.header)
}
