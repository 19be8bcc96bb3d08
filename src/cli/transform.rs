//! Execute graft scripts against input documents

use super::CliError;
use crate::builtins::Builtins;
use crate::evaluator::Evaluator;
use crate::format::{parser_for, serializer_for};
use crate::script;

/// Options for the run command
#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    /// The script source text
    pub script: String,
    /// The input document text
    pub input: Option<String>,
    /// Pretty-print the output
    pub pretty: bool,
}

/// Compile the script, parse the input in the declared format, evaluate,
/// and serialize the result in the declared output format.
pub fn execute_transform(options: &TransformOptions) -> Result<String, CliError> {
    let program = script::compile(&options.script)?;
    log::debug!(
        "compiled script: version {}, input {}, output {}",
        program.header.version,
        program.header.input,
        program.header.output
    );

    let input_text = options.input.as_ref().ok_or(CliError::NoInput)?;
    let input = parser_for(program.header.input)?.parse(input_text)?;

    let registry = Builtins::new();
    let evaluator = Evaluator::new(&registry);
    let result = evaluator.execute(&program, input)?;

    let output = serializer_for(program.header.output, options.pretty)?.serialize(&result)?;
    Ok(output)
}
