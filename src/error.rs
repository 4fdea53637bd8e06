//! Shared error types used across the compilation pipeline.
//!
//! Every stage aborts on its first error, so the types here stay simple: a
//! tagged kind plus enough context to print one diagnostic line. `Display`
//! output always begins with `ERROR`, which lets the stage drivers print the
//! value verbatim to stderr and exit non-zero.

use snafu::Snafu;

pub type CompileResult<T> = Result<T, CompileError>;
pub type AsmResult<T> = Result<T, AsmError>;

/// Errors raised by the compiler stages (scanner through code generator).
#[derive(Debug, Snafu)]
pub enum CompileError {
  /// The scanner got stuck in a non-accepting state.
  #[snafu(display("ERROR: Unaccepted token attempt - {lexeme}"))]
  UnrecognizedToken { lexeme: String },

  /// A NUM lexeme denotes a value above 2^31 - 1.
  #[snafu(display("ERROR: Number out of bounds --> {lexeme}"))]
  NumberOutOfBounds { lexeme: String },

  /// The parser could not shift the token at the given 1-based position in
  /// the BOF/EOF-augmented input.
  #[snafu(display("ERROR at {position}"))]
  ParseFailure { position: usize },

  /// A WLP4 typing rule was violated.
  #[snafu(display("ERROR: {message}"))]
  Semantic { message: String },

  /// The parser-table blob could not be understood.
  #[snafu(display("ERROR: {message}"))]
  InvalidTables { message: String },
}

impl CompileError {
  /// Shorthand for the semantic-analysis errors, which are all built from
  /// ad-hoc message strings at the failure site.
  pub fn semantic(message: impl Into<String>) -> Self {
    CompileError::Semantic {
      message: message.into(),
    }
  }

  pub fn tables(message: impl Into<String>) -> Self {
    CompileError::InvalidTables {
      message: message.into(),
    }
  }
}

/// Errors raised by the assembler. Each variant carries the offending source
/// line (the joined lexemes of its tokens) so the diagnostic can point at it.
#[derive(Debug, Snafu)]
pub enum AsmError {
  #[snafu(display("ERROR: {message}\n\t ==> {line}"))]
  ScanFailure { message: String, line: String },

  #[snafu(display("ERROR: Not an operation - {lexeme}\n\t ==> {line}"))]
  NotAnOperation { lexeme: String, line: String },

  #[snafu(display("ERROR: Invalid MIPS instruction - {lexeme}\n\t ==> {line}"))]
  InvalidOpcode { lexeme: String, line: String },

  #[snafu(display("ERROR: Missing instruction operands\n\t ==> {line}"))]
  MissingOperands { line: String },

  #[snafu(display("ERROR: Too many instruction operands\n\t ==> {line}"))]
  TooManyOperands { line: String },

  #[snafu(display("ERROR: Unexpected token found - {lexeme}\n\t ==> {line}"))]
  UnexpectedToken { lexeme: String, line: String },

  #[snafu(display("ERROR: Invalid register number - {lexeme}\n\t ==> {line}"))]
  RegisterRange { lexeme: String, line: String },

  #[snafu(display("ERROR: Immediate is out of bounds - {lexeme}\n\t ==> {line}"))]
  ImmediateRange { lexeme: String, line: String },

  #[snafu(display("ERROR: Label was not declared - {lexeme}\n\t ==> {line}"))]
  UndeclaredLabel { lexeme: String, line: String },

  #[snafu(display("ERROR: Label already declared - {lexeme}\n\t ==> {line}"))]
  DuplicateLabel { lexeme: String, line: String },
}
