//! Crate root: wires together the WLP4 compilation pipeline.
//!
//! The stages are intentionally small and composable so each can also run as
//! its own program over the textual stage formats:
//! - `scanner` performs lexical analysis and produces a flat token stream.
//! - `parser` runs the table-driven SLR(1) loop and returns a parse tree.
//! - `typechecker` builds the procedure tables and decorates the tree with
//!   types.
//! - `codegen` lowers the decorated tree into MIPS assembly text.
//! - `assembler` turns assembly text into big-endian 32-bit words.
//! - `grammar`, `tree`, `dfa` and `ty` hold the values those stages exchange;
//!   `error` centralises the reporting types shared by all of them.

pub mod assembler;
pub mod codegen;
pub mod dfa;
pub mod error;
pub mod grammar;
pub mod parser;
pub mod scanner;
pub mod tree;
pub mod ty;
pub mod typechecker;

pub use error::{AsmError, AsmResult, CompileError, CompileResult};

/// Compile WLP4 source text into MIPS assembly, driving every stage in
/// memory. `tables_blob` is the sectioned grammar-and-tables resource the
/// parser is driven by.
pub fn compile(source: &str, tables_blob: &str) -> CompileResult<String> {
  let tokens = scanner::scan(source)?;
  let (cfg, tables) = grammar::load_tables(tables_blob)?;

  let pairs = tokens
    .into_iter()
    .map(|token| (token.kind.to_string(), token.lexeme))
    .collect();
  let tree = parser::parse(pairs, &cfg, &tables)?;

  let tree = typechecker::annotate(tree)?;
  Ok(codegen::generate(&tree))
}

/// Assemble MIPS assembly text into instruction words.
pub fn assemble(source: &str) -> AsmResult<Vec<u32>> {
  let program = assembler::scan_program(source)?;
  assembler::Assembler::new(program).assemble()
}
