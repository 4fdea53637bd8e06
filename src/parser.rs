//! Table-driven SLR(1) parsing producing a concrete parse tree.
//!
//! The parser owns no grammar knowledge of its own: everything is driven by
//! the precomputed transition and reduction tables. It keeps two stacks in
//! lockstep, one of states and one of subtrees, and runs the canonical
//! reduce-then-shift loop over the BOF/EOF-augmented token stream. A token
//! that cannot be shifted aborts with its 1-based position; the final reduce
//! against the synthetic `.ACCEPT` lookahead collapses the stacks into the
//! single result tree.

use crate::error::{CompileError, CompileResult};
use crate::grammar::{Cfg, ParseTables, ACCEPT_MARKER};
use crate::tree::ParseNode;

const BOF: &str = "BOF";
const EOF: &str = "EOF";

struct Slr1<'a> {
  cfg: &'a Cfg,
  tables: &'a ParseTables,
  node_stack: Vec<ParseNode>,
  state_stack: Vec<usize>,
}

impl Slr1<'_> {
  /// The state stack never holds the initial state; an empty stack means we
  /// are back at state 0.
  fn top_state(&self) -> usize {
    self.state_stack.last().copied().unwrap_or(0)
  }

  /// Pop one subtree and state per right-hand-side symbol, push the new
  /// interior node and follow the goto edge on its left-hand side. The
  /// accepting reduce empties the stack; no table defines a goto over the
  /// start symbol, so that case lands back on the initial state directly.
  fn reduce(&mut self, rule: usize) {
    let prod = self.cfg.production(rule);
    let count = prod.rhs.len();
    let children = self.node_stack.split_off(self.node_stack.len() - count);
    self.state_stack.truncate(self.state_stack.len() - count);
    self
      .node_stack
      .push(ParseNode::interior(prod.lhs.clone(), prod.rhs.clone(), children));

    let next = match self.state_stack.last() {
      Some(&state) => self
        .tables
        .transition(state, &prod.lhs)
        .expect("parse tables are missing a goto entry"),
      None => 0,
    };
    self.state_stack.push(next);
  }

  fn shift(&mut self, kind: &str, lexeme: &str) -> bool {
    match self.tables.transition(self.top_state(), kind) {
      Some(next) => {
        self.node_stack.push(ParseNode::leaf(kind, lexeme));
        self.state_stack.push(next);
        true
      }
      None => false,
    }
  }
}

/// Parse a stream of `(kind, lexeme)` pairs. The stream is augmented with
/// `BOF`/`EOF` markers here, so callers pass exactly what the scanner
/// produced.
pub fn parse(
  tokens: Vec<(String, String)>,
  cfg: &Cfg,
  tables: &ParseTables,
) -> CompileResult<ParseNode> {
  let mut input = Vec::with_capacity(tokens.len() + 2);
  input.push((BOF.to_string(), BOF.to_string()));
  input.extend(tokens);
  input.push((EOF.to_string(), EOF.to_string()));

  let first_state = tables
    .transition(0, BOF)
    .ok_or_else(|| CompileError::tables("no transition on BOF from the initial state"))?;
  let mut machine = Slr1 {
    cfg,
    tables,
    node_stack: vec![ParseNode::leaf(BOF, BOF)],
    state_stack: vec![first_state],
  };

  for (k, (kind, lexeme)) in input.iter().enumerate().skip(1) {
    while let Some(rule) = tables.reduction(machine.top_state(), kind) {
      machine.reduce(rule);
    }
    if !machine.shift(kind, lexeme) {
      return Err(CompileError::ParseFailure { position: k });
    }
  }

  let accept = tables
    .reduction(machine.top_state(), ACCEPT_MARKER)
    .ok_or(CompileError::ParseFailure {
      position: input.len() - 1,
    })?;
  machine.reduce(accept);

  Ok(
    machine
      .node_stack
      .pop()
      .expect("accepting reduce leaves the result tree"),
  )
}
