//! The WLP4 context-free grammar and the precomputed SLR(1) tables.
//!
//! Both arrive as one textual blob split into marker-delimited sections:
//! `.CFG` lists the productions (insertion order is the production number the
//! tables refer to), `.TRANSITIONS` the `(state, symbol) -> state` edges and
//! `.REDUCTIONS` the `(state, lookahead) -> rule` entries, terminated by
//! `.END`. The blob content itself is opaque configuration; this module only
//! knows its shape.

use crate::dfa::Dfa;
use crate::error::{CompileError, CompileResult};
use std::collections::{HashMap, HashSet};

pub const EMPTY_MARKER: &str = ".EMPTY";
pub const ACCEPT_MARKER: &str = ".ACCEPT";

const CFG_MARKER: &str = ".CFG";
const TRANSITIONS_MARKER: &str = ".TRANSITIONS";
const REDUCTIONS_MARKER: &str = ".REDUCTIONS";
const END_MARKER: &str = ".END";

/// One production rule. `nt_count` caches how many right-hand-side symbols
/// were known to be non-terminals when the rule was inserted.
#[derive(Debug, Clone)]
pub struct Production {
  pub lhs: String,
  pub rhs: Vec<String>,
  pub nt_count: usize,
}

/// A context-free grammar: the start symbol, the numbered production list
/// and the derived terminal/non-terminal sets.
#[derive(Debug, Clone, Default)]
pub struct Cfg {
  start: String,
  prods: Vec<Production>,
  terminals: HashSet<String>,
  non_terminals: HashSet<String>,
}

impl Cfg {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn start(&self) -> &str {
    &self.start
  }

  pub fn production(&self, n: usize) -> &Production {
    &self.prods[n]
  }

  pub fn len(&self) -> usize {
    self.prods.len()
  }

  pub fn is_empty(&self) -> bool {
    self.prods.is_empty()
  }

  pub fn is_terminal(&self, symbol: &str) -> bool {
    self.terminals.contains(symbol)
  }

  pub fn is_non_terminal(&self, symbol: &str) -> bool {
    self.non_terminals.contains(symbol)
  }

  /// Append a production. The first production's left-hand side becomes the
  /// start symbol; a symbol is considered terminal until it shows up on a
  /// left-hand side.
  pub fn add_production(&mut self, lhs: impl Into<String>, rhs: Vec<String>) {
    let lhs = lhs.into();
    if self.prods.is_empty() {
      self.start = lhs.clone();
    }
    if !self.non_terminals.contains(&lhs) {
      self.terminals.remove(&lhs);
      self.non_terminals.insert(lhs.clone());
    }

    let mut nt_count = 0;
    for symbol in &rhs {
      if self.non_terminals.contains(symbol) {
        nt_count += 1;
      } else {
        self.terminals.insert(symbol.clone());
      }
    }
    self.prods.push(Production { lhs, rhs, nt_count });
  }
}

/// The SLR(1) driving tables: a goto/shift automaton over grammar symbols
/// and the per-state reduction map. State 0 is initial.
#[derive(Debug, Clone)]
pub struct ParseTables {
  transitions: Dfa<usize, String>,
  reductions: Vec<HashMap<String, usize>>,
}

impl ParseTables {
  pub fn transition(&self, state: usize, symbol: &str) -> Option<usize> {
    self.transitions.transition(&state, symbol).copied()
  }

  pub fn reduction(&self, state: usize, lookahead: &str) -> Option<usize> {
    self.reductions.get(state)?.get(lookahead).copied()
  }
}

/// Parse a `lhs rhs...` production line into the grammar. `.EMPTY` stands
/// for an empty right-hand side.
fn add_production_line(cfg: &mut Cfg, line: &str) {
  let mut words = line.split_whitespace();
  let Some(lhs) = words.next() else {
    return;
  };
  let rhs: Vec<String> = words
    .filter(|w| *w != EMPTY_MARKER)
    .map(str::to_string)
    .collect();
  cfg.add_production(lhs, rhs);
}

/// Load a grammar from a standalone `.CFG` resource (no table sections).
pub fn load_cfg(text: &str) -> CompileResult<Cfg> {
  let mut lines = text.lines();
  if lines.next().map(str::trim) != Some(CFG_MARKER) {
    return Err(CompileError::tables("expected .CFG header"));
  }

  let mut cfg = Cfg::new();
  for line in lines {
    if !line.trim().is_empty() {
      add_production_line(&mut cfg, line);
    }
  }
  Ok(cfg)
}

/// Load the full parser blob: grammar plus transition and reduction tables.
pub fn load_tables(blob: &str) -> CompileResult<(Cfg, ParseTables)> {
  let mut lines = blob.lines();
  if lines.next().map(str::trim) != Some(CFG_MARKER) {
    return Err(CompileError::tables("expected .CFG header"));
  }

  let mut cfg = Cfg::new();
  loop {
    match lines.next().map(str::trim) {
      Some(TRANSITIONS_MARKER) => break,
      Some("") => {}
      Some(line) => add_production_line(&mut cfg, line),
      None => return Err(CompileError::tables("expected .TRANSITIONS section")),
    }
  }

  let mut transitions: Dfa<usize, String> = Dfa::new(0, true);
  loop {
    match lines.next().map(str::trim) {
      Some(REDUCTIONS_MARKER) => break,
      Some("") => {}
      Some(line) => {
        let mut words = line.split_whitespace();
        let (from, symbol, to) = match (words.next(), words.next(), words.next()) {
          (Some(from), Some(symbol), Some(to)) => (from, symbol, to),
          _ => {
            return Err(CompileError::tables(format!(
              "malformed transition: {line}"
            )))
          }
        };
        let from = parse_state(from, line)?;
        let to = parse_state(to, line)?;
        transitions.add_state(from, true);
        transitions.add_state(to, true);
        transitions.add_transition(from, symbol.to_string(), to);
      }
      None => return Err(CompileError::tables("expected .REDUCTIONS section")),
    }
  }

  let mut reductions: Vec<HashMap<String, usize>> = Vec::new();
  loop {
    match lines.next().map(str::trim) {
      Some(END_MARKER) => break,
      Some("") => {}
      Some(line) => {
        let mut words = line.split_whitespace();
        let (state, rule, lookahead) = match (words.next(), words.next(), words.next()) {
          (Some(state), Some(rule), Some(lookahead)) => (state, rule, lookahead),
          _ => {
            return Err(CompileError::tables(format!(
              "malformed reduction: {line}"
            )))
          }
        };
        let state = parse_state(state, line)?;
        let rule = parse_state(rule, line)?;
        if rule >= cfg.len() {
          return Err(CompileError::tables(format!(
            "reduction names unknown rule: {line}"
          )));
        }
        if state >= reductions.len() {
          reductions.resize_with(state + 1, HashMap::new);
        }
        reductions[state].insert(lookahead.to_string(), rule);
      }
      None => return Err(CompileError::tables("expected .END marker")),
    }
  }

  Ok((
    cfg,
    ParseTables {
      transitions,
      reductions,
    },
  ))
}

fn parse_state(word: &str, line: &str) -> CompileResult<usize> {
  word
    .parse()
    .map_err(|_| CompileError::tables(format!("expected a number in: {line}")))
}
