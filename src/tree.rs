//! The concrete parse tree shared by the parser, annotator and generator.
//!
//! A node prints as one line of the pre-order listing: `KIND lexeme` for a
//! leaf, `lhs rhs...` (or `lhs .EMPTY`) for an interior node, with an
//! ` : int` / ` : int*` suffix once annotation has set a type. The listing is
//! the contract between the stage programs, so this module also knows how to
//! rebuild a tree from it; telling a leaf line from an interior one takes the
//! grammar's non-terminal set and nothing else.

use crate::grammar::{Cfg, EMPTY_MARKER};
use crate::ty::VarType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseNode {
  pub kind: String,
  /// The source slice, for leaves only.
  pub lexeme: Option<String>,
  /// The production right-hand side, for interior nodes only.
  pub rhs: Vec<String>,
  pub ty: Option<VarType>,
  pub children: Vec<ParseNode>,
}

impl ParseNode {
  pub fn leaf(kind: impl Into<String>, lexeme: impl Into<String>) -> Self {
    Self {
      kind: kind.into(),
      lexeme: Some(lexeme.into()),
      rhs: Vec::new(),
      ty: None,
      children: Vec::new(),
    }
  }

  pub fn interior(
    kind: impl Into<String>,
    rhs: Vec<String>,
    children: Vec<ParseNode>,
  ) -> Self {
    Self {
      kind: kind.into(),
      lexeme: None,
      rhs,
      ty: None,
      children,
    }
  }

  pub fn is_leaf(&self) -> bool {
    self.lexeme.is_some()
  }

  /// The leaf's lexeme. Calling this on an interior node is a logic error;
  /// the annotator only does so where the grammar guarantees a leaf.
  pub fn lexeme(&self) -> &str {
    self.lexeme.as_deref().expect("lexeme of an interior node")
  }

  /// The node's line in the pre-order listing, without the type suffix.
  pub fn line(&self) -> String {
    match &self.lexeme {
      Some(lexeme) => format!("{} {}", self.kind, lexeme),
      None if self.rhs.is_empty() => format!("{} {}", self.kind, EMPTY_MARKER),
      None => format!("{} {}", self.kind, self.rhs.join(" ")),
    }
  }

  fn write_preorder(&self, out: &mut String) {
    out.push_str(&self.line());
    if let Some(ty) = self.ty {
      out.push_str(" : ");
      out.push_str(&ty.to_string());
    }
    out.push('\n');
    for child in &self.children {
      child.write_preorder(out);
    }
  }

  /// The full pre-order listing, one line per node.
  pub fn preorder(&self) -> String {
    let mut out = String::new();
    self.write_preorder(&mut out);
    out
  }
}

/// Rebuild a tree from its pre-order listing. Returns `None` when the
/// listing ends before every announced child has been read.
pub fn read_tree(input: &str, cfg: &Cfg) -> Option<ParseNode> {
  let mut lines = input.lines();
  read_node(&mut lines, cfg)
}

fn read_node<'a>(
  lines: &mut impl Iterator<Item = &'a str>,
  cfg: &Cfg,
) -> Option<ParseNode> {
  let line = lines.next()?;
  let mut words: Vec<&str> = line.split_whitespace().collect();
  if words.is_empty() {
    return None;
  }

  let mut ty = None;
  if let Some(pos) = words.iter().position(|w| *w == ":") {
    ty = words.get(pos + 1).and_then(|w| w.parse().ok());
    words.truncate(pos);
  }
  let kind = *words.first()?;
  let mut node = if cfg.is_non_terminal(kind) {
    let rhs: Vec<String> = words[1..]
      .iter()
      .filter(|w| **w != EMPTY_MARKER)
      .map(|w| w.to_string())
      .collect();
    let mut children = Vec::with_capacity(rhs.len());
    for _ in 0..rhs.len() {
      children.push(read_node(lines, cfg)?);
    }
    ParseNode::interior(kind, rhs, children)
  } else {
    ParseNode::leaf(kind, *words.get(1).unwrap_or(&""))
  };
  node.ty = ty;
  Some(node)
}

/// Pre-order listing fragments used by the annotator and generator tests.
#[cfg(test)]
pub(crate) mod listings {
  use crate::grammar::{load_cfg, Cfg};

  pub fn wlp4_cfg() -> Cfg {
    load_cfg(include_str!("../data/wlp4.cfg")).unwrap()
  }

  /// `dcl -> type ID` with type `int`.
  pub fn int_dcl(name: &str) -> String {
    format!("dcl type ID\ntype INT\nINT int\nID {name}\n")
  }

  /// `dcl -> type ID` with type `int*`.
  pub fn ptr_dcl(name: &str) -> String {
    format!("dcl type ID\ntype INT STAR\nINT int\nSTAR *\nID {name}\n")
  }

  /// An `expr` that is just a variable reference.
  pub fn id_expr(name: &str) -> String {
    format!("expr term\nterm factor\nfactor ID\nID {name}\n")
  }

  /// An `expr` that is just a number literal.
  pub fn num_expr(value: &str) -> String {
    format!("expr term\nterm factor\nfactor NUM\nNUM {value}\n")
  }

  /// `expr -> expr (PLUS|MINUS) term` over two existing listings. The right
  /// operand must itself be an `expr` listing; its outer `expr term` line is
  /// stripped down to the `term` subtree.
  pub fn binary_expr(op: &str, lexeme: &str, left: &str, right: &str) -> String {
    let right_term = right
      .strip_prefix("expr term\n")
      .expect("right operand reduces to a term");
    format!("expr expr {op} term\n{left}{op} {lexeme}\n{right_term}")
  }

  /// A whole-program listing with `wain` as the only procedure.
  pub fn wain(dcl1: &str, dcl2: &str, dcls: &str, stmts: &str, ret: &str) -> String {
    format!(
      "start BOF procedures EOF\n\
       BOF BOF\n\
       procedures main\n\
       {}\
       EOF EOF\n",
      main_proc(dcl1, dcl2, dcls, stmts, ret)
    )
  }

  pub fn main_proc(dcl1: &str, dcl2: &str, dcls: &str, stmts: &str, ret: &str) -> String {
    format!(
      "main INT WAIN LPAREN dcl COMMA dcl RPAREN LBRACE dcls statements RETURN expr SEMI RBRACE\n\
       INT int\n\
       WAIN wain\n\
       LPAREN (\n\
       {dcl1}\
       COMMA ,\n\
       {dcl2}\
       RPAREN )\n\
       LBRACE {{\n\
       {dcls}\
       {stmts}\
       RETURN return\n\
       {ret}\
       SEMI ;\n\
       RBRACE }}\n"
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::grammar::load_cfg;

  fn wlp4_cfg() -> Cfg {
    load_cfg(include_str!("../data/wlp4.cfg")).unwrap()
  }

  const EXPR_LISTING: &str = "\
expr expr PLUS term : int
expr term : int
term factor : int
factor NUM : int
NUM 1 : int
PLUS +
term factor : int
factor ID : int
ID x : int
";

  #[test]
  fn reads_and_reprints_a_typed_listing() {
    let cfg = wlp4_cfg();
    let tree = read_tree(EXPR_LISTING, &cfg).unwrap();
    assert_eq!(tree.kind, "expr");
    assert_eq!(tree.ty, Some(VarType::Int));
    assert_eq!(tree.children.len(), 3);
    assert_eq!(tree.children[1].lexeme(), "+");
    assert_eq!(tree.children[1].ty, None);
    assert_eq!(tree.preorder(), EXPR_LISTING);
  }

  #[test]
  fn empty_production_has_no_children() {
    let cfg = wlp4_cfg();
    let tree = read_tree("dcls .EMPTY\n", &cfg).unwrap();
    assert!(tree.children.is_empty());
    assert_eq!(tree.line(), "dcls .EMPTY");
  }

  #[test]
  fn truncated_listing_is_rejected() {
    let cfg = wlp4_cfg();
    assert!(read_tree("expr expr PLUS term\nexpr term\n", &cfg).is_none());
  }

  #[test]
  fn leaf_listing_keeps_its_lexeme() {
    let cfg = wlp4_cfg();
    let tree = read_tree("ID counter\n", &cfg).unwrap();
    assert!(tree.is_leaf());
    assert_eq!(tree.lexeme(), "counter");
  }
}
