//! Semantic analysis: build the procedure table and decorate the parse tree
//! with types.
//!
//! The annotator walks the concrete tree once, dispatching on the node kind
//! and the shape of each production. Every procedure gets a `ProcData` with
//! its signature and local types; expression-bearing nodes get an `int` or
//! `int*` tag. The first violated judgment aborts the walk, and nothing of
//! the partially decorated tree escapes.

use crate::error::{CompileError, CompileResult};
use crate::tree::ParseNode;
use crate::ty::VarType;
use std::collections::HashMap;

/// Everything the annotator knows about one procedure.
#[derive(Debug, Clone)]
pub struct ProcData {
  pub id: String,
  pub signature: Vec<VarType>,
  pub locals: HashMap<String, VarType>,
}

impl ProcData {
  fn new(id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      signature: Vec::new(),
      locals: HashMap::new(),
    }
  }
}

struct TypeChecker {
  procs: HashMap<String, ProcData>,
}

/// Decorate `tree` in place and hand it back, or report the first type
/// error. The tree must be the `start` production of a parsed program.
pub fn annotate(mut tree: ParseNode) -> CompileResult<ParseNode> {
  let mut checker = TypeChecker {
    procs: HashMap::new(),
  };
  checker.program(&mut tree)?;
  Ok(tree)
}

fn malformed(kind: &str) -> CompileError {
  CompileError::semantic(format!("(FATAL) Not valid production rule - {kind}"))
}

/// Record `dcl -> type ID` in the procedure's locals, checking duplicates
/// and (for the `dcls` initializer forms) the declared-against-initial type.
/// Returns the declared type.
fn declare(
  table: &mut ProcData,
  node: &mut ParseNode,
  init: Option<&mut ParseNode>,
) -> CompileResult<VarType> {
  let ty = if node.children[0].children.len() == 1 {
    VarType::Int
  } else {
    VarType::IntStar
  };

  let id = node.children[1].lexeme().to_string();
  if table.locals.contains_key(&id) {
    return Err(CompileError::semantic(format!(
      "Variable {id} is already declared."
    )));
  }

  if let Some(value) = init {
    if token_type(value, table)? != ty {
      return Err(CompileError::semantic(format!(
        "Expected type {ty} when initializing {id} in [{}].",
        table.id
      )));
    }
  }

  node.children[1].ty = Some(ty);
  table.locals.insert(id, ty);
  Ok(ty)
}

/// Type one of the expression leaves: NUM, NULL or a variable reference.
fn token_type(node: &mut ParseNode, table: &ProcData) -> CompileResult<VarType> {
  let ty = match node.kind.as_str() {
    "NUM" => VarType::Int,
    "NULL" => VarType::IntStar,
    "ID" => {
      let id = node.lexeme();
      match table.locals.get(id) {
        Some(ty) => *ty,
        None => {
          return Err(CompileError::semantic(format!("Undeclared variable {id}.")))
        }
      }
    }
    kind => {
      return Err(CompileError::semantic(format!(
        "(FATAL) Not valid expression token kind - {kind}"
      )))
    }
  };
  node.ty = Some(ty);
  Ok(ty)
}

/// Fill a procedure's parameter list from `params` / `paramlist`.
fn params(table: &mut ProcData, node: &mut ParseNode) -> CompileResult<()> {
  match node.kind.as_str() {
    "params" => {
      if !node.children.is_empty() {
        params(table, &mut node.children[0])?;
      }
      Ok(())
    }
    "paramlist" => {
      let ty = declare(table, &mut node.children[0], None)?;
      table.signature.push(ty);
      if node.children.len() > 1 {
        params(table, &mut node.children[2])?;
      }
      Ok(())
    }
    kind => Err(malformed(kind)),
  }
}

/// `dcls -> dcls dcl BECOMES (NUM|NULL) SEMI`, right to left as declared.
fn dcls(table: &mut ProcData, node: &mut ParseNode) -> CompileResult<()> {
  if !node.children.is_empty() {
    let (head, tail) = node.children.split_at_mut(1);
    let (decl_part, num_part) = tail.split_at_mut(2);
    declare(table, &mut decl_part[0], Some(&mut num_part[0]))?;
    dcls(table, &mut head[0])?;
  }
  Ok(())
}

impl TypeChecker {
  fn program(&mut self, node: &mut ParseNode) -> CompileResult<()> {
    match node.kind.as_str() {
      // start -> BOF procedures EOF
      "start" => self.program(&mut node.children[1]),

      // procedures -> procedure procedures | main
      "procedures" => {
        self.procedure(&mut node.children[0])?;
        if node.children.len() > 1 {
          self.program(&mut node.children[1])?;
        }
        Ok(())
      }

      kind => Err(malformed(kind)),
    }
  }

  /// Both procedure productions share one shape; only the parameter section
  /// and the child offsets differ:
  ///
  /// procedure -> INT ID LPAREN params RPAREN LBRACE dcls statements RETURN expr SEMI RBRACE
  /// main -> INT WAIN LPAREN dcl COMMA dcl RPAREN LBRACE dcls statements RETURN expr SEMI RBRACE
  fn procedure(&mut self, node: &mut ParseNode) -> CompileResult<()> {
    let is_main = node.kind == "main";
    let proc_id = node.children[1].lexeme().to_string();
    if self.procs.contains_key(&proc_id) {
      return Err(CompileError::semantic(format!(
        "Procedure {proc_id} is already declared."
      )));
    }

    let mut table = ProcData::new(&proc_id);
    let body = if is_main {
      declare(&mut table, &mut node.children[3], None)?;
      if declare(&mut table, &mut node.children[5], None)? != VarType::Int {
        return Err(CompileError::semantic(
          "The second parameter of wain is not int type.",
        ));
      }
      8
    } else {
      params(&mut table, &mut node.children[3])?;
      6
    };
    dcls(&mut table, &mut node.children[body])?;

    // the procedure is visible to its own body, so recursion resolves
    self.procs.insert(proc_id.clone(), table);
    let table = &self.procs[&proc_id];

    self.statements(&mut node.children[body + 1], table)?;
    if self.expr(&mut node.children[body + 3], table)? != VarType::Int {
      return Err(CompileError::semantic(format!(
        "The return expression of [{proc_id}] is not int type."
      )));
    }
    Ok(())
  }

  fn statements(&self, node: &mut ParseNode, table: &ProcData) -> CompileResult<()> {
    // statements -> .EMPTY | statements statement
    if !node.children.is_empty() {
      let (head, tail) = node.children.split_at_mut(1);
      self.statements(&mut head[0], table)?;
      self.statement(&mut tail[0], table)?;
    }
    Ok(())
  }

  fn statement(&self, node: &mut ParseNode, table: &ProcData) -> CompileResult<()> {
    let head_kind = node.children[0].kind.clone();
    match head_kind.as_str() {
      // statement -> lvalue BECOMES expr SEMI
      "lvalue" => {
        let (head, tail) = node.children.split_at_mut(1);
        let lvalue_ty = self.lvalue(&mut head[0], table)?;
        if self.expr(&mut tail[1], table)? != lvalue_ty {
          return Err(CompileError::semantic(
            "Expected same type in assignment variable and new value.",
          ));
        }
        Ok(())
      }

      // statement -> IF LPAREN test RPAREN LBRACE statements RBRACE
      //              ELSE LBRACE statements RBRACE
      "IF" => {
        self.test(&mut node.children[2], table)?;
        self.statements(&mut node.children[5], table)?;
        self.statements(&mut node.children[9], table)
      }

      // statement -> WHILE LPAREN test RPAREN LBRACE statements RBRACE
      "WHILE" => {
        self.test(&mut node.children[2], table)?;
        self.statements(&mut node.children[5], table)
      }

      // statement -> PRINTLN LPAREN expr RPAREN SEMI
      "PRINTLN" => {
        if self.expr(&mut node.children[2], table)? != VarType::Int {
          return Err(CompileError::semantic("Expected type int in PRINTLN."));
        }
        Ok(())
      }

      // statement -> DELETE LBRACK RBRACK expr SEMI
      "DELETE" => {
        if self.expr(&mut node.children[3], table)? != VarType::IntStar {
          return Err(CompileError::semantic("Expected type int* in DELETE."));
        }
        Ok(())
      }

      kind => Err(malformed(kind)),
    }
  }

  /// test -> expr (EQ|NE|LT|LE|GE|GT) expr; both sides must agree.
  fn test(&self, node: &mut ParseNode, table: &ProcData) -> CompileResult<()> {
    let (head, tail) = node.children.split_at_mut(1);
    if self.expr(&mut head[0], table)? != self.expr(&mut tail[1], table)? {
      return Err(CompileError::semantic("Type mismatch in boolean expression."));
    }
    Ok(())
  }

  fn expr(&self, node: &mut ParseNode, table: &ProcData) -> CompileResult<VarType> {
    // expr -> term
    if node.children.len() == 1 {
      let ty = self.term(&mut node.children[0], table)?;
      node.ty = Some(ty);
      return Ok(ty);
    }

    // expr -> expr (PLUS|MINUS) term
    let is_plus = node.children[1].kind == "PLUS";
    let (head, tail) = node.children.split_at_mut(1);
    let term_ty = self.term(&mut tail[1], table)?;
    let expr_ty = self.expr(&mut head[0], table)?;

    let ty = if term_ty == VarType::Int {
      // int (+|-) int keeps its type; int* (+|-) int stays a pointer
      expr_ty
    } else if is_plus {
      if expr_ty != VarType::Int {
        return Err(CompileError::semantic(format!(
          "Expected expression {{int + int*}}, given {{{expr_ty} + {term_ty}}}."
        )));
      }
      VarType::IntStar
    } else {
      if expr_ty != VarType::IntStar {
        return Err(CompileError::semantic(format!(
          "Expected expression {{int* - int*}}, given {{{expr_ty} - {term_ty}}}."
        )));
      }
      VarType::Int
    };
    node.ty = Some(ty);
    Ok(ty)
  }

  /// term -> factor | term (STAR|SLASH|PCT) factor; multiplicative operands
  /// are always plain ints.
  fn term(&self, node: &mut ParseNode, table: &ProcData) -> CompileResult<VarType> {
    let (head, tail) = node.children.split_at_mut(1);
    let ty = match tail.last_mut() {
      Some(factor) => self.factor(factor, table)?,
      None => self.factor(&mut head[0], table)?,
    };
    node.ty = Some(ty);

    if !tail.is_empty()
      && (ty != VarType::Int || self.term(&mut head[0], table)? != VarType::Int)
    {
      return Err(CompileError::semantic(
        "Expected multiple combined factors to all have type int.",
      ));
    }
    Ok(ty)
  }

  fn factor(&self, node: &mut ParseNode, table: &ProcData) -> CompileResult<VarType> {
    // factor -> NUM | NULL | ID
    let ty = if node.children.len() == 1 {
      token_type(&mut node.children[0], table)?

    // factor -> ID LPAREN RPAREN | ID LPAREN arglist RPAREN
    } else if node.children[0].kind == "ID" {
      let proc_id = node.children[0].lexeme().to_string();
      if proc_id == "wain" {
        return Err(CompileError::semantic("Cannot call main procedure [wain]."));
      }
      if proc_id == table.id && table.locals.contains_key(&proc_id) {
        return Err(CompileError::semantic(format!(
          "Cannot call recurse procedure [{proc_id}] since declared as a local variable already."
        )));
      }
      let Some(callee) = self.procs.get(&proc_id) else {
        return Err(CompileError::semantic(format!(
          "Procedure [{proc_id}] called before declaration."
        )));
      };

      if node.children[2].kind == "arglist" {
        self.args(&mut node.children[2], table, callee, 0)?;
      } else if !callee.signature.is_empty() {
        return Err(CompileError::semantic(format!(
          "Arity mismatch - expected no args in [{proc_id}]."
        )));
      }
      VarType::Int

    // factor -> LPAREN expr RPAREN
    } else if node.children.len() == 3 {
      self.expr(&mut node.children[1], table)?

    // factor -> NEW INT LBRACK expr RBRACK
    } else if node.children.len() == 5 {
      if self.expr(&mut node.children[3], table)? != VarType::Int {
        return Err(CompileError::semantic(
          "Expected INT in array declaration size, given - int*.",
        ));
      }
      VarType::IntStar

    // factor -> AMP lvalue
    } else if node.children[0].kind == "AMP" {
      if self.lvalue(&mut node.children[1], table)? != VarType::Int {
        return Err(CompileError::semantic(
          "Expected int when referencing, given - int*.",
        ));
      }
      VarType::IntStar

    // factor -> STAR factor
    } else if node.children[0].kind == "STAR" {
      if self.factor(&mut node.children[1], table)? != VarType::IntStar {
        return Err(CompileError::semantic(
          "Expected int* when dereferencing, given - int.",
        ));
      }
      VarType::Int
    } else {
      return Err(malformed(&node.kind));
    };

    node.ty = Some(ty);
    Ok(ty)
  }

  /// arglist -> expr | expr COMMA arglist, matched position by position
  /// against the callee's stored signature.
  fn args(
    &self,
    node: &mut ParseNode,
    table: &ProcData,
    callee: &ProcData,
    index: usize,
  ) -> CompileResult<()> {
    if callee.signature.len() == index {
      return Err(CompileError::semantic(format!(
        "Too many args for [{}].",
        callee.id
      )));
    }
    if node.children.len() == 1 && index != callee.signature.len() - 1 {
      return Err(CompileError::semantic(format!(
        "Too few args for [{}].",
        callee.id
      )));
    }

    if self.expr(&mut node.children[0], table)? != callee.signature[index] {
      return Err(CompileError::semantic(format!(
        "Arity type mismatch when calling [{}].",
        callee.id
      )));
    }

    if node.children.len() > 1 {
      self.args(&mut node.children[2], table, callee, index + 1)?;
    }
    Ok(())
  }

  fn lvalue(&self, node: &mut ParseNode, table: &ProcData) -> CompileResult<VarType> {
    let ty = match node.children.len() {
      // lvalue -> ID
      1 => token_type(&mut node.children[0], table)?,

      // lvalue -> STAR factor
      2 => {
        if self.factor(&mut node.children[1], table)? != VarType::IntStar {
          return Err(CompileError::semantic(
            "Expected int* when dereferencing, given - int.",
          ));
        }
        VarType::Int
      }

      // lvalue -> LPAREN lvalue RPAREN
      3 => self.lvalue(&mut node.children[1], table)?,

      _ => return Err(malformed(&node.kind)),
    };
    node.ty = Some(ty);
    Ok(ty)
  }
}
