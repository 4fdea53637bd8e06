//! Code generation: lower the decorated parse tree into MIPS assembly text.
//!
//! The generator is a single syntax-directed pass with a fixed register
//! convention:
//!
//! - `$0` hard-wired zero, `$4` the constant 4, `$11` the constant 1 (also
//!   the NULL sentinel), all set up once in the program prologue
//! - `$1`/`$2` carry `wain`'s parameters in, `$1` also carries arguments to
//!   the runtime procedures
//! - `$3` holds every expression result, `$5` the left operand of a pending
//!   binary operation, `$6`/`$7` scratch for compound comparisons
//! - `$29` frame pointer, `$30` stack pointer (grows down), `$31` return
//!   address
//!
//! Expression results default to `$3`; the leaf emitters may instead name a
//! constant register (`$0`, `$4`, `$11`, or `$29` for a zero-offset address)
//! so callers always operate on the returned register number. A small run of
//! registers doubles as a stack cache for pending left operands, falling back
//! to real pushes when exhausted; procedure calls spill whatever part of the
//! cache is live.

use crate::tree::ParseNode;
use crate::ty::VarType;
use std::collections::HashMap;

/// Registers caching pending left operands, in lieu of memory pushes. The
/// window deliberately avoids every register with a convention role above.
const MIN_REG: i32 = 12;
const MAX_REG: i32 = 28;

/// Per-procedure frame layout: each local or parameter maps to its offset
/// from `$29` and its declared type.
struct Frame {
  id: String,
  locals: HashMap<String, (i32, VarType)>,
}

impl Frame {
  /// Lay out the frame for one `main` / `procedure` node: parameters in
  /// order, then declarations in order, each one word below the last.
  fn build(node: &ParseNode) -> Frame {
    let mut frame = Frame {
      id: node.children[1].lexeme().to_string(),
      locals: HashMap::new(),
    };
    if node.kind == "main" {
      frame.declare(&node.children[3]);
      frame.declare(&node.children[5]);
      frame.declare_dcls(&node.children[8]);
    } else {
      frame.declare_params(&node.children[3]);
      frame.declare_dcls(&node.children[6]);
    }
    frame
  }

  fn declare_params(&mut self, node: &ParseNode) {
    // params -> .EMPTY | paramlist; paramlist -> dcl | dcl COMMA paramlist
    if node.kind == "params" {
      if let Some(list) = node.children.first() {
        self.declare_params(list);
      }
    } else {
      self.declare(&node.children[0]);
      if node.children.len() > 1 {
        self.declare_params(&node.children[2]);
      }
    }
  }

  fn declare_dcls(&mut self, node: &ParseNode) {
    // dcls -> .EMPTY | dcls dcl BECOMES (NUM|NULL) SEMI
    if !node.children.is_empty() {
      self.declare_dcls(&node.children[0]);
      self.declare(&node.children[1]);
    }
  }

  fn declare(&mut self, dcl: &ParseNode) {
    let id_node = &dcl.children[1];
    let offset = -4 * self.locals.len() as i32;
    let ty = id_node.ty.unwrap_or(VarType::Int);
    self.locals.insert(id_node.lexeme().to_string(), (offset, ty));
  }

  fn offset(&self, id: &str) -> i32 {
    match self.locals.get(id) {
      Some(&(offset, _)) => offset,
      None => panic!("variable {id} has no frame slot"),
    }
  }
}

struct CodeGen {
  asm: String,
  /// Next free stack-cache register; everything in `MIN_REG..stack_reg` holds
  /// a live left operand.
  stack_reg: i32,
  if_count: u32,
  while_count: u32,
  delete_count: u32,
}

/// Emit the whole program for a decorated parse tree. The tree must be
/// annotated; feeding an untyped or malformed tree is a logic error.
pub fn generate(tree: &ParseNode) -> String {
  let mut gen = CodeGen {
    asm: String::new(),
    stack_reg: MIN_REG,
    if_count: 0,
    while_count: 0,
    delete_count: 0,
  };
  gen.program(tree);
  gen.asm
}

impl CodeGen {
  fn emit(&mut self, instr: &str) {
    self.asm.push_str("\t\t");
    self.asm.push_str(instr);
    self.asm.push('\n');
  }

  fn label(&mut self, name: &str) {
    self.asm.push_str(name);
    self.asm.push_str(":\n");
  }

  fn push(&mut self, r: i32) {
    self.emit(&format!("sw ${r}, -4($30)"));
    self.emit("sub $30, $30, $4");
  }

  fn pop(&mut self, r: i32) {
    self.emit("add $30, $30, $4");
    self.emit(&format!("lw ${r}, -4($30)"));
  }

  fn program(&mut self, node: &ParseNode) {
    // start -> BOF procedures EOF
    if node.kind == "start" {
      self.emit(".import print");
      self.emit(".import init");
      self.emit(".import new");
      self.emit(".import delete");
      self.emit("lis $4");
      self.emit(".word 4");
      self.emit("lis $11");
      self.emit(".word 1");
      self.emit("beq $0, $0, Fwain");
      self.program(&node.children[1]);

    // procedures -> procedure procedures | main
    } else {
      self.procedure(&node.children[0]);
      if node.children.len() > 1 {
        self.program(&node.children[1]);
      }
    }
  }

  fn procedure(&mut self, node: &ParseNode) {
    let is_main = node.kind == "main";
    let body = if is_main { 8 } else { 6 };
    let frame = Frame::build(node);

    self.stack_reg = MIN_REG;
    self.if_count = 0;
    self.while_count = 0;
    self.delete_count = 0;

    // prologue: wain spills its register parameters itself; other procedures
    // find their arguments already stored by the caller
    self.asm.push_str(&format!("\n\n\nF{}:\n", frame.id));
    if is_main {
      self.push(31);
      self.emit("sub $29, $30, $4");
      self.emit("sw $1, 0($29)");
      self.emit("sw $2, -4($29)");
    }

    // move the stack pointer past the whole frame
    let frame_bytes = 4 * frame.locals.len() as i32;
    if frame_bytes == 4 {
      self.emit("sub $30, $30, $4");
    } else if frame_bytes > 0 {
      self.emit("lis $3");
      self.emit(&format!(".word {frame_bytes}"));
      self.emit("sub $30, $30, $3");
    }

    // the heap allocator wants $2 = 0 unless wain's first parameter is an
    // array length pair
    if is_main {
      if node.children[3].children[1].ty == Some(VarType::Int) {
        self.emit("add $2, $0, $0");
      }
      self.emit("lis $5");
      self.emit(".word init");
      self.emit("jalr $5");
    }

    self.asm.push_str("\n\n");
    self.dcls(&node.children[body], &frame);
    self.statements(&node.children[body + 1], &frame);
    let r = self.expr(&node.children[body + 3], &frame);
    if r != 3 {
      self.emit(&format!("add $3, ${r}, $0"));
    }

    self.asm.push_str("\n\n");
    self.emit("add $30, $29, $4");
    if is_main {
      self.emit("lw $1, 0($29)");
      self.emit("lw $2, -4($29)");
      self.pop(31);
      self.emit("add $29, $30, $0");
    }
    self.emit("jr $31");
  }

  fn dcls(&mut self, node: &ParseNode, frame: &Frame) {
    // dcls -> .EMPTY | dcls dcl BECOMES (NUM|NULL) SEMI
    if !node.children.is_empty() {
      self.dcls(&node.children[0], frame);
      self.dcl(&node.children[1], &node.children[3], frame);
    }
  }

  fn dcl(&mut self, node: &ParseNode, value: &ParseNode, frame: &Frame) {
    // dcl -> type ID
    let r = self.token(value, frame);
    let offset = frame.offset(node.children[1].lexeme());
    self.emit(&format!("sw ${r}, {offset}($29)"));
  }

  fn statements(&mut self, node: &ParseNode, frame: &Frame) {
    // statements -> .EMPTY | statements statement
    if !node.children.is_empty() {
      self.statements(&node.children[0], frame);
      self.statement(&node.children[1], frame);
    }
  }

  fn statement(&mut self, node: &ParseNode, frame: &Frame) {
    self.asm.push_str(&format!("\n\t\t;; {}\n", node.line()));

    match node.children[0].kind.as_str() {
      // statement -> PRINTLN LPAREN expr RPAREN SEMI
      "PRINTLN" => {
        let r = self.expr(&node.children[2], frame);
        self.emit(&format!("add $1, ${r}, $0"));
        self.push(31);
        self.emit("lis $5");
        self.emit(".word print");
        self.emit("jalr $5");
        self.pop(31);
      }

      // statement -> IF LPAREN test RPAREN LBRACE statements RBRACE
      //              ELSE LBRACE statements RBRACE
      "IF" => {
        let label = format!("{}{}IFELSE", frame.id, self.if_count);
        self.if_count += 1;

        self.test(&node.children[2], frame);
        self.emit(&format!("beq $3, $0, {label}FALSE"));
        self.statements(&node.children[5], frame);
        self.emit(&format!("beq $0, $0, {label}TRUE"));
        self.label(&format!("{label}FALSE"));
        self.statements(&node.children[9], frame);
        self.label(&format!("{label}TRUE"));
      }

      // statement -> WHILE LPAREN test RPAREN LBRACE statements RBRACE
      "WHILE" => {
        let label = format!("{}{}WHILE", frame.id, self.while_count);
        self.while_count += 1;

        self.label(&format!("{label}BODY"));
        self.test(&node.children[2], frame);
        self.emit(&format!("beq $3, $0, {label}END"));
        self.statements(&node.children[5], frame);
        self.emit(&format!("beq $0, $0, {label}BODY"));
        self.label(&format!("{label}END"));
      }

      // statement -> DELETE LBRACK RBRACK expr SEMI
      // a NULL pointer (the sentinel 1 in $11) skips the runtime call
      "DELETE" => {
        let label = format!("{}{}DELETE", frame.id, self.delete_count);
        self.delete_count += 1;

        let r = self.expr(&node.children[3], frame);
        self.emit(&format!("beq ${r}, $11, {label}"));
        self.emit(&format!("add $1, ${r}, $0"));
        self.push(31);
        self.emit("lis $5");
        self.emit(".word delete");
        self.emit("jalr $5");
        self.pop(31);
        self.label(&label);
      }

      // statement -> lvalue BECOMES expr SEMI
      _ => {
        let r = self.expr(&node.children[2], frame);

        // lvalue -> LPAREN lvalue RPAREN: peel the parentheses
        let mut lvalue = &node.children[0];
        while lvalue.children.len() > 2 {
          lvalue = &lvalue.children[1];
        }

        if lvalue.children.len() == 1 {
          // lvalue -> ID
          let offset = frame.offset(lvalue.children[0].lexeme());
          self.emit(&format!("sw ${r}, {offset}($29)"));
        } else {
          // lvalue -> STAR factor
          self.push(r);
          let r = self.factor(&lvalue.children[1], frame);
          self.pop(5);
          self.emit(&format!("sw $5, 0(${r})"));
        }
      }
    }
  }

  /// test -> expr (EQ|NE|LT|LE|GE|GT) expr, result in $3. Everything reduces
  /// to `slt` (or `sltu` for pointers): flip the operands for GT/LE, combine
  /// both orders for EQ/NE, and invert the bit where the comparison includes
  /// equality.
  fn test(&mut self, node: &ParseNode, frame: &Frame) {
    let kind = node.children[1].kind.clone();
    let op = if node.children[0].ty == Some(VarType::IntStar) {
      "sltu"
    } else {
      "slt"
    };

    let r = self.expr(&node.children[0], frame);
    self.push(r);
    let r = self.expr(&node.children[2], frame);
    self.pop(5);

    match kind.as_str() {
      "LT" | "GE" => self.emit(&format!("{op} $3, $5, ${r}")),
      "GT" | "LE" => self.emit(&format!("{op} $3, ${r}, $5")),
      _ => {
        self.emit(&format!("{op} $6, $5, ${r}"));
        self.emit(&format!("{op} $7, ${r}, $5"));
        self.emit("add $3, $6, $7");
      }
    }

    if matches!(kind.as_str(), "GE" | "LE" | "EQ") {
      self.emit("sub $3, $11, $3");
    }
  }

  /// Park the left operand of a binary operation: in the next stack-cache
  /// register when one is free, otherwise on the real stack. Returns the
  /// register the operand will be read back from.
  fn save_left(&mut self, r: i32) -> i32 {
    if self.stack_reg <= MAX_REG {
      self.emit(&format!("add ${}, ${r}, $0", self.stack_reg));
      self.stack_reg += 1;
      self.stack_reg - 1
    } else {
      self.push(r);
      5
    }
  }

  /// Bring a memory-parked left operand back into $5 before the operation.
  fn reload_left(&mut self, q: i32) {
    if q == 5 {
      self.pop(5);
    }
  }

  /// Hand a cache register back once the operation is done with it.
  fn free_left(&mut self, q: i32) {
    if q != 5 {
      self.stack_reg -= 1;
    }
  }

  fn expr(&mut self, node: &ParseNode, frame: &Frame) -> i32 {
    // expr -> term
    if node.children.len() == 1 {
      return self.term(&node.children[0], frame);
    }

    // expr -> expr (PLUS|MINUS) term
    let is_plus = node.children[1].kind == "PLUS";

    // fold NUM (+|-) NUM at compile time
    if let (Some(x), Some(y)) = (
      unary_num(&node.children[0], 3),
      unary_num(&node.children[2], 2),
    ) {
      let folded = if is_plus {
        x.wrapping_add(y)
      } else {
        x.wrapping_sub(y)
      };
      self.emit("lis $3");
      self.emit(&format!(".word {folded}"));
      return 3;
    }

    // pointer arithmetic scales the int operand by the word size; a pointer
    // difference is scaled back down after the subtract
    let ptr_arith = if is_plus {
      node.children[0].ty != node.children[2].ty
    } else {
      node.children[0].ty == Some(VarType::IntStar)
    };
    let op = if is_plus { "add" } else { "sub" };

    let mut r = self.expr(&node.children[0], frame);
    if ptr_arith && node.children[0].ty == Some(VarType::Int) {
      self.emit(&format!("mult ${r}, $4"));
      self.emit("mflo $3");
      r = 3;
    }
    let q = self.save_left(r);

    let mut r = self.term(&node.children[2], frame);
    if ptr_arith && node.children[2].ty == Some(VarType::Int) {
      self.emit(&format!("mult ${r}, $4"));
      self.emit("mflo $3");
      r = 3;
    }
    self.reload_left(q);

    self.emit(&format!("{op} $3, ${q}, ${r}"));
    if ptr_arith && node.children[0].ty == node.children[2].ty {
      self.emit("div $3, $4");
      self.emit("mflo $3");
    }
    self.free_left(q);
    3
  }

  fn term(&mut self, node: &ParseNode, frame: &Frame) -> i32 {
    // term -> factor
    if node.children.len() == 1 {
      return self.factor(&node.children[0], frame);
    }

    // term -> term (STAR|SLASH|PCT) factor
    let kind = node.children[1].kind.clone();

    // fold NUM (*|/|%) NUM at compile time; division by zero is left for the
    // generated code to trap on
    if let (Some(x), Some(y)) = (
      unary_num(&node.children[0], 2),
      unary_num(&node.children[2], 1),
    ) {
      if kind == "STAR" || y != 0 {
        let folded = match kind.as_str() {
          "STAR" => x.wrapping_mul(y),
          "SLASH" => x.wrapping_div(y),
          _ => x.wrapping_rem(y),
        };
        self.emit("lis $3");
        self.emit(&format!(".word {folded}"));
        return 3;
      }
    }

    let op = if kind == "STAR" { "mult" } else { "div" };
    let mf = if kind == "PCT" { "mfhi" } else { "mflo" };

    let r = self.term(&node.children[0], frame);
    let q = self.save_left(r);

    let r = self.factor(&node.children[2], frame);
    self.reload_left(q);

    self.emit(&format!("{op} ${q}, ${r}"));
    self.emit(&format!("{mf} $3"));
    self.free_left(q);
    3
  }

  fn factor(&mut self, node: &ParseNode, frame: &Frame) -> i32 {
    // factor -> NUM | NULL | ID
    if node.children.len() == 1 {
      return self.token(&node.children[0], frame);
    }

    match node.children[0].kind.as_str() {
      // factor -> LPAREN expr RPAREN
      "LPAREN" => self.expr(&node.children[1], frame),

      // factor -> AMP lvalue
      "AMP" => {
        let mut lvalue = &node.children[1];
        while lvalue.children.len() > 2 {
          lvalue = &lvalue.children[1];
        }

        // &*factor is just the factor
        if lvalue.children[0].kind == "STAR" {
          return self.factor(&lvalue.children[1], frame);
        }

        let offset = frame.offset(lvalue.children[0].lexeme());
        if offset == 0 {
          return 29;
        }
        if offset == -4 {
          self.emit("sub $3, $29, $4");
        } else {
          self.emit("lis $3");
          self.emit(&format!(".word {offset}"));
          self.emit("add $3, $29, $3");
        }
        3
      }

      // factor -> STAR factor
      "STAR" => {
        let r = self.factor(&node.children[1], frame);
        self.emit(&format!("lw $3, 0(${r})"));
        3
      }

      // factor -> NEW INT LBRACK expr RBRACK
      // a failed allocation returns 0; rewrite it to the NULL sentinel
      "NEW" => {
        let r = self.expr(&node.children[3], frame);
        self.emit(&format!("add $1, ${r}, $0"));
        self.push(31);
        self.emit("lis $5");
        self.emit(".word new");
        self.emit("jalr $5");
        self.pop(31);
        self.emit("bne $3, $0, 1");
        self.emit("add $3, $11, $0");
        3
      }

      // factor -> ID LPAREN RPAREN | ID LPAREN arglist RPAREN
      _ => self.call(node, frame),
    }
  }

  /// Call a procedure: spill $29, $31 and the live stack-cache registers in
  /// one block, push the arguments, point $29 at the first of them, jump,
  /// then restore everything in reverse.
  fn call(&mut self, node: &ParseNode, frame: &Frame) -> i32 {
    let proc_id = node.children[0].lexeme().to_string();
    let saved_bytes = 4 * (2 + self.stack_reg - MIN_REG);

    self.emit("sw $29, -4($30)");
    self.emit("sw $31, -8($30)");
    for (k, sr) in (MIN_REG..self.stack_reg).enumerate() {
      self.emit(&format!("sw ${sr}, -{}($30)", 4 * (3 + k as i32)));
    }
    self.emit("lis $5");
    self.emit(&format!(".word {saved_bytes}"));
    self.emit("sub $30, $30, $5");

    if node.children[2].kind == "arglist" {
      let argc = self.args(&node.children[2], frame, 1);
      if argc == 1 {
        self.emit("add $30, $30, $4");
      } else {
        self.emit("lis $5");
        self.emit(&format!(".word {}", 4 * argc));
        self.emit("add $30, $30, $5");
      }
    }
    self.emit("sub $29, $30, $4");

    self.emit("lis $5");
    self.emit(&format!(".word F{proc_id}"));
    self.emit("jalr $5");

    self.emit("lis $5");
    self.emit(&format!(".word {saved_bytes}"));
    self.emit("add $30, $30, $5");
    self.emit("lw $29, -4($30)");
    self.emit("lw $31, -8($30)");
    for (k, sr) in (MIN_REG..self.stack_reg).enumerate() {
      self.emit(&format!("lw ${sr}, -{}($30)", 4 * (3 + k as i32)));
    }
    3
  }

  /// arglist -> expr | expr COMMA arglist; push each argument in order and
  /// return how many there were.
  fn args(&mut self, node: &ParseNode, frame: &Frame, index: i32) -> i32 {
    let r = self.expr(&node.children[0], frame);
    self.push(r);
    if node.children.len() == 1 {
      index
    } else {
      self.args(&node.children[2], frame, index + 1)
    }
  }

  /// Emit one expression leaf and name the register holding its value. NULL
  /// and the constants 0, 1 and 4 come straight from hard-wired registers.
  fn token(&mut self, node: &ParseNode, frame: &Frame) -> i32 {
    match node.kind.as_str() {
      "NULL" => 11,
      "ID" => {
        let offset = frame.offset(node.lexeme());
        self.emit(&format!("lw $3, {offset}($29)"));
        3
      }
      _ => {
        let value: i32 = node.lexeme().parse().expect("NUM fits 31 bits");
        match value {
          1 => 11,
          0 | 4 => value,
          _ => {
            self.emit("lis $3");
            self.emit(&format!(".word {value}"));
            3
          }
        }
      }
    }
  }
}

/// Descend first children `depth` times and return the value of the NUM leaf
/// found there, if that is what is there. Used to spot the all-unary
/// `expr -> term -> factor -> NUM` chains that constant folding applies to.
fn unary_num(node: &ParseNode, depth: usize) -> Option<i32> {
  let mut node = node;
  for _ in 0..depth {
    node = node.children.first()?;
  }
  if node.kind == "NUM" {
    node.lexeme.as_deref()?.parse().ok()
  } else {
    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tree::listings::*;
  use crate::tree::read_tree;
  use crate::typechecker::annotate;

  fn generate_listing(listing: &str) -> String {
    let cfg = wlp4_cfg();
    let tree = annotate(read_tree(listing, &cfg).expect("listing is well formed"))
      .expect("listing type checks");
    generate(&tree)
  }

  fn minimal_main(ret: &str) -> String {
    wain(
      &int_dcl("a"),
      &int_dcl("b"),
      "dcls .EMPTY\n",
      "statements .EMPTY\n",
      ret,
    )
  }

  #[test]
  fn program_prologue_imports_the_runtime() {
    let asm = generate_listing(&minimal_main(&id_expr("a")));
    for line in [
      ".import print",
      ".import init",
      ".import new",
      ".import delete",
      "lis $4",
      "lis $11",
      "beq $0, $0, Fwain",
    ] {
      assert!(asm.contains(line), "missing {line} in:\n{asm}");
    }
  }

  #[test]
  fn returning_the_first_parameter_reads_offset_zero() {
    let asm = generate_listing(&minimal_main(&id_expr("a")));
    assert!(asm.contains("Fwain:"));
    assert!(asm.contains("sw $1, 0($29)"));
    assert!(asm.contains("sw $2, -4($29)"));
    assert!(asm.contains("lw $3, 0($29)"));
    assert!(asm.contains("jr $31"));
  }

  #[test]
  fn int_first_parameter_zeroes_the_allocator_length() {
    let asm = generate_listing(&minimal_main(&id_expr("a")));
    assert!(asm.contains("add $2, $0, $0"));
    assert!(asm.contains(".word init"));
  }

  #[test]
  fn pointer_first_parameter_keeps_the_length_register() {
    let listing = wain(
      &ptr_dcl("a"),
      &int_dcl("b"),
      "dcls .EMPTY\n",
      "statements .EMPTY\n",
      &id_expr("b"),
    );
    let asm = generate_listing(&listing);
    assert!(!asm.contains("add $2, $0, $0"));
    assert!(asm.contains(".word init"));
  }

  #[test]
  fn constant_sums_fold_to_one_load() {
    let asm = generate_listing(&minimal_main(&binary_expr(
      "PLUS",
      "+",
      &num_expr("2"),
      &num_expr("3"),
    )));
    assert!(asm.contains("lis $3\n\t\t.word 5"));
    // no operand was parked anywhere
    assert!(!asm.contains("add $12"));
    assert!(!asm.contains("add $3, $12, $3"));
  }

  #[test]
  fn constant_folding_is_wrapping_and_skips_division_by_zero() {
    let difference = generate_listing(&minimal_main(&binary_expr(
      "MINUS",
      "-",
      &num_expr("0"),
      &num_expr("5"),
    )));
    assert!(difference.contains(".word -5"));

    let divide = "\
expr term
term term SLASH factor
term factor
factor NUM
NUM 7
SLASH /
factor NUM
NUM 0
";
    let asm = generate_listing(&minimal_main(divide));
    // no fold: the 7 is parked in the first cache register and the zero
    // operand reads straight from the hard-wired register
    assert!(asm.contains("div $12, $0"));
    assert!(asm.contains("mflo $3"));
  }

  #[test]
  fn locals_live_below_the_parameters() {
    // int x = 0; x = a + b; return x;
    let dcls = format!(
      "dcls dcls dcl BECOMES NUM SEMI\ndcls .EMPTY\n{}BECOMES =\nNUM 0\nSEMI ;\n",
      int_dcl("x")
    );
    let assign = format!(
      "statements statements statement\nstatements .EMPTY\n\
       statement lvalue BECOMES expr SEMI\nlvalue ID\nID x\nBECOMES =\n{}SEMI ;\n",
      binary_expr("PLUS", "+", &id_expr("a"), &id_expr("b"))
    );
    let listing = wain(&int_dcl("a"), &int_dcl("b"), &dcls, &assign, &id_expr("x"));
    let asm = generate_listing(&listing);

    // x sits at -12 bytes of frame, offset -8 from $29; its initializer is
    // the hard-wired zero register
    assert!(asm.contains(".word 12"));
    assert!(asm.contains("sw $0, -8($29)"));
    assert!(asm.contains("sw $3, -8($29)"));
    assert!(asm.contains("lw $3, -8($29)"));
    // the left operand of a + b is cached in the first stack register
    assert!(asm.contains("add $12, $3, $0"));
    assert!(asm.contains("add $3, $12, $3"));
  }

  #[test]
  fn statements_carry_their_source_as_comments() {
    let println = format!(
      "statements statements statement\nstatements .EMPTY\n\
       statement PRINTLN LPAREN expr RPAREN SEMI\nPRINTLN println\nLPAREN (\n{}RPAREN )\nSEMI ;\n",
      id_expr("a")
    );
    let asm = generate_listing(&wain(
      &int_dcl("a"),
      &int_dcl("b"),
      "dcls .EMPTY\n",
      &println,
      &id_expr("b"),
    ));
    assert!(asm.contains(";; statement PRINTLN LPAREN expr RPAREN SEMI"));
    assert!(asm.contains(".word print"));
    assert!(asm.contains("add $1, $3, $0"));
  }

  #[test]
  fn while_loops_use_per_procedure_labels() {
    let test = format!("test expr LT expr\n{}LT <\n{}", id_expr("a"), id_expr("b"));
    let body = "statements .EMPTY\n";
    let stmts = format!(
      "statements statements statement\nstatements .EMPTY\n\
       statement WHILE LPAREN test RPAREN LBRACE statements RBRACE\n\
       WHILE while\nLPAREN (\n{test}RPAREN )\nLBRACE {{\n{body}RBRACE }}\n"
    );
    let asm = generate_listing(&wain(
      &int_dcl("a"),
      &int_dcl("b"),
      "dcls .EMPTY\n",
      &stmts,
      &id_expr("a"),
    ));
    assert!(asm.contains("wain0WHILEBODY:"));
    assert!(asm.contains("beq $3, $0, wain0WHILEEND"));
    assert!(asm.contains("beq $0, $0, wain0WHILEBODY"));
    assert!(asm.contains("wain0WHILEEND:"));
    // a < b compares the popped left against the fresh right
    assert!(asm.contains("slt $3, $5, $3"));
  }

  #[test]
  fn delete_skips_the_null_sentinel() {
    let stmts = format!(
      "statements statements statement\nstatements .EMPTY\n\
       statement DELETE LBRACK RBRACK expr SEMI\nDELETE delete\nLBRACK [\nRBRACK ]\n{}SEMI ;\n",
      id_expr("a")
    );
    let asm = generate_listing(&wain(
      &ptr_dcl("a"),
      &int_dcl("b"),
      "dcls .EMPTY\n",
      &stmts,
      &id_expr("b"),
    ));
    assert!(asm.contains("beq $3, $11, wain0DELETE"));
    assert!(asm.contains(".word delete"));
    assert!(asm.contains("wain0DELETE:"));
  }

  #[test]
  fn new_rewrites_a_failed_allocation_to_null() {
    let ret = "\
expr term
term factor
factor NEW INT LBRACK expr RBRACK
NEW new
INT int
LBRACK [
expr term
term factor
factor ID
ID b
RBRACK ]
";
    let listing = wain(
      &ptr_dcl("a"),
      &int_dcl("b"),
      "dcls .EMPTY\n",
      &format!(
        "statements statements statement\nstatements .EMPTY\n\
         statement lvalue BECOMES expr SEMI\nlvalue ID\nID a\nBECOMES =\n{ret}SEMI ;\n"
      ),
      &id_expr("b"),
    );
    let asm = generate_listing(&listing);
    assert!(asm.contains(".word new"));
    assert!(asm.contains("bne $3, $0, 1"));
    assert!(asm.contains("add $3, $11, $0"));
  }

  #[test]
  fn pointer_arithmetic_scales_by_the_word_size() {
    // a + b with a: int*, b: int scales b by 4 before adding
    let listing = wain(
      &ptr_dcl("a"),
      &int_dcl("b"),
      "dcls .EMPTY\n",
      &format!(
        "statements statements statement\nstatements .EMPTY\n\
         statement lvalue BECOMES expr SEMI\nlvalue ID\nID a\nBECOMES =\n{}SEMI ;\n",
        binary_expr("PLUS", "+", &id_expr("a"), &id_expr("b"))
      ),
      &id_expr("b"),
    );
    let asm = generate_listing(&listing);
    assert!(asm.contains("mult $3, $4"));
    assert!(asm.contains("mflo $3"));

    // a - a with both pointers divides the difference back down
    let diff = wain(
      &ptr_dcl("a"),
      &int_dcl("b"),
      "dcls .EMPTY\n",
      "statements .EMPTY\n",
      &binary_expr("MINUS", "-", &id_expr("a"), &id_expr("a")),
    );
    let asm = generate_listing(&diff);
    assert!(asm.contains("div $3, $4"));
  }

  #[test]
  fn address_of_the_first_parameter_is_the_frame_pointer() {
    let ret = "\
expr term
term factor
factor STAR factor
STAR *
factor AMP lvalue
AMP &
lvalue ID
ID a
";
    let asm = generate_listing(&minimal_main(ret));
    // &a is offset 0, so the dereference reads through $29 directly
    assert!(asm.contains("lw $3, 0($29)"));
  }

  #[test]
  fn calls_spill_the_frame_and_point_fp_at_the_first_argument() {
    let procedure = format!(
      "procedure INT ID LPAREN params RPAREN LBRACE dcls statements RETURN expr SEMI RBRACE\n\
       INT int\n\
       ID f\n\
       LPAREN (\n\
       params paramlist\n\
       paramlist dcl\n\
       {}\
       RPAREN )\n\
       LBRACE {{\n\
       dcls .EMPTY\n\
       statements .EMPTY\n\
       RETURN return\n\
       {}\
       SEMI ;\n\
       RBRACE }}\n",
      int_dcl("x"),
      id_expr("x")
    );
    let call = "\
expr term
term factor
factor ID LPAREN arglist RPAREN
ID f
LPAREN (
arglist expr
expr term
term factor
factor ID
ID a
RPAREN )
";
    let listing = format!(
      "start BOF procedures EOF\nBOF BOF\nprocedures procedure procedures\n{}procedures main\n{}EOF EOF\n",
      procedure,
      main_proc(
        &int_dcl("a"),
        &int_dcl("b"),
        "dcls .EMPTY\n",
        "statements .EMPTY\n",
        call,
      )
    );
    let asm = generate_listing(&listing);
    assert!(asm.contains("Ff:"));
    assert!(asm.contains("sw $29, -4($30)"));
    assert!(asm.contains("sw $31, -8($30)"));
    assert!(asm.contains(".word Ff"));
    assert!(asm.contains("jalr $5"));
    assert!(asm.contains("sub $29, $30, $4"));
    assert!(asm.contains("lw $29, -4($30)"));
    assert!(asm.contains("lw $31, -8($30)"));
  }
}
