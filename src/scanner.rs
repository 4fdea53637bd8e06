//! Lexical analysis: turns WLP4 source text into a vector of tokens.
//!
//! The scanner is a hand-enumerated DFA driven by Simplified Maximal Munch:
//! keep consuming characters while an edge exists, and when none does, emit a
//! token for the current state if it accepts, otherwise fail. Keywords are
//! scanned as identifiers and re-kinded afterwards, so the machine itself
//! stays small. Whitespace and `//` comments are recognised as ordinary
//! tokens and discarded before the stream is returned.

use crate::dfa::Dfa;
use crate::error::{CompileError, CompileResult};
use std::fmt::{self, Display};

/// Kinds of tokens in the WLP4 terminal alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  Id,
  Num,
  Null,
  Return,
  If,
  Else,
  Int,
  While,
  Println,
  Wain,
  New,
  Delete,
  Lparen,
  Rparen,
  Lbrace,
  Rbrace,
  Lbrack,
  Rbrack,
  Comma,
  Semi,
  Plus,
  Minus,
  Star,
  Slash,
  Pct,
  Amp,
  Becomes,
  Lt,
  Le,
  Gt,
  Ge,
  Eq,
  Ne,
  Bof,
  Eof,
}

impl Display for TokenKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    use TokenKind::*;
    let name = match self {
      Id => "ID",
      Num => "NUM",
      Null => "NULL",
      Return => "RETURN",
      If => "IF",
      Else => "ELSE",
      Int => "INT",
      While => "WHILE",
      Println => "PRINTLN",
      Wain => "WAIN",
      New => "NEW",
      Delete => "DELETE",
      Lparen => "LPAREN",
      Rparen => "RPAREN",
      Lbrace => "LBRACE",
      Rbrace => "RBRACE",
      Lbrack => "LBRACK",
      Rbrack => "RBRACK",
      Comma => "COMMA",
      Semi => "SEMI",
      Plus => "PLUS",
      Minus => "MINUS",
      Star => "STAR",
      Slash => "SLASH",
      Pct => "PCT",
      Amp => "AMP",
      Becomes => "BECOMES",
      Lt => "LT",
      Le => "LE",
      Gt => "GT",
      Ge => "GE",
      Eq => "EQ",
      Ne => "NE",
      Bof => "BOF",
      Eof => "EOF",
    };
    f.write_str(name)
  }
}

/// A scanned token: its kind and the exact source slice that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
  pub kind: TokenKind,
  pub lexeme: String,
}

impl Token {
  pub fn new(kind: TokenKind, lexeme: impl Into<String>) -> Self {
    Self {
      kind,
      lexeme: lexeme.into(),
    }
  }
}

impl Display for Token {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.kind, self.lexeme)
  }
}

/// States of the scanning machine. One per accepting token shape, plus the
/// start state and the dead-end reached after a lone `!`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ScanState {
  Start,
  Not,
  Whitespace,
  Comment,
  Lparen,
  Rparen,
  Lbrace,
  Rbrace,
  Lbrack,
  Rbrack,
  Becomes,
  Eq,
  Lt,
  Le,
  Gt,
  Ge,
  Ne,
  Plus,
  Minus,
  Star,
  Slash,
  Pct,
  Comma,
  Semi,
  Amp,
  Zero,
  Num,
  Id,
}

fn whitespace(dfa: &mut Dfa<ScanState, char>) {
  use ScanState::*;
  dfa.add_state(Whitespace, true);
  for c in [' ', '\t'] {
    dfa.add_transition(Start, c, Whitespace);
    dfa.add_transition(Whitespace, c, Whitespace);
  }
}

fn delimiters(dfa: &mut Dfa<ScanState, char>) {
  use ScanState::*;
  for (c, state) in [
    ('(', Lparen),
    (')', Rparen),
    ('{', Lbrace),
    ('}', Rbrace),
    ('[', Lbrack),
    (']', Rbrack),
  ] {
    dfa.add_state(state, true);
    dfa.add_transition(Start, c, state);
  }
}

fn relationals(dfa: &mut Dfa<ScanState, char>) {
  use ScanState::*;
  for state in [Becomes, Eq, Lt, Le, Gt, Ge, Ne] {
    dfa.add_state(state, true);
  }
  dfa.add_state(Not, false);

  dfa.add_transition(Start, '=', Becomes);
  dfa.add_transition(Becomes, '=', Eq);
  dfa.add_transition(Start, '<', Lt);
  dfa.add_transition(Lt, '=', Le);
  dfa.add_transition(Start, '>', Gt);
  dfa.add_transition(Gt, '=', Ge);
  dfa.add_transition(Start, '!', Not);
  dfa.add_transition(Not, '=', Ne);
}

fn operators(dfa: &mut Dfa<ScanState, char>) {
  use ScanState::*;
  for (c, state) in [
    ('+', Plus),
    ('-', Minus),
    ('*', Star),
    ('/', Slash),
    ('%', Pct),
    (',', Comma),
    (';', Semi),
    ('&', Amp),
  ] {
    dfa.add_state(state, true);
    dfa.add_transition(Start, c, state);
  }
  dfa.add_state(Comment, true);
  dfa.add_transition(Slash, '/', Comment);
}

fn numbers(dfa: &mut Dfa<ScanState, char>) {
  use ScanState::*;
  dfa.add_state(Zero, true);
  dfa.add_state(Num, true);

  // a leading zero takes its own dead-end state, so `0123` scans as two NUMs
  dfa.add_transition(Start, '0', Zero);
  for c in '1'..='9' {
    dfa.add_transition(Start, c, Num);
  }
  for c in '0'..='9' {
    dfa.add_transition(Num, c, Num);
  }
}

fn identifiers(dfa: &mut Dfa<ScanState, char>) {
  use ScanState::*;
  dfa.add_state(Id, true);
  for c in ('a'..='z').chain('A'..='Z') {
    dfa.add_transition(Start, c, Id);
    dfa.add_transition(Id, c, Id);
  }
  for c in '0'..='9' {
    dfa.add_transition(Id, c, Id);
  }
}

/// The full WLP4 scanning machine.
fn wlp4_dfa() -> Dfa<ScanState, char> {
  let mut dfa = Dfa::new(ScanState::Start, false);
  whitespace(&mut dfa);
  delimiters(&mut dfa);
  relationals(&mut dfa);
  operators(&mut dfa);
  numbers(&mut dfa);
  identifiers(&mut dfa);
  dfa
}

/// Map an accepting state (and its lexeme) to the token kind it produces.
/// Identifiers are compared against the keyword set here, and the
/// leading-zero state folds into NUM.
fn resolve_kind(state: ScanState, lexeme: &str) -> TokenKind {
  use ScanState::*;
  match state {
    Zero => TokenKind::Num,
    Id => match lexeme {
      "return" => TokenKind::Return,
      "if" => TokenKind::If,
      "int" => TokenKind::Int,
      "else" => TokenKind::Else,
      "wain" => TokenKind::Wain,
      "while" => TokenKind::While,
      "println" => TokenKind::Println,
      "new" => TokenKind::New,
      "delete" => TokenKind::Delete,
      "NULL" => TokenKind::Null,
      _ => TokenKind::Id,
    },
    Num => TokenKind::Num,
    Lparen => TokenKind::Lparen,
    Rparen => TokenKind::Rparen,
    Lbrace => TokenKind::Lbrace,
    Rbrace => TokenKind::Rbrace,
    Lbrack => TokenKind::Lbrack,
    Rbrack => TokenKind::Rbrack,
    Becomes => TokenKind::Becomes,
    Eq => TokenKind::Eq,
    Lt => TokenKind::Lt,
    Le => TokenKind::Le,
    Gt => TokenKind::Gt,
    Ge => TokenKind::Ge,
    Ne => TokenKind::Ne,
    Plus => TokenKind::Plus,
    Minus => TokenKind::Minus,
    Star => TokenKind::Star,
    Slash => TokenKind::Slash,
    Pct => TokenKind::Pct,
    Comma => TokenKind::Comma,
    Semi => TokenKind::Semi,
    Amp => TokenKind::Amp,
    Start | Not | Whitespace | Comment => unreachable!("non-token state"),
  }
}

/// Largest NUM lexeme allowed, compared lexicographically against candidates
/// of the same length.
const NUM_MAX: &str = "2147483647";

/// Scan a whole source text, line by line.
pub fn scan(input: &str) -> CompileResult<Vec<Token>> {
  let dfa = wlp4_dfa();
  let mut tokens = Vec::new();
  for line in input.lines() {
    if !line.is_empty() {
      scan_line(&dfa, line, &mut tokens)?;
    }
  }
  Ok(tokens)
}

/// Simplified Maximal Munch over one line. On a missing edge the current
/// state must accept: its lexeme becomes a token and the offending character
/// is retried from the start state. A comment token swallows the rest of the
/// line.
fn scan_line(
  dfa: &Dfa<ScanState, char>,
  line: &str,
  tokens: &mut Vec<Token>,
) -> CompileResult<()> {
  let chars: Vec<char> = line.chars().collect();
  let mut i = 0;
  let mut state = *dfa.start();
  let mut lexeme = String::new();

  loop {
    let next = if i < chars.len() {
      dfa.transition(&state, &chars[i]).copied()
    } else {
      None
    };

    match next {
      Some(next_state) => {
        lexeme.push(chars[i]);
        i += 1;
        state = next_state;
      }
      None => {
        if !dfa.is_accepting(&state) {
          return Err(CompileError::UnrecognizedToken { lexeme });
        }
        match state {
          ScanState::Comment => return Ok(()),
          ScanState::Whitespace => {}
          _ => {
            let kind = resolve_kind(state, &lexeme);
            if kind == TokenKind::Num
              && lexeme.len() > 9
              && (lexeme.len() != 10 || lexeme.as_str() > NUM_MAX)
            {
              return Err(CompileError::NumberOutOfBounds { lexeme });
            }
            tokens.push(Token::new(kind, std::mem::take(&mut lexeme)));
          }
        }
        if i == chars.len() {
          return Ok(());
        }
        lexeme.clear();
        state = *dfa.start();
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn kinds(input: &str) -> Vec<TokenKind> {
    scan(input).unwrap().iter().map(|t| t.kind).collect()
  }

  #[test]
  fn scans_a_minimal_main() {
    let tokens = scan("int wain(int a, int b) { return a; }").unwrap();
    let expected = [
      TokenKind::Int,
      TokenKind::Wain,
      TokenKind::Lparen,
      TokenKind::Int,
      TokenKind::Id,
      TokenKind::Comma,
      TokenKind::Int,
      TokenKind::Id,
      TokenKind::Rparen,
      TokenKind::Lbrace,
      TokenKind::Return,
      TokenKind::Id,
      TokenKind::Semi,
      TokenKind::Rbrace,
    ];
    assert_eq!(
      tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
      expected
    );
    assert_eq!(tokens[4].lexeme, "a");
  }

  #[test]
  fn maximal_munch_prefers_longer_operators() {
    assert_eq!(kinds("<="), vec![TokenKind::Le]);
    assert_eq!(kinds("< ="), vec![TokenKind::Lt, TokenKind::Becomes]);
    assert_eq!(kinds("=="), vec![TokenKind::Eq]);
    assert_eq!(kinds("= ="), vec![TokenKind::Becomes, TokenKind::Becomes]);
    assert_eq!(kinds("!="), vec![TokenKind::Ne]);
  }

  #[test]
  fn keywords_are_rekinded_ids() {
    assert_eq!(kinds("while whilex NULL"), vec![
      TokenKind::While,
      TokenKind::Id,
      TokenKind::Null,
    ]);
  }

  #[test]
  fn leading_zero_splits_numbers() {
    let tokens = scan("0123").unwrap();
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].lexeme, "0");
    assert_eq!(tokens[1].lexeme, "123");
    assert!(tokens.iter().all(|t| t.kind == TokenKind::Num));
  }

  #[test]
  fn num_bound_is_two_to_the_31_minus_one() {
    assert_eq!(kinds("2147483647"), vec![TokenKind::Num]);
    assert!(matches!(
      scan("2147483648"),
      Err(CompileError::NumberOutOfBounds { .. })
    ));
    assert!(matches!(
      scan("12345678901"),
      Err(CompileError::NumberOutOfBounds { .. })
    ));
  }

  #[test]
  fn comments_discard_the_rest_of_the_line() {
    let tokens = scan("a // b + c\nd").unwrap();
    let lexemes: Vec<&str> = tokens.iter().map(|t| t.lexeme.as_str()).collect();
    assert_eq!(lexemes, vec!["a", "d"]);
  }

  #[test]
  fn lone_bang_is_rejected() {
    assert!(matches!(
      scan("a ! b"),
      Err(CompileError::UnrecognizedToken { .. })
    ));
  }

  #[test]
  fn rescanning_serialised_output_is_stable() {
    let source = "int wain(int* a, int b) { int x = 0; x = a != NULL; return x; }";
    let first = scan(source).unwrap();
    let reserialised = first
      .iter()
      .map(|t| t.lexeme.clone())
      .collect::<Vec<_>>()
      .join(" ");
    let second = scan(&reserialised).unwrap();
    assert_eq!(first, second);
  }
}
