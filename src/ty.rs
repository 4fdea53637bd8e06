use std::fmt::{self, Display};
use std::str::FromStr;

/// The two WLP4 value types. Every expression is one or the other; pointers
/// are always exactly one level deep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
  Int,
  IntStar,
}

impl VarType {
  pub fn is_int(self) -> bool {
    matches!(self, VarType::Int)
  }

  pub fn is_pointer(self) -> bool {
    matches!(self, VarType::IntStar)
  }
}

impl Display for VarType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      VarType::Int => f.write_str("int"),
      VarType::IntStar => f.write_str("int*"),
    }
  }
}

impl FromStr for VarType {
  type Err = ();

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "int" => Ok(VarType::Int),
      "int*" => Ok(VarType::IntStar),
      _ => Err(()),
    }
  }
}
