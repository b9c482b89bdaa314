/*!

Operator-specific opaque payload carried by a node: a constant value, a variable reference,
coefficients, or whatever else an operator needs. The common cases — a
constant, a variable reference, a sum's per-child coefficients and additive constant, and a
power's exponent — get first-class variants so the core's own simplification and
enforcement code can pattern-match them directly; anything else an expression handler wants
to stash goes in `Extension` behind `Any`.

*/

use std::any::Any;
use std::fmt::{Debug, Formatter};
use smallvec::SmallVec;

use crate::abstractions::Float;
use crate::core::host::VarId;

pub enum Payload {
  /// Non-leaf operators with no extra data beyond their children (e.g. `exp`, `sin`).
  None,
  /// A constant (the `value` handler).
  Value(Float),
  /// A variable leaf (the `var` handler).
  Var(VarId),
  /// A sum node: `constant + sum(coefficients[i] * children[i])`.
  Sum { coefficients: SmallVec<[Float; 4]>, constant: Float },
  /// A power node: `children[0] ^ exponent`.
  Pow { exponent: Float },
  /// Handler-defined payload for operators outside this core's reference set.
  Extension(Box<dyn Any>),
}

impl Payload {
  pub fn as_value(&self) -> Option<Float> {
    match self {
      Payload::Value(v) => Some(*v),
      _ => None,
    }
  }

  pub fn as_var(&self) -> Option<VarId> {
    match self {
      Payload::Var(v) => Some(*v),
      _ => None,
    }
  }

  pub fn as_sum(&self) -> Option<(&[Float], Float)> {
    match self {
      Payload::Sum { coefficients, constant } => Some((coefficients.as_slice(), *constant)),
      _ => None,
    }
  }

  pub fn as_pow_exponent(&self) -> Option<Float> {
    match self {
      Payload::Pow { exponent } => Some(*exponent),
      _ => None,
    }
  }
}

impl Debug for Payload {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Payload::None => write!(f, "None"),
      Payload::Value(v) => write!(f, "Value({v})"),
      Payload::Var(v) => write!(f, "Var({v:?})"),
      Payload::Sum { coefficients, constant } => {
        write!(f, "Sum({coefficients:?}, {constant})")
      }
      Payload::Pow { exponent } => write!(f, "Pow(^{exponent})"),
      Payload::Extension(_) => write!(f, "Extension(..)"),
    }
  }
}
