#![allow(unused)]
mod nat_set;
mod rccell;



// A fast hash set and hash map
pub use std::collections::{HashSet, HashMap};



pub use tracing;



// A set of (small) natural numbers
pub use nat_set::NatSet;



// Reference counted pointers with mutable interior, and complementary weak pointers.
pub use rccell::{rc_cell, RcCell, WeakCell};



use ustr::Ustr;
/// Interned strings. Create an interned string with `IString::from(..)`
pub type IString = Ustr;



// Numeric Types
/// Nonnegative Integers
pub type NaturalNumber = u64;
/// Signed Integers
pub type Integer       = i64;
/// Floating Point Numbers used throughout interval arithmetic and variable bounds.
pub type Float         = f64;

/// The sentinel used for an unbounded side. The host solver represents unboundedness with a
/// large finite value rather than `f64::INFINITY` so that bound arithmetic (e.g. `ub - lb`)
/// never produces `NaN`; we mirror that convention here.
pub const INFINITY: Float = 1e20;

#[inline(always)]
pub fn is_infinite(value: Float) -> bool {
  value >= INFINITY || value <= -INFINITY
}
