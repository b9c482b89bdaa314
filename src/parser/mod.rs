/*!

Parser and AST for the textual constraint form. The grammar
itself is generated by LALRPOP from `constraint.lalrpop` into `constraint.rs` at build
time; [`ast`] holds the hand-written parse-tree types it produces, and [`lower`] turns a
parsed tree into an actual expression DAG against a [`crate::core::registry::HandlerRegistry`].

*/

pub mod ast;
pub mod lower;

// Generated by `build.rs` from `constraint.lalrpop`, in the source tree alongside it, before
// this module is compiled.
#[allow(clippy::all)]
mod constraint;

pub use constraint::ConstraintParser;
pub use lower::{build_expr_node, parse_constraint, VarResolver};
