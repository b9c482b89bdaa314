/*!

The parse tree produced by the generated LALRPOP parser, before it's lowered into an expression DAG. Kept deliberately thin: no
node creation, no handler lookups — that's [`super::build_expr_node`]'s job, since it needs a
[`crate::core::registry::HandlerRegistry`] and a variable-name resolver that the grammar
itself has no business knowing about.

*/

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum UnOp {
  Neg,
}

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum BinOp {
  Add,
  Sub,
  Mul,
  Div,
  Pow,
}

#[derive(Clone, Debug)]
pub enum Expr {
  Number(f64),
  /// A `<name>`-bracketed variable reference; resolved to a host `VarId` during lowering.
  Var(String),
  Unary(UnOp, Box<Expr>),
  Binary(BinOp, Box<Expr>, Box<Expr>),
  /// A `name(arg, arg, ...)` call to an operator outside the reference set (`+ - * / ^`);
  /// lowered to whatever expression handler is registered under `name`.
  Call(String, Vec<Expr>),
}

#[derive(Clone, Copy, Debug)]
pub enum Relation {
  LessEq(f64),
  Eq(f64),
  GreaterEq(f64),
}

/// A parsed constraint: an optional `lhs <=` prefix, the expression itself, and an optional
/// relation against a second bound. The free-expression alternative (no relation at all) is
/// represented by `relation: None`.
#[derive(Clone, Debug)]
pub struct Constraint {
  pub lhs: Option<f64>,
  pub expr: Expr,
  pub relation: Option<Relation>,
}

impl Constraint {
  /// Resolves the parsed `lhs`/relation pair down to the `[lhs, rhs]` interval a
  /// [`crate::core::constraint::Constraint`] needs, using the host solver's convention of a
  /// large finite sentinel for an unbounded side.
  pub fn sides(&self) -> (f64, f64) {
    use crate::abstractions::INFINITY;
    match (self.lhs, self.relation) {
      (Some(lhs), Some(Relation::LessEq(rhs))) => (lhs, rhs),
      (None, Some(Relation::LessEq(rhs))) => (-INFINITY, rhs),
      (None, Some(Relation::GreaterEq(lhs))) => (lhs, INFINITY),
      (_, Some(Relation::Eq(v))) => (v, v),
      (Some(lhs), None) => (lhs, INFINITY),
      (None, None) => (-INFINITY, INFINITY),
    }
  }
}
