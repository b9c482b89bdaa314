/*!

Lowers a parsed [`super::ast::Expr`] into an expression DAG built from handlers in a
[`HandlerRegistry`]. `+`/`-`/`*`/`/`/`^` always go through the reference `sum`/`pow`
handlers regardless of what else is registered, since those are the operators the grammar
itself understands structurally; a `name(args)` call defers entirely to whatever handler
is registered under `name`, with no opinion on how that handler wants its children's
`Payload` populated beyond the generic `Payload::None`.

*/

use std::rc::Rc;

use smallvec::smallvec;

use crate::api::node::ExprNode;
use crate::core::error::{CoreError, CoreResult};
use crate::core::host::VarId;
use crate::core::payload::Payload;
use crate::core::registry::HandlerRegistry;
use crate::parser::ast::{BinOp, Constraint, Expr, UnOp};

/// Resolves a parsed `<name>` variable reference to a host [`VarId`]. Supplied by the
/// caller, since name-to-id resolution is host policy, not something the parser or the DAG
/// builder has any business owning.
pub trait VarResolver {
  fn resolve(&mut self, name: &str) -> CoreResult<VarId>;
}

impl<F: FnMut(&str) -> CoreResult<VarId>> VarResolver for F {
  fn resolve(&mut self, name: &str) -> CoreResult<VarId> {
    self(name)
  }
}

fn value_node(v: f64) -> CoreResult<ExprNode> {
  // The `value` handler is always available: it has no handler-specific state to look up
  // in the registry, so building its node directly keeps constant-folding paths (e.g. a
  // literal `3` inside `3*x`) from depending on registration order.
  Ok(ExprNode::new(Rc::new(crate::builtin::value::ValueHandler), Payload::Value(v), vec![]))
}

/// Builds an [`ExprNode`] tree from a parsed expression, looking up non-reference operators
/// (anything beyond `+ - * / ^`) by name in `registry`.
pub fn build_expr_node(
  expr: &Expr,
  registry: &HandlerRegistry,
  vars: &mut dyn VarResolver,
) -> CoreResult<ExprNode> {
  match expr {
    Expr::Number(v) => value_node(*v),

    Expr::Var(name) => {
      let var = vars.resolve(name)?;
      let handler = registry.expr_handler("var")?;
      Ok(ExprNode::new(handler, Payload::Var(var), vec![]))
    }

    Expr::Unary(UnOp::Neg, inner) => {
      let child = build_expr_node(inner, registry, vars)?;
      let handler = registry.expr_handler("sum")?;
      Ok(ExprNode::new(
        handler,
        Payload::Sum { coefficients: smallvec![-1.0], constant: 0.0 },
        vec![child],
      ))
    }

    Expr::Binary(BinOp::Add, lhs, rhs) => build_sum(lhs, rhs, 1.0, 1.0, registry, vars),
    Expr::Binary(BinOp::Sub, lhs, rhs) => build_sum(lhs, rhs, 1.0, -1.0, registry, vars),

    Expr::Binary(BinOp::Mul, lhs, rhs) => {
      // A product where one side folds to a literal constant lowers to a `sum` node with a
      // single scaled child, so the reference library's linear handler (and its real
      // `reverseprop`) covers the common "coefficient * term" case without a dedicated
      // multiplication handler.
      if let Some(c) = as_constant(lhs) {
        let child = build_expr_node(rhs, registry, vars)?;
        let handler = registry.expr_handler("sum")?;
        return Ok(ExprNode::new(handler, Payload::Sum { coefficients: smallvec![c], constant: 0.0 }, vec![child]));
      }
      if let Some(c) = as_constant(rhs) {
        let child = build_expr_node(lhs, registry, vars)?;
        let handler = registry.expr_handler("sum")?;
        return Ok(ExprNode::new(handler, Payload::Sum { coefficients: smallvec![c], constant: 0.0 }, vec![child]));
      }
      Err(CoreError::UnsupportedOperator {
        operator: "product of two non-constant subexpressions (register a dedicated multiplication handler)".to_string(),
      })
    }

    Expr::Binary(BinOp::Div, lhs, rhs) => {
      let c = as_constant(rhs).ok_or_else(|| CoreError::UnsupportedOperator {
        operator: "division by a non-constant subexpression".to_string(),
      })?;
      if c == 0.0 {
        return Err(CoreError::domain("/", "division by zero"));
      }
      let child = build_expr_node(lhs, registry, vars)?;
      let handler = registry.expr_handler("sum")?;
      Ok(ExprNode::new(handler, Payload::Sum { coefficients: smallvec![1.0 / c], constant: 0.0 }, vec![child]))
    }

    Expr::Binary(BinOp::Pow, base, exponent) => {
      let e = as_constant(exponent).ok_or_else(|| CoreError::UnsupportedOperator {
        operator: "exponent must be a literal constant".to_string(),
      })?;
      let child = build_expr_node(base, registry, vars)?;
      let handler = registry.expr_handler("pow")?;
      Ok(ExprNode::new(handler, Payload::Pow { exponent: e }, vec![child]))
    }

    Expr::Call(name, args) => {
      let handler = registry.expr_handler(name)?;
      let children = args
          .iter()
          .map(|a| build_expr_node(a, registry, vars))
          .collect::<CoreResult<Vec<_>>>()?;
      Ok(ExprNode::new(handler, Payload::None, children))
    }
  }
}

fn build_sum(
  lhs: &Expr,
  rhs: &Expr,
  lhs_coeff: f64,
  rhs_coeff: f64,
  registry: &HandlerRegistry,
  vars: &mut dyn VarResolver,
) -> CoreResult<ExprNode> {
  let left = build_expr_node(lhs, registry, vars)?;
  let right = build_expr_node(rhs, registry, vars)?;
  let handler = registry.expr_handler("sum")?;
  Ok(ExprNode::new(
    handler,
    Payload::Sum { coefficients: smallvec![lhs_coeff, rhs_coeff], constant: 0.0 },
    vec![left, right],
  ))
}

fn as_constant(expr: &Expr) -> Option<f64> {
  match expr {
    Expr::Number(v) => Some(*v),
    Expr::Unary(UnOp::Neg, inner) => as_constant(inner).map(|v| -v),
    _ => None,
  }
}

/// Parses and lowers a whole textual constraint, returning the built root node and the
/// `[lhs, rhs]` sides a [`crate::core::constraint::Constraint`] needs.
pub fn parse_constraint(
  text: &str,
  registry: &HandlerRegistry,
  vars: &mut dyn VarResolver,
) -> CoreResult<(ExprNode, f64, f64)> {
  let parsed: Constraint = crate::parser::ConstraintParser::new()
      .parse(text)
      .map_err(|e| CoreError::ReadError { position: 0, message: e.to_string() })?;
  let (lhs, rhs) = parsed.sides();
  let root = build_expr_node(&parsed.expr, registry, vars)?;
  Ok((root, lhs, rhs))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::builtin::{pow::PowHandler, sum::SumHandler, value::ValueHandler, var::VarHandler};

  fn registry() -> HandlerRegistry {
    let mut r = HandlerRegistry::new();
    r.register_expr_handler(Rc::new(ValueHandler)).unwrap();
    r.register_expr_handler(Rc::new(VarHandler)).unwrap();
    r.register_expr_handler(Rc::new(SumHandler)).unwrap();
    r.register_expr_handler(Rc::new(PowHandler)).unwrap();
    r
  }

  struct NameResolver;
  impl VarResolver for NameResolver {
    fn resolve(&mut self, name: &str) -> CoreResult<VarId> {
      match name {
        "x" => Ok(1),
        "y" => Ok(2),
        other => Err(CoreError::PluginLookupError { name: other.to_string() }),
      }
    }
  }

  #[test]
  fn parses_a_simple_linear_inequality() {
    let registry = registry();
    let mut vars = NameResolver;
    let (root, lhs, rhs) = parse_constraint("<x> + 2*<y> <= 10", &registry, &mut vars).unwrap();
    assert_eq!(lhs, -crate::abstractions::INFINITY);
    assert_eq!(rhs, 10.0);
    assert_eq!(root.handler_name(), "sum");
    assert_eq!(root.arity(), 2);
  }

  #[test]
  fn parses_a_power_with_explicit_exponent() {
    let registry = registry();
    let mut vars = NameResolver;
    let (root, _, _) = parse_constraint("<x>^2 = 4", &registry, &mut vars).unwrap();
    assert_eq!(root.handler_name(), "pow");
    assert_eq!(root.with_payload(|p| match p {
      Payload::Pow { exponent } => *exponent,
      _ => f64::NAN,
    }), 2.0);
  }

  #[test]
  fn unknown_variable_name_fails_to_resolve() {
    let registry = registry();
    let mut vars = NameResolver;
    let result = parse_constraint("<z> <= 1", &registry, &mut vars);
    assert!(result.is_err());
  }

  #[test]
  fn handler_specific_call_with_no_registered_handler_fails_to_resolve() {
    let registry = registry();
    let mut vars = NameResolver;
    let result = parse_constraint("exp(<x>) <= 1", &registry, &mut vars);
    assert!(matches!(result, Err(CoreError::PluginLookupError { .. })));
  }
}
