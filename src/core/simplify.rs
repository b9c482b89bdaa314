/*!

The canonicalization pipeline: a bottom-up rewrite that first simplifies every
child, then applies a handful of generic algebraic rules recognized directly from
[`Payload`] (constant folding, sum flattening, dropping zero-coefficient terms, canonical
child ordering, trivial powers) before finally asking the node's own handler whether it has
anything handler-specific to contribute. Common-subexpression elimination
([`crate::core::hash_cse`]) is a separate pass run afterward across a whole constraint set,
not part of this per-node rewrite.

*/

use std::rc::Rc;

use crate::abstractions::Float;
use crate::api::node::ExprNode;
use crate::builtin::{pow::PowHandler, sum::SumHandler, value::ValueHandler};
use crate::core::host::Host;
use crate::core::payload::Payload;

struct NoHost;
impl Host for NoHost {
  fn var_bounds(&self, _var: crate::core::host::VarId) -> crate::core::interval::Interval {
    crate::core::interval::Interval::UNBOUNDED
  }
  fn var_is_integer(&self, _var: crate::core::host::VarId) -> bool {
    false
  }
  fn var_solution_value(&self, _var: crate::core::host::VarId) -> Option<f64> {
    None
  }
  fn var_objective_coefficient(&self, _var: crate::core::host::VarId) -> f64 {
    0.0
  }
  fn tighten_lower_bound(&mut self, _var: crate::core::host::VarId, _lb: f64) -> crate::core::host::BoundChangeResult {
    crate::core::host::BoundChangeResult::Unchanged
  }
  fn tighten_upper_bound(&mut self, _var: crate::core::host::VarId, _ub: f64) -> crate::core::host::BoundChangeResult {
    crate::core::host::BoundChangeResult::Unchanged
  }
  fn add_locks(&mut self, _var: crate::core::host::VarId, _down: u32, _up: u32) {}
  fn remove_locks(&mut self, _var: crate::core::host::VarId, _down: u32, _up: u32) {}
  fn create_auxiliary_variable(&mut self, _domain: crate::core::interval::Interval, _integer: bool) -> crate::core::host::VarId {
    0
  }
  fn invalidate_auxiliary_variable(&mut self, _var: crate::core::host::VarId) {}
  fn submit_cut(&mut self, _row: &crate::core::host::LinearRow) -> crate::core::host::CutResult {
    crate::core::host::CutResult { separated: false, cutoff: false }
  }
  fn register_branching_candidate(&mut self, _var: crate::core::host::VarId, _score: f64) {}
  fn propose_solution(&mut self, _values: &[(crate::core::host::VarId, f64)]) -> bool {
    false
  }
}

fn value_node(v: Float) -> ExprNode {
  ExprNode::new(Rc::new(ValueHandler), Payload::Value(v), vec![])
}

/// Bottom-up simplification of `node`'s whole subtree. Always returns a node — possibly
/// `node` itself, unchanged, if nothing applied.
pub fn simplify(node: &ExprNode) -> ExprNode {
  let simplified_children: Vec<ExprNode> = node.children().iter().map(simplify).collect();
  let rebuilt = if simplified_children.iter().zip(node.children()).any(|(a, b)| !a.ptr_eq(&b)) {
    let rebuilt = ExprNode::new(node.handler(), clone_payload(node), simplified_children);
    rebuilt
  } else {
    node.clone()
  };

  let folded = fold_constants(&rebuilt);
  let generic = apply_generic_rules(&folded);
  generic.handler().simplify(&generic)
}

fn clone_payload(node: &ExprNode) -> Payload {
  node.with_payload(|p| match p {
    Payload::None => Payload::None,
    Payload::Value(v) => Payload::Value(*v),
    Payload::Var(v) => Payload::Var(*v),
    Payload::Sum { coefficients, constant } => Payload::Sum { coefficients: coefficients.clone(), constant: *constant },
    Payload::Pow { exponent } => Payload::Pow { exponent: *exponent },
    Payload::Extension(_) => Payload::None,
  })
}

/// If every child is already a `value` leaf, evaluates `node` once and replaces it with the
/// resulting constant.
fn fold_constants(node: &ExprNode) -> ExprNode {
  if node.arity() == 0 {
    return node.clone();
  }
  let children = node.children();
  let values: Option<Vec<Float>> = children.iter().map(|c| c.with_payload(|p| p.as_value())).collect();
  let Some(values) = values else { return node.clone() };
  match node.handler().eval(node, &values, &NoHost) {
    Some(v) => value_node(v),
    None => node.clone(),
  }
}

/// Generic rules recognized directly off [`Payload`], independent of which handler a node
/// uses: flattening nested sums, dropping zero-coefficient terms, canonical child ordering,
/// and trivial powers (`x^1`, `x^0`).
fn apply_generic_rules(node: &ExprNode) -> ExprNode {
  if node.handler_name() == "sum" {
    return simplify_sum(node);
  }
  if node.handler_name() == "pow" {
    return simplify_pow(node);
  }
  node.clone()
}

fn simplify_sum(node: &ExprNode) -> ExprNode {
  let Some((coefficients, mut constant)) = node.with_payload(|p| p.as_sum()) else { return node.clone() };
  let mut terms: Vec<(Float, ExprNode)> = Vec::new();

  for (coeff, child) in coefficients.iter().zip(node.children()) {
    if *coeff == 0.0 {
      continue;
    }
    if let Some(v) = child.with_payload(|p| p.as_value()) {
      constant += coeff * v;
      continue;
    }
    // Flatten a nested sum: `a * (c + sum(b_i * x_i))` distributes `a` over the inner terms.
    if child.handler_name() == "sum" {
      if let Some((inner_coeffs, inner_constant)) = child.with_payload(|p| p.as_sum()) {
        constant += coeff * inner_constant;
        for (inner_coeff, inner_child) in inner_coeffs.iter().zip(child.children()) {
          terms.push((coeff * inner_coeff, inner_child));
        }
        continue;
      }
    }
    terms.push((*coeff, child));
  }

  // Combine terms the handler considers structurally equal (not just pointer-equal — CSE
  // hasn't necessarily run yet), so `<x> - <x>` collapses instead of surviving as two
  // canceling-but-distinct children.
  let mut combined: Vec<(Float, ExprNode)> = Vec::with_capacity(terms.len());
  'terms: for (coeff, child) in terms {
    for (existing_coeff, existing_child) in combined.iter_mut() {
      if existing_child.handler_name() == child.handler_name()
          && existing_child.handler().compare(existing_child, &child) == Some(std::cmp::Ordering::Equal)
      {
        *existing_coeff += coeff;
        continue 'terms;
      }
    }
    combined.push((coeff, child));
  }
  let terms: Vec<(Float, ExprNode)> = combined.into_iter().filter(|(c, _)| *c != 0.0).collect();

  if terms.is_empty() {
    return value_node(constant);
  }
  if terms.len() == 1 && terms[0].0 == 1.0 && constant == 0.0 {
    return terms[0].1.clone();
  }

  terms.sort_by(|(_, a), (_, b)| {
    a.handler().compare(a, b).unwrap_or_else(|| a.id().0.cmp(&b.id().0))
  });

  let (new_coefficients, new_children): (Vec<Float>, Vec<ExprNode>) = terms.into_iter().unzip();
  ExprNode::new(
    Rc::new(SumHandler),
    Payload::Sum { coefficients: new_coefficients.into(), constant },
    new_children,
  )
}

fn simplify_pow(node: &ExprNode) -> ExprNode {
  let Some(exponent) = node.with_payload(|p| p.as_pow_exponent()) else { return node.clone() };
  let base = node.child(0);
  if exponent == 1.0 {
    return base;
  }
  if exponent == 0.0 {
    return value_node(1.0);
  }
  ExprNode::new(Rc::new(PowHandler), Payload::Pow { exponent }, vec![base])
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::builtin::var::VarHandler;

  fn var(id: u64) -> ExprNode {
    ExprNode::new(Rc::new(VarHandler), Payload::Var(id), vec![])
  }

  #[test]
  fn constant_arithmetic_folds_away() {
    let node = ExprNode::new(
      Rc::new(SumHandler),
      Payload::Sum { coefficients: smallvec::smallvec![2.0, 3.0], constant: 1.0 },
      vec![value_node(2.0), value_node(5.0)],
    );
    let simplified = simplify(&node);
    assert_eq!(simplified.with_payload(|p| p.as_value()), Some(1.0 + 4.0 + 15.0));
  }

  #[test]
  fn zero_coefficient_term_is_dropped() {
    let x = var(1);
    let y = var(2);
    let node = ExprNode::new(
      Rc::new(SumHandler),
      Payload::Sum { coefficients: smallvec::smallvec![1.0, 0.0], constant: 0.0 },
      vec![x.clone(), y],
    );
    let simplified = simplify(&node);
    assert!(simplified.ptr_eq(&x), "a single surviving unit-coefficient term collapses to the bare child");
  }

  #[test]
  fn nested_sum_flattens() {
    let x = var(1);
    let y = var(2);
    let inner = ExprNode::new(
      Rc::new(SumHandler),
      Payload::Sum { coefficients: smallvec::smallvec![1.0], constant: 3.0 },
      vec![y.clone()],
    );
    let outer = ExprNode::new(
      Rc::new(SumHandler),
      Payload::Sum { coefficients: smallvec::smallvec![1.0, 2.0], constant: 0.0 },
      vec![x.clone(), inner],
    );
    let simplified = simplify(&outer);
    let (coefficients, constant) = simplified.with_payload(|p| p.as_sum()).unwrap();
    assert_eq!(constant, 6.0);
    assert_eq!(coefficients.len(), 2);
  }

  #[test]
  fn structurally_equal_terms_with_opposite_coefficients_cancel() {
    let x1 = var(1);
    let x2 = var(1);
    let node = ExprNode::new(
      Rc::new(SumHandler),
      Payload::Sum { coefficients: smallvec::smallvec![1.0, -1.0], constant: 0.0 },
      vec![x1, x2],
    );
    let simplified = simplify(&node);
    assert_eq!(simplified.with_payload(|p| p.as_value()), Some(0.0));
  }

  #[test]
  fn pow_to_the_first_power_is_the_base() {
    let x = var(1);
    let node = ExprNode::new(Rc::new(PowHandler), Payload::Pow { exponent: 1.0 }, vec![x.clone()]);
    assert!(simplify(&node).ptr_eq(&x));
  }
}
