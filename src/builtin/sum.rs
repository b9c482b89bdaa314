/*!

The `sum` handler: `constant + sum(coefficients[i] * children[i])`. The one handler in the
reference set with a real reverse-propagation callback, since it's the shape used throughout
the propagation test scenarios.

*/

use std::any::Any;
use std::cmp::Ordering;

use crate::abstractions::Float;
use crate::api::expr_handler::{ExprHandler, LinearEstimate};
use crate::api::node::ExprNode;
use crate::core::error::CoreResult;
use crate::core::host::Host;
use crate::core::interval::Interval;
use crate::core::node_core::{Curvature, Monotonicity};
use crate::core::propagate::reverse::ReversePropQueue;

pub struct SumHandler;

impl ExprHandler for SumHandler {
  fn name(&self) -> &'static str {
    "sum"
  }

  fn eval(&self, node: &ExprNode, children_values: &[Float], _host: &dyn Host) -> Option<Float> {
    let (coefficients, constant) = node.with_payload(|p| p.as_sum())?;
    let mut total = constant;
    for (c, v) in coefficients.iter().zip(children_values) {
      total += c * v;
    }
    Some(total)
  }

  fn inteval(&self, node: &ExprNode, children_intervals: &[Interval], _host: &dyn Host) -> Interval {
    let Some((coefficients, constant)) = node.with_payload(|p| p.as_sum()) else {
      return Interval::UNBOUNDED;
    };
    let mut total = Interval::degenerate(constant);
    for (c, iv) in coefficients.iter().zip(children_intervals) {
      total = total.add(&iv.scale(*c));
    }
    total
  }

  /// Isolates each child in turn: given the node's interval `I` and the other children's
  /// current intervals, `child[i]` must lie in `(I - constant - sum_{j != i} c_j * child_j) /
  /// c_i` — the standard isolate-the-child pattern for linear operators.
  fn reverseprop(&self, node: &ExprNode, interval: Interval, queue: &mut ReversePropQueue, _force: bool) -> CoreResult<()> {
    let Some((coefficients, constant)) = node.with_payload(|p| p.as_sum()) else {
      return Ok(());
    };
    let children = node.children();
    let child_intervals: Vec<Interval> = children.iter().map(|c| c.interval()).collect();

    for i in 0..children.len() {
      let coefficient = coefficients[i];
      if coefficient == 0.0 {
        continue;
      }
      let mut residual = interval.add(&Interval::degenerate(-constant));
      for (j, iv) in child_intervals.iter().enumerate() {
        if i == j {
          continue;
        }
        residual = residual.add(&iv.scale(-coefficients[j]));
      }
      let bound = residual.scale(1.0 / coefficient);
      queue.tighten_interval(&children[i], bound)?;
    }
    Ok(())
  }

  fn estimate(&self, node: &ExprNode, below: bool) -> Option<LinearEstimate> {
    let (coefficients, constant) = node.with_payload(|p| p.as_sum())?;
    Some(LinearEstimate { coefficients: coefficients.to_vec(), constant, is_underestimator: below })
  }

  fn hash(&self, node: &ExprNode, children_hashes: &[u32]) -> Option<u32> {
    let (coefficients, constant) = node.with_payload(|p| p.as_sum())?;
    let mut hash = constant.to_bits() as u32;
    for (c, h) in coefficients.iter().zip(children_hashes) {
      hash = hash.rotate_left(5) ^ c.to_bits() as u32 ^ h;
    }
    Some(hash)
  }

  fn compare(&self, node: &ExprNode, other: &ExprNode) -> Option<Ordering> {
    let (a_coeffs, a_const) = node.with_payload(|p| p.as_sum())?;
    let (b_coeffs, b_const) = other.with_payload(|p| p.as_sum())?;
    if node.arity() != other.arity() {
      return Some(node.arity().cmp(&other.arity()));
    }
    for (x, y) in a_coeffs.iter().zip(b_coeffs.iter()) {
      let ord = x.total_cmp(y);
      if ord != Ordering::Equal {
        return Some(ord);
      }
    }
    let const_ord = a_const.total_cmp(&b_const);
    if const_ord != Ordering::Equal {
      return Some(const_ord);
    }
    for (x, y) in node.children().iter().zip(other.children().iter()) {
      if !x.ptr_eq(y) {
        return Some(x.id().0.cmp(&y.id().0));
      }
    }
    Some(Ordering::Equal)
  }

  fn print(&self, node: &ExprNode, child_strings: &[String]) -> String {
    let (coefficients, constant) = match node.with_payload(|p| p.as_sum()) {
      Some(v) => v,
      None => return "sum(?)".to_string(),
    };
    let mut terms: Vec<String> = coefficients
        .iter()
        .zip(child_strings)
        .map(|(c, s)| if *c == 1.0 { s.clone() } else { format!("{c}*{s}") })
        .collect();
    if constant != 0.0 || terms.is_empty() {
      terms.push(constant.to_string());
    }
    terms.join(" + ")
  }

  fn curvature(&self, _node: &ExprNode, child_curvatures: &[Curvature]) -> Curvature {
    if child_curvatures.iter().all(|c| *c == Curvature::Linear) {
      Curvature::Linear
    } else {
      Curvature::Unknown
    }
  }

  fn monotonicity(&self, node: &ExprNode, child_index: usize) -> Monotonicity {
    match node.with_payload(|p| p.as_sum()) {
      Some((coefficients, _)) if coefficients[child_index] > 0.0 => Monotonicity::Increasing,
      Some((coefficients, _)) if coefficients[child_index] < 0.0 => Monotonicity::Decreasing,
      Some(_) => Monotonicity::Constant,
      None => Monotonicity::Unknown,
    }
  }

  fn integrality(&self, node: &ExprNode, child_integral: &[bool]) -> bool {
    let Some((coefficients, constant)) = node.with_payload(|p| p.as_sum()) else { return false };
    constant.fract() == 0.0
        && coefficients.iter().zip(child_integral).all(|(c, integral)| *integral && c.fract() == 0.0)
  }

  fn bwdiff(&self, node: &ExprNode, child_index: usize) -> Option<Float> {
    node.with_payload(|p| p.as_sum()).map(|(coefficients, _)| coefficients[child_index])
  }

  fn as_any(&self) -> &dyn Any {
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::rc::Rc;
  use crate::builtin::var::VarHandler;
  use crate::core::payload::Payload;
  use crate::core::tag::Tag;
  use crate::test_support::NoopHost;

  fn var(id: crate::core::host::VarId) -> ExprNode {
    ExprNode::new(Rc::new(VarHandler), Payload::Var(id), vec![])
  }

  fn sum(coefficients: Vec<f64>, children: Vec<ExprNode>, constant: f64) -> ExprNode {
    ExprNode::new(Rc::new(SumHandler), Payload::Sum { coefficients: coefficients.into(), constant }, children)
  }

  #[test]
  fn evaluates_linear_combination() {
    let root = sum(vec![2.0, -1.0], vec![var(1), var(2)], 5.0);
    let value = root.handler().eval(&root, &[3.0, 4.0], &NoopHost);
    assert_eq!(value, Some(2.0 * 3.0 - 4.0 + 5.0));
  }

  #[test]
  fn reverseprop_isolates_each_child() {
    let x = var(1);
    let y = var(2);
    x.set_interval(Interval::new(0.0, 10.0), Tag::NONE);
    y.set_interval(Interval::new(0.0, 10.0), Tag::NONE);
    let root = sum(vec![1.0, 1.0], vec![x.clone(), y.clone()], 0.0);
    root.set_interval(Interval::new(3.0, 3.0), Tag::NONE);

    let mut queue = ReversePropQueue::new(Tag::NONE);
    root.handler().reverseprop(&root, root.interval(), &mut queue, false).unwrap();
    assert_eq!(x.interval(), Interval::new(-7.0, 3.0).intersect(&Interval::new(0.0, 10.0)));
  }
}
