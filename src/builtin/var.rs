/*!

The `var` handler: a leaf referencing a host-solver variable (`Payload::Var`). All domain
information comes from the host on every call — a `var` node caches nothing of its own
beyond what the generic node-core caches (interval, value) already do.

*/

use std::any::Any;
use std::cmp::Ordering;

use crate::abstractions::Float;
use crate::api::expr_handler::{ExprHandler, LinearEstimate};
use crate::api::node::ExprNode;
use crate::core::host::Host;
use crate::core::interval::Interval;
use crate::core::node_core::Curvature;

pub struct VarHandler;

impl ExprHandler for VarHandler {
  fn name(&self) -> &'static str {
    "var"
  }

  fn eval(&self, node: &ExprNode, _children_values: &[Float], host: &dyn Host) -> Option<Float> {
    let var = node.with_payload(|p| p.as_var())?;
    host.var_solution_value(var)
  }

  fn inteval(&self, node: &ExprNode, _children_intervals: &[Interval], host: &dyn Host) -> Interval {
    match node.with_payload(|p| p.as_var()) {
      Some(var) => host.var_bounds(var),
      None => Interval::UNBOUNDED,
    }
  }

  fn estimate(&self, node: &ExprNode, below: bool) -> Option<LinearEstimate> {
    let _ = node.with_payload(|p| p.as_var())?;
    Some(LinearEstimate { coefficients: vec![1.0], constant: 0.0, is_underestimator: below })
  }

  fn hash(&self, node: &ExprNode, _children_hashes: &[u32]) -> Option<u32> {
    let var = node.with_payload(|p| p.as_var())?;
    Some((var as u32) ^ 0x9E37_79B9)
  }

  fn compare(&self, node: &ExprNode, other: &ExprNode) -> Option<Ordering> {
    let a = node.with_payload(|p| p.as_var())?;
    let b = other.with_payload(|p| p.as_var())?;
    Some(a.cmp(&b))
  }

  fn print(&self, node: &ExprNode, _child_strings: &[String]) -> String {
    node.with_payload(|p| p.as_var()).map(|v| format!("x{v}")).unwrap_or_default()
  }

  fn curvature(&self, _node: &ExprNode, _child_curvatures: &[Curvature]) -> Curvature {
    Curvature::Linear
  }

  fn monotonicity(&self, _node: &ExprNode, _child_index: usize) -> crate::core::node_core::Monotonicity {
    crate::core::node_core::Monotonicity::Increasing
  }

  fn integrality(&self, node: &ExprNode, _child_integral: &[bool]) -> bool {
    node.is_integral()
  }

  fn as_any(&self) -> &dyn Any {
    self
  }
}
