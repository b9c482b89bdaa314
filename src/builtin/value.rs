/*!

The `value` handler: a leaf holding a constant (`Payload::Value`).

*/

use std::any::Any;
use std::cmp::Ordering;

use crate::abstractions::Float;
use crate::api::expr_handler::{ExprHandler, LinearEstimate};
use crate::api::node::ExprNode;
use crate::core::host::Host;
use crate::core::interval::Interval;
use crate::core::node_core::Curvature;

pub struct ValueHandler;

impl ExprHandler for ValueHandler {
  fn name(&self) -> &'static str {
    "value"
  }

  fn eval(&self, node: &ExprNode, _children_values: &[Float], _host: &dyn Host) -> Option<Float> {
    node.with_payload(|p| p.as_value())
  }

  fn inteval(&self, node: &ExprNode, _children_intervals: &[Interval], _host: &dyn Host) -> Interval {
    let value = node.with_payload(|p| p.as_value()).unwrap_or(0.0);
    Interval::degenerate(value)
  }

  fn estimate(&self, node: &ExprNode, below: bool) -> Option<LinearEstimate> {
    let value = node.with_payload(|p| p.as_value())?;
    Some(LinearEstimate { coefficients: vec![], constant: value, is_underestimator: below })
  }

  fn hash(&self, node: &ExprNode, _children_hashes: &[u32]) -> Option<u32> {
    let value = node.with_payload(|p| p.as_value())?;
    Some(value.to_bits() as u32 ^ (value.to_bits() >> 32) as u32)
  }

  fn compare(&self, node: &ExprNode, other: &ExprNode) -> Option<Ordering> {
    let a = node.with_payload(|p| p.as_value())?;
    let b = other.with_payload(|p| p.as_value())?;
    Some(a.total_cmp(&b))
  }

  fn print(&self, node: &ExprNode, _child_strings: &[String]) -> String {
    node.with_payload(|p| p.as_value()).map(|v| v.to_string()).unwrap_or_default()
  }

  fn curvature(&self, _node: &ExprNode, _child_curvatures: &[Curvature]) -> Curvature {
    Curvature::Linear
  }

  fn integrality(&self, node: &ExprNode, _child_integral: &[bool]) -> bool {
    node.with_payload(|p| p.as_value()).map(|v| v.fract() == 0.0).unwrap_or(false)
  }

  fn as_any(&self) -> &dyn Any {
    self
  }
}
