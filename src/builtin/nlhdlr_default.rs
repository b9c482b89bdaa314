/*!

The catch-all nonlinear handler: lowest priority, so any more specialized handler gets first
refusal, and it only volunteers at a constraint's root — nested subexpressions are left to
whatever specialized handler recognized them, or simply feed their parent's auxiliary-variable
estimate without their own enforcement record.

Enforcement here is the generic fallback: evaluate the raw expression, and estimate/separate
via whatever the root node's own expression handler already offers (a `sum` root is already
linear and needs no cutting at all; anything else falls back to the expression handler's
linear estimator, if it has one).

*/

use std::any::Any;

use crate::abstractions::Float;
use crate::api::expr_handler::LinearEstimate;
use crate::api::nlhandler::{DetectResult, EnforceSides, NlHandler};
use crate::api::node::ExprNode;
use crate::core::error::CoreResult;
use crate::core::host::Host;
use crate::core::interval::Interval;
use crate::core::propagate::reverse::ReversePropQueue;

pub struct DefaultNlHandler;

impl NlHandler for DefaultNlHandler {
  fn name(&self) -> &'static str {
    "default"
  }

  fn priority(&self) -> i32 {
    i32::MIN
  }

  fn detect(&self, _node: &ExprNode, is_root: bool) -> Option<DetectResult> {
    is_root.then_some(DetectResult { sides: EnforceSides::BOTH, handler_data: None })
  }

  fn evalaux(&self, node: &ExprNode) -> Float {
    node.value()
  }

  fn inteval(&self, node: &ExprNode, _host: &dyn Host) -> Interval {
    node.interval()
  }

  fn reverseprop(&self, node: &ExprNode, interval: Interval, queue: &mut ReversePropQueue, force: bool) -> CoreResult<()> {
    node.handler().reverseprop(node, interval, queue, force)
  }

  fn estimate(&self, node: &ExprNode, below: bool) -> Option<LinearEstimate> {
    node.handler().estimate(node, below)
  }

  fn as_any(&self) -> &dyn Any {
    self
  }
}
