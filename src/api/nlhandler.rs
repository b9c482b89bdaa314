/*!

The nonlinear handler contract. A nonlinear handler
recognizes a structure in a subtree (convex, quadratic, bilinear, …) and takes
responsibility for enforcing the relation at that node: interval bounding, reverse
propagation, separation, estimation, and branching scores. `name`, `priority`, and `detect`
are required; the rest default to "this handler offers nothing beyond detection".

*/

use std::any::Any;

use crate::abstractions::Float;
use crate::api::expr_handler::LinearEstimate;
use crate::api::node::ExprNode;
use crate::core::host::Host;
use crate::core::interval::Interval;
use crate::core::propagate::reverse::ReversePropQueue;
use crate::core::error::CoreResult;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct EnforceSides {
  pub below: bool,
  pub above: bool,
}

impl EnforceSides {
  pub const NONE: EnforceSides = EnforceSides { below: false, above: false };
  pub const BOTH: EnforceSides = EnforceSides { below: true, above: true };

  pub fn covers(&self, required: EnforceSides) -> bool {
    (!required.below || self.below) && (!required.above || self.above)
  }

  pub fn union(&self, other: EnforceSides) -> EnforceSides {
    EnforceSides { below: self.below || other.below, above: self.above || other.above }
  }

  pub fn is_none(&self) -> bool {
    !self.below && !self.above
  }
}

/// The outcome of `detect`: which sides of the relation this handler takes
/// responsibility for, and per-node opaque data to carry in the resulting enforcement
/// record.
pub struct DetectResult {
  pub sides: EnforceSides,
  pub handler_data: Option<Box<dyn Any>>,
}

pub trait NlHandler {
  fn name(&self) -> &'static str;

  /// Handlers are tried in descending priority order during detection.
  fn priority(&self) -> i32;

  /// Attempts to recognize this handler's structure at `node`. `is_root` is true only for
  /// the constraint's root expression, since some handlers (e.g. a "default" catch-all)
  /// only want to engage at the root.
  fn detect(&self, node: &ExprNode, is_root: bool) -> Option<DetectResult>;

  /// Auxiliary-variable value as this handler understands the node (may differ from the
  /// expression handler's own `eval`, e.g. a convex handler might evaluate via its
  /// decomposition rather than the raw expression).
  fn evalaux(&self, node: &ExprNode) -> Float;

  fn inteval(&self, _node: &ExprNode, _host: &dyn Host) -> Interval {
    Interval::UNBOUNDED
  }

  fn reverseprop(&self, _node: &ExprNode, _interval: Interval, _queue: &mut ReversePropQueue, _force: bool) -> CoreResult<()> {
    Ok(())
  }

  fn initsepa(&self, _node: &ExprNode) {}
  fn exitsepa(&self, _node: &ExprNode) {}

  /// Emits a cut directly. Returns whether one was produced.
  fn sepa(&self, _node: &ExprNode, _host: &mut dyn Host) -> bool {
    false
  }

  fn estimate(&self, _node: &ExprNode, _below: bool) -> Option<LinearEstimate> {
    None
  }

  fn branchscore(&self, _node: &ExprNode) -> Option<Float> {
    None
  }

  /// Optionally rewrites the node into an equivalent form better suited to this handler
  /// (e.g. expanding a product of sums). Default: no reformulation.
  fn reformulate(&self, node: &ExprNode) -> ExprNode {
    node.clone()
  }

  fn init(&self) {}
  fn exit(&self) {}

  fn as_any(&self) -> &dyn Any;
}

#[derive(Clone, Debug, Default)]
pub struct NlHandlerStats {
  pub detect_calls: u64,
  pub detect_successes: u64,
  pub sepa_calls: u64,
  pub sepa_successes: u64,
  pub time_in_detect: std::time::Duration,
}
