/*!

The expression handler contract: one handler per
operator, invoked by node through every analysis pass. `name` and `eval` are the only
required members; everything else has a default that amounts to "this operator doesn't
participate in this pass."

Rust's ownership model already gives every handler automatic, safe cloning/dropping
(`Rc<dyn ExprHandler>`, `Clone`/`Drop` on whatever payload a handler stashes in
[`crate::core::payload::Payload::Extension`]), so there's no separate copy/free lifecycle
hook to implement here — see `DESIGN.md`.

*/

use std::any::Any;
use std::cmp::Ordering;
use std::time::Duration;

use crate::abstractions::Float;
use crate::api::node::ExprNode;
use crate::core::host::Host;
use crate::core::interval::Interval;
use crate::core::node_core::{Curvature, Monotonicity};
use crate::core::propagate::reverse::ReversePropQueue;
use crate::core::error::CoreResult;

/// A linear under/overestimator of a node's value as a function of its children's current
/// values: `sum(coefficients[i] * child_values[i]) + constant`, valid either as an
/// underestimator (`is_local_lb`) or an overestimator.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinearEstimate {
  pub coefficients: Vec<Float>,
  pub constant: Float,
  pub is_underestimator: bool,
}

pub trait ExprHandler {
  /// Unique operator name, e.g. `"sum"`, `"pow"`, `"var"`.
  fn name(&self) -> &'static str;

  fn precedence(&self) -> i32 {
    0
  }

  /// Evaluates the node given already-evaluated children and, for leaves, the host's
  /// current solution. Returns `None` on a domain error (log of a non-positive value, 0^0,
  /// division by zero, …) — the caller converts that into the sentinel *invalid* value.
  fn eval(&self, node: &ExprNode, children_values: &[Float], host: &dyn Host) -> Option<Float>;

  /// Forward interval-arithmetic range for the node given its children's current
  /// intervals. Default: no information (fully unbounded), so intersecting it is a no-op.
  fn inteval(&self, _node: &ExprNode, _children_intervals: &[Interval], _host: &dyn Host) -> Interval {
    Interval::UNBOUNDED
  }

  /// Bottom-up rewrite to a (possibly new) equivalent simplified node. Default: already
  /// simplified, captured unchanged.
  fn simplify(&self, node: &ExprNode) -> ExprNode {
    node.clone()
  }

  /// Attempts to tighten children given the node's current interval `interval`. Pushes any
  /// tightened child through `queue.tighten_interval`. Default: no reverse-propagation
  /// capability.
  fn reverseprop(&self, _node: &ExprNode, _interval: Interval, _queue: &mut ReversePropQueue, _force: bool) -> CoreResult<()> {
    Ok(())
  }

  /// Produces a linear estimator of the node from its children, if this handler is capable.
  fn estimate(&self, _node: &ExprNode, _below: bool) -> Option<LinearEstimate> {
    None
  }

  /// Emits a cut directly (rather than returning an estimator the caller tightens). Returns
  /// whether a cut was produced.
  fn sepa(&self, _node: &ExprNode, _host: &mut dyn Host) -> bool {
    false
  }

  fn initsepa(&self, _node: &ExprNode) {}
  fn exitsepa(&self, _node: &ExprNode) {}

  /// Structural hash combining this node's own data with its already-computed children
  /// hashes. Required (together with `compare`) for any handler that participates in CSE;
  /// handlers that don't need hash consing may leave this at the default, but then any
  /// node using them can't be deduplicated.
  fn hash(&self, node: &ExprNode, children_hashes: &[u32]) -> Option<u32> {
    let _ = (node, children_hashes);
    None
  }

  /// Total order used by both hash-collision resolution and the simplifier's child-sorting
  /// pass. `None` if this handler doesn't support structural comparison.
  fn compare(&self, _node: &ExprNode, _other: &ExprNode) -> Option<Ordering> {
    None
  }

  fn print(&self, node: &ExprNode, child_strings: &[String]) -> String {
    format!("{}({})", node.handler_name(), child_strings.join(", "))
  }

  fn curvature(&self, _node: &ExprNode, _child_curvatures: &[Curvature]) -> Curvature {
    Curvature::Unknown
  }

  fn monotonicity(&self, _node: &ExprNode, _child_index: usize) -> Monotonicity {
    Monotonicity::Unknown
  }

  fn integrality(&self, _node: &ExprNode, _child_integral: &[bool]) -> bool {
    false
  }

  /// `d(self)/d(child[child_index])`, evaluated at the node's current cached value.
  fn bwdiff(&self, _node: &ExprNode, _child_index: usize) -> Option<Float> {
    None
  }

  fn branchscore(&self, _node: &ExprNode) -> Float {
    0.0
  }

  fn as_any(&self) -> &dyn Any;
}

/// Accumulated per-handler counters and timing. Plain data — no reporting/formatting logic
/// attached; statistics reporting is out of scope here.
#[derive(Clone, Debug, Default)]
pub struct ExprHandlerStats {
  pub eval_calls: u64,
  pub inteval_calls: u64,
  pub simplify_calls: u64,
  pub reverseprop_calls: u64,
  pub domain_errors: u64,
  pub time_in_eval: Duration,
  pub time_in_inteval: Duration,
}
