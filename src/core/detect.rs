/*!

Detection and the enforcement loop. Detection walks a constraint's root looking
for, at every node, the highest-priority nonlinear handler willing to take responsibility for
enforcing some side of the relation there; a node keeps accumulating handlers until both
sides are covered or every registered handler has been asked. Detection runs once per node
per constraint registration, not re-run from scratch on every round — see `DESIGN.md`.

Enforcement then asks every node carrying an enforcement record, worst violation first,
whether it can cut off the current candidate solution; it stops the moment every constraint's
violation is within `feasibility_tolerance` or a separator reports a cutoff.

*/

use crate::abstractions::Float;
use crate::api::nlhandler::EnforceSides;
use crate::api::node::ExprNode;
use crate::core::config::Config;
use crate::core::constraint::Constraint;
use crate::core::error::CoreResult;
use crate::core::host::Host;
use crate::core::node_core::EnforcementRecord;
use crate::core::registry::HandlerRegistry;

/// Which phase of a constraint's lifecycle detection is running in; only
/// [`DetectPhase::Initial`] is root-aware (a `default` handler only volunteering at the
/// root) — a later re-detection after a structural change
/// (`Restructured`) re-examines every node, root included, since simplification or CSE may
/// have moved what used to be the root.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum DetectPhase {
  Initial,
  Restructured,
}

/// Runs detection over every node of `constraint`'s subtree, attaching an
/// [`EnforcementRecord`] wherever some handler claims responsibility. Returns the number of
/// nodes left with no handler covering some side, which the caller may treat as a soft
/// warning.
pub fn detect(registry: &mut HandlerRegistry, constraint: &Constraint, phase: DetectPhase) -> usize {
  let mut failed = 0;
  detect_node(registry, &constraint.root, &constraint.root, phase, &mut failed);
  failed
}

fn detect_node(registry: &mut HandlerRegistry, node: &ExprNode, root: &ExprNode, phase: DetectPhase, failed: &mut usize) {
  for child in node.children() {
    detect_node(registry, &child, root, phase, failed);
  }

  if node.has_enforcement_records() && phase == DetectPhase::Initial {
    return;
  }
  node.core().borrow_mut().clear_enforcement_records();

  let is_root = node.ptr_eq(root);
  let mut covered = EnforceSides::NONE;

  let handlers: Vec<_> = registry.active_nl_handlers().cloned().collect();
  for handler in handlers {
    if covered == EnforceSides::BOTH {
      break;
    }
    if let Some(result) = handler.detect(node, is_root) {
      if result.sides.is_none() {
        continue;
      }
      covered = covered.union(result.sides);
      if let Some(stats) = registry.nl_stats_mut(handler.name()) {
        stats.detect_calls += 1;
        stats.detect_successes += 1;
      }
      node.core().borrow_mut().enforcement_records.push(EnforcementRecord {
        handler,
        handler_data: result.handler_data,
        initsepa_called: false,
        cached_aux_value: Float::NAN,
        enforces_below: result.sides.below,
        enforces_above: result.sides.above,
      });
    }
  }

  if !covered.covers(EnforceSides::BOTH) {
    *failed += 1;
    registry.record_failed_detection();
    crate::abstractions::tracing::debug!(
      node = node.handler_name(),
      is_root,
      ?covered,
      "detection left this node without full enforcement coverage",
    );
  }
}

/// Runs one enforcement round across `constraints`: evaluates each root, refreshes its
/// violation, and — worst violation first — asks every enforcement record attached to that
/// root's subtree to separate. Returns true if every constraint ended the round within
/// `config.feasibility_tolerance`.
pub fn enforce_round(
  constraints: &mut [Constraint],
  host: &mut dyn Host,
  config: &Config,
) -> CoreResult<bool> {
  for constraint in constraints.iter_mut() {
    constraint.refresh_violation();
  }

  let mut order: Vec<usize> = (0..constraints.len()).collect();
  order.sort_by(|&a, &b| constraints[b].max_violation().total_cmp(&constraints[a].max_violation()));

  let mut all_feasible = true;
  for index in order {
    let constraint = &constraints[index];
    if constraint.is_feasible(config.feasibility_tolerance) {
      continue;
    }
    all_feasible = false;
    separate_subtree(&constraint.root, host);
  }
  Ok(all_feasible)
}

fn separate_subtree(node: &ExprNode, host: &mut dyn Host) {
  for child in node.children() {
    separate_subtree(&child, host);
  }
  let records_len = node.core().borrow().enforcement_records.len();
  for i in 0..records_len {
    let handler = node.core().borrow().enforcement_records[i].handler.clone();
    handler.sepa(node, host);
  }
}
