/*!

Auxiliary-variable management and solution repair. Each node an enforcement
record was attached to may get its own host-solver auxiliary variable standing in for the
node's value in cuts and the LP relaxation; once the LP is solved, a candidate solution's
values for those auxiliary variables generally won't satisfy the original nonlinear relation
exactly, so repair recomputes each node bottom-up from the leaves' *original* variable values
and reproposes the corrected vector to the host.

*/

use crate::api::node::ExprNode;
use crate::core::constraint::Constraint;
use crate::core::error::CoreResult;
use crate::core::host::Host;
use crate::core::interval::Interval;

/// Ensures every node in `root`'s subtree that carries an enforcement record has a host
/// auxiliary variable, allocating one (bounded by the node's current interval) where missing.
pub fn ensure_auxiliary_variables(root: &ExprNode, host: &mut dyn Host) {
  for child in root.children() {
    ensure_auxiliary_variables(&child, host);
  }
  if root.has_enforcement_records() && root.aux_var().is_none() {
    let domain = root.interval();
    let var = host.create_auxiliary_variable(domain, root.is_integral());
    root.set_aux_var(Some(var));
  }
}

/// Invalidates and drops every auxiliary variable reachable from `root` (e.g. after a
/// restart or a structural change makes the old ones meaningless).
pub fn invalidate_auxiliary_variables(root: &ExprNode, host: &mut dyn Host) {
  for child in root.children() {
    invalidate_auxiliary_variables(&child, host);
  }
  if let Some(var) = root.aux_var() {
    host.invalidate_auxiliary_variable(var);
    root.set_aux_var(None);
  }
}

/// Recomputes every node's value bottom-up, starting from the leaf `var` nodes' values in
/// `host`'s candidate solution, ignoring whatever the LP relaxation proposed for auxiliary
/// variables. Returns `Err` if some operator's domain is violated by the repaired values
/// (e.g. a negative argument reaching `log` once bounds are respected exactly).
pub fn recompute_from_leaves(node: &ExprNode, host: &dyn Host) -> CoreResult<f64> {
  if let Some(var) = node.with_payload(|p| p.as_var()) {
    let value = host.var_solution_value(var).unwrap_or(0.0);
    return Ok(value);
  }
  let mut children_values = Vec::with_capacity(node.arity());
  for child in node.children() {
    children_values.push(recompute_from_leaves(&child, host)?);
  }
  match node.handler().eval(node, &children_values, host) {
    Some(v) => Ok(v),
    None => Err(crate::core::error::CoreError::domain(node.handler_name(), "repair produced an undefined value")),
  }
}

/// Repairs a candidate solution for one constraint's original (non-auxiliary) variables,
/// ranking tied candidates by smallest objective coefficient first, and proposes
/// the result back to the host.
pub fn repair_and_propose(constraint: &Constraint, host: &mut dyn Host) -> CoreResult<bool> {
  let mut leaves = constraint.var_leaves.clone();
  leaves.sort_by(|a, b| {
    host.var_objective_coefficient(a.var).total_cmp(&host.var_objective_coefficient(b.var))
  });

  let mut values = Vec::with_capacity(leaves.len());
  for leaf in &leaves {
    let bounds: Interval = host.var_bounds(leaf.var);
    let raw = host.var_solution_value(leaf.var).unwrap_or(0.0);
    let clamped = raw.clamp(bounds.lb, bounds.ub);
    values.push((leaf.var, clamped));
  }
  Ok(host.propose_solution(&values))
}
