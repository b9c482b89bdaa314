/*!

A single nonlinear constraint: a root expression plus the
`[lhs, rhs]` interval it must lie within, the subset of leaves that reference host variables
(so event subscriptions and solution repair don't need to re-walk the whole DAG), and the
scratch state the propagation/enforcement passes cache between rounds.

*/

use crate::abstractions::Float;
use crate::api::node::ExprNode;
use crate::core::host::{LinearRow, VarId};
use crate::core::interval::Interval;

/// One host-variable leaf reachable from a constraint's root, captured once at registration
/// time so later passes (event handling, solution repair) don't need to re-walk the DAG to
/// find them.
#[derive(Clone)]
pub struct VarLeaf {
  pub var: VarId,
  pub node: ExprNode,
}

pub struct Constraint {
  pub name: String,
  pub root: ExprNode,
  pub lhs: Float,
  pub rhs: Float,

  pub var_leaves: Vec<VarLeaf>,

  pub is_simplified: bool,
  pub is_propagated: bool,

  /// Cached violation of the lower and upper side, refreshed each time the root is
  /// re-evaluated against a candidate solution.
  pub lhs_violation: Float,
  pub rhs_violation: Float,

  /// Cached linear-row snapshot of the constraint's NLP relaxation, invalidated whenever the
  /// root's structure (not just its bounds) changes.
  pub linear_row: Option<LinearRow>,

  pub locks_down: u32,
  pub locks_up: u32,
}

impl Constraint {
  pub fn new(name: impl Into<String>, root: ExprNode, lhs: Float, rhs: Float) -> Self {
    let var_leaves = collect_var_leaves(&root);
    Constraint {
      name: name.into(),
      root,
      lhs,
      rhs,
      var_leaves,
      is_simplified: false,
      is_propagated: false,
      lhs_violation: 0.0,
      rhs_violation: 0.0,
      linear_row: None,
      locks_down: 0,
      locks_up: 0,
    }
  }

  pub fn sides(&self) -> Interval {
    Interval::new(self.lhs, self.rhs)
  }

  /// Recomputes `lhs_violation`/`rhs_violation` from the root's currently cached value.
  /// Positive means violated by that amount; the constraint is feasible when both are
  /// `<= tolerance`.
  pub fn refresh_violation(&mut self) {
    let value = self.root.value();
    self.lhs_violation = (self.lhs - value).max(0.0);
    self.rhs_violation = (value - self.rhs).max(0.0);
  }

  pub fn max_violation(&self) -> Float {
    self.lhs_violation.max(self.rhs_violation)
  }

  pub fn is_feasible(&self, tolerance: Float) -> bool {
    self.max_violation() <= tolerance
  }

  pub fn invalidate_linear_row(&mut self) {
    self.linear_row = None;
  }
}

/// Recaptures the distinct variable leaves reachable from `root`, after a simplification or
/// CSE pass may have changed the DAG's shape.
fn collect_var_leaves(root: &ExprNode) -> Vec<VarLeaf> {
  let mut leaves = Vec::new();
  collect_var_leaves_into(root, &mut leaves);
  leaves
}

fn collect_var_leaves_into(node: &ExprNode, out: &mut Vec<VarLeaf>) {
  if let Some(var) = node.with_payload(|p| p.as_var()) {
    if !out.iter().any(|l: &VarLeaf| l.var == var) {
      out.push(VarLeaf { var, node: node.clone() });
    }
    return;
  }
  for child in node.children() {
    collect_var_leaves_into(&child, out);
  }
}
