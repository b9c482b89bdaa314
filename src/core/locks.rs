/*!

Lock propagation. A constraint's root is locked "down" if violating its lower
side would need the root's value to decrease (and symmetrically "up"); those two counts
propagate down through the DAG via each handler's per-child [`Monotonicity`], compounding
(an `Increasing` edge passes the parent's lock direction through unchanged, a `Decreasing`
edge flips it, and `Unknown`/`Constant` either locks both directions or none).

A node's `monotonicity` array is allocated only while locked: computed once when
the node is first locked and freed again the moment both lock counts return to zero
([`crate::core::node_core::NodeCore::maybe_free_monotonicity`]), rather than carried forever.

*/

use smallvec::SmallVec;

use crate::api::node::ExprNode;
use crate::core::node_core::Monotonicity;

fn monotonicity_row(node: &ExprNode) -> SmallVec<[Monotonicity; 4]> {
  let handler = node.handler();
  (0..node.arity()).map(|i| handler.monotonicity(node, i)).collect()
}

/// Adds `down`/`up` locks to `node` (and recursively to its children, combined through each
/// child edge's monotonicity).
pub fn add_locks(node: &ExprNode, down: u32, up: u32) {
  if down == 0 && up == 0 {
    return;
  }
  {
    let mut core = node.core().borrow_mut();
    core.locks_neg += down;
    core.locks_pos += up;
    if core.monotonicity.is_none() {
      drop(core);
      let row = monotonicity_row(node);
      node.core().borrow_mut().monotonicity = Some(row);
    }
  }

  let children = node.children();
  for (index, child) in children.iter().enumerate() {
    let monotonicity = node.core().borrow().monotonicity.as_ref().unwrap()[index];
    let (child_down, child_up) = propagate_direction(monotonicity, down, up);
    add_locks(child, child_down, child_up);
  }
}

/// Removes `down`/`up` locks from `node` and its children, the exact inverse of
/// [`add_locks`]. Frees each node's monotonicity cache once both its lock counts return to
/// zero.
pub fn remove_locks(node: &ExprNode, down: u32, up: u32) {
  if down == 0 && up == 0 {
    return;
  }
  let monotonicity_snapshot = node.core().borrow().monotonicity.clone();

  {
    let mut core = node.core().borrow_mut();
    core.locks_neg = core.locks_neg.saturating_sub(down);
    core.locks_pos = core.locks_pos.saturating_sub(up);
    core.maybe_free_monotonicity();
  }

  if let Some(monotonicity) = monotonicity_snapshot {
    for (index, child) in node.children().iter().enumerate() {
      let (child_down, child_up) = propagate_direction(monotonicity[index], down, up);
      remove_locks(child, child_down, child_up);
    }
  }
}

/// How a parent's lock directions translate across one child edge, given that edge's
/// monotonicity.
fn propagate_direction(monotonicity: Monotonicity, down: u32, up: u32) -> (u32, u32) {
  match monotonicity {
    Monotonicity::Increasing => (down, up),
    Monotonicity::Decreasing => (up, down),
    Monotonicity::Constant => (0, 0),
    // An operator that isn't known to move monotonically in either direction must be locked
    // both ways, since either direction of change in the child could violate either side.
    Monotonicity::Unknown => (down + up, down + up),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::rc::Rc;
  use crate::builtin::{sum::SumHandler, var::VarHandler};
  use crate::core::payload::Payload;

  fn var(id: u64) -> ExprNode {
    ExprNode::new(Rc::new(VarHandler), Payload::Var(id), vec![])
  }

  #[test]
  fn increasing_edge_passes_lock_direction_through() {
    let x = var(1);
    let y = var(2);
    let root = ExprNode::new(
      Rc::new(SumHandler),
      Payload::Sum { coefficients: smallvec::smallvec![1.0, 1.0], constant: 0.0 },
      vec![x.clone(), y.clone()],
    );
    add_locks(&root, 1, 0);
    assert_eq!(x.locks(), (0, 1));
    assert_eq!(y.locks(), (0, 1));
    assert!(root.is_locked());
  }

  #[test]
  fn decreasing_edge_flips_lock_direction() {
    let x = var(1);
    let root = ExprNode::new(
      Rc::new(SumHandler),
      Payload::Sum { coefficients: smallvec::smallvec![-1.0], constant: 0.0 },
      vec![x.clone()],
    );
    add_locks(&root, 1, 0);
    assert_eq!(x.locks(), (1, 0));
  }

  #[test]
  fn removing_locks_restores_zero_and_frees_monotonicity() {
    let x = var(1);
    let root = ExprNode::new(
      Rc::new(SumHandler),
      Payload::Sum { coefficients: smallvec::smallvec![1.0], constant: 0.0 },
      vec![x.clone()],
    );
    add_locks(&root, 1, 1);
    remove_locks(&root, 1, 1);
    assert_eq!(x.locks(), (0, 0));
    assert!(!root.is_locked());
  }
}
