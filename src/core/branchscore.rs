/*!

Branch-score propagation. Each constraint root contributes a score for every
variable leaf reachable from it, computed bottom-up: a leaf's own score is whatever its
enforcement record(s) or handler reports directly, and an internal node's score is
distributed to its children in proportion to `|d(node)/d(child)|` (the magnitude of its
backward derivative, [`crate::api::expr_handler::ExprHandler::bwdiff`]) — a node the parent
barely depends on contributes little to its children's branching priority regardless of how
violated the constraint as a whole is.

*/

use crate::abstractions::{Float, HashMap};
use crate::core::host::VarId;
use crate::core::node_core::EnforcementRecord;
use crate::api::node::ExprNode;

/// Accumulates a branching score for every variable leaf reachable from `root`, adding into
/// (rather than overwriting) whatever `scores` already held — callers typically fold scores
/// from several constraints into one map before picking a branching variable.
pub fn accumulate_branch_scores(root: &ExprNode, root_score: Float, scores: &mut HashMap<VarId, Float>) {
  propagate_score(root, root_score, scores);
}

fn propagate_score(node: &ExprNode, incoming: Float, scores: &mut HashMap<VarId, Float>) {
  if incoming == 0.0 {
    return;
  }

  if let Some(var) = node.with_payload(|p| p.as_var()) {
    *scores.entry(var).or_insert(0.0) += incoming;
    return;
  }

  let own = own_node_score(node);
  let total_incoming = incoming + own;

  let children = node.children();
  if children.is_empty() {
    return;
  }

  let weights: Vec<Float> = (0..children.len())
      .map(|i| node.handler().bwdiff(node, i).map(Float::abs).unwrap_or(1.0))
      .collect();
  let weight_sum: Float = weights.iter().sum();
  if weight_sum <= 0.0 {
    // No derivative information: split evenly rather than silently dropping the score.
    let share = total_incoming / children.len() as Float;
    for child in &children {
      propagate_score(child, share, scores);
    }
    return;
  }

  for (child, weight) in children.iter().zip(&weights) {
    propagate_score(child, total_incoming * (weight / weight_sum), scores);
  }
}

/// The direct contribution an enforcement record (or the node's own handler, as a fallback)
/// makes to this node's score, before it gets distributed to children.
fn own_node_score(node: &ExprNode) -> Float {
  let records_score: Float = node
      .core()
      .borrow()
      .enforcement_records
      .iter()
      .map(|r: &EnforcementRecord| r.handler.branchscore(node).unwrap_or(0.0))
      .sum();
  if records_score != 0.0 {
    return records_score;
  }
  node.handler().branchscore(node)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::rc::Rc;
  use crate::builtin::{sum::SumHandler, var::VarHandler};
  use crate::core::payload::Payload;

  fn var(id: VarId) -> ExprNode {
    ExprNode::new(Rc::new(VarHandler), Payload::Var(id), vec![])
  }

  #[test]
  fn score_splits_by_derivative_magnitude() {
    let x = var(1);
    let y = var(2);
    let root = ExprNode::new(
      Rc::new(SumHandler),
      Payload::Sum { coefficients: smallvec::smallvec![3.0, 1.0], constant: 0.0 },
      vec![x, y],
    );
    let mut scores = HashMap::new();
    accumulate_branch_scores(&root, 4.0, &mut scores);
    assert_eq!(scores.get(&1).copied(), Some(3.0));
    assert_eq!(scores.get(&2).copied(), Some(1.0));
  }

  #[test]
  fn scores_from_multiple_constraints_accumulate() {
    let x = var(1);
    let root1 = ExprNode::new(
      Rc::new(SumHandler),
      Payload::Sum { coefficients: smallvec::smallvec![1.0], constant: 0.0 },
      vec![x.clone()],
    );
    let root2 = ExprNode::new(
      Rc::new(SumHandler),
      Payload::Sum { coefficients: smallvec::smallvec![1.0], constant: 0.0 },
      vec![x],
    );
    let mut scores = HashMap::new();
    accumulate_branch_scores(&root1, 2.0, &mut scores);
    accumulate_branch_scores(&root2, 5.0, &mut scores);
    assert_eq!(scores.get(&1).copied(), Some(7.0));
  }
}
