/*!

A reentrant DFS/BFS walker over the expression DAG. Control must interleave
with caller logic — user data written on enter, consumed on leave — so this is a hand-rolled
stack of frames rather than a host-language coroutine.

`next()` advances exactly one stage-event at a time. Each event's consequences (pushing the
node's children, or descending into a just-visited child) are computed lazily on the
*following* call to `next()`, which is what makes `skip()` simple: it just discards whatever
was about to be computed.

*/

use std::collections::VecDeque;
use enumflags2::{bitflags, BitFlags};

use crate::abstractions::HashMap;
use crate::api::node::{ExprNode, NodeId};
use crate::core::error::CoreResult;
use crate::core::iterator_pool::ActiveIteratorPool;

#[bitflags]
#[repr(u8)]
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Stage {
  EnterExpression,
  VisitingChild,
  VisitedChild,
  LeaveExpression,
  /// BFS only: a node was just dequeued.
  Dequeue,
}
pub type Stages = BitFlags<Stage>;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum TraversalType {
  DepthFirst,
  BreadthFirst,
}

/// Per-node or per-child-edge scratch a caller attaches while iterating — either a pointer
/// (here, a cloned `ExprNode` handle) or a small integer/float union.
#[derive(Clone)]
pub enum IterData {
  None,
  Int(i64),
  Float(f64),
  Node(ExprNode),
}

impl Default for IterData {
  fn default() -> Self {
    IterData::None
  }
}

#[derive(Clone)]
struct CurrentEvent {
  /// For Enter/Leave/Dequeue: the node itself. For VisitingChild/VisitedChild: the parent.
  node: ExprNode,
  stage: Stage,
  child_index: Option<usize>,
  child_node: Option<ExprNode>,
}

enum StackItem {
  Enter(ExprNode),
  ChildStep { parent: ExprNode, index: usize },
  VisitedChild { parent: ExprNode, index: usize },
  Leave(ExprNode),
}

enum Pending {
  /// Realizes to: push Leave(node), then ChildStep(node, k-1)..ChildStep(node, 0).
  EnterExpansion(ExprNode),
  /// Realizes to: push VisitedChild(parent, index), then Enter(child).
  ChildExpansion { parent: ExprNode, index: usize, child: ExprNode },
  /// BFS: enqueue `node`'s children.
  DequeueExpansion(ExprNode),
}

pub struct ExprIterator {
  pool_index: usize,
  traversal: TraversalType,
  stages: Stages,
  allow_revisit: bool,

  stack: Vec<StackItem>,
  queue: VecDeque<ExprNode>,
  visited_ids: HashMap<NodeId, ()>,

  pending: Option<Pending>,
  current: Option<CurrentEvent>,
  skip_requested: bool,

  user_data: HashMap<NodeId, IterData>,
  child_user_data: HashMap<(NodeId, usize), IterData>,
}

impl ExprIterator {
  pub fn new(
    pool: &mut ActiveIteratorPool,
    root: ExprNode,
    traversal: TraversalType,
    stages: Stages,
    allow_revisit: bool,
  ) -> CoreResult<Self> {
    let pool_index = pool.checkout()?;
    let mut iter = ExprIterator {
      pool_index,
      traversal,
      stages,
      allow_revisit,
      stack: Vec::new(),
      queue: VecDeque::new(),
      visited_ids: HashMap::new(),
      pending: None,
      current: None,
      skip_requested: false,
      user_data: HashMap::new(),
      child_user_data: HashMap::new(),
    };
    match traversal {
      TraversalType::DepthFirst => iter.stack.push(StackItem::Enter(root)),
      TraversalType::BreadthFirst => iter.queue.push_back(root),
    }
    Ok(iter)
  }

  pub fn release(self, pool: &mut ActiveIteratorPool) {
    pool.release(self.pool_index);
  }

  pub fn pool_index(&self) -> usize {
    self.pool_index
  }

  fn already_visited(&self, node: &ExprNode) -> bool {
    self.visited_ids.contains_key(&node.id())
  }

  fn mark_visited(&mut self, node: &ExprNode) {
    self.visited_ids.insert(node.id(), ());
  }

  /// Realizes any pending expansion from the previous event, unless `skip()` discarded it.
  fn realize_pending(&mut self) {
    let pending = self.pending.take();
    if self.skip_requested {
      self.skip_requested = false;
      return;
    }
    match pending {
      None => {}
      Some(Pending::EnterExpansion(node)) => {
        let arity = node.arity();
        self.stack.push(StackItem::Leave(node.clone()));
        for index in (0..arity).rev() {
          self.stack.push(StackItem::ChildStep { parent: node.clone(), index });
        }
      }
      Some(Pending::ChildExpansion { parent, index, child }) => {
        self.stack.push(StackItem::VisitedChild { parent, index });
        self.stack.push(StackItem::Enter(child));
      }
      Some(Pending::DequeueExpansion(node)) => {
        for child in node.children() {
          if self.allow_revisit || !self.already_visited(&child) {
            if !self.allow_revisit {
              self.mark_visited(&child);
            }
            self.queue.push_back(child);
          }
        }
      }
    }
  }

  pub fn next(&mut self) -> Option<()> {
    self.realize_pending();
    match self.traversal {
      TraversalType::DepthFirst => self.next_dfs(),
      TraversalType::BreadthFirst => self.next_bfs(),
    }
  }

  fn next_dfs(&mut self) -> Option<()> {
    loop {
      let item = self.stack.pop()?;
      match item {
        StackItem::Enter(node) => {
          if !self.allow_revisit && self.already_visited(&node) {
            // Already entered elsewhere; this edge terminates here without recursing.
            continue;
          }
          self.mark_visited(&node);
          self.pending = Some(Pending::EnterExpansion(node.clone()));
          if self.stages.contains(Stage::EnterExpression) {
            self.current = Some(CurrentEvent { node, stage: Stage::EnterExpression, child_index: None, child_node: None });
            return Some(());
          }
          // Not subscribed to this stage: immediately realize and continue.
          self.realize_pending();
        }
        StackItem::ChildStep { parent, index } => {
          let child = parent.child(index);
          self.pending = Some(Pending::ChildExpansion { parent: parent.clone(), index, child: child.clone() });
          if self.stages.contains(Stage::VisitingChild) {
            self.current = Some(CurrentEvent {
              node: parent,
              stage: Stage::VisitingChild,
              child_index: Some(index),
              child_node: Some(child),
            });
            return Some(());
          }
          self.realize_pending();
        }
        StackItem::VisitedChild { parent, index } => {
          if self.stages.contains(Stage::VisitedChild) {
            let child = parent.child(index);
            self.current = Some(CurrentEvent {
              node: parent,
              stage: Stage::VisitedChild,
              child_index: Some(index),
              child_node: Some(child),
            });
            return Some(());
          }
        }
        StackItem::Leave(node) => {
          if self.stages.contains(Stage::LeaveExpression) {
            self.current = Some(CurrentEvent { node, stage: Stage::LeaveExpression, child_index: None, child_node: None });
            return Some(());
          }
        }
      }
    }
  }

  fn next_bfs(&mut self) -> Option<()> {
    let node = self.queue.pop_front()?;
    self.pending = Some(Pending::DequeueExpansion(node.clone()));
    self.current = Some(CurrentEvent { node, stage: Stage::Dequeue, child_index: None, child_node: None });
    Some(())
  }

  pub fn is_end(&self) -> bool {
    self.current.is_none()
  }

  pub fn current(&self) -> Option<ExprNode> {
    self.current.as_ref().map(|c| c.node.clone())
  }

  pub fn stage(&self) -> Option<Stage> {
    self.current.as_ref().map(|c| c.stage)
  }

  pub fn child_index(&self) -> Option<usize> {
    self.current.as_ref().and_then(|c| c.child_index)
  }

  pub fn child_node(&self) -> Option<ExprNode> {
    self.current.as_ref().and_then(|c| c.child_node.clone())
  }

  pub fn parent(&self) -> Option<ExprNode> {
    self.current.as_ref().filter(|c| c.child_index.is_some()).map(|c| c.node.clone())
  }

  /// Skips the remainder of the current subtree. Only meaningful right after `next()`
  /// returned an `EnterExpression` or `VisitingChild` event.
  pub fn skip(&mut self) {
    if matches!(self.current.as_ref().map(|c| c.stage), Some(Stage::EnterExpression) | Some(Stage::VisitingChild)) {
      self.skip_requested = true;
    }
  }

  pub fn user_data(&self, node: &ExprNode) -> IterData {
    self.user_data.get(&node.id()).cloned().unwrap_or_default()
  }

  pub fn set_user_data(&mut self, node: &ExprNode, data: IterData) {
    self.user_data.insert(node.id(), data);
  }

  pub fn child_edge_user_data(&self, parent: &ExprNode, index: usize) -> IterData {
    self.child_user_data.get(&(parent.id(), index)).cloned().unwrap_or_default()
  }

  pub fn set_child_edge_user_data(&mut self, parent: &ExprNode, index: usize, data: IterData) {
    self.child_user_data.insert((parent.id(), index), data);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::rc::Rc;
  use crate::builtin::{sum::SumHandler, value::ValueHandler, var::VarHandler};
  use crate::core::payload::Payload;

  fn leaf_value(v: f64) -> ExprNode {
    ExprNode::new(Rc::new(ValueHandler), Payload::Value(v), vec![])
  }

  fn sum2(coeffs: [f64; 2], children: [ExprNode; 2]) -> ExprNode {
    ExprNode::new(
      Rc::new(SumHandler),
      Payload::Sum { coefficients: coeffs.into_iter().collect(), constant: 0.0 },
      children.to_vec(),
    )
  }

  #[test]
  fn dfs_leave_first_visits_children_before_parent() {
    let a = leaf_value(1.0);
    let b = leaf_value(2.0);
    let root = sum2([1.0, 1.0], [a.clone(), b.clone()]);

    let mut pool = ActiveIteratorPool::new(8);
    let mut iter = ExprIterator::new(&mut pool, root.clone(), TraversalType::DepthFirst, Stage::LeaveExpression.into(), false).unwrap();

    let mut order = Vec::new();
    while iter.next().is_some() {
      order.push(iter.current().unwrap().id());
    }
    assert_eq!(order, vec![a.id(), b.id(), root.id()]);
  }

  #[test]
  fn no_revisit_enters_shared_child_once() {
    let shared = leaf_value(5.0);
    let root = sum2([1.0, 1.0], [shared.clone(), shared.clone()]);

    let mut pool = ActiveIteratorPool::new(8);
    let mut iter = ExprIterator::new(&mut pool, root, TraversalType::DepthFirst, Stage::EnterExpression.into(), false).unwrap();
    let mut entries = 0;
    while iter.next().is_some() {
      entries += 1;
    }
    // root + shared entered once each = 2, even though shared appears twice as a child.
    assert_eq!(entries, 2);
  }

  #[test]
  fn allow_revisit_enters_shared_child_twice() {
    let shared = leaf_value(5.0);
    let root = sum2([1.0, 1.0], [shared.clone(), shared.clone()]);

    let mut pool = ActiveIteratorPool::new(8);
    let mut iter = ExprIterator::new(&mut pool, root, TraversalType::DepthFirst, Stage::EnterExpression.into(), true).unwrap();
    let mut entries = 0;
    while iter.next().is_some() {
      entries += 1;
    }
    assert_eq!(entries, 3);
  }

  #[test]
  fn skip_prunes_subtree() {
    let a = leaf_value(1.0);
    let b = leaf_value(2.0);
    let root = sum2([1.0, 1.0], [a.clone(), b.clone()]);

    let mut pool = ActiveIteratorPool::new(8);
    let stages = Stage::EnterExpression | Stage::LeaveExpression;
    let mut iter = ExprIterator::new(&mut pool, root.clone(), TraversalType::DepthFirst, stages, false).unwrap();

    let mut seen = Vec::new();
    while iter.next().is_some() {
      let node = iter.current().unwrap();
      seen.push((node.id(), iter.stage().unwrap()));
      if node.id() == root.id() && iter.stage() == Some(Stage::EnterExpression) {
        iter.skip();
      }
    }
    // Root entered, then nothing else (children pruned), no Leave(root) either since we
    // skipped before its children/leave were scheduled.
    assert_eq!(seen, vec![(root.id(), Stage::EnterExpression)]);
  }

  #[test]
  fn bfs_visits_root_then_children() {
    let a = leaf_value(1.0);
    let b = leaf_value(2.0);
    let root = sum2([1.0, 1.0], [a.clone(), b.clone()]);

    let mut pool = ActiveIteratorPool::new(8);
    let mut iter = ExprIterator::new(&mut pool, root.clone(), TraversalType::BreadthFirst, Stage::Dequeue.into(), false).unwrap();
    let mut order = Vec::new();
    while iter.next().is_some() {
      order.push(iter.current().unwrap().id());
    }
    assert_eq!(order, vec![root.id(), a.id(), b.id()]);
  }
}
