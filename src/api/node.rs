/*!

The public handle to an expression node: a captured (reference-counted) reference into the
shared DAG. Cloning an `ExprNode` is "capturing" a child edge; dropping the last clone releases it, which recursively releases its children.

*/

use std::rc::Rc;

use crate::abstractions::{rc_cell, Float, RcCell};
use crate::api::expr_handler::ExprHandler;
use crate::core::host::VarId;
use crate::core::interval::Interval;
use crate::core::node_core::{Curvature, NodeCore};
use crate::core::payload::Payload;
use crate::core::tag::Tag;

/// A stable identity for a node, usable as a hash-map key. Two `ExprNode`s referring to the
/// same underlying node (i.e. `ExprNode::ptr_eq`) always produce the same `NodeId`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct NodeId(pub usize);

#[derive(Clone)]
pub struct ExprNode(pub(crate) RcCell<NodeCore>);

impl ExprNode {
  pub fn new(handler: Rc<dyn ExprHandler>, payload: Payload, children: Vec<ExprNode>) -> Self {
    ExprNode(rc_cell(NodeCore::new(handler, payload, children)))
  }

  pub fn id(&self) -> NodeId {
    NodeId(self.0.as_ptr_usize())
  }

  pub fn ptr_eq(&self, other: &ExprNode) -> bool {
    self.0.ptr_eq(&other.0)
  }

  /// Number of live owners: parent child-edges plus iterator holds.
  pub fn ref_count(&self) -> usize {
    self.0.strong_count()
  }

  pub fn handler(&self) -> Rc<dyn ExprHandler> {
    self.0.borrow().handler.clone()
  }

  pub fn handler_name(&self) -> &'static str {
    // Handlers are long-lived (registered once, for the process lifetime), so leaking the
    // name through a static-like accessor is safe; see `ExprHandler::name`.
    self.0.borrow().handler.name()
  }

  pub fn arity(&self) -> usize {
    self.0.borrow().arity()
  }

  pub fn child(&self, index: usize) -> ExprNode {
    self.0.borrow().children[index].clone()
  }

  pub fn children(&self) -> Vec<ExprNode> {
    self.0.borrow().children.clone()
  }

  pub fn set_child(&self, index: usize, new_child: ExprNode) {
    self.0.borrow_mut().children[index] = new_child;
  }

  pub fn with_payload<R>(&self, f: impl FnOnce(&Payload) -> R) -> R {
    f(&self.0.borrow().payload)
  }

  pub fn set_payload(&self, payload: Payload) {
    self.0.borrow_mut().payload = payload;
  }

  pub fn value(&self) -> Float {
    self.0.borrow().eval_value
  }

  pub fn value_if_current(&self, tag: Tag) -> Option<Float> {
    let core = self.0.borrow();
    (core.eval_tag == tag).then_some(core.eval_value)
  }

  pub fn set_value(&self, value: Float, tag: Tag) {
    let mut core = self.0.borrow_mut();
    core.eval_value = value;
    core.eval_tag = tag;
  }

  pub fn interval(&self) -> Interval {
    self.0.borrow().interval
  }

  pub fn interval_if_current(&self, tag: Tag) -> Option<Interval> {
    let core = self.0.borrow();
    (core.box_tag == tag && !core.tightened_since_last_visit).then_some(core.interval)
  }

  pub fn set_interval(&self, interval: Interval, tag: Tag) {
    let mut core = self.0.borrow_mut();
    core.interval = interval;
    core.box_tag = tag;
    core.tightened_since_last_visit = false;
  }

  pub fn mark_tightened(&self) {
    self.0.borrow_mut().tightened_since_last_visit = true;
  }

  pub fn curvature(&self) -> Curvature {
    self.0.borrow().curvature
  }

  pub fn set_curvature(&self, curvature: Curvature) {
    self.0.borrow_mut().curvature = curvature;
  }

  pub fn is_integral(&self) -> bool {
    self.0.borrow().is_integral
  }

  pub fn set_is_integral(&self, value: bool) {
    self.0.borrow_mut().is_integral = value;
  }

  pub fn aux_var(&self) -> Option<VarId> {
    self.0.borrow().aux_var
  }

  pub fn set_aux_var(&self, var: Option<VarId>) {
    self.0.borrow_mut().aux_var = var;
  }

  pub fn has_enforcement_records(&self) -> bool {
    self.0.borrow().has_enforcement_records()
  }

  pub fn locks(&self) -> (u32, u32) {
    let core = self.0.borrow();
    (core.locks_pos, core.locks_neg)
  }

  pub fn is_leaf(&self) -> bool {
    self.arity() == 0
  }

  pub(crate) fn core(&self) -> &RcCell<NodeCore> {
    &self.0
  }
}

impl PartialEq for ExprNode {
  fn eq(&self, other: &Self) -> bool {
    self.ptr_eq(other)
  }
}
impl Eq for ExprNode {}

impl std::hash::Hash for ExprNode {
  fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
    self.id().hash(state);
  }
}

impl std::fmt::Debug for ExprNode {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}#{:x}", self.handler_name(), self.id().0)
  }
}
