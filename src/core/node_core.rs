/*!

The bookkeeping payload of an expression node. Everything here
except `handler`, `payload`, and `children` is scratch that analysis passes reset or refresh
by tag comparison — see [`crate::core::tag`].

*/

use std::rc::Rc;
use smallvec::SmallVec;

use crate::abstractions::Float;
use crate::api::expr_handler::ExprHandler;
use crate::api::node::ExprNode;
use crate::core::host::VarId;
use crate::core::interval::Interval;
use crate::core::payload::Payload;
use crate::core::tag::Tag;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum Curvature {
  #[default]
  Unknown,
  Convex,
  Concave,
  Linear,
}

/// How a node's value moves as one particular child's value increases, all other children
/// held fixed. Drives lock propagation.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Monotonicity {
  Increasing,
  Decreasing,
  Unknown,
  Constant,
}

/// Per-node, per-nonlinear-handler enforcement state. Created
/// during detection, destroyed when leaving solving or when canonicalization invalidates it.
pub struct EnforcementRecord {
  pub handler: Rc<dyn crate::api::nlhandler::NlHandler>,
  /// Handler-supplied per-node data, opaque to the core.
  pub handler_data: Option<Box<dyn std::any::Any>>,
  pub initsepa_called: bool,
  /// Cached value of the auxiliary-variable estimate, refreshed each enforcement pass.
  pub cached_aux_value: Float,
  /// Which side(s) of the relation this record enforces.
  pub enforces_below: bool,
  pub enforces_above: bool,
}

pub struct NodeCore {
  pub handler: Rc<dyn ExprHandler>,
  pub payload: Payload,
  pub children: Vec<ExprNode>,

  // --- Evaluation cache ---
  pub eval_value: Float,
  pub eval_tag: Tag,

  // --- Interval cache ---
  pub interval: Interval,
  pub box_tag: Tag,
  pub tightened_since_last_visit: bool,

  // --- Reverse-mode derivative cache ---
  pub derivative: Float,
  pub diff_tag: Tag,

  // --- Branching score cache ---
  pub score: Float,
  pub score_tag: Tag,

  pub curvature: Curvature,
  pub is_integral: bool,

  /// Per-child monotonicity, allocated only when locked; freed again once both
  /// lock counts return to zero.
  pub monotonicity: Option<SmallVec<[Monotonicity; 4]>>,
  pub locks_pos: u32,
  pub locks_neg: u32,

  pub aux_var: Option<VarId>,
  pub enforcement_records: Vec<EnforcementRecord>,

  pub in_reverse_queue: bool,
}

impl NodeCore {
  pub fn new(handler: Rc<dyn ExprHandler>, payload: Payload, children: Vec<ExprNode>) -> Self {
    NodeCore {
      handler,
      payload,
      children,
      eval_value: Float::NAN,
      eval_tag: Tag::NONE,
      interval: Interval::UNBOUNDED,
      box_tag: Tag::NONE,
      tightened_since_last_visit: false,
      derivative: 0.0,
      diff_tag: Tag::NONE,
      score: 0.0,
      score_tag: Tag::NONE,
      curvature: Curvature::default(),
      is_integral: false,
      monotonicity: None,
      locks_pos: 0,
      locks_neg: 0,
      aux_var: None,
      enforcement_records: Vec::new(),
      in_reverse_queue: false,
    }
  }

  pub fn arity(&self) -> usize {
    self.children.len()
  }

  pub fn is_locked(&self) -> bool {
    self.locks_pos > 0 || self.locks_neg > 0
  }

  /// Invoked when both lock counts return to zero: the monotonicity array is no longer
  /// trustworthy once unlocked bounds may have changed, so it is discarded and will be
  /// recomputed, possibly differently, the next time the node is locked.
  pub fn maybe_free_monotonicity(&mut self) {
    if !self.is_locked() {
      self.monotonicity = None;
    }
  }

  pub fn has_enforcement_records(&self) -> bool {
    !self.enforcement_records.is_empty()
  }

  pub fn clear_enforcement_records(&mut self) {
    self.enforcement_records.clear();
  }
}
