/*!

Ties forward and reverse interval propagation into an alternating loop: forward once, then
drain the reverse queue, then forward again on whatever got tightened, stopping when a round
produces no further tightening or `max_prop_rounds` is hit.

*/

pub mod forward;
pub mod reverse;

use crate::api::node::ExprNode;
use crate::core::config::Config;
use crate::core::error::CoreResult;
use crate::core::host::Host;
use crate::core::interval::Interval;
use crate::core::iterator_pool::ActiveIteratorPool;
use crate::core::tag::Tag;
use forward::propagate_forward;
use reverse::ReversePropQueue;

/// Runs the full forward/reverse propagation loop against `root`'s interval constrained to
/// `sides` (the constraint's `[lhs, rhs]`, already widened by `consside_relax_amount`).
/// Returns the number of completed rounds and whatever interval the root settled at.
pub fn propagate(
  pool: &mut ActiveIteratorPool,
  host: &dyn Host,
  config: &Config,
  box_tag: Tag,
  root: &ExprNode,
  sides: Interval,
) -> CoreResult<(u32, Interval)> {
  let mut rounds = 0;
  let mut root_interval = propagate_forward(pool, host, config, box_tag, root)?;

  loop {
    let mut queue = ReversePropQueue::new(box_tag);
    let constrained = root_interval.intersect(&sides);
    queue.tighten_interval(root, constrained)?;

    let mut any_tightened = false;
    while let Some(node) = queue.pop() {
      any_tightened = true;
      let interval = node.interval();
      node.handler().reverseprop(&node, interval, &mut queue, false)?;
    }

    rounds += 1;
    crate::abstractions::tracing::trace!(rounds, any_tightened, ?root_interval, "propagation round complete");
    if !any_tightened || rounds >= config.max_prop_rounds {
      if rounds >= config.max_prop_rounds && any_tightened {
        crate::abstractions::tracing::debug!(rounds, "propagation stopped at max_prop_rounds with tightening still pending");
      }
      break;
    }

    let refreshed = propagate_forward(pool, host, config, box_tag, root)?;
    if refreshed == root_interval {
      root_interval = refreshed;
      break;
    }
    root_interval = refreshed;
  }

  Ok((rounds, root_interval))
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::rc::Rc;
  use crate::builtin::{sum::SumHandler, var::VarHandler};
  use crate::core::host::{BoundChangeResult, CutResult, LinearRow, VarId};
  use crate::core::payload::Payload;
  use crate::core::tag::TagSource;

  struct MutableBoundsHost {
    bounds: std::collections::HashMap<VarId, Interval>,
  }

  impl Host for MutableBoundsHost {
    fn var_bounds(&self, var: VarId) -> Interval {
      *self.bounds.get(&var).unwrap()
    }
    fn var_is_integer(&self, _var: VarId) -> bool {
      false
    }
    fn var_solution_value(&self, _var: VarId) -> Option<f64> {
      None
    }
    fn var_objective_coefficient(&self, _var: VarId) -> f64 {
      0.0
    }
    fn tighten_lower_bound(&mut self, var: VarId, lb: f64) -> BoundChangeResult {
      let current = self.bounds.get_mut(&var).unwrap();
      if lb > current.ub {
        return BoundChangeResult::Infeasible;
      }
      if lb > current.lb {
        current.lb = lb;
        return BoundChangeResult::Tightened;
      }
      BoundChangeResult::Unchanged
    }
    fn tighten_upper_bound(&mut self, var: VarId, ub: f64) -> BoundChangeResult {
      let current = self.bounds.get_mut(&var).unwrap();
      if ub < current.lb {
        return BoundChangeResult::Infeasible;
      }
      if ub < current.ub {
        current.ub = ub;
        return BoundChangeResult::Tightened;
      }
      BoundChangeResult::Unchanged
    }
    fn add_locks(&mut self, _var: VarId, _down: u32, _up: u32) {}
    fn remove_locks(&mut self, _var: VarId, _down: u32, _up: u32) {}
    fn create_auxiliary_variable(&mut self, _domain: Interval, _integer: bool) -> VarId {
      0
    }
    fn invalidate_auxiliary_variable(&mut self, _var: VarId) {}
    fn submit_cut(&mut self, _row: &LinearRow) -> CutResult {
      CutResult { separated: false, cutoff: false }
    }
    fn register_branching_candidate(&mut self, _var: VarId, _score: f64) {}
    fn propose_solution(&mut self, _values: &[(VarId, f64)]) -> bool {
      false
    }
  }

  #[test]
  fn reverse_propagation_tightens_variable_through_sum() {
    let mut pool = ActiveIteratorPool::new(8);
    let host = MutableBoundsHost {
      bounds: [(1, Interval::new(0.0, 100.0)), (2, Interval::new(0.0, 100.0))].into_iter().collect(),
    };
    let x = ExprNode::new(Rc::new(VarHandler), Payload::Var(1), vec![]);
    let y = ExprNode::new(Rc::new(VarHandler), Payload::Var(2), vec![]);
    let root = ExprNode::new(
      Rc::new(SumHandler),
      Payload::Sum { coefficients: smallvec::smallvec![1.0, 1.0], constant: 0.0 },
      vec![x.clone(), y.clone()],
    );
    let config = Config::default();
    let tag = TagSource::new().next();

    // x + y in [10, 10]; x's own domain is [0,100] so it alone constrains nothing yet, but
    // after y is known in [0,100] this forces x and y each into [0,10] via reverseprop.
    let (_rounds, root_interval) = propagate(&mut pool, &host, &config, tag, &root, Interval::new(10.0, 10.0)).unwrap();
    assert!(root_interval.contains(10.0));
    assert_eq!(x.interval(), Interval::new(0.0, 10.0));
    assert_eq!(y.interval(), Interval::new(0.0, 10.0));
  }
}
