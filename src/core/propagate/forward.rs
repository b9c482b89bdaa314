/*!

Forward interval propagation: a leaf-first pass that recomputes each node's
interval from its (already current) children's intervals, tightest-known-so-far, stopping
early the moment any node's interval goes empty.

Variable leaves read their interval from the host fresh every round rather than from a
sibling node's cache; `Config::varbound_relax` widens that host-reported interval first, so a
tiny floating-point sliver in a variable's bound doesn't cause spurious domain-error cutoffs
downstream.

*/

use crate::core::config::{Config, VarboundRelax};
use crate::core::error::{CoreError, CoreResult};
use crate::core::host::Host;
use crate::core::interval::Interval;
use crate::core::iterator::{ExprIterator, Stage, TraversalType};
use crate::core::iterator_pool::ActiveIteratorPool;
use crate::core::tag::Tag;
use crate::api::node::ExprNode;

fn relaxed_var_bounds(host: &dyn Host, var: crate::core::host::VarId, config: &Config) -> Interval {
  let raw = host.var_bounds(var);
  match config.varbound_relax {
    VarboundRelax::None => raw,
    VarboundRelax::Absolute => raw.relax(config.varbound_relax_amount),
    VarboundRelax::Relative => {
      let scale = raw.lb.abs().max(raw.ub.abs()).max(1.0);
      raw.relax(config.varbound_relax_amount * scale)
    }
  }
}

/// Recomputes intervals bottom-up for every node in `root`'s subtree, tagging each with
/// `box_tag` so later passes can tell a fresh evaluation from a stale one. Returns the root's
/// resulting interval, or `Infeasibility` the moment some node's interval is empty.
pub fn propagate_forward(
  pool: &mut ActiveIteratorPool,
  host: &dyn Host,
  config: &Config,
  box_tag: Tag,
  root: &ExprNode,
) -> CoreResult<Interval> {
  let mut iter = ExprIterator::new(pool, root.clone(), TraversalType::DepthFirst, Stage::LeaveExpression.into(), false)?;

  let mut result = Interval::UNBOUNDED;
  while iter.next().is_some() {
    let node = iter.current().unwrap();

    if let Some(var) = node.with_payload(|p| p.as_var()) {
      let bounds = relaxed_var_bounds(host, var, config);
      node.set_interval(bounds, box_tag);
      result = bounds;
      continue;
    }

    let children_intervals: Vec<Interval> = node
        .children()
        .iter()
        .map(|c| {
          c.interval_if_current(box_tag).unwrap_or_else(|| {
            panic!("child {c:?} not yet evaluated in leaf-first traversal")
          })
        })
        .collect();

    let computed = node.handler().inteval(&node, &children_intervals, host);
    let tightened = node.interval().intersect(&computed);
    if tightened.is_empty() {
      iter.release(pool);
      return Err(CoreError::infeasible(format!("forward propagation emptied interval at node {node:?}")));
    }
    node.set_interval(tightened, box_tag);
    result = tightened;
  }
  iter.release(pool);
  Ok(result)
}
