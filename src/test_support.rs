/*!

Shared `Host` stubs for unit tests scattered across `builtin` and `core`, so each test module
doesn't need to hand-roll its own no-op implementation of every trait method.

*/

use std::collections::HashMap;

use crate::core::host::{BoundChangeResult, CutResult, Host, LinearRow, VarId};
use crate::core::interval::Interval;

/// A host with no variables and no bounds; every query returns an unbounded/unknown default.
/// Useful for handler tests that never touch variables.
pub struct NoopHost;

impl Host for NoopHost {
  fn var_bounds(&self, _var: VarId) -> Interval {
    Interval::UNBOUNDED
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
  fn tighten_lower_bound(&mut self, _var: VarId, _lb: f64) -> BoundChangeResult {
    BoundChangeResult::Unchanged
  }
  fn tighten_upper_bound(&mut self, _var: VarId, _ub: f64) -> BoundChangeResult {
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

/// A host with caller-supplied fixed bounds and solution values per variable, bound changes
/// actually applied so reverse-propagation/locking tests can observe them.
#[derive(Default)]
pub struct FakeHost {
  pub bounds: HashMap<VarId, Interval>,
  pub solution: HashMap<VarId, f64>,
  pub integer: HashMap<VarId, bool>,
  pub objective: HashMap<VarId, f64>,
  pub next_aux_var: VarId,
  pub cuts: Vec<LinearRow>,
  pub proposed_solutions: Vec<Vec<(VarId, f64)>>,
}

impl FakeHost {
  pub fn with_bounds(mut self, var: VarId, interval: Interval) -> Self {
    self.bounds.insert(var, interval);
    self
  }

  pub fn with_solution(mut self, var: VarId, value: f64) -> Self {
    self.solution.insert(var, value);
    self
  }
}

impl Host for FakeHost {
  fn var_bounds(&self, var: VarId) -> Interval {
    self.bounds.get(&var).copied().unwrap_or(Interval::UNBOUNDED)
  }
  fn var_is_integer(&self, var: VarId) -> bool {
    self.integer.get(&var).copied().unwrap_or(false)
  }
  fn var_solution_value(&self, var: VarId) -> Option<f64> {
    self.solution.get(&var).copied()
  }
  fn var_objective_coefficient(&self, var: VarId) -> f64 {
    self.objective.get(&var).copied().unwrap_or(0.0)
  }
  fn tighten_lower_bound(&mut self, var: VarId, lb: f64) -> BoundChangeResult {
    let current = self.bounds.entry(var).or_insert(Interval::UNBOUNDED);
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
    let current = self.bounds.entry(var).or_insert(Interval::UNBOUNDED);
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
  fn create_auxiliary_variable(&mut self, domain: Interval, integer: bool) -> VarId {
    self.next_aux_var += 1;
    let id = 1_000_000 + self.next_aux_var;
    self.bounds.insert(id, domain);
    self.integer.insert(id, integer);
    id
  }
  fn invalidate_auxiliary_variable(&mut self, var: VarId) {
    self.bounds.remove(&var);
  }
  fn submit_cut(&mut self, row: &LinearRow) -> CutResult {
    self.cuts.push(row.clone());
    CutResult { separated: true, cutoff: false }
  }
  fn register_branching_candidate(&mut self, _var: VarId, _score: f64) {}
  fn propose_solution(&mut self, values: &[(VarId, f64)]) -> bool {
    self.proposed_solutions.push(values.to_vec());
    true
  }
}
