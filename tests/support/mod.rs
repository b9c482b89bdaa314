//! Shared test-only `Host` stub and registry builder for the end-to-end scenario tests.
//! Integration tests under `tests/` compile as a separate crate from `nlhdlr_core` itself,
//! so they can't reach the crate's own `pub(crate) test_support` — this is the
//! external-facing equivalent, built only from the crate's public API.

#![allow(dead_code)]

use std::collections::HashMap;
use std::rc::Rc;

use nlhdlr_core::builtin::{pow::PowHandler, sum::SumHandler, value::ValueHandler, var::VarHandler};
use nlhdlr_core::core::host::{BoundChangeResult, CutResult, Host, LinearRow, VarId};
use nlhdlr_core::core::interval::Interval;
use nlhdlr_core::HandlerRegistry;

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

  pub fn with_objective(mut self, var: VarId, coefficient: f64) -> Self {
    self.objective.insert(var, coefficient);
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

/// A registry carrying just the reference operator library — enough to parse and evaluate
/// every end-to-end scenario below.
pub fn reference_registry() -> HandlerRegistry {
  let mut registry = HandlerRegistry::new();
  registry.register_expr_handler(Rc::new(ValueHandler)).unwrap();
  registry.register_expr_handler(Rc::new(VarHandler)).unwrap();
  registry.register_expr_handler(Rc::new(SumHandler)).unwrap();
  registry.register_expr_handler(Rc::new(PowHandler)).unwrap();
  registry
}

/// Resolves `<x>`, `<y>`, `<z>` to fixed variable ids 1, 2, 3 — enough naming for every
/// scenario below, which never needs more than three distinct variables at once.
pub struct FixedNames;

impl nlhdlr_core::parser::VarResolver for FixedNames {
  fn resolve(&mut self, name: &str) -> nlhdlr_core::CoreResult<VarId> {
    match name {
      "x" => Ok(1),
      "y" => Ok(2),
      "z" => Ok(3),
      other => Err(nlhdlr_core::CoreError::PluginLookupError { name: other.to_string() }),
    }
  }
}
