/*!

The host-solver interface. The MIP
solver host — its branch-and-bound loop, LP solver, cut pool, variable storage, event
system — is deliberately an external collaborator: this core never depends on a
concrete solver, only on this trait. A host embeds the core by implementing [`Host`] once
over whatever variable/cut/branching storage it actually has.

*/

use crate::core::interval::Interval;

/// A host-solver variable handle. Opaque to the core; the `var` expression handler is the
/// only thing that interprets it, by looking it up in the host.
pub type VarId = u64;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum BoundChangeResult {
  Infeasible,
  Tightened,
  Unchanged,
}

/// A linear row `sum(coeffs[i] * vars[i]) + constant`, used both for cut submission and for
/// the NLP-relaxation row snapshot cached on a [`crate::core::constraint::Constraint`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinearRow {
  pub vars: Vec<VarId>,
  pub coefficients: Vec<f64>,
  pub constant: f64,
  pub lhs: f64,
  pub rhs: f64,
}

pub trait Host {
  /// Current bounds of a host variable.
  fn var_bounds(&self, var: VarId) -> Interval;

  /// Whether the variable is restricted to integer values.
  fn var_is_integer(&self, var: VarId) -> bool;

  /// The current candidate-solution value of a variable, if one has been proposed.
  fn var_solution_value(&self, var: VarId) -> Option<f64>;

  /// Objective coefficient of a variable, used by solution repair to rank candidates by
  /// "smallest objective-per-coefficient".
  fn var_objective_coefficient(&self, var: VarId) -> f64;

  /// Requests tightening `var`'s lower bound to at least `lb`.
  fn tighten_lower_bound(&mut self, var: VarId, lb: f64) -> BoundChangeResult;

  /// Requests tightening `var`'s upper bound to at most `ub`.
  fn tighten_upper_bound(&mut self, var: VarId, ub: f64) -> BoundChangeResult;

  /// Adds `count` rounding locks to `var` in the given direction(s).
  fn add_locks(&mut self, var: VarId, down: u32, up: u32);

  /// Removes previously added locks.
  fn remove_locks(&mut self, var: VarId, down: u32, up: u32);

  /// Allocates a fresh auxiliary variable with the given initial domain, integer-typed if
  /// requested.
  fn create_auxiliary_variable(&mut self, domain: Interval, integer: bool) -> VarId;

  /// Marks a previously allocated auxiliary variable invalid (e.g. after a restart).
  fn invalidate_auxiliary_variable(&mut self, var: VarId);

  /// Submits a cut (a linear row that should exclude the current candidate solution).
  /// Returns whether it cut off the incumbent and whether it caused a cutoff.
  fn submit_cut(&mut self, row: &LinearRow) -> CutResult;

  /// Registers a branching candidate with a score; higher scores are preferred.
  fn register_branching_candidate(&mut self, var: VarId, score: f64);

  /// Submits a repaired solution for the host to validate/accept.
  fn propose_solution(&mut self, values: &[(VarId, f64)]) -> bool;

  /// Whether the host has asked the current top-level loop to abort (stop requested, time
  /// limit, memory limit). Checked between constraints and between rounds.
  fn abort_requested(&self) -> bool {
    false
  }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct CutResult {
  pub separated: bool,
  pub cutoff: bool,
}
