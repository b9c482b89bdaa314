/*!

Two flat ordered collections plus the tag sources and global counters every pass needs:
expression handlers, one per operator name, and nonlinear handlers, sorted by descending
priority. There is no global mutable state at the library level — a `HandlerRegistry` is an
owned struct a host constructs once per solver instance and threads through every entry
point as context.

*/

use std::rc::Rc;

use crate::abstractions::HashMap;
use crate::api::expr_handler::{ExprHandler, ExprHandlerStats};
use crate::api::nlhandler::{NlHandler, NlHandlerStats};
use crate::core::error::{CoreError, CoreResult};
use crate::core::tag::{Tag, TagSource};

pub struct HandlerRegistry {
  expr_handlers: Vec<Rc<dyn ExprHandler>>,
  expr_handler_index: HashMap<&'static str, usize>,
  expr_stats: HashMap<&'static str, ExprHandlerStats>,

  /// Sorted descending by `priority()`; ties broken by registration order.
  nl_handlers: Vec<Rc<dyn NlHandler>>,
  nl_enabled: HashMap<&'static str, bool>,
  nl_stats: HashMap<&'static str, NlHandlerStats>,

  solution_tags: TagSource,
  box_tags: TagSource,
  diff_tags: TagSource,
  score_tags: TagSource,

  pub ncutoffs: u64,
  pub ndomreds: u64,
  pub nfailed_detections: u64,
}

impl HandlerRegistry {
  pub fn new() -> Self {
    HandlerRegistry {
      expr_handlers: Vec::new(),
      expr_handler_index: HashMap::new(),
      expr_stats: HashMap::new(),
      nl_handlers: Vec::new(),
      nl_enabled: HashMap::new(),
      nl_stats: HashMap::new(),
      solution_tags: TagSource::new(),
      box_tags: TagSource::new(),
      diff_tags: TagSource::new(),
      score_tags: TagSource::new(),
      ncutoffs: 0,
      ndomreds: 0,
      nfailed_detections: 0,
    }
  }

  // region Expression handlers

  /// Registers an expression handler. Fails if an operator of the same name is already
  /// registered — one handler per operator name, unique.
  pub fn register_expr_handler(&mut self, handler: Rc<dyn ExprHandler>) -> CoreResult<()> {
    let name = handler.name();
    if self.expr_handler_index.contains_key(name) {
      return Err(CoreError::PluginLookupError { name: format!("duplicate expression handler '{name}'") });
    }
    self.expr_handler_index.insert(name, self.expr_handlers.len());
    self.expr_handlers.push(handler);
    self.expr_stats.insert(name, ExprHandlerStats::default());
    Ok(())
  }

  pub fn expr_handler(&self, name: &str) -> CoreResult<Rc<dyn ExprHandler>> {
    self.expr_handler_index
        .get(name)
        .map(|&i| self.expr_handlers[i].clone())
        .ok_or_else(|| CoreError::PluginLookupError { name: name.to_string() })
  }

  pub fn expr_handlers(&self) -> &[Rc<dyn ExprHandler>] {
    &self.expr_handlers
  }

  pub fn expr_stats(&self, name: &str) -> Option<&ExprHandlerStats> {
    self.expr_stats.get(name)
  }

  pub fn expr_stats_mut(&mut self, name: &str) -> Option<&mut ExprHandlerStats> {
    self.expr_stats.get_mut(name)
  }

  // endregion

  // region Nonlinear handlers

  /// Registers a nonlinear handler, inserting it in descending-priority order. Ties keep
  /// earlier registrations first, matching a stable insertion sort.
  pub fn register_nl_handler(&mut self, handler: Rc<dyn NlHandler>) {
    let name = handler.name();
    let priority = handler.priority();
    let pos = self.nl_handlers
        .iter()
        .position(|h| h.priority() < priority)
        .unwrap_or(self.nl_handlers.len());
    self.nl_handlers.insert(pos, handler);
    self.nl_enabled.insert(name, true);
    self.nl_stats.insert(name, NlHandlerStats::default());
  }

  /// Nonlinear handlers in priority order, skipping disabled ones.
  pub fn active_nl_handlers(&self) -> impl Iterator<Item = &Rc<dyn NlHandler>> {
    self.nl_handlers
        .iter()
        .filter(move |h| self.nl_enabled.get(h.name()).copied().unwrap_or(true))
  }

  pub fn set_nl_handler_enabled(&mut self, name: &str, enabled: bool) {
    self.nl_enabled.insert(
      self.nl_handlers.iter().find(|h| h.name() == name).map(|h| h.name()).unwrap_or(""),
      enabled,
    );
  }

  pub fn nl_stats(&self, name: &str) -> Option<&NlHandlerStats> {
    self.nl_stats.get(name)
  }

  pub fn nl_stats_mut(&mut self, name: &str) -> Option<&mut NlHandlerStats> {
    self.nl_stats.get_mut(name)
  }

  // endregion

  // region Tags

  pub fn mint_solution_tag(&mut self) -> Tag {
    self.solution_tags.next()
  }

  pub fn mint_box_tag(&mut self) -> Tag {
    self.box_tags.next()
  }

  pub fn current_box_tag(&self) -> Tag {
    self.box_tags.current()
  }

  pub fn mint_diff_tag(&mut self) -> Tag {
    self.diff_tags.next()
  }

  pub fn mint_score_tag(&mut self) -> Tag {
    self.score_tags.next()
  }

  // endregion

  pub fn record_cutoff(&mut self) {
    self.ncutoffs += 1;
  }

  pub fn record_domain_reduction(&mut self) {
    self.ndomreds += 1;
  }

  pub fn record_failed_detection(&mut self) {
    self.nfailed_detections += 1;
  }
}

impl Default for HandlerRegistry {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::builtin::{pow::PowHandler, sum::SumHandler, value::ValueHandler, var::VarHandler};

  #[test]
  fn duplicate_handler_name_rejected() {
    let mut registry = HandlerRegistry::new();
    registry.register_expr_handler(Rc::new(ValueHandler)).unwrap();
    let err = registry.register_expr_handler(Rc::new(ValueHandler)).unwrap_err();
    assert!(matches!(err, CoreError::PluginLookupError { .. }));
  }

  #[test]
  fn nl_handlers_stay_priority_sorted() {
    use crate::builtin::nlhdlr_default::DefaultNlHandler;

    struct HighPriority;
    impl NlHandler for HighPriority {
      fn name(&self) -> &'static str { "high" }
      fn priority(&self) -> i32 { 1000 }
      fn detect(&self, _node: &crate::api::node::ExprNode, _is_root: bool) -> Option<crate::api::nlhandler::DetectResult> { None }
      fn evalaux(&self, _node: &crate::api::node::ExprNode) -> f64 { 0.0 }
      fn as_any(&self) -> &dyn std::any::Any { self }
    }

    let mut registry = HandlerRegistry::new();
    registry.register_nl_handler(Rc::new(DefaultNlHandler));
    registry.register_nl_handler(Rc::new(HighPriority));
    let names: Vec<_> = registry.active_nl_handlers().map(|h| h.name()).collect();
    assert_eq!(names, vec!["high", "default"]);
  }
}
