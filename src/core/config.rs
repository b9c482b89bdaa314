/*!

Recognized configuration options and their effects. Loaded once per solve from TOML by the
host, as a typed struct deserialized with `toml` + `serde`.

*/

use std::collections::HashMap;
use serde::{Deserialize, Serialize};

/// How variable bounds are relaxed before interval evaluation.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VarboundRelax {
  #[default]
  None,
  Absolute,
  Relative,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
  /// Upper bound on alternations between forward and reverse propagation in one call.
  pub max_prop_rounds: u32,

  /// Controls how variable bounds are relaxed before interval evaluation.
  pub varbound_relax: VarboundRelax,

  /// Epsilon used by `varbound_relax`.
  pub varbound_relax_amount: f64,

  /// Additional widening of constraint sides used when intersecting with the root's
  /// interval.
  pub consside_relax_amount: f64,

  /// Per-source-handler boolean gating ingestion of legacy quadratic/nonlinear
  /// constraints. Read-only data in this core: acting on these flags is the concern of the
  /// (out of scope) upgrade paths from legacy constraint handlers.
  pub upgrade: HashMap<String, bool>,

  /// Feasibility tolerance used by enforcement's minimum-violation backoff.
  pub feasibility_tolerance: f64,

  /// Soft cap on concurrently checked-out expression iterators, used only to exercise the
  /// `TooManyIterators` error path in tests — the pool itself grows dynamically.
  pub max_active_iterators: usize,
}

impl Default for Config {
  fn default() -> Self {
    Config {
      max_prop_rounds: 100,
      varbound_relax: VarboundRelax::default(),
      varbound_relax_amount: 1e-4,
      consside_relax_amount: 1e-6,
      upgrade: HashMap::new(),
      feasibility_tolerance: 1e-6,
      max_active_iterators: usize::MAX,
    }
  }
}

impl Config {
  pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
    toml::from_str(text)
  }

  pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(self)
  }

  pub fn upgrade_enabled(&self, source_handler: &str) -> bool {
    self.upgrade.get(source_handler).copied().unwrap_or(true)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_roundtrip_through_toml() {
    let config = Config::default();
    let text = config.to_toml_string().unwrap();
    let parsed = Config::from_toml_str(&text).unwrap();
    assert_eq!(config, parsed);
  }

  #[test]
  fn unspecified_upgrade_defaults_to_enabled() {
    let config = Config::default();
    assert!(config.upgrade_enabled("quadratic"));
  }

  #[test]
  fn partial_toml_fills_in_defaults() {
    let config = Config::from_toml_str("max_prop_rounds = 5\n").unwrap();
    assert_eq!(config.max_prop_rounds, 5);
    assert_eq!(config.varbound_relax, VarboundRelax::None);
  }
}
