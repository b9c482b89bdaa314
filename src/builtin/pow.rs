/*!

The `pow` handler: `children[0] ^ exponent`, exponent a compile-time-unknown but
run-time-fixed float (integer powers are the common case, but the exponent is stored as a
`Float` so e.g. `x^0.5` also works). Only integer exponents get full reverse propagation; a
fractional exponent's monotone-on-nonnegative-domain inverse is left for a future handler
that recognizes roots specifically — see `DESIGN.md`.

*/

use std::any::Any;
use std::cmp::Ordering;

use crate::abstractions::Float;
use crate::api::expr_handler::ExprHandler;
use crate::api::node::ExprNode;
use crate::core::error::{CoreError, CoreResult};
use crate::core::host::Host;
use crate::core::interval::Interval;
use crate::core::node_core::{Curvature, Monotonicity};
use crate::core::propagate::reverse::ReversePropQueue;

pub struct PowHandler;

fn is_even_integer(exponent: Float) -> bool {
  exponent.fract() == 0.0 && (exponent as i64) % 2 == 0
}

fn is_odd_integer(exponent: Float) -> bool {
  exponent.fract() == 0.0 && (exponent as i64) % 2 != 0
}

impl ExprHandler for PowHandler {
  fn name(&self) -> &'static str {
    "pow"
  }

  fn eval(&self, node: &ExprNode, children_values: &[Float], _host: &dyn Host) -> Option<Float> {
    let exponent = node.with_payload(|p| p.as_pow_exponent())?;
    let base = children_values[0];
    if base < 0.0 && exponent.fract() != 0.0 {
      return None;
    }
    if base == 0.0 && exponent < 0.0 {
      return None;
    }
    Some(base.powf(exponent))
  }

  fn inteval(&self, node: &ExprNode, children_intervals: &[Interval], _host: &dyn Host) -> Interval {
    let Some(exponent) = node.with_payload(|p| p.as_pow_exponent()) else {
      return Interval::UNBOUNDED;
    };
    let base = children_intervals[0];
    if base.is_empty() {
      return Interval::EMPTY;
    }

    if is_even_integer(exponent) {
      let candidates = [base.lb.powf(exponent), base.ub.powf(exponent)];
      let max = candidates.iter().cloned().fold(Float::NEG_INFINITY, Float::max);
      let lb = if base.contains(0.0) { 0.0 } else { candidates.iter().cloned().fold(Float::INFINITY, Float::min) };
      Interval::new(lb, max)
    } else if is_odd_integer(exponent) {
      Interval::new(base.lb.powf(exponent), base.ub.powf(exponent))
    } else {
      // Fractional exponent: only defined for a nonnegative base in this reference handler.
      let clipped_lb = base.lb.max(0.0);
      if clipped_lb > base.ub {
        return Interval::EMPTY;
      }
      Interval::new(clipped_lb.powf(exponent), base.ub.max(0.0).powf(exponent))
    }
  }

  fn reverseprop(&self, node: &ExprNode, interval: Interval, queue: &mut ReversePropQueue, _force: bool) -> CoreResult<()> {
    let Some(exponent) = node.with_payload(|p| p.as_pow_exponent()) else { return Ok(()) };
    if exponent == 0.0 {
      return Ok(());
    }
    let child = node.child(0);

    if is_odd_integer(exponent) {
      let root = |v: Float| v.signum() * v.abs().powf(1.0 / exponent);
      let bound = Interval::new(root(interval.lb), root(interval.ub));
      queue.tighten_interval(&child, bound)?;
    } else if is_even_integer(exponent) {
      if interval.ub < 0.0 {
        return Err(CoreError::infeasible(format!("x^{exponent} cannot be negative")));
      }
      let limit = interval.ub.max(0.0).powf(1.0 / exponent);
      queue.tighten_interval(&child, Interval::new(-limit, limit))?;
    } else if exponent > 0.0 {
      // A positive fractional exponent is monotone increasing on its only valid domain,
      // the nonnegative reals (per `eval`'s domain restriction), so the inverse is just
      // `target^(1/exponent)` applied to each endpoint in order.
      if interval.ub < 0.0 {
        return Err(CoreError::infeasible(format!("x^{exponent} cannot be negative")));
      }
      let lb = interval.lb.max(0.0).powf(1.0 / exponent);
      let ub = interval.ub.max(0.0).powf(1.0 / exponent);
      queue.tighten_interval(&child, Interval::new(lb, ub))?;
    }
    // Negative fractional exponents: no closed-form inverse implemented here.
    Ok(())
  }

  fn hash(&self, node: &ExprNode, children_hashes: &[u32]) -> Option<u32> {
    let exponent = node.with_payload(|p| p.as_pow_exponent())?;
    Some(children_hashes[0].rotate_left(7) ^ exponent.to_bits() as u32)
  }

  fn compare(&self, node: &ExprNode, other: &ExprNode) -> Option<Ordering> {
    let a = node.with_payload(|p| p.as_pow_exponent())?;
    let b = other.with_payload(|p| p.as_pow_exponent())?;
    let ord = a.total_cmp(&b);
    if ord != Ordering::Equal {
      return Some(ord);
    }
    let (x, y) = (node.child(0), other.child(0));
    Some(if x.ptr_eq(&y) { Ordering::Equal } else { x.id().0.cmp(&y.id().0) })
  }

  fn print(&self, node: &ExprNode, child_strings: &[String]) -> String {
    let exponent = node.with_payload(|p| p.as_pow_exponent()).unwrap_or(1.0);
    format!("{}^{}", child_strings[0], exponent)
  }

  fn curvature(&self, node: &ExprNode, child_curvatures: &[Curvature]) -> Curvature {
    let exponent = node.with_payload(|p| p.as_pow_exponent()).unwrap_or(1.0);
    if child_curvatures[0] == Curvature::Linear && is_even_integer(exponent) && exponent > 0.0 {
      Curvature::Convex
    } else {
      Curvature::Unknown
    }
  }

  fn monotonicity(&self, node: &ExprNode, _child_index: usize) -> Monotonicity {
    let exponent = node.with_payload(|p| p.as_pow_exponent()).unwrap_or(1.0);
    if is_odd_integer(exponent) {
      Monotonicity::Increasing
    } else {
      Monotonicity::Unknown
    }
  }

  fn integrality(&self, node: &ExprNode, child_integral: &[bool]) -> bool {
    let exponent = node.with_payload(|p| p.as_pow_exponent()).unwrap_or(0.0);
    child_integral[0] && exponent.fract() == 0.0 && exponent >= 0.0
  }

  fn bwdiff(&self, node: &ExprNode, _child_index: usize) -> Option<Float> {
    let exponent = node.with_payload(|p| p.as_pow_exponent())?;
    let base = node.child(0).value();
    Some(exponent * base.powf(exponent - 1.0))
  }

  /// For an even positive integer exponent the node is convex, so its tangent line at the
  /// current LP point is a valid global underestimator and the secant line across its
  /// current interval is a valid overestimator on that interval — the two standard
  /// convex-relaxation cuts.
  fn estimate(&self, node: &ExprNode, below: bool) -> Option<crate::api::expr_handler::LinearEstimate> {
    let exponent = node.with_payload(|p| p.as_pow_exponent())?;
    if !(is_even_integer(exponent) && exponent > 0.0) {
      return None;
    }
    let child = node.child(0);

    if below {
      let x0 = child.value();
      let slope = exponent * x0.powf(exponent - 1.0);
      let constant = x0.powf(exponent) - slope * x0;
      return Some(crate::api::expr_handler::LinearEstimate {
        coefficients: vec![slope],
        constant,
        is_underestimator: true,
      });
    }

    let bounds = child.interval();
    if bounds.is_empty() || crate::abstractions::is_infinite(bounds.lb) || crate::abstractions::is_infinite(bounds.ub) {
      return None;
    }
    if bounds.lb == bounds.ub {
      return None;
    }
    let (flo, fhi) = (bounds.lb.powf(exponent), bounds.ub.powf(exponent));
    let slope = (fhi - flo) / (bounds.ub - bounds.lb);
    let constant = flo - slope * bounds.lb;
    Some(crate::api::expr_handler::LinearEstimate {
      coefficients: vec![slope],
      constant,
      is_underestimator: false,
    })
  }

  fn as_any(&self) -> &dyn Any {
    self
  }
}
