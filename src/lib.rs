#![allow(unused)]

/*!

Core of a constraint handler for general nonlinear (expression) constraints inside a
branch-and-bound mixed-integer programming solver.

`abstractions` collects small backend-agnostic utilities, `api` exposes the plug-in
contracts a host embeds against (expression handlers, nonlinear handlers, the expression
node facade, the outbound host trait), and `core` holds the implementation that drives the
DAG, simplification, propagation, and enforcement machinery.

*/

pub mod abstractions;
pub mod api;
pub mod builtin;
pub mod core;
pub mod parser;

#[cfg(test)]
pub(crate) mod test_support;

pub use crate::api::expr_handler::{ExprHandler, ExprHandlerStats};
pub use crate::api::nlhandler::{NlHandler, NlHandlerStats};
pub use crate::api::node::{ExprNode, NodeId};
pub use crate::core::config::Config;
pub use crate::core::constraint::Constraint;
pub use crate::core::error::{CoreError, CoreResult};
pub use crate::core::interval::Interval;
pub use crate::core::registry::HandlerRegistry;
pub use crate::core::tag::Tag;
