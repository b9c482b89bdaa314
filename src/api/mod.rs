/*!

Public plug-in contracts a host embeds against: the expression node facade, and the
expression-handler / nonlinear-handler traits.

*/

pub mod expr_handler;
pub mod nlhandler;
pub mod node;
