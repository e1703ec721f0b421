//! Route protection applied before any page is served.

pub mod edge;

pub use edge::{edge_guard, GuardDecision, RouteGuard};
