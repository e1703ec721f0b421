//! Domain primitives shared across layers.

pub mod id;

pub use id::UserId;
