//! Client side of the auth lifecycle: a typed API client, the session guard
//! that gates protected views, and a scoped query cache.

pub mod cache;
pub mod http;
pub mod session;

pub use cache::{Invalidation, QueryCache, QueryKey};
pub use http::{ApiClient, ClientConfig};
pub use session::{
    access_token_expired, CheckTicket, MemoryTokenStore, ProfileSource, SessionGuard,
    SessionState, TokenRefresher, TokenStore,
};
