//! HTTP request handlers organized by resource type

pub mod auth;
pub mod health;
pub mod pagination;
pub mod users;

pub use auth::{
    change_password_handler, login_handler, logout_handler, profile_handler, refresh_handler,
};
pub use health::{health_handler, HealthResponse};
pub use pagination::PaginationQuery;
pub use users::{
    create_user, get_user, list_users, reset_user_password, update_user, update_user_status,
    ListUsersResponse,
};
