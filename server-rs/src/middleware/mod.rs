pub mod admin;
pub mod auth;
pub mod rate_limit;

pub use admin::*;
pub use auth::*;
pub use rate_limit::*;
