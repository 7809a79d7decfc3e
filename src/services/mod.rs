//! Business operations sitting between the HTTP layers and the repositories.
//!
//! Services own projection (row graphs to view models), parent existence
//! checks and the reload-after-write rule. Handlers and pages share them.

pub mod auth;
pub mod news;
pub mod university;
pub mod users;

pub use auth::AuthService;
pub use news::NewsService;
pub use university::UniversityService;
pub use users::UserService;
