/// Router Module Index
///
/// Splits the routing table by access level. Paths are registered in full
/// (no `nest`) so the response cache keys on the complete request path.
///
/// Public and admin routers may register different methods on the same
/// path; `Router::merge` combines them into one method router.

/// Anonymous JSON API reads, cached per route.
pub mod public;

/// JSON API writes. Every handler takes the `AdminUser` extractor.
pub mod admin;

/// The server-rendered front-end.
pub mod pages;
