//! Domain types: persisted rows and drafts, request payloads with their
//! validation, and the view models returned to clients.

pub mod entities;
pub mod enums;
pub mod requests;
pub mod views;

pub use entities::*;
pub use enums::{Governorate, StudyType, UniversityType, UnknownCode, UserRole};
pub use requests::*;
pub use views::*;
