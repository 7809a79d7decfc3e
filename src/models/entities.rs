use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

use super::enums::{Governorate, StudyType, UniversityType, UserRole};

// --- Persisted Rows ---
//
// Every table carries `id`, `created_at`, `updated_at` and the `is_deleted`
// soft-delete flag. Read paths never return rows with `is_deleted = true`.

/// University
///
/// A row of the `universities` table. Owns colleges and branches; both are
/// removed by the storage-level cascade when the university row is deleted.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct University {
    pub id: i32,
    pub name_ar: String,
    pub name_en: Option<String>,
    pub university_type: UniversityType,
    pub official_website: Option<String>,
    pub location: Option<String>,
    pub governorate: Governorate,
    // Last year's admission cutoff (تنسيق), a percentage.
    pub last_year_coordination: Option<Decimal>,
    pub fees: Option<Decimal>,
    pub information_sources: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
}

/// College
///
/// A row of the `colleges` table. Carries three fee schemas: a flat fee,
/// per-category fees (A/B/C) and credit-hour pricing.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct College {
    pub id: i32,
    pub name_ar: String,
    pub name_en: Option<String>,
    pub university_id: i32,
    pub official_website: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub fees: Option<Decimal>,
    pub last_year_coordination: Option<Decimal>,
    pub fees_category_a: Option<Decimal>,
    pub fees_category_b: Option<Decimal>,
    pub fees_category_c: Option<Decimal>,
    pub fees_per_hour: Option<Decimal>,
    pub minimum_hours_per_semester: Option<i32>,
    pub additional_fees: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Department {
    pub id: i32,
    pub name_ar: String,
    pub name_en: Option<String>,
    pub college_id: i32,
    pub description: Option<String>,
    pub study_type: Option<StudyType>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct UniversityBranch {
    pub id: i32,
    pub name_ar: String,
    pub name_en: Option<String>,
    pub university_id: i32,
    pub location: Option<String>,
    pub governorate: Governorate,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
}

/// User
///
/// An account able to sign in. Users are soft-deleted so that login history
/// survives removal from the admin UI.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct News {
    pub id: i32,
    pub title: String,
    pub date: DateTime<Utc>,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
}

// --- Drafts ---
//
// The writable columns of each table. Inserts and full updates both take a
// draft; identity, timestamps and the delete flag are owned by the store.

#[derive(Debug, Clone, PartialEq)]
pub struct UniversityDraft {
    pub name_ar: String,
    pub name_en: Option<String>,
    pub university_type: UniversityType,
    pub official_website: Option<String>,
    pub location: Option<String>,
    pub governorate: Governorate,
    pub last_year_coordination: Option<Decimal>,
    pub fees: Option<Decimal>,
    pub information_sources: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollegeDraft {
    pub name_ar: String,
    pub name_en: Option<String>,
    pub university_id: i32,
    pub official_website: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub fees: Option<Decimal>,
    pub last_year_coordination: Option<Decimal>,
    pub fees_category_a: Option<Decimal>,
    pub fees_category_b: Option<Decimal>,
    pub fees_category_c: Option<Decimal>,
    pub fees_per_hour: Option<Decimal>,
    pub minimum_hours_per_semester: Option<i32>,
    pub additional_fees: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DepartmentDraft {
    pub name_ar: String,
    pub name_en: Option<String>,
    pub college_id: i32,
    pub description: Option<String>,
    pub study_type: Option<StudyType>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BranchDraft {
    pub name_ar: String,
    pub name_en: Option<String>,
    pub university_id: i32,
    pub location: Option<String>,
    pub governorate: Governorate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserDraft {
    pub email: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl UserDraft {
    /// Draft carrying the user's current values, for partial edits.
    pub fn from_user(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            full_name: user.full_name.clone(),
            role: user.role,
            is_active: user.is_active,
            last_login_at: user.last_login_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsDraft {
    pub title: String,
    pub date: DateTime<Utc>,
    pub description: String,
}

// --- Aggregates ---

/// A college together with its live departments.
#[derive(Debug, Clone, PartialEq)]
pub struct CollegeGraph {
    pub college: College,
    pub departments: Vec<Department>,
}

/// A university with its live colleges (and their departments) and branches.
#[derive(Debug, Clone, PartialEq)]
pub struct UniversityGraph {
    pub university: University,
    pub colleges: Vec<CollegeGraph>,
    pub branches: Vec<UniversityBranch>,
}

/// A college, its owning university and its departments.
#[derive(Debug, Clone, PartialEq)]
pub struct CollegeDetails {
    pub college: College,
    pub university: University,
    pub departments: Vec<Department>,
}
