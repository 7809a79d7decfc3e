use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, Postgres, QueryBuilder, postgres::PgRow};

use crate::models::{
    BranchDraft, College, CollegeDraft, Department, DepartmentDraft, News, NewsDraft,
    University, UniversityBranch, UniversityDraft, User, UserDraft,
};

/// Value
///
/// A bindable column value. Drafts are flattened into `(column, Value)` pairs
/// so one generic insert/update path serves every table.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(Option<String>),
    Int(Option<i32>),
    Decimal(Option<Decimal>),
    Bool(bool),
    Timestamp(Option<DateTime<Utc>>),
}

impl Value {
    pub fn text(value: &str) -> Self {
        Value::Text(Some(value.to_string()))
    }

    pub fn push_bind(self, builder: &mut QueryBuilder<'_, Postgres>) {
        match self {
            Value::Text(v) => builder.push_bind(v),
            Value::Int(v) => builder.push_bind(v),
            Value::Decimal(v) => builder.push_bind(v),
            Value::Bool(v) => builder.push_bind(v),
            Value::Timestamp(v) => builder.push_bind(v),
        };
    }
}

/// Entity
///
/// Table metadata for a persisted row type. Implemented once per table and
/// consumed by the generic `CrudRepository` implementations.
pub trait Entity: for<'r> FromRow<'r, PgRow> + Clone + Send + Sync + Unpin + 'static {
    /// Writable columns of the row.
    type Draft: Clone + Send + Sync + 'static;

    const TABLE: &'static str;
    /// Select list matching the row's `FromRow` fields.
    const COLUMNS: &'static str;

    fn columns(draft: &Self::Draft) -> Vec<(&'static str, Value)>;
}

impl Entity for University {
    type Draft = UniversityDraft;

    const TABLE: &'static str = "universities";
    const COLUMNS: &'static str = "id, name_ar, name_en, university_type, official_website, location, \
        governorate, last_year_coordination, fees, information_sources, description, \
        created_at, updated_at, is_deleted";

    fn columns(d: &UniversityDraft) -> Vec<(&'static str, Value)> {
        vec![
            ("name_ar", Value::text(&d.name_ar)),
            ("name_en", Value::Text(d.name_en.clone())),
            ("university_type", Value::Int(Some(d.university_type.code()))),
            ("official_website", Value::Text(d.official_website.clone())),
            ("location", Value::Text(d.location.clone())),
            ("governorate", Value::Int(Some(d.governorate.code()))),
            ("last_year_coordination", Value::Decimal(d.last_year_coordination)),
            ("fees", Value::Decimal(d.fees)),
            ("information_sources", Value::Text(d.information_sources.clone())),
            ("description", Value::Text(d.description.clone())),
        ]
    }
}

impl Entity for College {
    type Draft = CollegeDraft;

    const TABLE: &'static str = "colleges";
    const COLUMNS: &'static str = "id, name_ar, name_en, university_id, official_website, location, \
        description, fees, last_year_coordination, fees_category_a, fees_category_b, \
        fees_category_c, fees_per_hour, minimum_hours_per_semester, additional_fees, \
        created_at, updated_at, is_deleted";

    fn columns(d: &CollegeDraft) -> Vec<(&'static str, Value)> {
        vec![
            ("name_ar", Value::text(&d.name_ar)),
            ("name_en", Value::Text(d.name_en.clone())),
            ("university_id", Value::Int(Some(d.university_id))),
            ("official_website", Value::Text(d.official_website.clone())),
            ("location", Value::Text(d.location.clone())),
            ("description", Value::Text(d.description.clone())),
            ("fees", Value::Decimal(d.fees)),
            ("last_year_coordination", Value::Decimal(d.last_year_coordination)),
            ("fees_category_a", Value::Decimal(d.fees_category_a)),
            ("fees_category_b", Value::Decimal(d.fees_category_b)),
            ("fees_category_c", Value::Decimal(d.fees_category_c)),
            ("fees_per_hour", Value::Decimal(d.fees_per_hour)),
            ("minimum_hours_per_semester", Value::Int(d.minimum_hours_per_semester)),
            ("additional_fees", Value::Decimal(d.additional_fees)),
        ]
    }
}

impl Entity for Department {
    type Draft = DepartmentDraft;

    const TABLE: &'static str = "departments";
    const COLUMNS: &'static str = "id, name_ar, name_en, college_id, description, study_type, \
        created_at, updated_at, is_deleted";

    fn columns(d: &DepartmentDraft) -> Vec<(&'static str, Value)> {
        vec![
            ("name_ar", Value::text(&d.name_ar)),
            ("name_en", Value::Text(d.name_en.clone())),
            ("college_id", Value::Int(Some(d.college_id))),
            ("description", Value::Text(d.description.clone())),
            ("study_type", Value::Int(d.study_type.map(|s| s.code()))),
        ]
    }
}

impl Entity for UniversityBranch {
    type Draft = BranchDraft;

    const TABLE: &'static str = "university_branches";
    const COLUMNS: &'static str = "id, name_ar, name_en, university_id, location, governorate, \
        created_at, updated_at, is_deleted";

    fn columns(d: &BranchDraft) -> Vec<(&'static str, Value)> {
        vec![
            ("name_ar", Value::text(&d.name_ar)),
            ("name_en", Value::Text(d.name_en.clone())),
            ("university_id", Value::Int(Some(d.university_id))),
            ("location", Value::Text(d.location.clone())),
            ("governorate", Value::Int(Some(d.governorate.code()))),
        ]
    }
}

impl Entity for User {
    type Draft = UserDraft;

    const TABLE: &'static str = "users";
    const COLUMNS: &'static str = "id, email, password_hash, full_name, role, is_active, \
        last_login_at, created_at, updated_at, is_deleted";

    fn columns(d: &UserDraft) -> Vec<(&'static str, Value)> {
        vec![
            ("email", Value::text(&d.email)),
            ("password_hash", Value::text(&d.password_hash)),
            ("full_name", Value::Text(d.full_name.clone())),
            ("role", Value::Int(Some(d.role.code()))),
            ("is_active", Value::Bool(d.is_active)),
            ("last_login_at", Value::Timestamp(d.last_login_at)),
        ]
    }
}

impl Entity for News {
    type Draft = NewsDraft;

    const TABLE: &'static str = "news";
    const COLUMNS: &'static str = "id, title, date, description, created_at, updated_at, is_deleted";

    fn columns(d: &NewsDraft) -> Vec<(&'static str, Value)> {
        vec![
            ("title", Value::text(&d.title)),
            ("date", Value::Timestamp(Some(d.date))),
            ("description", Value::text(&d.description)),
        ]
    }
}
