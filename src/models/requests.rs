use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, de};
use utoipa::{IntoParams, ToSchema};

use super::entities::{
    BranchDraft, CollegeDraft, DepartmentDraft, NewsDraft, UniversityDraft,
};
use super::enums::{Governorate, StudyType, UniversityType, UserRole};
use crate::error::{AppError, AppResult};

pub const MAX_NAME_LEN: usize = 200;
pub const MAX_URL_LEN: usize = 500;
pub const MAX_LOCATION_LEN: usize = 500;
pub const MAX_TITLE_LEN: usize = 500;
pub const MAX_EMAIL_LEN: usize = 200;
pub const MAX_FULL_NAME_LEN: usize = 100;
pub const MIN_PASSWORD_LEN: usize = 6;

/// Validate
///
/// Shape checks run on a request body before any service is called.
/// A failure is reported as [`AppError::Validation`] (400).
pub trait Validate {
    fn validate(&self) -> AppResult<()>;
}

// --- Field Checks ---

fn invalid(message: impl Into<String>) -> AppError {
    AppError::Validation(message.into())
}

pub(crate) fn required(field: &str, value: &str, max: usize) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(invalid(format!("{field} is required")));
    }
    max_len(field, Some(value), max)
}

pub(crate) fn max_len(field: &str, value: Option<&str>, max: usize) -> AppResult<()> {
    match value {
        Some(v) if v.chars().count() > max => Err(invalid(format!(
            "{field} must not exceed {max} characters"
        ))),
        _ => Ok(()),
    }
}

fn url(field: &str, value: Option<&str>) -> AppResult<()> {
    max_len(field, value, MAX_URL_LEN)?;
    match value {
        Some(v)
            if !(v.starts_with("http://") || v.starts_with("https://"))
                || v.contains(char::is_whitespace) =>
        {
            Err(invalid(format!("{field} must be a valid URL")))
        }
        _ => Ok(()),
    }
}

/// Money columns are `NUMERIC(18, 2)`: sixteen integer digits at most.
pub const MONEY_LIMIT: i64 = 10_000_000_000_000_000;

fn money(field: &str, value: Option<Decimal>) -> AppResult<()> {
    match value {
        Some(v) if v < Decimal::ZERO => {
            Err(invalid(format!("{field} must be a positive value")))
        }
        // Compared after the rounding the column applies on insert.
        Some(v) if v.round_dp(2) >= Decimal::from(MONEY_LIMIT) => Err(invalid(format!(
            "{field} must be less than {MONEY_LIMIT}"
        ))),
        _ => Ok(()),
    }
}

fn percentage(field: &str, value: Option<Decimal>) -> AppResult<()> {
    match value {
        Some(v) if v < Decimal::ZERO || v > Decimal::ONE_HUNDRED => {
            Err(invalid(format!("{field} must be between 0 and 100")))
        }
        _ => Ok(()),
    }
}

pub(crate) fn email(value: &str) -> AppResult<()> {
    required("Email", value, MAX_EMAIL_LEN)?;
    let well_formed = match value.trim().split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if well_formed {
        Ok(())
    } else {
        Err(invalid("Email must be a valid email address"))
    }
}

pub(crate) fn password(value: &str) -> AppResult<()> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(invalid(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Trims and drops empty strings.
pub fn clean(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

/// Deserializes an optional value that may arrive as an empty string, as
/// query strings and HTML forms send for untouched inputs.
pub fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(de::Error::custom),
    }
}

// --- Catalog Payloads ---

/// UniversityRequest
///
/// Body of `POST /api/universities`, `PUT /api/universities` and
/// `PATCH /api/universities/{id}`. `branches` is only honored on create;
/// `id` is required by `PUT` and overridden by the route on `PATCH`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UniversityRequest {
    #[serde(default)]
    pub id: Option<i32>,
    pub name_ar: String,
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(rename = "type")]
    #[schema(value_type = i32)]
    pub university_type: UniversityType,
    #[serde(default)]
    pub official_website: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[schema(value_type = i32)]
    pub governorate: Governorate,
    #[serde(default)]
    pub last_year_coordination: Option<Decimal>,
    #[serde(default)]
    pub fees: Option<Decimal>,
    #[serde(default)]
    pub information_sources: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub branches: Vec<BranchRequest>,
}

impl Validate for UniversityRequest {
    fn validate(&self) -> AppResult<()> {
        required("Arabic name", &self.name_ar, MAX_NAME_LEN)?;
        max_len("English name", self.name_en.as_deref(), MAX_NAME_LEN)?;
        url("Official website", self.official_website.as_deref())?;
        max_len("Location", self.location.as_deref(), MAX_LOCATION_LEN)?;
        percentage("Last year coordination", self.last_year_coordination)?;
        money("Fees", self.fees)?;
        self.branches.iter().try_for_each(BranchRequest::validate)
    }
}

impl UniversityRequest {
    pub fn to_draft(&self) -> UniversityDraft {
        UniversityDraft {
            name_ar: self.name_ar.trim().to_string(),
            name_en: clean(self.name_en.clone()),
            university_type: self.university_type,
            official_website: clean(self.official_website.clone()),
            location: clean(self.location.clone()),
            governorate: self.governorate,
            last_year_coordination: self.last_year_coordination,
            fees: self.fees,
            information_sources: clean(self.information_sources.clone()),
            description: clean(self.description.clone()),
        }
    }
}

/// CollegeRequest
///
/// Body of the college create/update endpoints. `departments` is only
/// honored on create.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollegeRequest {
    #[serde(default)]
    pub id: Option<i32>,
    pub name_ar: String,
    #[serde(default)]
    pub name_en: Option<String>,
    pub university_id: i32,
    #[serde(default)]
    pub official_website: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fees: Option<Decimal>,
    #[serde(default)]
    pub last_year_coordination: Option<Decimal>,
    #[serde(default)]
    pub fees_category_a: Option<Decimal>,
    #[serde(default)]
    pub fees_category_b: Option<Decimal>,
    #[serde(default)]
    pub fees_category_c: Option<Decimal>,
    #[serde(default)]
    pub fees_per_hour: Option<Decimal>,
    #[serde(default)]
    pub minimum_hours_per_semester: Option<i32>,
    #[serde(default)]
    pub additional_fees: Option<Decimal>,
    #[serde(default)]
    pub departments: Vec<DepartmentRequest>,
}

impl Validate for CollegeRequest {
    fn validate(&self) -> AppResult<()> {
        required("Arabic name", &self.name_ar, MAX_NAME_LEN)?;
        max_len("English name", self.name_en.as_deref(), MAX_NAME_LEN)?;
        url("Official website", self.official_website.as_deref())?;
        max_len("Location", self.location.as_deref(), MAX_LOCATION_LEN)?;
        money("Fees", self.fees)?;
        percentage("Last year coordination", self.last_year_coordination)?;
        money("Category A fees", self.fees_category_a)?;
        money("Category B fees", self.fees_category_b)?;
        money("Category C fees", self.fees_category_c)?;
        money("Fees per hour", self.fees_per_hour)?;
        money("Additional fees", self.additional_fees)?;
        if matches!(self.minimum_hours_per_semester, Some(h) if h < 1) {
            return Err(invalid("Minimum hours per semester must be at least 1"));
        }
        self.departments.iter().try_for_each(|d| d.validate_fields())
    }
}

impl CollegeRequest {
    pub fn to_draft(&self) -> CollegeDraft {
        CollegeDraft {
            name_ar: self.name_ar.trim().to_string(),
            name_en: clean(self.name_en.clone()),
            university_id: self.university_id,
            official_website: clean(self.official_website.clone()),
            location: clean(self.location.clone()),
            description: clean(self.description.clone()),
            fees: self.fees,
            last_year_coordination: self.last_year_coordination,
            fees_category_a: self.fees_category_a,
            fees_category_b: self.fees_category_b,
            fees_category_c: self.fees_category_c,
            fees_per_hour: self.fees_per_hour,
            minimum_hours_per_semester: self.minimum_hours_per_semester,
            additional_fees: self.additional_fees,
        }
    }
}

/// Department payload. `college_id` is required on its own endpoints and
/// ignored when nested inside a [`CollegeRequest`].
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentRequest {
    #[serde(default)]
    pub id: Option<i32>,
    pub name_ar: String,
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default)]
    pub college_id: Option<i32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<i32>)]
    pub study_type: Option<StudyType>,
}

impl DepartmentRequest {
    fn validate_fields(&self) -> AppResult<()> {
        required("Arabic name", &self.name_ar, MAX_NAME_LEN)?;
        max_len("English name", self.name_en.as_deref(), MAX_NAME_LEN)
    }

    pub fn to_draft(&self, college_id: i32) -> DepartmentDraft {
        DepartmentDraft {
            name_ar: self.name_ar.trim().to_string(),
            name_en: clean(self.name_en.clone()),
            college_id,
            description: clean(self.description.clone()),
            study_type: self.study_type,
        }
    }
}

impl Validate for DepartmentRequest {
    fn validate(&self) -> AppResult<()> {
        self.validate_fields()?;
        if self.college_id.is_none() {
            return Err(invalid("College ID is required"));
        }
        Ok(())
    }
}

/// Branch payload. The owning university always comes from the route.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BranchRequest {
    #[serde(default)]
    pub id: Option<i32>,
    pub name_ar: String,
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[schema(value_type = i32)]
    pub governorate: Governorate,
}

impl Validate for BranchRequest {
    fn validate(&self) -> AppResult<()> {
        required("Arabic name", &self.name_ar, MAX_NAME_LEN)?;
        max_len("English name", self.name_en.as_deref(), MAX_NAME_LEN)?;
        max_len("Location", self.location.as_deref(), MAX_LOCATION_LEN)
    }
}

impl BranchRequest {
    pub fn to_draft(&self, university_id: i32) -> BranchDraft {
        BranchDraft {
            name_ar: self.name_ar.trim().to_string(),
            name_en: clean(self.name_en.clone()),
            university_id,
            location: clean(self.location.clone()),
            governorate: self.governorate,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewsRequest {
    #[serde(default)]
    pub id: Option<i32>,
    pub title: String,
    /// Publication date; defaults to now.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    pub description: String,
}

impl Validate for NewsRequest {
    fn validate(&self) -> AppResult<()> {
        required("Title", &self.title, MAX_TITLE_LEN)?;
        if self.description.trim().is_empty() {
            return Err(invalid("Description is required"));
        }
        Ok(())
    }
}

impl NewsRequest {
    pub fn to_draft(&self) -> NewsDraft {
        NewsDraft {
            title: self.title.trim().to_string(),
            date: self.date.unwrap_or_else(Utc::now),
            description: self.description.trim().to_string(),
        }
    }
}

// --- Accounts ---

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> AppResult<()> {
        email(&self.email)?;
        if self.password.is_empty() {
            return Err(invalid("Password is required"));
        }
        Ok(())
    }
}

/// Admin UI account payload. On update an empty `password` keeps the
/// current one.
#[derive(Debug, Clone, Default)]
pub struct UserRequest {
    pub email: String,
    pub full_name: Option<String>,
    pub password: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
}

impl UserRequest {
    pub fn validate_for_create(&self) -> AppResult<()> {
        email(&self.email)?;
        max_len("Full name", self.full_name.as_deref(), MAX_FULL_NAME_LEN)?;
        match self.password.as_deref() {
            Some(p) => password(p),
            None => Err(invalid("Password is required")),
        }
    }

    pub fn validate_for_update(&self) -> AppResult<()> {
        email(&self.email)?;
        max_len("Full name", self.full_name.as_deref(), MAX_FULL_NAME_LEN)?;
        match self.password.as_deref() {
            Some(p) => password(p),
            None => Ok(()),
        }
    }
}

// --- Search ---

/// UniversitySearch
///
/// Normalized search filter. Every `None` is a no-op; every `Some` adds one
/// AND-ed predicate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniversitySearch {
    pub search_term: Option<String>,
    pub university_type: Option<UniversityType>,
    pub governorate: Option<Governorate>,
    pub study_type: Option<StudyType>,
    pub min_fees: Option<Decimal>,
    pub max_fees: Option<Decimal>,
    pub min_coordination: Option<Decimal>,
    pub max_coordination: Option<Decimal>,
    pub college_name: Option<String>,
}

impl UniversitySearch {
    pub fn is_empty(&self) -> bool {
        *self == UniversitySearch::default()
    }
}

/// UniversitySearchParams
///
/// Raw query string of `GET /api/universities/search` and the search page.
/// Unknown enum codes and blank values are dropped rather than rejected.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UniversitySearchParams {
    #[serde(default)]
    pub search_term: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "blank_as_none")]
    #[param(rename = "type")]
    pub university_type: Option<i32>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub governorate: Option<i32>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub study_type: Option<i32>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[param(value_type = Option<f64>)]
    pub min_fees: Option<Decimal>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[param(value_type = Option<f64>)]
    pub max_fees: Option<Decimal>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[param(value_type = Option<f64>)]
    pub min_coordination: Option<Decimal>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[param(value_type = Option<f64>)]
    pub max_coordination: Option<Decimal>,
    #[serde(default)]
    pub college_name: Option<String>,
}

impl UniversitySearchParams {
    pub fn to_filter(&self) -> UniversitySearch {
        UniversitySearch {
            search_term: clean(self.search_term.clone()),
            university_type: self.university_type.and_then(UniversityType::from_code),
            governorate: self.governorate.and_then(Governorate::from_code),
            study_type: self.study_type.and_then(StudyType::from_code),
            min_fees: self.min_fees,
            max_fees: self.max_fees,
            min_coordination: self.min_coordination,
            max_coordination: self.max_coordination,
            college_name: clean(self.college_name.clone()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct NameSearchParams {
    #[serde(default)]
    pub search_term: Option<String>,
}
