use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::{
        CollegeRequest, CollegeView, Governorate, UniversityRequest, UniversityType,
        UniversityView, UserRequest, UserRole, UserView, Validate, clean,
    },
};

// --- Field Parsing ---
//
// HTML forms post every input as text. Fields stay `String` so a rejected
// form can be re-rendered exactly as the user typed it; parsing happens
// when the form is turned into a request.

fn optional(value: &str) -> Option<String> {
    clean(Some(value.to_string()))
}

fn parse_decimal(field: &str, value: &str) -> AppResult<Option<Decimal>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| AppError::Validation(format!("{field} must be a number")))
}

fn parse_int(field: &str, value: &str) -> AppResult<Option<i32>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| AppError::Validation(format!("{field} must be a whole number")))
}

fn parse_code<T>(field: &str, value: &str, from_code: fn(i32) -> Option<T>) -> AppResult<T> {
    parse_int(field, value)?
        .and_then(from_code)
        .ok_or_else(|| AppError::Validation(format!("{field} is required")))
}

fn text(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

fn number<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// UniversityForm
///
/// The create/edit university form as posted by the browser.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UniversityForm {
    pub name_ar: String,
    pub name_en: String,
    #[serde(rename = "type")]
    pub university_type: String,
    pub official_website: String,
    pub location: String,
    pub governorate: String,
    pub last_year_coordination: String,
    pub fees: String,
    pub information_sources: String,
    pub description: String,
}

impl UniversityForm {
    pub fn from_view(view: &UniversityView) -> Self {
        Self {
            name_ar: view.name_ar.clone(),
            name_en: text(view.name_en.as_deref()),
            university_type: view.university_type.code().to_string(),
            official_website: text(view.official_website.as_deref()),
            location: text(view.location.as_deref()),
            governorate: view.governorate.code().to_string(),
            last_year_coordination: number(view.last_year_coordination),
            fees: number(view.fees),
            information_sources: text(view.information_sources.as_deref()),
            description: text(view.description.as_deref()),
        }
    }

    /// Parses and validates the form. `id` is set on edits.
    pub fn to_request(&self, id: Option<i32>) -> AppResult<UniversityRequest> {
        let request = UniversityRequest {
            id,
            name_ar: self.name_ar.clone(),
            name_en: optional(&self.name_en),
            university_type: parse_code(
                "University type",
                &self.university_type,
                UniversityType::from_code,
            )?,
            official_website: optional(&self.official_website),
            location: optional(&self.location),
            governorate: parse_code("Governorate", &self.governorate, Governorate::from_code)?,
            last_year_coordination: parse_decimal(
                "Last year coordination",
                &self.last_year_coordination,
            )?,
            fees: parse_decimal("Fees", &self.fees)?,
            information_sources: optional(&self.information_sources),
            description: optional(&self.description),
            branches: Vec::new(),
        };
        request.validate()?;
        Ok(request)
    }
}

/// CollegeForm
///
/// The create/edit college form. `universityId` travels as a hidden input.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CollegeForm {
    pub university_id: String,
    pub name_ar: String,
    pub name_en: String,
    pub official_website: String,
    pub location: String,
    pub description: String,
    pub fees: String,
    pub last_year_coordination: String,
    pub fees_category_a: String,
    pub fees_category_b: String,
    pub fees_category_c: String,
    pub fees_per_hour: String,
    pub minimum_hours_per_semester: String,
    pub additional_fees: String,
}

impl CollegeForm {
    pub fn for_university(university_id: i32) -> Self {
        Self {
            university_id: university_id.to_string(),
            ..Self::default()
        }
    }

    pub fn from_view(view: &CollegeView) -> Self {
        Self {
            university_id: view.university_id.to_string(),
            name_ar: view.name_ar.clone(),
            name_en: text(view.name_en.as_deref()),
            official_website: text(view.official_website.as_deref()),
            location: text(view.location.as_deref()),
            description: text(view.description.as_deref()),
            fees: number(view.fees),
            last_year_coordination: number(view.last_year_coordination),
            fees_category_a: number(view.fees_category_a),
            fees_category_b: number(view.fees_category_b),
            fees_category_c: number(view.fees_category_c),
            fees_per_hour: number(view.fees_per_hour),
            minimum_hours_per_semester: number(view.minimum_hours_per_semester),
            additional_fees: number(view.additional_fees),
        }
    }

    pub fn to_request(&self, id: Option<i32>) -> AppResult<CollegeRequest> {
        let university_id = parse_int("University ID", &self.university_id)?
            .ok_or_else(|| AppError::Validation("University ID is required".into()))?;
        let request = CollegeRequest {
            id,
            name_ar: self.name_ar.clone(),
            name_en: optional(&self.name_en),
            university_id,
            official_website: optional(&self.official_website),
            location: optional(&self.location),
            description: optional(&self.description),
            fees: parse_decimal("Fees", &self.fees)?,
            last_year_coordination: parse_decimal(
                "Last year coordination",
                &self.last_year_coordination,
            )?,
            fees_category_a: parse_decimal("Category A fees", &self.fees_category_a)?,
            fees_category_b: parse_decimal("Category B fees", &self.fees_category_b)?,
            fees_category_c: parse_decimal("Category C fees", &self.fees_category_c)?,
            fees_per_hour: parse_decimal("Fees per hour", &self.fees_per_hour)?,
            minimum_hours_per_semester: parse_int(
                "Minimum hours per semester",
                &self.minimum_hours_per_semester,
            )?,
            additional_fees: parse_decimal("Additional fees", &self.additional_fees)?,
            departments: Vec::new(),
        };
        request.validate()?;
        Ok(request)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub return_url: String,
}

/// UserForm
///
/// The admin create/edit account form. An unchecked `isActive` checkbox is
/// simply absent from the post.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserForm {
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub role: String,
    pub is_active: Option<String>,
}

impl UserForm {
    /// Blank form for a new account: active Student.
    pub fn new_account() -> Self {
        Self {
            role: UserRole::Student.code().to_string(),
            is_active: Some("true".to_string()),
            ..Self::default()
        }
    }

    pub fn from_view(view: &UserView) -> Self {
        Self {
            email: view.email.clone(),
            full_name: text(view.full_name.as_deref()),
            password: String::new(),
            role: view.role.code().to_string(),
            is_active: view.is_active.then(|| "true".to_string()),
        }
    }

    pub fn to_request(&self) -> AppResult<UserRequest> {
        Ok(UserRequest {
            email: self.email.trim().to_string(),
            full_name: optional(&self.full_name),
            password: (!self.password.is_empty()).then(|| self.password.clone()),
            role: parse_code("Role", &self.role, UserRole::from_code)?,
            is_active: self.is_active.is_some(),
        })
    }
}
