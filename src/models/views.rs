use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use ts_rs::TS;
use utoipa::ToSchema;

use super::entities::{
    College, CollegeDetails, CollegeGraph, Department, News, University, UniversityBranch,
    UniversityGraph, User,
};
use super::enums::{Governorate, StudyType, UniversityType, UserRole};

// --- Response Schemas ---
//
// Keys are camelCase, absent values are omitted, and every enum travels as
// its integer code next to an `...Ar` Arabic label.

/// UniversityView
///
/// The university projection returned by every read endpoint. Summary
/// listings leave `colleges`/`branches` empty but always fill the counts.
#[derive(Debug, Clone, Serialize, TS, ToSchema)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UniversityView {
    pub id: i32,
    pub name_ar: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,
    #[serde(rename = "type")]
    #[ts(type = "number")]
    #[schema(value_type = i32)]
    pub university_type: UniversityType,
    pub type_ar: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub official_website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[ts(type = "number")]
    #[schema(value_type = i32)]
    pub governorate: Governorate,
    pub governorate_ar: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "number")]
    pub last_year_coordination: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "number")]
    pub fees: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub information_sources: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub colleges_count: i64,
    pub branches_count: i64,
    pub colleges: Vec<CollegeView>,
    pub branches: Vec<BranchView>,
}

/// UniversityBasicView
///
/// Back-reference from a college to its university.
#[derive(Debug, Clone, Serialize, TS, ToSchema)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UniversityBasicView {
    pub id: i32,
    pub name_ar: String,
    #[serde(rename = "type")]
    #[ts(type = "number")]
    #[schema(value_type = i32)]
    pub university_type: UniversityType,
    pub type_ar: String,
}

#[derive(Debug, Clone, Serialize, TS, ToSchema)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CollegeView {
    pub id: i32,
    pub name_ar: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,
    pub university_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub official_website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "number")]
    pub fees: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "number")]
    pub last_year_coordination: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "number")]
    pub fees_category_a: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "number")]
    pub fees_category_b: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "number")]
    pub fees_category_c: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "number")]
    pub fees_per_hour: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_hours_per_semester: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "number")]
    pub additional_fees: Option<Decimal>,
    pub departments_count: i64,
    pub departments: Vec<DepartmentView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub university: Option<UniversityBasicView>,
}

#[derive(Debug, Clone, Serialize, TS, ToSchema)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentView {
    pub id: i32,
    pub name_ar: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,
    pub college_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "number")]
    #[schema(value_type = Option<i32>)]
    pub study_type: Option<StudyType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub study_type_ar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, TS, ToSchema)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BranchView {
    pub id: i32,
    pub name_ar: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,
    pub university_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[ts(type = "number")]
    #[schema(value_type = i32)]
    pub governorate: Governorate,
    pub governorate_ar: String,
}

/// UniversityTypeView
///
/// One bucket of the home-page breakdown: a university type and how many
/// live universities carry it.
#[derive(Debug, Clone, Serialize, TS, ToSchema)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UniversityTypeView {
    #[serde(rename = "type")]
    #[ts(type = "number")]
    #[schema(value_type = i32)]
    pub university_type: UniversityType,
    pub type_name_ar: String,
    pub total_universities: i64,
}

#[derive(Debug, Clone, Serialize, TS, ToSchema)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewsView {
    pub id: i32,
    pub title: String,
    #[ts(type = "string")]
    pub date: DateTime<Utc>,
    pub description: String,
}

/// LoginResponse
///
/// Returned by `POST /api/auth/login`. `role` is the English role name also
/// carried in the token's `role` claim.
#[derive(Debug, Clone, Serialize, TS, ToSchema)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub email: String,
    pub user_id: i32,
    pub role: String,
    #[ts(type = "string")]
    pub expires_at: DateTime<Utc>,
}

/// Admin UI listing of an account. Never carries the password hash.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: i32,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[schema(value_type = i32)]
    pub role: UserRole,
    pub role_ar: String,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// --- Projections ---

impl UniversityView {
    /// Flat projection with caller-supplied counts and no children.
    pub fn summary(university: &University, colleges_count: i64, branches_count: i64) -> Self {
        Self {
            id: university.id,
            name_ar: university.name_ar.clone(),
            name_en: university.name_en.clone(),
            university_type: university.university_type,
            type_ar: university.university_type.label().to_string(),
            official_website: university.official_website.clone(),
            location: university.location.clone(),
            governorate: university.governorate,
            governorate_ar: university.governorate.label().to_string(),
            last_year_coordination: university.last_year_coordination,
            fees: university.fees,
            information_sources: university.information_sources.clone(),
            description: university.description.clone(),
            colleges_count,
            branches_count,
            colleges: Vec::new(),
            branches: Vec::new(),
        }
    }

    /// Full projection: colleges with their departments, and branches.
    pub fn detailed(graph: &UniversityGraph) -> Self {
        let mut view = Self::summary(
            &graph.university,
            graph.colleges.len() as i64,
            graph.branches.len() as i64,
        );
        view.colleges = graph.colleges.iter().map(CollegeView::from_graph).collect();
        view.branches = graph.branches.iter().map(BranchView::from).collect();
        view
    }

    /// Search projection: matching colleges are embedded, branches are only
    /// counted.
    pub fn search_result(graph: &UniversityGraph) -> Self {
        let mut view = Self::summary(
            &graph.university,
            graph.colleges.len() as i64,
            graph.branches.len() as i64,
        );
        view.colleges = graph.colleges.iter().map(CollegeView::from_graph).collect();
        view
    }
}

impl From<&University> for UniversityBasicView {
    fn from(university: &University) -> Self {
        Self {
            id: university.id,
            name_ar: university.name_ar.clone(),
            university_type: university.university_type,
            type_ar: university.university_type.label().to_string(),
        }
    }
}

impl CollegeView {
    pub fn new(college: &College, departments: &[Department]) -> Self {
        Self {
            id: college.id,
            name_ar: college.name_ar.clone(),
            name_en: college.name_en.clone(),
            university_id: college.university_id,
            official_website: college.official_website.clone(),
            location: college.location.clone(),
            description: college.description.clone(),
            fees: college.fees,
            last_year_coordination: college.last_year_coordination,
            fees_category_a: college.fees_category_a,
            fees_category_b: college.fees_category_b,
            fees_category_c: college.fees_category_c,
            fees_per_hour: college.fees_per_hour,
            minimum_hours_per_semester: college.minimum_hours_per_semester,
            additional_fees: college.additional_fees,
            departments_count: departments.len() as i64,
            departments: departments.iter().map(DepartmentView::from).collect(),
            university: None,
        }
    }

    pub fn from_graph(graph: &CollegeGraph) -> Self {
        Self::new(&graph.college, &graph.departments)
    }

    pub fn with_university(mut self, university: &University) -> Self {
        self.university = Some(UniversityBasicView::from(university));
        self
    }
}

impl From<&CollegeDetails> for CollegeView {
    fn from(details: &CollegeDetails) -> Self {
        CollegeView::new(&details.college, &details.departments).with_university(&details.university)
    }
}

impl From<&Department> for DepartmentView {
    fn from(department: &Department) -> Self {
        Self {
            id: department.id,
            name_ar: department.name_ar.clone(),
            name_en: department.name_en.clone(),
            college_id: department.college_id,
            study_type: department.study_type,
            study_type_ar: department.study_type.map(|s| s.label().to_string()),
            description: department.description.clone(),
        }
    }
}

impl From<&UniversityBranch> for BranchView {
    fn from(branch: &UniversityBranch) -> Self {
        Self {
            id: branch.id,
            name_ar: branch.name_ar.clone(),
            name_en: branch.name_en.clone(),
            university_id: branch.university_id,
            location: branch.location.clone(),
            governorate: branch.governorate,
            governorate_ar: branch.governorate.label().to_string(),
        }
    }
}

impl From<&News> for NewsView {
    fn from(news: &News) -> Self {
        Self {
            id: news.id,
            title: news.title.clone(),
            date: news.date,
            description: news.description.clone(),
        }
    }
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            role: user.role,
            role_ar: user.role.label().to_string(),
            is_active: user.is_active,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }
}
