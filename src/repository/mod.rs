use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{
    error::AppResult,
    models::{
        College, CollegeDetails, CollegeGraph, Department, Governorate, News, University,
        UniversityBranch, UniversityGraph, UniversitySearch, UniversityType, User,
    },
};

pub mod entity;
pub mod memory;
pub mod postgres;

pub use entity::{Entity, Value};
pub use memory::MemoryRepository;
pub use postgres::PostgresRepository;

/// CrudRepository
///
/// Generic persistence contract, parameterized by entity type. Every read
/// ignores soft-deleted rows; `exists` does too, so parent checks never
/// accept a deleted parent.
///
/// `delete` removes the row outright and lets the storage cascade take its
/// children with it.
#[async_trait]
pub trait CrudRepository<T: Entity>: Send + Sync {
    async fn get_by_id(&self, id: i32) -> AppResult<Option<T>>;
    async fn get_all(&self) -> AppResult<Vec<T>>;
    async fn add(&self, draft: T::Draft) -> AppResult<T>;
    /// Inserts all drafts in one transaction.
    async fn add_range(&self, drafts: Vec<T::Draft>) -> AppResult<Vec<T>>;
    /// Overwrites the writable columns. `None` when no live row has `id`.
    async fn update(&self, id: i32, draft: T::Draft) -> AppResult<Option<T>>;
    async fn delete(&self, id: i32) -> AppResult<bool>;
    async fn exists(&self, id: i32) -> AppResult<bool>;
}

/// UniversityRepository
///
/// Filtered and joined university reads plus the batch aggregations the
/// listing endpoints need to avoid per-row count queries.
#[async_trait]
pub trait UniversityRepository: CrudRepository<University> {
    async fn get_by_type(&self, university_type: UniversityType) -> AppResult<Vec<University>>;
    async fn get_by_governorate(&self, governorate: Governorate) -> AppResult<Vec<University>>;
    /// Universities matching every present filter, each with its colleges
    /// (narrowed to `college_name` when set), their departments, and its
    /// branches.
    async fn search(&self, filter: &UniversitySearch) -> AppResult<Vec<UniversityGraph>>;
    async fn search_by_name(&self, term: &str) -> AppResult<Vec<University>>;
    async fn get_with_details(&self, id: i32) -> AppResult<Option<UniversityGraph>>;
    async fn branch_counts(&self, university_ids: &[i32]) -> AppResult<HashMap<i32, i64>>;
    async fn counts_by_type(&self) -> AppResult<HashMap<UniversityType, i64>>;
}

#[async_trait]
pub trait CollegeRepository: CrudRepository<College> {
    async fn get_by_university_id(&self, university_id: i32) -> AppResult<Vec<CollegeGraph>>;
    /// `None` when the college or its university is missing or deleted.
    async fn get_with_details(&self, id: i32) -> AppResult<Option<CollegeDetails>>;
    async fn counts_by_university_ids(&self, university_ids: &[i32])
    -> AppResult<HashMap<i32, i64>>;
}

/// UserRepository
///
/// Account lookups for sign-in and the admin UI. Accounts are removed with
/// `soft_delete`, never with the hard `delete`.
#[async_trait]
pub trait UserRepository: CrudRepository<User> {
    /// Case-insensitive match on a live, active account.
    async fn find_active_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn email_taken(&self, email: &str, except_id: Option<i32>) -> AppResult<bool>;
    async fn record_login(&self, id: i32, at: DateTime<Utc>) -> AppResult<()>;
    /// Live accounts, newest first.
    async fn list(&self) -> AppResult<Vec<User>>;
    async fn soft_delete(&self, id: i32) -> AppResult<bool>;
}

/// Repositories
///
/// The persistence handles shared through the application state. Both
/// constructors back every handle with the same store.
#[derive(Clone)]
pub struct Repositories {
    pub universities: Arc<dyn UniversityRepository>,
    pub colleges: Arc<dyn CollegeRepository>,
    pub departments: Arc<dyn CrudRepository<Department>>,
    pub branches: Arc<dyn CrudRepository<UniversityBranch>>,
    pub news: Arc<dyn CrudRepository<News>>,
    pub users: Arc<dyn UserRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        let repo = Arc::new(PostgresRepository::new(pool));
        Self {
            universities: repo.clone(),
            colleges: repo.clone(),
            departments: repo.clone(),
            branches: repo.clone(),
            news: repo.clone(),
            users: repo,
        }
    }

    pub fn memory(repo: Arc<MemoryRepository>) -> Self {
        Self {
            universities: repo.clone(),
            colleges: repo.clone(),
            departments: repo.clone(),
            branches: repo.clone(),
            news: repo.clone(),
            users: repo,
        }
    }
}

// --- Graph Assembly ---

/// Attaches departments to their colleges, preserving college order.
pub(crate) fn group_departments(
    colleges: Vec<College>,
    departments: Vec<Department>,
) -> Vec<CollegeGraph> {
    let mut by_college: HashMap<i32, Vec<Department>> = HashMap::new();
    for department in departments {
        by_college
            .entry(department.college_id)
            .or_default()
            .push(department);
    }
    colleges
        .into_iter()
        .map(|college| CollegeGraph {
            departments: by_college.remove(&college.id).unwrap_or_default(),
            college,
        })
        .collect()
}

/// Builds one graph per university from batch-loaded children.
pub(crate) fn assemble_graphs(
    universities: Vec<University>,
    colleges: Vec<College>,
    departments: Vec<Department>,
    branches: Vec<UniversityBranch>,
) -> Vec<UniversityGraph> {
    let mut colleges_by_university: HashMap<i32, Vec<CollegeGraph>> = HashMap::new();
    for graph in group_departments(colleges, departments) {
        colleges_by_university
            .entry(graph.college.university_id)
            .or_default()
            .push(graph);
    }
    let mut branches_by_university: HashMap<i32, Vec<UniversityBranch>> = HashMap::new();
    for branch in branches {
        branches_by_university
            .entry(branch.university_id)
            .or_default()
            .push(branch);
    }

    universities
        .into_iter()
        .map(|university| UniversityGraph {
            colleges: colleges_by_university
                .remove(&university.id)
                .unwrap_or_default(),
            branches: branches_by_university
                .remove(&university.id)
                .unwrap_or_default(),
            university,
        })
        .collect()
}
