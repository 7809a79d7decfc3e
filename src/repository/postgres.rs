use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder};

use super::{
    CollegeRepository, CrudRepository, Entity, UniversityRepository, UserRepository,
    assemble_graphs, group_departments,
};
use crate::{
    error::{AppError, AppResult},
    models::{
        College, CollegeDetails, CollegeGraph, Department, Governorate, University,
        UniversityBranch, UniversityGraph, UniversitySearch, UniversityType, User,
    },
};

/// PostgresRepository
///
/// The concrete implementation of every repository trait, backed by the
/// PostgreSQL pool. Queries are built at runtime with `QueryBuilder` so all
/// user input travels as bind parameters.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Logs a failed query and converts it into an [`AppError`].
fn db_error(op: &'static str, table: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        tracing::error!(op, table, error = ?e, "query failed");
        AppError::from(e)
    }
}

/// Builds a substring `ILIKE` pattern, escaping the input's own wildcards.
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.trim().chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn insert_query<T: Entity>(draft: &T::Draft) -> QueryBuilder<'static, Postgres> {
    let columns = T::columns(draft);
    let names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();

    let mut builder = QueryBuilder::new(format!("INSERT INTO {} (", T::TABLE));
    builder.push(names.join(", "));
    builder.push(") VALUES (");
    for (i, (_, value)) in columns.into_iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        value.push_bind(&mut builder);
    }
    builder.push(format!(") RETURNING {}", T::COLUMNS));
    builder
}

fn update_query<T: Entity>(id: i32, draft: &T::Draft) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("UPDATE {} SET ", T::TABLE));
    for (name, value) in T::columns(draft) {
        builder.push(name);
        builder.push(" = ");
        value.push_bind(&mut builder);
        builder.push(", ");
    }
    builder.push("updated_at = NOW() WHERE id = ");
    builder.push_bind(id);
    builder.push(format!(" AND is_deleted = FALSE RETURNING {}", T::COLUMNS));
    builder
}

/// build_search_query
///
/// Translates a [`UniversitySearch`] into one `SELECT` over `universities`.
/// Each present filter appends one AND-ed predicate; the study-type and
/// college-name filters become `EXISTS` subqueries over live child rows.
pub fn build_search_query(filter: &UniversitySearch) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!(
        "SELECT {} FROM universities WHERE is_deleted = FALSE",
        University::COLUMNS
    ));

    if let Some(term) = &filter.search_term {
        let pattern = like_pattern(term);
        builder
            .push(" AND (name_ar ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR name_en ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(university_type) = filter.university_type {
        builder
            .push(" AND university_type = ")
            .push_bind(university_type.code());
    }
    if let Some(governorate) = filter.governorate {
        builder
            .push(" AND governorate = ")
            .push_bind(governorate.code());
    }
    if let Some(min) = filter.min_fees {
        builder.push(" AND fees IS NOT NULL AND fees >= ").push_bind(min);
    }
    if let Some(max) = filter.max_fees {
        builder.push(" AND fees IS NOT NULL AND fees <= ").push_bind(max);
    }
    if let Some(min) = filter.min_coordination {
        builder
            .push(" AND last_year_coordination IS NOT NULL AND last_year_coordination >= ")
            .push_bind(min);
    }
    if let Some(max) = filter.max_coordination {
        builder
            .push(" AND last_year_coordination IS NOT NULL AND last_year_coordination <= ")
            .push_bind(max);
    }
    if let Some(study_type) = filter.study_type {
        builder
            .push(
                " AND EXISTS (SELECT 1 FROM colleges c \
                 JOIN departments d ON d.college_id = c.id \
                 WHERE c.university_id = universities.id \
                 AND c.is_deleted = FALSE AND d.is_deleted = FALSE \
                 AND d.study_type = ",
            )
            .push_bind(study_type.code())
            .push(")");
    }
    if let Some(name) = &filter.college_name {
        let pattern = like_pattern(name);
        builder
            .push(
                " AND EXISTS (SELECT 1 FROM colleges c \
                 WHERE c.university_id = universities.id AND c.is_deleted = FALSE \
                 AND (c.name_ar ILIKE ",
            )
            .push_bind(pattern.clone())
            .push(" OR c.name_en ILIKE ")
            .push_bind(pattern)
            .push("))");
    }

    builder.push(" ORDER BY id");
    builder
}

// --- Generic CRUD ---

#[async_trait]
impl<T: Entity> CrudRepository<T> for PostgresRepository {
    async fn get_by_id(&self, id: i32) -> AppResult<Option<T>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1 AND is_deleted = FALSE",
            T::COLUMNS,
            T::TABLE
        );
        sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("get_by_id", T::TABLE))
    }

    async fn get_all(&self) -> AppResult<Vec<T>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE is_deleted = FALSE ORDER BY id",
            T::COLUMNS,
            T::TABLE
        );
        sqlx::query_as::<_, T>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("get_all", T::TABLE))
    }

    async fn add(&self, draft: T::Draft) -> AppResult<T> {
        let mut builder = insert_query::<T>(&draft);
        builder
            .build_query_as::<T>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("add", T::TABLE))
    }

    async fn add_range(&self, drafts: Vec<T::Draft>) -> AppResult<Vec<T>> {
        if drafts.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("add_range", T::TABLE))?;

        let mut rows = Vec::with_capacity(drafts.len());
        for draft in &drafts {
            let mut builder = insert_query::<T>(draft);
            let row = builder
                .build_query_as::<T>()
                .fetch_one(&mut *tx)
                .await
                .map_err(db_error("add_range", T::TABLE))?;
            rows.push(row);
        }

        tx.commit().await.map_err(db_error("add_range", T::TABLE))?;
        Ok(rows)
    }

    async fn update(&self, id: i32, draft: T::Draft) -> AppResult<Option<T>> {
        let mut builder = update_query::<T>(id, &draft);
        builder
            .build_query_as::<T>()
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("update", T::TABLE))
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        let sql = format!(
            "DELETE FROM {} WHERE id = $1 AND is_deleted = FALSE",
            T::TABLE
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("delete", T::TABLE))?;
        Ok(result.rows_affected() > 0)
    }

    async fn exists(&self, id: i32) -> AppResult<bool> {
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1 AND is_deleted = FALSE)",
            T::TABLE
        );
        sqlx::query_scalar::<_, bool>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("exists", T::TABLE))
    }
}

// --- Batch Child Loading ---

impl PostgresRepository {
    async fn universities_where(
        &self,
        column: &'static str,
        code: i32,
    ) -> AppResult<Vec<University>> {
        let sql = format!(
            "SELECT {} FROM universities WHERE {column} = $1 AND is_deleted = FALSE ORDER BY id",
            University::COLUMNS
        );
        sqlx::query_as::<_, University>(&sql)
            .bind(code)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("universities_where", "universities"))
    }

    async fn colleges_of(
        &self,
        university_ids: &[i32],
        name_filter: Option<&str>,
    ) -> AppResult<Vec<College>> {
        if university_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM colleges WHERE is_deleted = FALSE AND university_id = ANY(",
            College::COLUMNS
        ));
        builder.push_bind(university_ids.to_vec()).push(")");
        if let Some(name) = name_filter {
            let pattern = like_pattern(name);
            builder
                .push(" AND (name_ar ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR name_en ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        builder.push(" ORDER BY id");

        builder
            .build_query_as::<College>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("colleges_of", "colleges"))
    }

    async fn departments_of(&self, college_ids: &[i32]) -> AppResult<Vec<Department>> {
        if college_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {} FROM departments WHERE is_deleted = FALSE AND college_id = ANY($1) ORDER BY id",
            Department::COLUMNS
        );
        sqlx::query_as::<_, Department>(&sql)
            .bind(college_ids.to_vec())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("departments_of", "departments"))
    }

    async fn branches_of(&self, university_ids: &[i32]) -> AppResult<Vec<UniversityBranch>> {
        if university_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {} FROM university_branches WHERE is_deleted = FALSE AND university_id = ANY($1) ORDER BY id",
            UniversityBranch::COLUMNS
        );
        sqlx::query_as::<_, UniversityBranch>(&sql)
            .bind(university_ids.to_vec())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("branches_of", "university_branches"))
    }

    async fn count_by_university(
        &self,
        table: &'static str,
        university_ids: &[i32],
    ) -> AppResult<HashMap<i32, i64>> {
        if university_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let sql = format!(
            "SELECT university_id, COUNT(*) FROM {table} \
             WHERE is_deleted = FALSE AND university_id = ANY($1) GROUP BY university_id"
        );
        let rows = sqlx::query_as::<_, (i32, i64)>(&sql)
            .bind(university_ids.to_vec())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("count_by_university", table))?;
        Ok(rows.into_iter().collect())
    }

    /// Loads colleges, departments and branches for a page of universities
    /// with three batched queries.
    async fn load_graphs(
        &self,
        universities: Vec<University>,
        college_name: Option<&str>,
    ) -> AppResult<Vec<UniversityGraph>> {
        let ids: Vec<i32> = universities.iter().map(|u| u.id).collect();
        let colleges = self.colleges_of(&ids, college_name).await?;
        let college_ids: Vec<i32> = colleges.iter().map(|c| c.id).collect();
        let departments = self.departments_of(&college_ids).await?;
        let branches = self.branches_of(&ids).await?;
        Ok(assemble_graphs(universities, colleges, departments, branches))
    }
}

// --- Specialized Repositories ---

#[async_trait]
impl UniversityRepository for PostgresRepository {
    async fn get_by_type(&self, university_type: UniversityType) -> AppResult<Vec<University>> {
        self.universities_where("university_type", university_type.code())
            .await
    }

    async fn get_by_governorate(&self, governorate: Governorate) -> AppResult<Vec<University>> {
        self.universities_where("governorate", governorate.code())
            .await
    }

    async fn search(&self, filter: &UniversitySearch) -> AppResult<Vec<UniversityGraph>> {
        let mut builder = build_search_query(filter);
        let universities = builder
            .build_query_as::<University>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("search", "universities"))?;

        tracing::debug!(matches = universities.len(), "university search");
        self.load_graphs(universities, filter.college_name.as_deref())
            .await
    }

    async fn search_by_name(&self, term: &str) -> AppResult<Vec<University>> {
        let filter = UniversitySearch {
            search_term: Some(term.to_string()),
            ..UniversitySearch::default()
        };
        let mut builder = build_search_query(&filter);
        builder
            .build_query_as::<University>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("search_by_name", "universities"))
    }

    async fn get_with_details(&self, id: i32) -> AppResult<Option<UniversityGraph>> {
        let Some(university) = CrudRepository::<University>::get_by_id(self, id).await? else {
            return Ok(None);
        };
        Ok(self.load_graphs(vec![university], None).await?.pop())
    }

    async fn branch_counts(&self, university_ids: &[i32]) -> AppResult<HashMap<i32, i64>> {
        self.count_by_university("university_branches", university_ids)
            .await
    }

    async fn counts_by_type(&self) -> AppResult<HashMap<UniversityType, i64>> {
        let rows = sqlx::query_as::<_, (UniversityType, i64)>(
            "SELECT university_type, COUNT(*) FROM universities \
             WHERE is_deleted = FALSE GROUP BY university_type",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("counts_by_type", "universities"))?;
        Ok(rows.into_iter().collect())
    }
}

#[async_trait]
impl CollegeRepository for PostgresRepository {
    async fn get_by_university_id(&self, university_id: i32) -> AppResult<Vec<CollegeGraph>> {
        let colleges = self.colleges_of(&[university_id], None).await?;
        let college_ids: Vec<i32> = colleges.iter().map(|c| c.id).collect();
        let departments = self.departments_of(&college_ids).await?;
        Ok(group_departments(colleges, departments))
    }

    async fn get_with_details(&self, id: i32) -> AppResult<Option<CollegeDetails>> {
        let Some(college) = CrudRepository::<College>::get_by_id(self, id).await? else {
            return Ok(None);
        };
        let Some(university) =
            CrudRepository::<University>::get_by_id(self, college.university_id).await?
        else {
            return Ok(None);
        };
        let departments = self.departments_of(&[college.id]).await?;
        Ok(Some(CollegeDetails {
            college,
            university,
            departments,
        }))
    }

    async fn counts_by_university_ids(
        &self,
        university_ids: &[i32],
    ) -> AppResult<HashMap<i32, i64>> {
        self.count_by_university("colleges", university_ids).await
    }
}

#[async_trait]
impl UserRepository for PostgresRepository {
    async fn find_active_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1) \
             AND is_active = TRUE AND is_deleted = FALSE",
            User::COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("find_active_by_email", "users"))
    }

    async fn email_taken(&self, email: &str, except_id: Option<i32>) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) \
             AND is_deleted = FALSE AND ($2::INTEGER IS NULL OR id <> $2))",
        )
        .bind(email.trim())
        .bind(except_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("email_taken", "users"))
    }

    async fn record_login(&self, id: i32, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_login_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(db_error("record_login", "users"))?;
        Ok(())
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE is_deleted = FALSE ORDER BY created_at DESC, id DESC",
            User::COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list", "users"))
    }

    async fn soft_delete(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET is_deleted = TRUE, updated_at = NOW() \
             WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db_error("soft_delete", "users"))?;
        Ok(result.rows_affected() > 0)
    }
}
