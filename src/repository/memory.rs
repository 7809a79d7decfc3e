use std::{
    collections::{BTreeMap, HashMap},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{
    CollegeRepository, CrudRepository, Entity, UniversityRepository, UserRepository,
    assemble_graphs, group_departments,
};
use crate::{
    error::AppResult,
    models::{
        BranchDraft, College, CollegeDetails, CollegeDraft, CollegeGraph, Department,
        DepartmentDraft, Governorate, News, NewsDraft, University, UniversityBranch,
        UniversityDraft, UniversityGraph, UniversitySearch, UniversityType, User, UserDraft,
    },
};

/// MemoryTables
///
/// One ordered map per table plus a shared identity counter.
#[derive(Default)]
pub struct MemoryTables {
    universities: BTreeMap<i32, University>,
    colleges: BTreeMap<i32, College>,
    departments: BTreeMap<i32, Department>,
    branches: BTreeMap<i32, UniversityBranch>,
    users: BTreeMap<i32, User>,
    news: BTreeMap<i32, News>,
    next_id: i32,
}

impl MemoryTables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

/// MemoryRow
///
/// Glue between an [`Entity`] and its map inside [`MemoryTables`].
pub trait MemoryRow: Entity {
    fn rows(tables: &MemoryTables) -> &BTreeMap<i32, Self>;
    fn rows_mut(tables: &mut MemoryTables) -> &mut BTreeMap<i32, Self>;
    fn create(id: i32, draft: Self::Draft, now: DateTime<Utc>) -> Self;
    fn apply(&mut self, draft: Self::Draft, now: DateTime<Utc>);
    fn is_deleted(&self) -> bool;
    fn set_deleted(&mut self);

    /// Mirrors `ON DELETE CASCADE` for the row's children.
    fn cascade(_tables: &mut MemoryTables, _id: i32) {}
}

/// MemoryRepository
///
/// An in-process implementation of every repository trait, used as the
/// test double for handler, service and API tests. Semantics follow the
/// Postgres implementation: soft-deleted rows are invisible, deletes
/// cascade, text matching is case-insensitive.
#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<MemoryTables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, MemoryTables> {
        self.tables.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryTables> {
        self.tables.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Flags a row as deleted without removing it, the way an out-of-band
    /// soft delete would.
    pub fn mark_deleted<T: MemoryRow>(&self, id: i32) -> bool {
        let mut tables = self.write();
        match T::rows_mut(&mut tables).get_mut(&id) {
            Some(row) => {
                row.set_deleted();
                true
            }
            None => false,
        }
    }

    fn live<T: MemoryRow>(tables: &MemoryTables) -> impl Iterator<Item = &T> {
        T::rows(tables).values().filter(|row| !row.is_deleted())
    }

    fn live_by_id<T: MemoryRow>(tables: &MemoryTables, id: i32) -> Option<&T> {
        T::rows(tables).get(&id).filter(|row| !row.is_deleted())
    }

    fn graphs(
        tables: &MemoryTables,
        universities: Vec<University>,
        college_name: Option<&str>,
    ) -> Vec<UniversityGraph> {
        let ids: Vec<i32> = universities.iter().map(|u| u.id).collect();
        let colleges: Vec<College> = Self::live::<College>(tables)
            .filter(|c| ids.contains(&c.university_id))
            .filter(|c| college_name.is_none_or(|name| names_match(&c.name_ar, &c.name_en, name)))
            .cloned()
            .collect();
        let college_ids: Vec<i32> = colleges.iter().map(|c| c.id).collect();
        let departments = Self::live::<Department>(tables)
            .filter(|d| college_ids.contains(&d.college_id))
            .cloned()
            .collect();
        let branches = Self::live::<UniversityBranch>(tables)
            .filter(|b| ids.contains(&b.university_id))
            .cloned()
            .collect();
        assemble_graphs(universities, colleges, departments, branches)
    }

    fn count_by_university<T, F>(tables: &MemoryTables, ids: &[i32], owner: F) -> HashMap<i32, i64>
    where
        T: MemoryRow,
        F: Fn(&T) -> i32,
    {
        let mut counts = HashMap::new();
        for row in Self::live::<T>(tables) {
            let university_id = owner(row);
            if ids.contains(&university_id) {
                *counts.entry(university_id).or_insert(0) += 1;
            }
        }
        counts
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack
        .to_lowercase()
        .contains(&needle.trim().to_lowercase())
}

fn names_match(name_ar: &str, name_en: &Option<String>, term: &str) -> bool {
    contains_ci(name_ar, term) || name_en.as_deref().is_some_and(|en| contains_ci(en, term))
}

fn matches_filter(tables: &MemoryTables, university: &University, filter: &UniversitySearch) -> bool {
    if let Some(term) = &filter.search_term {
        if !names_match(&university.name_ar, &university.name_en, term) {
            return false;
        }
    }
    if filter
        .university_type
        .is_some_and(|t| t != university.university_type)
    {
        return false;
    }
    if filter.governorate.is_some_and(|g| g != university.governorate) {
        return false;
    }
    if let Some(min) = filter.min_fees {
        if !university.fees.is_some_and(|fees| fees >= min) {
            return false;
        }
    }
    if let Some(max) = filter.max_fees {
        if !university.fees.is_some_and(|fees| fees <= max) {
            return false;
        }
    }
    if let Some(min) = filter.min_coordination {
        if !university.last_year_coordination.is_some_and(|c| c >= min) {
            return false;
        }
    }
    if let Some(max) = filter.max_coordination {
        if !university.last_year_coordination.is_some_and(|c| c <= max) {
            return false;
        }
    }

    let colleges: Vec<&College> = MemoryRepository::live::<College>(tables)
        .filter(|c| c.university_id == university.id)
        .collect();
    if let Some(study_type) = filter.study_type {
        let has_track = colleges.iter().any(|c| {
            MemoryRepository::live::<Department>(tables)
                .any(|d| d.college_id == c.id && d.study_type == Some(study_type))
        });
        if !has_track {
            return false;
        }
    }
    if let Some(name) = &filter.college_name {
        if !colleges
            .iter()
            .any(|c| names_match(&c.name_ar, &c.name_en, name))
        {
            return false;
        }
    }
    true
}

// --- Generic CRUD ---

#[async_trait]
impl<T: MemoryRow> CrudRepository<T> for MemoryRepository {
    async fn get_by_id(&self, id: i32) -> AppResult<Option<T>> {
        let tables = self.read();
        Ok(Self::live_by_id::<T>(&tables, id).cloned())
    }

    async fn get_all(&self) -> AppResult<Vec<T>> {
        let tables = self.read();
        Ok(Self::live::<T>(&tables).cloned().collect())
    }

    async fn add(&self, draft: T::Draft) -> AppResult<T> {
        let mut tables = self.write();
        let id = tables.next_id();
        let row = T::create(id, draft, Utc::now());
        T::rows_mut(&mut tables).insert(id, row.clone());
        Ok(row)
    }

    async fn add_range(&self, drafts: Vec<T::Draft>) -> AppResult<Vec<T>> {
        let mut tables = self.write();
        let now = Utc::now();
        let mut rows = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let id = tables.next_id();
            let row = T::create(id, draft, now);
            T::rows_mut(&mut tables).insert(id, row.clone());
            rows.push(row);
        }
        Ok(rows)
    }

    async fn update(&self, id: i32, draft: T::Draft) -> AppResult<Option<T>> {
        let mut tables = self.write();
        match T::rows_mut(&mut tables).get_mut(&id) {
            Some(row) if !row.is_deleted() => {
                row.apply(draft, Utc::now());
                Ok(Some(row.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        let mut tables = self.write();
        if Self::live_by_id::<T>(&tables, id).is_none() {
            return Ok(false);
        }
        T::rows_mut(&mut tables).remove(&id);
        T::cascade(&mut tables, id);
        Ok(true)
    }

    async fn exists(&self, id: i32) -> AppResult<bool> {
        let tables = self.read();
        Ok(Self::live_by_id::<T>(&tables, id).is_some())
    }
}

// --- Specialized Repositories ---

#[async_trait]
impl UniversityRepository for MemoryRepository {
    async fn get_by_type(&self, university_type: UniversityType) -> AppResult<Vec<University>> {
        let tables = self.read();
        Ok(Self::live::<University>(&tables)
            .filter(|u| u.university_type == university_type)
            .cloned()
            .collect())
    }

    async fn get_by_governorate(&self, governorate: Governorate) -> AppResult<Vec<University>> {
        let tables = self.read();
        Ok(Self::live::<University>(&tables)
            .filter(|u| u.governorate == governorate)
            .cloned()
            .collect())
    }

    async fn search(&self, filter: &UniversitySearch) -> AppResult<Vec<UniversityGraph>> {
        let tables = self.read();
        let universities = Self::live::<University>(&tables)
            .filter(|u| matches_filter(&tables, u, filter))
            .cloned()
            .collect();
        Ok(Self::graphs(&tables, universities, filter.college_name.as_deref()))
    }

    async fn search_by_name(&self, term: &str) -> AppResult<Vec<University>> {
        let tables = self.read();
        Ok(Self::live::<University>(&tables)
            .filter(|u| names_match(&u.name_ar, &u.name_en, term))
            .cloned()
            .collect())
    }

    async fn get_with_details(&self, id: i32) -> AppResult<Option<UniversityGraph>> {
        let tables = self.read();
        let Some(university) = Self::live_by_id::<University>(&tables, id).cloned() else {
            return Ok(None);
        };
        Ok(Self::graphs(&tables, vec![university], None).pop())
    }

    async fn branch_counts(&self, university_ids: &[i32]) -> AppResult<HashMap<i32, i64>> {
        let tables = self.read();
        Ok(Self::count_by_university::<UniversityBranch, _>(
            &tables,
            university_ids,
            |b| b.university_id,
        ))
    }

    async fn counts_by_type(&self) -> AppResult<HashMap<UniversityType, i64>> {
        let tables = self.read();
        let mut counts = HashMap::new();
        for university in Self::live::<University>(&tables) {
            *counts.entry(university.university_type).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

#[async_trait]
impl CollegeRepository for MemoryRepository {
    async fn get_by_university_id(&self, university_id: i32) -> AppResult<Vec<CollegeGraph>> {
        let tables = self.read();
        let colleges: Vec<College> = Self::live::<College>(&tables)
            .filter(|c| c.university_id == university_id)
            .cloned()
            .collect();
        let departments = Self::live::<Department>(&tables)
            .filter(|d| colleges.iter().any(|c| c.id == d.college_id))
            .cloned()
            .collect();
        Ok(group_departments(colleges, departments))
    }

    async fn get_with_details(&self, id: i32) -> AppResult<Option<CollegeDetails>> {
        let tables = self.read();
        let Some(college) = Self::live_by_id::<College>(&tables, id).cloned() else {
            return Ok(None);
        };
        let Some(university) =
            Self::live_by_id::<University>(&tables, college.university_id).cloned()
        else {
            return Ok(None);
        };
        let departments = Self::live::<Department>(&tables)
            .filter(|d| d.college_id == college.id)
            .cloned()
            .collect();
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
        let tables = self.read();
        Ok(Self::count_by_university::<College, _>(
            &tables,
            university_ids,
            |c| c.university_id,
        ))
    }
}

#[async_trait]
impl UserRepository for MemoryRepository {
    async fn find_active_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let tables = self.read();
        Ok(Self::live::<User>(&tables)
            .find(|u| u.is_active && u.email.eq_ignore_ascii_case(email.trim()))
            .cloned())
    }

    async fn email_taken(&self, email: &str, except_id: Option<i32>) -> AppResult<bool> {
        let tables = self.read();
        Ok(Self::live::<User>(&tables)
            .any(|u| u.email.eq_ignore_ascii_case(email.trim()) && Some(u.id) != except_id))
    }

    async fn record_login(&self, id: i32, at: DateTime<Utc>) -> AppResult<()> {
        let mut tables = self.write();
        if let Some(user) = tables.users.get_mut(&id) {
            user.last_login_at = Some(at);
        }
        Ok(())
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let tables = self.read();
        let mut users: Vec<User> = Self::live::<User>(&tables).cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(users)
    }

    async fn soft_delete(&self, id: i32) -> AppResult<bool> {
        let mut tables = self.write();
        match tables.users.get_mut(&id) {
            Some(user) if !user.is_deleted => {
                user.is_deleted = true;
                user.updated_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

// --- Row Glue ---

impl MemoryRow for University {
    fn rows(tables: &MemoryTables) -> &BTreeMap<i32, Self> {
        &tables.universities
    }

    fn rows_mut(tables: &mut MemoryTables) -> &mut BTreeMap<i32, Self> {
        &mut tables.universities
    }

    fn create(id: i32, d: UniversityDraft, now: DateTime<Utc>) -> Self {
        University {
            id,
            name_ar: d.name_ar,
            name_en: d.name_en,
            university_type: d.university_type,
            official_website: d.official_website,
            location: d.location,
            governorate: d.governorate,
            last_year_coordination: d.last_year_coordination,
            fees: d.fees,
            information_sources: d.information_sources,
            description: d.description,
            created_at: now,
            updated_at: None,
            is_deleted: false,
        }
    }

    fn apply(&mut self, d: UniversityDraft, now: DateTime<Utc>) {
        *self = University {
            updated_at: Some(now),
            ..Self::create(self.id, d, self.created_at)
        };
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    fn set_deleted(&mut self) {
        self.is_deleted = true;
    }

    fn cascade(tables: &mut MemoryTables, id: i32) {
        let colleges: Vec<i32> = tables
            .colleges
            .values()
            .filter(|c| c.university_id == id)
            .map(|c| c.id)
            .collect();
        for college_id in colleges {
            tables.colleges.remove(&college_id);
            College::cascade(tables, college_id);
        }
        tables.branches.retain(|_, b| b.university_id != id);
    }
}

impl MemoryRow for College {
    fn rows(tables: &MemoryTables) -> &BTreeMap<i32, Self> {
        &tables.colleges
    }

    fn rows_mut(tables: &mut MemoryTables) -> &mut BTreeMap<i32, Self> {
        &mut tables.colleges
    }

    fn create(id: i32, d: CollegeDraft, now: DateTime<Utc>) -> Self {
        College {
            id,
            name_ar: d.name_ar,
            name_en: d.name_en,
            university_id: d.university_id,
            official_website: d.official_website,
            location: d.location,
            description: d.description,
            fees: d.fees,
            last_year_coordination: d.last_year_coordination,
            fees_category_a: d.fees_category_a,
            fees_category_b: d.fees_category_b,
            fees_category_c: d.fees_category_c,
            fees_per_hour: d.fees_per_hour,
            minimum_hours_per_semester: d.minimum_hours_per_semester,
            additional_fees: d.additional_fees,
            created_at: now,
            updated_at: None,
            is_deleted: false,
        }
    }

    fn apply(&mut self, d: CollegeDraft, now: DateTime<Utc>) {
        *self = College {
            updated_at: Some(now),
            ..Self::create(self.id, d, self.created_at)
        };
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    fn set_deleted(&mut self) {
        self.is_deleted = true;
    }

    fn cascade(tables: &mut MemoryTables, id: i32) {
        tables.departments.retain(|_, d| d.college_id != id);
    }
}

impl MemoryRow for Department {
    fn rows(tables: &MemoryTables) -> &BTreeMap<i32, Self> {
        &tables.departments
    }

    fn rows_mut(tables: &mut MemoryTables) -> &mut BTreeMap<i32, Self> {
        &mut tables.departments
    }

    fn create(id: i32, d: DepartmentDraft, now: DateTime<Utc>) -> Self {
        Department {
            id,
            name_ar: d.name_ar,
            name_en: d.name_en,
            college_id: d.college_id,
            description: d.description,
            study_type: d.study_type,
            created_at: now,
            updated_at: None,
            is_deleted: false,
        }
    }

    fn apply(&mut self, d: DepartmentDraft, now: DateTime<Utc>) {
        *self = Department {
            updated_at: Some(now),
            ..Self::create(self.id, d, self.created_at)
        };
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    fn set_deleted(&mut self) {
        self.is_deleted = true;
    }
}

impl MemoryRow for UniversityBranch {
    fn rows(tables: &MemoryTables) -> &BTreeMap<i32, Self> {
        &tables.branches
    }

    fn rows_mut(tables: &mut MemoryTables) -> &mut BTreeMap<i32, Self> {
        &mut tables.branches
    }

    fn create(id: i32, d: BranchDraft, now: DateTime<Utc>) -> Self {
        UniversityBranch {
            id,
            name_ar: d.name_ar,
            name_en: d.name_en,
            university_id: d.university_id,
            location: d.location,
            governorate: d.governorate,
            created_at: now,
            updated_at: None,
            is_deleted: false,
        }
    }

    fn apply(&mut self, d: BranchDraft, now: DateTime<Utc>) {
        *self = UniversityBranch {
            updated_at: Some(now),
            ..Self::create(self.id, d, self.created_at)
        };
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    fn set_deleted(&mut self) {
        self.is_deleted = true;
    }
}

impl MemoryRow for User {
    fn rows(tables: &MemoryTables) -> &BTreeMap<i32, Self> {
        &tables.users
    }

    fn rows_mut(tables: &mut MemoryTables) -> &mut BTreeMap<i32, Self> {
        &mut tables.users
    }

    fn create(id: i32, d: UserDraft, now: DateTime<Utc>) -> Self {
        User {
            id,
            email: d.email,
            password_hash: d.password_hash,
            full_name: d.full_name,
            role: d.role,
            is_active: d.is_active,
            last_login_at: d.last_login_at,
            created_at: now,
            updated_at: None,
            is_deleted: false,
        }
    }

    fn apply(&mut self, d: UserDraft, now: DateTime<Utc>) {
        *self = User {
            updated_at: Some(now),
            ..Self::create(self.id, d, self.created_at)
        };
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    fn set_deleted(&mut self) {
        self.is_deleted = true;
    }
}

impl MemoryRow for News {
    fn rows(tables: &MemoryTables) -> &BTreeMap<i32, Self> {
        &tables.news
    }

    fn rows_mut(tables: &mut MemoryTables) -> &mut BTreeMap<i32, Self> {
        &mut tables.news
    }

    fn create(id: i32, d: NewsDraft, now: DateTime<Utc>) -> Self {
        News {
            id,
            title: d.title,
            date: d.date,
            description: d.description,
            created_at: now,
            updated_at: None,
            is_deleted: false,
        }
    }

    fn apply(&mut self, d: NewsDraft, now: DateTime<Utc>) {
        *self = News {
            updated_at: Some(now),
            ..Self::create(self.id, d, self.created_at)
        };
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    fn set_deleted(&mut self) {
        self.is_deleted = true;
    }
}
