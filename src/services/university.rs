use std::{collections::HashMap, sync::Arc};

use crate::{
    error::{AppError, AppResult},
    models::{
        BranchRequest, BranchView, CollegeRequest, CollegeView, Department, DepartmentRequest,
        DepartmentView, University, UniversityBranch, UniversityRequest, UniversitySearch,
        UniversityType, UniversityTypeView, UniversityView,
    },
    repository::{CollegeRepository, CrudRepository, Repositories, UniversityRepository},
};

/// UniversityService
///
/// Catalog reads and admin writes for universities and everything they
/// own. Every write re-reads the stored row graph so the caller sees the
/// same projection a subsequent `GET` would return.
#[derive(Clone)]
pub struct UniversityService {
    universities: Arc<dyn UniversityRepository>,
    colleges: Arc<dyn CollegeRepository>,
    departments: Arc<dyn CrudRepository<Department>>,
    branches: Arc<dyn CrudRepository<UniversityBranch>>,
}

impl UniversityService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            universities: repos.universities.clone(),
            colleges: repos.colleges.clone(),
            departments: repos.departments.clone(),
            branches: repos.branches.clone(),
        }
    }

    // --- Reads ---

    /// One bucket per university type, in code order, including empty ones.
    pub async fn university_types(&self) -> AppResult<Vec<UniversityTypeView>> {
        let counts = self.universities.counts_by_type().await?;
        Ok(UniversityType::ALL
            .iter()
            .map(|&university_type| UniversityTypeView {
                university_type,
                type_name_ar: university_type.label().to_string(),
                total_universities: counts.get(&university_type).copied().unwrap_or(0),
            })
            .collect())
    }

    pub async fn universities_by_type(
        &self,
        university_type: UniversityType,
    ) -> AppResult<Vec<UniversityView>> {
        let universities = self.universities.get_by_type(university_type).await?;
        self.summaries(&universities).await
    }

    pub async fn university(&self, id: i32) -> AppResult<UniversityView> {
        self.universities
            .get_with_details(id)
            .await?
            .map(|graph| UniversityView::detailed(&graph))
            .ok_or_else(|| AppError::not_found("University", id))
    }

    pub async fn search(&self, filter: &UniversitySearch) -> AppResult<Vec<UniversityView>> {
        let graphs = self.universities.search(filter).await?;
        tracing::debug!(results = graphs.len(), "university search");
        Ok(graphs.iter().map(UniversityView::search_result).collect())
    }

    /// Name-only search. A blank term matches nothing.
    pub async fn search_by_name(&self, term: &str) -> AppResult<Vec<UniversityView>> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }
        let universities = self.universities.search_by_name(term).await?;
        self.summaries(&universities).await
    }

    pub async fn colleges_of(&self, university_id: i32) -> AppResult<Vec<CollegeView>> {
        let university = self.require_university(university_id).await?;
        let graphs = self.colleges.get_by_university_id(university_id).await?;
        Ok(graphs
            .iter()
            .map(|graph| CollegeView::from_graph(graph).with_university(&university))
            .collect())
    }

    pub async fn college(&self, id: i32) -> AppResult<CollegeView> {
        self.colleges
            .get_with_details(id)
            .await?
            .map(|details| CollegeView::from(&details))
            .ok_or_else(|| AppError::not_found("College", id))
    }

    // --- Creates ---

    /// Inserts the university, then its branches in one batch.
    pub async fn create_university(&self, request: &UniversityRequest) -> AppResult<UniversityView> {
        let university = self.universities.add(request.to_draft()).await?;
        if !request.branches.is_empty() {
            let drafts = request
                .branches
                .iter()
                .map(|branch| branch.to_draft(university.id))
                .collect();
            self.branches.add_range(drafts).await?;
        }
        tracing::info!(id = university.id, name = %university.name_ar, "university created");
        self.university(university.id).await
    }

    /// Inserts the college, then its departments in one batch. The owning
    /// university must exist.
    pub async fn create_college(&self, request: &CollegeRequest) -> AppResult<CollegeView> {
        self.require_university_exists(request.university_id).await?;

        let college = self.colleges.add(request.to_draft()).await?;
        if !request.departments.is_empty() {
            let drafts = request
                .departments
                .iter()
                .map(|department| department.to_draft(college.id))
                .collect();
            self.departments.add_range(drafts).await?;
        }
        tracing::info!(id = college.id, university_id = college.university_id, "college created");
        self.college(college.id).await
    }

    pub async fn create_department(&self, request: &DepartmentRequest) -> AppResult<DepartmentView> {
        let college_id = department_college(request)?;
        self.require_college_exists(college_id).await?;

        let department = self.departments.add(request.to_draft(college_id)).await?;
        tracing::info!(id = department.id, college_id, "department created");
        Ok(DepartmentView::from(&department))
    }

    pub async fn create_branch(
        &self,
        university_id: i32,
        request: &BranchRequest,
    ) -> AppResult<BranchView> {
        self.require_university_exists(university_id).await?;

        let branch = self.branches.add(request.to_draft(university_id)).await?;
        tracing::info!(id = branch.id, university_id, "branch created");
        Ok(BranchView::from(&branch))
    }

    // --- Updates ---

    /// Overwrites the university's own columns. Nested branches in the
    /// request are ignored; branches have their own endpoints.
    pub async fn update_university(
        &self,
        id: i32,
        request: &UniversityRequest,
    ) -> AppResult<UniversityView> {
        self.universities
            .update(id, request.to_draft())
            .await?
            .ok_or_else(|| AppError::not_found("University", id))?;
        tracing::info!(id, "university updated");
        self.university(id).await
    }

    pub async fn update_college(&self, id: i32, request: &CollegeRequest) -> AppResult<CollegeView> {
        if !self.colleges.exists(id).await? {
            return Err(AppError::not_found("College", id));
        }
        self.require_university_exists(request.university_id).await?;

        self.colleges
            .update(id, request.to_draft())
            .await?
            .ok_or_else(|| AppError::not_found("College", id))?;
        tracing::info!(id, "college updated");
        self.college(id).await
    }

    pub async fn update_department(
        &self,
        id: i32,
        request: &DepartmentRequest,
    ) -> AppResult<DepartmentView> {
        let college_id = department_college(request)?;
        if !self.departments.exists(id).await? {
            return Err(AppError::not_found("Department", id));
        }
        self.require_college_exists(college_id).await?;

        let department = self
            .departments
            .update(id, request.to_draft(college_id))
            .await?
            .ok_or_else(|| AppError::not_found("Department", id))?;
        tracing::info!(id, "department updated");
        Ok(DepartmentView::from(&department))
    }

    /// Updates a branch of `university_id`. A branch owned by another
    /// university is rejected rather than moved.
    pub async fn update_branch(
        &self,
        university_id: i32,
        branch_id: i32,
        request: &BranchRequest,
    ) -> AppResult<BranchView> {
        self.require_university_exists(university_id).await?;

        let existing = self
            .branches
            .get_by_id(branch_id)
            .await?
            .ok_or_else(|| AppError::not_found("Branch", branch_id))?;
        if existing.university_id != university_id {
            return Err(AppError::Validation(
                "Branch does not belong to the specified university".into(),
            ));
        }

        let branch = self
            .branches
            .update(branch_id, request.to_draft(university_id))
            .await?
            .ok_or_else(|| AppError::not_found("Branch", branch_id))?;
        tracing::info!(id = branch_id, university_id, "branch updated");
        Ok(BranchView::from(&branch))
    }

    // --- Deletes ---
    //
    // Hard deletes; the foreign keys cascade to owned rows.

    pub async fn delete_university(&self, id: i32) -> AppResult<bool> {
        let deleted = self.universities.delete(id).await?;
        if deleted {
            tracing::info!(id, "university deleted");
        }
        Ok(deleted)
    }

    pub async fn delete_college(&self, id: i32) -> AppResult<bool> {
        let deleted = self.colleges.delete(id).await?;
        if deleted {
            tracing::info!(id, "college deleted");
        }
        Ok(deleted)
    }

    pub async fn delete_department(&self, id: i32) -> AppResult<bool> {
        let deleted = self.departments.delete(id).await?;
        if deleted {
            tracing::info!(id, "department deleted");
        }
        Ok(deleted)
    }

    pub async fn delete_branch(&self, id: i32) -> AppResult<bool> {
        let deleted = self.branches.delete(id).await?;
        if deleted {
            tracing::info!(id, "branch deleted");
        }
        Ok(deleted)
    }

    // --- Helpers ---

    /// Summary projections with college and branch counts loaded in two
    /// batch queries.
    async fn summaries(&self, universities: &[University]) -> AppResult<Vec<UniversityView>> {
        if universities.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = universities.iter().map(|u| u.id).collect();
        let college_counts = self.colleges.counts_by_university_ids(&ids).await?;
        let branch_counts = self.universities.branch_counts(&ids).await?;

        Ok(universities
            .iter()
            .map(|university| {
                UniversityView::summary(
                    university,
                    count_for(&college_counts, university.id),
                    count_for(&branch_counts, university.id),
                )
            })
            .collect())
    }

    async fn require_university(&self, id: i32) -> AppResult<University> {
        self.universities
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("University", id))
    }

    async fn require_university_exists(&self, id: i32) -> AppResult<()> {
        if self.universities.exists(id).await? {
            Ok(())
        } else {
            Err(AppError::not_found("University", id))
        }
    }

    async fn require_college_exists(&self, id: i32) -> AppResult<()> {
        if self.colleges.exists(id).await? {
            Ok(())
        } else {
            Err(AppError::not_found("College", id))
        }
    }
}

fn count_for(counts: &HashMap<i32, i64>, id: i32) -> i64 {
    counts.get(&id).copied().unwrap_or(0)
}

fn department_college(request: &DepartmentRequest) -> AppResult<i32> {
    request
        .college_id
        .ok_or_else(|| AppError::Validation("College ID is required".into()))
}
