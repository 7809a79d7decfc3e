use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use tansiqy::{
    AppConfig, AppError, AppState, MemoryRepository, Repositories,
    auth::{AdminUser, AuthUser},
    handlers::{ValidJson, colleges, news, universities},
    models::{
        BranchRequest, CollegeRequest, DepartmentRequest, Governorate, NameSearchParams,
        NewsRequest, University, UniversityRequest, UniversitySearchParams, UniversityType,
        UserRequest, UserRole,
    },
    repository::UniversityRepository,
};

// --- Test State ---

// Handlers depend on the repository traits only, so the in-memory store
// stands in for Postgres. The store handle is returned alongside the state
// to let tests reach rows the API cannot (soft-deleted ones).
fn test_state() -> (AppState, Arc<MemoryRepository>) {
    let store = Arc::new(MemoryRepository::new());
    let state = AppState::new(Repositories::memory(store.clone()), AppConfig::default());
    (state, store)
}

fn admin() -> AdminUser {
    AdminUser(AuthUser {
        id: 1,
        email: "admin@tansiqy.test".to_string(),
        full_name: Some("Admin".to_string()),
        role: UserRole::Admin,
    })
}

fn university_request(name: &str, university_type: i32, governorate: i32) -> UniversityRequest {
    serde_json::from_value(json!({
        "nameAr": name,
        "type": university_type,
        "governorate": governorate
    }))
    .expect("valid university payload")
}

fn college_request(university_id: i32, name: &str) -> CollegeRequest {
    serde_json::from_value(json!({
        "nameAr": name,
        "universityId": university_id
    }))
    .expect("valid college payload")
}

fn branch_request(id: Option<i32>, name: &str) -> BranchRequest {
    serde_json::from_value(json!({ "id": id, "nameAr": name, "governorate": 2 }))
        .expect("valid branch payload")
}

async fn seed_university(state: &AppState, name: &str, university_type: i32) -> i32 {
    state
        .universities
        .create_university(&university_request(name, university_type, 1))
        .await
        .expect("seed university")
        .id
}

fn status_of(err: AppError) -> StatusCode {
    err.into_response().status()
}

// --- Public Reads ---

#[tokio::test]
async fn test_university_types_lists_every_type_with_counts() {
    let (state, _) = test_state();
    seed_university(&state, "جامعة القاهرة", 1).await;
    seed_university(&state, "جامعة الإسكندرية", 1).await;
    seed_university(&state, "الجامعة الأمريكية", 2).await;

    let Json(types) = universities::get_university_types(State(state)).await.unwrap();

    assert_eq!(types.len(), UniversityType::ALL.len());
    assert_eq!(types[0].university_type, UniversityType::Governmental);
    assert_eq!(types[0].total_universities, 2);
    assert_eq!(types[1].total_universities, 1);
    // Empty buckets are still listed
    assert_eq!(types[5].total_universities, 0);
    assert_eq!(types[5].type_name_ar, "جامعات تكنولوجية");
}

#[tokio::test]
async fn test_universities_by_type_rejects_unknown_code() {
    let (state, _) = test_state();

    let err = universities::get_universities_by_type(State(state), Path(9))
        .await
        .unwrap_err();

    match err {
        AppError::Validation(message) => {
            assert!(message.starts_with("Invalid university type 9."));
            assert!(message.contains("1=Governmental"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_universities_by_type_fills_counts() {
    let (state, _) = test_state();
    let id = seed_university(&state, "جامعة عين شمس", 1).await;
    state
        .universities
        .create_college(&college_request(id, "كلية الطب"))
        .await
        .unwrap();
    state
        .universities
        .create_branch(id, &branch_request(None, "فرع العبور"))
        .await
        .unwrap();

    let Json(list) = universities::get_universities_by_type(State(state), Path(1))
        .await
        .unwrap();

    assert_eq!(list.len(), 1);
    assert_eq!(list[0].colleges_count, 1);
    assert_eq!(list[0].branches_count, 1);
    // Summaries never embed children
    assert!(list[0].colleges.is_empty());
}

#[tokio::test]
async fn test_get_university_missing_returns_404() {
    let (state, _) = test_state();

    let err = universities::get_university(State(state), Path(404))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "University with ID 404 not found");
    assert_eq!(status_of(err), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_soft_deleted_university_is_invisible_everywhere() {
    let (state, store) = test_state();
    let id = seed_university(&state, "جامعة محذوفة", 2).await;
    assert!(store.mark_deleted::<University>(id));

    let err = universities::get_university(State(state.clone()), Path(id))
        .await
        .unwrap_err();
    assert_eq!(status_of(err), StatusCode::NOT_FOUND);

    let Json(types) = universities::get_university_types(State(state.clone()))
        .await
        .unwrap();
    assert_eq!(types[1].total_universities, 0);

    let Json(found) = universities::search_universities_by_name(
        State(state.clone()),
        Query(NameSearchParams {
            search_term: Some("محذوفة".to_string()),
        }),
    )
    .await
    .unwrap();
    assert!(found.is_empty());

    // A deleted parent cannot receive children
    let err = state
        .universities
        .create_college(&college_request(id, "كلية"))
        .await
        .unwrap_err();
    assert_eq!(status_of(err), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_by_name_blank_term_matches_nothing() {
    let (state, _) = test_state();
    seed_university(&state, "جامعة حلوان", 1).await;

    let Json(found) = universities::search_universities_by_name(
        State(state),
        Query(NameSearchParams {
            search_term: Some("   ".to_string()),
        }),
    )
    .await
    .unwrap();

    assert!(found.is_empty());
}

#[tokio::test]
async fn test_search_combines_filters_and_narrows_colleges() {
    let (state, _) = test_state();
    let cairo = seed_university(&state, "جامعة القاهرة", 1).await;
    let private = seed_university(&state, "جامعة مصر الدولية", 2).await;

    let medicine: CollegeRequest = serde_json::from_value(json!({
        "nameAr": "كلية الطب",
        "nameEn": "Faculty of Medicine",
        "universityId": cairo,
        "departments": [{ "nameAr": "الجراحة", "studyType": 2 }]
    }))
    .unwrap();
    state.universities.create_college(&medicine).await.unwrap();
    state
        .universities
        .create_college(&college_request(cairo, "كلية الحقوق"))
        .await
        .unwrap();
    state
        .universities
        .create_college(&college_request(private, "كلية الطب"))
        .await
        .unwrap();

    let params = UniversitySearchParams {
        study_type: Some(2),
        college_name: Some("medicine".to_string()),
        ..UniversitySearchParams::default()
    };
    let Json(results) = universities::search_universities(State(state.clone()), Ok(Query(params)))
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, cairo);
    // Only the matching college is embedded, with its departments
    assert_eq!(results[0].colleges.len(), 1);
    assert_eq!(results[0].colleges[0].name_ar, "كلية الطب");
    assert_eq!(results[0].colleges[0].departments.len(), 1);

    let params = UniversitySearchParams {
        university_type: Some(2),
        ..UniversitySearchParams::default()
    };
    let Json(results) = universities::search_universities(State(state), Ok(Query(params)))
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, private);
}

async fn seed_priced(state: &AppState, name: &str, fees: Option<i64>, coordination: Option<i64>) -> i32 {
    let request: UniversityRequest = serde_json::from_value(json!({
        "nameAr": name,
        "type": 2,
        "governorate": 1,
        "fees": fees,
        "lastYearCoordination": coordination
    }))
    .expect("valid university payload");
    state
        .universities
        .create_university(&request)
        .await
        .expect("seed university")
        .id
}

async fn search_ids(state: &AppState, params: UniversitySearchParams) -> Vec<i32> {
    let Json(results) = universities::search_universities(State(state.clone()), Ok(Query(params)))
        .await
        .unwrap();
    results.iter().map(|u| u.id).collect()
}

#[tokio::test]
async fn test_range_filters_are_inclusive_and_skip_missing_values() {
    let (state, _) = test_state();
    let unpriced = seed_priced(&state, "جامعة بلا بيانات", None, None).await;
    let cheaper = seed_priced(&state, "جامعة اقتصادية", Some(20000), Some(60)).await;
    let boundary = seed_priced(&state, "جامعة على الحد", Some(50000), Some(80)).await;
    let pricier = seed_priced(&state, "جامعة مرتفعة", Some(120000), Some(95)).await;

    let fees = UniversitySearchParams {
        min_fees: Some(Decimal::from(50000)),
        max_fees: Some(Decimal::from(100000)),
        ..UniversitySearchParams::default()
    };
    assert_eq!(search_ids(&state, fees).await, vec![boundary]);

    // Upper bounds include the bound itself and still exclude NULL fees
    let fees = UniversitySearchParams {
        max_fees: Some(Decimal::from(120000)),
        ..UniversitySearchParams::default()
    };
    assert_eq!(search_ids(&state, fees).await, vec![cheaper, boundary, pricier]);

    let coordination = UniversitySearchParams {
        min_coordination: Some(Decimal::from(80)),
        max_coordination: Some(Decimal::from(90)),
        ..UniversitySearchParams::default()
    };
    assert_eq!(search_ids(&state, coordination).await, vec![boundary]);

    let coordination = UniversitySearchParams {
        min_coordination: Some(Decimal::ZERO),
        ..UniversitySearchParams::default()
    };
    let ids = search_ids(&state, coordination).await;
    assert_eq!(ids, vec![cheaper, boundary, pricier]);
    assert!(!ids.contains(&unpriced));

    // Without range filters the unpriced row is listed
    assert_eq!(search_ids(&state, UniversitySearchParams::default()).await.len(), 4);
}

#[tokio::test]
async fn test_university_colleges_carry_back_reference() {
    let (state, _) = test_state();
    let id = seed_university(&state, "جامعة أسيوط", 1).await;
    state
        .universities
        .create_college(&college_request(id, "كلية العلوم"))
        .await
        .unwrap();

    let Json(list) = universities::get_university_colleges(State(state.clone()), Path(id))
        .await
        .unwrap();
    assert_eq!(list.len(), 1);
    let back = list[0].university.as_ref().expect("back-reference");
    assert_eq!(back.id, id);
    assert_eq!(back.name_ar, "جامعة أسيوط");

    let err = universities::get_university_colleges(State(state), Path(id + 100))
        .await
        .unwrap_err();
    assert_eq!(status_of(err), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_universities_by_governorate_skips_other_regions() {
    let (state, store) = test_state();
    let giza = state
        .universities
        .create_university(&university_request("جامعة الجيزة", 1, 3))
        .await
        .unwrap();
    seed_university(&state, "جامعة القاهرة", 1).await;
    let hidden = state
        .universities
        .create_university(&university_request("جامعة 6 أكتوبر", 2, 3))
        .await
        .unwrap();
    store.mark_deleted::<University>(hidden.id);

    let found = state
        .repos
        .universities
        .get_by_governorate(Governorate::Giza)
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, giza.id);
}

// --- Admin: Universities ---

#[tokio::test]
async fn test_create_university_returns_201_with_location_and_branches() {
    let (state, _) = test_state();
    let request: UniversityRequest = serde_json::from_value(json!({
        "nameAr": "جامعة بنها",
        "type": 1,
        "governorate": 10,
        "branches": [
            { "nameAr": "فرع شبرا", "governorate": 1 },
            { "nameAr": "فرع مشتهر", "governorate": 10 }
        ]
    }))
    .unwrap();

    let response =
        universities::create_university(admin(), State(state.clone()), ValidJson(request))
            .await
            .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("Location header")
        .to_string();
    assert!(location.starts_with("/api/universities/"));

    let id: i32 = location.trim_start_matches("/api/universities/").parse().unwrap();
    let Json(view) = universities::get_university(State(state), Path(id)).await.unwrap();
    assert_eq!(view.branches_count, 2);
    assert_eq!(view.branches.len(), 2);
}

#[tokio::test]
async fn test_put_university_requires_body_id() {
    let (state, _) = test_state();

    let err = universities::update_university(
        admin(),
        State(state),
        ValidJson(university_request("جامعة", 1, 1)),
    )
    .await
    .unwrap_err();

    assert_eq!(err.to_string(), "University ID is required");
    assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_patch_university_route_id_wins_over_body() {
    let (state, _) = test_state();
    let target = seed_university(&state, "جامعة طنطا", 1).await;
    let other = seed_university(&state, "جامعة المنوفية", 1).await;

    let mut request = university_request("جامعة طنطا الجديدة", 1, 8);
    request.id = Some(other);

    let Json(view) =
        universities::patch_university(admin(), State(state.clone()), Path(target), ValidJson(request))
            .await
            .unwrap();
    assert_eq!(view.id, target);
    assert_eq!(view.name_ar, "جامعة طنطا الجديدة");

    let Json(untouched) = universities::get_university(State(state), Path(other))
        .await
        .unwrap();
    assert_eq!(untouched.name_ar, "جامعة المنوفية");
}

#[tokio::test]
async fn test_delete_university_cascades_and_second_delete_is_404() {
    let (state, _) = test_state();
    let id = seed_university(&state, "جامعة الزقازيق", 1).await;
    let college = state
        .universities
        .create_college(&college_request(id, "كلية التجارة"))
        .await
        .unwrap();

    let Json(message) = universities::delete_university(admin(), State(state.clone()), Path(id))
        .await
        .unwrap();
    assert_eq!(message.message, "University deleted successfully");

    let err = colleges::get_college(State(state.clone()), Path(college.id))
        .await
        .unwrap_err();
    assert_eq!(status_of(err), StatusCode::NOT_FOUND);

    let err = universities::delete_university(admin(), State(state), Path(id))
        .await
        .unwrap_err();
    assert_eq!(status_of(err), StatusCode::NOT_FOUND);
}

// --- Admin: Colleges & Departments ---

#[tokio::test]
async fn test_create_college_for_missing_university_is_404() {
    let (state, _) = test_state();

    let err = colleges::create_college(admin(), State(state), ValidJson(college_request(77, "كلية")))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "University with ID 77 not found");
    assert_eq!(status_of(err), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_college_with_departments() {
    let (state, _) = test_state();
    let id = seed_university(&state, "جامعة المنصورة", 1).await;
    let request: CollegeRequest = serde_json::from_value(json!({
        "nameAr": "كلية الهندسة",
        "universityId": id,
        "feesPerHour": 400,
        "minimumHoursPerSemester": 12,
        "departments": [
            { "nameAr": "الهندسة المدنية", "studyType": 1 },
            { "nameAr": "الهندسة المعمارية" }
        ]
    }))
    .unwrap();

    let response = colleges::create_college(admin(), State(state.clone()), ValidJson(request))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let Json(list) = universities::get_university_colleges(State(state.clone()), Path(id))
        .await
        .unwrap();
    let college_id = list[0].id;

    let Json(view) = colleges::get_college(State(state), Path(college_id)).await.unwrap();
    assert_eq!(view.departments_count, 2);
    assert_eq!(view.minimum_hours_per_semester, Some(12));
    assert_eq!(view.university.as_ref().map(|u| u.id), Some(id));
}

#[tokio::test]
async fn test_update_college_checks_college_then_university() {
    let (state, _) = test_state();
    let id = seed_university(&state, "جامعة سوهاج", 1).await;
    let college = state
        .universities
        .create_college(&college_request(id, "كلية الآداب"))
        .await
        .unwrap();

    // Unknown college
    let mut request = college_request(id, "كلية الآداب");
    request.id = Some(college.id + 50);
    let err = colleges::update_college(admin(), State(state.clone()), ValidJson(request))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), format!("College with ID {} not found", college.id + 50));

    // Known college moved to an unknown university
    let mut request = college_request(id + 50, "كلية الآداب");
    request.id = Some(college.id);
    let err = colleges::update_college(admin(), State(state), ValidJson(request))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), format!("University with ID {} not found", id + 50));
}

#[tokio::test]
async fn test_create_department_validates_parent_college() {
    let (state, _) = test_state();
    let request: DepartmentRequest = serde_json::from_value(json!({
        "nameAr": "قسم الرياضيات",
        "collegeId": 999
    }))
    .unwrap();

    let err = universities::create_department(admin(), State(state), ValidJson(request))
        .await
        .unwrap_err();

    assert_eq!(status_of(err), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_department_location_points_at_college() {
    let (state, _) = test_state();
    let id = seed_university(&state, "جامعة الفيوم", 1).await;
    let college = state
        .universities
        .create_college(&college_request(id, "كلية العلوم"))
        .await
        .unwrap();
    let request: DepartmentRequest = serde_json::from_value(json!({
        "nameAr": "قسم الكيمياء",
        "collegeId": college.id,
        "studyType": 2
    }))
    .unwrap();

    let response = universities::create_department(admin(), State(state), ValidJson(request))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        format!("/api/colleges/{}", college.id).as_str()
    );
}

// --- Admin: Branches ---

#[tokio::test]
async fn test_update_branch_of_another_university_is_rejected() {
    let (state, _) = test_state();
    let owner = seed_university(&state, "جامعة جنوب الوادي", 1).await;
    let other = seed_university(&state, "جامعة أسوان", 1).await;
    let branch = state
        .universities
        .create_branch(owner, &branch_request(None, "فرع الغردقة"))
        .await
        .unwrap();

    let err = universities::update_branch(
        admin(),
        State(state.clone()),
        Path(other),
        ValidJson(branch_request(Some(branch.id), "فرع الغردقة")),
    )
    .await
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Branch does not belong to the specified university"
    );
    assert_eq!(status_of(err), StatusCode::BAD_REQUEST);

    let Json(updated) = universities::patch_branch(
        admin(),
        State(state),
        Path((owner, branch.id)),
        ValidJson(branch_request(None, "فرع الغردقة الجديد")),
    )
    .await
    .unwrap();
    assert_eq!(updated.name_ar, "فرع الغردقة الجديد");
    assert_eq!(updated.university_id, owner);
}

#[tokio::test]
async fn test_delete_branch_missing_is_404() {
    let (state, _) = test_state();

    let err = universities::delete_branch(admin(), State(state), Path(5))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Branch with ID 5 not found");
}

// --- News ---

#[tokio::test]
async fn test_news_list_is_newest_first() {
    let (state, _) = test_state();
    for (title, date) in [
        ("قديم", "2024-07-01T00:00:00Z"),
        ("أحدث", "2024-08-15T00:00:00Z"),
        ("وسط", "2024-07-20T00:00:00Z"),
    ] {
        let request: NewsRequest = serde_json::from_value(json!({
            "title": title,
            "date": date,
            "description": "نص الخبر"
        }))
        .unwrap();
        news::create_news(admin(), State(state.clone()), ValidJson(request))
            .await
            .unwrap();
    }

    let Json(items) = news::get_news(State(state)).await.unwrap();
    let titles: Vec<&str> = items.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, vec!["أحدث", "وسط", "قديم"]);
}

#[tokio::test]
async fn test_delete_news_missing_is_404() {
    let (state, _) = test_state();

    let err = news::delete_news(admin(), State(state), Path(12))
        .await
        .unwrap_err();

    assert_eq!(status_of(err), StatusCode::NOT_FOUND);
}

// --- Users ---

fn user_request(email: &str, password: Option<&str>) -> UserRequest {
    UserRequest {
        email: email.to_string(),
        full_name: Some("مستخدم".to_string()),
        password: password.map(str::to_string),
        role: UserRole::Student,
        is_active: true,
    }
}

#[tokio::test]
async fn test_user_email_must_be_unique_case_insensitively() {
    let (state, _) = test_state();
    state
        .users
        .create(&user_request("student@tansiqy.test", Some("secret1")))
        .await
        .unwrap();

    let err = state
        .users
        .create(&user_request("STUDENT@tansiqy.test", Some("secret2")))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(status_of(err), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_user_soft_delete_hides_account_and_frees_email() {
    let (state, _) = test_state();
    let created = state
        .users
        .create(&user_request("leaver@tansiqy.test", Some("secret1")))
        .await
        .unwrap();

    assert!(state.users.delete(created.id).await.unwrap());
    assert!(!state.users.delete(created.id).await.unwrap());

    let err = state.users.get(created.id).await.unwrap_err();
    assert_eq!(status_of(err), StatusCode::NOT_FOUND);
    assert!(state.users.list().await.unwrap().is_empty());

    state
        .users
        .create(&user_request("leaver@tansiqy.test", Some("secret2")))
        .await
        .expect("email of a deleted account can be reused");
}

#[tokio::test]
async fn test_user_update_without_password_keeps_credentials() {
    let (state, _) = test_state();
    let created = state
        .users
        .create(&user_request("keeper@tansiqy.test", Some("original-pass")))
        .await
        .unwrap();

    let mut request = user_request("keeper@tansiqy.test", None);
    request.full_name = Some("اسم جديد".to_string());
    request.role = UserRole::Admin;
    let updated = state.users.update(created.id, &request).await.unwrap();
    assert_eq!(updated.full_name.as_deref(), Some("اسم جديد"));
    assert_eq!(updated.role, UserRole::Admin);

    state
        .auth
        .login("keeper@tansiqy.test", "original-pass")
        .await
        .expect("old password still valid");
}
