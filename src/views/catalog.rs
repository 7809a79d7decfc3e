use axum::response::Html;

use super::{
    detail_row, escape, layout, list_or_empty, money, opt_text, options, score, text_input,
};
use crate::{
    auth::AuthUser,
    models::{
        BranchView, CollegeView, DepartmentView, Governorate, NewsView, StudyType,
        UniversitySearchParams, UniversityType, UniversityTypeView, UniversityView,
    },
};

fn is_admin(user: Option<&AuthUser>) -> bool {
    user.is_some_and(AuthUser::is_admin)
}

fn type_cards(types: &[UniversityTypeView]) -> String {
    types
        .iter()
        .map(|t| {
            format!(
                "<div class=\"card\"><a href=\"/universities?type={}\"><h3>{}</h3>\
<p>{} جامعة</p></a></div>",
                t.university_type.code(),
                escape(&t.type_name_ar),
                t.total_universities
            )
        })
        .collect()
}

fn news_item(news: &NewsView) -> String {
    format!(
        "<article class=\"news\"><h4>{}</h4><time>{}</time><p>{}</p></article>",
        escape(&news.title),
        news.date.format("%Y-%m-%d"),
        escape(&news.description)
    )
}

pub fn home(
    types: &[UniversityTypeView],
    news: &[NewsView],
    user: Option<&AuthUser>,
) -> Html<String> {
    let total: i64 = types.iter().map(|t| t.total_universities).sum();
    layout(
        "الرئيسية",
        user,
        &format!(
            "<section class=\"hero\"><h1>تنسيقي</h1>\
<p>دليلك إلى {total} جامعة ومعهد في مصر</p>\
<a class=\"btn btn-primary\" href=\"/universities/search\">ابحث عن جامعتك</a></section>\
<section><h2>أنواع الجامعات</h2><div class=\"grid\">{}</div></section>\
<section><h2>آخر الأخبار</h2>{}</section>",
            type_cards(types),
            list_or_empty(news, "لا توجد أخبار حالياً", news_item)
        ),
    )
}

pub fn select_type(types: &[UniversityTypeView], user: Option<&AuthUser>) -> Html<String> {
    layout(
        "اختر نوع الجامعة",
        user,
        &format!(
            "<h1>اختر نوع الجامعة</h1><div class=\"grid\">{}</div>",
            type_cards(types)
        ),
    )
}

fn university_card(university: &UniversityView) -> String {
    format!(
        "<div class=\"card\"><h3><a href=\"/universities/{id}\">{name}</a></h3>\
<p>{governorate}</p><p>الكليات: {colleges} | الفروع: {branches}</p>\
<p>المصروفات: {fees}</p><p>تنسيق العام الماضي: {coordination}</p></div>",
        id = university.id,
        name = escape(&university.name_ar),
        governorate = escape(&university.governorate_ar),
        colleges = university.colleges_count,
        branches = university.branches_count,
        fees = money(university.fees),
        coordination = score(university.last_year_coordination),
    )
}

pub fn universities_by_type(
    university_type: UniversityType,
    universities: &[UniversityView],
    user: Option<&AuthUser>,
) -> Html<String> {
    let title = university_type.label();
    layout(
        title,
        user,
        &format!(
            "<h1>{title}</h1><div class=\"grid\">{}</div>",
            list_or_empty(
                universities,
                "لا توجد جامعات من هذا النوع حالياً",
                university_card
            )
        ),
    )
}

fn branch_row(branch: &BranchView) -> String {
    format!(
        "<li>{} ({}){}</li>",
        escape(&branch.name_ar),
        escape(&branch.governorate_ar),
        branch
            .location
            .as_deref()
            .map(|l| format!(" - {}", escape(l)))
            .unwrap_or_default()
    )
}

fn college_card(college: &CollegeView) -> String {
    format!(
        "<div class=\"card\"><h3><a href=\"/colleges/{}\">{}</a></h3>\
<p>الأقسام: {}</p><p>المصروفات: {}</p><p>تنسيق العام الماضي: {}</p></div>",
        college.id,
        escape(&college.name_ar),
        college.departments_count,
        money(college.fees),
        score(college.last_year_coordination)
    )
}

pub fn university_details(university: &UniversityView, user: Option<&AuthUser>) -> Html<String> {
    let admin_actions = if is_admin(user) {
        format!(
            "<div class=\"actions\">\
<a class=\"btn btn-secondary\" href=\"/universities/{id}/edit\">تعديل</a>\
<a class=\"btn btn-secondary\" href=\"/universities/{id}/colleges/create\">إضافة كلية</a>\
<form method=\"post\" action=\"/universities/{id}/delete\" class=\"d-inline\">\
<button class=\"btn btn-danger\" type=\"submit\">حذف</button></form></div>",
            id = university.id
        )
    } else {
        String::new()
    };

    let website = university
        .official_website
        .as_deref()
        .map(|w| format!("<a href=\"{0}\" rel=\"noopener\">{0}</a>", escape(w)))
        .unwrap_or_else(|| opt_text(None));

    layout(
        &university.name_ar,
        user,
        &format!(
            "<h1>{name}</h1>{name_en}{admin_actions}<table class=\"table\">{rows}</table>\
{description}<h2>الفروع</h2><ul>{branches}</ul>\
<h2>الكليات <a href=\"/universities/{id}/colleges\">(عرض الكل)</a></h2><div class=\"grid\">{colleges}</div>",
            id = university.id,
            name = escape(&university.name_ar),
            name_en = university
                .name_en
                .as_deref()
                .map(|n| format!("<h2 class=\"text-muted\">{}</h2>", escape(n)))
                .unwrap_or_default(),
            rows = [
                detail_row("النوع", escape(&university.type_ar)),
                detail_row("المحافظة", escape(&university.governorate_ar)),
                detail_row("العنوان", opt_text(university.location.as_deref())),
                detail_row("الموقع الرسمي", website),
                detail_row("المصروفات", money(university.fees)),
                detail_row("تنسيق العام الماضي", score(university.last_year_coordination)),
                detail_row(
                    "مصادر المعلومات",
                    opt_text(university.information_sources.as_deref())
                ),
            ]
            .concat(),
            description = university
                .description
                .as_deref()
                .map(|d| format!("<p>{}</p>", escape(d)))
                .unwrap_or_default(),
            branches = list_or_empty(&university.branches, "لا توجد فروع", branch_row),
            colleges = list_or_empty(&university.colleges, "لا توجد كليات", college_card),
        ),
    )
}

pub fn colleges(university: &UniversityView, user: Option<&AuthUser>) -> Html<String> {
    layout(
        &format!("كليات {}", university.name_ar),
        user,
        &format!(
            "<h1>كليات <a href=\"/universities/{}\">{}</a></h1><div class=\"grid\">{}</div>",
            university.id,
            escape(&university.name_ar),
            list_or_empty(&university.colleges, "لا توجد كليات", college_card)
        ),
    )
}

fn department_row(department: &DepartmentView) -> String {
    format!(
        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
        escape(&department.name_ar),
        opt_text(department.name_en.as_deref()),
        opt_text(department.study_type_ar.as_deref()),
        opt_text(department.description.as_deref())
    )
}

fn departments_table(departments: &[DepartmentView]) -> String {
    if departments.is_empty() {
        return "<p class=\"text-muted\">لا توجد أقسام</p>".to_string();
    }
    format!(
        "<table class=\"table\"><thead><tr><th>القسم</th><th>الاسم بالإنجليزية</th>\
<th>الشعبة</th><th>الوصف</th></tr></thead><tbody>{}</tbody></table>",
        departments.iter().map(department_row).collect::<String>()
    )
}

fn university_link(college: &CollegeView) -> String {
    match &college.university {
        Some(u) => format!(
            "<p>الجامعة: <a href=\"/universities/{}\">{}</a> ({})</p>",
            u.id,
            escape(&u.name_ar),
            escape(&u.type_ar)
        ),
        None => String::new(),
    }
}

pub fn college_details(college: &CollegeView, user: Option<&AuthUser>) -> Html<String> {
    let admin_actions = if is_admin(user) {
        format!(
            "<div class=\"actions\"><a class=\"btn btn-secondary\" href=\"/colleges/{}/edit\">تعديل</a></div>",
            college.id
        )
    } else {
        String::new()
    };
    let hours = college
        .minimum_hours_per_semester
        .map(|h| h.to_string())
        .unwrap_or_else(|| opt_text(None));

    layout(
        &college.name_ar,
        user,
        &format!(
            "<h1>{name}</h1>{university}{admin_actions}<table class=\"table\">{rows}</table>\
{description}<h2>الأقسام <a href=\"/colleges/{id}/departments\">(عرض الكل)</a></h2>{departments}",
            id = college.id,
            name = escape(&college.name_ar),
            university = university_link(college),
            rows = [
                detail_row("الاسم بالإنجليزية", opt_text(college.name_en.as_deref())),
                detail_row("العنوان", opt_text(college.location.as_deref())),
                detail_row("المصروفات", money(college.fees)),
                detail_row("تنسيق العام الماضي", score(college.last_year_coordination)),
                detail_row("مصروفات الفئة أ", money(college.fees_category_a)),
                detail_row("مصروفات الفئة ب", money(college.fees_category_b)),
                detail_row("مصروفات الفئة ج", money(college.fees_category_c)),
                detail_row("سعر الساعة المعتمدة", money(college.fees_per_hour)),
                detail_row("الحد الأدنى للساعات في الفصل", hours),
                detail_row("مصروفات إضافية", money(college.additional_fees)),
            ]
            .concat(),
            description = college
                .description
                .as_deref()
                .map(|d| format!("<p>{}</p>", escape(d)))
                .unwrap_or_default(),
            departments = departments_table(&college.departments),
        ),
    )
}

pub fn departments(college: &CollegeView, user: Option<&AuthUser>) -> Html<String> {
    layout(
        &format!("أقسام {}", college.name_ar),
        user,
        &format!(
            "<h1>أقسام <a href=\"/colleges/{}\">{}</a></h1>{}{}",
            college.id,
            escape(&college.name_ar),
            university_link(college),
            departments_table(&college.departments)
        ),
    )
}

fn raw<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn search_form(params: &UniversitySearchParams) -> String {
    let select = |name: &str, label: &str, choices: String| {
        format!(
            "<div class=\"mb-3\"><label class=\"form-label\" for=\"{name}\">{label}</label>\
<select class=\"form-select\" id=\"{name}\" name=\"{name}\"><option value=\"\">الكل</option>{choices}</select></div>"
        )
    };
    [
        "<form method=\"get\" action=\"/universities/search\" class=\"search-form\">".to_string(),
        text_input(
            "searchTerm",
            "اسم الجامعة",
            params.search_term.as_deref().unwrap_or_default(),
            "text",
        ),
        select(
            "type",
            "نوع الجامعة",
            options(UniversityType::ALL, UniversityType::label, &raw(params.university_type)),
        ),
        select(
            "governorate",
            "المحافظة",
            options(Governorate::ALL, Governorate::label, &raw(params.governorate)),
        ),
        select(
            "studyType",
            "الشعبة",
            options(StudyType::ALL, StudyType::label, &raw(params.study_type)),
        ),
        text_input("minFees", "أقل مصروفات", &raw(params.min_fees), "number"),
        text_input("maxFees", "أعلى مصروفات", &raw(params.max_fees), "number"),
        text_input(
            "minCoordination",
            "أقل تنسيق",
            &raw(params.min_coordination),
            "number",
        ),
        text_input(
            "maxCoordination",
            "أعلى تنسيق",
            &raw(params.max_coordination),
            "number",
        ),
        text_input(
            "collegeName",
            "اسم الكلية",
            params.college_name.as_deref().unwrap_or_default(),
            "text",
        ),
        "<button class=\"btn btn-primary\" type=\"submit\">بحث</button></form>".to_string(),
    ]
    .concat()
}

fn search_result(university: &UniversityView) -> String {
    let colleges: String = university
        .colleges
        .iter()
        .map(|c| {
            format!(
                "<li><a href=\"/colleges/{}\">{}</a></li>",
                c.id,
                escape(&c.name_ar)
            )
        })
        .collect();
    format!(
        "{}<ul class=\"matching-colleges\">{colleges}</ul>",
        university_card(university)
    )
}

/// Search form, followed by results once any filter was submitted.
pub fn search(
    params: &UniversitySearchParams,
    results: Option<&[UniversityView]>,
    user: Option<&AuthUser>,
) -> Html<String> {
    let results = match results {
        Some(found) => format!(
            "<h2>النتائج ({})</h2><div class=\"grid\">{}</div>",
            found.len(),
            list_or_empty(found, "لا توجد نتائج مطابقة", search_result)
        ),
        None => String::new(),
    };
    layout(
        "البحث عن جامعة",
        user,
        &format!(
            "<h1>البحث عن جامعة</h1>{}{results}",
            search_form(params)
        ),
    )
}
