use axum::response::Html;

use super::{error_banner, escape, layout, options, text_area, text_input};
use crate::{
    auth::AuthUser,
    models::{Governorate, UniversityType},
    pages::forms::{CollegeForm, UniversityForm},
};

fn select(name: &str, label: &str, choices: String) -> String {
    format!(
        "<div class=\"mb-3\"><label class=\"form-label\" for=\"{name}\">{label}</label>\
<select class=\"form-select\" id=\"{name}\" name=\"{name}\" required>\
<option value=\"\">اختر</option>{choices}</select></div>"
    )
}

/// Create or edit form for a university; `action` is the POST target.
pub fn university_form(
    title: &str,
    action: &str,
    form: &UniversityForm,
    error: Option<&str>,
    user: Option<&AuthUser>,
) -> Html<String> {
    let fields = [
        text_input("nameAr", "الاسم بالعربية *", &form.name_ar, "text"),
        text_input("nameEn", "الاسم بالإنجليزية", &form.name_en, "text"),
        select(
            "type",
            "نوع الجامعة *",
            options(UniversityType::ALL, UniversityType::label, &form.university_type),
        ),
        select(
            "governorate",
            "المحافظة *",
            options(Governorate::ALL, Governorate::label, &form.governorate),
        ),
        text_input("officialWebsite", "الموقع الرسمي", &form.official_website, "url"),
        text_input("location", "العنوان", &form.location, "text"),
        text_input(
            "lastYearCoordination",
            "تنسيق العام الماضي (%)",
            &form.last_year_coordination,
            "number",
        ),
        text_input("fees", "المصروفات", &form.fees, "number"),
        text_area(
            "informationSources",
            "مصادر المعلومات",
            &form.information_sources,
        ),
        text_area("description", "الوصف", &form.description),
    ]
    .concat();

    layout(
        title,
        user,
        &format!(
            "<h1>{}</h1>{}<form method=\"post\" action=\"{}\">{fields}\
<button class=\"btn btn-primary\" type=\"submit\">حفظ</button></form>",
            escape(title),
            error_banner(error),
            escape(action)
        ),
    )
}

/// Create or edit form for a college.
pub fn college_form(
    title: &str,
    action: &str,
    form: &CollegeForm,
    error: Option<&str>,
    user: Option<&AuthUser>,
) -> Html<String> {
    let fields = [
        format!(
            "<input type=\"hidden\" name=\"universityId\" value=\"{}\">",
            escape(&form.university_id)
        ),
        text_input("nameAr", "الاسم بالعربية *", &form.name_ar, "text"),
        text_input("nameEn", "الاسم بالإنجليزية", &form.name_en, "text"),
        text_input("officialWebsite", "الموقع الرسمي", &form.official_website, "url"),
        text_input("location", "العنوان", &form.location, "text"),
        text_input("fees", "المصروفات", &form.fees, "number"),
        text_input(
            "lastYearCoordination",
            "تنسيق العام الماضي (%)",
            &form.last_year_coordination,
            "number",
        ),
        text_input("feesCategoryA", "مصروفات الفئة أ", &form.fees_category_a, "number"),
        text_input("feesCategoryB", "مصروفات الفئة ب", &form.fees_category_b, "number"),
        text_input("feesCategoryC", "مصروفات الفئة ج", &form.fees_category_c, "number"),
        text_input("feesPerHour", "سعر الساعة المعتمدة", &form.fees_per_hour, "number"),
        text_input(
            "minimumHoursPerSemester",
            "الحد الأدنى للساعات في الفصل",
            &form.minimum_hours_per_semester,
            "number",
        ),
        text_input("additionalFees", "مصروفات إضافية", &form.additional_fees, "number"),
        text_area("description", "الوصف", &form.description),
    ]
    .concat();

    layout(
        title,
        user,
        &format!(
            "<h1>{}</h1>{}<form method=\"post\" action=\"{}\">{fields}\
<button class=\"btn btn-primary\" type=\"submit\">حفظ</button></form>",
            escape(title),
            error_banner(error),
            escape(action)
        ),
    )
}
