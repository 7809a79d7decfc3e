use axum::response::Html;

use super::{error_banner, escape, layout, opt_text, options, text_input};
use crate::{auth::AuthUser, models::{UserRole, UserView}, pages::forms::UserForm};

fn user_row(user: &UserView) -> String {
    let last_login = user
        .last_login_at
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "لم يسجل الدخول".to_string());
    format!(
        "<tr><td>{email}</td><td>{name}</td><td>{role}</td><td>{active}</td><td>{last_login}</td>\
<td><a class=\"btn btn-sm btn-secondary\" href=\"/users/{id}/edit\">تعديل</a>\
<form method=\"post\" action=\"/users/{id}/delete\" class=\"d-inline\">\
<button class=\"btn btn-sm btn-danger\" type=\"submit\">حذف</button></form></td></tr>",
        id = user.id,
        email = escape(&user.email),
        name = opt_text(user.full_name.as_deref()),
        role = escape(&user.role_ar),
        active = if user.is_active { "نشط" } else { "موقوف" },
    )
}

pub fn list(users: &[UserView], current: &AuthUser) -> Html<String> {
    layout(
        "المستخدمون",
        Some(current),
        &format!(
            "<h1>المستخدمون</h1><a class=\"btn btn-primary\" href=\"/users/create\">إضافة مستخدم</a>\
<table class=\"table\"><thead><tr><th>البريد الإلكتروني</th><th>الاسم</th><th>الدور</th>\
<th>الحالة</th><th>آخر دخول</th><th></th></tr></thead><tbody>{}</tbody></table>",
            users.iter().map(user_row).collect::<String>()
        ),
    )
}

/// Create or edit account form. On edit an empty password keeps the
/// current one.
pub fn form(
    title: &str,
    action: &str,
    form: &UserForm,
    editing: bool,
    error: Option<&str>,
    current: &AuthUser,
) -> Html<String> {
    let password_label = if editing {
        "كلمة المرور (اتركه فارغاً إذا لم ترد تغييره)"
    } else {
        "كلمة المرور *"
    };
    let checked = if form.is_active.is_some() { " checked" } else { "" };

    layout(
        title,
        Some(current),
        &format!(
            "<h1>{}</h1>{}<form method=\"post\" action=\"{}\">{}{}{}\
<div class=\"mb-3\"><label class=\"form-label\" for=\"role\">الدور *</label>\
<select class=\"form-select\" id=\"role\" name=\"role\">{}</select></div>\
<div class=\"form-check\"><input class=\"form-check-input\" type=\"checkbox\" id=\"isActive\" \
name=\"isActive\" value=\"true\"{checked}><label class=\"form-check-label\" for=\"isActive\">نشط</label></div>\
<button class=\"btn btn-primary\" type=\"submit\">حفظ</button></form>",
            escape(title),
            error_banner(error),
            escape(action),
            text_input("email", "البريد الإلكتروني *", &form.email, "email"),
            text_input("fullName", "الاسم الكامل", &form.full_name, "text"),
            text_input("password", password_label, "", "password"),
            options(UserRole::ALL, UserRole::label, &form.role),
        ),
    )
}
