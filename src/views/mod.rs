//! HTML rendering for the front-end. Views are plain functions from view
//! models to markup; every piece of dynamic text goes through [`escape`].

use std::fmt::Display;

use axum::{http::StatusCode, response::Html};
use rust_decimal::Decimal;

use crate::auth::AuthUser;

pub mod account;
pub mod catalog;
pub mod forms;
pub mod users;

/// HTML-escapes text for element content and quoted attribute values.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Percent-encodes a value for use inside a query string.
pub fn encode_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

pub(crate) fn opt_text(value: Option<&str>) -> String {
    value.map(escape).unwrap_or_else(|| "غير متوفر".to_string())
}

pub(crate) fn money(value: Option<Decimal>) -> String {
    match value {
        Some(v) => format!("{} جنيه", v.normalize()),
        None => "غير محدد".to_string(),
    }
}

pub(crate) fn score(value: Option<Decimal>) -> String {
    match value {
        Some(v) => format!("{}%", v.normalize()),
        None => "غير محدد".to_string(),
    }
}

/// `<option>` list for a coded enum; `selected` is the raw form value.
pub(crate) fn options<T: Copy + Into<i32>>(
    all: &[T],
    label: impl Fn(T) -> &'static str,
    selected: &str,
) -> String {
    all.iter()
        .map(|&item| {
            let code: i32 = item.into();
            let marker = if selected == code.to_string() {
                " selected"
            } else {
                ""
            };
            format!("<option value=\"{code}\"{marker}>{}</option>", label(item))
        })
        .collect()
}

pub(crate) fn error_banner(error: Option<&str>) -> String {
    match error {
        Some(message) => format!("<div class=\"alert alert-danger\">{}</div>", escape(message)),
        None => String::new(),
    }
}

pub(crate) fn text_input(name: &str, label: &str, value: &str, kind: &str) -> String {
    format!(
        "<div class=\"mb-3\"><label class=\"form-label\" for=\"{name}\">{label}</label>\
<input class=\"form-control\" type=\"{kind}\" id=\"{name}\" name=\"{name}\" value=\"{}\"></div>",
        escape(value)
    )
}

pub(crate) fn text_area(name: &str, label: &str, value: &str) -> String {
    format!(
        "<div class=\"mb-3\"><label class=\"form-label\" for=\"{name}\">{label}</label>\
<textarea class=\"form-control\" id=\"{name}\" name=\"{name}\" rows=\"4\">{}</textarea></div>",
        escape(value)
    )
}

fn navigation(user: Option<&AuthUser>) -> String {
    let mut links = String::from(
        "<a class=\"nav-link\" href=\"/\">الرئيسية</a>\
<a class=\"nav-link\" href=\"/universities/select-type\">الجامعات</a>\
<a class=\"nav-link\" href=\"/universities/search\">البحث</a>",
    );
    match user {
        Some(user) => {
            if user.is_admin() {
                links.push_str(
                    "<a class=\"nav-link\" href=\"/universities/create\">إضافة جامعة</a>\
<a class=\"nav-link\" href=\"/users\">المستخدمون</a>",
                );
            }
            let name = user.full_name.as_deref().unwrap_or(&user.email);
            links.push_str(&format!(
                "<span class=\"navbar-text\">{}</span>\
<form method=\"post\" action=\"/account/logout\" class=\"d-inline\">\
<button class=\"btn btn-link nav-link\" type=\"submit\">تسجيل الخروج</button></form>",
                escape(name)
            ));
        }
        None => links.push_str("<a class=\"nav-link\" href=\"/account/login\">تسجيل الدخول</a>"),
    }
    links
}

/// Wraps page content in the shared right-to-left document shell.
pub fn layout(title: &str, user: Option<&AuthUser>, content: &str) -> Html<String> {
    Html(format!(
        "<!doctype html><html lang=\"ar\" dir=\"rtl\"><head><meta charset=\"utf-8\">\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
<title>{} - تنسيقي</title></head><body>\
<nav class=\"navbar\"><a class=\"navbar-brand\" href=\"/\">تنسيقي</a>{}</nav>\
<main class=\"container\">{}</main>\
<footer class=\"footer\">&copy; تنسيقي</footer></body></html>",
        escape(title),
        navigation(user),
        content
    ))
}

/// Full error page for a failed front-end request.
pub fn error_page(status: StatusCode, message: &str, user: Option<&AuthUser>) -> Html<String> {
    let heading = match status {
        StatusCode::NOT_FOUND => "الصفحة غير موجودة",
        StatusCode::BAD_REQUEST => "طلب غير صالح",
        StatusCode::FORBIDDEN => "غير مسموح",
        StatusCode::SERVICE_UNAVAILABLE => "الخدمة غير متاحة مؤقتاً",
        _ => "حدث خطأ",
    };
    layout(
        heading,
        user,
        &format!(
            "<div class=\"text-center\"><h1>{}</h1><h2>{heading}</h2><p>{}</p>\
<a class=\"btn btn-primary\" href=\"/\">العودة للرئيسية</a></div>",
            status.as_u16(),
            escape(message)
        ),
    )
}

pub(crate) fn list_or_empty<T>(
    items: &[T],
    empty: &str,
    render: impl Fn(&T) -> String,
) -> String {
    if items.is_empty() {
        format!("<p class=\"text-muted\">{empty}</p>")
    } else {
        items.iter().map(render).collect()
    }
}

pub(crate) fn detail_row(label: &str, value: impl Display) -> String {
    format!("<tr><th>{label}</th><td>{value}</td></tr>")
}
