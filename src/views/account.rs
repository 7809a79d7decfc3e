use axum::response::Html;

use super::{error_banner, escape, layout, text_input};
use crate::auth::AuthUser;

pub fn login(email: &str, return_url: &str, error: Option<&str>) -> Html<String> {
    layout(
        "تسجيل الدخول",
        None,
        &format!(
            "<h1>تسجيل الدخول</h1>{}<form method=\"post\" action=\"/account/login\">\
<input type=\"hidden\" name=\"returnUrl\" value=\"{}\">{}{}\
<button class=\"btn btn-primary\" type=\"submit\">دخول</button></form>",
            error_banner(error),
            escape(return_url),
            text_input("email", "البريد الإلكتروني", email, "email"),
            text_input("password", "كلمة المرور", "", "password"),
        ),
    )
}

pub fn access_denied(user: Option<&AuthUser>) -> Html<String> {
    layout(
        "غير مسموح",
        user,
        "<div class=\"text-center\"><h1>غير مسموح بالوصول</h1>\
<p>ليس لديك صلاحية لعرض هذه الصفحة.</p>\
<a class=\"btn btn-primary\" href=\"/\">العودة للرئيسية</a></div>",
    )
}
