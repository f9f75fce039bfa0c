//! HTML pages.
//!
//! Every page is rendered into the shared [`layout`]. User-provided text is
//! escaped before interpolation.

use crate::database::models::User;
use crate::utils::html::escape;
use crate::views::common::FieldError;
use axum::http::StatusCode;
use axum::response::Html;

pub const MSG_CHECK_EMAIL: &str = "Please check your mailbox to activate your account";
pub const MSG_EMAIL_TAKEN: &str = "This email is already registered";
pub const MSG_NOT_ACTIVE: &str =
    "This account has not been activated. Register again with this email to get a new link";
pub const MSG_BAD_CREDENTIALS: &str = "Incorrect username or password";
pub const MSG_ACTIVATED: &str = "Your account is active, please log in";
pub const MSG_PASSWORD_MISMATCH: &str = "The two passwords do not match";
pub const MSG_PASSWORD_UPDATED: &str = "Your password has been updated, please log in";
pub const MSG_LOGGED_OUT: &str = "You have been logged out";
pub const MSG_ACTIVATION_FAILED: &str = "The link is invalid or has expired";

fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>{title} - MuXue Online</title>
</head>
<body>
    <main>
        <h1>{title}</h1>
{body}
    </main>
</body>
</html>
"#,
        title = escape(title),
    ))
}

fn message(msg: Option<&str>) -> String {
    match msg {
        Some(msg) => format!(r#"        <p class="msg">{}</p>"#, escape(msg)),
        None => String::new(),
    }
}

fn field_errors(errors: &[FieldError]) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let items: String = errors
        .iter()
        .map(|error| {
            format!(
                r#"            <li data-field="{}">{}</li>"#,
                escape(&error.field),
                escape(&error.message)
            ) + "\n"
        })
        .collect();
    format!("        <ul class=\"errors\">\n{items}        </ul>")
}

pub fn login_page(msg: Option<&str>, errors: &[FieldError], username: &str) -> Html<String> {
    let body = format!(
        r#"{msg}
{errors}
        <form method="post" action="/login">
            <input type="text" name="username" placeholder="Username or email" value="{username}">
            <input type="password" name="password" placeholder="Password">
            <button type="submit">Log in</button>
        </form>
        <p><a href="/register">Register</a> | <a href="/forget">Forgot password?</a></p>"#,
        msg = message(msg),
        errors = field_errors(errors),
        username = escape(username),
    );
    layout("Log in", &body)
}

pub fn register_page(msg: Option<&str>, errors: &[FieldError], email: &str) -> Html<String> {
    let body = format!(
        r#"{msg}
{errors}
        <form method="post" action="/register">
            <input type="email" name="email" placeholder="Email" value="{email}">
            <input type="password" name="password" placeholder="Password">
            <button type="submit">Register</button>
        </form>
        <p><a href="/login">Already have an account? Log in</a></p>"#,
        msg = message(msg),
        errors = field_errors(errors),
        email = escape(email),
    );
    layout("Register", &body)
}

pub fn forget_page(errors: &[FieldError], email: &str) -> Html<String> {
    let body = format!(
        r#"{errors}
        <form method="post" action="/forget">
            <input type="email" name="email" placeholder="Email" value="{email}">
            <button type="submit">Send reset link</button>
        </form>"#,
        errors = field_errors(errors),
        email = escape(email),
    );
    layout("Forgot password", &body)
}

pub fn send_success_page() -> Html<String> {
    layout(
        "Email sent",
        r#"        <p>If an account exists for this address, a password reset link is on its way. Please check your mailbox.</p>
        <p><a href="/login">Back to log in</a></p>"#,
    )
}

pub fn active_fail_page() -> Html<String> {
    let body = format!(
        r#"        <p>{}</p>
        <p><a href="/login">Back to log in</a></p>"#,
        escape(MSG_ACTIVATION_FAILED)
    );
    layout("Verification failed", &body)
}

pub fn password_reset_page(
    email: &str,
    code: &str,
    msg: Option<&str>,
    errors: &[FieldError],
) -> Html<String> {
    let body = format!(
        r#"{msg}
{errors}
        <p>Choose a new password for {email}</p>
        <form method="post" action="/reset">
            <input type="hidden" name="email" value="{email}">
            <input type="hidden" name="code" value="{code}">
            <input type="password" name="password1" placeholder="New password">
            <input type="password" name="password2" placeholder="Repeat new password">
            <button type="submit">Reset password</button>
        </form>"#,
        msg = message(msg),
        errors = field_errors(errors),
        email = escape(email),
        code = escape(code),
    );
    layout("Reset password", &body)
}

pub fn index_page(user: Option<&User>) -> Html<String> {
    let body = match user {
        Some(user) => format!(
            r#"        <p>Welcome back, {}!</p>
        <form method="post" action="/logout">
            <button type="submit">Log out</button>
        </form>"#,
            escape(&user.username)
        ),
        None => r#"        <p><a href="/login">Log in</a> | <a href="/register">Register</a></p>"#
            .to_string(),
    };
    layout("MuXue Online", &body)
}

pub fn error_page(status: StatusCode, message: &str) -> Html<String> {
    let body = format!(
        r#"        <p>{}</p>
        <p><a href="/">Home</a></p>"#,
        escape(message)
    );
    layout(status.canonical_reason().unwrap_or("Error"), &body)
}
