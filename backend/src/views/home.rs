use crate::auth::models::CurrentUser;
use crate::views::templates;
use axum::{Router, extract::Extension, response::Html, routing::get};

/// Home page; greets the logged-in user.
#[axum::debug_handler]
pub async fn index(Extension(current): Extension<CurrentUser>) -> Html<String> {
    templates::index_page(current.user.as_ref())
}

pub fn home_router() -> Router {
    Router::new().route("/", get(index))
}
