//! Static page route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::middleware::PageContext;

/// About page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/about.html")]
pub struct AboutTemplate {
    pub page: PageContext,
}

/// Not found page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/not_found.html")]
pub struct NotFoundTemplate {
    pub page: PageContext,
    pub message: String,
}

/// Display the About page.
pub async fn about(page: PageContext) -> AboutTemplate {
    AboutTemplate { page }
}

/// Fallback for unknown paths.
pub async fn not_found(page: PageContext) -> Response {
    (
        StatusCode::NOT_FOUND,
        NotFoundTemplate {
            page,
            message: "Page not found".to_string(),
        },
    )
        .into_response()
}
