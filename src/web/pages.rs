//! HTML pages, compiled from `templates/` at build time.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::error;

/// View model for the login and registration forms.
#[derive(Clone, Debug, Default)]
pub struct PageData {
    pub error: String,
    pub email: String,
}

impl PageData {
    #[must_use]
    pub fn with_error(error: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            email: email.into(),
        }
    }
}

#[derive(Template)]
#[template(path = "landing.html")]
pub struct LandingPage<'a> {
    pub data: &'a PageData,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterPage<'a> {
    pub data: &'a PageData,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage;

/// Render a page as a 200 HTML response, or a 500 carrying the render error.
pub fn render<T: Template>(page: &T) -> Response {
    match page.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Failed to render template: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
