use askama::Template;
use axum::response::{Html, IntoResponse, Response};

pub mod auth;
pub mod check_in;
pub mod dashboard;
pub mod events;
pub mod manual_registration;
pub mod organizers;
pub mod participants;
pub mod registration;

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate {
    message: String,
}

/// Denied-access notice for authenticated users without the required role.
pub fn render_denied() -> Response {
    let template = ErrorTemplate {
        message: "Acesso negado. Apenas organizadores podem acessar esta página.".to_string(),
    };
    Html(template.render().unwrap()).into_response()
}
