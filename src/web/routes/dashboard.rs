use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    Extension,
};
use tracing::warn;

use crate::api::EntityApi;
use crate::services::event_service::{self, DashboardQuery, EventCardView};
use crate::web::middleware::auth::{AccessToken, AuthenticatedUser};
use crate::web::routes::render_denied;

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub search: String,
    pub drafts: Vec<EventCardView>,
    pub active: Vec<EventCardView>,
    pub past: Vec<EventCardView>,
    pub is_admin: bool,
}

pub async fn dashboard_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Extension(token): Extension<AccessToken>,
    Query(query): Query<DashboardQuery>,
    State(api): State<EntityApi>,
) -> impl IntoResponse {
    if !auth_user.is_organizer() {
        return render_denied();
    }

    let view = match event_service::load_dashboard(
        &api,
        Some(&token.0),
        &auth_user.id,
        auth_user.is_admin(),
        &query,
    )
    .await
    {
        Ok(v) => v,
        Err(e) => {
            warn!("dashboard load failed: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let template = DashboardTemplate {
        search: view.search,
        drafts: view.drafts,
        active: view.active,
        past: view.past,
        is_admin: auth_user.is_admin(),
    };
    Html(template.render().unwrap()).into_response()
}
