use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use tracing::warn;

use crate::api::EntityApi;
use crate::services::organizer_service::{self, OrganizerRowView};
use crate::web::middleware::auth::{AccessToken, AuthenticatedUser};
use crate::web::routes::render_denied;

#[derive(Template)]
#[template(path = "organizers.html")]
pub struct OrganizersTemplate {
    pub organizers: Vec<OrganizerRowView>,
    pub search: String,
    pub notice_message: String,
    pub error_message: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct OrganizersQuery {
    pub q: Option<String>,
    pub notice: Option<String>,
}

pub async fn organizers_page(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Extension(token): Extension<AccessToken>,
    Query(query): Query<OrganizersQuery>,
    State(api): State<EntityApi>,
) -> Response {
    // Organizer management is admin territory.
    if !auth_user.is_admin() {
        return render_denied();
    }

    let search = query.q.clone().unwrap_or_default();
    let organizers = match organizer_service::list_organizers(&api, Some(&token.0), &search).await
    {
        Ok(rows) => rows,
        Err(e) => {
            warn!("organizer listing failed: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let template = OrganizersTemplate {
        organizers,
        search,
        notice_message: notice_message(query.notice.as_deref()),
        error_message: String::new(),
    };
    Html(template.render().unwrap()).into_response()
}

#[derive(Debug, Deserialize)]
pub struct CreateOrganizerForm {
    pub full_name: String,
    pub email: String,
    pub contact_phone: String,
    pub password: String,
}

pub async fn create_organizer_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Extension(token): Extension<AccessToken>,
    State(api): State<EntityApi>,
    Form(form): Form<CreateOrganizerForm>,
) -> Response {
    if !auth_user.is_admin() {
        return render_denied();
    }

    // User provisioning belongs to the platform; render the refusal inline
    // with the listing rather than persisting anything.
    let _ = (&form.full_name, &form.email, &form.contact_phone, &form.password);
    let error = organizer_service::create_organizer_rejected();

    let organizers = organizer_service::list_organizers(&api, Some(&token.0), "")
        .await
        .unwrap_or_default();
    let template = OrganizersTemplate {
        organizers,
        search: String::new(),
        notice_message: String::new(),
        error_message: error.user_message(),
    };
    Html(template.render().unwrap()).into_response()
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrganizerForm {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub contact_phone: String,
    pub profile_image_url: Option<String>,
}

pub async fn update_organizer_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Extension(token): Extension<AccessToken>,
    State(api): State<EntityApi>,
    Form(form): Form<UpdateOrganizerForm>,
) -> Response {
    if !auth_user.is_admin() {
        return render_denied();
    }

    let notice = match organizer_service::update_organizer(
        &api,
        Some(&token.0),
        &form.id,
        &form.full_name,
        &form.email,
        &form.contact_phone,
        form.profile_image_url.as_deref().unwrap_or(""),
    )
    .await
    {
        Ok(()) => "updated",
        Err(e) => {
            warn!("organizer update failed: {}", e);
            "error"
        }
    };

    Redirect::to(&format!("/organizers?notice={}", notice)).into_response()
}

#[derive(Debug, Deserialize)]
pub struct DeleteOrganizerForm {
    pub id: String,
}

pub async fn delete_organizer_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Extension(token): Extension<AccessToken>,
    State(api): State<EntityApi>,
    Form(form): Form<DeleteOrganizerForm>,
) -> Response {
    if !auth_user.is_admin() {
        return render_denied();
    }

    let notice = match organizer_service::delete_organizer(&api, Some(&token.0), &form.id).await {
        Ok(()) => "removed",
        Err(e) => {
            warn!("organizer delete failed: {}", e);
            "error"
        }
    };

    Redirect::to(&format!("/organizers?notice={}", notice)).into_response()
}

fn notice_message(code: Option<&str>) -> String {
    match code {
        Some("updated") => "Usuário atualizado com sucesso.".to_string(),
        Some("removed") => "Usuário excluído.".to_string(),
        Some("error") => "A operação falhou. Tente novamente.".to_string(),
        _ => String::new(),
    }
}
