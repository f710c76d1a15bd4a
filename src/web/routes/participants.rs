use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use tracing::warn;

use crate::api::{participants as participants_api, EntityApi};
use crate::services::cpf::format_cpf;
use crate::services::error::FlowError;
use crate::services::event_service;
use crate::web::middleware::auth::{AccessToken, AuthenticatedUser};
use crate::web::routes::render_denied;

#[derive(Template)]
#[template(path = "participant_edit.html")]
pub struct ParticipantEditTemplate {
    pub participant_id: String,
    pub event_id: String,
    pub full_name: String,
    pub email: String,
    pub cpf: String,
    pub payment_status: String,
    pub error_message: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct ParticipantEditQuery {
    #[serde(rename = "participantId")]
    pub participant_id: String,
    #[serde(rename = "eventId")]
    pub event_id: String,
}

pub async fn edit_participant_page(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Extension(token): Extension<AccessToken>,
    Query(query): Query<ParticipantEditQuery>,
    State(api): State<EntityApi>,
) -> Response {
    if !auth_user.is_organizer() {
        return render_denied();
    }

    let participant =
        match participants_api::get_participant(&api, Some(&token.0), &query.participant_id).await
        {
            Ok(Some(p)) => p,
            Ok(None) => return StatusCode::NOT_FOUND.into_response(),
            Err(e) => {
                warn!("participant load failed: {}", e);
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };

    let template = ParticipantEditTemplate {
        participant_id: participant.id.clone(),
        event_id: query.event_id.clone(),
        full_name: participant.full_name.clone(),
        email: participant.email.clone(),
        cpf: format_cpf(&participant.cpf),
        payment_status: participant.payment_status.as_str().to_string(),
        error_message: String::new(),
    };
    Html(template.render().unwrap()).into_response()
}

#[derive(Debug, Deserialize)]
pub struct ParticipantUpdateForm {
    pub participant_id: String,
    pub event_id: String,
    pub full_name: String,
    pub email: String,
    pub cpf: String,
    pub payment_status: String,
}

pub async fn update_participant_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Extension(token): Extension<AccessToken>,
    State(api): State<EntityApi>,
    Form(form): Form<ParticipantUpdateForm>,
) -> Response {
    if !auth_user.is_organizer() {
        return render_denied();
    }

    let patch = match event_service::participant_edit_patch(
        &form.full_name,
        &form.email,
        &form.cpf,
        &form.payment_status,
    ) {
        Ok(patch) => patch,
        Err(e) => {
            let template = ParticipantEditTemplate {
                participant_id: form.participant_id.clone(),
                event_id: form.event_id.clone(),
                full_name: form.full_name.clone(),
                email: form.email.clone(),
                cpf: form.cpf.clone(),
                payment_status: form.payment_status.clone(),
                error_message: e.user_message(),
            };
            return Html(template.render().unwrap()).into_response();
        }
    };

    match participants_api::update_participant(&api, Some(&token.0), &form.participant_id, &patch)
        .await
    {
        Ok(_) => Redirect::to(&format!(
            "/events/details?id={}&notice=participant_ok",
            form.event_id
        ))
        .into_response(),
        Err(e) => {
            warn!("participant update failed: {}", e);
            let remote = FlowError::from(e);
            let template = ParticipantEditTemplate {
                participant_id: form.participant_id.clone(),
                event_id: form.event_id.clone(),
                full_name: form.full_name.clone(),
                email: form.email.clone(),
                cpf: form.cpf.clone(),
                payment_status: form.payment_status.clone(),
                error_message: remote.user_message(),
            };
            Html(template.render().unwrap()).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ParticipantDeleteForm {
    pub participant_id: String,
    pub event_id: String,
}

/// Explicit staff action; nothing cascades.
pub async fn delete_participant_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Extension(token): Extension<AccessToken>,
    State(api): State<EntityApi>,
    Form(form): Form<ParticipantDeleteForm>,
) -> Response {
    if !auth_user.is_organizer() {
        return render_denied();
    }

    let notice =
        match participants_api::delete_participant(&api, Some(&token.0), &form.participant_id)
            .await
        {
            Ok(()) => "participant_removed",
            Err(e) => {
                warn!("participant delete failed: {}", e);
                "error"
            }
        };

    Redirect::to(&format!(
        "/events/details?id={}&notice={}",
        form.event_id, notice
    ))
    .into_response()
}
