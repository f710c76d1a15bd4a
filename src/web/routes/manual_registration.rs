use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use tracing::warn;

use crate::api::{events as events_api, EntityApi};
use crate::models::Event;
use crate::services::error::FlowError;
use crate::services::registration_service;
use crate::web::middleware::auth::{AccessToken, AuthenticatedUser};
use crate::web::routes::render_denied;

/// Staff registration bypasses the public proof-of-payment upload; the
/// acknowledgment checkbox stands in for it on paid events.
#[derive(Template)]
#[template(path = "manual_registration.html")]
pub struct ManualRegistrationTemplate {
    pub event_id: String,
    pub event_title: String,
    pub is_paid: bool,
    pub error_message: String,
    pub full_name: String,
    pub cpf: String,
    pub email: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct ManualRegistrationQuery {
    #[serde(rename = "eventId")]
    pub event_id: String,
}

pub async fn manual_registration_page(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Extension(token): Extension<AccessToken>,
    Query(query): Query<ManualRegistrationQuery>,
    State(api): State<EntityApi>,
) -> Response {
    if !auth_user.is_organizer() {
        return render_denied();
    }

    let event = match load_event(&api, &token.0, &query.event_id).await {
        Ok(event) => event,
        Err(resp) => return resp,
    };

    let template = ManualRegistrationTemplate {
        event_id: event.id,
        event_title: event.title,
        is_paid: event.is_paid,
        error_message: String::new(),
        full_name: String::new(),
        cpf: String::new(),
        email: String::new(),
    };
    Html(template.render().unwrap()).into_response()
}

#[derive(Debug, Deserialize)]
pub struct ManualRegistrationForm {
    pub event_id: String,
    pub full_name: String,
    pub cpf: String,
    pub email: String,
    pub payment_confirmed: Option<String>,
}

pub async fn manual_registration_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Extension(token): Extension<AccessToken>,
    State(api): State<EntityApi>,
    Form(form): Form<ManualRegistrationForm>,
) -> Response {
    if !auth_user.is_organizer() {
        return render_denied();
    }

    let event = match load_event(&api, &token.0, &form.event_id).await {
        Ok(event) => event,
        Err(resp) => return resp,
    };

    match registration_service::register_manual(
        &api,
        Some(&token.0),
        &event,
        &form.full_name,
        &form.cpf,
        &form.email,
        form.payment_confirmed.is_some(),
    )
    .await
    {
        Ok(_) => Redirect::to(&format!(
            "/events/details?id={}&notice=manual_ok",
            event.id
        ))
        .into_response(),
        Err(e) => {
            if matches!(e, FlowError::Remote(_)) {
                warn!("manual registration failed: {}", e);
            }
            let template = ManualRegistrationTemplate {
                event_id: event.id.clone(),
                event_title: event.title.clone(),
                is_paid: event.is_paid,
                error_message: e.user_message(),
                full_name: form.full_name.clone(),
                cpf: form.cpf.clone(),
                email: form.email.clone(),
            };
            Html(template.render().unwrap()).into_response()
        }
    }
}

async fn load_event(api: &EntityApi, token: &str, event_id: &str) -> Result<Event, Response> {
    if event_id.is_empty() {
        return Err(StatusCode::BAD_REQUEST.into_response());
    }
    match events_api::get_event(api, Some(token), event_id).await {
        Ok(Some(event)) => Ok(event),
        Ok(None) => Err(StatusCode::NOT_FOUND.into_response()),
        Err(e) => {
            warn!("event load failed for {}: {}", event_id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
    }
}
