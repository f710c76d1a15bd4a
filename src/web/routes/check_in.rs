use askama::Template;
use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use tracing::warn;

use crate::api::{events as events_api, participants as participants_api, EntityApi};
use crate::models::Event;
use crate::services::check_in_service::{self, CheckInMode, CheckInOutcome};
use crate::services::cpf::format_cpf;
use crate::services::error::FlowError;
use crate::services::event_service::price_label;
use crate::services::qr;
use crate::web::middleware::auth::{AccessToken, AuthenticatedUser};
use crate::web::routes::render_denied;

#[derive(Template)]
#[template(path = "check_in.html")]
pub struct CheckInTemplate {
    pub event_id: String,
    pub event_title: String,
    pub notice_message: String,
    pub error_message: String,
}

/// Payment-confirmation step shown when the gate holds a participant back.
#[derive(Template)]
#[template(path = "check_in_pending.html")]
pub struct CheckInPendingTemplate {
    pub event_id: String,
    pub event_title: String,
    pub participant_id: String,
    pub participant_name: String,
    pub cpf_label: String,
    pub price_label: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct CheckInQuery {
    #[serde(rename = "eventId")]
    pub event_id: String,
    pub notice: Option<String>,
}

pub async fn check_in_page(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Extension(token): Extension<AccessToken>,
    Query(query): Query<CheckInQuery>,
    State(api): State<EntityApi>,
) -> Response {
    if !auth_user.is_organizer() {
        return render_denied();
    }

    let event = match load_event(&api, &token.0, &query.event_id).await {
        Ok(event) => event,
        Err(resp) => return resp,
    };

    let template = CheckInTemplate {
        event_id: event.id,
        event_title: event.title,
        notice_message: notice_message(query.notice.as_deref()),
        error_message: String::new(),
    };
    Html(template.render().unwrap()).into_response()
}

#[derive(Debug, Deserialize)]
pub struct CheckInForm {
    pub event_id: String,
    pub mode: String,
    pub value: String,
}

pub async fn check_in_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Extension(token): Extension<AccessToken>,
    State(api): State<EntityApi>,
    Form(form): Form<CheckInForm>,
) -> Response {
    if !auth_user.is_organizer() {
        return render_denied();
    }

    let event = match load_event(&api, &token.0, &form.event_id).await {
        Ok(event) => event,
        Err(resp) => return resp,
    };

    let Some(mode) = CheckInMode::parse(&form.mode) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    run_check_in(&api, &token.0, &event, mode, &form.value).await
}

/// Camera fallback: an uploaded frame is decoded server-side, then follows
/// the same path as a scanned payload.
pub async fn scan_frame_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Extension(token): Extension<AccessToken>,
    State(api): State<EntityApi>,
    mut multipart: Multipart,
) -> Response {
    if !auth_user.is_organizer() {
        return render_denied();
    }

    let mut event_id = String::new();
    let mut frame: Vec<u8> = Vec::new();

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("event_id") => {
                event_id = field.text().await.unwrap_or_default();
            }
            Some("frame") => {
                frame = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
            }
            _ => {}
        }
    }

    let event = match load_event(&api, &token.0, &event_id).await {
        Ok(event) => event,
        Err(resp) => return resp,
    };

    let Some(payload) = qr::decode(&frame) else {
        return render_error(&event, "Não foi possível ler o QR Code da imagem.");
    };

    run_check_in(&api, &token.0, &event, CheckInMode::Qr, &payload).await
}

#[derive(Debug, Deserialize)]
pub struct ConfirmPaymentForm {
    pub event_id: String,
    pub participant_id: String,
    pub payment_confirmed: Option<String>,
}

/// Staff acknowledged the on-site payment: one update flips the payment
/// status and records today's attendance together.
pub async fn confirm_payment_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Extension(token): Extension<AccessToken>,
    State(api): State<EntityApi>,
    Form(form): Form<ConfirmPaymentForm>,
) -> Response {
    if !auth_user.is_organizer() {
        return render_denied();
    }

    let event = match load_event(&api, &token.0, &form.event_id).await {
        Ok(event) => event,
        Err(resp) => return resp,
    };

    let participant =
        match participants_api::get_participant(&api, Some(&token.0), &form.participant_id).await {
            Ok(Some(p)) => p,
            Ok(None) => return render_error(&event, "Participante não encontrado"),
            Err(e) => {
                warn!("participant load failed: {}", e);
                return render_error(&event, "Erro ao comunicar com o servidor. Tente novamente.");
            }
        };

    let acknowledged = form.payment_confirmed.is_some();
    match check_in_service::confirm_payment_and_check_in(
        &api,
        Some(&token.0),
        &event,
        &participant,
        acknowledged,
    )
    .await
    {
        Ok(_) => Redirect::to(&format!("/check-in?eventId={}&notice=ok", event.id)).into_response(),
        Err(e) => {
            if matches!(e, FlowError::Remote(_)) {
                warn!("payment confirmation failed: {}", e);
            }
            render_error(&event, &e.user_message())
        }
    }
}

async fn run_check_in(
    api: &EntityApi,
    token: &str,
    event: &Event,
    mode: CheckInMode,
    value: &str,
) -> Response {
    match check_in_service::check_in(api, Some(token), event, mode, value).await {
        Ok(CheckInOutcome::Recorded(_)) => {
            Redirect::to(&format!("/check-in?eventId={}&notice=ok", event.id)).into_response()
        }
        Ok(CheckInOutcome::PaymentPending(participant)) => {
            let template = CheckInPendingTemplate {
                event_id: event.id.clone(),
                event_title: event.title.clone(),
                participant_id: participant.id.clone(),
                participant_name: participant.full_name.clone(),
                cpf_label: format_cpf(&participant.cpf),
                price_label: price_label(event),
            };
            Html(template.render().unwrap()).into_response()
        }
        Err(e) => {
            if matches!(e, FlowError::Remote(_)) {
                warn!("check-in failed: {}", e);
            }
            render_error(event, &e.user_message())
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

fn render_error(event: &Event, message: &str) -> Response {
    let template = CheckInTemplate {
        event_id: event.id.clone(),
        event_title: event.title.clone(),
        notice_message: String::new(),
        error_message: message.to_string(),
    };
    Html(template.render().unwrap()).into_response()
}

fn notice_message(code: Option<&str>) -> String {
    match code {
        Some("ok") => "Check-in realizado com sucesso. Presença registrada.".to_string(),
        _ => String::new(),
    }
}
