use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect},
    Extension, Form,
};
use serde::Deserialize;
use tracing::warn;

use crate::api::{events as events_api, EntityApi};
use crate::models::Event;
use crate::services::error::FlowError;
use crate::services::event_service::{self, EventDetailView, EventDetailsQuery, EventForm};
use crate::web::middleware::auth::{AccessToken, AuthenticatedUser};
use crate::web::routes::render_denied;

/// Form state echoed back into the template, both for editing an existing
/// event and for re-rendering after a validation error.
#[derive(Template)]
#[template(path = "event_form.html")]
pub struct EventFormTemplate {
    pub heading: String,
    pub id: String,
    pub title: String,
    pub description: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub location: String,
    pub event_type: String,
    pub is_paid: bool,
    pub price: String,
    pub pix_code: String,
    pub registration_limit: String,
    pub has_certificate: bool,
    pub certificate_hours: String,
    pub image_url: String,
    pub is_periodic: bool,
    pub periodic_dates: String,
    pub error_message: String,
}

impl EventFormTemplate {
    fn blank() -> Self {
        Self {
            heading: "Criar novo evento".to_string(),
            id: String::new(),
            title: String::new(),
            description: String::new(),
            date: String::new(),
            start_time: String::new(),
            end_time: String::new(),
            location: String::new(),
            event_type: "presencial".to_string(),
            is_paid: false,
            price: String::new(),
            pix_code: String::new(),
            registration_limit: String::new(),
            has_certificate: false,
            certificate_hours: String::new(),
            image_url: String::new(),
            is_periodic: false,
            periodic_dates: String::new(),
            error_message: String::new(),
        }
    }

    fn from_event(event: &Event) -> Self {
        Self {
            heading: "Editar evento".to_string(),
            id: event.id.clone(),
            title: event.title.clone(),
            description: event.description.clone(),
            date: event.date.clone(),
            start_time: event.start_time.clone(),
            end_time: event.end_time.clone(),
            location: event.location.clone(),
            event_type: event.event_type.clone(),
            is_paid: event.is_paid,
            price: if event.is_paid {
                format!("{:.2}", event.price)
            } else {
                String::new()
            },
            pix_code: event.pix_code.clone(),
            registration_limit: event
                .registration_limit
                .map(|v| v.to_string())
                .unwrap_or_default(),
            has_certificate: event.has_certificate,
            certificate_hours: event
                .certificate_hours
                .map(|v| v.to_string())
                .unwrap_or_default(),
            image_url: event.image_url.clone(),
            is_periodic: event.is_periodic,
            periodic_dates: event.periodic_dates.join(", "),
            error_message: String::new(),
        }
    }

    fn from_form(form: &EventForm, error_message: String) -> Self {
        Self {
            heading: if form.id.as_deref().unwrap_or("").is_empty() {
                "Criar novo evento".to_string()
            } else {
                "Editar evento".to_string()
            },
            id: form.id.clone().unwrap_or_default(),
            title: form.title.clone(),
            description: form.description.clone(),
            date: form.date.clone(),
            start_time: form.start_time.clone(),
            end_time: form.end_time.clone(),
            location: form.location.clone(),
            event_type: form.event_type.clone(),
            is_paid: form.ticket_type == "pago",
            price: form.price.clone().unwrap_or_default(),
            pix_code: form.pix_code.clone().unwrap_or_default(),
            registration_limit: form.registration_limit.clone().unwrap_or_default(),
            has_certificate: form.has_certificate.as_deref() == Some("sim"),
            certificate_hours: form.certificate_hours.clone().unwrap_or_default(),
            image_url: form.image_url.clone().unwrap_or_default(),
            is_periodic: form.frequency == "periodico",
            periodic_dates: form.periodic_dates.clone().unwrap_or_default(),
            error_message,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct EventFormQuery {
    pub id: Option<String>,
}

pub async fn event_form_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Extension(token): Extension<AccessToken>,
    Query(query): Query<EventFormQuery>,
    State(api): State<EntityApi>,
) -> impl IntoResponse {
    if !auth_user.is_organizer() {
        return render_denied();
    }

    let template = match query.id.as_deref().filter(|id| !id.is_empty()) {
        None => EventFormTemplate::blank(),
        Some(id) => match events_api::get_event(&api, Some(&token.0), id).await {
            Ok(Some(event)) => EventFormTemplate::from_event(&event),
            Ok(None) => return StatusCode::NOT_FOUND.into_response(),
            Err(e) => {
                warn!("event load failed for {}: {}", id, e);
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        },
    };
    Html(template.render().unwrap()).into_response()
}

pub async fn save_event_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Extension(token): Extension<AccessToken>,
    State(api): State<EntityApi>,
    Form(form): Form<EventForm>,
) -> impl IntoResponse {
    if !auth_user.is_organizer() {
        return render_denied();
    }

    let organizer_name = if auth_user.full_name.is_empty() {
        auth_user.email.clone()
    } else {
        auth_user.full_name.clone()
    };

    match event_service::save_event(
        &api,
        Some(&token.0),
        &auth_user.id,
        &organizer_name,
        &form,
    )
    .await
    {
        Ok(_) => Redirect::to("/dashboard").into_response(),
        Err(e @ FlowError::Validation(_)) => {
            let template = EventFormTemplate::from_form(&form, e.user_message());
            Html(template.render().unwrap()).into_response()
        }
        Err(e) => {
            warn!("event save failed: {}", e);
            let template = EventFormTemplate::from_form(&form, e.user_message());
            Html(template.render().unwrap()).into_response()
        }
    }
}

#[derive(Template)]
#[template(path = "event_details.html")]
pub struct EventDetailsTemplate {
    pub event: EventDetailView,
    pub invite_path: String,
}

pub async fn event_details_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Extension(token): Extension<AccessToken>,
    Query(query): Query<EventDetailsQuery>,
    State(api): State<EntityApi>,
) -> impl IntoResponse {
    if !auth_user.is_organizer() {
        return render_denied();
    }

    let view = match event_service::load_event_detail(
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
            warn!("event detail load failed for {}: {}", query.id, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let Some(view) = view else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let template = EventDetailsTemplate {
        invite_path: format!("/register?eventId={}", view.id),
        event: view,
    };
    Html(template.render().unwrap()).into_response()
}
