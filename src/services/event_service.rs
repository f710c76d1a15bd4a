use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::{events, participants, EntityApi};
use crate::models::{Event, EventStatus, Participant};
use crate::services::cpf::format_cpf;
use crate::services::error::FlowError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    Draft,
    Active,
    Past,
}

/// Classification is recomputed from the stored fields on every listing;
/// nothing server-side ever flips an event to closed.
pub fn classify_event(event: &Event, today: &str) -> EventPhase {
    match event.status {
        EventStatus::Rascunho => EventPhase::Draft,
        EventStatus::Encerrado => EventPhase::Past,
        EventStatus::Ativo => {
            if event.end_date() >= today {
                EventPhase::Active
            } else {
                EventPhase::Past
            }
        }
    }
}

/// Raw form fields for the event create/edit page.
#[derive(Debug, Deserialize, Default)]
pub struct EventForm {
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub location: String,
    pub event_type: String,
    pub ticket_type: String,
    // Number inputs submit empty strings; parse by hand instead of failing
    // form extraction.
    pub price: Option<String>,
    pub pix_code: Option<String>,
    pub registration_limit: Option<String>,
    pub has_certificate: Option<String>,
    pub certificate_hours: Option<String>,
    pub image_url: Option<String>,
    pub frequency: String,
    pub periodic_dates: Option<String>,
    pub action: String,
}

/// Persist the form as draft or published event. Returns the stored event.
pub async fn save_event(
    api: &EntityApi,
    token: Option<&str>,
    organizer_id: &str,
    organizer_name: &str,
    form: &EventForm,
) -> Result<Event, FlowError> {
    if form.title.trim().is_empty() {
        return Err(FlowError::validation("Informe o título do evento."));
    }
    if form.date.trim().is_empty() {
        return Err(FlowError::validation("Informe a data do evento."));
    }

    let publish = form.action == "publicar";
    let is_paid = form.ticket_type == "pago";
    let is_periodic = form.frequency == "periodico";

    let periodic_dates = if is_periodic {
        let dates = parse_periodic_dates(form.periodic_dates.as_deref().unwrap_or(""));
        if dates.is_empty() {
            return Err(FlowError::validation(
                "Informe as datas dos encontros do evento periódico.",
            ));
        }
        dates
    } else {
        vec![]
    };

    let total_sessions = if is_periodic {
        periodic_dates.len() as i64
    } else {
        1
    };

    let registration_limit = form
        .registration_limit
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<i64>().ok());

    let has_certificate = form.has_certificate.as_deref() == Some("sim");
    let price = parse_decimal(form.price.as_deref());
    let certificate_hours = if has_certificate {
        Some(parse_decimal(form.certificate_hours.as_deref()))
    } else {
        None
    };

    let fields = json!({
        "title": form.title.trim(),
        "description": form.description.trim(),
        "date": form.date,
        "start_time": form.start_time,
        "end_time": form.end_time,
        "location": form.location.trim(),
        "event_type": form.event_type,
        "is_paid": is_paid,
        "price": if is_paid { price } else { 0.0 },
        "pix_code": form.pix_code.clone().unwrap_or_default(),
        "registration_limit": registration_limit,
        "has_certificate": has_certificate,
        "certificate_hours": certificate_hours,
        "image_url": form.image_url.clone().unwrap_or_default(),
        "status": if publish { "ativo" } else { "rascunho" },
        "is_periodic": is_periodic,
        "periodic_dates": periodic_dates,
        "total_sessions": total_sessions,
        "organizer_id": organizer_id,
        "organizer_name": organizer_name,
    });

    let saved = match form.id.as_deref().filter(|id| !id.is_empty()) {
        Some(id) => events::update_event(api, token, id, &fields).await?,
        None => events::create_event(api, token, &fields).await?,
    };
    Ok(saved)
}

fn parse_decimal(raw: Option<&str>) -> f64 {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.replace(',', ".").parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Dates arrive as one text field (comma/newline separated). Kept sorted
/// ascending and deduplicated; the insert order defines nothing.
pub fn parse_periodic_dates(raw: &str) -> Vec<String> {
    let mut dates: Vec<String> = raw
        .split([',', ';', '\n', '\r', ' '])
        .map(str::trim)
        .filter(|t| looks_like_iso_date(t))
        .map(str::to_string)
        .collect();
    dates.sort();
    dates.dedup();
    dates
}

fn looks_like_iso_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && value
            .chars()
            .enumerate()
            .all(|(i, c)| matches!(i, 4 | 7) || c.is_ascii_digit())
}

// ---- Dashboard ----------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
pub struct DashboardQuery {
    pub q: Option<String>,
}

pub struct EventCardView {
    pub id: String,
    pub title: String,
    pub date_label: String,
    pub time_label: String,
    pub location: String,
    pub registered_count: i64,
    pub limit_label: String,
    pub is_paid: bool,
    pub price_label: String,
    pub image_url: String,
    pub has_image: bool,
}

pub struct DashboardView {
    pub search: String,
    pub drafts: Vec<EventCardView>,
    pub active: Vec<EventCardView>,
    pub past: Vec<EventCardView>,
}

/// Events grouped by phase, scoped to the caller: admins see everything,
/// organizers only their own events.
pub async fn load_dashboard(
    api: &EntityApi,
    token: Option<&str>,
    viewer_id: &str,
    viewer_is_admin: bool,
    query: &DashboardQuery,
) -> Result<DashboardView, FlowError> {
    let all_events = events::list_events(api, token).await?;
    let all_participants = participants::list_all(api, token).await?;

    let mut counts: HashMap<&str, i64> = HashMap::new();
    for p in &all_participants {
        *counts.entry(p.event_id.as_str()).or_insert(0) += 1;
    }

    let search = query.q.clone().unwrap_or_default();
    let needle = search.to_lowercase();
    let today = crate::services::check_in_service::today_iso();

    let mut drafts = Vec::new();
    let mut active = Vec::new();
    let mut past = Vec::new();

    for event in &all_events {
        if !viewer_is_admin && event.organizer_id != viewer_id {
            continue;
        }
        if !needle.is_empty() && !event.title.to_lowercase().contains(&needle) {
            continue;
        }

        let card = build_card(event, counts.get(event.id.as_str()).copied().unwrap_or(0));
        match classify_event(event, &today) {
            EventPhase::Draft => drafts.push(card),
            EventPhase::Active => active.push(card),
            EventPhase::Past => past.push(card),
        }
    }

    Ok(DashboardView {
        search,
        drafts,
        active,
        past,
    })
}

fn build_card(event: &Event, registered_count: i64) -> EventCardView {
    EventCardView {
        id: event.id.clone(),
        title: event.title.clone(),
        date_label: event_date_label(event),
        time_label: format!("{} - {}", event.start_time, event.end_time),
        location: event.location.clone(),
        registered_count,
        limit_label: match event.registration_limit {
            Some(limit) => format!("{} / {}", registered_count, limit),
            None => format!("{}", registered_count),
        },
        is_paid: event.is_paid,
        price_label: price_label(event),
        has_image: !event.image_url.is_empty(),
        image_url: event.image_url.clone(),
    }
}

pub fn price_label(event: &Event) -> String {
    if event.is_paid {
        format!("R$ {:.2}", event.price)
    } else {
        "Gratuito".to_string()
    }
}

pub fn event_date_label(event: &Event) -> String {
    if event.is_periodic && !event.periodic_dates.is_empty() {
        format!("Evento periódico - {} encontros", event.total_sessions)
    } else {
        format_date_br(&event.date)
    }
}

/// `YYYY-MM-DD` → `dd/mm/yyyy`; anything unparseable passes through.
pub fn format_date_br(date: &str) -> String {
    let Some((y, m, d)) = parse_ymd(date) else {
        return date.to_string();
    };
    format!("{:02}/{:02}/{}", d, m, y)
}

fn parse_ymd(date: &str) -> Option<(i32, i32, i32)> {
    let mut parts = date.split('-');
    let y: i32 = parts.next()?.parse().ok()?;
    let m: i32 = parts.next()?.parse().ok()?;
    let d: i32 = parts.next()?.parse().ok()?;
    Some((y, m, d))
}

// ---- Event details ------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
pub struct EventDetailsQuery {
    pub id: String,
    pub q: Option<String>,
    pub notice: Option<String>,
}

pub struct ParticipantRowView {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub cpf_label: String,
    pub payment_label: String,
    pub payment_proof_url: String,
    pub has_proof: bool,
    pub checked_in: bool,
    pub attendance_label: String,
    pub certificate_issued: bool,
}

pub struct EventDetailView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub organizer_name: String,
    pub date_label: String,
    pub session_date_labels: Vec<String>,
    pub is_periodic: bool,
    pub time_label: String,
    pub location: String,
    pub event_type: String,
    pub is_paid: bool,
    pub price_label: String,
    pub limit_label: String,
    pub has_certificate: bool,
    pub certificate_label: String,
    pub has_image: bool,
    pub image_url: String,
    pub can_manage: bool,
    pub registered_count: usize,
    pub participants: Vec<ParticipantRowView>,
    pub search: String,
    pub notice_message: String,
}

pub async fn load_event_detail(
    api: &EntityApi,
    token: Option<&str>,
    viewer_id: &str,
    viewer_is_admin: bool,
    query: &EventDetailsQuery,
) -> Result<Option<EventDetailView>, FlowError> {
    let Some(event) = events::get_event(api, token, &query.id).await? else {
        return Ok(None);
    };
    let event_participants = participants::list_for_event(api, token, &event.id).await?;

    let can_manage = viewer_is_admin || event.organizer_id == viewer_id;
    let search = query.q.clone().unwrap_or_default();
    let needle = search.to_lowercase();

    let rows: Vec<ParticipantRowView> = event_participants
        .iter()
        .filter(|p| {
            needle.is_empty()
                || p.full_name.to_lowercase().contains(&needle)
                || p.email.to_lowercase().contains(&needle)
                || p.cpf.contains(&needle)
        })
        .map(build_participant_row)
        .collect();

    Ok(Some(EventDetailView {
        id: event.id.clone(),
        title: event.title.clone(),
        description: event.description.clone(),
        organizer_name: event.organizer_name.clone(),
        date_label: event_date_label(&event),
        session_date_labels: event
            .periodic_dates
            .iter()
            .map(|d| format_date_br(d))
            .collect(),
        is_periodic: event.is_periodic,
        time_label: format!("{} - {}", event.start_time, event.end_time),
        location: event.location.clone(),
        event_type: event.event_type.clone(),
        is_paid: event.is_paid,
        price_label: price_label(&event),
        limit_label: match event.registration_limit {
            Some(limit) => format!("{} / {}", event_participants.len(), limit),
            None => format!("{}", event_participants.len()),
        },
        has_certificate: event.has_certificate,
        certificate_label: match event.certificate_hours {
            Some(hours) => format!("Certificado disponível ({}h)", hours),
            None => "Certificado disponível".to_string(),
        },
        has_image: !event.image_url.is_empty(),
        image_url: event.image_url.clone(),
        can_manage,
        registered_count: event_participants.len(),
        participants: rows,
        search,
        notice_message: notice_message(query.notice.as_deref()),
    }))
}

fn build_participant_row(p: &Participant) -> ParticipantRowView {
    ParticipantRowView {
        id: p.id.clone(),
        full_name: p.full_name.clone(),
        email: p.email.clone(),
        cpf_label: format_cpf(&p.cpf),
        payment_label: p.payment_status.label().to_string(),
        has_proof: !p.payment_proof_url.is_empty(),
        payment_proof_url: p.payment_proof_url.clone(),
        checked_in: p.check_in_status,
        attendance_label: format!("{}%", p.attendance_percentage),
        certificate_issued: p.certificate_issued,
    }
}

fn notice_message(code: Option<&str>) -> String {
    match code {
        Some("manual_ok") => "Participante cadastrado com sucesso.".to_string(),
        Some("participant_ok") => "Participante atualizado com sucesso.".to_string(),
        Some("participant_removed") => "Participante excluído.".to_string(),
        Some("error") => "A operação falhou. Tente novamente.".to_string(),
        _ => String::new(),
    }
}

/// Patch used by the staff participant-edit form.
pub fn participant_edit_patch(
    full_name: &str,
    email: &str,
    cpf: &str,
    payment_status: &str,
) -> Result<Value, FlowError> {
    let cpf = crate::services::cpf::validate_cpf(cpf)?;
    if !matches!(payment_status, "pendente" | "pago" | "isento") {
        return Err(FlowError::validation("Status de pagamento inválido."));
    }
    Ok(json!({
        "full_name": full_name.trim(),
        "email": email.trim(),
        "cpf": cpf,
        "payment_status": payment_status,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(status: EventStatus, date: &str, periodic: Option<Vec<&str>>) -> Event {
        let periodic_dates: Vec<String> = periodic
            .clone()
            .unwrap_or_default()
            .into_iter()
            .map(String::from)
            .collect();
        Event {
            id: "E1".to_string(),
            title: "Encontro".to_string(),
            description: String::new(),
            date: date.to_string(),
            start_time: "19:00".to_string(),
            end_time: "21:00".to_string(),
            location: "Auditório".to_string(),
            event_type: "presencial".to_string(),
            is_paid: false,
            price: 0.0,
            pix_code: String::new(),
            registration_limit: None,
            has_certificate: false,
            certificate_hours: None,
            image_url: String::new(),
            status,
            is_periodic: periodic.is_some(),
            total_sessions: periodic_dates.len().max(1) as i64,
            periodic_dates,
            organizer_id: String::new(),
            organizer_name: String::new(),
            created_date: String::new(),
        }
    }

    #[test]
    fn draft_stays_draft_regardless_of_dates() {
        let e = event(EventStatus::Rascunho, "2020-01-01", None);
        assert_eq!(classify_event(&e, "2026-08-06"), EventPhase::Draft);
    }

    #[test]
    fn active_event_with_future_date_is_active() {
        let e = event(EventStatus::Ativo, "2026-08-06", None);
        assert_eq!(classify_event(&e, "2026-08-06"), EventPhase::Active);
        let e = event(EventStatus::Ativo, "2026-12-31", None);
        assert_eq!(classify_event(&e, "2026-08-06"), EventPhase::Active);
    }

    #[test]
    fn active_event_past_its_end_date_is_past() {
        let e = event(EventStatus::Ativo, "2026-08-05", None);
        assert_eq!(classify_event(&e, "2026-08-06"), EventPhase::Past);
    }

    #[test]
    fn periodic_event_uses_last_session_as_end() {
        let e = event(
            EventStatus::Ativo,
            "2026-08-01",
            Some(vec!["2026-08-01", "2026-08-08", "2026-08-15"]),
        );
        assert_eq!(classify_event(&e, "2026-08-10"), EventPhase::Active);
        assert_eq!(classify_event(&e, "2026-08-16"), EventPhase::Past);
    }

    #[test]
    fn closed_event_is_always_past() {
        let e = event(EventStatus::Encerrado, "2099-01-01", None);
        assert_eq!(classify_event(&e, "2026-08-06"), EventPhase::Past);
    }

    #[test]
    fn periodic_dates_are_sorted_and_deduplicated() {
        let dates = parse_periodic_dates("2026-08-15, 2026-08-01\n2026-08-08, 2026-08-01");
        assert_eq!(dates, vec!["2026-08-01", "2026-08-08", "2026-08-15"]);
    }

    #[test]
    fn garbage_tokens_are_dropped_from_periodic_dates() {
        let dates = parse_periodic_dates("2026-08-15, amanhã, 15/08/2026,,");
        assert_eq!(dates, vec!["2026-08-15"]);
    }

    #[test]
    fn date_formats_as_brazilian() {
        assert_eq!(format_date_br("2026-08-06"), "06/08/2026");
        assert_eq!(format_date_br("sem-data"), "sem-data");
    }
}
