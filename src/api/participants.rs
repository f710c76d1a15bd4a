use serde_json::Value;

use crate::api::client::{EntityApi, UpstreamError};
use crate::models::Participant;

const ENTITY: &str = "Participant";

pub async fn list_all(
    api: &EntityApi,
    token: Option<&str>,
) -> Result<Vec<Participant>, UpstreamError> {
    api.list(ENTITY, token, None).await
}

pub async fn list_for_event(
    api: &EntityApi,
    token: Option<&str>,
    event_id: &str,
) -> Result<Vec<Participant>, UpstreamError> {
    api.filter(ENTITY, token, &[("event_id", event_id)]).await
}

pub async fn get_participant(
    api: &EntityApi,
    token: Option<&str>,
    participant_id: &str,
) -> Result<Option<Participant>, UpstreamError> {
    let rows: Vec<Participant> = api.filter(ENTITY, token, &[("id", participant_id)]).await?;
    Ok(rows.into_iter().next())
}

pub async fn find_by_cpf(
    api: &EntityApi,
    token: Option<&str>,
    event_id: &str,
    cpf: &str,
) -> Result<Vec<Participant>, UpstreamError> {
    api.filter(ENTITY, token, &[("event_id", event_id), ("cpf", cpf)])
        .await
}

pub async fn find_by_qr_code(
    api: &EntityApi,
    token: Option<&str>,
    event_id: &str,
    qr_code: &str,
) -> Result<Vec<Participant>, UpstreamError> {
    api.filter(ENTITY, token, &[("event_id", event_id), ("qr_code", qr_code)])
        .await
}

pub async fn create_participant(
    api: &EntityApi,
    token: Option<&str>,
    fields: &Value,
) -> Result<Participant, UpstreamError> {
    api.create(ENTITY, token, fields).await
}

pub async fn update_participant(
    api: &EntityApi,
    token: Option<&str>,
    participant_id: &str,
    patch: &Value,
) -> Result<Participant, UpstreamError> {
    api.update(ENTITY, token, participant_id, patch).await
}

pub async fn delete_participant(
    api: &EntityApi,
    token: Option<&str>,
    participant_id: &str,
) -> Result<(), UpstreamError> {
    api.delete(ENTITY, token, participant_id).await
}
