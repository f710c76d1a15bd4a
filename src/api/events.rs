use serde_json::Value;

use crate::api::client::{EntityApi, UpstreamError};
use crate::models::Event;

const ENTITY: &str = "Event";

pub async fn list_events(
    api: &EntityApi,
    token: Option<&str>,
) -> Result<Vec<Event>, UpstreamError> {
    api.list(ENTITY, token, Some("-created_date")).await
}

pub async fn get_event(
    api: &EntityApi,
    token: Option<&str>,
    event_id: &str,
) -> Result<Option<Event>, UpstreamError> {
    let events: Vec<Event> = api.filter(ENTITY, token, &[("id", event_id)]).await?;
    Ok(events.into_iter().next())
}

pub async fn create_event(
    api: &EntityApi,
    token: Option<&str>,
    fields: &Value,
) -> Result<Event, UpstreamError> {
    api.create(ENTITY, token, fields).await
}

pub async fn update_event(
    api: &EntityApi,
    token: Option<&str>,
    event_id: &str,
    patch: &Value,
) -> Result<Event, UpstreamError> {
    api.update(ENTITY, token, event_id, patch).await
}
