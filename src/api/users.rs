use serde_json::Value;

use crate::api::client::{EntityApi, UpstreamError};
use crate::models::User;

const ENTITY: &str = "User";

pub async fn list_users(api: &EntityApi, token: Option<&str>) -> Result<Vec<User>, UpstreamError> {
    api.list(ENTITY, token, None).await
}

pub async fn update_user(
    api: &EntityApi,
    token: Option<&str>,
    user_id: &str,
    patch: &Value,
) -> Result<User, UpstreamError> {
    api.update(ENTITY, token, user_id, patch).await
}

pub async fn delete_user(
    api: &EntityApi,
    token: Option<&str>,
    user_id: &str,
) -> Result<(), UpstreamError> {
    api.delete(ENTITY, token, user_id).await
}
