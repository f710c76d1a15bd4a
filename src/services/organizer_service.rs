use serde_json::json;

use crate::api::{users, EntityApi};
use crate::services::error::FlowError;
use crate::services::event_service::format_date_br;

pub struct OrganizerRowView {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub contact_phone: String,
    pub created_label: String,
    pub profile_image_url: String,
    pub has_photo: bool,
}

/// Organizer accounts (role "user"), optionally filtered by name/email.
pub async fn list_organizers(
    api: &EntityApi,
    token: Option<&str>,
    search: &str,
) -> Result<Vec<OrganizerRowView>, FlowError> {
    let all = users::list_users(api, token).await?;
    let needle = search.to_lowercase();

    let rows = all
        .into_iter()
        .filter(|u| u.is_organizer_account())
        .filter(|u| {
            needle.is_empty()
                || u.full_name.to_lowercase().contains(&needle)
                || u.email.to_lowercase().contains(&needle)
        })
        .map(|u| OrganizerRowView {
            created_label: format_date_br(u.created_date.get(0..10).unwrap_or("")),
            has_photo: !u.profile_image_url.is_empty(),
            id: u.id,
            full_name: u.full_name,
            email: u.email,
            contact_phone: u.contact_phone,
            profile_image_url: u.profile_image_url,
        })
        .collect();
    Ok(rows)
}

/// The platform owns user provisioning; direct creation is refused upstream,
/// so the form surfaces that instead of pretending.
pub fn create_organizer_rejected() -> FlowError {
    FlowError::validation(
        "A plataforma não permite criação direta de usuários. \
         Use o convite de usuários no painel administrativo.",
    )
}

pub async fn update_organizer(
    api: &EntityApi,
    token: Option<&str>,
    user_id: &str,
    full_name: &str,
    email: &str,
    contact_phone: &str,
    profile_image_url: &str,
) -> Result<(), FlowError> {
    let patch = json!({
        "full_name": full_name.trim(),
        "email": email.trim(),
        "contact_phone": contact_phone.trim(),
        "profile_image_url": profile_image_url,
    });
    users::update_user(api, token, user_id, &patch).await?;
    Ok(())
}

pub async fn delete_organizer(
    api: &EntityApi,
    token: Option<&str>,
    user_id: &str,
) -> Result<(), FlowError> {
    users::delete_user(api, token, user_id).await?;
    Ok(())
}
