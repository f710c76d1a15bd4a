use serde::{Deserialize, Serialize};

/// Account in the remote auth/user store. Role "admin" manages everything;
/// role "user" is an organizer account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub contact_phone: String,
    #[serde(default)]
    pub profile_image_url: String,
    #[serde(default)]
    pub created_date: String,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }

    pub fn is_organizer_account(&self) -> bool {
        self.role == "user"
    }
}
