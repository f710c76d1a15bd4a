use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Rascunho,
    Ativo,
    Encerrado,
}

/// Event as stored in the remote entity store. Dates are ISO `YYYY-MM-DD`
/// strings and compare lexicographically; `periodic_dates` is kept sorted
/// ascending on save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub pix_code: String,
    #[serde(default)]
    pub registration_limit: Option<i64>,
    #[serde(default)]
    pub has_certificate: bool,
    #[serde(default)]
    pub certificate_hours: Option<f64>,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub is_periodic: bool,
    #[serde(default)]
    pub periodic_dates: Vec<String>,
    #[serde(default = "default_total_sessions")]
    pub total_sessions: i64,
    #[serde(default)]
    pub organizer_id: String,
    #[serde(default)]
    pub organizer_name: String,
    #[serde(default)]
    pub created_date: String,
}

fn default_total_sessions() -> i64 {
    1
}

impl Event {
    /// Last session date for periodic events, plain `date` otherwise.
    pub fn end_date(&self) -> &str {
        if self.is_periodic {
            if let Some(last) = self.periodic_dates.last() {
                return last;
            }
        }
        &self.date
    }
}
