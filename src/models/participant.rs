use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pendente,
    Pago,
    Isento,
}

impl PaymentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::Pendente => "Pendente",
            PaymentStatus::Pago => "Pago",
            PaymentStatus::Isento => "Isento",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pendente => "pendente",
            PaymentStatus::Pago => "pago",
            PaymentStatus::Isento => "isento",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Antecipado,
    NoLocal,
}

/// Participant as stored in the remote entity store.
///
/// `attended_sessions` holds ISO dates, append-only and without duplicates;
/// `sessions_attended_count` and `attendance_percentage` are derived from it
/// on every attendance mutation and never edited independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub event_id: String,
    #[serde(default)]
    pub registration_number: String,
    pub cpf: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub qr_code: String,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub payment_proof_url: String,
    #[serde(default)]
    pub check_in_status: bool,
    #[serde(default)]
    pub check_in_date: Option<String>,
    #[serde(default)]
    pub attended_sessions: Vec<String>,
    #[serde(default)]
    pub sessions_attended_count: i64,
    #[serde(default)]
    pub attendance_percentage: i64,
    #[serde(default)]
    pub certificate_issued: bool,
    #[serde(default)]
    pub created_date: String,
}
