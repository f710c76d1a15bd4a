use crate::api::UpstreamError;

/// Domain failures surfaced to the form boundary.
///
/// Validation and lookup problems render inline next to the form that
/// caused them; remote failures collapse to a single generic message with
/// no automatic retry.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("Check-in já realizado hoje")]
    DuplicateCheckIn,
    #[error("remote operation failed: {0}")]
    Remote(#[from] UpstreamError),
    #[error("acesso negado")]
    Authorization,
}

impl FlowError {
    pub fn validation(message: impl Into<String>) -> Self {
        FlowError::Validation(message.into())
    }

    /// Message shown to the user. Remote detail stays in the logs.
    pub fn user_message(&self) -> String {
        match self {
            FlowError::Validation(msg) => msg.clone(),
            FlowError::NotFound(msg) => (*msg).to_string(),
            FlowError::DuplicateCheckIn => "Check-in já realizado hoje".to_string(),
            FlowError::Remote(_) => {
                "Erro ao comunicar com o servidor. Tente novamente.".to_string()
            }
            FlowError::Authorization => "Acesso negado.".to_string(),
        }
    }
}
