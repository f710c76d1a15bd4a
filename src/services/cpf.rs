use crate::services::error::FlowError;

/// Strip everything but digits.
pub fn clean_cpf(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Cleaned 11-digit CPF or a validation error.
pub fn validate_cpf(value: &str) -> Result<String, FlowError> {
    let digits = clean_cpf(value);
    if digits.len() != 11 {
        return Err(FlowError::validation(
            "CPF inválido. Deve conter 11 dígitos.",
        ));
    }
    Ok(digits)
}

/// `DDD.DDD.DDD-DD` display form. Idempotent; anything that does not clean
/// to 11 digits is returned untouched.
pub fn format_cpf(value: &str) -> String {
    let digits = clean_cpf(value);
    if digits.len() != 11 {
        return value.to_string();
    }
    format!(
        "{}.{}.{}-{}",
        &digits[0..3],
        &digits[3..6],
        &digits[6..9],
        &digits[9..11]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_plain_digits() {
        assert_eq!(format_cpf("52998224725"), "529.982.247-25");
    }

    #[test]
    fn format_is_idempotent() {
        let once = format_cpf("52998224725");
        assert_eq!(format_cpf(&once), once);
    }

    #[test]
    fn short_input_passes_through() {
        assert_eq!(format_cpf("1234"), "1234");
    }

    #[test]
    fn validate_strips_punctuation() {
        assert_eq!(validate_cpf("529.982.247-25").unwrap(), "52998224725");
    }

    #[test]
    fn validate_rejects_wrong_length() {
        assert!(matches!(
            validate_cpf("1234567890"),
            Err(FlowError::Validation(_))
        ));
        assert!(matches!(validate_cpf(""), Err(FlowError::Validation(_))));
    }
}
