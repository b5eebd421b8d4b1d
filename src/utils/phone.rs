use crate::error::{AppError, AppResult};
use regex::Regex;

/// Nepal mobile number in E.164 form: +977 followed by 10 digits starting with 9.
pub fn validate_np_phone(phone: &str) -> AppResult<()> {
    let phone_regex = Regex::new(r"^\+9779\d{9}$")
        .map_err(|e| AppError::InternalError(format!("phone regex: {e}")))?;

    if !phone_regex.is_match(phone) {
        return Err(AppError::ValidationError(
            "Invalid phone number, expected Nepal format (+977 98XXXXXXXX)".to_string(),
        ));
    }

    Ok(())
}

/// Normalizes local input to +977 form.
pub fn format_np_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() == 13 && digits.starts_with("977") {
        format!("+{digits}")
    } else if digits.len() == 10 {
        format!("+977{digits}")
    } else {
        phone.to_string()
    }
}

pub fn validate_email(email: &str) -> AppResult<()> {
    let email_regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
        .map_err(|e| AppError::InternalError(format!("email regex: {e}")))?;
    if email.len() > 254 || !email_regex.is_match(email) {
        return Err(AppError::ValidationError("Invalid email address".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_np_phone() {
        assert!(validate_np_phone("+9779812345678").is_ok());
        assert!(validate_np_phone("+977981234567").is_err());
        assert!(validate_np_phone("9812345678").is_err());
        assert!(validate_np_phone("+9771812345678").is_err());
    }

    #[test]
    fn test_format_np_phone() {
        assert_eq!(format_np_phone("9812345678"), "+9779812345678");
        assert_eq!(format_np_phone("9779812345678"), "+9779812345678");
        assert_eq!(format_np_phone("+977 981-234-5678"), "+9779812345678");
        assert_eq!(format_np_phone("12345"), "12345");
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ram@example.com").is_ok());
        assert!(validate_email("ram@example").is_err());
        assert!(validate_email("ram example@x.com").is_err());
        assert!(validate_email("").is_err());
    }
}
