use crate::error::{AppError, AppResult};
use bcrypt::{DEFAULT_COST, hash, verify};

pub const MIN_PASSWORD_CHARS: usize = 8;
pub const MAX_PASSWORD_CHARS: usize = 128;

/// Character classes every account password has to contain.
const REQUIRED_CLASSES: [(&str, fn(char) -> bool); 3] = [
    ("a lowercase letter", char::is_lowercase),
    ("an uppercase letter", char::is_uppercase),
    ("a digit", |c| c.is_ascii_digit()),
];

/// Checks a registration password against the account policy. Length is
/// counted in characters so non-ASCII passwords are not penalised.
pub fn validate_password(password: &str) -> AppResult<()> {
    let chars = password.chars().count();
    if !(MIN_PASSWORD_CHARS..=MAX_PASSWORD_CHARS).contains(&chars) {
        return Err(AppError::ValidationError(format!(
            "Password must be between {MIN_PASSWORD_CHARS} and {MAX_PASSWORD_CHARS} characters"
        )));
    }

    let missing: Vec<&str> = REQUIRED_CLASSES
        .iter()
        .filter(|(_, present)| !password.chars().any(*present))
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        return Err(AppError::ValidationError(format!(
            "Password must contain {}",
            missing.join(", ")
        )));
    }

    Ok(())
}

pub fn hash_password(password: &str) -> AppResult<String> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::InternalError(format!("password hashing failed: {e}")))
}

/// A malformed stored hash is an internal error, not a failed login.
pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    verify(password, password_hash)
        .map_err(|e| AppError::InternalError(format!("password verification failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(err: AppError) -> String {
        match err {
            AppError::ValidationError(msg) => msg,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_password_length_bounds() {
        assert!(validate_password("Charge12").is_ok());
        assert!(validate_password("Charge1").is_err());
        let longest = format!("Ab1{}", "x".repeat(MAX_PASSWORD_CHARS - 3));
        assert!(validate_password(&longest).is_ok());
        assert!(validate_password(&format!("{longest}y")).is_err());
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // 7 characters, more than 8 bytes
        assert!(validate_password("Ünïcö1d").is_err());
        assert!(validate_password("Ünïcö1de").is_ok());
    }

    #[test]
    fn test_missing_classes_are_named() {
        let msg = message(validate_password("powerbank99").unwrap_err());
        assert!(msg.contains("an uppercase letter"));
        assert!(!msg.contains("a digit"));

        let msg = message(validate_password("POWERBANK").unwrap_err());
        assert!(msg.contains("a lowercase letter"));
        assert!(msg.contains("a digit"));
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hashed = hash_password("Station42ok").unwrap();
        assert!(verify_password("Station42ok", &hashed).unwrap());
        assert!(!verify_password("Station42no", &hashed).unwrap());
        assert!(verify_password("Station42ok", "not-a-bcrypt-hash").is_err());
    }
}
