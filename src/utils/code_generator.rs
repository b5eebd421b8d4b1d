use chrono::Utc;
use rand::Rng;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Random uppercase code without look-alike characters (no 0/O, 1/I).
pub fn generate_alphanumeric_code(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// 8 character referral code shared by a user with invitees.
pub fn generate_referral_code() -> String {
    generate_alphanumeric_code(8)
}

/// Rental reference shown to users, e.g. `RNT-20251018-7K3QX9`.
pub fn generate_rental_code() -> String {
    format!(
        "RNT-{}-{}",
        Utc::now().format("%Y%m%d"),
        generate_alphanumeric_code(6)
    )
}

/// Wallet transaction reference, e.g. `TXN` + 24 hex chars.
pub fn generate_transaction_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("TXN{}", id[..24].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_referral_code_shape() {
        let code = generate_referral_code();
        assert_eq!(code.len(), 8);
        assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        assert!(!code.contains('0') && !code.contains('O'));
    }

    #[test]
    fn test_rental_code_shape() {
        let code = generate_rental_code();
        assert!(code.starts_with("RNT-"));
        assert_eq!(code.len(), "RNT-".len() + 8 + 1 + 6);
    }

    #[test]
    fn test_transaction_id_shape() {
        let id = generate_transaction_id();
        assert!(id.starts_with("TXN"));
        assert_eq!(id.len(), 27);
        assert_ne!(id, generate_transaction_id());
    }
}
