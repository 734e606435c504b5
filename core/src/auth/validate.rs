use crate::error::ValidationError;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_PHONE_DIGITS: usize = 10;
pub const MAX_PHONE_DIGITS: usize = 15;

/// `local@domain.tld`: one `@`, no whitespace, and a dot inside the domain
/// with text on both sides.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidEmail);
    }
    let (local, domain) = email
        .split_once('@')
        .ok_or(ValidationError::InvalidEmail)?;
    if local.is_empty() || domain.contains('@') {
        return Err(ValidationError::InvalidEmail);
    }
    let dotted = domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len());
    if !dotted {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

/// Length is counted in UTF-16 code units, the way a browser counts it.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.encode_utf16().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

/// Byte-for-byte equality, no normalization.
pub fn validate_confirmation(password: &str, confirm: &str) -> Result<(), ValidationError> {
    if password.as_bytes() != confirm.as_bytes() {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let ok = (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&phone.len())
        && phone.bytes().all(|b| b.is_ascii_digit());
    if !ok {
        return Err(ValidationError::InvalidPhone);
    }
    Ok(())
}
