//! Field-level format checks shared by validation and completion tracking

use validator::ValidateEmail;

/// Minimum number of digits a phone number must carry
pub const MIN_PHONE_DIGITS: usize = 9;
/// Minimum length of a company registration number (ICO)
pub const MIN_ICO_LENGTH: usize = 8;
/// Minimum length of a tax identification number (DIC)
pub const MIN_DIC_LENGTH: usize = 10;

/// Address pattern check; the domain part must contain a dot.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim().to_string();
    if !email.validate_email() {
        return false;
    }
    email
        .rsplit_once('@')
        .map(|(_, domain)| domain.contains('.') && !domain.ends_with('.'))
        .unwrap_or(false)
}

pub fn digit_count(value: &str) -> usize {
    value.chars().filter(|c| c.is_ascii_digit()).count()
}

pub fn is_valid_phone(phone: &str) -> bool {
    digit_count(phone) >= MIN_PHONE_DIGITS
}

/// Length check ignoring surrounding and embedded whitespace
pub fn has_min_length(value: &str, min: usize) -> bool {
    value.chars().filter(|c| !c.is_whitespace()).count() >= min
}
