// Input validation rules shared by the wizards.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

use crate::forms::ErrorMap;

const EMAIL_PATTERN: &str = r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$";
// Optional leading +, then digits with spaces / dashes / dots / parentheses.
const PHONE_PATTERN: &str = r"^\+?[0-9 ()\-.]{7,20}$";

static EMAIL_RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
static PHONE_RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

fn matches(cell: &'static OnceLock<Result<Regex, regex::Error>>, pattern: &str, value: &str) -> bool {
    cell.get_or_init(|| Regex::new(pattern))
        .as_ref()
        .map(|re| re.is_match(value))
        .unwrap_or(false)
}

pub fn is_valid_email(value: &str) -> bool {
    matches(&EMAIL_RE, EMAIL_PATTERN, value.trim())
}

/// 7 to 15 digits once separators are removed.
pub fn is_valid_phone(value: &str) -> bool {
    let value = value.trim();
    if !matches(&PHONE_RE, PHONE_PATTERN, value) {
        return false;
    }
    let digits = value.chars().filter(|c| c.is_ascii_digit()).count();
    (7..=15).contains(&digits)
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Required-presence check. Returns false (and records the error) when blank.
pub fn require(errors: &mut ErrorMap, path: &str, value: &str, label: &str) -> bool {
    if value.trim().is_empty() {
        errors.insert(path, format!("{} is required", label));
        return false;
    }
    true
}

pub fn check_email(errors: &mut ErrorMap, path: &str, value: &str) {
    if require(errors, path, value, "Email") && !is_valid_email(value) {
        errors.insert(path, "Enter a valid email address");
    }
}

pub fn check_phone(errors: &mut ErrorMap, path: &str, value: &str) {
    if require(errors, path, value, "Phone number") && !is_valid_phone(value) {
        errors.insert(path, "Enter a valid phone number");
    }
}

pub fn check_date(errors: &mut ErrorMap, path: &str, value: &str, label: &str) -> Option<NaiveDate> {
    if !require(errors, path, value, label) {
        return None;
    }
    let parsed = parse_date(value);
    if parsed.is_none() {
        errors.insert(path, format!("{} must use YYYY-MM-DD", label));
    }
    parsed
}

/// Password + confirmation rules. `min_len` differs per account type.
pub fn check_password_pair(
    errors: &mut ErrorMap,
    password_path: &str,
    confirm_path: &str,
    password: &str,
    confirm: &str,
    min_len: usize,
) {
    if require(errors, password_path, password, "Password") && password.chars().count() < min_len {
        errors.insert(
            password_path,
            format!("Password must be at least {} characters", min_len),
        );
    }
    if confirm.is_empty() {
        errors.insert(confirm_path, "Please confirm the password");
    } else if confirm != password {
        errors.insert(confirm_path, "Passwords do not match");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PasswordStrength {
    Weak,
    Fair,
    Good,
    Strong,
}

impl PasswordStrength {
    pub fn as_str(&self) -> &'static str {
        match self {
            PasswordStrength::Weak => "Weak",
            PasswordStrength::Fair => "Fair",
            PasswordStrength::Good => "Good",
            PasswordStrength::Strong => "Strong",
        }
    }
}

/// Heuristic: one point each for length >= 8, length >= 12, lower + upper
/// case, digits, symbols.
pub fn password_strength(password: &str) -> PasswordStrength {
    let len = password.chars().count();
    let has_lower = password.chars().any(|c| c.is_lowercase());
    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| !c.is_alphanumeric());

    let score = [len >= 8, len >= 12, has_lower && has_upper, has_digit, has_symbol]
        .iter()
        .filter(|hit| **hit)
        .count();

    match score {
        0 | 1 => PasswordStrength::Weak,
        2 => PasswordStrength::Fair,
        3 => PasswordStrength::Good,
        _ => PasswordStrength::Strong,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_format() {
        assert!(is_valid_email("ops@freight.example.com"));
        assert!(is_valid_email("  a.b+c@x.io "));
        assert!(!is_valid_email("ops@freight"));
        assert!(!is_valid_email("not an email"));
    }

    #[test]
    fn phone_format() {
        assert!(is_valid_phone("+44 20 7946 0958"));
        assert!(is_valid_phone("555-123-4567"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("call me"));
        assert!(!is_valid_phone("+1 234 567 890 123 456 7"));
    }

    #[test]
    fn mismatched_confirmation_is_reported_regardless_of_strength() {
        let mut errors = ErrorMap::new();
        check_password_pair(&mut errors, "password", "confirmPassword", "Abc12345", "Abc1234", 8);
        assert_eq!(errors.get("confirmPassword"), Some("Passwords do not match"));
        assert!(!errors.contains("password"));
    }

    #[test]
    fn short_password_respects_min_len() {
        let mut errors = ErrorMap::new();
        check_password_pair(&mut errors, "password", "confirm", "abc12", "abc12", 6);
        assert_eq!(
            errors.get("password"),
            Some("Password must be at least 6 characters")
        );

        let mut errors = ErrorMap::new();
        check_password_pair(&mut errors, "password", "confirm", "abc123", "abc123", 6);
        assert!(errors.is_empty());
    }

    #[test]
    fn strength_grows_with_variety() {
        assert_eq!(password_strength("abc"), PasswordStrength::Weak);
        assert_eq!(password_strength("abcdefgh1"), PasswordStrength::Fair);
        assert_eq!(password_strength("Abcdefgh1"), PasswordStrength::Good);
        assert_eq!(password_strength("Abcdefgh1234!"), PasswordStrength::Strong);
    }

    #[test]
    fn dates_use_iso_format() {
        let mut errors = ErrorMap::new();
        assert!(check_date(&mut errors, "d", "2026-03-01", "Pickup date").is_some());
        assert!(check_date(&mut errors, "d", "01/03/2026", "Pickup date").is_none());
        assert_eq!(errors.get("d"), Some("Pickup date must use YYYY-MM-DD"));
    }
}
