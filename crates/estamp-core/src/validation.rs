//! # Validation Module
//!
//! Input validation for orders, templates and promo codes.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend wizard                                              │
//! │  └── Field masks, immediate feedback                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: HTTP handler (Rust)                                          │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints (non-negative amounts)                          │
//! │  └── UNIQUE (state, document_type), UNIQUE promo code                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validators that clean their input (trim, strip `+91`) return the cleaned
//! value so callers store exactly what was checked.

use uuid::Uuid;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::StampTemplate;
use crate::{MAX_AMOUNT, MAX_NAME_LENGTH, MAX_PROMO_CODE_LENGTH, MAX_TEXT_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn required(field: &str) -> ValidationError {
    ValidationError::Required {
        field: field.to_string(),
    }
}

fn invalid(field: &str, reason: &str) -> ValidationError {
    ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Trims `value` and checks it is present and at most `max` characters.
fn required_text(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(required(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

/// Trims optional free text; blank becomes `None`.
pub fn validate_optional_text(field: &str, value: Option<&str>) -> ValidationResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => required_text(field, v, MAX_TEXT_LENGTH).map(Some),
    }
}

// =============================================================================
// Party Validators
// =============================================================================

/// Validates a party name printed on the stamp paper.
///
/// ## Example
/// ```rust
/// use estamp_core::validation::validate_party_name;
///
/// assert_eq!(validate_party_name("first_party.name", "  Asha Rao ").unwrap(), "Asha Rao");
/// assert!(validate_party_name("first_party.name", "   ").is_err());
/// ```
pub fn validate_party_name(field: &str, name: &str) -> ValidationResult<String> {
    required_text(field, name, MAX_NAME_LENGTH)
}

/// Validates an Indian mobile number and returns its 10-digit form.
///
/// ## Rules
/// - Optional `+91` / `91` country prefix, spaces and hyphens ignored
/// - Exactly 10 digits remain
/// - First digit is 6, 7, 8 or 9
///
/// ## Example
/// ```rust
/// use estamp_core::validation::validate_phone;
///
/// assert_eq!(validate_phone("phone", "+91 98765-43210").unwrap(), "9876543210");
/// assert!(validate_phone("phone", "5876543210").is_err());
/// ```
pub fn validate_phone(field: &str, phone: &str) -> ValidationResult<String> {
    let compact: String = phone
        .trim()
        .chars()
        .filter(|c| *c != ' ' && *c != '-')
        .collect();

    if compact.is_empty() {
        return Err(required(field));
    }

    let local = compact
        .strip_prefix("+91")
        .or_else(|| compact.strip_prefix("91").filter(|rest| rest.len() == 10))
        .unwrap_or(&compact);

    if local.len() != 10 || !local.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid(field, "must be a 10-digit mobile number"));
    }

    if !matches!(local.as_bytes()[0], b'6'..=b'9') {
        return Err(invalid(field, "must start with 6, 7, 8 or 9"));
    }

    Ok(local.to_string())
}

/// Validates an optional customer email; blank becomes `None`.
pub fn validate_email(email: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) else {
        return Ok(None);
    };

    if email.len() > 254 {
        return Err(ValidationError::TooLong {
            field: "customer_email".to_string(),
            max: 254,
        });
    }

    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.') =>
        {
            Ok(Some(email.to_string()))
        }
        _ => Err(invalid("customer_email", "must be an email address")),
    }
}

// =============================================================================
// Order Validators
// =============================================================================

/// Resolves the stamp amount for an order against its template.
///
/// A missing amount defaults to the template base price; an amount below it
/// or above [`MAX_AMOUNT`] is rejected.
pub fn validate_stamp_amount(amount: Option<Money>, template: &StampTemplate) -> ValidationResult<Money> {
    let amount = amount.unwrap_or(template.base_price);

    if !template.accepts_stamp_amount(amount) {
        return Err(ValidationError::BelowMinimum {
            field: "stamp_amount".to_string(),
            minimum: template.base_price,
        });
    }

    check_max_amount("stamp_amount", amount, template.base_price.paise())?;
    Ok(amount)
}

fn check_max_amount(field: &str, amount: Money, min: i64) -> ValidationResult<()> {
    if amount > MAX_AMOUNT {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max: MAX_AMOUNT.paise(),
        });
    }
    Ok(())
}

/// Checks the delivery address against the doorstep flag.
///
/// ## Rules
/// - Doorstep delivery requires a non-blank address
/// - Without doorstep delivery any address is dropped
pub fn validate_delivery_address(doorstep_delivery: bool, address: Option<&str>) -> ValidationResult<Option<String>> {
    if !doorstep_delivery {
        return Ok(None);
    }

    let address = address.ok_or_else(|| required("delivery_address"))?;
    required_text("delivery_address", address, MAX_TEXT_LENGTH).map(Some)
}

/// Parses an entity id.
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<Uuid> {
    Uuid::parse_str(id.trim()).map_err(|_| invalid(field, "must be a UUID"))
}

// =============================================================================
// Catalog Validators
// =============================================================================

/// Validates a template key, returning the trimmed `(state, document_type)`.
pub fn validate_template_key(state: &str, document_type: &str) -> ValidationResult<(String, String)> {
    Ok((
        required_text("state", state, MAX_NAME_LENGTH)?,
        required_text("document_type", document_type, MAX_NAME_LENGTH)?,
    ))
}

/// Validates template prices: a positive base price and a non-negative fee,
/// both at most [`MAX_AMOUNT`].
pub fn validate_template_prices(base_price: Money, convenience_fee: Money) -> ValidationResult<()> {
    if !base_price.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "base_price".to_string(),
        });
    }

    if convenience_fee.is_negative() {
        return Err(invalid("convenience_fee", "cannot be negative"));
    }

    check_max_amount("base_price", base_price, 1)?;
    check_max_amount("convenience_fee", convenience_fee, 0)
}

/// Validates the shape of a promo code.
///
/// Codes are case-sensitive, so only surrounding whitespace is removed.
///
/// ## Example
/// ```rust
/// use estamp_core::validation::validate_promo_code_format;
///
/// assert_eq!(validate_promo_code_format(" SUPER ").unwrap(), "SUPER");
/// assert!(validate_promo_code_format("NO SPACES").is_err());
/// ```
pub fn validate_promo_code_format(code: &str) -> ValidationResult<String> {
    let code = required_text("code", code, MAX_PROMO_CODE_LENGTH)?;

    if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(invalid("code", "must contain only letters, numbers, hyphens, and underscores"));
    }

    Ok(code)
}

// =============================================================================
// Fulfilment Validators
// =============================================================================

/// Validates the download link of a generated stamp paper.
pub fn validate_artifact_url(url: &str) -> ValidationResult<String> {
    let url = required_text("artifact_url", url, MAX_TEXT_LENGTH)?;

    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(invalid("artifact_url", "must be an http(s) URL"));
    }

    Ok(url)
}

/// Validates the operator's explanation for a failed generation.
pub fn validate_failure_reason(reason: &str) -> ValidationResult<String> {
    required_text("reason", reason, MAX_TEXT_LENGTH)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn template() -> StampTemplate {
        StampTemplate {
            id: "t-1".to_string(),
            state: "Karnataka".to_string(),
            document_type: "Rental Agreement".to_string(),
            base_price: Money::from_paise(10100),
            convenience_fee: Money::from_paise(7697),
            description: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_validate_phone() {
        assert_eq!(validate_phone("phone", "9876543210").unwrap(), "9876543210");
        assert_eq!(validate_phone("phone", "+919876543210").unwrap(), "9876543210");
        assert_eq!(validate_phone("phone", "919876543210").unwrap(), "9876543210");
        assert_eq!(validate_phone("phone", "98765 43210").unwrap(), "9876543210");

        assert!(matches!(
            validate_phone("phone", ""),
            Err(ValidationError::Required { .. })
        ));
        assert!(validate_phone("phone", "1234567890").is_err());
        assert!(validate_phone("phone", "98765").is_err());
        assert!(validate_phone("phone", "98765432101").is_err());
        assert!(validate_phone("phone", "98765abcde").is_err());
    }

    #[test]
    fn test_validate_party_name() {
        assert!(validate_party_name("name", "Ravi").is_ok());
        assert!(matches!(
            validate_party_name("name", &"x".repeat(101)),
            Err(ValidationError::TooLong { max: 100, .. })
        ));
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email(None).unwrap(), None);
        assert_eq!(validate_email(Some("  ")).unwrap(), None);
        assert_eq!(
            validate_email(Some("asha@example.in")).unwrap(),
            Some("asha@example.in".to_string())
        );
        assert!(validate_email(Some("asha")).is_err());
        assert!(validate_email(Some("@example.in")).is_err());
        assert!(validate_email(Some("asha@localhost")).is_err());
    }

    #[test]
    fn test_validate_stamp_amount() {
        let t = template();
        assert_eq!(validate_stamp_amount(None, &t).unwrap().paise(), 10100);
        assert_eq!(
            validate_stamp_amount(Some(Money::from_paise(50000)), &t).unwrap().paise(),
            50000
        );
        assert!(matches!(
            validate_stamp_amount(Some(Money::from_paise(10000)), &t),
            Err(ValidationError::BelowMinimum { .. })
        ));
        assert_eq!(validate_stamp_amount(Some(MAX_AMOUNT), &t).unwrap(), MAX_AMOUNT);
        assert!(matches!(
            validate_stamp_amount(Some(Money::from_paise(i64::MAX)), &t),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_validate_template_prices_upper_bound() {
        assert!(validate_template_prices(Money::from_paise(10100), Money::zero()).is_ok());
        assert!(matches!(
            validate_template_prices(Money::from_paise(i64::MAX), Money::zero()),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(matches!(
            validate_template_prices(Money::from_paise(10100), Money::from_paise(i64::MAX)),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_validate_delivery_address() {
        assert_eq!(validate_delivery_address(false, Some("12 MG Road")).unwrap(), None);
        assert_eq!(
            validate_delivery_address(true, Some(" 12 MG Road ")).unwrap(),
            Some("12 MG Road".to_string())
        );
        assert!(validate_delivery_address(true, None).is_err());
        assert!(validate_delivery_address(true, Some("  ")).is_err());
    }

    #[test]
    fn test_validate_template_prices() {
        assert!(validate_template_prices(Money::from_paise(10100), Money::zero()).is_ok());
        assert!(validate_template_prices(Money::zero(), Money::zero()).is_err());
        assert!(validate_template_prices(Money::from_paise(100), Money::from_paise(-1)).is_err());
    }

    #[test]
    fn test_validate_promo_code_format_is_case_preserving() {
        assert_eq!(validate_promo_code_format("Super10").unwrap(), "Super10");
        assert!(validate_promo_code_format("").is_err());
        assert!(validate_promo_code_format(&"A".repeat(33)).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("id", "not-a-uuid").is_err());
    }

    #[test]
    fn test_validate_artifact_url() {
        assert_eq!(
            validate_artifact_url(" https://files.example.com/ES-1.pdf ").unwrap(),
            "https://files.example.com/ES-1.pdf"
        );
        assert!(validate_artifact_url("ftp://files.example.com/ES-1.pdf").is_err());
        assert!(matches!(
            validate_failure_reason("  "),
            Err(ValidationError::Required { .. })
        ));
    }
}
