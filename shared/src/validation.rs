//! Validation utilities for the pizzeria back-office platform
//!
//! Includes Brazil-specific validations for supplier and payment data.

use chrono::NaiveDate;
use rust_decimal::Decimal;

// ============================================================================
// Engine Input Validations
// ============================================================================

/// Validate a monetary amount in cents is positive
pub fn validate_amount_cents(amount_cents: i64) -> Result<(), &'static str> {
    if amount_cents <= 0 {
        return Err("Amount must be a positive number of cents");
    }
    Ok(())
}

/// Validate a physical quantity is positive
pub fn validate_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate a recurrence day of month (1–31)
pub fn validate_recurrence_day(day: i16) -> Result<(), &'static str> {
    if !(1..=31).contains(&day) {
        return Err("Recurrence day must be between 1 and 31");
    }
    Ok(())
}

/// Validate a recurrence window: when both bounds are set, start must not
/// come after end.
pub fn validate_recurrence_window(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(), &'static str> {
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err("Recurrence start must not be after recurrence end");
        }
    }
    Ok(())
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

// ============================================================================
// Brazil-Specific Validations
// ============================================================================

/// Validate a Brazilian phone number.
/// Accepts: (11) 91234-5678, 1134567890, +55 11 91234-5678
pub fn validate_brazilian_phone(phone: &str) -> Result<(), &'static str> {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    // Landline: area code + 8 digits
    if digits.len() == 10 {
        return Ok(());
    }
    // Mobile: area code + 9 digits, mobile numbers start with 9
    if digits.len() == 11 && digits.as_bytes()[2] == b'9' {
        return Ok(());
    }
    // With country code 55
    if (digits.len() == 12 || digits.len() == 13) && digits.starts_with("55") {
        return Ok(());
    }

    Err("Invalid Brazilian phone number format")
}

/// Validate a CNPJ (Cadastro Nacional da Pessoa Jurídica) supplier tax
/// number: 14 digits with two modulo-11 check digits.
pub fn validate_cnpj(cnpj: &str) -> Result<(), &'static str> {
    let digits: Vec<u32> = cnpj.chars().filter_map(|c| c.to_digit(10)).collect();

    if digits.len() != 14 {
        return Err("CNPJ must have 14 digits");
    }
    // Sequences of a single repeated digit pass the checksum but are invalid
    if digits.windows(2).all(|w| w[0] == w[1]) {
        return Err("Invalid CNPJ");
    }

    let check = |len: usize| -> u32 {
        let weights = [6u32, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
        let offset = weights.len() - len;
        let sum: u32 = digits
            .iter()
            .take(len)
            .zip(&weights[offset..])
            .map(|(d, w)| d * w)
            .sum();
        let digit = 11 - (sum % 11);
        if digit >= 10 {
            0
        } else {
            digit
        }
    };

    if check(12) != digits[12] || check(13) != digits[13] {
        return Err("Invalid CNPJ checksum");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Engine Input Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_amount_cents() {
        assert!(validate_amount_cents(1).is_ok());
        assert!(validate_amount_cents(150_000).is_ok());
        assert!(validate_amount_cents(0).is_err());
        assert!(validate_amount_cents(-100).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(Decimal::new(1, 3)).is_ok()); // 0.001
        assert!(validate_quantity(Decimal::ZERO).is_err());
        assert!(validate_quantity(Decimal::from(-5)).is_err());
    }

    #[test]
    fn test_validate_recurrence_day() {
        assert!(validate_recurrence_day(1).is_ok());
        assert!(validate_recurrence_day(31).is_ok());
        assert!(validate_recurrence_day(0).is_err());
        assert!(validate_recurrence_day(32).is_err());
    }

    #[test]
    fn test_validate_recurrence_window() {
        let jan = NaiveDate::from_ymd_opt(2024, 1, 1);
        let jun = NaiveDate::from_ymd_opt(2024, 6, 1);
        assert!(validate_recurrence_window(jan, jun).is_ok());
        assert!(validate_recurrence_window(jan, None).is_ok());
        assert!(validate_recurrence_window(None, None).is_ok());
        assert!(validate_recurrence_window(jun, jan).is_err());
    }

    // ========================================================================
    // General Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_email_valid() {
        assert!(validate_email("test@example.com").is_ok());
        assert!(validate_email("dono@pizzaria.com.br").is_ok());
    }

    #[test]
    fn test_validate_email_invalid() {
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("no@domain").is_err());
        assert!(validate_email("@.").is_err());
    }

    // ========================================================================
    // Brazil-Specific Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_brazilian_phone_valid() {
        // Mobile with formatting
        assert!(validate_brazilian_phone("(11) 91234-5678").is_ok());
        // Landline
        assert!(validate_brazilian_phone("1134567890").is_ok());
        // International format
        assert!(validate_brazilian_phone("+55 11 91234-5678").is_ok());
    }

    #[test]
    fn test_validate_brazilian_phone_invalid() {
        assert!(validate_brazilian_phone("12345").is_err());
        // 11 digits but not a mobile prefix
        assert!(validate_brazilian_phone("11812345678").is_err());
        assert!(validate_brazilian_phone("abcdefghij").is_err());
    }

    #[test]
    fn test_validate_cnpj_valid() {
        assert!(validate_cnpj("11.222.333/0001-81").is_ok());
        assert!(validate_cnpj("11222333000181").is_ok());
    }

    #[test]
    fn test_validate_cnpj_invalid() {
        // Wrong length
        assert!(validate_cnpj("112223330001").is_err());
        // Bad checksum
        assert!(validate_cnpj("11222333000182").is_err());
        // Repeated digits
        assert!(validate_cnpj("00000000000000").is_err());
    }
}
