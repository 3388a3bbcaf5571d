//! Common types used across the platform

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Measurement unit for ingredient quantities.
///
/// Two disjoint categories: mass (gram, kilogram) and count (unit-of-item).
/// Mass units convert between each other by a fixed factor of 1000; the count
/// category never converts to or from mass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MeasurementUnit {
    #[serde(rename = "g")]
    Gram,
    #[serde(rename = "kg")]
    Kilogram,
    #[serde(rename = "un")]
    Unit,
}

impl MeasurementUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementUnit::Gram => "g",
            MeasurementUnit::Kilogram => "kg",
            MeasurementUnit::Unit => "un",
        }
    }

    /// Parse a stored unit value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "g" => Some(MeasurementUnit::Gram),
            "kg" => Some(MeasurementUnit::Kilogram),
            "un" => Some(MeasurementUnit::Unit),
            _ => None,
        }
    }

    /// Map a legacy unit value onto the supported set.
    ///
    /// Historical data used milliliters, liters, slices and pinches; those
    /// migrate as ml→g, l→kg, slice→un, pinch→g (the same mapping the SQL
    /// data migration applies).
    pub fn from_legacy(value: &str) -> Option<Self> {
        match value {
            "g" | "ml" | "pitada" | "pinch" => Some(MeasurementUnit::Gram),
            "kg" | "l" => Some(MeasurementUnit::Kilogram),
            "un" | "fatia" | "slice" => Some(MeasurementUnit::Unit),
            _ => None,
        }
    }

    /// Whether this unit is in the mass category (gram or kilogram).
    pub fn is_mass(&self) -> bool {
        matches!(self, MeasurementUnit::Gram | MeasurementUnit::Kilogram)
    }
}

impl std::fmt::Display for MeasurementUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment methods accepted by the pizzeria
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Pix,
    BankTransfer,
    CreditCard,
    DebitCard,
    BankSlip,
    DirectDebit,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Pix => "pix",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::BankSlip => "bank_slip",
            PaymentMethod::DirectDebit => "direct_debit",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "cash" => Some(PaymentMethod::Cash),
            "pix" => Some(PaymentMethod::Pix),
            "bank_transfer" => Some(PaymentMethod::BankTransfer),
            "credit_card" => Some(PaymentMethod::CreditCard),
            "debit_card" => Some(PaymentMethod::DebitCard),
            "bank_slip" => Some(PaymentMethod::BankSlip),
            "direct_debit" => Some(PaymentMethod::DirectDebit),
            _ => None,
        }
    }
}

/// Convert an amount of integer cents to a display value in whole currency
/// units. Derivation happens at presentation time only; storage and
/// arithmetic stay in cents.
pub fn cents_to_display(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Round a decimal amount of cents to whole cents (half away from zero).
pub fn round_cents(amount: Decimal) -> i64 {
    use rust_decimal::prelude::ToPrimitive;
    amount
        .round_dp_with_strategy(0, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_unit_round_trip() {
        for unit in [
            MeasurementUnit::Gram,
            MeasurementUnit::Kilogram,
            MeasurementUnit::Unit,
        ] {
            assert_eq!(MeasurementUnit::parse(unit.as_str()), Some(unit));
        }
    }

    #[test]
    fn test_legacy_unit_mapping() {
        assert_eq!(
            MeasurementUnit::from_legacy("ml"),
            Some(MeasurementUnit::Gram)
        );
        assert_eq!(
            MeasurementUnit::from_legacy("l"),
            Some(MeasurementUnit::Kilogram)
        );
        assert_eq!(
            MeasurementUnit::from_legacy("fatia"),
            Some(MeasurementUnit::Unit)
        );
        assert_eq!(
            MeasurementUnit::from_legacy("pitada"),
            Some(MeasurementUnit::Gram)
        );
        assert_eq!(MeasurementUnit::from_legacy("gallon"), None);
    }

    #[test]
    fn test_cents_to_display() {
        assert_eq!(cents_to_display(2550), Decimal::from_str("25.50").unwrap());
        assert_eq!(cents_to_display(5), Decimal::from_str("0.05").unwrap());
    }

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(Decimal::from_str("1249.5").unwrap()), 1250);
        assert_eq!(round_cents(Decimal::from_str("1249.4").unwrap()), 1249);
    }

    #[test]
    fn test_payment_method_round_trip() {
        for method in [
            PaymentMethod::Cash,
            PaymentMethod::Pix,
            PaymentMethod::BankTransfer,
            PaymentMethod::CreditCard,
            PaymentMethod::DebitCard,
            PaymentMethod::BankSlip,
            PaymentMethod::DirectDebit,
        ] {
            assert_eq!(PaymentMethod::parse(method.as_str()), Some(method));
        }
    }
}
