/// Validation utilities for user input

use crate::core::error::{AppError, Result};
use crate::services::amount::Amount;

pub struct ValidationResult {
    pub is_valid: bool,
    pub error: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            is_valid: true,
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error: Some(message.into()),
        }
    }

    /// Convert into a `Validation` error when invalid.
    pub fn into_result(self) -> Result<()> {
        match self.error {
            Some(message) if !self.is_valid => Err(AppError::Validation(message)),
            _ => Ok(()),
        }
    }
}

/// Validate the amount typed into the purchase field.
///
/// `balance` is the known input-token balance; an unknown balance is not checked.
pub fn validate_purchase_amount(text: &str, balance: Option<Amount>) -> ValidationResult {
    if text.trim().is_empty() {
        return ValidationResult::err("Amount is required");
    }

    let amount: Amount = match text.parse() {
        Ok(amount) => amount,
        Err(AppError::Validation(message)) => return ValidationResult::err(message),
        Err(e) => return ValidationResult::err(e.to_string()),
    };

    if amount.is_zero() {
        return ValidationResult::err("Amount must be greater than 0");
    }

    if let Some(balance) = balance {
        if amount > balance {
            return ValidationResult::err(format!("Amount exceeds balance of {}", balance));
        }
    }

    ValidationResult::ok()
}

/// Parse a purchase amount, rejecting anything [`validate_purchase_amount`] rejects.
pub fn parse_purchase_amount(text: &str, balance: Option<Amount>) -> Result<Amount> {
    validate_purchase_amount(text, balance).into_result()?;
    text.parse()
}
