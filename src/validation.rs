//! Input validation for forms.
//!
//! These checks run before any request is made. Each validator returns
//! `Result<(), String>` so several can be collected with the
//! `ValidationErrorBuilder` from the `error` module.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::{ClientError, ClientResult, ValidationErrorBuilder};

lazy_static! {
    /// Phone numbers once spaces are removed: optional leading +, at least 10 digits
    static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9]{10,}$").unwrap();

    /// Card PINs are exactly 4 digits
    static ref PIN_REGEX: Regex = Regex::new(r"^[0-9]{4}$").unwrap();

    /// Simple email check (local@domain.tld)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9-]+(\.[a-zA-Z0-9-]+)*\.[a-zA-Z]{2,}$"
    ).unwrap();
}

/// Minimum password length accepted at registration
pub const MIN_PASSWORD_LEN: usize = 6;

pub const CARD_NUMBER_LEN: usize = 10;

/// Login requires both fields before the request is sent
pub fn validate_credentials(identifier: &str, password: &str) -> ClientResult<()> {
    if identifier.trim().is_empty() || password.is_empty() {
        return Err(ClientError::validation(
            "identifier",
            "Please enter your phone/ID and password.",
        ));
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> Result<(), String> {
    if phone.trim().is_empty() {
        return Err("Phone number is required".to_string());
    }
    let compact: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    if !PHONE_REGEX.is_match(&compact) {
        return Err("Invalid phone number.".to_string());
    }
    Ok(())
}

/// Card numbers are any 10 characters; the backend owns the format
pub fn validate_card_number(card_number: &str) -> Result<(), String> {
    if card_number.trim().chars().count() != CARD_NUMBER_LEN {
        return Err("Please enter a valid 10-digit card number.".to_string());
    }
    Ok(())
}

pub fn validate_pin(pin: &str) -> Result<(), String> {
    if !PIN_REGEX.is_match(pin) {
        return Err("PIN must be exactly 4 digits.".to_string());
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if email.trim().is_empty() {
        return Err("Email is required".to_string());
    }
    if email.len() > 254 || !EMAIL_REGEX.is_match(email.trim()) {
        return Err("Invalid email format".to_string());
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {} characters long.",
            MIN_PASSWORD_LEN
        ));
    }
    Ok(())
}

/// Parse a user-entered money amount; must be a positive number
pub fn parse_amount(input: &str) -> ClientResult<Decimal> {
    let amount = Decimal::from_str(input.trim())
        .map_err(|_| ClientError::validation("amount", "Please enter a valid amount."))?;
    if amount <= Decimal::ZERO {
        return Err(ClientError::validation(
            "amount",
            "Please enter a valid amount.",
        ));
    }
    Ok(amount)
}

/// Customer registration form
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub name: String,
    pub national_id: String,
    pub phone: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    /// Run the checks the sign-up page performs before submitting.
    ///
    /// Password mismatch is reported on its own since the page shows it
    /// before anything else.
    pub fn validate(&self) -> ClientResult<()> {
        if self.password != self.confirm_password {
            return Err(ClientError::validation(
                "confirm_password",
                "Passwords do not match.",
            ));
        }

        let mut errors = ValidationErrorBuilder::new();
        if self.name.trim().is_empty() {
            errors.add("name", "Full name is required");
        }
        if self.national_id.trim().is_empty() {
            errors.add("national_id", "National ID is required");
        }
        errors.check("phone", validate_phone(&self.phone));
        errors.check("email", validate_email(&self.email));
        errors.check("password", validate_password(&self.password));
        errors.finish()
    }
}
