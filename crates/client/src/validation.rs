//! Form validation for sign-in and new subscriptions.
//!
//! Rules run before any request is sent, so a rejected form never touches
//! session state or the network.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::subscriptions::Frequency;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_'+\-]+(\.[A-Za-z0-9_'+\-]+)*@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$")
        .unwrap_or_else(|e| unreachable!("email pattern is valid: {}", e))
});

/// Minimum password length accepted by the sign-in form
pub const MIN_PASSWORD_LEN: usize = 8;

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every field that failed, in form order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// Message for `field`, if it failed.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.iter().find(|e| e.field == field).map(|e| e.message.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|e| e.message.as_str()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Credentials posted to `/auth/sign-in`.
#[derive(Clone, Serialize, Deserialize)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for SignInForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignInForm")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl SignInForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if !is_valid_email(&self.email) {
            errors.push("email", "Invalid email address");
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push("password", "Password must be at least 8 characters long");
        }
        errors.into_result()
    }
}

/// Body of `POST /subscriptions`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubscription {
    pub name: String,
    pub category: String,
    pub price: f64,
    pub currency: String,
    pub frequency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_with: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_url: Option<String>,
}

impl NewSubscription {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.name.trim().is_empty() {
            errors.push("name", "Name is required");
        }
        if self.category.trim().is_empty() {
            errors.push("category", "Category is required");
        }
        if !(self.price >= 1.0) {
            errors.push("price", "Price is required");
        }
        if self.currency.trim().is_empty() {
            errors.push("currency", "Currency is required");
        }
        if self.frequency.trim().is_empty() {
            errors.push("frequency", "Frequency is required");
        } else if self.frequency.parse::<Frequency>().is_err() {
            errors.push("frequency", "Frequency must be one of daily, weekly, monthly, yearly");
        }
        errors.into_result()
    }

    /// Drop empty optional strings so the backend sees them as absent.
    pub fn normalized(mut self) -> Self {
        fn non_blank(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }
        self.start_date = non_blank(self.start_date);
        self.payment_method = non_blank(self.payment_method);
        self.cancel_url = non_blank(self.cancel_url);
        self.shared_with = self.shared_with.filter(|people| !people.is_empty());
        self
    }
}
