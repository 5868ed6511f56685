// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Contact submission validator.
//!
//! Implements input validation for contact form submissions:
//! - Name and message presence (after trimming)
//! - Email grammar and provider-specific normalization
//! - HTML escaping for rendered output

use crate::config::ValidationConfig;
use lettre::Address;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Longest address accepted, per RFC 5321.
const MAX_EMAIL_LEN: usize = 254;

const GMAIL_DOMAINS: &[&str] = &["gmail.com", "googlemail.com"];

const ICLOUD_DOMAINS: &[&str] = &["icloud.com", "me.com"];

const OUTLOOK_DOMAINS: &[&str] = &[
    "hotmail.at", "hotmail.be", "hotmail.ca", "hotmail.cl", "hotmail.co.il",
    "hotmail.co.nz", "hotmail.co.th", "hotmail.co.uk", "hotmail.com",
    "hotmail.com.ar", "hotmail.com.au", "hotmail.com.br", "hotmail.com.gr",
    "hotmail.com.mx", "hotmail.com.pe", "hotmail.com.tr", "hotmail.com.vn",
    "hotmail.cz", "hotmail.de", "hotmail.dk", "hotmail.es", "hotmail.fr",
    "hotmail.hu", "hotmail.id", "hotmail.ie", "hotmail.in", "hotmail.it",
    "hotmail.jp", "hotmail.kr", "hotmail.lv", "hotmail.my", "hotmail.ph",
    "hotmail.pt", "hotmail.sa", "hotmail.sg", "hotmail.sk", "live.be",
    "live.co.uk", "live.com", "live.com.ar", "live.com.mx", "live.de", "live.es",
    "live.eu", "live.fr", "live.it", "live.nl", "msn.com", "outlook.at",
    "outlook.be", "outlook.cl", "outlook.co.il", "outlook.co.nz", "outlook.co.th",
    "outlook.com", "outlook.com.ar", "outlook.com.au", "outlook.com.br",
    "outlook.com.gr", "outlook.com.pe", "outlook.com.tr", "outlook.com.vn",
    "outlook.cz", "outlook.de", "outlook.dk", "outlook.es", "outlook.fr",
    "outlook.hu", "outlook.id", "outlook.ie", "outlook.in", "outlook.it",
    "outlook.jp", "outlook.kr", "outlook.lv", "outlook.my", "outlook.ph",
    "outlook.pt", "outlook.sa", "outlook.sg", "outlook.sk", "passport.com",
];

const YAHOO_DOMAINS: &[&str] = &[
    "rocketmail.com", "yahoo.ca", "yahoo.co.uk", "yahoo.com", "yahoo.de",
    "yahoo.fr", "yahoo.in", "yahoo.it", "ymail.com",
];

// All aliases of one mailbox service
const YANDEX_DOMAINS: &[&str] = &[
    "yandex.ru", "yandex.ua", "yandex.kz", "yandex.com", "yandex.by", "ya.ru",
];

/// Validation error types. Each variant names exactly one field.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Name is required")]
    MissingName,

    #[error("Please include a valid email")]
    InvalidEmail,

    #[error("Message is required")]
    MissingMessage,
}

impl ValidationError {
    /// Name of the payload field this error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingName => "name",
            Self::InvalidEmail => "email",
            Self::MissingMessage => "message",
        }
    }
}

/// Raw contact form payload as received from the client.
///
/// Fields are kept as arbitrary JSON so that absent or non-string values
/// surface as per-field validation errors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactPayload {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub email: Option<Value>,
    #[serde(default)]
    pub message: Option<Value>,
}

impl ContactPayload {
    pub fn new(name: &str, email: &str, message: &str) -> Self {
        Self {
            name: Some(Value::from(name)),
            email: Some(Value::from(email)),
            message: Some(Value::from(message)),
        }
    }
}

/// A submission whose fields all passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    name: String,
    email: Address,
    message: String,
}

impl ContactSubmission {
    /// Sender name, trimmed. Not escaped.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalized sender address.
    pub fn email(&self) -> &Address {
        &self.email
    }

    /// Message body, trimmed. Not escaped.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Result of validation.
#[derive(Debug, Clone)]
pub enum ValidationResult {
    /// All fields are valid
    Valid(ContactSubmission),
    /// One or more fields are invalid, in field order
    Invalid(Vec<ValidationError>),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid(_))
    }

    pub fn errors(&self) -> &[ValidationError] {
        match self {
            ValidationResult::Valid(_) => &[],
            ValidationResult::Invalid(errors) => errors,
        }
    }
}

/// Contact submission validator.
#[derive(Debug, Clone)]
pub struct ContactValidator {
    config: ValidationConfig,
}

impl ContactValidator {
    /// Create a new validator with the given configuration.
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a complete payload, reporting every failing field.
    pub fn validate(&self, payload: &ContactPayload) -> ValidationResult {
        let mut errors = Vec::new();

        let name = non_empty(&payload.name);
        if name.is_none() {
            debug!("Missing name");
            errors.push(ValidationError::MissingName);
        }

        let email = as_text(&payload.email).and_then(|raw| self.normalize_email(raw));
        if email.is_none() {
            debug!(email = ?payload.email, "Invalid email");
            errors.push(ValidationError::InvalidEmail);
        }

        let message = non_empty(&payload.message);
        if message.is_none() {
            debug!("Missing message");
            errors.push(ValidationError::MissingMessage);
        }

        match (name, email, message) {
            (Some(name), Some(email), Some(message)) => {
                ValidationResult::Valid(ContactSubmission {
                    name: name.to_string(),
                    email,
                    message: message.to_string(),
                })
            }
            _ => ValidationResult::Invalid(errors),
        }
    }

    /// Normalize an email address and check it against the address grammar.
    ///
    /// Returns `None` when the address is malformed.
    pub fn normalize_email(&self, raw: &str) -> Option<Address> {
        let trimmed = raw.trim();
        if trimmed.len() > MAX_EMAIL_LEN {
            return None;
        }

        let (local, domain) = trimmed.rsplit_once('@')?;
        let mut local = local.to_lowercase();
        let mut domain = domain.to_lowercase();

        if self.config.normalize_email {
            if is_listed(&domain, GMAIL_DOMAINS) {
                local = strip_subaddress(&local, '+').replace('.', "");
                domain = "gmail.com".to_string();
            } else if is_listed(&domain, ICLOUD_DOMAINS) || is_listed(&domain, OUTLOOK_DOMAINS) {
                local = strip_subaddress(&local, '+').to_string();
            } else if is_listed(&domain, YAHOO_DOMAINS) {
                local = strip_subaddress(&local, '-').to_string();
            } else if is_listed(&domain, YANDEX_DOMAINS) {
                domain = "yandex.ru".to_string();
            }
        }

        if local.is_empty() || !has_tld(&domain) {
            return None;
        }

        Address::new(local, domain).ok()
    }
}

/// Escape text for inclusion in HTML output.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            '\\' => out.push_str("&#x5C;"),
            '`' => out.push_str("&#96;"),
            _ => out.push(c),
        }
    }
    out
}

fn as_text(value: &Option<Value>) -> Option<&str> {
    value.as_ref()?.as_str()
}

fn non_empty(value: &Option<Value>) -> Option<&str> {
    as_text(value).map(str::trim).filter(|s| !s.is_empty())
}

fn is_listed(domain: &str, list: &[&str]) -> bool {
    list.contains(&domain)
}

fn strip_subaddress(local: &str, separator: char) -> &str {
    local.split_once(separator).map_or(local, |(head, _)| head)
}

/// Require a dotted domain ending in a plausible top-level label.
fn has_tld(domain: &str) -> bool {
    if domain.starts_with('[') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((rest, tld)) => {
            !rest.is_empty()
                && (tld.starts_with("xn--")
                    || (tld.chars().count() >= 2 && tld.chars().all(char::is_alphabetic)))
        }
        None => false,
    }
}
