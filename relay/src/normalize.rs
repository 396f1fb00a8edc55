//! Canonical contact fields derived from a free-form submission.
//!
//! Each field is looked up through a fixed, ordered list of alias keys and
//! takes the first value that is present and not blank. Missing first/last
//! names are derived from the full name, and a missing first name finally
//! falls back to the local part of the email address.

use crate::body::Payload;
use serde_json::Value;

pub const FULL_NAME_ALIASES: &[&str] = &["full_name", "name", "Name", "fullName"];
pub const FIRST_NAME_ALIASES: &[&str] = &["firstName", "first_name", "FirstName", "First"];
pub const LAST_NAME_ALIASES: &[&str] = &["lastName", "last_name", "LastName", "Last"];
pub const EMAIL_ALIASES: &[&str] = &["email", "Email", "eMail"];
pub const PHONE_ALIASES: &[&str] = &["phone", "Phone", "phoneNumber", "PhoneNumber"];

/// Keys written into every outbound payload.
pub const CANONICAL_KEYS: &[&str] = &["name", "full_name", "firstName", "lastName", "email", "phone"];

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContactFields {
    /// Full name exactly as submitted, empty when none was given.
    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

impl ContactFields {
    pub fn from_payload(payload: &Payload) -> Self {
        let full_name = pick(payload, FULL_NAME_ALIASES);
        let email = pick(payload, EMAIL_ALIASES);
        let phone = pick(payload, PHONE_ALIASES);

        let mut first_name = pick(payload, FIRST_NAME_ALIASES).trim().to_string();
        let mut last_name = pick(payload, LAST_NAME_ALIASES).trim().to_string();

        if (first_name.is_empty() || last_name.is_empty()) && !full_name.is_empty() {
            let mut parts = full_name.split_whitespace();
            let first = parts.next().unwrap_or_default();
            let rest = parts.collect::<Vec<_>>().join(" ");

            if first_name.is_empty() {
                first_name = first.to_string();
            }
            if last_name.is_empty() {
                last_name = rest;
            }
        }

        if first_name.is_empty() && !email.is_empty() {
            first_name = email.split('@').next().unwrap_or_default().to_string();
        }

        ContactFields {
            full_name,
            first_name,
            last_name,
            email,
            phone,
        }
    }

    /// The submitted full name, or first and last name joined.
    pub fn display_name(&self) -> String {
        if !self.full_name.is_empty() {
            return self.full_name.clone();
        }
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Writes the canonical keys over `payload`, leaving every other key untouched.
    pub fn overlay(&self, payload: &mut Payload) {
        let display_name = self.display_name();
        payload.insert("name".into(), Value::String(display_name.clone()));
        payload.insert("full_name".into(), Value::String(display_name));
        payload.insert("firstName".into(), Value::String(self.first_name.clone()));
        payload.insert("lastName".into(), Value::String(self.last_name.clone()));
        payload.insert("email".into(), Value::String(self.email.clone()));
        payload.insert("phone".into(), Value::String(self.phone.clone()));
    }
}

/// Derives the canonical contact fields and merges them into `payload`.
pub fn normalize(mut payload: Payload) -> (Payload, ContactFields) {
    let contact = ContactFields::from_payload(&payload);
    contact.overlay(&mut payload);
    (payload, contact)
}

fn pick(payload: &Payload, aliases: &[&str]) -> String {
    aliases
        .iter()
        .find_map(|key| payload.get(*key).and_then(as_text))
        .unwrap_or_default()
}

// Objects and arrays never count as a contact value.
fn as_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };

    (!text.trim().is_empty()).then_some(text)
}
