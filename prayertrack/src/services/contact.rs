//! Reaching back out to petitioners
//!
//! The contact preference column is free text from a form, so it is
//! classified by keyword.

use crate::database::Prayer;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactMethod {
    Email,
    Phone,
    Text,
    Both,
}

impl ContactMethod {
    /// Classify a free-text preference. Unrecognised text means phone.
    pub fn from_preference(preference: Option<&str>) -> Option<Self> {
        let pref = preference?.to_lowercase();

        let method = if pref.contains("email") || pref.contains("e-mail") {
            Self::Email
        } else if pref.contains("phone") || pref.contains("call") || pref.contains("telephone") {
            Self::Phone
        } else if pref.contains("text") || pref.contains("sms") {
            Self::Text
        } else if pref.contains("both") || pref.contains("either") {
            Self::Both
        } else {
            Self::Phone
        };

        Some(method)
    }
}

/// Digits of a phone number, suitable for a `tel:` URI
pub fn phone_digits(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

pub fn tel_link(phone: &str) -> Option<String> {
    let digits = phone_digits(phone);
    (!digits.is_empty()).then(|| format!("tel:{}", digits))
}

pub fn mailto_link(to: &str, subject: &str, body: &str) -> String {
    format!(
        "mailto:{}?subject={}&body={}",
        to,
        urlencoding::encode(subject),
        urlencoding::encode(body)
    )
}

/// Ways to reach the petitioner of one prayer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactCard {
    pub petitioner: Option<String>,
    pub method: Option<ContactMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_link: Option<String>,
}

impl ContactCard {
    pub fn for_prayer(prayer: &Prayer) -> Self {
        let greeting = prayer.petitioner.as_deref().unwrap_or("friend");
        let email_link = prayer.contact_email.as_deref().map(|to| {
            mailto_link(
                to,
                "Following up on your prayer request",
                &format!(
                    "Hi {},\n\nWe have been praying for you about:\n\n\"{}\"\n\nHow are things going?",
                    greeting, prayer.content
                ),
            )
        });

        Self {
            petitioner: prayer.petitioner.clone(),
            method: ContactMethod::from_preference(prayer.contact_preference.as_deref()),
            email_link,
            phone_link: prayer.contact_phone.as_deref().and_then(tel_link),
        }
    }
}
