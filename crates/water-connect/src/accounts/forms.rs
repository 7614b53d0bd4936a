use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::domain::{NewAccount, ProfileUpdate};
use crate::forms::{is_valid_email, optional_text, required_text, FieldErrors};

const USERNAME_MAX: usize = 150;
const NAME_MAX: usize = 150;
const EMAIL_MAX: usize = 254;

/// Registration payload for new residents.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SignUpForm {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl SignUpForm {
    pub fn clean(&self, now: DateTime<Utc>) -> Result<NewAccount, FieldErrors> {
        let mut errors = FieldErrors::new();
        let username = required_text(
            &mut errors,
            "username",
            self.username.as_deref(),
            USERNAME_MAX,
        );
        if !username.is_empty() && !username.chars().all(is_username_char) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }
        let email = clean_email(&mut errors, self.email.as_deref());
        let first_name = optional_text(
            &mut errors,
            "first_name",
            self.first_name.as_deref(),
            NAME_MAX,
        );
        let last_name = optional_text(
            &mut errors,
            "last_name",
            self.last_name.as_deref(),
            NAME_MAX,
        );

        errors.finish(|| NewAccount {
            username,
            email,
            first_name,
            last_name,
            is_staff: false,
            is_superuser: false,
            date_joined: now,
        })
    }
}

/// Self-service profile edits.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileUpdateForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl ProfileUpdateForm {
    pub fn clean(&self) -> Result<ProfileUpdate, FieldErrors> {
        let mut errors = FieldErrors::new();
        let first_name = optional_text(
            &mut errors,
            "first_name",
            self.first_name.as_deref(),
            NAME_MAX,
        );
        let last_name = optional_text(
            &mut errors,
            "last_name",
            self.last_name.as_deref(),
            NAME_MAX,
        );
        let email = clean_email(&mut errors, self.email.as_deref());

        errors.finish(|| ProfileUpdate {
            first_name,
            last_name,
            email,
        })
    }
}

fn is_username_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_')
}

fn clean_email(errors: &mut FieldErrors, value: Option<&str>) -> String {
    let email = optional_text(errors, "email", value, EMAIL_MAX);
    if !email.is_empty() && !is_valid_email(&email) {
        errors.add("email", "Enter a valid email address.");
    }
    email
}
