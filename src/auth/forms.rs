use serde::Deserialize;

use super::domain::{ProfileUpdate, SignUpAttributes};
use crate::feedback::FieldError;

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 20;
const PASSWORD_MIN: usize = 6;
const FULL_NAME_MIN: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationForm {
    pub email: String,
    pub password: String,
    pub username: String,
    pub full_name: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        check_email(&self.email, &mut errors);
        if self.password.chars().count() < PASSWORD_MIN {
            errors.push(FieldError::new(
                "password",
                "Password must be at least 6 characters",
            ));
        }
        check_username(&self.username, &mut errors);
        check_full_name(&self.full_name, &mut errors);
        into_result(errors)
    }

    pub fn attributes(&self) -> SignUpAttributes {
        SignUpAttributes {
            username: self.username.trim().to_string(),
            full_name: self.full_name.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        check_email(&self.email, &mut errors);
        if self.password.is_empty() {
            errors.push(FieldError::new("password", "Password is required"));
        }
        into_result(errors)
    }
}

pub fn validate_profile_update(update: &ProfileUpdate) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();
    if let Some(username) = &update.username {
        check_username(username, &mut errors);
    }
    if let Some(full_name) = &update.full_name {
        check_full_name(full_name, &mut errors);
    }
    if let Some(avatar_url) = update.avatar_url.as_deref().map(str::trim) {
        if !avatar_url.is_empty() && url::Url::parse(avatar_url).is_err() {
            errors.push(FieldError::new("avatar_url", "Please enter a valid URL"));
        }
    }
    into_result(errors)
}

fn into_result(errors: Vec<FieldError>) -> Result<(), Vec<FieldError>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_email(email: &str, errors: &mut Vec<FieldError>) {
    if !looks_like_email(email.trim()) {
        errors.push(FieldError::new(
            "email",
            "Please enter a valid email address",
        ));
    }
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

fn check_username(username: &str, errors: &mut Vec<FieldError>) {
    let length = username.chars().count();
    if length < USERNAME_MIN {
        errors.push(FieldError::new(
            "username",
            "Username must be at least 3 characters",
        ));
    } else if length > USERNAME_MAX {
        errors.push(FieldError::new(
            "username",
            "Username must be less than 20 characters",
        ));
    } else if !username
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
    {
        errors.push(FieldError::new(
            "username",
            "Username can only contain letters, numbers, and underscores",
        ));
    }
}

fn check_full_name(full_name: &str, errors: &mut Vec<FieldError>) {
    if full_name.trim().chars().count() < FULL_NAME_MIN {
        errors.push(FieldError::new(
            "full_name",
            "Full name must be at least 2 characters",
        ));
    }
}
