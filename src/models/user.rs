use crate::validation::{self, FormErrors};
use garde::Validate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
    Editor,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::User, Role::Admin, Role::Editor];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Editor => "editor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            "editor" => Ok(Role::Editor),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Raw user form as submitted by the browser or the API.
///
/// Every field defaults to empty so a missing field surfaces as a
/// validation message instead of a rejected request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub csrf_token: String,
}

/// Validated user fields, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct UserInput {
    #[garde(length(chars, min = 2))]
    pub name: String,
    #[garde(custom(validation::email_address))]
    pub email: String,
    #[garde(skip)]
    pub role: Role,
}

const USER_MESSAGES: &[(&str, &str)] = &[("name", "Name must be at least 2 characters")];

impl UserForm {
    pub fn validate(&self) -> Result<UserInput, FormErrors> {
        let mut errors = FormErrors::new();

        let role = match self.role.trim() {
            "" => Role::default(),
            raw => raw.parse::<Role>().unwrap_or_else(|_| {
                errors.add("role", "Role must be one of: user, admin, editor");
                Role::default()
            }),
        };

        let input = UserInput {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            role,
        };
        errors.absorb(input.validate(), USER_MESSAGES);

        errors.into_result(input)
    }
}

impl From<&User> for UserForm {
    fn from(user: &User) -> Self {
        UserForm {
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role.as_str().to_string(),
            csrf_token: String::new(),
        }
    }
}
