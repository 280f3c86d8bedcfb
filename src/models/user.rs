use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Fixed set of labels a user may pick for themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Student,
    Professional,
    Business,
    Other,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Student,
        Category::Professional,
        Category::Business,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Student => "student",
            Category::Professional => "professional",
            Category::Business => "business",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or(())
    }
}

/// A user that passed validation and is ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub age: Option<i32>,
    pub category: Option<Category>,
    pub created_at: DateTime<Utc>,
}

/// # Stored User
///
/// A user as returned by the store, with its store-assigned identifier.
///
/// ## Example JSON
/// ```json
/// {
///   "_id": "65f1c0a2e4b0a1b2c3d4e5f6",
///   "name": "Ada",
///   "email": "ada@example.com",
///   "age": 36,
///   "category": "professional",
///   "createdAt": "2024-03-13T15:30:45.123Z"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoredUser {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
}

impl StoredUser {
    pub fn from_new(id: impl Into<String>, user: NewUser) -> Self {
        Self {
            id: id.into(),
            name: user.name,
            email: user.email,
            age: user.age,
            category: user.category,
            created_at: user.created_at,
        }
    }
}

/// Request body accepted by `POST /api/save-user`.
///
/// Only used to describe the payload in the OpenAPI document; the handler
/// reads the sanitized JSON directly so every field violation can be reported.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UserRequest {
    pub name: String,
    pub email: String,
    pub age: Option<i32>,
    pub category: Option<Category>,
}
