use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Pricing-relevant account category. `Student` unlocks the student
/// discount; `Premium` is tracked for catalog features but carries no
/// discount of its own.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UserType {
    Regular,
    Student,
    Premium,
}

impl Default for UserType {
    fn default() -> Self {
        UserType::Regular
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub user_type: UserType,
    #[serde(skip_serializing)]
    pub api_key_hash: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub user_type: UserType,
}
