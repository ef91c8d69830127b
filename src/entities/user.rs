use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: Role,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Customer,
    Driver,
    Admin,
}

impl User {
    pub fn new(email: String, name: String, phone: Option<String>, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            name,
            phone,
            role,
        }
    }
}
