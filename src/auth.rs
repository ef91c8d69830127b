use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::Role;

/// The authenticated principal acting on the engine. Resolving credentials
/// into a `Caller` is the authentication layer's job; the engine only checks
/// ownership and role against it.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Caller {
    pub id: Uuid,
    pub role: Role,
}

impl Caller {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    pub fn system() -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
