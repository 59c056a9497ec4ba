// 👤 User Entity - opaque owner of calculations
//
// Only the UUID matters to calculations: it is the foreign key target that
// the store checks on every insert.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Stable identity (UUID) - NEVER changes
    pub id: Uuid,

    pub username: String,

    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: String) -> Self {
        User {
            id: Uuid::new_v4(),
            username,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_creation() {
        let user = User::new("alice".to_string());

        assert!(!user.id.is_nil());
        assert_eq!(user.username, "alice");
    }

    #[test]
    fn test_users_get_distinct_ids() {
        let a = User::new("a".to_string());
        let b = User::new("b".to_string());
        assert_ne!(a.id, b.id);
    }
}
