use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub is_active: bool,
}

impl User {
    pub fn new(display_name: Option<&str>) -> Self {
        let now = Utc::now();
        Self {
            user_id: Uuid::new_v4(),
            display_name: display_name.map(String::from),
            created_at: now,
            last_seen: now,
            is_active: true,
        }
    }
}
