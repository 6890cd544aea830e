use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: Uuid,
    pub name: String,
    pub class_id: Uuid,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Student {
    pub fn new(owner_id: Uuid, class_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            class_id,
            owner_id,
            created_at: Utc::now(),
        }
    }
}
