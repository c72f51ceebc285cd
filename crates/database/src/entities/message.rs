//! Message entity definitions

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Message row; immutable once written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: i64,
    pub public_id: String,
    pub room_id: i64,
    pub user_id: i64,
    pub text: String,
    pub image_url: Option<String>,
    pub created_at: String,
}
