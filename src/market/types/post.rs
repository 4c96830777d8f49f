use chrono::Utc;
use serde::{Serialize, Deserialize};
use uuid::Uuid;

/// A listing in the marketplace. The image itself lives on the external
/// host; only the URL and the host's delete handle are stored here.
#[derive(Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub owner: Uuid,
    pub title: String,
    pub desc: String,
    pub price_cents: i64,
    pub image_url: String,
    // Opaque handle from the image host, never shown to callers
    #[serde(skip_serializing, default)]
    pub image_delete_handle: String,
    pub approved: bool,
    pub created: chrono::DateTime<Utc>,
    pub edited: chrono::DateTime<Utc>,
    pub rating: Option<f64>
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i32,
    pub post_id: Uuid,
    pub author: Uuid,
    pub content: String,
    pub created: chrono::DateTime<Utc>
}

#[derive(Clone, Serialize, Deserialize)]
pub enum SortPost {
    Created,
    Edited,
    Price
}

impl std::fmt::Display for SortPost {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            SortPost::Created => write!(f, "created"),
            SortPost::Edited => write!(f, "edited"),
            SortPost::Price => write!(f, "price_cents"),
        }
    }
}
