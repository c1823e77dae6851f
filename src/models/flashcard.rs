use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flashcard {
    pub id: String,
    pub designer_id: String,
    pub title: String,
    /// Per-card price; None falls back to the configured default at
    /// pricing time.
    pub price: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateFlashcard {
    pub title: String,
    #[serde(default)]
    pub price: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFlashcard {
    pub title: Option<String>,
    /// Absent leaves the price unchanged; an explicit null clears it back
    /// to the default.
    #[serde(default, deserialize_with = "double_option")]
    pub price: Option<Option<i64>>,
}

/// Distinguish a missing field (outer None) from an explicit null
/// (Some(None)), which plain Option<Option<T>> cannot.
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<i64>::deserialize(deserializer).map(Some)
}
