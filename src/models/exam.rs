use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exam {
    pub id: String,
    pub designer_id: String,
    pub title: String,
    /// Number of questions; drives the price bracket. Valid range is
    /// enforced at the HTTP boundary, not here.
    pub question_count: u32,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateExam {
    pub title: String,
    pub question_count: u32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateExam {
    pub title: Option<String>,
    pub question_count: Option<u32>,
}
