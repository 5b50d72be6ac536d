use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file attached to a job. Uploads go through
/// `Resources::upload_document`, not through `create`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub job: Option<i64>,
    pub title: String,
    /// Download URL as issued by the server.
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl Document {
    /// Human-readable size, e.g. "1.4 MB".
    pub fn size_display(&self) -> String {
        let Some(size) = self.size else {
            return "-".to_string();
        };
        const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
        let mut value = size as f64;
        let mut unit = 0;
        while value >= 1024.0 && unit < UNITS.len() - 1 {
            value /= 1024.0;
            unit += 1;
        }
        if unit == 0 {
            format!("{} B", size)
        } else {
            format!("{:.1} {}", value, UNITS[unit])
        }
    }
}
