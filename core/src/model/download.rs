use super::util::{lenient_datetime, lenient_u64, string_or_number};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadFile {
    pub url: String,
    #[serde(default)]
    pub original_name: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub file_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub size: Option<u64>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub upload_date: Option<DateTime<Utc>>,
}

impl DownloadFile {
    /// Original name, else the last path segment of the url.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.original_name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        let path = self.url.split(['?', '#']).next().unwrap_or_default();
        path.rsplit('/')
            .find(|s| !s.is_empty())
            .filter(|s| !s.contains(':'))
            .unwrap_or("file")
            .to_string()
    }

    pub fn human_size(&self) -> Option<String> {
        self.size.map(human_size)
    }
}

pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}
