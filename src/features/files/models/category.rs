use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Coarse file classification derived from the extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Media,
    Document,
    Code,
    Archive,
    Other,
}

const MEDIA_EXTENSIONS: &[&str] = &[
    ".mp4", ".avi", ".mov", ".mkv", ".webm", ".mp3", ".wav", ".flac", ".aac", ".jpg", ".jpeg",
    ".png", ".gif", ".bmp", ".webp", ".svg",
];

const DOCUMENT_EXTENSIONS: &[&str] = &[
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".txt", ".rtf",
];

const CODE_EXTENSIONS: &[&str] = &[
    ".go", ".cpp", ".c", ".h", ".py", ".js", ".ts", ".java", ".rs", ".php", ".html", ".css",
    ".json", ".xml", ".yaml", ".md", ".sh", ".sql",
];

const ARCHIVE_EXTENSIONS: &[&str] = &[".zip", ".rar", ".7z", ".tar", ".gz"];

impl FileCategory {
    pub const ALL: [FileCategory; 5] = [
        FileCategory::Media,
        FileCategory::Document,
        FileCategory::Code,
        FileCategory::Archive,
        FileCategory::Other,
    ];

    /// Classifies an extension such as ".PNG" (dot included, any case)
    pub fn from_extension(extension: &str) -> Self {
        let ext = extension.to_lowercase();
        let ext = ext.as_str();

        if MEDIA_EXTENSIONS.contains(&ext) {
            FileCategory::Media
        } else if DOCUMENT_EXTENSIONS.contains(&ext) {
            FileCategory::Document
        } else if CODE_EXTENSIONS.contains(&ext) {
            FileCategory::Code
        } else if ARCHIVE_EXTENSIONS.contains(&ext) {
            FileCategory::Archive
        } else {
            FileCategory::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Media => "media",
            FileCategory::Document => "document",
            FileCategory::Code => "code",
            FileCategory::Archive => "archive",
            FileCategory::Other => "other",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown file category '{}'", s))
    }
}
