use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::core::error::AppError;
use crate::shared::constants::MAX_FILE_NAME_LENGTH;

lazy_static! {
    /// Hex color such as "#1e1e2e" or "#fff"
    pub static ref HEX_COLOR_REGEX: Regex =
        Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").unwrap();

    /// 24-hour clock time "HH:MM", or empty for all-day events
    pub static ref CLOCK_TIME_REGEX: Regex =
        Regex::new(r"^(?:(?:[01][0-9]|2[0-3]):[0-5][0-9])?$").unwrap();
}

/// Substrings never allowed in an uploaded file name
const UNSAFE_NAME_SEQUENCES: &[&str] = &["../", "..\\", "<", ">", ":", "\"", "|", "?", "*", "\0"];

/// Extensions accepted when no explicit allow-list is configured
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &[
    // images
    ".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg", ".bmp", ".ico", ".heic", ".tiff",
    // documents
    ".pdf", ".doc", ".docx", ".txt", ".md", ".rtf", ".xls", ".xlsx", ".ppt", ".pptx",
    // code
    ".js", ".ts", ".vue", ".jsx", ".tsx", ".go", ".py", ".java", ".c", ".cpp", ".cs", ".php",
    ".rb", ".rs", ".sh", ".json", ".xml", ".yaml", ".yml",
    // audio
    ".mp3", ".wav", ".flac", ".ogg", ".aac", ".m4a",
    // video
    ".mp4", ".webm", ".avi", ".mov", ".wmv", ".flv", ".mkv", ".m4v",
    // archives
    ".zip", ".rar", ".7z", ".tar", ".gz", ".bz2",
];

/// Name and declared size of an incoming upload
#[derive(Debug, Clone, Copy)]
pub struct FileHeader<'a> {
    pub name: &'a str,
    pub size: u64,
}

/// Why an upload was rejected before any side effect
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileValidationError {
    #[error("no file provided")]
    Missing,

    #[error("file exceeds maximum size of {max} bytes")]
    TooLarge { max: u64 },

    #[error("file is empty")]
    Empty,

    #[error("file name is required")]
    EmptyName,

    #[error("file name exceeds {max} characters")]
    NameTooLong { max: usize },

    #[error("file name contains illegal characters")]
    UnsafeName,

    #[error("invalid file type: '{extension}' is not allowed")]
    InvalidType { extension: String },
}

impl From<FileValidationError> for AppError {
    fn from(err: FileValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Checks an upload's name, declared size and extension.
///
/// An empty `allowed_extensions` selects [`DEFAULT_ALLOWED_EXTENSIONS`].
pub fn validate_file_upload(
    header: Option<&FileHeader<'_>>,
    max_size: u64,
    allowed_extensions: &[&str],
) -> Result<(), FileValidationError> {
    let header = header.ok_or(FileValidationError::Missing)?;

    if header.size > max_size {
        return Err(FileValidationError::TooLarge { max: max_size });
    }
    if header.size == 0 {
        return Err(FileValidationError::Empty);
    }

    validate_file_name(header.name)?;

    validate_extension(&file_extension(header.name), allowed_extensions)
}

/// Checks an extension (dot included) against the allow-list, ignoring case
pub fn validate_extension(
    extension: &str,
    allowed_extensions: &[&str],
) -> Result<(), FileValidationError> {
    let allowed = if allowed_extensions.is_empty() {
        DEFAULT_ALLOWED_EXTENSIONS
    } else {
        allowed_extensions
    };

    if !allowed.iter().any(|a| a.eq_ignore_ascii_case(extension)) {
        return Err(FileValidationError::InvalidType {
            extension: extension.to_string(),
        });
    }

    Ok(())
}

/// Name-safety rule shared by uploads and renames
pub fn validate_file_name(name: &str) -> Result<(), FileValidationError> {
    if name.trim().is_empty() {
        return Err(FileValidationError::EmptyName);
    }
    if name.chars().count() > MAX_FILE_NAME_LENGTH {
        return Err(FileValidationError::NameTooLong {
            max: MAX_FILE_NAME_LENGTH,
        });
    }
    if UNSAFE_NAME_SEQUENCES.iter().any(|seq| name.contains(seq))
        || name.chars().any(|c| c.is_control())
    {
        return Err(FileValidationError::UnsafeName);
    }

    Ok(())
}

/// Lower-cased suffix from the last `.` of the final path component, dot included.
///
/// Returns an empty string when there is no dot.
pub fn file_extension(name: &str) -> String {
    let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(name);
    match base.rfind('.') {
        Some(idx) => base[idx..].to_lowercase(),
        None => String::new(),
    }
}

/// Reduces a client-supplied name to a single safe path component
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(name);
    let cleaned: String = base
        .replace("..", "")
        .replace('~', "")
        .chars()
        .filter(|c| !c.is_control())
        .collect();

    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned == "." {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Sanitizes `name` while keeping the suffix `file_extension` reads from it.
///
/// Only the stem is cleaned, so `report..pdf` becomes `report.pdf` rather than
/// losing its extension to `..` stripping.
pub fn sanitize_keeping_extension(name: &str) -> String {
    let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(name);
    let Some(idx) = base.rfind('.') else {
        return sanitize_file_name(base);
    };

    let (stem, extension) = base.split_at(idx);
    if stem.is_empty() {
        return extension.to_string();
    }

    let stem = sanitize_file_name(stem);
    let stem = stem.trim_end_matches('.');
    if stem.is_empty() {
        format!("file{}", extension)
    } else {
        format!("{}{}", stem, extension)
    }
}

/// Rejects the zero id used as the "unset" value by clients
pub fn validate_id(id: i64, field: &str) -> Result<(), AppError> {
    if id <= 0 {
        return Err(AppError::Validation(format!("invalid {}", field)));
    }
    Ok(())
}
