use std::path::Path;

/// Longest filename we are willing to stage, in bytes
pub const MAX_FILENAME_LEN: usize = 255;

/// MIME type of a word-processor (OOXML) document
pub const DOCX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates document size: non-empty and within the maximum
pub fn validate_file_size(size: usize, max_size: usize) -> ValidationResult<()> {
    if size == 0 {
        return Err(ValidationError {
            code: "EMPTY_FILE",
            message: "Uploaded file is empty".to_string(),
        });
    }
    if size > max_size {
        return Err(ValidationError {
            code: "FILE_TOO_LARGE",
            message: format!(
                "File size {} bytes exceeds maximum allowed {} bytes ({} MB)",
                size,
                max_size,
                max_size / 1024 / 1024
            ),
        });
    }
    Ok(())
}

/// Sanitizes filename to prevent path traversal and injection attacks
/// Returns the sanitized filename or an error if the name is invalid
pub fn sanitize_filename(filename: &str) -> ValidationResult<String> {
    // Browsers on Windows may send the full client path
    let last_component = filename.rsplit(['/', '\\']).next().unwrap_or("");
    let name = Path::new(last_component)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    if name.is_empty() {
        return Err(ValidationError {
            code: "INVALID_FILENAME",
            message: "Filename cannot be empty".to_string(),
        });
    }

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path components stripped from uploaded filename: {}", filename);
    }

    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_control()
                || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | ';')
            {
                '_'
            } else {
                c
            }
        })
        .collect();

    // Limit length safely for UTF-8
    let sanitized = if sanitized.len() > MAX_FILENAME_LEN {
        let mut end = MAX_FILENAME_LEN;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized[..end].to_string()
    } else {
        sanitized
    };

    if sanitized.starts_with('.') {
        return Err(ValidationError {
            code: "HIDDEN_FILE",
            message: "Hidden files (starting with '.') are not allowed".to_string(),
        });
    }

    Ok(sanitized)
}

/// The upload widget's type filter: the extension must be one of `allowed`
pub fn validate_extension(filename: &str, allowed: &[String]) -> ValidationResult<()> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);

    match ext {
        Some(ext) if allowed.iter().any(|a| a.eq_ignore_ascii_case(&ext)) => Ok(()),
        _ => Err(ValidationError {
            code: "UNSUPPORTED_TYPE",
            message: format!(
                "Only {} files are accepted",
                allowed
                    .iter()
                    .map(|a| format!(".{}", a))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }),
    }
}

/// Checks the content carries the ZIP container signature every OOXML document has
pub fn verify_document_signature(content: &[u8]) -> ValidationResult<()> {
    if infer::doc::is_docx(content) || infer::archive::is_zip(content) {
        return Ok(());
    }

    Err(ValidationError {
        code: "INVALID_DOCUMENT",
        message: "File content is not a word-processor document".to_string(),
    })
}

/// Full validation pipeline for an uploaded document.
/// Returns the sanitized filename to stage it under.
pub fn validate_document(
    filename: &str,
    content: &[u8],
    max_size: usize,
    allowed_extensions: &[String],
) -> ValidationResult<String> {
    validate_file_size(content.len(), max_size)?;

    let sanitized = sanitize_filename(filename)?;
    validate_extension(&sanitized, allowed_extensions)?;

    verify_document_signature(content)?;

    Ok(sanitized)
}
