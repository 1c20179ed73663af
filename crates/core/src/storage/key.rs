//! Storage key derivation.

use uuid::Uuid;

use super::error::StorageError;

/// Sanitize filename for storage key.
///
/// Only allows ASCII alphanumeric characters, dots, hyphens, and underscores.
/// Everything else becomes `_`.
#[must_use]
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Generate a fresh storage key for an uploaded file.
///
/// Format: `{random_uuid}-{sanitized_filename}`. The random prefix keeps keys
/// unique for repeated names; the suffix keeps them traceable.
#[must_use]
pub fn generate_storage_key(original_name: &str) -> String {
    format!("{}-{}", Uuid::new_v4(), sanitize_filename(original_name))
}

/// Reject keys that would escape the container or name a directory.
///
/// # Errors
///
/// Returns [`StorageError::InvalidKey`] for empty keys, keys with a leading
/// or trailing `/`, and keys containing a `..` segment.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("key is empty".to_string()));
    }
    if key.starts_with('/') || key.ends_with('/') {
        return Err(StorageError::InvalidKey(format!(
            "'{key}' must not start or end with '/'"
        )));
    }
    if key.split('/').any(|segment| segment == "..") {
        return Err(StorageError::InvalidKey(format!(
            "'{key}' must not contain '..' segments"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("invoice.pdf"), "invoice.pdf");
        assert_eq!(sanitize_filename("my file (1).pdf"), "my_file__1_.pdf");
        assert_eq!(sanitize_filename("test@#$%.doc"), "test____.doc");
        assert_eq!(sanitize_filename("日本語.pdf"), "___.pdf");
        assert_eq!(sanitize_filename("a_b-c.tar.gz"), "a_b-c.tar.gz");
    }

    #[test]
    fn test_generate_storage_key_format() {
        let key = generate_storage_key("profile picture.jpg");
        let (prefix, rest) = key.split_at(36);
        assert!(Uuid::parse_str(prefix).is_ok());
        assert_eq!(rest, "-profile_picture.jpg");
    }

    #[test]
    fn test_generate_storage_key_unique_for_same_name() {
        assert_ne!(generate_storage_key("a.png"), generate_storage_key("a.png"));
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("abc-a.png").is_ok());
        assert!(validate_key("nested/abc-a.png").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("/abs").is_err());
        assert!(validate_key("dir/").is_err());
        assert!(validate_key("../escape").is_err());
    }
}
