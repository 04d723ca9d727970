//! Upload file-name handling
//!
//! Extension checks, file-name sanitizing and generation of unguessable
//! result names. None of this touches the filesystem.

use crate::constants::upload::{ALLOWED_EXTENSIONS, RESULT_NAME_RANDOM_BYTES};

/// True if `filename` has an extension in the allowed set (case-insensitive)
pub fn allowed_file(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => {
            let ext = ext.to_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

/// Reduce a client-supplied file name to a safe, flat name
///
/// Directory separators become word breaks, whitespace runs become `_`,
/// anything outside `[A-Za-z0-9._-]` is dropped and leading/trailing `.`
/// and `_` are trimmed. The result may be empty.
pub fn secure_filename(filename: &str) -> String {
    let flattened: String = filename
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");

    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}

/// Random result file name, `result_<hex>.jpg`
pub fn result_filename() -> String {
    format!("result_{}.jpg", random_hex())
}

/// Unique on-disk name for an already sanitized upload, `<hex>_<name>`
///
/// Two uploads sharing a client file name, in one request or in concurrent
/// ones, never land on the same path.
pub fn stored_filename(secure_name: &str) -> String {
    format!("{}_{}", random_hex(), secure_name)
}

fn random_hex() -> String {
    let bytes: [u8; RESULT_NAME_RANDOM_BYTES] = rand::random();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_file() {
        assert!(allowed_file("photo.jpg"));
        assert!(allowed_file("photo.final.PNG"));
        assert!(allowed_file("scan.jpeg"));
        assert!(!allowed_file("photo.gif"));
        assert!(!allowed_file("png"));
        assert!(!allowed_file(""));
    }

    #[test]
    fn test_secure_filename_strips_paths() {
        assert_eq!(secure_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename("C:\\Users\\me\\photo.jpg"), "C_Users_me_photo.jpg");
    }

    #[test]
    fn test_secure_filename_cleans_characters() {
        assert_eq!(secure_filename("my cool  photo.png"), "my_cool_photo.png");
        assert_eq!(secure_filename("ph*o?to<>.jpg"), "photo.jpg");
        assert_eq!(secure_filename("café.jpg"), "caf.jpg");
        assert_eq!(secure_filename("..."), "");
    }

    #[test]
    fn test_result_filename_format() {
        let name = result_filename();
        assert!(name.starts_with("result_"));
        assert!(name.ends_with(".jpg"));
        let hex = &name["result_".len()..name.len() - ".jpg".len()];
        assert_eq!(hex.len(), RESULT_NAME_RANDOM_BYTES * 2);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_result_filenames_differ() {
        assert_ne!(result_filename(), result_filename());
    }

    #[test]
    fn test_stored_filename_keeps_name_and_extension() {
        let name = stored_filename("photo.png");
        let (prefix, rest) = name.split_once('_').unwrap();
        assert_eq!(prefix.len(), RESULT_NAME_RANDOM_BYTES * 2);
        assert!(prefix.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(rest, "photo.png");
        assert!(allowed_file(&name));
        assert_ne!(stored_filename("photo.png"), stored_filename("photo.png"));
    }
}
