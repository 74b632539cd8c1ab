use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::{AppError, Result};

const DEFAULT_EXTENSION: &str = "jpg";
const DEFAULT_STEM: &str = "image";

static WHITESPACE: OnceLock<Regex> = OnceLock::new();
static UNSAFE_CHARS: OnceLock<Regex> = OnceLock::new();

/// An image picked by the operator, held locally until the record is saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    #[cfg(test)]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| AppError::Upload(format!("{} is not a file", path.display())))?;
        let bytes = tokio::fs::read(path).await?;
        Ok(Self { file_name, bytes })
    }

    pub fn content_type(&self) -> String {
        mime_guess::from_path(&self.file_name)
            .first_or_octet_stream()
            .to_string()
    }

    /// Storage key: `{folder}/{timestamp}_{sanitized-stem}.{ext}`.
    pub fn storage_path(&self, folder: &str, timestamp_ms: i64) -> String {
        let (stem, extension) = split_file_name(&self.file_name);
        let mut safe_stem = sanitize_file_name(stem);
        if safe_stem.is_empty() {
            safe_stem = DEFAULT_STEM.to_string();
        }
        format!("{folder}/{timestamp_ms}_{safe_stem}.{extension}")
    }
}

/// Strips accents, turns whitespace runs into `-`, drops anything outside
/// `[a-zA-Z0-9._-]` and lowercases.
pub fn sanitize_file_name(name: &str) -> String {
    let whitespace = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"));
    let unsafe_chars =
        UNSAFE_CHARS.get_or_init(|| Regex::new(r"[^a-zA-Z0-9._-]").expect("valid regex"));

    let stripped: String = name.nfd().filter(|c| !is_combining_mark(*c)).collect();
    let hyphenated = whitespace.replace_all(&stripped, "-");
    unsafe_chars.replace_all(&hyphenated, "").to_lowercase()
}

/// Splits into the part before the first dot and the lowercased text after
/// the last dot.
pub fn split_file_name(file_name: &str) -> (&str, String) {
    let stem = file_name.split('.').next().unwrap_or_default();
    let extension = match file_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext.to_lowercase(),
        _ => DEFAULT_EXTENSION.to_string(),
    };
    (stem, extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn sanitizes_accents_parens_and_spaces() {
        let (stem, ext) = split_file_name("Relatório Final (2024).PNG");
        assert_eq!(sanitize_file_name(stem), "relatorio-final-2024");
        assert_eq!(ext, "png");
    }

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(sanitize_file_name("  João \t da   Silva "), "-joao-da-silva-");
    }

    #[test]
    fn output_is_ascii_storage_safe() {
        let safe = sanitize_file_name("Ação & Reação! №5 ünïcödé/..");
        assert!(safe
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "._-".contains(c)));
        assert!(!safe.contains(' '));
    }

    #[test]
    fn missing_extension_defaults_to_jpg() {
        assert_eq!(split_file_name("avatar"), ("avatar", "jpg".to_string()));
        assert_eq!(split_file_name("avatar."), ("avatar", "jpg".to_string()));
    }

    #[test]
    fn stem_stops_at_first_dot() {
        let (stem, ext) = split_file_name("capa.final.v2.JPEG");
        assert_eq!(stem, "capa");
        assert_eq!(ext, "jpeg");
    }

    #[test]
    fn storage_path_uses_folder_timestamp_and_sanitized_name() {
        let upload = ImageUpload::new("Foto Perfil.JPG", vec![1]);
        assert_eq!(
            upload.storage_path("authors", 1_700_000_000_123),
            "authors/1700000000123_foto-perfil.jpg"
        );

        let unnamed = ImageUpload::new("日本.png", vec![1]);
        assert_eq!(unnamed.storage_path("books", 1), "books/1_image.png");
    }

    #[test]
    fn content_type_is_guessed_from_name() {
        assert_eq!(ImageUpload::new("a.png", vec![]).content_type(), "image/png");
        assert_eq!(
            ImageUpload::new("a.unknownext", vec![]).content_type(),
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn from_path_reads_bytes_and_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Capa Livro.webp");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"RIFF").unwrap();

        let upload = ImageUpload::from_path(&path).await.unwrap();
        assert_eq!(upload.file_name, "Capa Livro.webp");
        assert_eq!(upload.bytes, b"RIFF");
    }

    #[tokio::test]
    async fn from_path_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ImageUpload::from_path(&dir.path().join("nope.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }
}
