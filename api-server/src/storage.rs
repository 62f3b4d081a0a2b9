//! Upload storage
//!
//! Captures are written to a single flat directory as
//! `<YYYYmmdd_HHMMSS>_<secure name>`. Every lookup goes through
//! `secure_filename`, so request-supplied names cannot leave the directory.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use pulse_core::constants::is_allowed_capture;

/// Stored upload
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub filename: String,
    pub path: PathBuf,
}

#[derive(Debug)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    /// Open the store, creating the directory if needed
    pub fn new<P: AsRef<Path>>(dir: P) -> std::io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write an upload under a timestamped, sanitised name
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> std::io::Result<StoredFile> {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let filename = format!("{}_{}", timestamp, secure_filename(original_name));
        let path = self.dir.join(&filename);

        tokio::fs::write(&path, bytes).await?;
        tracing::info!("Saved upload {} ({} bytes)", path.display(), bytes.len());

        Ok(StoredFile { filename, path })
    }

    /// Path of an existing upload
    pub async fn resolve(&self, filename: &str) -> Option<PathBuf> {
        let safe = secure_filename(filename);
        if safe.is_empty() {
            return None;
        }
        let path = self.dir.join(safe);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Some(path),
            _ => None,
        }
    }

    /// Capture files in the directory, sorted by name (upload order)
    pub async fn list_captures(&self) -> std::io::Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_allowed_capture(&name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Extension check used before anything is written
pub fn allowed_file(filename: &str) -> bool {
    is_allowed_capture(filename)
}

fn unsafe_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_.\-]").expect("static pattern"))
}

/// Reduce a client filename to a flat, ASCII-only name.
///
/// The name is NFKD-decomposed so accented letters keep their base letter,
/// then the remaining non-ASCII characters are dropped. Path separators and
/// whitespace runs become `_`, anything outside `[A-Za-z0-9_.-]` is removed
/// and leading or trailing `.`/`_` are stripped. May return an empty string.
pub fn secure_filename(filename: &str) -> String {
    let ascii: String = filename
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = unsafe_chars().replace_all(&joined, "");
    cleaned.trim_matches(|c| c == '.' || c == '_').to_string()
}
