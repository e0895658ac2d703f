//! Packs rendered resumes into a single ZIP archive.

use std::collections::HashSet;
use std::io::{Cursor, Write};

use bytes::Bytes;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const DEFLATE_LEVEL: i64 = 6;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("zip write failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("zip write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Makes every name unique by suffixing repeats before the extension:
/// `Jane_Doe_Resume.pdf`, `Jane_Doe_Resume_2.pdf`, ...
pub fn unique_file_names<I>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut taken = HashSet::new();
    names
        .into_iter()
        .map(|name| {
            if taken.insert(name.clone()) {
                return name;
            }
            let (stem, ext) = match name.rsplit_once('.') {
                Some((stem, ext)) => (stem.to_string(), format!(".{ext}")),
                None => (name.clone(), String::new()),
            };
            let mut n = 2;
            loop {
                let candidate = format!("{stem}_{n}{ext}");
                if taken.insert(candidate.clone()) {
                    return candidate;
                }
                n += 1;
            }
        })
        .collect()
}

/// Writes `entries` in order, DEFLATE level 6.
pub fn package(entries: &[ArchiveEntry]) -> Result<Vec<u8>, ArchiveError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(DEFLATE_LEVEL));

    for entry in entries {
        zip.start_file(entry.file_name.as_str(), options)?;
        zip.write_all(&entry.bytes)?;
    }
    Ok(zip.finish()?.into_inner())
}

/// `package` on the blocking pool.
pub async fn package_blocking(entries: Vec<ArchiveEntry>) -> Result<Bytes, ArchiveError> {
    let archive = tokio::task::spawn_blocking(move || package(&entries)).await??;
    Ok(Bytes::from(archive))
}
