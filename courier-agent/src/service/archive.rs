//! Archive steps
//!
//! Unpacks a package into the step folder, then substitutes variables in
//! the extracted text files found at the top level of the folder.

use anyhow::Context;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use super::variables::Variables;

/// Extensions of the files whose content gets variable substitution
pub const SUBSTITUTED_EXTENSIONS: &[&str] = &["sql", "txt", "ps1", "cmd", "sh", "js", "json"];

/// Extracts a zip archive into `folder`; returns the number of entries
pub async fn extract(body: Vec<u8>, folder: &Path) -> anyhow::Result<usize> {
    let folder = folder.to_path_buf();

    tokio::task::spawn_blocking(move || {
        let mut archive =
            zip::ZipArchive::new(Cursor::new(body)).context("Package is not a valid zip archive")?;
        let entries = archive.len();
        archive
            .extract(&folder)
            .with_context(|| format!("Failed to extract package into {}", folder.display()))?;
        Ok::<_, anyhow::Error>(entries)
    })
    .await
    .context("Extraction task failed")?
}

/// Substitutes variables inside the top-level text files of `folder`
///
/// Returns one log line per rewritten file. Files that are not valid UTF-8
/// are left untouched.
pub async fn substitute_files(folder: &Path, variables: &Variables) -> anyhow::Result<Vec<String>> {
    let mut logs = Vec::new();

    for path in candidate_files(folder).await? {
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                logs.push(format!("Skipped non-text file: '{}'", path.display()));
                continue;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };

        let substituted = variables
            .substitute(&content)
            .with_context(|| format!("Failed to substitute variables in {}", path.display()))?;

        if substituted != content {
            tokio::fs::write(&path, substituted)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            logs.push(format!("Variables substituted in: '{}'", path.display()));
        }
    }

    Ok(logs)
}

async fn candidate_files(folder: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(folder)
        .await
        .with_context(|| format!("Failed to list {}", folder.display()))?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() && has_substituted_extension(&path) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

fn has_substituted_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUBSTITUTED_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

#[cfg(test)]
pub(crate) fn zip_bytes(files: &[(&str, &str)]) -> Vec<u8> {
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    for (name, content) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }

    writer.finish().unwrap().into_inner()
}
