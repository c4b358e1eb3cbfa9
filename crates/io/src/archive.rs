// Zip bundle of the per-driver reports.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Zip every regular file directly inside `dir` into `zip_path`, deflated,
/// stored under its bare file name in name order. Returns the entry count.
pub fn zip_directory(dir: &Path, zip_path: &Path) -> Result<usize, String> {
    let mut files: Vec<_> = std::fs::read_dir(dir)
        .map_err(|e| format!("Failed to read '{}': {}", dir.display(), e))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|entry| entry.path())
        .collect();
    files.sort();

    let file = File::create(zip_path)
        .map_err(|e| format!("Failed to create '{}': {}", zip_path.display(), e))?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in &files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let bytes = std::fs::read(path)
            .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
        writer
            .start_file(name.as_str(), options)
            .map_err(|e| format!("Failed to add '{}': {}", name, e))?;
        writer
            .write_all(&bytes)
            .map_err(|e| format!("Failed to add '{}': {}", name, e))?;
    }

    writer
        .finish()
        .map_err(|e| format!("Failed to finish '{}': {}", zip_path.display(), e))?;
    Ok(files.len())
}

/// Entry names of an existing archive, in stored order.
pub fn list_entries(zip_path: &Path) -> Result<Vec<String>, String> {
    let file = File::open(zip_path)
        .map_err(|e| format!("Failed to open '{}': {}", zip_path.display(), e))?;
    let archive = ZipArchive::new(file)
        .map_err(|e| format!("Failed to read archive '{}': {}", zip_path.display(), e))?;
    Ok(archive.file_names().map(str::to_string).collect())
}
