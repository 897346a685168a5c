//! Reading documents and field lists from disk.

use crate::error::{CliError, Result};
use estima_domain::{Document, Field};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Load every `*.txt` file in `dir`, sorted by file name.
///
/// The file name is the document id.
pub fn load_documents(dir: &Path) -> Result<Vec<Document>> {
    if !dir.is_dir() {
        return Err(CliError::InvalidInput(format!(
            "Document folder '{}' does not exist",
            dir.display()
        )));
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_text = path.extension().is_some_and(|ext| ext == "txt");
        if path.is_file() && is_text {
            paths.push(path);
        }
    }
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return Err(CliError::InvalidInput(format!(
                "File name '{}' is not valid UTF-8",
                path.display()
            )));
        };
        let text = fs::read_to_string(&path)?;
        debug!(document = name, chars = text.len(), "Loaded document");
        documents.push(Document::new(name, text));
    }

    info!(folder = %dir.display(), count = documents.len(), "Found documents");
    Ok(documents)
}

/// Parse a field list: one field per line, blank lines and `#` comments skipped.
pub fn parse_fields(contents: &str) -> Result<Vec<Field>> {
    let fields = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| Field::new(line).map_err(CliError::InvalidInput))
        .collect::<Result<Vec<_>>>()?;

    if fields.is_empty() {
        return Err(CliError::InvalidInput("Field list is empty".to_string()));
    }
    Ok(fields)
}

/// Read and parse a field list file.
pub fn read_fields(path: &Path) -> Result<Vec<Field>> {
    parse_fields(&fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_documents_sorted_txt_only() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.txt"), "second").unwrap();
        fs::write(dir.path().join("a.txt"), "first").unwrap();
        fs::write(dir.path().join("notes.pdf"), "skip").unwrap();
        fs::create_dir(dir.path().join("nested.txt")).unwrap();

        let documents = load_documents(dir.path()).unwrap();
        let ids: Vec<_> = documents.iter().map(|d| d.id()).collect();
        assert_eq!(ids, vec!["a.txt", "b.txt"]);
        assert_eq!(documents[0].text(), "first");
    }

    #[test]
    fn test_missing_folder() {
        let dir = TempDir::new().unwrap();
        let err = load_documents(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, CliError::InvalidInput(_)));
    }

    #[test]
    fn test_parse_fields() {
        let fields = parse_fields("# trial design\nSample size\n\n  Mean age  \n# done\n").unwrap();
        let names: Vec<_> = fields.iter().map(|f| f.as_str()).collect();
        assert_eq!(names, vec!["Sample size", "Mean age"]);
    }

    #[test]
    fn test_empty_field_list() {
        assert!(parse_fields("# nothing here\n\n").is_err());
    }

    #[test]
    fn test_read_fields_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fields.txt");
        fs::write(&path, "Sample size\n").unwrap();
        assert_eq!(read_fields(&path).unwrap().len(), 1);
    }
}
