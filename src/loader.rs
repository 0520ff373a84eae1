//! Loads the SiteTracker attachment export.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use thiserror::Error;

use crate::table::{Table, TableError};
use crate::types::InputEncoding;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unknown input encoding: {0}")]
    UnknownEncoding(String),

    #[error("{} is not valid {encoding} text (check --encoding)", .path.display())]
    Decode {
        path: PathBuf,
        encoding: &'static str,
    },

    #[error("Column not found in SiteTracker CSV: {0}")]
    MissingColumn(String),

    #[error("Malformed SiteTracker CSV: {0}")]
    Table(#[from] TableError),
}

/// Resolve an `--encoding` label.
pub fn resolve_encoding(label: &str) -> Result<InputEncoding, LoadError> {
    InputEncoding::from_label(label).ok_or_else(|| LoadError::UnknownEncoding(label.to_string()))
}

/// Drop a UTF-16 byte-order mark, switching endianness if the mark says so.
fn strip_utf16_bom<'a>(codec: &'static Encoding, bytes: &'a [u8]) -> (&'static Encoding, &'a [u8]) {
    if codec != UTF_16LE && codec != UTF_16BE {
        return (codec, bytes);
    }
    match Encoding::for_bom(bytes) {
        Some((found, len)) if found != UTF_8 => (found, &bytes[len..]),
        _ => (codec, bytes),
    }
}

fn decode(path: &Path, bytes: &[u8], encoding: InputEncoding) -> Result<String, LoadError> {
    let (codec, body) = match encoding {
        InputEncoding::Utf8Sig => (UTF_8, bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)),
        InputEncoding::Codec(codec) => strip_utf16_bom(codec, bytes),
    };
    codec
        .decode_without_bom_handling_and_without_replacement(body)
        .map(Cow::into_owned)
        .ok_or_else(|| LoadError::Decode {
            path: path.to_path_buf(),
            encoding: codec.name(),
        })
}

/// Column list for a narrowed load: requested names that exist in the
/// header, in request order, with `docid_col` appended if it was left out.
fn narrowed_columns(header: &[String], docid_col: &str, requested: &[String]) -> Vec<String> {
    let mut keep: Vec<String> = Vec::new();
    for name in requested.iter().map(|c| c.trim()) {
        if name.is_empty() || keep.iter().any(|k| k == name) {
            continue;
        }
        if header.iter().any(|h| h == name) {
            keep.push(name.to_string());
        }
    }
    if !keep.iter().any(|k| k == docid_col) {
        keep.push(docid_col.to_string());
    }
    keep
}

/// Read the SiteTracker export, check that `docid_col` exists, and optionally
/// narrow it to `selected_columns` (the id column is always kept).
pub fn read_sitetracker_csv(
    path: &Path,
    docid_col: &str,
    selected_columns: Option<&[String]>,
    encoding: InputEncoding,
) -> Result<Table, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let text = decode(path, &bytes, encoding)?;
    let table = Table::from_csv_str(&text)?;

    if !table.has_column(docid_col) {
        return Err(LoadError::MissingColumn(docid_col.to_string()));
    }

    match selected_columns {
        Some(requested) if !requested.is_empty() => {
            let keep = narrowed_columns(table.columns(), docid_col, requested);
            tracing::debug!("Keeping SiteTracker columns: {:?}", keep);
            Ok(table.select(&keep))
        }
        _ => Ok(table),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DOCID: &str = "sitetracker__ContentDocumentRecord__c";

    fn write_csv(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file.flush().unwrap();
        file
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_filters_and_keeps_docid_last() {
        let file = write_csv(
            format!("{DOCID},Name,Other\nDOC1,A,X\nDOC2,B,Y\n").as_bytes(),
        );
        let table = read_sitetracker_csv(
            file.path(),
            DOCID,
            Some(names(&["Name"]).as_slice()),
            InputEncoding::Codec(UTF_8),
        )
        .unwrap();
        assert_eq!(table.columns(), names(&["Name", DOCID]).as_slice());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_requested_docid_keeps_requested_position() {
        let file = write_csv(b"DocId,Name,Other\nD1,A,X\n");
        let table = read_sitetracker_csv(
            file.path(),
            "DocId",
            Some(names(&["Other", " DocId ", "Nope", "Name"]).as_slice()),
            InputEncoding::Codec(UTF_8),
        )
        .unwrap();
        assert_eq!(table.columns(), names(&["Other", "DocId", "Name"]).as_slice());
    }

    #[test]
    fn test_no_selection_returns_all_columns() {
        let file = write_csv(b"DocId,Name\nD1,A\n");
        let table = read_sitetracker_csv(file.path(), "DocId", None, InputEncoding::Codec(UTF_8)).unwrap();
        assert_eq!(table.columns(), names(&["DocId", "Name"]).as_slice());

        let table =
            read_sitetracker_csv(file.path(), "DocId", Some(&[][..]), InputEncoding::Codec(UTF_8))
                .unwrap();
        assert_eq!(table.columns().len(), 2);
    }

    #[test]
    fn test_missing_docid_column() {
        let file = write_csv(b"Name\nA\n");
        let err =
            read_sitetracker_csv(file.path(), "DocId", None, InputEncoding::Utf8Sig).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn(ref c) if c == "DocId"));
        assert_eq!(err.to_string(), "Column not found in SiteTracker CSV: DocId");
    }

    #[test]
    fn test_bom_stripped_by_default_encoding() {
        let mut contents = UTF8_BOM.to_vec();
        contents.extend_from_slice(b"DocId,Name\nD1,A\n");
        let file = write_csv(&contents);
        let table =
            read_sitetracker_csv(file.path(), "DocId", None, InputEncoding::Utf8Sig).unwrap();
        assert_eq!(table.columns()[0], "DocId");
    }

    #[test]
    fn test_latin1_decoding() {
        let file = write_csv(b"DocId,Name\nD1,Caf\xe9\n");
        let latin1 = resolve_encoding("latin-1").unwrap();
        let table = read_sitetracker_csv(file.path(), "DocId", None, latin1).unwrap();
        assert_eq!(table.rows()[0][1].as_deref(), Some("Café"));

        let err = read_sitetracker_csv(file.path(), "DocId", None, InputEncoding::Codec(UTF_8))
            .unwrap_err();
        assert!(matches!(err, LoadError::Decode { .. }));
    }

    #[test]
    fn test_cp1252_smart_quotes() {
        let file = write_csv(b"DocId,Name\nD1,\x93Site A\x94\n");
        let encoding = resolve_encoding("cp1252").unwrap();
        let table = read_sitetracker_csv(file.path(), "DocId", None, encoding).unwrap();
        assert_eq!(table.rows()[0][1].as_deref(), Some("\u{201C}Site A\u{201D}"));
    }

    #[test]
    fn test_utf16le_with_bom() {
        let mut contents = vec![0xFF, 0xFE];
        contents.extend("DocId,Name\nD1,Café\n".encode_utf16().flat_map(u16::to_le_bytes));
        let file = write_csv(&contents);
        let encoding = resolve_encoding("utf-16").unwrap();
        let table = read_sitetracker_csv(file.path(), "DocId", None, encoding).unwrap();
        assert_eq!(table.columns(), names(&["DocId", "Name"]).as_slice());
        assert_eq!(table.rows()[0][1].as_deref(), Some("Café"));
    }

    #[test]
    fn test_utf16_bom_overrides_endianness() {
        let mut contents = vec![0xFE, 0xFF];
        contents.extend("DocId\nD1\n".encode_utf16().flat_map(u16::to_be_bytes));
        let file = write_csv(&contents);
        let table = read_sitetracker_csv(
            file.path(),
            "DocId",
            None,
            InputEncoding::Codec(UTF_16LE),
        )
        .unwrap();
        assert_eq!(table.rows()[0][0].as_deref(), Some("D1"));
    }

    #[test]
    fn test_unknown_encoding_label() {
        let err = resolve_encoding("klingon-8").unwrap_err();
        assert!(matches!(err, LoadError::UnknownEncoding(ref l) if l == "klingon-8"));
    }

    #[test]
    fn test_unreadable_path() {
        let err = read_sitetracker_csv(
            Path::new("/nonexistent/attachments.csv"),
            "DocId",
            None,
            InputEncoding::Utf8Sig,
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::Read { .. }));
    }

    #[test]
    fn test_empty_cells_are_missing() {
        let file = write_csv(b"DocId,Name\n,A\nD2,\n");
        let table = read_sitetracker_csv(file.path(), "DocId", None, InputEncoding::Codec(UTF_8)).unwrap();
        assert_eq!(table.rows()[0][0], None);
        assert_eq!(table.rows()[1][1], None);
    }
}
