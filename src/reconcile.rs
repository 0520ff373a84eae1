//! Matches SiteTracker attachment rows to ContentVersion metadata.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::table::{Row, Table, TableError};

pub const CONTENT_DOCUMENT_ID: &str = "ContentDocumentId";
pub const CONTENT_SIZE: &str = "ContentSize";
pub const CONTENT_SIZE_BYTES: &str = "ContentSizeBytes";
pub const CONTENT_SIZE_MB: &str = "ContentSizeMB";
pub const FILE_URL: &str = "FileUrl";
pub const ATTACHMENT_ID: &str = "Id";
pub const ATTACHMENT_URL: &str = "SiteTrackerAttachmentUrl";

/// Suffix for file-side columns whose names collide with SiteTracker columns.
const FILE_SUFFIX: &str = "_File";

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Column {0} missing from ContentVersion results")]
    MissingColumn(&'static str),

    #[error("Column not found in SiteTracker rows: {0}")]
    MissingDocIdColumn(String),

    #[error(transparent)]
    Table(#[from] TableError),
}

/// Distinct non-empty values of `column`. Missing cells and empty strings are
/// skipped. Returns an empty set if the column does not exist.
pub fn extract_docids(table: &Table, column: &str) -> HashSet<String> {
    table
        .column(column)
        .map(|values| {
            values
                .flatten()
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// `{instance}/lightning/r/ContentDocument/{id}/view`
pub fn file_url(instance_url: &str, content_document_id: &str) -> String {
    format!("{instance_url}/lightning/r/ContentDocument/{content_document_id}/view")
}

/// `{instance}/lightning/r/sitetracker__Attachment__c/{id}/view`
pub fn attachment_url(instance_url: &str, attachment_id: &str) -> String {
    format!("{instance_url}/lightning/r/sitetracker__Attachment__c/{attachment_id}/view")
}

fn parse_size(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn format_bytes(bytes: f64) -> String {
    if bytes.fract() == 0.0 && bytes.abs() < 1e15 {
        format!("{}", bytes as i64)
    } else {
        bytes.to_string()
    }
}

/// Round to two decimals; whole numbers keep one decimal place (`1.0`).
fn format_mb(bytes: f64) -> String {
    let mb = (bytes / BYTES_PER_MB * 100.0).round() / 100.0;
    if mb.fract() == 0.0 {
        format!("{mb:.1}")
    } else {
        mb.to_string()
    }
}

/// Append `ContentSizeBytes` and `ContentSizeMB`, derived from `ContentSize`.
/// Unparseable or absent sizes leave both cells missing.
pub fn add_size_columns(table: &mut Table) -> Result<(), TableError> {
    let sizes: Vec<Option<f64>> = match table.column(CONTENT_SIZE) {
        Some(values) => values.map(|v| v.and_then(parse_size)).collect(),
        None => vec![None; table.len()],
    };
    table.set_column(
        CONTENT_SIZE_BYTES,
        sizes.iter().map(|s| s.map(format_bytes)).collect(),
    )?;
    table.set_column(
        CONTENT_SIZE_MB,
        sizes.iter().map(|s| s.map(format_mb)).collect(),
    )
}

/// Keep rows whose `ContentDocumentId` is in `docids`. Returns the number kept.
pub fn filter_to_docids(
    table: &mut Table,
    docids: &HashSet<String>,
) -> Result<usize, ReconcileError> {
    let idx = table
        .column_index(CONTENT_DOCUMENT_ID)
        .ok_or(ReconcileError::MissingColumn(CONTENT_DOCUMENT_ID))?;
    table.retain_rows(|row| row[idx].as_ref().is_some_and(|id| docids.contains(id)));
    Ok(table.len())
}

/// Drop later rows repeating an earlier `ContentDocumentId`, keeping order.
/// Returns the number of rows dropped.
pub fn dedupe_docids(table: &mut Table) -> Result<usize, ReconcileError> {
    let idx = table
        .column_index(CONTENT_DOCUMENT_ID)
        .ok_or(ReconcileError::MissingColumn(CONTENT_DOCUMENT_ID))?;
    let before = table.len();
    let mut seen: HashSet<Option<String>> = HashSet::new();
    table.retain_rows(|row| seen.insert(row[idx].clone()));
    Ok(before - table.len())
}

/// Append `FileUrl` built from each row's `ContentDocumentId`.
pub fn add_file_urls(table: &mut Table, instance_url: &str) -> Result<(), ReconcileError> {
    let urls: Vec<Option<String>> = table
        .column(CONTENT_DOCUMENT_ID)
        .ok_or(ReconcileError::MissingColumn(CONTENT_DOCUMENT_ID))?
        .map(|id| id.map(|id| file_url(instance_url, id)))
        .collect();
    table.set_column(FILE_URL, urls)?;
    Ok(())
}

/// Left-join SiteTracker rows onto file metadata.
///
/// Every SiteTracker row appears exactly once, in order. File columns follow
/// the SiteTracker columns; a file column whose name is already taken gets the
/// `_File` suffix, and when `docid_col` is itself `ContentDocumentId` the key
/// appears once. `files` must already be deduplicated on `ContentDocumentId`.
/// If the result has an `Id` column, `SiteTrackerAttachmentUrl` is appended.
pub fn merge_site_tracker_and_files(
    site_tracker: &Table,
    files: &Table,
    docid_col: &str,
    instance_url: &str,
) -> Result<Table, ReconcileError> {
    let left_key = site_tracker
        .column_index(docid_col)
        .ok_or_else(|| ReconcileError::MissingDocIdColumn(docid_col.to_string()))?;
    let right_key = files
        .column_index(CONTENT_DOCUMENT_ID)
        .ok_or(ReconcileError::MissingColumn(CONTENT_DOCUMENT_ID))?;

    let shared_key = docid_col == CONTENT_DOCUMENT_ID;
    let right_columns: Vec<usize> = (0..files.columns().len())
        .filter(|&i| !(shared_key && i == right_key))
        .collect();

    let mut columns: Vec<String> = site_tracker.columns().to_vec();
    for &i in &right_columns {
        let name = &files.columns()[i];
        if site_tracker.has_column(name) {
            columns.push(format!("{name}{FILE_SUFFIX}"));
        } else {
            columns.push(name.clone());
        }
    }

    let mut by_docid: HashMap<&str, &Row> = HashMap::new();
    for row in files.rows() {
        if let Some(id) = row[right_key].as_deref() {
            by_docid.entry(id).or_insert(row);
        }
    }

    let rows: Vec<Row> = site_tracker
        .rows()
        .iter()
        .map(|left| {
            let matched = left[left_key].as_deref().and_then(|id| by_docid.get(id));
            let mut row = left.clone();
            row.extend(
                right_columns
                    .iter()
                    .map(|&i| matched.and_then(|right| right[i].clone())),
            );
            row
        })
        .collect();

    let mut merged = Table::from_rows(columns, rows);

    let attachment_urls: Option<Vec<Option<String>>> = merged.column(ATTACHMENT_ID).map(|ids| {
        ids.map(|id| id.map(|id| attachment_url(instance_url, id)))
            .collect()
    });
    if let Some(urls) = attachment_urls {
        merged.set_column(ATTACHMENT_URL, urls)?;
    }

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    fn table(csv: &str) -> Table {
        Table::from_csv_str(csv).unwrap()
    }

    #[test]
    fn test_extract_docids_skips_blank_and_duplicates() {
        let t = Table::from_rows(
            vec!["DocId".into()],
            vec![
                vec![cell("123")],
                vec![cell("")],
                vec![None],
                vec![cell("123")],
                vec![cell("456")],
            ],
        );
        let ids = extract_docids(&t, "DocId");
        assert_eq!(ids, HashSet::from(["123".to_string(), "456".to_string()]));
        assert_eq!(extract_docids(&t, "DocId"), ids);
    }

    #[test]
    fn test_extract_docids_order_independent() {
        let forward = table("DocId\n123\n\n456\n123\n789\n");
        let reversed = table("DocId\n789\n123\n456\n\n123\n");
        let ids = extract_docids(&forward, "DocId");
        assert_eq!(ids, extract_docids(&reversed, "DocId"));
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_null_markers_are_not_docids_or_attachment_ids() {
        let site_tracker = table("Id,DocId\nNA,null\nATT2,N/A\nnan,DOC1\n");
        let ids = extract_docids(&site_tracker, "DocId");
        assert_eq!(ids, HashSet::from(["DOC1".to_string()]));

        let files = table("ContentDocumentId,Title\nDOC1,File 1\n");
        let merged =
            merge_site_tracker_and_files(&site_tracker, &files, "DocId", "http://x").unwrap();
        let urls: Vec<Option<&str>> = merged.column(ATTACHMENT_URL).unwrap().collect();
        assert_eq!(
            urls,
            vec![
                None,
                Some("http://x/lightning/r/sitetracker__Attachment__c/ATT2/view"),
                None
            ]
        );
    }

    #[test]
    fn test_extract_docids_is_case_sensitive() {
        let t = table("DocId\nabc\nABC\n");
        assert_eq!(extract_docids(&t, "DocId").len(), 2);
    }

    #[test]
    fn test_file_url_template() {
        assert_eq!(
            file_url("http://example.com", "DOC1"),
            "http://example.com/lightning/r/ContentDocument/DOC1/view"
        );
    }

    #[test]
    fn test_add_file_urls_appends_lightning_url() {
        let mut t = table("ContentDocumentId\nDOC1\n");
        add_file_urls(&mut t, "http://example.com").unwrap();
        assert_eq!(
            t.column(FILE_URL).unwrap().next().unwrap(),
            Some("http://example.com/lightning/r/ContentDocument/DOC1/view")
        );
    }

    #[test]
    fn test_size_columns() {
        let mut t = table("ContentDocumentId,ContentSize\nA,1048576\nB,abc\nC,\nD,524288\nE,1234\n");
        add_size_columns(&mut t).unwrap();
        let bytes: Vec<Option<&str>> = t.column(CONTENT_SIZE_BYTES).unwrap().collect();
        let mb: Vec<Option<&str>> = t.column(CONTENT_SIZE_MB).unwrap().collect();
        assert_eq!(bytes, vec![Some("1048576"), None, None, Some("524288"), Some("1234")]);
        assert_eq!(mb, vec![Some("1.0"), None, None, Some("0.5"), Some("0.0")]);
    }

    #[test]
    fn test_size_columns_without_content_size() {
        let mut t = table("ContentDocumentId\nA\n");
        add_size_columns(&mut t).unwrap();
        assert_eq!(t.rows()[0], vec![cell("A"), None, None]);
    }

    #[test]
    fn test_filter_then_dedupe_keeps_first() {
        let mut t = table("ContentDocumentId,Title\nA,first\nB,other\nA,second\nC,x\n");
        let ids = HashSet::from(["A".to_string(), "C".to_string()]);
        assert_eq!(filter_to_docids(&mut t, &ids).unwrap(), 3);
        assert_eq!(dedupe_docids(&mut t).unwrap(), 1);
        let titles: Vec<Option<&str>> = t.column("Title").unwrap().collect();
        assert_eq!(titles, vec![Some("first"), Some("x")]);
    }

    #[test]
    fn test_filter_requires_docid_column() {
        let mut t = table("Title\nx\n");
        let err = filter_to_docids(&mut t, &HashSet::new()).unwrap_err();
        assert!(matches!(err, ReconcileError::MissingColumn(CONTENT_DOCUMENT_ID)));
    }

    #[test]
    fn test_merge_adds_file_columns_and_attachment_url() {
        let site_tracker = table("Id,DocId\nATT1,DOC1\n");
        let files = table("ContentDocumentId,Title,FileUrl\nDOC1,File 1,http://example.com/DOC1\n");
        let merged =
            merge_site_tracker_and_files(&site_tracker, &files, "DocId", "http://example.com")
                .unwrap();
        assert_eq!(
            merged.columns(),
            &["Id", "DocId", "ContentDocumentId", "Title", "FileUrl", ATTACHMENT_URL]
        );
        let row = &merged.rows()[0];
        assert_eq!(row[3], cell("File 1"));
        assert_eq!(
            row[5].as_deref(),
            Some("http://example.com/lightning/r/sitetracker__Attachment__c/ATT1/view")
        );
    }

    #[test]
    fn test_merge_preserves_row_count_and_leaves_unmatched_missing() {
        let site_tracker = table("Id,DocId\nATT1,DOC1\nATT2,DOC9\n,DOC1\nATT4,\n");
        let files = table("ContentDocumentId,Title\nDOC1,File 1\n");
        let merged =
            merge_site_tracker_and_files(&site_tracker, &files, "DocId", "http://x").unwrap();
        assert_eq!(merged.len(), site_tracker.len());

        let titles: Vec<Option<&str>> = merged.column("Title").unwrap().collect();
        assert_eq!(titles, vec![Some("File 1"), None, Some("File 1"), None]);

        let urls: Vec<Option<&str>> = merged.column(ATTACHMENT_URL).unwrap().collect();
        assert!(urls[2].is_none());
        assert!(urls.iter().flatten().all(|u| !u.contains("nan")));
    }

    #[test]
    fn test_merge_suffixes_overlapping_columns() {
        let site_tracker = table("DocId,Title\nDOC1,local title\n");
        let files = table("ContentDocumentId,Title\nDOC1,remote title\n");
        let merged =
            merge_site_tracker_and_files(&site_tracker, &files, "DocId", "http://x").unwrap();
        assert_eq!(
            merged.columns(),
            &["DocId", "Title", "ContentDocumentId", "Title_File"]
        );
        assert_eq!(merged.rows()[0][1], cell("local title"));
        assert_eq!(merged.rows()[0][3], cell("remote title"));
        assert!(!merged.has_column(ATTACHMENT_URL));
    }

    #[test]
    fn test_merge_on_shared_key_name_emits_key_once() {
        let site_tracker = table("ContentDocumentId,Name\nDOC1,a\n");
        let files = table("ContentDocumentId,Title\nDOC1,t\n");
        let merged = merge_site_tracker_and_files(
            &site_tracker,
            &files,
            CONTENT_DOCUMENT_ID,
            "http://x",
        )
        .unwrap();
        assert_eq!(merged.columns(), &["ContentDocumentId", "Name", "Title"]);
        assert_eq!(merged.rows()[0][2], cell("t"));
    }
}
