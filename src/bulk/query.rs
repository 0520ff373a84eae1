/// Fields exported for every latest `ContentVersion`.
const CONTENT_VERSION_FIELDS: &[&str] = &[
    "ContentDocumentId",
    "Title",
    "FileType",
    "FileExtension",
    "ContentSize",
    "CreatedDate",
    "CreatedById",
    "CreatedBy.Name",
    "LastModifiedDate",
    "OwnerId",
];

/// Collapse runs of whitespace (including newlines) to single spaces.
fn compact(soql: &str) -> String {
    soql.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn build_contentversion_soql() -> String {
    compact(&format!(
        "SELECT {}
         FROM ContentVersion
         WHERE IsLatest = true",
        CONTENT_VERSION_FIELDS.join(", ")
    ))
}
