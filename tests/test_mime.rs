use portico::http::mime::MimeTable;

const TABLE: &str = "\
# comment line
text/html            html htm
image/jpeg           jpeg jpg

application/x-empty
text/plain           txt
";

#[test]
fn test_lookup_by_suffix() {
    let table = MimeTable::parse(TABLE);

    assert_eq!(table.lookup("index.html"), Some("text/html"));
    assert_eq!(table.lookup("photo.final.jpg"), Some("image/jpeg"));
    assert_eq!(table.lookup("notes.txt"), Some("text/plain"));
    assert_eq!(table.len(), 5);
}

#[test]
fn test_unknown_or_missing_suffix() {
    let table = MimeTable::parse(TABLE);

    assert_eq!(table.lookup("archive.xyz"), None);
    assert_eq!(table.lookup("README"), None);
    assert_eq!(table.lookup("trailing."), None);
}

#[test]
fn test_suffix_is_case_sensitive() {
    let table = MimeTable::parse(TABLE);
    assert_eq!(table.lookup("INDEX.HTML"), None);
}

#[test]
fn test_bundled_table_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/conf/mime.types");
    let table = MimeTable::load(path).unwrap();

    assert!(!table.is_empty());
    assert_eq!(table.lookup("style.css"), Some("text/css"));
}

#[test]
fn test_missing_file_is_an_error() {
    assert!(MimeTable::load("/nonexistent/mime.types").is_err());
}
