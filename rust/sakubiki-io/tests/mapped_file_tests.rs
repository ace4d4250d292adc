use std::io::Write;

use sakubiki_io::MappedFile;

#[test]
fn test_mapping_survives_file_handle_close() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let content = "日本語のテキスト\n".repeat(4096);
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();

    let mapped = MappedFile::open(file.path()).unwrap();
    let path = file.path().to_path_buf();
    drop(file);
    assert!(!path.exists());
    // The mapping keeps the unlinked file's pages alive.
    assert_eq!(mapped.as_bytes(), content.as_bytes());
    assert!(std::str::from_utf8(&mapped).is_ok());
}

#[test]
fn test_directory_is_rejected() {
    let dir = tempfile::TempDir::new().unwrap();
    assert!(MappedFile::open(dir.path()).is_err());
}
