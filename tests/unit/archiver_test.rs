//! Archiver tests: entry order, duplicate names and compression method.

use std::io::{Cursor, Read};

use omnidownloader::services::archiver::Archiver;
use zip::{CompressionMethod, ZipArchive};

fn read_entries(bytes: Vec<u8>) -> Vec<(String, Vec<u8>, CompressionMethod)> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut content = Vec::new();
            file.read_to_end(&mut content).unwrap();
            (file.name().to_string(), content, file.compression())
        })
        .collect()
}

#[test]
fn entries_keep_insertion_order() {
    let mut archiver = Archiver::new();
    archiver.add("b.jpg", b"second".to_vec());
    archiver.add("a.mov", b"first".to_vec());

    assert_eq!(archiver.len(), 2);
    let entries = read_entries(archiver.finish().unwrap());
    assert_eq!(entries[0].0, "b.jpg");
    assert_eq!(entries[0].1, b"second".to_vec());
    assert_eq!(entries[1].0, "a.mov");
    assert_eq!(entries[0].2, CompressionMethod::Deflated);
}

#[test]
fn duplicate_name_replaces_bytes_in_place() {
    let mut archiver = Archiver::new();
    archiver.add("x.png", b"old".to_vec());
    archiver.add("y.png", b"other".to_vec());
    archiver.add("x.png", b"new".to_vec());

    assert_eq!(archiver.names(), vec!["x.png".to_string(), "y.png".to_string()]);
    let entries = read_entries(archiver.finish().unwrap());
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].1, b"new".to_vec());
}

#[test]
fn stored_mode_skips_deflate() {
    let mut archiver = Archiver::new().with_deflate(false);
    archiver.add("doc.pdf", vec![1u8; 4096]);

    let entries = read_entries(archiver.finish().unwrap());
    assert_eq!(entries[0].2, CompressionMethod::Stored);
    assert_eq!(entries[0].1.len(), 4096);
}

#[test]
fn empty_archive_is_still_valid_zip() {
    let archiver = Archiver::default();
    assert!(archiver.is_empty());
    assert!(read_entries(archiver.finish().unwrap()).is_empty());
}
