//! End-to-end install/restore scenarios
//!
//! These exercise the full stage -> patch -> deploy -> restore pipeline
//! against archives fabricated in temp directories, including the exact
//! size-reconciliation behavior for shrunk and grown re-encodings.

use pretty_assertions::assert_eq;
use preloader_core::{
    ContentTransform, DocumentFn, Error, FileProcessor, IdentityTransform, InstallJob,
    OperationConfig, Operations, PAD_BYTE,
};
use source_pcf::{AttributeValue, Document, Element, PcfVersion};
use source_vpk::{Vpk, VpkBuilder};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// A document whose encoded size is `base_size() + payload` bytes
fn doc_with_payload(payload: usize) -> Document {
    let mut doc = Document::new(PcfVersion::Binary2Pcf1);
    let mut element = Element::new("DmeParticleSystemDefinition", "fixture");
    element.set_attribute("data", AttributeValue::Binary(vec![0xC3; payload]));
    doc.push_element(element);
    doc
}

/// Encoded size of the fixture document with an empty payload
fn base_size() -> usize {
    doc_with_payload(0).encode().unwrap().len()
}

/// Encode a fixture document of exactly `total` bytes
fn encoded_with_total_size(total: usize) -> Vec<u8> {
    let payload = total - base_size();
    doc_with_payload(payload).encode().unwrap()
}

struct Fixture {
    _root: TempDir,
    config: OperationConfig,
    archive_path: PathBuf,
}

/// Live game directory holding one archive with a 1024-byte particle entry
fn setup() -> Fixture {
    let root = TempDir::new().unwrap();
    let live_dir = root.path().join("game");
    fs::create_dir_all(&live_dir).unwrap();

    let archive_path = live_dir.join("pak_dir.vpk");
    VpkBuilder::new()
        .add_file_data(encoded_with_total_size(1024), "effects/foo.pcf")
        .add_file_data(b"\"LightmappedGeneric\" {}\n".to_vec(), "materials/wall.vmt")
        .build(&archive_path)
        .unwrap();

    let config = OperationConfig {
        live_dir: live_dir.clone(),
        backup_dir: root.path().join("backup"),
        archive_name: "pak_dir.vpk".to_string(),
    };
    Fixture {
        _root: root,
        config,
        archive_path,
    }
}

/// A transform that replaces the document with one of a fixed encoded size
fn resize_transform(total: usize) -> Box<dyn ContentTransform + Send> {
    Box::new(DocumentFn(
        move |_original: Document| -> preloader_core::Result<Document> {
            Ok(doc_with_payload(total - base_size()))
        },
    ))
}

#[test]
fn install_pads_shrunk_encoding_and_restore_reverts_bitwise() {
    let fixture = setup();
    let pristine = fs::read(&fixture.archive_path).unwrap();

    let jobs = vec![InstallJob {
        name: "foo.pcf".to_string(), // bare name, resolved against the index
        transform: resize_transform(1000),
    }];

    let handle = Operations::spawn_install(fixture.config.clone(), jobs);
    let events: Vec<_> = handle.events.iter().collect();
    let summary = handle.wait().unwrap();
    assert_eq!(summary.patched, 1);
    assert!(summary.skipped.is_empty());

    // Progress events are ordered, small in number, and end at 100%
    assert!(!events.is_empty());
    assert!(events.len() < 10);
    assert!(events.windows(2).all(|w| w[0].percent <= w[1].percent));
    assert_eq!(events.last().unwrap().percent, 100);

    // The patched entry is exactly 1024 bytes: the 1000-byte re-encoding
    // with 24 filler bytes inserted before the terminal byte
    let archive = Vpk::open(&fixture.archive_path).unwrap();
    let patched = archive.read_file("effects/foo.pcf").unwrap();
    let mut expected = encoded_with_total_size(1000);
    let insert_at = expected.len() - 1;
    expected.splice(insert_at..insert_at, std::iter::repeat(PAD_BYTE).take(24));
    assert_eq!(patched.len(), 1024);
    assert_eq!(patched, expected);
    drop(archive);

    // Restore brings the archive back bit-for-bit
    let handle = Operations::spawn_restore(fixture.config.clone());
    let restored = handle.wait().unwrap();
    assert_eq!(restored, 1);
    assert_eq!(fs::read(&fixture.archive_path).unwrap(), pristine);
}

#[test]
fn oversize_encoding_fails_and_leaves_entry_unchanged() {
    let fixture = setup();
    let pristine = fs::read(&fixture.archive_path).unwrap();

    let mut vpk = Vpk::open(&fixture.archive_path).unwrap();
    let mut processor = FileProcessor::new(&mut vpk);
    let mut transform = DocumentFn(
        move |_original: Document| -> preloader_core::Result<Document> {
            Ok(doc_with_payload(1100 - base_size()))
        },
    );

    let err = processor
        .process("effects/foo.pcf", &mut transform, false)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::SizeConstraint {
            slot: 1024,
            encoded: 1100,
            ..
        }
    ));
    drop(vpk);

    // Still the original 1024 bytes, whole archive untouched
    assert_eq!(fs::read(&fixture.archive_path).unwrap(), pristine);
}

#[test]
fn equal_size_encoding_patches_without_padding() {
    let fixture = setup();

    let mut vpk = Vpk::open(&fixture.archive_path).unwrap();
    let mut processor = FileProcessor::new(&mut vpk);
    let replacement = encoded_with_total_size(1024);
    let mut transform = DocumentFn(
        move |_original: Document| -> preloader_core::Result<Document> {
            Ok(doc_with_payload(1024 - base_size()))
        },
    );
    processor
        .process("effects/foo.pcf", &mut transform, false)
        .unwrap();

    assert_eq!(
        vpk.read_file("effects/foo.pcf").unwrap(),
        replacement
    );
}

#[test]
fn plain_text_entries_skip_structural_decode() {
    let fixture = setup();

    let mut vpk = Vpk::open(&fixture.archive_path).unwrap();
    let original = vpk.read_file("materials/wall.vmt").unwrap();

    struct Shorten;
    impl preloader_core::ContentTransform for Shorten {
        fn apply_bytes(&mut self, bytes: Vec<u8>) -> preloader_core::Result<Vec<u8>> {
            Ok(bytes[..bytes.len() / 2].to_vec())
        }
    }

    let mut processor = FileProcessor::new(&mut vpk);
    processor
        .process("wall.vmt", &mut Shorten, false)
        .unwrap();

    let patched = vpk.read_file("materials/wall.vmt").unwrap();
    // No padding policy on the text path; the slot keeps its length with
    // the original tail in place
    assert_eq!(patched.len(), original.len());
    assert_eq!(&patched[..original.len() / 2], &original[..original.len() / 2]);
}

#[test]
fn unsupported_file_type_is_rejected() {
    let root = TempDir::new().unwrap();
    let archive_path = root.path().join("pak_dir.vpk");
    VpkBuilder::new()
        .add_file_data(vec![0; 64], "sound/hit.wav")
        .build(&archive_path)
        .unwrap();

    let mut vpk = Vpk::open(&archive_path).unwrap();
    let mut processor = FileProcessor::new(&mut vpk);
    let err = processor
        .process("sound/hit.wav", &mut IdentityTransform, false)
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedFileType(_)));
}

#[test]
fn missing_entry_is_reported_not_fatal() {
    let fixture = setup();

    let jobs = vec![
        InstallJob {
            name: "absent.pcf".to_string(),
            transform: Box::new(IdentityTransform),
        },
        InstallJob {
            name: "foo.pcf".to_string(),
            transform: resize_transform(1024),
        },
    ];

    let summary = Operations::new(fixture.config.clone())
        .install(jobs, &preloader_core::ProgressSender::disabled())
        .unwrap();
    assert_eq!(summary.patched, 1);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].0, "absent.pcf");

    // The install still deployed; a restore brings the baseline back
    let restored = Operations::new(fixture.config)
        .restore(&preloader_core::ProgressSender::disabled())
        .unwrap();
    assert_eq!(restored, 1);
}
