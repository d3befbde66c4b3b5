// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! End-to-end scenarios: encode, decode, compare, and the documented
//! failure modes for malformed inputs.

mod common;

use common::{all_variants_doc, two_level_doc, user_list_doc};
use fluxion::{
    from_bytes, read_file, to_bytes, write_file, Document, FluxionError, FormatVersion,
    Tolerance, WriteOptions, MAGIC,
};

const ALL_VERSIONS: [FormatVersion; 3] =
    [FormatVersion::V1, FormatVersion::V2, FormatVersion::V3];

#[test]
fn empty_root_encodes_and_roundtrips_at_v1() {
    let doc = Document::new();
    let bytes = to_bytes(&doc, &WriteOptions::with_version(FormatVersion::V1)).unwrap();
    // Magic, version 1, UTF-8 encoding id, then a single tag byte.
    assert_eq!(&bytes[..5], &[0x46, 0x4C, 0x58, 0x01, 0x00]);
    assert_eq!(bytes.len(), 6);

    let decoded = from_bytes(&bytes).unwrap();
    assert!(doc.content_eq(&decoded, &Tolerance::default()));
    assert_eq!(decoded.name(decoded.root()), None);
    assert!(decoded.children(decoded.root()).is_empty());
    assert!(decoded.attributes(decoded.root()).is_empty());
}

#[test]
fn named_tree_roundtrips_at_every_version() {
    let doc = two_level_doc();
    for version in ALL_VERSIONS {
        let bytes = to_bytes(&doc, &WriteOptions::with_version(version)).unwrap();
        let decoded = from_bytes(&bytes).unwrap();
        assert!(
            doc.content_eq(&decoded, &Tolerance::default()),
            "structure lost at {version:?}"
        );

        let root = decoded.root();
        assert_eq!(decoded.name(root), Some("MyRootNode"));
        let user = decoded.child_by_name(root, "User").unwrap();
        assert_eq!(decoded.value(user), &fluxion::Value::from("mike"));
        assert_eq!(
            decoded.attribute_by_name(user, "Age").unwrap().value(),
            &fluxion::Value::I32(35)
        );
        let inner = decoded.child_by_name(user, "User").unwrap();
        assert_eq!(decoded.value(inner), &fluxion::Value::from("jeremy"));
    }
}

#[test]
fn every_value_variant_roundtrips_at_every_version() {
    let doc = all_variants_doc();
    for version in ALL_VERSIONS {
        let bytes = to_bytes(&doc, &WriteOptions::with_version(version)).unwrap();
        let decoded = from_bytes(&bytes).unwrap();
        assert!(
            doc.content_eq(&decoded, &Tolerance::default()),
            "variant lost at {version:?}"
        );
    }
}

#[test]
fn duplicate_heavy_trees_shrink_across_versions() {
    let doc = user_list_doc(100);
    let v1 = to_bytes(&doc, &WriteOptions::with_version(FormatVersion::V1)).unwrap();
    let v2 = to_bytes(&doc, &WriteOptions::with_version(FormatVersion::V2)).unwrap();
    let v3 = to_bytes(&doc, &WriteOptions::with_version(FormatVersion::V3)).unwrap();

    // The pool holds each string once.
    assert_eq!(v2.windows(4).filter(|w| w == b"User").count(), 1);
    assert_eq!(v2.windows(4).filter(|w| w == b"mike").count(), 1);

    assert!(v2.len() < v1.len(), "v2 {} !< v1 {}", v2.len(), v1.len());
    assert!(v3.len() <= v2.len(), "v3 {} !<= v2 {}", v3.len(), v2.len());

    for bytes in [v1, v2, v3] {
        let decoded = from_bytes(&bytes).unwrap();
        assert!(doc.content_eq(&decoded, &Tolerance::default()));
    }
}

#[test]
fn mutual_attachment_fails_with_invalid_parent() {
    let mut doc = Document::new();
    let a = doc.create_node(Some("A"), fluxion::Value::Null);
    let b = doc.create_node(Some("B"), fluxion::Value::Null);
    doc.add_child(a, b).unwrap();
    assert!(matches!(
        doc.add_child(b, a),
        Err(FluxionError::InvalidParent)
    ));
}

#[test]
fn short_header_fails_cleanly() {
    let err = from_bytes(&[0x46, 0x4C]).unwrap_err();
    assert!(matches!(
        err,
        FluxionError::InvalidHeader | FluxionError::EndOfStream
    ));
    assert!(matches!(
        from_bytes(&[]).unwrap_err(),
        FluxionError::InvalidHeader | FluxionError::EndOfStream
    ));
}

#[test]
fn files_from_the_future_are_rejected() {
    let err = from_bytes(&[0x46, 0x4C, 0x58, 0x04]).unwrap_err();
    assert!(matches!(err, FluxionError::UnsupportedVersion(4)));
    let err = from_bytes(&[0x46, 0x4C, 0x58, 0xFF]).unwrap_err();
    assert!(matches!(err, FluxionError::UnsupportedVersion(0xFF)));
}

#[test]
fn magic_is_stable_across_versions() {
    let doc = two_level_doc();
    for version in ALL_VERSIONS {
        let bytes = to_bytes(&doc, &WriteOptions::with_version(version)).unwrap();
        assert_eq!(&bytes[..3], &MAGIC);
        assert_eq!(bytes[3], version.as_byte());
    }
}

#[test]
fn decoded_documents_report_the_file_version() {
    let doc = two_level_doc();
    for version in ALL_VERSIONS {
        let bytes = to_bytes(&doc, &WriteOptions::with_version(version)).unwrap();
        assert_eq!(from_bytes(&bytes).unwrap().version(), version);
    }
}

#[test]
fn file_helpers_roundtrip_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.flx");
    let doc = two_level_doc();
    for version in ALL_VERSIONS {
        write_file(&path, &doc, &WriteOptions::with_version(version)).unwrap();
        let decoded = read_file(&path).unwrap();
        assert!(doc.content_eq(&decoded, &Tolerance::default()));
    }
}

#[test]
fn missing_file_surfaces_as_io_error() {
    let err = read_file("/nonexistent/fluxion/doc.flx").unwrap_err();
    assert!(matches!(err, FluxionError::Io(_)));
}

#[test]
fn truncated_bodies_fail_with_end_of_stream() {
    let doc = two_level_doc();
    for version in ALL_VERSIONS {
        let bytes = to_bytes(&doc, &WriteOptions::with_version(version)).unwrap();
        for cut in [bytes.len() - 1, bytes.len() / 2, 6] {
            let err = from_bytes(&bytes[..cut]).unwrap_err();
            assert!(
                matches!(
                    err,
                    FluxionError::EndOfStream
                        | FluxionError::UnexpectedItemType { .. }
                        | FluxionError::AnalyzedDataMissing
                ),
                "unexpected error at {version:?} cut {cut}: {err:?}"
            );
        }
    }
}
