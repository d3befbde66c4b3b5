// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Tree model invariant properties: cycle rejection, clone fidelity,
//! attachment bookkeeping.

use fluxion::{CloneSpec, Document, FluxionError, NodeId, Tolerance, Value};
use proptest::prelude::*;

use crate::codec_props::{arb_tree, build_doc};

fn collect_subtree(doc: &Document, id: NodeId, out: &mut Vec<NodeId>) {
    out.push(id);
    for &child in doc.children(id) {
        collect_subtree(doc, child, out);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Property: no node accepts itself, an ancestor, or the root as a child.
    #[test]
    fn prop_cycle_attachments_rejected(spec in arb_tree()) {
        let mut doc = build_doc(&spec);
        let mut nodes = Vec::new();
        collect_subtree(&doc, doc.root(), &mut nodes);

        for &node in &nodes {
            prop_assert!(matches!(
                doc.add_child(node, node),
                Err(FluxionError::InvalidParent)
            ));
        }
        // Every strict descendant refuses its ancestors.
        for &node in &nodes {
            let mut cursor = doc.parent(node);
            while let Some(ancestor) = cursor {
                prop_assert!(matches!(
                    doc.add_child(node, ancestor),
                    Err(FluxionError::InvalidParent)
                ));
                cursor = doc.parent(ancestor);
            }
        }
    }

    /// Property: a full clone is deep-equal to its source and detached.
    #[test]
    fn prop_full_clone_is_deep_equal(spec in arb_tree()) {
        let mut doc = build_doc(&spec);
        let root = doc.root();
        let copy = doc.clone_node(root, &CloneSpec::all());
        prop_assert!(doc.deep_eq(root, copy, &Tolerance::default()));
        prop_assert_eq!(doc.parent(copy), None);
    }

    /// Property: parent back-references always agree with child sequences.
    #[test]
    fn prop_back_references_consistent(spec in arb_tree()) {
        let doc = build_doc(&spec);
        let mut nodes = Vec::new();
        collect_subtree(&doc, doc.root(), &mut nodes);
        for &node in &nodes {
            for &child in doc.children(node) {
                prop_assert_eq!(doc.parent(child), Some(node));
            }
            if let Some(parent) = doc.parent(node) {
                prop_assert!(doc.children(parent).contains(&node));
            }
        }
    }

    /// Property: detaching and re-adding a child preserves the subtree.
    #[test]
    fn prop_move_preserves_subtree(spec in arb_tree()) {
        let mut doc = build_doc(&spec);
        let root = doc.root();
        prop_assume!(!doc.children(root).is_empty());
        let child = doc.children(root)[0];
        let snapshot = doc.clone_node(child, &CloneSpec::all());

        let fresh = doc.create_node(Some("Fresh"), Value::Null);
        doc.add_child(root, fresh).unwrap();
        doc.add_child(fresh, child).unwrap();

        prop_assert_eq!(doc.parent(child), Some(fresh));
        prop_assert!(!doc.children(root).contains(&child));
        prop_assert!(doc.deep_eq(child, snapshot, &Tolerance::default()));
    }
}
