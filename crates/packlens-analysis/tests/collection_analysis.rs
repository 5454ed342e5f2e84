//! End-to-end collection analysis over synthetic packages
//!
//! Exercises the full pipeline through the public API: byte sources in,
//! unified report out. Packages are assembled in memory with real zlib
//! payloads so the content-collision pass does genuine work.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::io::Read;

use flate2::Compression;
use flate2::read::ZlibEncoder;
use packlens_analysis::{
    ArchiveInput, CollectionAnalyzer, ConflictKind, Diagnostic, Severity, TypeRegistry,
};
use pretty_assertions::assert_eq;

const ZLIB_FLAG: u32 = 0x5A42;
const LEGACY_FLAG: u32 = 0xFFFF;

struct Entry {
    type_id: u32,
    instance_id: u64,
    payload: Vec<u8>,
    flags: u32,
}

fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(data, Compression::default());
    let mut out = Vec::new();
    encoder.read_to_end(&mut out).expect("deflate succeeds");
    out
}

fn build_package(entries: &[Entry]) -> Vec<u8> {
    let mut payloads = Vec::new();
    let mut layout = Vec::new();
    let mut offset = 96u32;
    for entry in entries {
        let stored = match entry.flags {
            ZLIB_FLAG => deflate(&entry.payload),
            _ => entry.payload.clone(),
        };
        layout.push((offset, entry.payload.len() as u32, stored.len() as u32));
        offset += stored.len() as u32;
        payloads.push(stored);
    }

    let mut data = vec![0u8; 96];
    data[0..4].copy_from_slice(b"DBPF");
    data[0x04..0x08].copy_from_slice(&2u32.to_le_bytes());
    data[0x28..0x2C].copy_from_slice(&(entries.len() as u32).to_le_bytes());
    data[0x2C..0x30].copy_from_slice(&offset.to_le_bytes());
    data[0x30..0x34].copy_from_slice(&((entries.len() * 32) as u32).to_le_bytes());
    for payload in &payloads {
        data.extend_from_slice(payload);
    }
    for (entry, (data_offset, uncompressed, stored)) in entries.iter().zip(&layout) {
        data.extend_from_slice(&entry.type_id.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&entry.instance_id.to_le_bytes());
        data.extend_from_slice(&data_offset.to_le_bytes());
        data.extend_from_slice(&uncompressed.to_le_bytes());
        data.extend_from_slice(&stored.to_le_bytes());
        data.extend_from_slice(&entry.flags.to_le_bytes());
    }
    data
}

fn entry(type_id: u32, instance_id: u64, payload: &[u8], flags: u32) -> Entry {
    Entry {
        type_id,
        instance_id,
        payload: payload.to_vec(),
        flags,
    }
}

#[test]
fn full_pipeline_over_a_messy_collection() {
    // x and y fight over a core system key; y and z ship byte-identical
    // content under different instances; w is corrupt; z declares a
    // dependency on y and one on a package nobody installed.
    let shared_mesh = b"vertex data vertex data vertex data".repeat(30);

    let x = build_package(&[entry(0x545503B2, 0xA, b"sim data from x", 0)]);
    let y = build_package(&[
        entry(0x545503B2, 0xA, b"sim data from y", 0),
        entry(0x015A1849, 0x1, &shared_mesh, ZLIB_FLAG),
    ]);
    let z = build_package(&[entry(0x015A1849, 0x2, &shared_mesh, ZLIB_FLAG)]);
    let w = vec![0u8; 64]; // truncated garbage

    let inputs = vec![
        ArchiveInput::new("x.package", x),
        ArchiveInput::new("y.package", y),
        ArchiveInput::new("z.package", z)
            .with_requires(vec!["y.package".to_string(), "ghost.package".to_string()]),
        ArchiveInput::new("w.package", w),
    ];

    let report = CollectionAnalyzer::new().analyze(&inputs);

    // One skipped archive, three analyzed.
    assert_eq!(report.archives.len(), 3);
    assert_eq!(report.skipped_count(), 1);
    assert_eq!(report.failures[0].name, "w.package");

    // Critical identifier collision between x and y comes first.
    assert!(report.has_critical_conflicts());
    let first = &report.conflicts[0];
    assert_eq!(first.kind, ConflictKind::IdentifierCollision);
    assert_eq!(first.severity, Severity::Critical);
    let names: Vec<_> = first.archives.iter().map(|id| id.name.as_str()).collect();
    assert_eq!(names, ["x.package", "y.package"]);

    // Content collision between y and z.
    let collisions: Vec<_> = report
        .conflicts
        .iter()
        .filter(|c| c.kind == ConflictKind::ResourceCollision)
        .collect();
    assert_eq!(collisions.len(), 1);
    let names: Vec<_> = collisions[0]
        .archives
        .iter()
        .map(|id| id.name.as_str())
        .collect();
    assert_eq!(names, ["y.package", "z.package"]);

    // Graph: z -> y satisfied, z -> ghost missing; no cycles.
    assert!(report.cycles.is_empty());
    assert_eq!(
        report.missing_dependencies,
        vec![("z.package".to_string(), "ghost.package".to_string())]
    );
    let order = report.load_order.expect("acyclic");
    let y_pos = order.iter().position(|n| n == "y.package").expect("y");
    let z_pos = order.iter().position(|n| n == "z.package").expect("z");
    assert!(y_pos < z_pos);

    // Removal impact of y: z depends on it.
    let impact = report.graph.removal_impact("y.package");
    assert!(impact.directly_broken.contains("z.package"));
}

#[test]
fn analysis_is_idempotent_across_runs() {
    let a = build_package(&[
        entry(0x545503B2, 1, b"alpha", 0),
        entry(0xD382BF57, 2, b"hook", 0),
    ]);
    let b = build_package(&[
        entry(0x545503B2, 1, b"beta", 0),
        entry(0xD382BF57, 2, b"hook two", 0),
    ]);
    let inputs = vec![
        ArchiveInput::new("a.package", a),
        ArchiveInput::new("b.package", b),
    ];

    let analyzer = CollectionAnalyzer::new();
    let first = analyzer.analyze(&inputs);
    let second = analyzer.analyze(&inputs);

    assert_eq!(first.conflicts.len(), 2);
    assert_eq!(first.conflicts.len(), second.conflicts.len());
    for (x, y) in first.conflicts.iter().zip(&second.conflicts) {
        assert_eq!(x.severity, y.severity);
        assert_eq!(x.keys, y.keys);
        let names_x: Vec<_> = x.archives.iter().map(|id| &id.name).collect();
        let names_y: Vec<_> = y.archives.iter().map(|id| &id.name).collect();
        assert_eq!(names_x, names_y);
    }

    // Severity ordering within the report: Critical before High.
    assert_eq!(first.conflicts[0].severity, Severity::Critical);
    assert_eq!(first.conflicts[1].severity, Severity::High);
}

#[test]
fn unreadable_resources_surface_as_diagnostics() {
    let ok = build_package(&[entry(0x00B2D882, 1, b"cas part", 0)]);
    let with_legacy = build_package(&[
        entry(0x00B2D882, 2, b"legacy blob", LEGACY_FLAG),
        entry(0x00B2D882, 3, b"readable blob", 0),
    ]);

    let inputs = vec![
        ArchiveInput::new("ok.package", ok),
        ArchiveInput::new("legacy.package", with_legacy),
    ];
    let report = CollectionAnalyzer::new().analyze(&inputs);

    // Both archives analyzed; the legacy resource is a diagnostic, not a
    // failure, and the archive's other resources still participated.
    assert_eq!(report.archives.len(), 2);
    assert_eq!(report.diagnostics.len(), 1);
    let Diagnostic::UnreadableResource { archive, key, .. } = &report.diagnostics[0];
    assert_eq!(archive.name, "legacy.package");
    assert_eq!(key.instance_id, 2);
}

#[test]
fn alternate_type_tables_change_severity() {
    let a = build_package(&[entry(0x0BADF00D, 7, b"payload a", 0)]);
    let b = build_package(&[entry(0x0BADF00D, 7, b"payload b", 0)]);
    let inputs = vec![
        ArchiveInput::new("a.package", a),
        ArchiveInput::new("b.package", b),
    ];

    let default_report = CollectionAnalyzer::new().analyze(&inputs);
    assert_eq!(default_report.conflicts[0].severity, Severity::Medium);

    let custom = CollectionAnalyzer::new()
        .with_registry(TypeRegistry::new([0x0BADF00D], std::iter::empty()));
    let custom_report = custom.analyze(&inputs);
    assert_eq!(custom_report.conflicts[0].severity, Severity::Critical);
}

#[test]
fn disabling_content_collisions_drops_only_content_matches() {
    let shared = b"identical payload".repeat(10);
    // Same bytes under different instances in each archive, plus one real
    // key collision.
    let a = build_package(&[entry(0x12, 1, &shared, 0), entry(0x34, 9, b"a", 0)]);
    let b = build_package(&[entry(0x12, 2, &shared, 0), entry(0x34, 9, b"b", 0)]);
    let inputs = vec![
        ArchiveInput::new("a.package", a),
        ArchiveInput::new("b.package", b),
    ];

    let report = CollectionAnalyzer::new()
        .without_content_collisions()
        .analyze(&inputs);
    assert_eq!(report.conflicts.len(), 1);
    assert_eq!(report.conflicts[0].kind, ConflictKind::IdentifierCollision);
    assert!(report.diagnostics.is_empty());
}

#[test]
fn conflicts_serialize_to_json_for_renderers() {
    let a = build_package(&[entry(0x545503B2, 5, b"one", 0)]);
    let b = build_package(&[entry(0x545503B2, 5, b"two", 0)]);
    let inputs = vec![
        ArchiveInput::new("a.package", a),
        ArchiveInput::new("b.package", b),
    ];
    let report = CollectionAnalyzer::new().analyze(&inputs);

    let json = serde_json::to_value(&report.conflicts).expect("conflicts serialize");
    assert_eq!(json[0]["severity"], "Critical");
    assert_eq!(json[0]["archives"][0]["name"], "a.package");
}
