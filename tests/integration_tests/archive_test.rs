//! Archive rotation tests
//!
//! Builds a published set for one day by hand and rotates it from the next.

use newsquiz::config::OutputConfig;
use newsquiz::models::{
    CategoryKey, CollageAsset, DatedContentSet, DistractorItem, FeaturedItem, OnThisDaySet,
};
use newsquiz::storage::{ArchiveIndex, ArchiveRotation, PublicationWriter, RotationOutcome};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use super::fixtures::{read_json, FAKE_PNG};
use crate::common::date;

fn output(dir: &TempDir) -> OutputConfig {
    OutputConfig {
        web_root: dir.path().to_path_buf(),
        ..OutputConfig::default()
    }
}

fn item(id: &str) -> FeaturedItem {
    FeaturedItem {
        id: id.to_string(),
        headline: format!("Headline {id}"),
        year: None,
        source: "Tagesschau".to_string(),
        style: None,
        image: format!("images/{id}.png"),
    }
}

/// Publish a set for 2026-02-13 with five assets on disk
fn publish_day_one(root: &Path, output: &OutputConfig) -> DatedContentSet {
    let day = date(2026, 2, 13);
    let mut set = DatedContentSet::new(day);
    set.categories
        .insert(CategoryKey::Germany, vec![item("de1"), item("de2")]);
    set.categories.insert(CategoryKey::History, vec![item("hi1")]);
    set.distractors.insert(
        CategoryKey::History,
        vec![DistractorItem {
            id: "hd1".to_string(),
            headline: "A decoy".to_string(),
            year: Some(1066),
            source: "Historical Record".to_string(),
        }],
    );
    set.collages.entry(CategoryKey::World).or_default().insert(
        "vangogh".to_string(),
        CollageAsset {
            image: "images/collage_world_vangogh.png".to_string(),
            style: "Vincent van Gogh".to_string(),
        },
    );
    set.on_this_day = Some(OnThisDaySet {
        date: day,
        events: vec![item("otd1")],
        distractors: Vec::new(),
    });

    let images = root.join("images");
    fs::create_dir_all(&images).unwrap();
    for reference in set.asset_refs() {
        fs::write(root.join(reference), FAKE_PNG).unwrap();
    }

    PublicationWriter::new(output).publish(&set).unwrap();
    set
}

#[test]
fn test_rotation_postconditions() {
    let dir = TempDir::new().unwrap();
    let output = output(&dir);
    let root = dir.path();
    publish_day_one(root, &output);

    let outcome = ArchiveRotation::new(&output)
        .rotate(date(2026, 2, 14))
        .unwrap();

    assert_eq!(
        outcome,
        RotationOutcome::Rotated {
            date: date(2026, 2, 13),
            archived: 5,
            missing: 0,
            snapshot_written: true,
        }
    );

    for name in ["de1", "de2", "hi1", "otd1", "collage_world_vangogh"] {
        let archived = root.join(format!("images/2026-02-13/{name}.png"));
        assert_eq!(fs::read(&archived).unwrap(), FAKE_PNG, "{name} archived");
        assert!(
            !root.join(format!("images/{name}.png")).exists(),
            "{name} removed from flat directory"
        );
    }

    let snapshot = read_json(&root.join("quiz-data-2026-02-13.json"));
    assert_eq!(snapshot["date"], "2026-02-13");
    assert_eq!(
        snapshot["categories"]["history"][0]["image"],
        "images/2026-02-13/hi1.png"
    );
    assert_eq!(
        snapshot["collages"]["world"]["vangogh"]["image"],
        "images/2026-02-13/collage_world_vangogh.png"
    );
    assert_eq!(snapshot["distractors"]["history"][0]["year"], 1066);

    let index = ArchiveIndex::load(&root.join("archive-index.json")).unwrap();
    assert_eq!(index.dates(), &[date(2026, 2, 13)]);
}

#[test]
fn test_rotation_same_day_is_noop() {
    let dir = TempDir::new().unwrap();
    let output = output(&dir);
    publish_day_one(dir.path(), &output);

    let outcome = ArchiveRotation::new(&output)
        .rotate(date(2026, 2, 13))
        .unwrap();

    assert_eq!(outcome, RotationOutcome::Current);
    assert!(dir.path().join("images/de1.png").exists());
    assert!(!dir.path().join("archive-index.json").exists());
}

#[test]
fn test_repeated_rotation_is_stable() {
    let dir = TempDir::new().unwrap();
    let output = output(&dir);
    let root = dir.path();
    publish_day_one(root, &output);
    let rotation = ArchiveRotation::new(&output);

    rotation.rotate(date(2026, 2, 14)).unwrap();
    let snapshot_before = fs::read(root.join("quiz-data-2026-02-13.json")).unwrap();

    // quiz-data.json still carries the old date until today's run publishes
    let again = rotation.rotate(date(2026, 2, 14)).unwrap();
    assert_eq!(
        again,
        RotationOutcome::AlreadyArchived {
            date: date(2026, 2, 13)
        }
    );

    assert_eq!(
        fs::read(root.join("quiz-data-2026-02-13.json")).unwrap(),
        snapshot_before
    );
    assert_eq!(
        fs::read_to_string(root.join("archive-index.json")).unwrap(),
        r#"["2026-02-13"]"#
    );
}

#[test]
fn test_resume_keeps_assets_rendered_today() {
    let dir = TempDir::new().unwrap();
    let output = output(&dir);
    let root = dir.path();
    publish_day_one(root, &output);
    let rotation = ArchiveRotation::new(&output);

    rotation.rotate(date(2026, 2, 14)).unwrap();
    // today's run rendered one asset, then died before publishing
    fs::write(root.join("images/de1.png"), b"DAY-TWO-DE1").unwrap();

    rotation.rotate(date(2026, 2, 14)).unwrap();

    assert_eq!(
        fs::read(root.join("images/2026-02-13/de1.png")).unwrap(),
        FAKE_PNG
    );
    assert_eq!(fs::read(root.join("images/de1.png")).unwrap(), b"DAY-TWO-DE1");
}

#[test]
fn test_interrupted_rotation_completes_without_overwriting() {
    let dir = TempDir::new().unwrap();
    let output = output(&dir);
    let root = dir.path();
    publish_day_one(root, &output);

    // a previous rotation copied two assets and stopped; de2 was since replaced
    let archive_dir = root.join("images/2026-02-13");
    fs::create_dir_all(&archive_dir).unwrap();
    fs::write(archive_dir.join("de1.png"), FAKE_PNG).unwrap();
    fs::write(archive_dir.join("de2.png"), FAKE_PNG).unwrap();
    fs::write(root.join("images/de2.png"), b"DAY-TWO-DE2").unwrap();

    let outcome = ArchiveRotation::new(&output)
        .rotate(date(2026, 2, 14))
        .unwrap();

    assert_eq!(
        outcome,
        RotationOutcome::Rotated {
            date: date(2026, 2, 13),
            archived: 5,
            missing: 0,
            snapshot_written: true,
        }
    );
    assert!(!root.join("images/de1.png").exists());
    assert_eq!(fs::read(root.join("images/de2.png")).unwrap(), b"DAY-TWO-DE2");
    assert_eq!(fs::read(archive_dir.join("de2.png")).unwrap(), FAKE_PNG);

    let snapshot = read_json(&root.join("quiz-data-2026-02-13.json"));
    assert_eq!(
        snapshot["categories"]["germany"][1]["image"],
        "images/2026-02-13/de2.png"
    );
}

#[test]
fn test_existing_snapshot_never_overwritten() {
    let dir = TempDir::new().unwrap();
    let output = output(&dir);
    let root = dir.path();
    publish_day_one(root, &output);
    fs::write(root.join("quiz-data-2026-02-13.json"), "{\"sentinel\":true}").unwrap();

    let outcome = ArchiveRotation::new(&output)
        .rotate(date(2026, 2, 14))
        .unwrap();

    assert!(matches!(
        outcome,
        RotationOutcome::Rotated {
            snapshot_written: false,
            ..
        }
    ));
    assert_eq!(
        fs::read_to_string(root.join("quiz-data-2026-02-13.json")).unwrap(),
        "{\"sentinel\":true}"
    );
}

#[test]
fn test_index_prepends_most_recent_first() {
    let dir = TempDir::new().unwrap();
    let output = output(&dir);
    let root = dir.path();
    fs::write(
        root.join("archive-index.json"),
        r#"["2026-02-12","2026-02-11"]"#,
    )
    .unwrap();
    publish_day_one(root, &output);

    ArchiveRotation::new(&output)
        .rotate(date(2026, 2, 14))
        .unwrap();

    assert_eq!(
        fs::read_to_string(root.join("archive-index.json")).unwrap(),
        r#"["2026-02-13","2026-02-12","2026-02-11"]"#
    );
}

#[test]
fn test_missing_asset_is_counted_and_left_alone() {
    let dir = TempDir::new().unwrap();
    let output = output(&dir);
    let root = dir.path();
    publish_day_one(root, &output);
    fs::remove_file(root.join("images/de2.png")).unwrap();

    let outcome = ArchiveRotation::new(&output)
        .rotate(date(2026, 2, 14))
        .unwrap();

    assert_eq!(
        outcome,
        RotationOutcome::Rotated {
            date: date(2026, 2, 13),
            archived: 4,
            missing: 1,
            snapshot_written: true,
        }
    );

    let snapshot = read_json(&root.join("quiz-data-2026-02-13.json"));
    assert_eq!(snapshot["categories"]["germany"][1]["image"], "images/de2.png");
}

#[test]
fn test_corrupt_published_document_is_an_error() {
    let dir = TempDir::new().unwrap();
    let output = output(&dir);
    fs::write(dir.path().join("quiz-data.json"), "{ not json").unwrap();

    assert!(ArchiveRotation::new(&output)
        .rotate(date(2026, 2, 14))
        .is_err());
}
