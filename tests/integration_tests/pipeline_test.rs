//! End-to-end pipeline tests
//!
//! Runs the full rotate → render → publish cycle against in-process backends
//! and feeds, with the web root in a temporary directory.

use newsquiz::feed::EventFeed;
use newsquiz::pipeline::{Pipeline, PipelineBuilder};
use newsquiz::storage::RotationOutcome;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

use super::fixtures::read_json;
use crate::common::{
    config_in, date, feed_events, single_backend, test_catalog, CountingBackend, StaticFeed,
};

/// Assets per run for the test catalog: 3 curated + 4 history + 4 on-this-day + 1 collage
const ASSETS_PER_RUN: usize = 12;

fn pipeline(
    dir: &TempDir,
    backend: &Arc<CountingBackend>,
    feed: Option<Arc<dyn EventFeed>>,
) -> Pipeline {
    PipelineBuilder::new(
        config_in(dir.path()),
        test_catalog(),
        single_backend(backend.clone()),
    )
    .feed(feed)
    .build()
}

fn static_feed() -> Option<Arc<dyn EventFeed>> {
    let feed: Arc<dyn EventFeed> = Arc::new(StaticFeed::new(feed_events()));
    Some(feed)
}

#[tokio::test]
async fn test_full_run_publishes_all_sections() {
    let dir = TempDir::new().unwrap();
    let backend = CountingBackend::new("mock");
    let pipeline = pipeline(&dir, &backend, static_feed());

    let report = pipeline.run(date(2026, 2, 14)).await.unwrap();

    assert_eq!(report.rendered, ASSETS_PER_RUN);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.failed, 0);
    assert!(report.on_this_day);
    assert_eq!(report.rotation, Some(RotationOutcome::NothingPublished));
    assert_eq!(backend.calls(), ASSETS_PER_RUN);

    let doc = read_json(&report.published);
    assert_eq!(doc["date"], "2026-02-14");
    assert_eq!(doc["categories"]["germany"].as_array().unwrap().len(), 2);
    assert_eq!(doc["categories"]["world"].as_array().unwrap().len(), 1);
    assert_eq!(doc["categories"]["history"].as_array().unwrap().len(), 4);
    assert_eq!(doc["distractors"]["history"].as_array().unwrap().len(), 4);
    assert_eq!(
        doc["collages"]["germany"]["bosch"]["image"],
        "images/collage_germany_bosch.png"
    );

    let otd = &doc["onthisday"];
    assert_eq!(otd["date"], "2026-02-14");
    assert_eq!(otd["events"].as_array().unwrap().len(), 4);
    assert_eq!(otd["distractors"].as_array().unwrap().len(), 2);
    assert_eq!(otd["events"][0]["id"], "otd1");
    assert_eq!(otd["events"][0]["year"], 1945);
    assert_eq!(
        otd["events"][0]["headline"],
        "The Yalta Conference ends with a signed treaty"
    );
    assert_eq!(otd["events"][0]["source"], "Wikipedia");
    assert_eq!(otd["distractors"][0]["id"], "otdd1");

    // every published reference exists under the web root
    for section in ["germany", "world", "history"] {
        for item in doc["categories"][section].as_array().unwrap() {
            let image = item["image"].as_str().unwrap();
            assert!(dir.path().join(image).is_file(), "missing {image}");
        }
    }
}

#[tokio::test]
async fn test_item_shapes() {
    let dir = TempDir::new().unwrap();
    let backend = CountingBackend::new("mock");
    let report = pipeline(&dir, &backend, None)
        .run(date(2026, 2, 14))
        .await
        .unwrap();

    let doc = read_json(&report.published);

    let news = &doc["categories"]["germany"][0];
    assert_eq!(news["id"], "de1");
    assert_eq!(news["source"], "Tagesschau");
    assert_eq!(news["image"], "images/de1.png");
    assert!(news.get("year").is_none());
    assert!(news.get("style").is_none());

    let history = &doc["categories"]["history"][0];
    assert_eq!(history["id"], "hi1");
    assert_eq!(history["source"], "Historical Record");
    assert_eq!(history["image"], "images/hi1.png");
    assert!(history["year"].is_i64());
    assert!(history["style"].is_string());

    let decoy = &doc["distractors"]["history"][0];
    assert_eq!(decoy["id"], "hd1");
    assert!(decoy.get("image").is_none());
}

#[tokio::test]
async fn test_second_run_same_day_renders_nothing() {
    let dir = TempDir::new().unwrap();
    let backend = CountingBackend::new("mock");
    let day = date(2026, 2, 14);

    let first = pipeline(&dir, &backend, static_feed()).run(day).await.unwrap();
    let first_bytes = fs::read(&first.published).unwrap();

    let second = pipeline(&dir, &backend, static_feed()).run(day).await.unwrap();
    let second_bytes = fs::read(&second.published).unwrap();

    assert_eq!(second.rendered, 0);
    assert_eq!(second.skipped, ASSETS_PER_RUN);
    assert_eq!(second.rotation, Some(RotationOutcome::Current));
    assert_eq!(backend.calls(), ASSETS_PER_RUN);
    assert_eq!(first_bytes, second_bytes);
}

#[tokio::test]
async fn test_same_date_same_document_in_fresh_roots() {
    let day = date(2025, 11, 9);

    let dir_a = TempDir::new().unwrap();
    let report_a = pipeline(&dir_a, &CountingBackend::new("a"), static_feed())
        .run(day)
        .await
        .unwrap();

    let dir_b = TempDir::new().unwrap();
    let report_b = pipeline(&dir_b, &CountingBackend::new("b"), static_feed())
        .run(day)
        .await
        .unwrap();

    assert_eq!(
        fs::read(&report_a.published).unwrap(),
        fs::read(&report_b.published).unwrap()
    );
}

#[tokio::test]
async fn test_preview_matches_run() {
    let dir = TempDir::new().unwrap();
    let backend = CountingBackend::new("mock");
    let day = date(2026, 3, 3);
    let pipeline = pipeline(&dir, &backend, static_feed());

    let preview = pipeline.preview(day);
    let report = pipeline.run(day).await.unwrap();
    let doc = read_json(&report.published);
    let history = doc["categories"]["history"].as_array().unwrap();

    assert_eq!(history.len(), preview.featured.len());
    for (item, (event, style)) in history.iter().zip(&preview.featured) {
        assert_eq!(item["headline"], event.headline.as_str());
        assert_eq!(item["year"], event.year);
        assert_eq!(item["style"], style.name.as_str());
    }

    let decoys = doc["distractors"]["history"].as_array().unwrap();
    for (item, event) in decoys.iter().zip(&preview.distractors) {
        assert_eq!(item["headline"], event.headline.as_str());
    }
}

#[tokio::test]
async fn test_prompts_carry_style_suffix() {
    let dir = TempDir::new().unwrap();
    let backend = CountingBackend::new("mock");
    let report = pipeline(&dir, &backend, static_feed())
        .run(date(2026, 2, 14))
        .await
        .unwrap();
    let doc = read_json(&report.published);
    let prompts = backend.prompts();

    for item in doc["onthisday"]["events"].as_array().unwrap() {
        let year = item["year"].as_i64().unwrap();
        let style = item["style"].as_str().unwrap();
        let prompt = prompts
            .iter()
            .find(|p| p.starts_with(&format!("Historical scene from the year {year}:")))
            .expect("on-this-day prompt rendered");
        assert!(prompt.contains(&format!("in the style of {style}")));
        assert!(prompt.ends_with("highly detailed, award-winning composition"));
    }
}

#[tokio::test]
async fn test_feed_is_asked_for_run_date() {
    let dir = TempDir::new().unwrap();
    let backend = CountingBackend::new("mock");
    let feed = Arc::new(StaticFeed::new(feed_events()));
    let shared: Arc<dyn EventFeed> = feed.clone();

    let pipeline = PipelineBuilder::new(
        config_in(dir.path()),
        test_catalog(),
        single_backend(backend.clone()),
    )
    .feed(Some(shared))
    .build();

    pipeline.run(date(2026, 7, 4)).await.unwrap();
    assert_eq!(feed.requests(), vec![(7, 4)]);
}

#[tokio::test]
async fn test_without_feed_section_is_omitted() {
    let dir = TempDir::new().unwrap();
    let backend = CountingBackend::new("mock");

    let report = pipeline(&dir, &backend, None)
        .run(date(2026, 2, 14))
        .await
        .unwrap();

    assert!(!report.on_this_day);
    assert_eq!(report.rendered, ASSETS_PER_RUN - 4);
    assert!(read_json(&report.published).get("onthisday").is_none());
}

#[tokio::test]
async fn test_next_day_rotates_then_regenerates() {
    let dir = TempDir::new().unwrap();
    let backend = CountingBackend::new("mock");
    let day_one = date(2026, 2, 13);
    let day_two = date(2026, 2, 14);

    pipeline(&dir, &backend, static_feed())
        .run(day_one)
        .await
        .unwrap();
    let report = pipeline(&dir, &backend, static_feed())
        .run(day_two)
        .await
        .unwrap();

    assert_eq!(
        report.rotation,
        Some(RotationOutcome::Rotated {
            date: day_one,
            archived: ASSETS_PER_RUN,
            missing: 0,
            snapshot_written: true,
        })
    );
    // yesterday's flat files were moved, so nothing is served from the cache
    assert_eq!(report.rendered, ASSETS_PER_RUN);
    assert_eq!(report.skipped, 0);

    let root = dir.path();
    assert!(root.join("images/2026-02-13/de1.png").is_file());
    assert!(root.join("images/2026-02-13/collage_germany_bosch.png").is_file());

    let snapshot = read_json(&root.join("quiz-data-2026-02-13.json"));
    assert_eq!(snapshot["date"], "2026-02-13");
    assert_eq!(
        snapshot["categories"]["germany"][0]["image"],
        "images/2026-02-13/de1.png"
    );
    assert_eq!(
        snapshot["onthisday"]["events"][0]["image"],
        "images/2026-02-13/otd1.png"
    );

    assert_eq!(
        fs::read_to_string(root.join("archive-index.json")).unwrap(),
        r#"["2026-02-13"]"#
    );

    let current = read_json(&report.published);
    assert_eq!(current["date"], "2026-02-14");
    assert_eq!(current["categories"]["germany"][0]["image"], "images/de1.png");
}

#[tokio::test]
async fn test_resume_after_interrupted_run_keeps_todays_assets() {
    let dir = TempDir::new().unwrap();
    let backend = CountingBackend::new("mock");
    let root = dir.path();
    let day_one = date(2026, 2, 13);
    let day_two = date(2026, 2, 14);

    pipeline(&dir, &backend, static_feed())
        .run(day_one)
        .await
        .unwrap();
    let day_one_de1 = fs::read(root.join("images/de1.png")).unwrap();

    // day two rotates, renders one asset and is killed before publishing
    let interrupted = pipeline(&dir, &backend, static_feed());
    assert!(matches!(
        interrupted.rotate(day_two),
        Some(RotationOutcome::Rotated { .. })
    ));
    fs::write(root.join("images/de1.png"), b"DAY-TWO-DE1").unwrap();

    let report = pipeline(&dir, &backend, static_feed())
        .run(day_two)
        .await
        .unwrap();

    assert_eq!(
        report.rotation,
        Some(RotationOutcome::AlreadyArchived { date: day_one })
    );
    assert_eq!(report.skipped, 1);
    assert_eq!(report.rendered, ASSETS_PER_RUN - 1);
    assert_eq!(
        fs::read(root.join("images/2026-02-13/de1.png")).unwrap(),
        day_one_de1
    );
    assert_eq!(fs::read(root.join("images/de1.png")).unwrap(), b"DAY-TWO-DE1");
    assert_eq!(read_json(&report.published)["date"], "2026-02-14");
}
