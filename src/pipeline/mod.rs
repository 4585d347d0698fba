//! Daily content orchestration
//!
//! One run builds the quiz for one calendar date:
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌──────────┐
//! │ rotate   │──▶│ curated  │──▶│ history  │──▶│ on this  │──▶│ collages │──▶│ publish  │
//! │ archive  │   │ news     │   │ pool     │   │ day feed │   │          │   │          │
//! └──────────┘   └──────────┘   └──────────┘   └──────────┘   └──────────┘   └──────────┘
//!  non-fatal      per-asset      per-asset      FetchError     per-asset      fatal
//!                 failures       failures       drops the      failures
//!                 omitted        omitted        section        omitted
//! ```
//!
//! Steps run sequentially. Every asset goes through the [`AssetCache`], so a
//! second run on the same day renders nothing and publishes the same bytes.
//!
//! # Example
//!
//! ```no_run
//! use chrono::Local;
//! use newsquiz::catalog::Catalog;
//! use newsquiz::config::Config;
//! use newsquiz::pipeline::Pipeline;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let catalog = Catalog::from_file(&config.content.catalog_path)?;
//! let pipeline = Pipeline::from_config(config, catalog)?;
//!
//! let report = pipeline.run(Local::now().date_naive()).await?;
//! println!("rendered {}, skipped {}, failed {}", report.rendered, report.skipped, report.failed);
//! # Ok(())
//! # }
//! ```

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::catalog::{prompt, ArtStyle, Catalog, HistoricalEvent};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::feed::{EventFeed, WikimediaFeed};
use crate::models::{
    CategoryKey, CollageAsset, DatedContentSet, DistractorItem, FeaturedItem, OnThisDaySet,
};
use crate::render::{BackendChain, RenderBackends};
use crate::selection::{EventSelector, SeedState};
use crate::storage::{
    ArchiveRotation, AssetCache, AssetStatus, PublicationWriter, RotationOutcome,
};
use crate::utils::error::CacheError;

/// Source label for history pool items
pub const HISTORY_SOURCE: &str = "Historical Record";

/// Source label for "on this day" items
pub const ON_THIS_DAY_SOURCE: &str = "Wikipedia";

/// Outcome of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub date: NaiveDate,

    /// Rotation result; `None` if rotation failed
    pub rotation: Option<RotationOutcome>,

    /// Assets rendered by a backend in this run
    pub rendered: usize,

    /// Assets that already existed
    pub skipped: usize,

    /// Assets that could not be produced (omitted from the document)
    pub failed: usize,

    /// Whether the "on this day" section was published
    pub on_this_day: bool,

    /// Path of the published document
    pub published: PathBuf,
}

impl RunReport {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            rotation: None,
            rendered: 0,
            skipped: 0,
            failed: 0,
            on_this_day: false,
            published: PathBuf::new(),
        }
    }

    /// Total assets attempted
    pub fn total(&self) -> usize {
        self.rendered + self.skipped + self.failed
    }
}

/// History selection for a date, without rendering
#[derive(Debug, Clone)]
pub struct HistoryPreview {
    pub date: NaiveDate,
    pub seed: u64,
    pub featured: Vec<(HistoricalEvent, ArtStyle)>,
    pub distractors: Vec<HistoricalEvent>,
}

/// State owned by a single run
struct RunState {
    cache: AssetCache,
    seed: SeedState,
    report: RunReport,
}

/// The daily content orchestrator
pub struct Pipeline {
    config: Config,
    catalog: Catalog,
    backends: RenderBackends,
    feed: Option<Arc<dyn EventFeed>>,
    selector: EventSelector,
}

impl Pipeline {
    /// Build a pipeline with HTTP backends and the Wikimedia feed
    ///
    /// The feed is left out when `config.feed.enabled` is false.
    pub fn from_config(config: Config, catalog: Catalog) -> Result<Self> {
        let backends = RenderBackends::from_config(&config.render)
            .map_err(|e| Error::with_source("Failed to create render backends", e))?;

        let feed: Option<Arc<dyn EventFeed>> = if config.feed.enabled {
            let feed: Arc<dyn EventFeed> = Arc::new(
                WikimediaFeed::new(&config.feed)
                    .map_err(|e| Error::with_source("Failed to create feed client", e))?,
            );
            Some(feed)
        } else {
            None
        };

        Ok(PipelineBuilder::new(config, catalog, backends).feed(feed).build())
    }

    /// Configuration this pipeline was built with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build and publish the quiz for `date`
    ///
    /// # Errors
    ///
    /// Only a failure to write the published document is returned. Rotation,
    /// feed and per-asset failures are logged and reduce the content instead.
    pub async fn run(&self, date: NaiveDate) -> Result<RunReport> {
        tracing::info!(date = %date, "Starting quiz generation");

        let mut state = RunState {
            cache: AssetCache::new(&self.config.output),
            seed: SeedState::for_date(date),
            report: RunReport::new(date),
        };

        state.report.rotation = self.rotate(date);

        let mut set = DatedContentSet::new(date);
        self.build_curated(&mut state, &mut set).await;
        self.build_history(&mut state, &mut set).await;
        self.build_on_this_day(&mut state, &mut set).await;
        self.build_collages(&mut state, &mut set).await;

        state.report.on_this_day = set.on_this_day.is_some();
        state.report.published = PublicationWriter::new(&self.config.output).publish(&set)?;

        tracing::info!(
            date = %date,
            rendered = state.report.rendered,
            skipped = state.report.skipped,
            failed = state.report.failed,
            on_this_day = state.report.on_this_day,
            "Quiz generation finished"
        );

        Ok(state.report)
    }

    /// Rotate the previous day's set; failures are logged, never returned
    pub fn rotate(&self, date: NaiveDate) -> Option<RotationOutcome> {
        match ArchiveRotation::new(&self.config.output).rotate(date) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::warn!(error = %e, "Archive rotation failed, continuing");
                None
            }
        }
    }

    /// The history selection and styles a run on `date` would use
    pub fn preview(&self, date: NaiveDate) -> HistoryPreview {
        let mut seed = SeedState::for_date(date);
        let (featured, distractors) = self.select_history(&mut seed);

        HistoryPreview {
            date,
            seed: seed.seed(),
            featured,
            distractors,
        }
    }

    /// History sample followed by one style draw per featured event
    fn select_history(
        &self,
        seed: &mut SeedState,
    ) -> (Vec<(HistoricalEvent, ArtStyle)>, Vec<HistoricalEvent>) {
        let selection = self.selector.select_static(
            self.catalog.history(),
            self.config.selection.history_featured,
            self.config.selection.history_distractors,
            seed,
        );

        let featured = selection
            .featured
            .into_iter()
            .filter_map(|event| {
                seed.choice(self.catalog.styles())
                    .map(|style| (event, style.clone()))
            })
            .collect();

        (featured, selection.distractors)
    }

    async fn build_curated(&self, state: &mut RunState, set: &mut DatedContentSet) {
        for category in CategoryKey::curated() {
            let mut items = Vec::new();

            for news in self.catalog.news(category) {
                tracing::debug!(category = %category, asset = %news.id, "Curated item");
                let Some(image) = produce(state, &self.backends.news, &news.id, &news.prompt).await
                else {
                    continue;
                };

                items.push(FeaturedItem {
                    id: news.id.clone(),
                    headline: news.headline.clone(),
                    year: None,
                    source: news.source.clone(),
                    style: None,
                    image,
                });
            }

            set.categories.insert(category, items);
        }
    }

    async fn build_history(&self, state: &mut RunState, set: &mut DatedContentSet) {
        let (featured, distractors) = self.select_history(&mut state.seed);
        let mut items = Vec::with_capacity(featured.len());

        for (i, (event, style)) in featured.iter().enumerate() {
            let id = format!("hi{}", i + 1);
            tracing::debug!(
                category = "history",
                asset = %id,
                year = event.year,
                style = %style.name,
                "History item"
            );

            let full_prompt = prompt::history_prompt(event, style);
            let Some(image) = produce(state, &self.backends.art, &id, &full_prompt).await else {
                continue;
            };

            items.push(FeaturedItem {
                id,
                headline: event.headline.clone(),
                year: Some(event.year),
                source: HISTORY_SOURCE.to_string(),
                style: Some(style.name.clone()),
                image,
            });
        }

        let decoys = distractors
            .iter()
            .enumerate()
            .map(|(i, event)| DistractorItem {
                id: format!("hd{}", i + 1),
                headline: event.headline.clone(),
                year: Some(event.year),
                source: HISTORY_SOURCE.to_string(),
            })
            .collect();

        set.categories.insert(CategoryKey::History, items);
        set.distractors.insert(CategoryKey::History, decoys);
    }

    async fn build_on_this_day(&self, state: &mut RunState, set: &mut DatedContentSet) {
        let Some(feed) = &self.feed else {
            tracing::info!("On-this-day feed disabled");
            return;
        };

        let date = state.report.date;
        let events = match feed.fetch_events(date.month(), date.day()).await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(
                    feed = feed.name(),
                    error = %e,
                    "Failed to fetch on-this-day events, skipping section"
                );
                return;
            }
        };

        let sizes = &self.config.selection;
        let selection = self.selector.select_feed(
            &events,
            sizes.on_this_day_featured,
            sizes.on_this_day_distractors,
        );
        tracing::info!(
            available = events.len(),
            featured = selection.featured.len(),
            distractors = selection.distractors.len(),
            "Selected on-this-day events"
        );

        let mut items = Vec::with_capacity(selection.featured.len());
        for (i, ranked) in selection.featured.iter().enumerate() {
            let Some(style) = state.seed.choice(self.catalog.styles()) else {
                tracing::warn!("No art styles in catalog, skipping on-this-day images");
                break;
            };

            let id = format!("otd{}", i + 1);
            let event = &ranked.event;
            let headline =
                prompt::on_this_day_headline(&event.text, sizes.headline_max_chars);
            let full_prompt = prompt::on_this_day_prompt(&event.text, event.year, style);

            tracing::debug!(
                category = "onthisday",
                asset = %id,
                year = event.year,
                score = ranked.score,
                style = %style.name,
                "On-this-day item"
            );

            let Some(image) = produce(state, &self.backends.art, &id, &full_prompt).await else {
                continue;
            };

            items.push(FeaturedItem {
                id,
                headline,
                year: Some(event.year),
                source: ON_THIS_DAY_SOURCE.to_string(),
                style: Some(style.name.clone()),
                image,
            });
        }

        if items.is_empty() {
            tracing::warn!("No on-this-day images produced, omitting section");
            return;
        }

        let decoys = selection
            .distractors
            .iter()
            .enumerate()
            .map(|(i, ranked)| DistractorItem {
                id: format!("otdd{}", i + 1),
                headline: prompt::on_this_day_headline(&ranked.event.text, sizes.headline_max_chars),
                year: Some(ranked.event.year),
                source: ON_THIS_DAY_SOURCE.to_string(),
            })
            .collect();

        set.on_this_day = Some(OnThisDaySet {
            date,
            events: items,
            distractors: decoys,
        });
    }

    async fn build_collages(&self, state: &mut RunState, set: &mut DatedContentSet) {
        for category in self.catalog.collage_categories() {
            let mut collages = BTreeMap::new();

            for collage in self.catalog.collages(category) {
                let key = format!("collage_{category}_{}", collage.key);
                tracing::debug!(category = %category, asset = %key, style = %collage.style, "Collage");

                let Some(image) = produce(state, &self.backends.news, &key, &collage.prompt).await
                else {
                    continue;
                };

                collages.insert(
                    collage.key.clone(),
                    CollageAsset {
                        image,
                        style: collage.style.clone(),
                    },
                );
            }

            set.collages.insert(category, collages);
        }
    }
}

/// Ensure one asset and record the outcome; `None` if it must be omitted
async fn produce(
    state: &mut RunState,
    chain: &BackendChain,
    key: &str,
    prompt: &str,
) -> Option<String> {
    match state.cache.ensure(key, || chain.render(prompt)).await {
        Ok(asset) => {
            match asset.status {
                AssetStatus::Cached => state.report.skipped += 1,
                AssetStatus::Rendered => state.report.rendered += 1,
            }
            Some(asset.reference)
        }
        Err(CacheError::Render(e)) if e.is_unconfigured() => {
            tracing::warn!(asset = key, error = %e, "No configured backend, omitting item");
            state.report.failed += 1;
            None
        }
        Err(e) => {
            tracing::error!(asset = key, error = %e, "Asset generation failed, omitting item");
            state.report.failed += 1;
            None
        }
    }
}

/// Assembles a [`Pipeline`] from explicit parts
pub struct PipelineBuilder {
    config: Config,
    catalog: Catalog,
    backends: RenderBackends,
    feed: Option<Arc<dyn EventFeed>>,
}

impl PipelineBuilder {
    /// Start from configuration, catalog and render chains; no feed
    pub fn new(config: Config, catalog: Catalog, backends: RenderBackends) -> Self {
        Self {
            config,
            catalog,
            backends,
            feed: None,
        }
    }

    /// Set (or clear) the "on this day" feed
    pub fn feed(mut self, feed: Option<Arc<dyn EventFeed>>) -> Self {
        self.feed = feed;
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Pipeline {
        let selector = EventSelector::from_config(&self.config.selection);
        Pipeline {
            config: self.config,
            catalog: self.catalog,
            backends: self.backends,
            feed: self.feed,
            selector,
        }
    }
}
