//! Common test utilities

use async_trait::async_trait;
use chrono::NaiveDate;
use newsquiz::catalog::{ArtStyle, Catalog, CollagePrompt, HistoricalEvent, NewsItem};
use newsquiz::config::{Config, OutputConfig};
use newsquiz::error::{BackendError, FetchError};
use newsquiz::feed::{EventFeed, FeedEvent};
use newsquiz::models::CategoryKey;
use newsquiz::render::{BackendChain, ImageBackend, RenderBackends};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Shorthand for a calendar date
pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Default configuration with the web root in `dir`
pub fn config_in(dir: &Path) -> Config {
    let mut config = Config::default();
    config.output = OutputConfig {
        web_root: dir.to_path_buf(),
        ..OutputConfig::default()
    };
    config
}

/// Small catalog: 3 curated items, 1 collage, 10 history events, 3 styles
pub fn test_catalog() -> Catalog {
    let news_item = |id: &str, headline: &str| NewsItem {
        id: id.to_string(),
        headline: headline.to_string(),
        source: "Tagesschau".to_string(),
        prompt: format!("Editorial illustration for {headline}"),
    };

    let mut news = BTreeMap::new();
    news.insert(
        CategoryKey::Germany,
        vec![
            news_item("de1", "Bundestag verabschiedet Haushalt"),
            news_item("de2", "Rodel-Gold in Cortina"),
        ],
    );
    news.insert(
        CategoryKey::World,
        vec![news_item("wo1", "Ceasefire talks resume")],
    );

    let mut collages = BTreeMap::new();
    collages.insert(
        CategoryKey::Germany,
        vec![CollagePrompt {
            key: "bosch".to_string(),
            style: "Hieronymus Bosch".to_string(),
            prompt: "A Bosch-style panorama of the day's German news".to_string(),
        }],
    );

    let history = (1..=10)
        .map(|i| HistoricalEvent {
            id: format!("h_{i:03}"),
            year: 300 + i * 150,
            headline: format!("Historic event number {i}"),
            prompt_base: format!("A grand scene of historic event {i}"),
        })
        .collect();

    let styles = vec![
        style("monet", "Claude Monet"),
        style("bosch", "Hieronymus Bosch"),
        style("hokusai", "Katsushika Hokusai"),
    ];

    Catalog::new(news, collages, history, styles).unwrap()
}

fn style(id: &str, name: &str) -> ArtStyle {
    ArtStyle {
        id: id.to_string(),
        name: name.to_string(),
        suffix: format!("in the style of {name}"),
    }
}

/// Feed events: six eligible, two outside the year window, one without pages
pub fn feed_events() -> Vec<FeedEvent> {
    vec![
        FeedEvent::new(1945, "The Yalta Conference ends with a signed treaty. Details follow.", 2),
        FeedEvent::new(1876, "A battle is fought near the river. Many fall.", 1),
        FeedEvent::new(1779, "Captain Cook is killed during an expedition to Hawaii.", 3),
        FeedEvent::new(1650, "A new cathedral is built in the city.", 1),
        FeedEvent::new(1542, "A queen is crowned in Scotland.", 1),
        FeedEvent::new(1990, "A famous prisoner is released.", 1),
        FeedEvent::new(2024, "A recent war headline.", 1),
        FeedEvent::new(480, "An ancient battle.", 1),
        FeedEvent::new(1900, "An invasion without references.", 0),
    ]
}

/// Backend returning deterministic bytes derived from the prompt
pub struct CountingBackend {
    name: &'static str,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl CountingBackend {
    pub fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageBackend for CountingBackend {
    fn name(&self) -> &str {
        self.name
    }

    async fn render(&self, prompt: &str) -> Result<Vec<u8>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(format!("PNG:{prompt}").into_bytes())
    }
}

/// Backend that always fails
pub struct BrokenBackend;

#[async_trait]
impl ImageBackend for BrokenBackend {
    fn name(&self) -> &str {
        "broken"
    }

    async fn render(&self, _prompt: &str) -> Result<Vec<u8>, BackendError> {
        Err(BackendError::Status {
            status: 503,
            body: "overloaded".to_string(),
        })
    }
}

/// Both chains backed by one backend
#[allow(dead_code)]
pub fn single_backend(backend: Arc<dyn ImageBackend>) -> RenderBackends {
    RenderBackends {
        news: BackendChain::new(vec![Arc::clone(&backend)]),
        art: BackendChain::new(vec![backend]),
    }
}

/// Feed returning a fixed event list
pub struct StaticFeed {
    events: Vec<FeedEvent>,
    requests: Mutex<Vec<(u32, u32)>>,
}

#[allow(dead_code)]
impl StaticFeed {
    pub fn new(events: Vec<FeedEvent>) -> Self {
        Self {
            events,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// (month, day) pairs requested so far
    pub fn requests(&self) -> Vec<(u32, u32)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventFeed for StaticFeed {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_events(&self, month: u32, day: u32) -> Result<Vec<FeedEvent>, FetchError> {
        self.requests.lock().unwrap().push((month, day));
        Ok(self.events.clone())
    }
}

/// Feed that is always unreachable
pub struct DownFeed;

#[async_trait]
impl EventFeed for DownFeed {
    fn name(&self) -> &str {
        "down"
    }

    async fn fetch_events(&self, _month: u32, _day: u32) -> Result<Vec<FeedEvent>, FetchError> {
        Err(FetchError::ServerError(503))
    }
}
