//! Static content catalog
//!
//! The curated news items, collage prompts, historical event pool and art
//! style list are data, not code. They are maintained in a TOML file and
//! loaded once per run.
//!
//! # Format
//!
//! ```toml
//! [[news.germany]]
//! id = "de1"
//! headline = "..."
//! source = "Tagesschau"
//! prompt = "..."
//!
//! [[collages.germany]]
//! key = "bosch"
//! style = "Hieronymus Bosch"
//! prompt = "..."
//!
//! [[history]]
//! id = "h_001"
//! year = 285
//! headline = "Diocletian Splits the Roman Empire (285 AD)"
//! prompt_base = "..."
//!
//! [[styles]]
//! id = "bosch"
//! name = "Hieronymus Bosch"
//! suffix = "in the surreal fantastical style of Hieronymus Bosch"
//! ```

pub mod prompt;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::models::CategoryKey;
use crate::utils::error::CatalogError;
use crate::utils::is_valid_key;

/// A curated news headline with its image prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: String,
    pub headline: String,
    pub source: String,
    pub prompt: String,
}

/// A collage prompt for one category in one style
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollagePrompt {
    /// Style key used in asset names and the JSON (`bosch`, `vangogh`)
    pub key: String,
    /// Display name of the style
    pub style: String,
    pub prompt: String,
}

/// An entry of the historical event pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalEvent {
    pub id: String,
    pub year: i32,
    pub headline: String,
    pub prompt_base: String,
}

/// An art style applied to history and "on this day" prompts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtStyle {
    pub id: String,
    pub name: String,
    pub suffix: String,
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    news: BTreeMap<String, Vec<NewsItem>>,
    #[serde(default)]
    collages: BTreeMap<String, Vec<CollagePrompt>>,
    #[serde(default)]
    history: Vec<HistoricalEvent>,
    #[serde(default)]
    styles: Vec<ArtStyle>,
}

/// Validated static content
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    news: BTreeMap<CategoryKey, Vec<NewsItem>>,
    collages: BTreeMap<CategoryKey, Vec<CollagePrompt>>,
    history: Vec<HistoricalEvent>,
    styles: Vec<ArtStyle>,
}

impl Catalog {
    /// Load and validate a catalog file
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let catalog = Self::parse(&content)?;
        tracing::debug!(
            path = %path.display(),
            history = catalog.history.len(),
            styles = catalog.styles.len(),
            "Catalog loaded"
        );
        Ok(catalog)
    }

    /// Parse and validate catalog TOML
    pub fn parse(content: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog = toml::from_str(content)?;

        let news = raw
            .news
            .into_iter()
            .map(|(key, items)| -> Result<_, CatalogError> { Ok((curated_key(&key)?, items)) })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        let collages = raw
            .collages
            .into_iter()
            .map(|(key, prompts)| -> Result<_, CatalogError> {
                Ok((curated_key(&key)?, prompts))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        let catalog = Self {
            news,
            collages,
            history: raw.history,
            styles: raw.styles,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Build a catalog directly (used by tests and embedding callers)
    pub fn new(
        news: BTreeMap<CategoryKey, Vec<NewsItem>>,
        collages: BTreeMap<CategoryKey, Vec<CollagePrompt>>,
        history: Vec<HistoricalEvent>,
        styles: Vec<ArtStyle>,
    ) -> Result<Self, CatalogError> {
        let catalog = Self {
            news,
            collages,
            history,
            styles,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        // Asset keys are derived from news ids and collage keys, so they
        // share one namespace across categories.
        let mut asset_ids = HashSet::new();
        for (category, items) in &self.news {
            for item in items {
                check_key("news", &item.id)?;
                if !asset_ids.insert(item.id.clone()) {
                    return Err(duplicate(format!("news.{category}"), &item.id));
                }
            }
        }

        for (category, prompts) in &self.collages {
            let mut keys = HashSet::new();
            for prompt in prompts {
                check_key("collages", &prompt.key)?;
                if !keys.insert(prompt.key.as_str()) {
                    return Err(duplicate(format!("collages.{category}"), &prompt.key));
                }
            }
        }

        let mut ids = HashSet::new();
        for event in &self.history {
            if !ids.insert(event.id.as_str()) {
                return Err(duplicate("history".to_string(), &event.id));
            }
        }

        let mut ids = HashSet::new();
        for style in &self.styles {
            if !ids.insert(style.id.as_str()) {
                return Err(duplicate("styles".to_string(), &style.id));
            }
        }

        if !self.history.is_empty() && self.styles.is_empty() {
            return Err(CatalogError::MissingStyles);
        }

        Ok(())
    }

    /// Curated items for a category (empty for history)
    pub fn news(&self, category: CategoryKey) -> &[NewsItem] {
        self.news.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Collage prompts for a category
    pub fn collages(&self, category: CategoryKey) -> &[CollagePrompt] {
        self.collages
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Categories that have at least one collage prompt
    pub fn collage_categories(&self) -> Vec<CategoryKey> {
        self.collages.keys().copied().collect()
    }

    /// The historical event pool, in file order
    pub fn history(&self) -> &[HistoricalEvent] {
        &self.history
    }

    /// The art style list, in file order
    pub fn styles(&self) -> &[ArtStyle] {
        &self.styles
    }
}

fn curated_key(key: &str) -> Result<CategoryKey, CatalogError> {
    match CategoryKey::from_id(key) {
        Some(category) if category != CategoryKey::History => Ok(category),
        _ => Err(CatalogError::UnknownCategory(key.to_string())),
    }
}

fn check_key(table: &str, key: &str) -> Result<(), CatalogError> {
    if is_valid_key(key) {
        Ok(())
    } else {
        Err(CatalogError::InvalidId {
            table: table.to_string(),
            id: key.to_string(),
        })
    }
}

fn duplicate(table: String, id: &str) -> CatalogError {
    CatalogError::DuplicateId {
        table,
        id: id.to_string(),
    }
}
