// Core data structures for the published quiz document

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Quiz category with a rendered item list
///
/// Declaration order is the order categories appear in the published JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKey {
    /// Curated German news
    Germany,
    /// Curated world news
    World,
    /// Events drawn from the historical pool
    History,
}

impl CategoryKey {
    /// Get all categories
    pub fn all() -> Vec<Self> {
        vec![Self::Germany, Self::World, Self::History]
    }

    /// Categories whose items come from the curated news catalog
    pub fn curated() -> Vec<Self> {
        vec![Self::Germany, Self::World]
    }

    /// Get category ID
    pub fn id(&self) -> &'static str {
        match self {
            Self::Germany => "germany",
            Self::World => "world",
            Self::History => "history",
        }
    }

    /// Parse from string
    pub fn from_id(id: &str) -> Option<Self> {
        match id.to_lowercase().as_str() {
            "germany" => Some(Self::Germany),
            "world" => Some(Self::World),
            "history" => Some(Self::History),
            _ => None,
        }
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// A quiz entry with a rendered image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturedItem {
    pub id: String,
    pub headline: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Asset reference relative to the web root (e.g. `images/hi1.png`)
    pub image: String,
}

/// A text-only decoy entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistractorItem {
    pub id: String,
    pub headline: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub source: String,
}

/// One rendered collage for a category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollageAsset {
    pub image: String,
    /// Display name of the art style
    pub style: String,
}

/// The optional "on this day" section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnThisDaySet {
    pub date: NaiveDate,
    pub events: Vec<FeaturedItem>,
    #[serde(default)]
    pub distractors: Vec<DistractorItem>,
}

/// Everything published for one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatedContentSet {
    pub date: NaiveDate,

    #[serde(default)]
    pub categories: BTreeMap<CategoryKey, Vec<FeaturedItem>>,

    #[serde(default)]
    pub distractors: BTreeMap<CategoryKey, Vec<DistractorItem>>,

    #[serde(default)]
    pub collages: BTreeMap<CategoryKey, BTreeMap<String, CollageAsset>>,

    #[serde(
        rename = "onthisday",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub on_this_day: Option<OnThisDaySet>,
}

impl DatedContentSet {
    /// Create an empty set for a date
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            categories: BTreeMap::new(),
            distractors: BTreeMap::new(),
            collages: BTreeMap::new(),
            on_this_day: None,
        }
    }

    /// Mutable access to every asset reference in the set
    pub fn asset_refs_mut(&mut self) -> Vec<&mut String> {
        let mut refs: Vec<&mut String> = self
            .categories
            .values_mut()
            .flatten()
            .map(|item| &mut item.image)
            .collect();

        refs.extend(
            self.collages
                .values_mut()
                .flat_map(|styles| styles.values_mut())
                .map(|collage| &mut collage.image),
        );

        if let Some(otd) = self.on_this_day.as_mut() {
            refs.extend(otd.events.iter_mut().map(|item| &mut item.image));
        }

        refs
    }

    /// Every asset reference in the set
    pub fn asset_refs(&self) -> Vec<&str> {
        let mut refs: Vec<&str> = self
            .categories
            .values()
            .flatten()
            .map(|item| item.image.as_str())
            .collect();

        refs.extend(
            self.collages
                .values()
                .flat_map(|styles| styles.values())
                .map(|collage| collage.image.as_str()),
        );

        if let Some(otd) = &self.on_this_day {
            refs.extend(otd.events.iter().map(|item| item.image.as_str()));
        }

        refs
    }

    /// Total number of rendered items (featured entries and collages)
    pub fn asset_count(&self) -> usize {
        self.asset_refs().len()
    }
}
