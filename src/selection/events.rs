//! Featured/distractor event selection
//!
//! Two kinds of candidate pools feed the quiz:
//!
//! - **Static pools** (the compiled history table): drawn uniformly with the
//!   run's seeded stream.
//! - **Fetched pools** (the "on this day" feed): filtered, scored for visual
//!   drama, ranked, and picked greedily for century diversity.
//!
//! Both degrade gracefully: a pool smaller than the requested counts yields
//! everything it has, featured first.

use std::collections::HashSet;

use super::SeedState;
use crate::config::SelectionConfig;
use crate::feed::FeedEvent;

/// Keywords that suggest an event makes a striking image
pub const DRAMATIC_KEYWORDS: &[&str] = &[
    "emperor",
    "king",
    "queen",
    "war",
    "battle",
    "discovered",
    "founded",
    "independence",
    "revolution",
    "treaty",
    "expedition",
    "crowned",
    "built",
    "conquest",
    "marines",
    "landing",
    "attack",
    "invasion",
    "signed",
    "declared",
    "assassinated",
    "born",
    "died",
];

/// Featured (rendered) and distractor (text-only) picks
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<T> {
    pub featured: Vec<T>,
    pub distractors: Vec<T>,
}

impl<T> Selection<T> {
    /// Total number of picked items
    pub fn len(&self) -> usize {
        self.featured.len() + self.distractors.len()
    }

    /// Whether nothing was picked
    pub fn is_empty(&self) -> bool {
        self.featured.is_empty() && self.distractors.is_empty()
    }
}

/// A feed event with its drama score
#[derive(Debug, Clone, PartialEq)]
pub struct RankedEvent {
    pub event: FeedEvent,
    pub score: usize,
}

impl RankedEvent {
    /// Century bucket used for diversity
    pub fn century(&self) -> i32 {
        self.event.year.div_euclid(100)
    }
}

/// Count keyword hits in an event text (case-insensitive substring match)
pub fn keyword_score(text: &str) -> usize {
    let lower = text.to_lowercase();
    DRAMATIC_KEYWORDS
        .iter()
        .filter(|kw| lower.contains(*kw))
        .count()
}

/// Splits candidate pools into featured and distractor subsets
#[derive(Debug, Clone)]
pub struct EventSelector {
    min_year: i32,
    max_year: i32,
}

impl Default for EventSelector {
    fn default() -> Self {
        Self::from_config(&SelectionConfig::default())
    }
}

impl EventSelector {
    /// Selector with an explicit feed year window (inclusive)
    pub fn new(min_year: i32, max_year: i32) -> Self {
        Self { min_year, max_year }
    }

    /// Selector using the configured year window
    pub fn from_config(config: &SelectionConfig) -> Self {
        Self::new(config.min_year, config.max_year)
    }

    /// Select from a static pool using the run's seeded stream
    ///
    /// Draws `featured_count + distractor_count` distinct items; the first
    /// `featured_count` are featured.
    pub fn select_static<T: Clone>(
        &self,
        pool: &[T],
        featured_count: usize,
        distractor_count: usize,
        seed: &mut SeedState,
    ) -> Selection<T> {
        let mut drawn = seed.sample_without_replacement(pool, featured_count + distractor_count);
        let distractors = drawn.split_off(featured_count.min(drawn.len()));

        Selection {
            featured: drawn,
            distractors,
        }
    }

    /// Filter and rank fetched events
    ///
    /// Keeps events inside the year window that have at least one reference
    /// page, then sorts by score (descending) and year (descending). The sort
    /// is stable, so ties keep feed order.
    pub fn rank(&self, events: &[FeedEvent]) -> Vec<RankedEvent> {
        let mut ranked: Vec<RankedEvent> = events
            .iter()
            .filter(|e| (self.min_year..=self.max_year).contains(&e.year) && !e.pages.is_empty())
            .map(|e| RankedEvent {
                score: keyword_score(&e.text),
                event: e.clone(),
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| b.event.year.cmp(&a.event.year))
        });

        ranked
    }

    /// Select from a fetched pool
    ///
    /// Featured items are picked greedily in rank order, taking only events
    /// from centuries not yet represented. If that leaves the quota unfilled,
    /// the highest-ranked remaining events fill it. Distractors are the next
    /// highest-ranked events not featured.
    pub fn select_feed(
        &self,
        events: &[FeedEvent],
        featured_count: usize,
        distractor_count: usize,
    ) -> Selection<RankedEvent> {
        let ranked = self.rank(events);
        let mut taken = vec![false; ranked.len()];
        let mut featured_idx = Vec::with_capacity(featured_count);
        let mut centuries = HashSet::new();

        for (i, candidate) in ranked.iter().enumerate() {
            if featured_idx.len() == featured_count {
                break;
            }
            if centuries.insert(candidate.century()) {
                taken[i] = true;
                featured_idx.push(i);
            }
        }

        for i in 0..ranked.len() {
            if featured_idx.len() == featured_count {
                break;
            }
            if !taken[i] {
                taken[i] = true;
                featured_idx.push(i);
            }
        }

        let distractor_idx: Vec<usize> = (0..ranked.len())
            .filter(|i| !taken[*i])
            .take(distractor_count)
            .collect();

        Selection {
            featured: featured_idx.iter().map(|&i| ranked[i].clone()).collect(),
            distractors: distractor_idx.iter().map(|&i| ranked[i].clone()).collect(),
        }
    }
}
