//! Prompt and headline construction for generated artwork

use super::{ArtStyle, HistoricalEvent};
use crate::utils::{first_sentence, normalize_whitespace, truncate_text};

const DETAIL_SUFFIX: &str = "highly detailed, award-winning composition";

/// Append an art style to a base prompt
pub fn styled(base: &str, style: &ArtStyle) -> String {
    format!("{base}, {}, {DETAIL_SUFFIX}", style.suffix)
}

/// Prompt for a history pool event rendered in a style
pub fn history_prompt(event: &HistoricalEvent, style: &ArtStyle) -> String {
    styled(&event.prompt_base, style)
}

/// Base prompt for a feed event, built from its first sentence
pub fn on_this_day_base(text: &str, year: i32) -> String {
    let scene = normalize_whitespace(first_sentence(text));
    format!(
        "Historical scene from the year {year}: {scene}, dramatic historical painting, \
         photorealistic editorial illustration, {DETAIL_SUFFIX}, cinematic lighting"
    )
}

/// Full prompt for a feed event rendered in a style
pub fn on_this_day_prompt(text: &str, year: i32, style: &ArtStyle) -> String {
    styled(&on_this_day_base(text, year), style)
}

/// Quiz headline for a feed event: first sentence, length-capped
pub fn on_this_day_headline(text: &str, max_chars: usize) -> String {
    truncate_text(&normalize_whitespace(first_sentence(text)), max_chars)
}
