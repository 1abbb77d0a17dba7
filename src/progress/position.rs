use log::warn;

use crate::catalog::{ContentItem, ContentLayout, PositionInput};
use crate::error::{ReaderError, Result};
use crate::settings::PositionPolicy;

fn invalid(item: &ContentItem, position: PositionInput, reason: String) -> ReaderError {
    ReaderError::InvalidPosition {
        item_id: item.id.clone(),
        position,
        reason,
    }
}

/// Map navigation input to the flattened unit index of `item`.
///
/// Paged items take the page index as is. Chaptered items add the paragraph counts
/// of every earlier chapter to the paragraph index. Out-of-range indices and inputs
/// that do not match the item's layout are rejected.
pub fn compute_absolute_position(item: &ContentItem, input: PositionInput) -> Result<usize> {
    match (&item.layout, input) {
        (ContentLayout::Paged { page_count }, PositionInput::Page { index }) => {
            if index >= *page_count {
                return Err(invalid(
                    item,
                    input,
                    format!("page index out of range 0..{page_count}"),
                ));
            }
            Ok(index)
        }
        (ContentLayout::Chaptered { chapters }, PositionInput::Paragraph { chapter, paragraph }) => {
            let Some(target) = chapters.get(chapter) else {
                return Err(invalid(
                    item,
                    input,
                    format!("chapter index out of range 0..{}", chapters.len()),
                ));
            };
            if paragraph >= target.paragraph_count() {
                return Err(invalid(
                    item,
                    input,
                    format!(
                        "paragraph index out of range 0..{} for chapter {chapter}",
                        target.paragraph_count()
                    ),
                ));
            }
            let preceding: usize = chapters[..chapter]
                .iter()
                .map(|c| c.paragraph_count())
                .sum();
            Ok(preceding + paragraph)
        }
        (ContentLayout::Paged { .. }, PositionInput::Paragraph { .. }) => Err(invalid(
            item,
            input,
            "paged item expects a page index".into(),
        )),
        (ContentLayout::Chaptered { .. }, PositionInput::Page { .. }) => Err(invalid(
            item,
            input,
            "chaptered item expects a chapter and paragraph index".into(),
        )),
    }
}

/// Percentage of the item reached at `absolute_position`, in `0..=100`.
///
/// Single-unit items report 100 once visited; an item without units reports 0.
pub fn compute_progress_percentage(absolute_position: usize, total_units: usize) -> u8 {
    match total_units {
        0 => 0,
        1 => 100,
        _ => {
            let denominator = total_units.saturating_sub(1).max(1) as f64;
            let percentage = (absolute_position as f64 / denominator * 100.0).round();
            percentage.clamp(0.0, 100.0) as u8
        }
    }
}

/// Pull `input` into the item's valid range. Layout mismatches are left untouched.
pub fn clamp_position(item: &ContentItem, input: PositionInput) -> PositionInput {
    match (&item.layout, input) {
        (ContentLayout::Paged { page_count }, PositionInput::Page { index }) => {
            PositionInput::page(index.min(page_count.saturating_sub(1)))
        }
        (ContentLayout::Chaptered { chapters }, PositionInput::Paragraph { chapter, paragraph }) => {
            let chapter = chapter.min(chapters.len().saturating_sub(1));
            let last_paragraph = chapters
                .get(chapter)
                .map(|c| c.paragraph_count().saturating_sub(1))
                .unwrap_or(0);
            PositionInput::paragraph(chapter, paragraph.min(last_paragraph))
        }
        _ => input,
    }
}

/// Resolve navigation input under the configured policy.
///
/// `Strict` propagates the position error. `Clamp` pulls the input back into range
/// and logs the correction; a layout mismatch still fails because no clamp exists
/// for it.
pub fn resolve_position(
    item: &ContentItem,
    input: PositionInput,
    policy: PositionPolicy,
) -> Result<usize> {
    match compute_absolute_position(item, input) {
        Ok(position) => Ok(position),
        Err(err) if policy == PositionPolicy::Clamp => {
            let clamped = clamp_position(item, input);
            if clamped == input {
                return Err(err);
            }
            warn!("{err}; clamped to {clamped}");
            compute_absolute_position(item, clamped)
        }
        Err(err) => Err(err),
    }
}

/// Inverse of [`compute_absolute_position`].
pub fn locate(item: &ContentItem, absolute_position: usize) -> Result<PositionInput> {
    match &item.layout {
        ContentLayout::Paged { page_count } => {
            let input = PositionInput::page(absolute_position);
            if absolute_position >= *page_count {
                return Err(invalid(
                    item,
                    input,
                    format!("page index out of range 0..{page_count}"),
                ));
            }
            Ok(input)
        }
        ContentLayout::Chaptered { chapters } => {
            let mut remaining = absolute_position;
            for (index, chapter) in chapters.iter().enumerate() {
                if remaining < chapter.paragraph_count() {
                    return Ok(PositionInput::paragraph(index, remaining));
                }
                remaining -= chapter.paragraph_count();
            }
            Err(invalid(
                item,
                PositionInput::page(absolute_position),
                format!("offset beyond the {} paragraphs of the item", item.total_units()),
            ))
        }
    }
}
