pub mod item;

pub use item::{Chapter, ContentItem, ContentLayout, PositionInput};

use std::collections::HashSet;

use crate::error::{ReaderError, Result};

/// Check every item's structure and reject duplicate identifiers.
pub fn validate_catalog(catalog: &[ContentItem]) -> Result<()> {
    let mut seen = HashSet::new();
    for item in catalog {
        item.validate()?;
        if !seen.insert(item.id.as_str()) {
            return Err(ReaderError::InvalidContent {
                item_id: item.id.clone(),
                reason: "duplicate content item id".into(),
            });
        }
    }
    Ok(())
}

pub fn find_item<'a>(catalog: &'a [ContentItem], item_id: &str) -> Option<&'a ContentItem> {
    catalog.iter().find(|item| item.id == item_id)
}
