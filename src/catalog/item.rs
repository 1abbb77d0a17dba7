//! Content item data models.
//!
//! Items are produced outside the reader (generation, upload) and are treated as
//! immutable once they enter a session.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ReaderError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    #[serde(default)]
    pub title: Option<String>,
    pub paragraphs: Vec<String>,
}

impl Chapter {
    pub fn new(title: Option<String>, paragraphs: Vec<String>) -> Self {
        Self { title, paragraphs }
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }
}

/// Structure of an item: image pages or chapters of paragraph units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ContentLayout {
    #[serde(rename_all = "camelCase")]
    Paged { page_count: usize },
    #[serde(rename_all = "camelCase")]
    Chaptered { chapters: Vec<Chapter> },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub categories: Vec<String>,
    pub layout: ContentLayout,
}

impl ContentItem {
    pub fn paged(
        id: impl Into<String>,
        title: impl Into<String>,
        categories: Vec<String>,
        page_count: usize,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            categories,
            layout: ContentLayout::Paged { page_count },
        }
    }

    pub fn chaptered(
        id: impl Into<String>,
        title: impl Into<String>,
        categories: Vec<String>,
        chapters: Vec<Chapter>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            categories,
            layout: ContentLayout::Chaptered { chapters },
        }
    }

    /// Number of addressable units: pages, or paragraphs across all chapters.
    pub fn total_units(&self) -> usize {
        match &self.layout {
            ContentLayout::Paged { page_count } => *page_count,
            ContentLayout::Chaptered { chapters } => {
                chapters.iter().map(Chapter::paragraph_count).sum()
            }
        }
    }

    pub fn has_category(&self, tag: &str) -> bool {
        self.categories.iter().any(|category| category == tag)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| ReaderError::InvalidContent {
            item_id: self.id.clone(),
            reason,
        };

        match &self.layout {
            ContentLayout::Paged { page_count } => {
                if *page_count == 0 {
                    return Err(invalid("paged item has no pages".into()));
                }
            }
            ContentLayout::Chaptered { chapters } => {
                if chapters.is_empty() {
                    return Err(invalid("chaptered item has no chapters".into()));
                }
                if let Some(index) = chapters.iter().position(|c| c.paragraphs.is_empty()) {
                    return Err(invalid(format!("chapter {index} has no paragraphs")));
                }
            }
        }

        Ok(())
    }
}

/// Raw navigation input from the reader.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PositionInput {
    Page { index: usize },
    Paragraph { chapter: usize, paragraph: usize },
}

impl PositionInput {
    pub fn page(index: usize) -> Self {
        PositionInput::Page { index }
    }

    pub fn paragraph(chapter: usize, paragraph: usize) -> Self {
        PositionInput::Paragraph { chapter, paragraph }
    }
}

impl fmt::Display for PositionInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionInput::Page { index } => write!(f, "page {index}"),
            PositionInput::Paragraph { chapter, paragraph } => {
                write!(f, "chapter {chapter} paragraph {paragraph}")
            }
        }
    }
}
