use serde::{Deserialize, Serialize};

use bookwright_core::{BookData, Manuscript, ManuscriptChapter};

use crate::error::AdapterError;
use crate::http::ApiClient;

const BOOK_ENDPOINT: &str = "generate-book";

/// Simplified request for the legacy one-shot boundary. It bypasses the
/// outline/chapter split entirely and exists as a degraded path when the
/// two-step endpoints are unavailable.
#[derive(Clone, Debug, Serialize)]
pub struct FallbackRequest {
    pub title: String,
    pub plot: String,
    pub tone: String,
    pub chapters: u32,
    pub author: String,
}

impl FallbackRequest {
    pub fn from_book(book: &BookData, author: impl Into<String>) -> Self {
        Self {
            title: book.title.clone(),
            plot: book.plot_summary.clone(),
            tone: book.tone.label().to_ascii_lowercase(),
            chapters: book.chapters,
            author: author.into(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct FallbackChapter {
    pub number: u32,
    pub title: String,
    pub content: String,
}

/// Complete mock book returned by the legacy endpoint in one shot.
#[derive(Clone, Debug, Deserialize)]
pub struct FallbackBook {
    pub title: String,
    pub author: String,
    pub chapters: Vec<FallbackChapter>,
}

impl FallbackBook {
    pub fn into_manuscript(self) -> Manuscript {
        Manuscript {
            title: self.title,
            author: self.author,
            chapters: self
                .chapters
                .into_iter()
                .map(|chapter| ManuscriptChapter {
                    number: chapter.number,
                    title: chapter.title,
                    content: chapter.content,
                })
                .collect(),
        }
    }
}

impl ApiClient {
    pub fn generate_fallback_book(
        &self,
        request: &FallbackRequest,
    ) -> Result<FallbackBook, AdapterError> {
        self.post_json(BOOK_ENDPOINT, request)
    }
}
