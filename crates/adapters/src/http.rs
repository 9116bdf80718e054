use std::time::Duration;

use log::warn;
use reqwest::blocking::Client;
use reqwest::header::{self, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use bookwright_core::config::ApiConfig;
use bookwright_core::{
    BookData, ChapterOutline, ChapterRequest, ChapterService, GeneratedChapter, OutlineService,
    ServiceError,
};

use crate::error::AdapterError;

const OUTLINES_ENDPOINT: &str = "generate-outlines";
const CHAPTER_ENDPOINT: &str = "generate-chapter";

/// Blocking client for the BookWright generation endpoints. One instance
/// serves both the outline and the chapter boundary; requests are issued
/// one at a time by the orchestrator, never concurrently.
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ApiClient {
    pub fn from_config(config: &ApiConfig) -> Result<Self, AdapterError> {
        Self::new(&config.base_url, optional_string(&config.api_key), config.timeout)
    }

    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: u64,
    ) -> Result<Self, AdapterError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(AdapterError::InvalidConfig(
                "api base_url must not be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout.max(1)))
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    pub fn endpoint_url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }

    pub(crate) fn post_json<T, R>(&self, endpoint: &str, body: &T) -> Result<R, AdapterError>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut request = self.client.post(self.endpoint_url(endpoint)).header(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.json(body).send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AdapterError::Api {
                status,
                message: extract_error_message(&body),
            });
        }

        Ok(response.json()?)
    }
}

impl OutlineService for ApiClient {
    fn generate_outlines(&self, book: &BookData) -> Result<Vec<ChapterOutline>, ServiceError> {
        let response: OutlineResponse = self
            .post_json(OUTLINES_ENDPOINT, book)
            .map_err(ServiceError::new)?;
        Ok(response.outlines)
    }
}

impl ChapterService for ApiClient {
    fn generate_chapter(
        &self,
        request: &ChapterRequest<'_>,
    ) -> Result<GeneratedChapter, ServiceError> {
        let body = ChapterRequestBody {
            book_data: request.book,
            outlines: request.outlines,
            chapter_index: request.chapter_index,
            previous_chapters: request.previous_chapters,
        };
        let response: ChapterResponse = self
            .post_json(CHAPTER_ENDPOINT, &body)
            .map_err(ServiceError::new)?;

        let chapter = response.chapter;
        let expected = request.chapter_index as u32 + 1;
        if chapter.content.trim().is_empty() {
            return Err(ServiceError::new(AdapterError::EmptyChapter {
                number: expected,
            }));
        }
        if chapter.chapter_number != expected {
            return Err(ServiceError::new(AdapterError::UnexpectedChapterNumber {
                expected,
                actual: chapter.chapter_number,
            }));
        }
        Ok(chapter)
    }
}

#[derive(Debug, Deserialize)]
struct OutlineResponse {
    #[serde(default)]
    outlines: Vec<ChapterOutline>,
}

#[derive(Debug, Deserialize)]
struct ChapterResponse {
    chapter: GeneratedChapter,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChapterRequestBody<'a> {
    book_data: &'a BookData,
    outlines: &'a [ChapterOutline],
    chapter_index: usize,
    previous_chapters: &'a [GeneratedChapter],
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Non-2xx bodies are `{ "message": ... }` JSON; anything else is passed
/// through raw so the user still sees what the server said.
fn extract_error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.message,
        Err(_) => {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "no response body".to_string()
            } else {
                warn!("error response body was not the expected JSON shape");
                trimmed.to_string()
            }
        }
    }
}

pub(crate) fn optional_string(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookwright_core::NarrativePhase;

    #[test]
    fn empty_base_url_is_rejected_before_any_call() {
        let result = ApiClient::new("  ", None, 60);
        assert!(matches!(result, Err(AdapterError::InvalidConfig(_))));
    }

    #[test]
    fn endpoint_urls_drop_trailing_slashes() {
        let client = ApiClient::new("https://example.test/fns/", None, 60).unwrap();
        assert_eq!(
            client.endpoint_url(OUTLINES_ENDPOINT),
            "https://example.test/fns/generate-outlines"
        );
        assert_eq!(
            client.endpoint_url(CHAPTER_ENDPOINT),
            "https://example.test/fns/generate-chapter"
        );
    }

    #[test]
    fn error_message_prefers_the_json_body() {
        assert_eq!(
            extract_error_message(r#"{"message":"API key not configured"}"#),
            "API key not configured"
        );
        assert_eq!(extract_error_message("  gateway timeout  "), "gateway timeout");
        assert_eq!(extract_error_message(""), "no response body");
    }

    #[test]
    fn chapter_request_body_uses_the_wire_keys() {
        let book = BookData {
            title: "Test".into(),
            plot_summary: "A quest".into(),
            ..BookData::default()
        };
        let outlines = vec![ChapterOutline {
            title: "The Call".into(),
            content: "Hero refuses.".into(),
            phase: NarrativePhase::Opening,
        }];
        let previous = vec![GeneratedChapter {
            title: "The Call".into(),
            content: "Prose.".into(),
            chapter_number: 1,
        }];

        let body = ChapterRequestBody {
            book_data: &book,
            outlines: &outlines,
            chapter_index: 1,
            previous_chapters: &previous,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["chapterIndex"], 1);
        assert_eq!(json["bookData"]["plotSummary"], "A quest");
        assert_eq!(json["previousChapters"][0]["chapterNumber"], 1);
        assert_eq!(json["outlines"][0]["phase"], "opening");
    }

    #[test]
    fn outline_response_parses_the_documented_shape() {
        let parsed: OutlineResponse = serde_json::from_str(
            r#"{"outlines":[{"title":"t","content":"c","phase":"setup"}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.outlines.len(), 1);
        assert_eq!(parsed.outlines[0].phase, NarrativePhase::Setup);
    }
}
