mod error;
mod fallback;
mod http;

pub use error::AdapterError;
pub use fallback::{FallbackBook, FallbackChapter, FallbackRequest};
pub use http::ApiClient;

pub use bookwright_core::generation::{ChapterService, OutlineService, ServiceError};
