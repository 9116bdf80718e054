pub mod book;
pub mod chapter;
pub mod config;
pub mod generation;
pub mod logging;
pub mod manuscript;
pub mod outline;
pub mod status;
pub mod store;

pub use book::{
    BookData, BookUpdate, Character, CharacterArchetype, CharacterDraft, CharacterId,
    CharacterRole, CharacterUpdate, Tone, UnknownVariant, ValidationError, MAX_CHAPTER_COUNT,
    MIN_CHAPTER_COUNT,
};
pub use chapter::GeneratedChapter;
pub use config::{ApiConfig, Config, ConfigError, ConfigStore, GenerationConfig};
pub use generation::{
    ChapterRequest, ChapterService, GenerationEngine, GenerationError, OutlineService,
    ServiceError,
};
pub use logging::{
    LogLevel, LogRecord, LogSink, NullLogSink, SharedLogSink, StdoutLogSink, VecLogSink,
};
pub use manuscript::{Manuscript, ManuscriptChapter, ManuscriptError, Page, PageLayout};
pub use outline::{ChapterOutline, NarrativePhase};
pub use status::{GenerationMode, GenerationStatus, GenerationStep, StatusPatch};
pub use store::{BookStore, StoreError, STORAGE_FILE_NAME};
