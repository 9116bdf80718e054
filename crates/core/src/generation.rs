use std::error::Error as StdError;
use std::fmt;
use std::thread;
use std::time::Duration;

use thiserror::Error;

use crate::book::{BookData, ValidationError};
use crate::chapter::GeneratedChapter;
use crate::logging::{LogLevel, LogRecord, LogSink};
use crate::outline::ChapterOutline;
use crate::status::{GenerationMode, GenerationStep, StatusPatch};
use crate::store::{BookStore, StoreError};

const DEFAULT_CHAPTER_DELAY: Duration = Duration::from_millis(500);

/// Opaque failure from a service client. Keeps the orchestrator independent
/// of whatever transport the client uses.
#[derive(Debug)]
pub struct ServiceError {
    inner: Box<dyn StdError + Send + Sync>,
}

impl ServiceError {
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            inner: Box::new(error),
        }
    }

    pub fn into_inner(self) -> Box<dyn StdError + Send + Sync> {
        self.inner
    }

    pub fn as_inner(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.inner.as_ref()
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl StdError for ServiceError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.inner.as_ref())
    }
}

/// One-shot request producing the full outline sequence for a book.
pub trait OutlineService {
    fn generate_outlines(&self, book: &BookData) -> Result<Vec<ChapterOutline>, ServiceError>;
}

/// Payload for a single chapter expansion. `previous_chapters` is always the
/// accumulated prefix `0..chapter_index`, so the collaborator can keep the
/// narrative consistent.
#[derive(Clone, Copy, Debug)]
pub struct ChapterRequest<'a> {
    pub book: &'a BookData,
    pub outlines: &'a [ChapterOutline],
    pub chapter_index: usize,
    pub previous_chapters: &'a [GeneratedChapter],
}

/// One-shot request expanding a single outline into chapter prose.
pub trait ChapterService {
    fn generate_chapter(
        &self,
        request: &ChapterRequest<'_>,
    ) -> Result<GeneratedChapter, ServiceError>;
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("no chapter outlines available; generate outlines first")]
    MissingOutlines,
    #[error("expected {expected} outlines but the service returned {actual}")]
    OutlineCount { expected: usize, actual: usize },
    #[error("outline generation failed: {source}")]
    Outlines {
        #[source]
        source: ServiceError,
    },
    #[error("failed at chapter {number}: {source}")]
    Chapter {
        number: u32,
        #[source]
        source: ServiceError,
    },
    #[error("chapter index {index} is out of range (0..{total})")]
    ChapterIndex { index: usize, total: usize },
    #[error("next-chapter is only available in manual mode")]
    AutoMode,
    #[error("no chapter is awaiting a next-chapter command (current step: {step})")]
    NotWaiting { step: GenerationStep },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Drives the outline-then-chapters state machine over a [`BookStore`].
///
/// Exactly one external request is in flight at any time. Chapter requests
/// are strictly sequential: request i+1 is only constructed after chapter i
/// has been appended and persisted, because its payload includes every
/// chapter generated so far. Between successive auto-mode requests the
/// engine pauses for a pacing delay; tests set it to zero.
pub struct GenerationEngine<'a> {
    sink: &'a dyn LogSink,
    chapter_delay: Duration,
}

impl<'a> GenerationEngine<'a> {
    pub fn new(sink: &'a dyn LogSink) -> Self {
        Self {
            sink,
            chapter_delay: DEFAULT_CHAPTER_DELAY,
        }
    }

    pub fn with_chapter_delay(mut self, delay: Duration) -> Self {
        self.chapter_delay = delay;
        self
    }

    /// Requests the outline sequence for the configured book and installs it
    /// (snapshotting the originals). Validation failures return before any
    /// network traffic and leave the status untouched; service failures and
    /// count mismatches move the state machine to `error` without touching
    /// the existing outlines.
    pub fn generate_outlines<S: OutlineService>(
        &self,
        service: &S,
        store: &mut BookStore,
    ) -> Result<usize, GenerationError> {
        store.book().validate()?;
        let expected = store.book().chapters as usize;

        store.merge_status(
            StatusPatch::new()
                .generating(true)
                .step(GenerationStep::Outlines)
                .progress(0)
                .clear_error(),
        );
        self.log(
            LogLevel::Info,
            format!("Requesting {expected} chapter outlines..."),
        );

        let outlines = match service.generate_outlines(store.book()) {
            Ok(outlines) => outlines,
            Err(source) => {
                let error = GenerationError::Outlines { source };
                self.fail(store, &error);
                return Err(error);
            }
        };

        if outlines.len() != expected {
            let error = GenerationError::OutlineCount {
                expected,
                actual: outlines.len(),
            };
            self.fail(store, &error);
            return Err(error);
        }

        store.install_outlines(outlines)?;
        store.merge_status(
            StatusPatch::new()
                .generating(false)
                .step(GenerationStep::OutlinesComplete)
                .progress(100)
                .clear_error(),
        );
        self.log(
            LogLevel::Info,
            format!("Received {expected} outlines; ready for chapter generation."),
        );
        Ok(expected)
    }

    /// Expands outlines into chapters according to the store's generation
    /// mode. Generation always resumes at the first ungenerated index, so a
    /// re-trigger after a failure never regenerates the preserved prefix.
    /// Returns the number of chapters generated by this call.
    pub fn generate_book<S: ChapterService>(
        &self,
        service: &S,
        store: &mut BookStore,
    ) -> Result<usize, GenerationError> {
        let total = store.outlines().len();
        if total == 0 {
            return Err(GenerationError::MissingOutlines);
        }

        let start = store.chapters().len();
        store.merge_status(
            StatusPatch::new()
                .generating(true)
                .step(GenerationStep::Chapters)
                .progress(progress_before(start, total))
                .chapter(start as u32)
                .total(total as u32)
                .clear_error(),
        );

        if start >= total {
            self.finish_book(store);
            return Ok(0);
        }

        match store.mode() {
            GenerationMode::Auto => {
                for index in start..total {
                    self.generate_chapter_at(service, store, index)?;
                    if index + 1 < total && !self.chapter_delay.is_zero() {
                        thread::sleep(self.chapter_delay);
                    }
                }
                self.finish_book(store);
                Ok(total - start)
            }
            GenerationMode::Manual => {
                self.generate_chapter_at(service, store, start)?;
                self.finish_manual_step(store, start, total);
                Ok(1)
            }
        }
    }

    /// Manual-mode continuation: generates the chapter at
    /// `generated.len()`. Only legal while the state machine is `waiting`.
    pub fn generate_next_chapter<S: ChapterService>(
        &self,
        service: &S,
        store: &mut BookStore,
    ) -> Result<u32, GenerationError> {
        if store.mode() != GenerationMode::Manual {
            return Err(GenerationError::AutoMode);
        }
        let step = store.status().current_step;
        if step != GenerationStep::Waiting {
            return Err(GenerationError::NotWaiting { step });
        }

        let total = store.outlines().len();
        let index = store.chapters().len();
        if index >= total {
            return Err(GenerationError::ChapterIndex { index, total });
        }

        store.merge_status(
            StatusPatch::new()
                .generating(true)
                .step(GenerationStep::Chapters)
                .total(total as u32)
                .clear_error(),
        );
        self.generate_chapter_at(service, store, index)?;
        self.finish_manual_step(store, index, total);
        Ok(index as u32 + 1)
    }

    /// The shared single-chapter step used by both modes. On failure the
    /// state machine goes to `error` with a message naming the chapter, and
    /// every chapter generated so far stays in the store.
    fn generate_chapter_at<S: ChapterService>(
        &self,
        service: &S,
        store: &mut BookStore,
        index: usize,
    ) -> Result<(), GenerationError> {
        let total = store.outlines().len();
        if index >= total {
            return Err(GenerationError::ChapterIndex { index, total });
        }

        let number = index as u32 + 1;
        store.merge_status(
            StatusPatch::new()
                .generating(true)
                .step(GenerationStep::Chapters)
                .chapter(number)
                .progress(progress_before(index, total)),
        );
        self.log(
            LogLevel::Info,
            format!("Generating chapter {number} of {total}..."),
        );

        let result = service.generate_chapter(&ChapterRequest {
            book: store.book(),
            outlines: store.outlines(),
            chapter_index: index,
            previous_chapters: store.chapters(),
        });

        match result {
            Ok(chapter) => {
                store.push_chapter(chapter)?;
                self.log(LogLevel::Info, format!("Chapter {number} stored."));
                Ok(())
            }
            Err(source) => {
                let error = GenerationError::Chapter { number, source };
                self.fail(store, &error);
                Err(error)
            }
        }
    }

    fn finish_book(&self, store: &mut BookStore) {
        store.merge_status(
            StatusPatch::new()
                .generating(false)
                .step(GenerationStep::Complete)
                .progress(100),
        );
        self.log(LogLevel::Info, "Book generation complete.");
    }

    fn finish_manual_step(&self, store: &mut BookStore, index: usize, total: usize) {
        let done = index + 1;
        if done >= total {
            self.finish_book(store);
        } else {
            store.merge_status(
                StatusPatch::new()
                    .generating(false)
                    .step(GenerationStep::Waiting)
                    .progress(progress_before(done, total)),
            );
            self.log(
                LogLevel::Info,
                format!("Chapter {done} complete; waiting for the next-chapter command."),
            );
        }
    }

    fn fail(&self, store: &mut BookStore, error: &GenerationError) {
        let message = error.to_string();
        store.merge_status(
            StatusPatch::new()
                .generating(false)
                .step(GenerationStep::Error)
                .error(message.clone()),
        );
        self.log(LogLevel::Error, message);
    }

    fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.sink.log(LogRecord::new(level, message.into()));
    }
}

fn progress_before(index: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    (index * 100 / total) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::BookUpdate;
    use crate::logging::VecLogSink;
    use crate::outline::NarrativePhase;
    use crate::store::STORAGE_FILE_NAME;
    use std::collections::VecDeque;
    use std::io;
    use std::sync::Mutex;
    use tempfile::tempdir;

    struct MockOutlineService {
        responses: Mutex<VecDeque<Result<Vec<ChapterOutline>, String>>>,
        calls: Mutex<usize>,
    }

    impl MockOutlineService {
        fn new<I>(responses: I) -> Self
        where
            I: IntoIterator<Item = Result<Vec<ChapterOutline>, String>>,
        {
            Self {
                responses: Mutex::new(responses.into_iter().collect()),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    impl OutlineService for MockOutlineService {
        fn generate_outlines(
            &self,
            _book: &BookData,
        ) -> Result<Vec<ChapterOutline>, ServiceError> {
            *self.calls.lock().unwrap() += 1;
            match self.responses.lock().unwrap().pop_front() {
                Some(Ok(outlines)) => Ok(outlines),
                Some(Err(message)) => Err(ServiceError::new(io::Error::other(message))),
                None => Err(ServiceError::new(io::Error::other(
                    "mock outline service has no remaining responses",
                ))),
            }
        }
    }

    /// Snapshot of one observed chapter request, for asserting the causal
    /// inputs each call was constructed from.
    struct SeenRequest {
        chapter_index: usize,
        previous_count: usize,
        previous_numbers: Vec<u32>,
        outline_contents: Vec<String>,
    }

    struct MockChapterService {
        responses: Mutex<VecDeque<Result<GeneratedChapter, String>>>,
        seen: Mutex<Vec<SeenRequest>>,
    }

    impl MockChapterService {
        fn new<I>(responses: I) -> Self
        where
            I: IntoIterator<Item = Result<GeneratedChapter, String>>,
        {
            Self {
                responses: Mutex::new(responses.into_iter().collect()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn seen(&self) -> std::sync::MutexGuard<'_, Vec<SeenRequest>> {
            self.seen.lock().unwrap()
        }

        fn assert_empty(&self) {
            assert!(
                self.responses.lock().unwrap().is_empty(),
                "expected all mock chapter responses to be consumed"
            );
        }
    }

    impl ChapterService for MockChapterService {
        fn generate_chapter(
            &self,
            request: &ChapterRequest<'_>,
        ) -> Result<GeneratedChapter, ServiceError> {
            self.seen.lock().unwrap().push(SeenRequest {
                chapter_index: request.chapter_index,
                previous_count: request.previous_chapters.len(),
                previous_numbers: request
                    .previous_chapters
                    .iter()
                    .map(|chapter| chapter.chapter_number)
                    .collect(),
                outline_contents: request
                    .outlines
                    .iter()
                    .map(|outline| outline.content.clone())
                    .collect(),
            });
            match self.responses.lock().unwrap().pop_front() {
                Some(Ok(chapter)) => Ok(chapter),
                Some(Err(message)) => Err(ServiceError::new(io::Error::other(message))),
                None => Err(ServiceError::new(io::Error::other(
                    "mock chapter service has no remaining responses",
                ))),
            }
        }
    }

    fn outlines(count: usize) -> Vec<ChapterOutline> {
        (1..=count)
            .map(|number| ChapterOutline {
                title: format!("Chapter {number}"),
                content: format!("Outline {number}."),
                phase: NarrativePhase::RisingAction,
            })
            .collect()
    }

    fn chapter(number: u32) -> GeneratedChapter {
        GeneratedChapter {
            title: format!("Chapter {number}"),
            content: format!("Prose {number}."),
            chapter_number: number,
        }
    }

    fn configured_store(dir: &std::path::Path, chapters: u32) -> BookStore {
        let mut store = BookStore::open(dir.join(STORAGE_FILE_NAME)).unwrap();
        store
            .update_book(BookUpdate {
                title: Some("Test".into()),
                genre: Some("Fantasy".into()),
                plot_summary: Some("A quest".into()),
                chapters: Some(chapters),
                ..BookUpdate::default()
            })
            .unwrap();
        store
    }

    #[test]
    fn validation_failure_makes_no_request() {
        let temp = tempdir().unwrap();
        let mut store = BookStore::open(temp.path().join(STORAGE_FILE_NAME)).unwrap();
        let sink = VecLogSink::new();
        let engine = GenerationEngine::new(&sink).with_chapter_delay(Duration::ZERO);
        let service = MockOutlineService::new([Ok(outlines(3))]);

        let result = engine.generate_outlines(&service, &mut store);
        assert!(matches!(result, Err(GenerationError::Validation(_))));
        assert_eq!(service.calls(), 0);
        assert_eq!(store.status().current_step, GenerationStep::Idle);
    }

    #[test]
    fn successful_outline_run_installs_and_snapshots() {
        let temp = tempdir().unwrap();
        let mut store = configured_store(temp.path(), 3);
        let sink = VecLogSink::new();
        let engine = GenerationEngine::new(&sink).with_chapter_delay(Duration::ZERO);
        let service = MockOutlineService::new([Ok(outlines(3))]);

        let installed = engine.generate_outlines(&service, &mut store).unwrap();
        assert_eq!(installed, 3);
        assert_eq!(store.outlines().len(), 3);
        assert_eq!(store.original_outlines().len(), 3);
        assert_eq!(
            store.status().current_step,
            GenerationStep::OutlinesComplete
        );
        assert_eq!(store.status().progress, 100);
        assert!(!store.status().is_generating);

        // The snapshot is an independent copy.
        store.update_outline_content(0, "Edited.".into()).unwrap();
        assert_eq!(store.original_outlines()[0].content, "Outline 1.");
    }

    #[test]
    fn outline_count_mismatch_is_a_generation_failure() {
        let temp = tempdir().unwrap();
        let mut store = configured_store(temp.path(), 3);
        let sink = VecLogSink::new();
        let engine = GenerationEngine::new(&sink).with_chapter_delay(Duration::ZERO);
        let service = MockOutlineService::new([Ok(outlines(2))]);

        let result = engine.generate_outlines(&service, &mut store);
        assert!(matches!(
            result,
            Err(GenerationError::OutlineCount {
                expected: 3,
                actual: 2
            })
        ));
        assert!(store.outlines().is_empty());
        assert_eq!(store.status().current_step, GenerationStep::Error);
        assert!(store
            .status()
            .error
            .as_deref()
            .is_some_and(|message| message.contains("3")));
    }

    #[test]
    fn outline_service_failure_leaves_existing_outlines() {
        let temp = tempdir().unwrap();
        let mut store = configured_store(temp.path(), 2);
        store.install_outlines(outlines(2)).unwrap();

        let sink = VecLogSink::new();
        let engine = GenerationEngine::new(&sink).with_chapter_delay(Duration::ZERO);
        let service = MockOutlineService::new([Err("upstream on fire".to_string())]);

        let result = engine.generate_outlines(&service, &mut store);
        assert!(matches!(result, Err(GenerationError::Outlines { .. })));
        assert_eq!(store.outlines().len(), 2);
        assert_eq!(store.status().current_step, GenerationStep::Error);
        assert!(store
            .status()
            .error
            .as_deref()
            .is_some_and(|message| message.contains("upstream on fire")));
    }

    #[test]
    fn auto_mode_generates_every_chapter_in_order() {
        let temp = tempdir().unwrap();
        let mut store = configured_store(temp.path(), 3);
        store.install_outlines(outlines(3)).unwrap();
        store.set_mode(GenerationMode::Auto).unwrap();

        let sink = VecLogSink::new();
        let engine = GenerationEngine::new(&sink).with_chapter_delay(Duration::ZERO);
        let service =
            MockChapterService::new([Ok(chapter(1)), Ok(chapter(2)), Ok(chapter(3))]);

        let generated = engine.generate_book(&service, &mut store).unwrap();
        assert_eq!(generated, 3);
        assert_eq!(store.chapters().len(), 3);
        let numbers: Vec<u32> = store
            .chapters()
            .iter()
            .map(|chapter| chapter.chapter_number)
            .collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(store.status().current_step, GenerationStep::Complete);
        assert_eq!(store.status().progress, 100);
        assert!(!store.status().is_generating);

        // Each request saw exactly the accumulated prefix.
        let seen = service.seen();
        assert_eq!(seen.len(), 3);
        for (position, request) in seen.iter().enumerate() {
            assert_eq!(request.chapter_index, position);
            assert_eq!(request.previous_count, position);
            assert_eq!(
                request.previous_numbers,
                (1..=position as u32).collect::<Vec<_>>()
            );
        }
        drop(seen);
        service.assert_empty();
    }

    #[test]
    fn auto_mode_failure_preserves_prefix_and_resume_continues() {
        let temp = tempdir().unwrap();
        let mut store = configured_store(temp.path(), 3);
        store.install_outlines(outlines(3)).unwrap();
        store.set_mode(GenerationMode::Auto).unwrap();

        let sink = VecLogSink::new();
        let engine = GenerationEngine::new(&sink).with_chapter_delay(Duration::ZERO);

        let failing = MockChapterService::new([
            Ok(chapter(1)),
            Err("model timed out".to_string()),
        ]);
        let result = engine.generate_book(&failing, &mut store);
        assert!(matches!(
            result,
            Err(GenerationError::Chapter { number: 2, .. })
        ));
        assert_eq!(store.chapters().len(), 1);
        assert_eq!(store.status().current_step, GenerationStep::Error);
        assert!(store
            .status()
            .error
            .as_deref()
            .is_some_and(|message| message.contains("chapter 2")));

        // Resume picks up at index 1; chapter 1 is not regenerated.
        let resumed = MockChapterService::new([Ok(chapter(2)), Ok(chapter(3))]);
        let generated = engine.generate_book(&resumed, &mut store).unwrap();
        assert_eq!(generated, 2);
        assert_eq!(store.chapters().len(), 3);
        assert_eq!(store.status().current_step, GenerationStep::Complete);
        assert_eq!(store.status().error, None);

        let seen = resumed.seen();
        assert_eq!(seen[0].chapter_index, 1);
        assert_eq!(seen[0].previous_count, 1);
    }

    #[test]
    fn manual_mode_advances_one_chapter_per_command() {
        let temp = tempdir().unwrap();
        let mut store = configured_store(temp.path(), 3);
        store.install_outlines(outlines(3)).unwrap();

        let sink = VecLogSink::new();
        let engine = GenerationEngine::new(&sink).with_chapter_delay(Duration::ZERO);
        let service =
            MockChapterService::new([Ok(chapter(1)), Ok(chapter(2)), Ok(chapter(3))]);

        engine.generate_book(&service, &mut store).unwrap();
        assert_eq!(store.chapters().len(), 1);
        assert_eq!(store.status().current_step, GenerationStep::Waiting);
        assert_eq!(store.status().progress, 33);

        let number = engine.generate_next_chapter(&service, &mut store).unwrap();
        assert_eq!(number, 2);
        assert_eq!(store.status().current_step, GenerationStep::Waiting);
        assert_eq!(store.status().progress, 66);

        let number = engine.generate_next_chapter(&service, &mut store).unwrap();
        assert_eq!(number, 3);
        assert_eq!(store.status().current_step, GenerationStep::Complete);
        assert_eq!(store.status().progress, 100);

        // Once complete, the command is a validation error, not a crash.
        let result = engine.generate_next_chapter(&service, &mut store);
        assert!(matches!(
            result,
            Err(GenerationError::NotWaiting {
                step: GenerationStep::Complete
            })
        ));
        assert_eq!(store.chapters().len(), 3);
        service.assert_empty();
    }

    #[test]
    fn next_chapter_requires_waiting_state_and_manual_mode() {
        let temp = tempdir().unwrap();
        let mut store = configured_store(temp.path(), 2);
        store.install_outlines(outlines(2)).unwrap();

        let sink = VecLogSink::new();
        let engine = GenerationEngine::new(&sink).with_chapter_delay(Duration::ZERO);
        let service = MockChapterService::new([]);

        assert!(matches!(
            engine.generate_next_chapter(&service, &mut store),
            Err(GenerationError::NotWaiting {
                step: GenerationStep::Idle
            })
        ));

        store.set_mode(GenerationMode::Auto).unwrap();
        assert!(matches!(
            engine.generate_next_chapter(&service, &mut store),
            Err(GenerationError::AutoMode)
        ));
        assert!(service.seen().is_empty());
    }

    #[test]
    fn generate_book_requires_outlines() {
        let temp = tempdir().unwrap();
        let mut store = configured_store(temp.path(), 2);

        let sink = VecLogSink::new();
        let engine = GenerationEngine::new(&sink).with_chapter_delay(Duration::ZERO);
        let service = MockChapterService::new([]);

        assert!(matches!(
            engine.generate_book(&service, &mut store),
            Err(GenerationError::MissingOutlines)
        ));
    }

    #[test]
    fn manual_failure_uses_the_same_error_contract_as_auto() {
        let temp = tempdir().unwrap();
        let mut store = configured_store(temp.path(), 2);
        store.install_outlines(outlines(2)).unwrap();

        let sink = VecLogSink::new();
        let engine = GenerationEngine::new(&sink).with_chapter_delay(Duration::ZERO);
        let service = MockChapterService::new([Err("boom".to_string())]);

        let result = engine.generate_book(&service, &mut store);
        assert!(matches!(
            result,
            Err(GenerationError::Chapter { number: 1, .. })
        ));
        assert!(!store.status().is_generating);
        assert_eq!(store.status().current_step, GenerationStep::Error);

        // Re-triggering generate book resumes at the failed index.
        let retry = MockChapterService::new([Ok(chapter(1)), Ok(chapter(2))]);
        engine.generate_book(&retry, &mut store).unwrap();
        assert_eq!(store.chapters().len(), 1);
        assert_eq!(store.status().current_step, GenerationStep::Waiting);
        assert_eq!(store.status().error, None);
    }

    #[test]
    fn outline_edits_reach_later_requests_but_not_stored_chapters() {
        let temp = tempdir().unwrap();
        let mut store = configured_store(temp.path(), 2);
        store.install_outlines(outlines(2)).unwrap();

        let sink = VecLogSink::new();
        let engine = GenerationEngine::new(&sink).with_chapter_delay(Duration::ZERO);
        let service = MockChapterService::new([Ok(chapter(1)), Ok(chapter(2))]);

        engine.generate_book(&service, &mut store).unwrap();
        let stored_first = store.chapters()[0].content.clone();

        // Editing outline 0 after its chapter exists changes nothing
        // retroactively, but the edit is visible to the next request.
        store
            .update_outline_content(0, "Heavily revised.".into())
            .unwrap();
        assert_eq!(store.chapters()[0].content, stored_first);

        engine.generate_next_chapter(&service, &mut store).unwrap();
        let seen = service.seen();
        assert_eq!(seen[1].outline_contents[0], "Heavily revised.");
    }

    #[test]
    fn generate_book_with_everything_done_just_completes() {
        let temp = tempdir().unwrap();
        let mut store = configured_store(temp.path(), 1);
        store.install_outlines(outlines(1)).unwrap();

        let sink = VecLogSink::new();
        let engine = GenerationEngine::new(&sink).with_chapter_delay(Duration::ZERO);
        let service = MockChapterService::new([Ok(chapter(1))]);
        engine.generate_book(&service, &mut store).unwrap();
        assert_eq!(store.status().current_step, GenerationStep::Complete);

        let idle_service = MockChapterService::new([]);
        let generated = engine.generate_book(&idle_service, &mut store).unwrap();
        assert_eq!(generated, 0);
        assert!(idle_service.seen().is_empty());
        assert_eq!(store.status().current_step, GenerationStep::Complete);
    }
}
