use std::collections::VecDeque;
use std::io;
use std::sync::Mutex;
use std::time::Duration;

use bookwright_core::{
    BookData, BookStore, BookUpdate, ChapterOutline, ChapterRequest, ChapterService,
    CharacterDraft, CharacterRole, GeneratedChapter, GenerationEngine, GenerationMode,
    GenerationStep, Manuscript, NarrativePhase, OutlineService, PageLayout, ServiceError,
    Tone, VecLogSink, STORAGE_FILE_NAME,
};
use tempfile::tempdir;

struct MockOutlineService {
    responses: Mutex<VecDeque<Vec<ChapterOutline>>>,
}

impl MockOutlineService {
    fn new<I>(responses: I) -> Self
    where
        I: IntoIterator<Item = Vec<ChapterOutline>>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
        }
    }

    fn assert_empty(&self) {
        assert!(
            self.responses.lock().unwrap().is_empty(),
            "expected all mock outline responses to be consumed"
        );
    }
}

impl OutlineService for MockOutlineService {
    fn generate_outlines(&self, _book: &BookData) -> Result<Vec<ChapterOutline>, ServiceError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| {
                ServiceError::new(io::Error::other(
                    "mock outline service has no remaining responses",
                ))
            })
    }
}

struct MockChapterService {
    responses: Mutex<VecDeque<GeneratedChapter>>,
}

impl MockChapterService {
    fn new<I>(responses: I) -> Self
    where
        I: IntoIterator<Item = GeneratedChapter>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
        }
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
        // The mock honors the causal contract: the prose references every
        // chapter that came before it.
        let chapter = self.responses.lock().unwrap().pop_front().ok_or_else(|| {
            ServiceError::new(io::Error::other(
                "mock chapter service has no remaining responses",
            ))
        })?;
        assert_eq!(request.previous_chapters.len(), request.chapter_index);
        Ok(chapter)
    }
}

fn outline(number: u32, phase: NarrativePhase) -> ChapterOutline {
    ChapterOutline {
        title: format!("Step {number}"),
        content: format!("What happens in chapter {number}."),
        phase,
    }
}

fn chapter(number: u32) -> GeneratedChapter {
    GeneratedChapter {
        title: format!("Step {number}"),
        content: format!("The full prose of chapter {number}."),
        chapter_number: number,
    }
}

#[test]
fn full_generation_pipeline_produces_a_complete_book() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let library = temp.path().join(STORAGE_FILE_NAME);

    let mut store = BookStore::open(&library)?;
    store.update_book(BookUpdate {
        title: Some("Test".into()),
        genre: Some("Fantasy".into()),
        tone: Some(Tone::Suspenseful),
        chapters: Some(3),
        plot_summary: Some("A quest".into()),
        setting: Some("The Shattered Coast".into()),
        ..BookUpdate::default()
    })?;
    store.add_character(CharacterDraft {
        name: "Mira".into(),
        backstory: "Raised by cartographers".into(),
        role: CharacterRole::Protagonist,
        ..CharacterDraft::default()
    })?;
    store.set_mode(GenerationMode::Auto)?;

    let sink = VecLogSink::new();
    let engine = GenerationEngine::new(&sink).with_chapter_delay(Duration::ZERO);

    let outline_service = MockOutlineService::new([vec![
        outline(1, NarrativePhase::Opening),
        outline(2, NarrativePhase::Midpoint),
        outline(3, NarrativePhase::Resolution),
    ]]);
    let installed = engine.generate_outlines(&outline_service, &mut store)?;
    assert_eq!(installed, 3);
    assert_eq!(
        store.status().current_step,
        GenerationStep::OutlinesComplete
    );

    // A quick review edit before expansion.
    store.update_outline_content(1, "Revised midpoint beats.".into())?;

    let chapter_service = MockChapterService::new([chapter(1), chapter(2), chapter(3)]);
    let generated = engine.generate_book(&chapter_service, &mut store)?;
    assert_eq!(generated, 3);
    assert_eq!(store.status().current_step, GenerationStep::Complete);
    assert_eq!(store.status().progress, 100);

    // The session survives a restart with everything but the status.
    drop(store);
    let store = BookStore::open(&library)?;
    assert_eq!(store.chapters().len(), 3);
    assert_eq!(store.outlines()[1].content, "Revised midpoint beats.");
    assert_eq!(
        store.original_outlines()[1].content,
        "What happens in chapter 2."
    );
    assert_eq!(store.status().current_step, GenerationStep::Idle);
    assert_eq!(store.mode(), GenerationMode::Auto);

    let manuscript = Manuscript::from_store(&store, "A. Author")?;
    let rendered = manuscript.render_plain(&PageLayout::default());
    assert!(rendered.contains("Test"));
    assert!(rendered.contains("By A. Author"));
    assert!(rendered.contains("The full prose of chapter 3."));

    outline_service.assert_empty();
    chapter_service.assert_empty();
    assert!(sink.contains("Book generation complete."));

    Ok(())
}
