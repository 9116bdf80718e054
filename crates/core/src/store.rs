use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::book::{
    BookData, BookUpdate, Character, CharacterDraft, CharacterId, CharacterUpdate,
    ValidationError,
};
use crate::chapter::GeneratedChapter;
use crate::outline::ChapterOutline;
use crate::status::{GenerationMode, GenerationStatus, StatusPatch};

pub const STORAGE_FILE_NAME: &str = "bookwright_storage.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access library file `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse library file `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize library state: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("no character with id {id}")]
    UnknownCharacter { id: CharacterId },
    #[error("outline index {index} is out of range (0..{len})")]
    OutlineIndex { index: usize, len: usize },
    #[error("chapter {number} does not follow the {stored} chapters already stored")]
    ChapterSequence { number: u32, stored: usize },
    #[error("cannot store chapter {number}: only {outlines} outlines exist")]
    ChapterOverflow { number: u32, outlines: usize },
}

/// On-disk record. The generation status is deliberately absent: an
/// interrupted session resumes with its outlines and chapters intact but the
/// state machine back at idle.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StorageRecord {
    #[serde(default)]
    book_data: BookData,
    #[serde(default)]
    chapter_outlines: Vec<ChapterOutline>,
    #[serde(default)]
    original_outlines: Vec<ChapterOutline>,
    #[serde(default)]
    generated_chapters: Vec<GeneratedChapter>,
    #[serde(default)]
    generation_mode: GenerationMode,
    #[serde(default)]
    next_character_id: u64,
}

/// Single source of truth for one book session. Every mutation writes the
/// persisted record back to disk before returning, so the store on disk is
/// never behind the store in memory.
#[derive(Debug)]
pub struct BookStore {
    path: PathBuf,
    book: BookData,
    outlines: Vec<ChapterOutline>,
    original_outlines: Vec<ChapterOutline>,
    chapters: Vec<GeneratedChapter>,
    status: GenerationStatus,
    mode: GenerationMode,
    next_character_id: u64,
}

impl BookStore {
    /// Opens the library at `path`, loading the persisted record when one
    /// exists. A missing file yields a fresh store; a corrupt file is an
    /// error rather than a silent reset.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let record = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            serde_json::from_str::<StorageRecord>(&contents).map_err(|source| {
                StoreError::Parse {
                    path: path.clone(),
                    source,
                }
            })?
        } else {
            StorageRecord::default()
        };

        let next_character_id = record.next_character_id.max(
            record
                .book_data
                .characters
                .iter()
                .map(|character| character.id.value() + 1)
                .max()
                .unwrap_or(0),
        );

        Ok(Self {
            path,
            book: record.book_data,
            outlines: record.chapter_outlines,
            original_outlines: record.original_outlines,
            chapters: record.generated_chapters,
            status: GenerationStatus::idle(),
            mode: record.generation_mode,
            next_character_id,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn book(&self) -> &BookData {
        &self.book
    }

    pub fn outlines(&self) -> &[ChapterOutline] {
        &self.outlines
    }

    pub fn original_outlines(&self) -> &[ChapterOutline] {
        &self.original_outlines
    }

    pub fn chapters(&self) -> &[GeneratedChapter] {
        &self.chapters
    }

    pub fn status(&self) -> &GenerationStatus {
        &self.status
    }

    pub fn mode(&self) -> GenerationMode {
        self.mode
    }

    pub fn update_book(&mut self, update: BookUpdate) -> Result<(), StoreError> {
        update.apply(&mut self.book)?;
        self.persist()
    }

    pub fn add_character(&mut self, draft: CharacterDraft) -> Result<CharacterId, StoreError> {
        let id = CharacterId::new(self.next_character_id);
        self.next_character_id += 1;
        self.book.characters.push(Character {
            id,
            name: draft.name,
            backstory: draft.backstory,
            role: draft.role,
            archetype: draft.archetype,
        });
        self.persist()?;
        Ok(id)
    }

    pub fn update_character(
        &mut self,
        id: CharacterId,
        update: CharacterUpdate,
    ) -> Result<(), StoreError> {
        let character = self
            .book
            .characters
            .iter_mut()
            .find(|character| character.id == id)
            .ok_or(StoreError::UnknownCharacter { id })?;
        update.apply(character);
        self.persist()
    }

    pub fn remove_character(&mut self, id: CharacterId) -> Result<Character, StoreError> {
        let position = self
            .book
            .characters
            .iter()
            .position(|character| character.id == id)
            .ok_or(StoreError::UnknownCharacter { id })?;
        let removed = self.book.characters.remove(position);
        self.persist()?;
        Ok(removed)
    }

    /// Installs a freshly generated outline sequence and snapshots it as the
    /// "originals" in the same step. Any previously generated chapters are
    /// left alone; callers reset explicitly when they want a clean slate.
    pub fn install_outlines(&mut self, outlines: Vec<ChapterOutline>) -> Result<(), StoreError> {
        self.original_outlines = outlines.clone();
        self.outlines = outlines;
        self.persist()
    }

    pub fn update_outline_content(
        &mut self,
        index: usize,
        content: String,
    ) -> Result<(), StoreError> {
        let len = self.outlines.len();
        let outline = self
            .outlines
            .get_mut(index)
            .ok_or(StoreError::OutlineIndex { index, len })?;
        outline.content = content;
        self.persist()
    }

    /// Restores one live outline to its value at generation time.
    pub fn reset_outline(&mut self, index: usize) -> Result<(), StoreError> {
        let len = self.outlines.len();
        let original = self
            .original_outlines
            .get(index)
            .cloned()
            .ok_or(StoreError::OutlineIndex { index, len })?;
        let outline = self
            .outlines
            .get_mut(index)
            .ok_or(StoreError::OutlineIndex { index, len })?;
        *outline = original;
        self.persist()
    }

    /// Appends the next chapter. The chapter number must continue the stored
    /// sequence and never outgrow the outline list.
    pub fn push_chapter(&mut self, chapter: GeneratedChapter) -> Result<(), StoreError> {
        let expected = self.chapters.len() as u32 + 1;
        if chapter.chapter_number != expected {
            return Err(StoreError::ChapterSequence {
                number: chapter.chapter_number,
                stored: self.chapters.len(),
            });
        }
        if chapter.chapter_number as usize > self.outlines.len() {
            return Err(StoreError::ChapterOverflow {
                number: chapter.chapter_number,
                outlines: self.outlines.len(),
            });
        }
        self.chapters.push(chapter);
        self.persist()
    }

    /// Status is transient, so merging a patch does not touch the disk.
    pub fn merge_status(&mut self, patch: StatusPatch) {
        patch.apply(&mut self.status);
    }

    pub fn set_mode(&mut self, mode: GenerationMode) -> Result<(), StoreError> {
        self.mode = mode;
        self.persist()
    }

    /// Clears outlines, originals, chapters and status; the book
    /// configuration survives.
    pub fn reset_generation(&mut self) -> Result<(), StoreError> {
        self.outlines.clear();
        self.original_outlines.clear();
        self.chapters.clear();
        self.status = GenerationStatus::idle();
        self.persist()
    }

    /// Restores every field to its default. The character id counter keeps
    /// counting so ids are never reissued across resets.
    pub fn reset_all(&mut self) -> Result<(), StoreError> {
        self.book = BookData::default();
        self.outlines.clear();
        self.original_outlines.clear();
        self.chapters.clear();
        self.status = GenerationStatus::idle();
        self.mode = GenerationMode::Manual;
        self.persist()
    }

    fn persist(&self) -> Result<(), StoreError> {
        let record = StorageRecord {
            book_data: self.book.clone(),
            chapter_outlines: self.outlines.clone(),
            original_outlines: self.original_outlines.clone(),
            generated_chapters: self.chapters.clone(),
            generation_mode: self.mode,
            next_character_id: self.next_character_id,
        };
        let serialized =
            serde_json::to_string_pretty(&record).map_err(StoreError::Serialize)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        fs::write(&self.path, serialized).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}
