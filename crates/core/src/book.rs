use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const MIN_CHAPTER_COUNT: u32 = 1;
pub const MAX_CHAPTER_COUNT: u32 = 100;

const DEFAULT_CHAPTER_COUNT: u32 = 10;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("book field `{field}` must not be empty")]
    MissingField { field: &'static str },
    #[error(
        "chapter count must be between {MIN_CHAPTER_COUNT} and {MAX_CHAPTER_COUNT}, got {count}"
    )]
    ChapterCount { count: u32 },
}

#[derive(Debug, Error)]
#[error("unknown {what} `{value}` (expected one of: {expected})")]
pub struct UnknownVariant {
    what: &'static str,
    value: String,
    expected: String,
}

impl UnknownVariant {
    pub(crate) fn new(what: &'static str, value: &str, options: &[&str]) -> Self {
        Self {
            what,
            value: value.to_string(),
            expected: options.join(", "),
        }
    }
}

/// Overall narrative voice of the book. The variants mirror the tones the
/// generation endpoints were prompted with, so the wire form is the
/// capitalized label.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum Tone {
    #[default]
    Serious,
    Humorous,
    Dark,
    Lighthearted,
    Mysterious,
    Romantic,
    Suspenseful,
    Whimsical,
    Melancholic,
    Inspirational,
}

impl Tone {
    pub const ALL: [Self; 10] = [
        Tone::Serious,
        Tone::Humorous,
        Tone::Dark,
        Tone::Lighthearted,
        Tone::Mysterious,
        Tone::Romantic,
        Tone::Suspenseful,
        Tone::Whimsical,
        Tone::Melancholic,
        Tone::Inspirational,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Tone::Serious => "Serious",
            Tone::Humorous => "Humorous",
            Tone::Dark => "Dark",
            Tone::Lighthearted => "Lighthearted",
            Tone::Mysterious => "Mysterious",
            Tone::Romantic => "Romantic",
            Tone::Suspenseful => "Suspenseful",
            Tone::Whimsical => "Whimsical",
            Tone::Melancholic => "Melancholic",
            Tone::Inspirational => "Inspirational",
        }
    }

    fn labels() -> Vec<&'static str> {
        Self::ALL.iter().map(|tone| tone.label()).collect()
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Tone {
    type Err = UnknownVariant;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let needle = input.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|tone| tone.label().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownVariant::new("tone", input, &Self::labels()))
    }
}

/// Narrative function a character serves in the story.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum CharacterRole {
    #[default]
    Protagonist,
    Antagonist,
    Deuteragonist,
    Tritagonist,
    Confidant,
    #[serde(rename = "Love Interest")]
    LoveInterest,
    Foil,
}

impl CharacterRole {
    pub const ALL: [Self; 7] = [
        CharacterRole::Protagonist,
        CharacterRole::Antagonist,
        CharacterRole::Deuteragonist,
        CharacterRole::Tritagonist,
        CharacterRole::Confidant,
        CharacterRole::LoveInterest,
        CharacterRole::Foil,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CharacterRole::Protagonist => "Protagonist",
            CharacterRole::Antagonist => "Antagonist",
            CharacterRole::Deuteragonist => "Deuteragonist",
            CharacterRole::Tritagonist => "Tritagonist",
            CharacterRole::Confidant => "Confidant",
            CharacterRole::LoveInterest => "Love Interest",
            CharacterRole::Foil => "Foil",
        }
    }

    fn labels() -> Vec<&'static str> {
        Self::ALL.iter().map(|role| role.label()).collect()
    }
}

impl fmt::Display for CharacterRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CharacterRole {
    type Err = UnknownVariant;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let needle = input.trim().replace(['-', '_'], " ");
        Self::ALL
            .iter()
            .copied()
            .find(|role| role.label().eq_ignore_ascii_case(&needle))
            .ok_or_else(|| UnknownVariant::new("character role", input, &Self::labels()))
    }
}

/// Classic narrative character-type label. Serialized under the wire key
/// `type` with the full "... Character" spelling the endpoints expect.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum CharacterArchetype {
    #[default]
    #[serde(rename = "Dynamic Character")]
    Dynamic,
    #[serde(rename = "Static Character")]
    Static,
    #[serde(rename = "Round Character")]
    Round,
    #[serde(rename = "Flat Character")]
    Flat,
    #[serde(rename = "Stock Character")]
    Stock,
    #[serde(rename = "Symbolic Character")]
    Symbolic,
    #[serde(rename = "Tertiary Character")]
    Tertiary,
    Hero,
    Mentor,
    Villain,
    Antihero,
    Innocent,
    Trickster,
    Caregiver,
    Rebel,
}

impl CharacterArchetype {
    pub const ALL: [Self; 15] = [
        CharacterArchetype::Dynamic,
        CharacterArchetype::Static,
        CharacterArchetype::Round,
        CharacterArchetype::Flat,
        CharacterArchetype::Stock,
        CharacterArchetype::Symbolic,
        CharacterArchetype::Tertiary,
        CharacterArchetype::Hero,
        CharacterArchetype::Mentor,
        CharacterArchetype::Villain,
        CharacterArchetype::Antihero,
        CharacterArchetype::Innocent,
        CharacterArchetype::Trickster,
        CharacterArchetype::Caregiver,
        CharacterArchetype::Rebel,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CharacterArchetype::Dynamic => "Dynamic Character",
            CharacterArchetype::Static => "Static Character",
            CharacterArchetype::Round => "Round Character",
            CharacterArchetype::Flat => "Flat Character",
            CharacterArchetype::Stock => "Stock Character",
            CharacterArchetype::Symbolic => "Symbolic Character",
            CharacterArchetype::Tertiary => "Tertiary Character",
            CharacterArchetype::Hero => "Hero",
            CharacterArchetype::Mentor => "Mentor",
            CharacterArchetype::Villain => "Villain",
            CharacterArchetype::Antihero => "Antihero",
            CharacterArchetype::Innocent => "Innocent",
            CharacterArchetype::Trickster => "Trickster",
            CharacterArchetype::Caregiver => "Caregiver",
            CharacterArchetype::Rebel => "Rebel",
        }
    }

    fn labels() -> Vec<&'static str> {
        Self::ALL.iter().map(|archetype| archetype.label()).collect()
    }
}

impl fmt::Display for CharacterArchetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CharacterArchetype {
    type Err = UnknownVariant;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let needle = input.trim().replace(['-', '_'], " ");
        Self::ALL
            .iter()
            .copied()
            .find(|archetype| {
                let label = archetype.label();
                label.eq_ignore_ascii_case(&needle)
                    || label
                        .strip_suffix(" Character")
                        .is_some_and(|short| short.eq_ignore_ascii_case(&needle))
            })
            .ok_or_else(|| UnknownVariant::new("character archetype", input, &Self::labels()))
    }
}

/// Store-assigned character identifier. Identifiers grow monotonically and
/// are never reissued, even after the character is removed.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CharacterId(u64);

impl CharacterId {
    pub(crate) fn new(value: u64) -> Self {
        Self(value)
    }

    /// Names an existing character by its numeric id, e.g. when parsing a
    /// command line argument. New ids are only ever minted by the store.
    pub fn from_value(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub backstory: String,
    #[serde(default)]
    pub role: CharacterRole,
    #[serde(default, rename = "type")]
    pub archetype: CharacterArchetype,
}

/// Payload for creating a character; the store assigns the id.
#[derive(Clone, Debug, Default)]
pub struct CharacterDraft {
    pub name: String,
    pub backstory: String,
    pub role: CharacterRole,
    pub archetype: CharacterArchetype,
}

#[derive(Clone, Debug, Default)]
pub struct CharacterUpdate {
    pub name: Option<String>,
    pub backstory: Option<String>,
    pub role: Option<CharacterRole>,
    pub archetype: Option<CharacterArchetype>,
}

impl CharacterUpdate {
    pub(crate) fn apply(self, character: &mut Character) {
        if let Some(name) = self.name {
            character.name = name;
        }
        if let Some(backstory) = self.backstory {
            character.backstory = backstory;
        }
        if let Some(role) = self.role {
            character.role = role;
        }
        if let Some(archetype) = self.archetype {
            character.archetype = archetype;
        }
    }
}

/// The user-entered book configuration. Field names follow the wire format
/// of the generation endpoints (camelCase JSON).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookData {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub tone: Tone,
    #[serde(default = "default_chapter_count")]
    pub chapters: u32,
    #[serde(default)]
    pub plot_summary: String,
    #[serde(default)]
    pub setting: String,
    #[serde(default)]
    pub world_description: String,
    #[serde(default)]
    pub characters: Vec<Character>,
}

fn default_chapter_count() -> u32 {
    DEFAULT_CHAPTER_COUNT
}

impl Default for BookData {
    fn default() -> Self {
        Self {
            title: String::new(),
            genre: String::new(),
            tone: Tone::default(),
            chapters: DEFAULT_CHAPTER_COUNT,
            plot_summary: String::new(),
            setting: String::new(),
            world_description: String::new(),
            characters: Vec::new(),
        }
    }
}

impl BookData {
    /// Checks the fields a generation request depends on. Title, genre and
    /// plot summary must be filled in and at least one chapter requested.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingField { field: "title" });
        }
        if self.genre.trim().is_empty() {
            return Err(ValidationError::MissingField { field: "genre" });
        }
        if self.plot_summary.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "plotSummary",
            });
        }
        if self.chapters == 0 {
            return Err(ValidationError::ChapterCount { count: 0 });
        }
        Ok(())
    }

    pub fn character(&self, id: CharacterId) -> Option<&Character> {
        self.characters.iter().find(|character| character.id == id)
    }
}

/// Field-wise merge into [`BookData`]. Absent fields are left untouched;
/// the chapter bound is checked before anything is applied.
#[derive(Clone, Debug, Default)]
pub struct BookUpdate {
    pub title: Option<String>,
    pub genre: Option<String>,
    pub tone: Option<Tone>,
    pub chapters: Option<u32>,
    pub plot_summary: Option<String>,
    pub setting: Option<String>,
    pub world_description: Option<String>,
}

impl BookUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.genre.is_none()
            && self.tone.is_none()
            && self.chapters.is_none()
            && self.plot_summary.is_none()
            && self.setting.is_none()
            && self.world_description.is_none()
    }

    pub(crate) fn apply(self, book: &mut BookData) -> Result<(), ValidationError> {
        if let Some(count) = self.chapters {
            if !(MIN_CHAPTER_COUNT..=MAX_CHAPTER_COUNT).contains(&count) {
                return Err(ValidationError::ChapterCount { count });
            }
        }

        if let Some(title) = self.title {
            book.title = title;
        }
        if let Some(genre) = self.genre {
            book.genre = genre;
        }
        if let Some(tone) = self.tone {
            book.tone = tone;
        }
        if let Some(count) = self.chapters {
            book.chapters = count;
        }
        if let Some(plot_summary) = self.plot_summary {
            book.plot_summary = plot_summary;
        }
        if let Some(setting) = self.setting {
            book.setting = setting;
        }
        if let Some(world_description) = self.world_description {
            book.world_description = world_description;
        }
        Ok(())
    }
}
