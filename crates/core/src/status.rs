use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::book::UnknownVariant;

/// Where the generation state machine currently sits.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum GenerationStep {
    #[default]
    Idle,
    Outlines,
    OutlinesComplete,
    Chapters,
    Waiting,
    Complete,
    Error,
}

impl GenerationStep {
    pub fn label(self) -> &'static str {
        match self {
            GenerationStep::Idle => "idle",
            GenerationStep::Outlines => "outlines",
            GenerationStep::OutlinesComplete => "outlines-complete",
            GenerationStep::Chapters => "chapters",
            GenerationStep::Waiting => "waiting",
            GenerationStep::Complete => "complete",
            GenerationStep::Error => "error",
        }
    }
}

impl fmt::Display for GenerationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether `generate book` runs every remaining chapter in one sequential
/// pass or stops after each chapter for review.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    #[default]
    Manual,
    Auto,
}

impl GenerationMode {
    pub fn label(self) -> &'static str {
        match self {
            GenerationMode::Manual => "manual",
            GenerationMode::Auto => "auto",
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GenerationMode {
    type Err = UnknownVariant;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(GenerationMode::Manual),
            "auto" => Ok(GenerationMode::Auto),
            _ => Err(UnknownVariant::new(
                "generation mode",
                input,
                &["manual", "auto"],
            )),
        }
    }
}

/// Live progress record for the active book session. Transient: it is never
/// persisted and reinitializes to idle on load.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenerationStatus {
    pub is_generating: bool,
    pub current_step: GenerationStep,
    pub progress: u8,
    pub current_chapter: u32,
    pub total_chapters: u32,
    pub error: Option<String>,
}

impl GenerationStatus {
    pub fn idle() -> Self {
        Self::default()
    }
}

/// Partial status update. Only the fields set on the patch are written into
/// the status; everything else keeps its current value.
#[derive(Clone, Debug, Default)]
pub struct StatusPatch {
    is_generating: Option<bool>,
    current_step: Option<GenerationStep>,
    progress: Option<u8>,
    current_chapter: Option<u32>,
    total_chapters: Option<u32>,
    error: Option<Option<String>>,
}

impl StatusPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generating(mut self, value: bool) -> Self {
        self.is_generating = Some(value);
        self
    }

    pub fn step(mut self, step: GenerationStep) -> Self {
        self.current_step = Some(step);
        self
    }

    pub fn progress(mut self, percent: u8) -> Self {
        self.progress = Some(percent.min(100));
        self
    }

    pub fn chapter(mut self, number: u32) -> Self {
        self.current_chapter = Some(number);
        self
    }

    pub fn total(mut self, count: u32) -> Self {
        self.total_chapters = Some(count);
        self
    }

    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(Some(message.into()));
        self
    }

    pub fn clear_error(mut self) -> Self {
        self.error = Some(None);
        self
    }

    pub fn apply(self, status: &mut GenerationStatus) {
        if let Some(value) = self.is_generating {
            status.is_generating = value;
        }
        if let Some(step) = self.current_step {
            status.current_step = step;
        }
        if let Some(percent) = self.progress {
            status.progress = percent;
        }
        if let Some(number) = self.current_chapter {
            status.current_chapter = number;
        }
        if let Some(count) = self.total_chapters {
            status.total_chapters = count;
        }
        if let Some(error) = self.error {
            status.error = error;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_merges_only_set_fields() {
        let mut status = GenerationStatus {
            is_generating: true,
            current_step: GenerationStep::Chapters,
            progress: 40,
            current_chapter: 3,
            total_chapters: 5,
            error: Some("stale".into()),
        };

        StatusPatch::new()
            .progress(60)
            .chapter(4)
            .clear_error()
            .apply(&mut status);

        assert!(status.is_generating);
        assert_eq!(status.current_step, GenerationStep::Chapters);
        assert_eq!(status.progress, 60);
        assert_eq!(status.current_chapter, 4);
        assert_eq!(status.total_chapters, 5);
        assert_eq!(status.error, None);
    }

    #[test]
    fn progress_saturates_at_one_hundred() {
        let mut status = GenerationStatus::idle();
        StatusPatch::new().progress(250).apply(&mut status);
        assert_eq!(status.progress, 100);
    }

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!(
            "AUTO".parse::<GenerationMode>().unwrap(),
            GenerationMode::Auto
        );
        assert!("batch".parse::<GenerationMode>().is_err());
    }
}
