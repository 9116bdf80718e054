use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::book::UnknownVariant;

/// Story-structure tag attached to every outline by the generation service.
/// The wire form is kebab-case (`inciting-incident` etc.).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NarrativePhase {
    Opening,
    Setup,
    IncitingIncident,
    RisingAction,
    Midpoint,
    Complications,
    Crisis,
    Climax,
    Resolution,
}

impl NarrativePhase {
    pub const ALL: [Self; 9] = [
        NarrativePhase::Opening,
        NarrativePhase::Setup,
        NarrativePhase::IncitingIncident,
        NarrativePhase::RisingAction,
        NarrativePhase::Midpoint,
        NarrativePhase::Complications,
        NarrativePhase::Crisis,
        NarrativePhase::Climax,
        NarrativePhase::Resolution,
    ];

    pub fn label(self) -> &'static str {
        match self {
            NarrativePhase::Opening => "opening",
            NarrativePhase::Setup => "setup",
            NarrativePhase::IncitingIncident => "inciting-incident",
            NarrativePhase::RisingAction => "rising-action",
            NarrativePhase::Midpoint => "midpoint",
            NarrativePhase::Complications => "complications",
            NarrativePhase::Crisis => "crisis",
            NarrativePhase::Climax => "climax",
            NarrativePhase::Resolution => "resolution",
        }
    }
}

impl fmt::Display for NarrativePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for NarrativePhase {
    type Err = UnknownVariant;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let needle = input.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|phase| phase.label().eq_ignore_ascii_case(needle))
            .ok_or_else(|| {
                UnknownVariant::new("narrative phase", input, &Self::ALL.map(Self::label))
            })
    }
}

/// One chapter's planning record: what the chapter covers before any prose
/// exists. `content` may hold several paragraphs separated by blank lines.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChapterOutline {
    pub title: String,
    pub content: String,
    pub phase: NarrativePhase,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_uses_kebab_case_on_the_wire() {
        let outline = ChapterOutline {
            title: "The Call".into(),
            content: "The hero refuses.\n\nThen accepts.".into(),
            phase: NarrativePhase::IncitingIncident,
        };
        let json = serde_json::to_value(&outline).unwrap();
        assert_eq!(json["phase"], "inciting-incident");

        let parsed: ChapterOutline = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, outline);
    }

    #[test]
    fn unknown_phase_fails_to_parse() {
        let result = serde_json::from_str::<ChapterOutline>(
            r#"{"title":"t","content":"c","phase":"denouement"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn phase_from_str_accepts_labels() {
        assert_eq!(
            "rising-action".parse::<NarrativePhase>().unwrap(),
            NarrativePhase::RisingAction
        );
        assert!("prologue".parse::<NarrativePhase>().is_err());
    }
}
