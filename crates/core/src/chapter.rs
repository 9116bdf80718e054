use serde::{Deserialize, Serialize};

/// Full prose for one book section. `chapter_number` is 1-based and always
/// equals the index of the outline it was expanded from, plus one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedChapter {
    pub title: String,
    pub content: String,
    pub chapter_number: u32,
}

impl GeneratedChapter {
    /// Zero-based position in the chapter sequence.
    pub fn index(&self) -> usize {
        self.chapter_number.saturating_sub(1) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chapter_number_uses_camel_case_key() {
        let chapter = GeneratedChapter {
            title: "The Call".into(),
            content: "Prose.".into(),
            chapter_number: 2,
        };
        let json = serde_json::to_value(&chapter).unwrap();
        assert_eq!(json["chapterNumber"], 2);
        assert_eq!(chapter.index(), 1);
    }
}
