use thiserror::Error;

use crate::store::BookStore;

/// Lines occupied by a chapter heading block: the title, a blank separator,
/// and at least one line of prose. A heading is never left stranded without
/// room for this block.
const HEADING_BLOCK_LINES: usize = 3;

#[derive(Debug, Error)]
pub enum ManuscriptError {
    #[error("no generated chapters to export")]
    EmptyBook,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ManuscriptChapter {
    pub number: u32,
    pub title: String,
    pub content: String,
}

/// The finished book, assembled for export.
#[derive(Clone, Debug, PartialEq)]
pub struct Manuscript {
    pub title: String,
    pub author: String,
    pub chapters: Vec<ManuscriptChapter>,
}

/// Page geometry for the plain-text paginator.
#[derive(Clone, Copy, Debug)]
pub struct PageLayout {
    pub lines_per_page: usize,
    pub text_width: usize,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            lines_per_page: 54,
            text_width: 80,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    lines: Vec<String>,
}

impl Page {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl Manuscript {
    /// Assembles the manuscript from a store's generated chapters. Requires
    /// at least one chapter; partial books export fine.
    pub fn from_store(
        store: &BookStore,
        author: impl Into<String>,
    ) -> Result<Self, ManuscriptError> {
        if store.chapters().is_empty() {
            return Err(ManuscriptError::EmptyBook);
        }
        let title = store.book().title.trim();
        Ok(Self {
            title: if title.is_empty() {
                "Untitled Book".to_string()
            } else {
                title.to_string()
            },
            author: author.into(),
            chapters: store
                .chapters()
                .iter()
                .map(|chapter| ManuscriptChapter {
                    number: chapter.chapter_number,
                    title: chapter.title.clone(),
                    content: chapter.content.clone(),
                })
                .collect(),
        })
    }

    /// Flows the manuscript into pages. The title block opens the first
    /// page; a chapter heading starts a new page whenever the remaining
    /// space on the current one cannot fit the heading block.
    pub fn paginate(&self, layout: &PageLayout) -> Vec<Page> {
        let mut paginator = Paginator::new(layout.lines_per_page.max(HEADING_BLOCK_LINES));

        paginator.push_line(self.title.clone());
        if !self.author.trim().is_empty() {
            paginator.push_line(format!("By {}", self.author.trim()));
        }
        paginator.push_blank();

        for chapter in &self.chapters {
            paginator.ensure_room(HEADING_BLOCK_LINES);
            paginator.push_line(format!("Chapter {}: {}", chapter.number, chapter.title));
            paginator.push_blank();
            for line in wrap_text(&chapter.content, layout.text_width) {
                paginator.push_line(line);
            }
            paginator.push_blank();
        }

        paginator.finish()
    }

    /// Renders the paginated manuscript to a single string with form-feed
    /// page separators.
    pub fn render_plain(&self, layout: &PageLayout) -> String {
        let pages = self.paginate(layout);
        pages
            .iter()
            .map(|page| page.lines.join("\n"))
            .collect::<Vec<_>>()
            .join("\n\u{c}\n")
    }
}

struct Paginator {
    lines_per_page: usize,
    pages: Vec<Page>,
    current: Vec<String>,
}

impl Paginator {
    fn new(lines_per_page: usize) -> Self {
        Self {
            lines_per_page,
            pages: Vec::new(),
            current: Vec::new(),
        }
    }

    fn remaining(&self) -> usize {
        self.lines_per_page - self.current.len()
    }

    fn push_line(&mut self, line: String) {
        if self.current.len() >= self.lines_per_page {
            self.break_page();
        }
        self.current.push(line);
    }

    /// Blank lines are layout, not content: one is appended when there is
    /// room, and silently dropped at a page boundary.
    fn push_blank(&mut self) {
        if !self.current.is_empty() && self.current.len() < self.lines_per_page {
            self.current.push(String::new());
        }
    }

    fn ensure_room(&mut self, lines: usize) {
        if !self.current.is_empty() && self.remaining() < lines {
            self.break_page();
        }
    }

    fn break_page(&mut self) {
        if !self.current.is_empty() {
            self.pages.push(Page {
                lines: std::mem::take(&mut self.current),
            });
        }
    }

    fn finish(mut self) -> Vec<Page> {
        self.break_page();
        self.pages
    }
}

/// Greedy word wrap. Paragraph breaks in the input survive as blank lines;
/// a single word longer than the width gets its own line rather than being
/// split.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for (position, paragraph) in text.split('\n').enumerate() {
        let paragraph = paragraph.trim_end();
        if paragraph.trim().is_empty() {
            if position > 0 && lines.last().is_some_and(|last: &String| !last.is_empty()) {
                lines.push(String::new());
            }
            continue;
        }

        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current = word.to_string();
            } else if current.chars().count() + 1 + word.chars().count() <= width {
                current.push(' ');
                current.push_str(word);
            } else {
                lines.push(std::mem::take(&mut current));
                current = word.to_string();
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }

    while lines.last().is_some_and(|last| last.is_empty()) {
        lines.pop();
    }
    lines
}
