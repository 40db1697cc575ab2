use crate::api::TOP_N;

pub const LOADING_LINE: &str = "Loading Steam charts…";

/// The current display lines and the rotation cursor over them.
///
/// A refresh builds a new `Dataset` and replaces the old one whole; nothing
/// edits `lines` in place, so a reader always sees one complete snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    lines: Vec<String>,
    cursor: Option<usize>,
}

impl Dataset {
    pub fn new(mut lines: Vec<String>) -> Self {
        lines.truncate(TOP_N);
        let cursor = if lines.is_empty() { None } else { Some(0) };
        Self { lines, cursor }
    }

    pub fn loading() -> Self {
        Self::new(vec![LOADING_LINE.to_string()])
    }

    pub fn current(&self) -> Option<&str> {
        self.cursor.map(|idx| self.lines[idx].as_str())
    }

    /// Advances the cursor with wrap-around and returns the newly selected
    /// line. Does nothing on an empty dataset.
    pub fn rotate(&mut self) -> Option<&str> {
        let cursor = self.cursor?;
        let next = (cursor + 1) % self.lines.len();
        self.cursor = Some(next);
        Some(self.lines[next].as_str())
    }

    #[cfg(test)]
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
