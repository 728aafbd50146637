use ratatui::text::Span;

/// Single-line question input with recall of earlier submissions.
///
/// The cursor is a char index. Every submitted line is returned verbatim;
/// only whitespace-only input is held back.
#[derive(Debug, Default)]
pub struct InputLine {
    text: String,
    cursor: usize,
    history: Vec<String>,
    history_pos: Option<usize>,
}

impl InputLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Display columns left of the cursor. Combining marks take no column.
    pub fn cursor_column(&self) -> usize {
        let end = self.byte_index(self.cursor);
        Span::raw(&self.text[..end]).width()
    }

    fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_index(&self, char_pos: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_pos)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    pub fn insert(&mut self, c: char) {
        let idx = self.byte_index(self.cursor);
        self.text.insert(idx, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            let idx = self.byte_index(self.cursor - 1);
            self.text.remove(idx);
            self.cursor -= 1;
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.char_count() {
            let idx = self.byte_index(self.cursor);
            self.text.remove(idx);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.char_count() {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_count();
    }

    /// Take the current line as a question, or `None` if it is blank.
    pub fn submit(&mut self) -> Option<String> {
        if self.text.trim().is_empty() {
            return None;
        }
        let question = std::mem::take(&mut self.text);
        self.cursor = 0;
        if self.history.last() != Some(&question) {
            self.history.push(question.clone());
        }
        self.history_pos = None;
        Some(question)
    }

    pub fn history_prev(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let pos = match self.history_pos {
            Some(0) => 0,
            Some(p) => p - 1,
            None => self.history.len() - 1,
        };
        self.history_pos = Some(pos);
        self.text = self.history[pos].clone();
        self.move_end();
    }

    pub fn history_next(&mut self) {
        match self.history_pos {
            Some(p) if p + 1 < self.history.len() => {
                self.history_pos = Some(p + 1);
                self.text = self.history[p + 1].clone();
            }
            Some(_) => {
                self.history_pos = None;
                self.text.clear();
            }
            None => {}
        }
        self.move_end();
    }
}
