// ── Simple text input with cursor ───────────────────────────────────────────

#[derive(Clone, Debug, Default)]
pub struct TextInput {
    pub value: String,
    pub cursor: usize, // byte position
}

impl TextInput {
    pub fn new() -> Self { Self::default() }

    /// Input prefilled with `value`, cursor at the end.
    pub fn with_value(value: &str) -> Self {
        Self { value: value.to_string(), cursor: value.len() }
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    pub fn insert_char(&mut self, c: char) {
        self.value.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn delete_char_before(&mut self) {
        if self.cursor == 0 { return; }
        let prev = self.prev_boundary();
        self.value.remove(prev);
        self.cursor = prev;
    }

    pub fn delete_char_after(&mut self) {
        if self.cursor >= self.value.len() { return; }
        self.value.remove(self.cursor);
    }

    pub fn move_left(&mut self) {
        self.cursor = self.prev_boundary();
    }

    pub fn move_right(&mut self) {
        if let Some(ch) = self.value[self.cursor..].chars().next() {
            self.cursor += ch.len_utf8();
        }
    }

    pub fn move_home(&mut self) { self.cursor = 0; }
    pub fn move_end(&mut self) { self.cursor = self.value.len(); }

    pub fn clear(&mut self) { self.value.clear(); self.cursor = 0; }

    pub fn trimmed(&self) -> &str {
        self.value.trim()
    }

    fn prev_boundary(&self) -> usize {
        self.value[..self.cursor]
            .char_indices().next_back().map(|(i, _)| i).unwrap_or(0)
    }

    /// Returns the wrapped row index of the cursor given an available inner width.
    /// Used to scroll the input box so the cursor is always visible.
    pub fn cursor_row(&self, inner_width: usize) -> u16 {
        if inner_width == 0 { return 0; }
        let before = &self.value[..self.cursor];
        let segments: Vec<&str> = before.split('\n').collect();
        let last = segments.len() - 1;
        let rows: usize = segments.iter().enumerate().map(|(i, seg)| {
            let n = seg.chars().count();
            if i < last {
                n.div_ceil(inner_width).max(1)
            } else {
                n / inner_width
            }
        }).sum();
        rows as u16
    }

    /// Returns (text_before_cursor, cursor_char_or_space, text_after_cursor)
    pub fn split_at_cursor(&self) -> (&str, &str, &str) {
        let before = &self.value[..self.cursor];
        match self.value[self.cursor..].chars().next() {
            None => (before, " ", ""),
            // keep the newline in the tail so line splitting stays intact
            Some('\n') => (before, " ", &self.value[self.cursor..]),
            Some(ch) => {
                let end = self.cursor + ch.len_utf8();
                (before, &self.value[self.cursor..end], &self.value[end..])
            }
        }
    }
}

// ── TextInput key handler ─────────────────────────────────────────────────────

/// Applies an editing key to `input`. Returns false when the key is not an editing key.
pub fn handle_text_input_key(input: &mut TextInput, key: crossterm::event::KeyEvent) -> bool {
    use crossterm::event::KeyCode;
    use crossterm::event::KeyModifiers;
    match key.code {
        KeyCode::Char(c) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            input.insert_char(c)
        }
        KeyCode::Backspace => input.delete_char_before(),
        KeyCode::Delete => input.delete_char_after(),
        KeyCode::Left => input.move_left(),
        KeyCode::Right => input.move_right(),
        KeyCode::Home => input.move_home(),
        KeyCode::End => input.move_end(),
        _ => return false,
    }
    true
}
