//! Single-line text field.
//!
//! Cursor positions are in chars, not bytes.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextField {
    value: String,
    cursor: usize,
}

impl TextField {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Replaces the content and moves the cursor to the end.
    pub fn set_text(&mut self, text: &str) {
        self.value.clear();
        self.cursor = 0;
        self.insert_str(text);
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Inserts at the cursor. Control characters (including newlines) are dropped.
    pub fn insert_str(&mut self, text: &str) {
        let filtered: String = text.chars().filter(|c| !c.is_control()).collect();
        if filtered.is_empty() {
            return;
        }
        let byte_idx = self.byte_index(self.cursor);
        self.value.insert_str(byte_idx, &filtered);
        self.cursor += filtered.chars().count();
    }

    pub fn insert_char(&mut self, ch: char) {
        let mut buf = [0u8; 4];
        self.insert_str(ch.encode_utf8(&mut buf));
    }

    pub fn delete_prev_char(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let start = self.byte_index(self.cursor - 1);
        let end = self.byte_index(self.cursor);
        self.value.replace_range(start..end, "");
        self.cursor -= 1;
    }

    pub fn delete_next_char(&mut self) {
        if self.cursor >= self.char_len() {
            return;
        }
        let start = self.byte_index(self.cursor);
        let end = self.byte_index(self.cursor + 1);
        self.value.replace_range(start..end, "");
    }

    /// Deletes everything before the cursor.
    pub fn delete_to_start(&mut self) {
        let end = self.byte_index(self.cursor);
        self.value.replace_range(..end, "");
        self.cursor = 0;
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.char_len());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_len();
    }

    /// Applies an editing key. Returns false if the key is not an edit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        // Windows reports AltGr as Ctrl+Alt; that combination types text.
        let alt_gr = ctrl && alt;

        match key.code {
            KeyCode::Char('a') if ctrl && !alt => self.move_home(),
            KeyCode::Char('e') if ctrl && !alt => self.move_end(),
            KeyCode::Char('u') if ctrl && !alt => self.delete_to_start(),
            KeyCode::Char(ch) if alt_gr || (!ctrl && !alt) => self.insert_char(ch),
            KeyCode::Backspace => self.delete_prev_char(),
            KeyCode::Delete => self.delete_next_char(),
            KeyCode::Left => self.move_left(),
            KeyCode::Right => self.move_right(),
            KeyCode::Home => self.move_home(),
            KeyCode::End => self.move_end(),
            _ => return false,
        }
        true
    }

    fn char_len(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_idx)
            .map_or(self.value.len(), |(idx, _)| idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_typing_and_backspace() {
        let mut field = TextField::default();
        for ch in "ada@x".chars() {
            assert!(field.handle_key(key(KeyCode::Char(ch))));
        }
        assert_eq!(field.value(), "ada@x");

        field.handle_key(key(KeyCode::Backspace));
        assert_eq!(field.value(), "ada@");
        assert_eq!(field.cursor(), 4);
    }

    #[test]
    fn test_insert_in_middle_with_multibyte_chars() {
        let mut field = TextField::default();
        field.set_text("jöe");
        field.move_left();
        field.move_left();
        field.insert_char('ü');
        assert_eq!(field.value(), "jüöe");

        field.delete_next_char();
        assert_eq!(field.value(), "jüe");
    }

    #[test]
    fn test_paste_drops_newlines() {
        let mut field = TextField::default();
        field.insert_str("ada@example.com\n");
        assert_eq!(field.value(), "ada@example.com");
        assert_eq!(field.cursor(), 15);
    }

    #[test]
    fn test_ctrl_u_clears_before_cursor() {
        let mut field = TextField::default();
        field.set_text("secret");
        field.move_left();
        field.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert_eq!(field.value(), "t");
        assert_eq!(field.cursor(), 0);
    }

    #[test]
    fn test_non_edit_keys_not_consumed() {
        let mut field = TextField::default();
        assert!(!field.handle_key(key(KeyCode::Tab)));
        assert!(!field.handle_key(key(KeyCode::Enter)));
        assert!(!field.handle_key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL
        )));
    }

    #[test]
    fn test_alt_gr_characters_are_typed() {
        let alt_gr = KeyModifiers::CONTROL | KeyModifiers::ALT;
        let mut field = TextField::default();
        field.set_text("ada");
        assert!(field.handle_key(KeyEvent::new(KeyCode::Char('@'), alt_gr)));
        // AltGr+E is the euro sign on many layouts, not "end of line".
        field.move_home();
        assert!(field.handle_key(KeyEvent::new(KeyCode::Char('€'), alt_gr)));
        assert_eq!(field.value(), "€ada@");

        assert!(!field.handle_key(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::ALT)));
        assert_eq!(field.value(), "€ada@");
    }

    #[test]
    fn test_cursor_bounds() {
        let mut field = TextField::default();
        field.move_left();
        assert_eq!(field.cursor(), 0);
        field.set_text("ab");
        field.move_right();
        assert_eq!(field.cursor(), 2);
        field.move_home();
        field.delete_prev_char();
        assert_eq!(field.value(), "ab");
    }
}
