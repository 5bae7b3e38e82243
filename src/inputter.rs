use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::trace;

/// Single line text editor backing one form field. The cursor counts chars,
/// not bytes.
#[derive(Debug, Default, Clone)]
pub struct Inputter {
    current_input: String,
    cursor_pos: usize,
}

impl Inputter {
    pub fn with_text(s: &str) -> Self {
        let mut input = Self::default();
        input.set(s);
        input
    }

    /// Apply an editing key. Returns false for keys the editor does not use.
    pub fn read(&mut self, key: KeyEvent) -> bool {
        match (key.code, key.modifiers) {
            (KeyCode::Backspace, _) => self.backspace(),
            (KeyCode::Delete, _) => self.delete(),
            (KeyCode::Left, KeyModifiers::NONE) => self.left(),
            (KeyCode::Right, KeyModifiers::NONE) => self.right(),
            (KeyCode::Home, _) => self.cursor_pos = 0,
            (KeyCode::End, _) => self.cursor_pos = self.char_len(),
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => self.clear(),
            (KeyCode::Char(chr), KeyModifiers::NONE | KeyModifiers::SHIFT) => self.insert(chr),
            (code, modifiers) => {
                trace!("Inputter ignores {code:?} {modifiers:?}");
                return false;
            }
        }
        true
    }

    pub fn set(&mut self, s: &str) {
        self.current_input = s.to_string();
        self.cursor_pos = self.char_len();
    }

    pub fn text(&self) -> &str {
        &self.current_input
    }

    pub fn cursor(&self) -> usize {
        self.cursor_pos
    }

    fn clear(&mut self) {
        self.current_input.clear();
        self.cursor_pos = 0;
    }

    fn insert(&mut self, chr: char) {
        let at = self.byte_pos(self.cursor_pos);
        self.current_input.insert(at, chr);
        self.cursor_pos += 1;
    }

    fn backspace(&mut self) {
        if self.cursor_pos > 0 {
            self.cursor_pos -= 1;
            let at = self.byte_pos(self.cursor_pos);
            self.current_input.remove(at);
        }
    }

    fn delete(&mut self) {
        if self.cursor_pos < self.char_len() {
            let at = self.byte_pos(self.cursor_pos);
            self.current_input.remove(at);
        }
    }

    fn left(&mut self) {
        self.cursor_pos = self.cursor_pos.saturating_sub(1);
    }

    fn right(&mut self) {
        if self.cursor_pos < self.char_len() {
            self.cursor_pos += 1;
        }
    }

    fn char_len(&self) -> usize {
        self.current_input.chars().count()
    }

    fn byte_pos(&self, char_pos: usize) -> usize {
        self.current_input
            .char_indices()
            .nth(char_pos)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.current_input.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(input: &mut Inputter, s: &str) {
        for c in s.chars() {
            input.read(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn inserts_at_cursor() {
        let mut input = Inputter::default();
        type_str(&mut input, "ac");
        input.read(key(KeyCode::Left));
        type_str(&mut input, "b");
        assert_eq!(input.text(), "abc");
        assert_eq!(input.cursor(), 2);
    }

    #[test]
    fn backspace_removes_before_cursor() {
        let mut input = Inputter::with_text("añb");
        input.read(key(KeyCode::Left));
        input.read(key(KeyCode::Backspace));
        assert_eq!(input.text(), "ab");
        assert_eq!(input.cursor(), 1);
        input.read(key(KeyCode::Home));
        input.read(key(KeyCode::Backspace));
        assert_eq!(input.text(), "ab");
        input.read(key(KeyCode::Delete));
        assert_eq!(input.text(), "b");
    }

    #[test]
    fn ignores_navigation_keys() {
        let mut input = Inputter::default();
        assert!(!input.read(key(KeyCode::Enter)));
        assert!(!input.read(key(KeyCode::Tab)));
        assert!(input.read(KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT)));
        assert_eq!(input.text(), "A");
    }

    #[test]
    fn ctrl_u_clears_the_line() {
        let mut input = Inputter::with_text("Linsley");
        assert!(input.read(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL)));
        assert_eq!(input.text(), "");
        assert_eq!(input.cursor(), 0);
    }
}
