use crossterm::event::{Event, KeyEvent};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

/// Single-line text input with a label.
#[derive(Debug, Clone, Default)]
pub struct TextField {
    label: &'static str,
    input: Input,
}

impl TextField {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            input: Input::default(),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn value(&self) -> &str {
        self.input.value()
    }

    pub fn visual_cursor(&self) -> usize {
        self.input.visual_cursor()
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.input = Input::new(value.into());
    }

    pub fn reset(&mut self) {
        self.input.reset();
    }

    /// Feed a key to the input. Returns true when the value changed.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> bool {
        self.input
            .handle_event(&Event::Key(key))
            .map(|change| change.value)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn typing_and_backspace_change_value() {
        let mut field = TextField::new("Name");
        assert!(field.handle_key_event(key(KeyCode::Char('h'))));
        assert!(field.handle_key_event(key(KeyCode::Char('i'))));
        assert_eq!(field.value(), "hi");
        assert!(field.handle_key_event(key(KeyCode::Backspace)));
        assert_eq!(field.value(), "h");
        assert!(!field.handle_key_event(key(KeyCode::Left)));
        field.reset();
        assert_eq!(field.value(), "");
    }
}
