//! Global keyboard shortcuts of the vault screen.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPress {
    /// The produced character, e.g. `/`.
    pub key: String,
    /// The physical key, e.g. `KeyC`. Layout independent.
    pub code: String,
    pub alt: bool,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    /// An IME composition is in progress.
    pub composing: bool,
    /// Focus is inside a text input, text area, select or editable region.
    pub in_editable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    /// `/` moves focus to the search box and selects its text.
    FocusSearch,
    /// Alt+C copies the rendered prompt.
    CopyRendered,
}

pub fn shortcut_for(press: &KeyPress) -> Option<Shortcut> {
    if press.composing || press.in_editable {
        return None;
    }
    if press.key == "/" && !press.meta && !press.ctrl && !press.alt && !press.shift {
        return Some(Shortcut::FocusSearch);
    }
    if press.code == "KeyC" && press.alt && !press.meta && !press.ctrl {
        return Some(Shortcut::CopyRendered);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key: &str) -> KeyPress {
        KeyPress {
            key: key.to_string(),
            ..KeyPress::default()
        }
    }

    #[test]
    fn test_slash_focuses_search() {
        assert_eq!(shortcut_for(&key("/")), Some(Shortcut::FocusSearch));
        let with_ctrl = KeyPress { ctrl: true, ..key("/") };
        assert_eq!(shortcut_for(&with_ctrl), None);
    }

    #[test]
    fn test_alt_c_copies_regardless_of_layout() {
        let press = KeyPress {
            key: "ç".to_string(),
            code: "KeyC".to_string(),
            alt: true,
            ..KeyPress::default()
        };
        assert_eq!(shortcut_for(&press), Some(Shortcut::CopyRendered));
    }

    #[test]
    fn test_ignored_while_typing() {
        let typing = KeyPress { in_editable: true, ..key("/") };
        assert_eq!(shortcut_for(&typing), None);
        let composing = KeyPress { composing: true, ..key("/") };
        assert_eq!(shortcut_for(&composing), None);
    }
}
