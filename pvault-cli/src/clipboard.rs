use pvault_core::registry::Clipboard;

/// The system clipboard. Opened lazily so headless sessions only fail when copying.
#[derive(Default)]
pub struct ArboardClipboard {
    inner: Option<arboard::Clipboard>,
}

impl Clipboard for ArboardClipboard {
    type Error = arboard::Error;

    fn write_text(&mut self, text: &str) -> Result<(), Self::Error> {
        let clipboard = match &mut self.inner {
            Some(clipboard) => clipboard,
            None => self.inner.insert(arboard::Clipboard::new()?),
        };
        clipboard.set_text(text)
    }
}
