//! Reading the text to type from the system clipboard via `arboard`.

use arboard::Clipboard;

/// Current clipboard text with line endings normalized.
///
/// `None` when there is nothing to type: the clipboard is empty, holds non-text data, or
/// cannot be opened at all.
pub fn read_clipboard_text() -> Option<String> {
    text_from(Clipboard::new().and_then(|mut clipboard| clipboard.get_text()))
}

fn text_from(read: Result<String, arboard::Error>) -> Option<String> {
    match read {
        Ok(text) if !text.is_empty() => Some(normalize_newlines(&text)),
        Ok(_) => None,
        Err(e) => {
            log::warn!("no clipboard text: {e}");
            None
        }
    }
}

/// Turns `\r\n` and lone `\r` into `\n`, the only line break the keyboard sends.
pub fn normalize_newlines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\r' {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            out.push('\n');
        } else {
            out.push(c);
        }
    }
    out
}
