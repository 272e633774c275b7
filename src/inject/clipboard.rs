//! Clipboard snapshot/restore backed by the `arboard` crate.
//!
//! The clipboard is a system-wide resource the paste strategy borrows for
//! one insertion attempt.  [`ClipboardSnapshot`] captures whatever string
//! content the user had before the attempt and puts it back afterwards —
//! restoration is the caller's obligation regardless of whether the paste
//! itself succeeded.
//!
//! Each operation opens a fresh `arboard::Clipboard` handle: the handle is
//! cheap to create and is not `Send` on every platform, so sharing one
//! across calls buys nothing.

use arboard::Clipboard;

use super::InjectError;

// ---------------------------------------------------------------------------
// ClipboardSnapshot
// ---------------------------------------------------------------------------

/// The clipboard's string content at one point in time.
///
/// `None` content means the clipboard was empty or held non-text data (an
/// image, say); restoring such a snapshot intentionally leaves the clipboard
/// alone rather than clearing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardSnapshot {
    contents: Option<String>,
}

impl ClipboardSnapshot {
    /// Capture the current clipboard text.
    ///
    /// An empty or non-text clipboard is not an error — it captures as
    /// `None`.  Only failure to open the OS clipboard at all is reported.
    pub fn capture() -> Result<Self, InjectError> {
        let mut clipboard = open()?;
        Ok(Self {
            contents: clipboard.get_text().ok(),
        })
    }

    /// Put the captured content back.
    ///
    /// Consumes the snapshot — it is only meaningful for the insertion
    /// attempt it was taken for.
    pub fn restore(self) -> Result<(), InjectError> {
        match self.contents {
            Some(text) => write_text(&text),
            None => Ok(()),
        }
    }

    /// The captured text, if any.
    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }
}

// ---------------------------------------------------------------------------
// write_text
// ---------------------------------------------------------------------------

/// Replace the clipboard's content with `text`.
pub fn write_text(text: &str) -> Result<(), InjectError> {
    let mut clipboard = open()?;
    clipboard
        .set_text(text)
        .map_err(|e| InjectError::ClipboardWrite(e.to_string()))
}

fn open() -> Result<Clipboard, InjectError> {
    Clipboard::new().map_err(|e| InjectError::ClipboardAccess(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Restoring an empty snapshot must not touch the clipboard and must
    /// succeed unconditionally.
    #[test]
    fn restoring_absent_content_is_a_quiet_success() {
        let snapshot = ClipboardSnapshot { contents: None };
        assert!(snapshot.restore().is_ok());
    }

    #[test]
    fn snapshot_exposes_its_contents() {
        let snapshot = ClipboardSnapshot {
            contents: Some("kept".into()),
        };
        assert_eq!(snapshot.contents(), Some("kept"));
    }
}
