//! Paste-shortcut synthesis backed by the `enigo` crate.
//!
//! | Platform | Shortcut |
//! |----------|----------|
//! | macOS    | ⌘V (Meta + V) |
//! | Windows  | Ctrl+V |
//! | Linux    | Ctrl+V |

use enigo::{Direction, Enigo, Key, Keyboard, Settings};

use super::InjectError;

/// Send the OS paste chord to the currently focused window.
///
/// A fresh [`Enigo`] instance is created per call — `Enigo` is not `Send`
/// and is cheap to construct.
pub fn send_paste_chord() -> Result<(), InjectError> {
    let mut enigo =
        Enigo::new(&Settings::default()).map_err(|e| InjectError::KeySynthesis(e.to_string()))?;

    #[cfg(target_os = "macos")]
    {
        enigo
            .key(Key::Meta, Direction::Press)
            .map_err(|e| InjectError::KeySynthesis(e.to_string()))?;
        enigo
            .key(Key::Unicode('v'), Direction::Click)
            .map_err(|e| InjectError::KeySynthesis(e.to_string()))?;
        enigo
            .key(Key::Meta, Direction::Release)
            .map_err(|e| InjectError::KeySynthesis(e.to_string()))?;
    }

    #[cfg(not(target_os = "macos"))]
    {
        enigo
            .key(Key::Control, Direction::Press)
            .map_err(|e| InjectError::KeySynthesis(e.to_string()))?;
        enigo
            .key(Key::Unicode('v'), Direction::Click)
            .map_err(|e| InjectError::KeySynthesis(e.to_string()))?;
        enigo
            .key(Key::Control, Direction::Release)
            .map_err(|e| InjectError::KeySynthesis(e.to_string()))?;
    }

    Ok(())
}
