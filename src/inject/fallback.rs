//! Per-character key synthesis — the fallback when clipboard paste fails.
//!
//! Types the text into the focused window one key at a time, never touching
//! the clipboard.  Each character maps to a base key plus a shift flag
//! (US layout); characters with no mapping are skipped rather than failing
//! the whole insertion.  A small delay between keys keeps slow receivers
//! (terminal emulators, remote desktops) from dropping input.

use std::time::Duration;

use enigo::{Direction, Enigo, Key, Keyboard, Settings};

use super::InjectError;

// ---------------------------------------------------------------------------
// Character mapping
// ---------------------------------------------------------------------------

/// Map a character to the key to press and whether shift must be held.
///
/// Follows the US keyboard layout: uppercase letters and the shifted
/// punctuation row resolve to their base key with `shift = true`.  Returns
/// `None` for characters that have no single-key representation (accented
/// letters, emoji, …) — those are skipped by [`type_text`].
pub fn key_for_char(c: char) -> Option<(Key, bool)> {
    match c {
        'a'..='z' | '0'..='9' => Some((Key::Unicode(c), false)),
        'A'..='Z' => Some((Key::Unicode(c.to_ascii_lowercase()), true)),

        ' ' => Some((Key::Space, false)),
        '\n' => Some((Key::Return, false)),
        '\t' => Some((Key::Tab, false)),

        // Unshifted punctuation.
        '-' | '=' | '[' | ']' | '\\' | ';' | '\'' | ',' | '.' | '/' | '`' => {
            Some((Key::Unicode(c), false))
        }

        // Shifted punctuation row and friends.
        '!' => Some((Key::Unicode('1'), true)),
        '@' => Some((Key::Unicode('2'), true)),
        '#' => Some((Key::Unicode('3'), true)),
        '$' => Some((Key::Unicode('4'), true)),
        '%' => Some((Key::Unicode('5'), true)),
        '^' => Some((Key::Unicode('6'), true)),
        '&' => Some((Key::Unicode('7'), true)),
        '*' => Some((Key::Unicode('8'), true)),
        '(' => Some((Key::Unicode('9'), true)),
        ')' => Some((Key::Unicode('0'), true)),
        '_' => Some((Key::Unicode('-'), true)),
        '+' => Some((Key::Unicode('='), true)),
        '{' => Some((Key::Unicode('['), true)),
        '}' => Some((Key::Unicode(']'), true)),
        '|' => Some((Key::Unicode('\\'), true)),
        ':' => Some((Key::Unicode(';'), true)),
        '"' => Some((Key::Unicode('\''), true)),
        '<' => Some((Key::Unicode(','), true)),
        '>' => Some((Key::Unicode('.'), true)),
        '?' => Some((Key::Unicode('/'), true)),
        '~' => Some((Key::Unicode('`'), true)),

        _ => None,
    }
}

// ---------------------------------------------------------------------------
// type_text
// ---------------------------------------------------------------------------

/// Type `text` into the focused window, key by key.
///
/// Unmapped characters are skipped with a debug log.  Key synthesis errors
/// abort the remainder — half-typed output plus an error beats silently
/// eating the rest of the transcript.
pub fn type_text(text: &str, inter_key_delay: Duration) -> Result<(), InjectError> {
    let mut enigo =
        Enigo::new(&Settings::default()).map_err(|e| InjectError::KeySynthesis(e.to_string()))?;

    for c in text.chars() {
        let Some((key, shift)) = key_for_char(c) else {
            log::debug!("skipping character with no key mapping: {c:?}");
            continue;
        };

        if shift {
            enigo
                .key(Key::Shift, Direction::Press)
                .map_err(|e| InjectError::KeySynthesis(e.to_string()))?;
        }

        // Click is a key-down immediately followed by key-up.
        let tapped = enigo.key(key, Direction::Click);

        if shift {
            // Always lift shift, even when the tap failed.
            let _ = enigo.key(Key::Shift, Direction::Release);
        }

        tapped.map_err(|e| InjectError::KeySynthesis(e.to_string()))?;

        if !inter_key_delay.is_zero() {
            std::thread::sleep(inter_key_delay);
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
