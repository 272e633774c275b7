//! Key codes, modifier sets, and the hotkey matching rule.
//!
//! Key codes use the Carbon `kVK_*` numbering (the values reported by the
//! macOS event tap).  The rdev fallback backend translates its own key enum
//! into the same space, so a [`HotKey`] value means the same thing on every
//! platform and the matching logic stays in one place.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

// ---------------------------------------------------------------------------
// Key code constants (kVK_* numbering)
// ---------------------------------------------------------------------------

/// Virtual key codes for the keys that commonly serve as push-to-talk
/// bindings, plus the modifier keys the filter must recognise.
pub mod codes {
    pub const RETURN: u16 = 0x24;
    pub const TAB: u16 = 0x30;
    pub const SPACE: u16 = 0x31;
    pub const ESCAPE: u16 = 0x35;

    pub const COMMAND: u16 = 0x37;
    pub const RIGHT_COMMAND: u16 = 0x36;
    pub const SHIFT: u16 = 0x38;
    pub const RIGHT_SHIFT: u16 = 0x3C;
    pub const CAPS_LOCK: u16 = 0x39;
    pub const OPTION: u16 = 0x3A;
    pub const RIGHT_OPTION: u16 = 0x3D;
    pub const CONTROL: u16 = 0x3B;
    pub const RIGHT_CONTROL: u16 = 0x3E;
    pub const FUNCTION: u16 = 0x3F;

    pub const F1: u16 = 0x7A;
    pub const F2: u16 = 0x78;
    pub const F3: u16 = 0x63;
    pub const F4: u16 = 0x76;
    pub const F5: u16 = 0x60;
    pub const F6: u16 = 0x61;
    pub const F7: u16 = 0x62;
    pub const F8: u16 = 0x64;
    pub const F9: u16 = 0x65;
    pub const F10: u16 = 0x6D;
    pub const F11: u16 = 0x67;
    pub const F12: u16 = 0x6F;
}

// ---------------------------------------------------------------------------
// Modifiers
// ---------------------------------------------------------------------------

/// The four modifier keys a hotkey mask may name.
///
/// Caps lock and the fn/globe key are deliberately outside this set: the
/// matching rule only looks at {control, option, shift, command}.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers(u8);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const CONTROL: Modifiers = Modifiers(1 << 0);
    pub const OPTION: Modifiers = Modifiers(1 << 1);
    pub const SHIFT: Modifiers = Modifiers(1 << 2);
    pub const COMMAND: Modifiers = Modifiers(1 << 3);

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Modifiers) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Modifiers) {
        self.0 &= !other.0;
    }
}

impl BitOr for Modifiers {
    type Output = Modifiers;
    fn bitor(self, rhs: Modifiers) -> Modifiers {
        Modifiers(self.0 | rhs.0)
    }
}

impl BitOrAssign for Modifiers {
    fn bitor_assign(&mut self, rhs: Modifiers) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "Modifiers(none)");
        }
        let mut names = Vec::new();
        if self.contains(Modifiers::CONTROL) {
            names.push("control");
        }
        if self.contains(Modifiers::OPTION) {
            names.push("option");
        }
        if self.contains(Modifiers::SHIFT) {
            names.push("shift");
        }
        if self.contains(Modifiers::COMMAND) {
            names.push("command");
        }
        write!(f, "Modifiers({})", names.join("|"))
    }
}

/// The modifier bit a physical modifier key contributes, or `None` for
/// non-modifier keys.  Left and right variants map to the same bit.
pub fn modifier_for_code(code: u16) -> Option<Modifiers> {
    match code {
        codes::SHIFT | codes::RIGHT_SHIFT => Some(Modifiers::SHIFT),
        codes::CONTROL | codes::RIGHT_CONTROL => Some(Modifiers::CONTROL),
        codes::OPTION | codes::RIGHT_OPTION => Some(Modifiers::OPTION),
        codes::COMMAND | codes::RIGHT_COMMAND => Some(Modifiers::COMMAND),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// HotKey
// ---------------------------------------------------------------------------

/// The configured push-to-talk binding: a key code plus a modifier mask.
///
/// An immutable value — reconfiguration replaces the whole `HotKey` and
/// requires the filter to be stopped and restarted; the mask is never edited
/// while a tap is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotKey {
    pub key_code: u16,
    pub modifiers: Modifiers,
}

impl HotKey {
    pub fn new(key_code: u16, modifiers: Modifiers) -> Self {
        Self { key_code, modifiers }
    }

    /// Whether a key event matches this binding.
    ///
    /// The key code must be equal, and either the configured mask is empty or
    /// the currently-held modifier subset equals the mask **exactly** — a
    /// superset never matches.
    ///
    /// An empty mask matches regardless of held modifiers, so a bare
    /// right-option binding still fires while command happens to be held.
    /// That permissiveness is intentional and pending product review; do not
    /// tighten it here.
    pub fn matches(&self, key_code: u16, held: Modifiers) -> bool {
        self.key_code == key_code && (self.modifiers.is_empty() || held == self.modifiers)
    }
}

impl Default for HotKey {
    /// Right option, no mask — a key nothing types with, ideal for
    /// push-to-talk.
    fn default() -> Self {
        Self::new(codes::RIGHT_OPTION, Modifiers::NONE)
    }
}

// ---------------------------------------------------------------------------
// Key-name parsing (settings file)
// ---------------------------------------------------------------------------

/// Parse a key name from the settings file into a key code.
///
/// Returns `None` for unrecognised names so callers can fall back to the
/// default binding and surface a warning.
pub fn parse_key_name(name: &str) -> Option<u16> {
    match name {
        "F1" => Some(codes::F1),
        "F2" => Some(codes::F2),
        "F3" => Some(codes::F3),
        "F4" => Some(codes::F4),
        "F5" => Some(codes::F5),
        "F6" => Some(codes::F6),
        "F7" => Some(codes::F7),
        "F8" => Some(codes::F8),
        "F9" => Some(codes::F9),
        "F10" => Some(codes::F10),
        "F11" => Some(codes::F11),
        "F12" => Some(codes::F12),

        "Space" => Some(codes::SPACE),
        "Return" | "Enter" => Some(codes::RETURN),
        "Tab" => Some(codes::TAB),
        "Escape" | "Esc" => Some(codes::ESCAPE),

        "Option" | "Alt" => Some(codes::OPTION),
        "RightOption" | "RightAlt" => Some(codes::RIGHT_OPTION),
        "Command" | "Cmd" | "Meta" => Some(codes::COMMAND),
        "RightCommand" | "RightCmd" => Some(codes::RIGHT_COMMAND),
        "Control" | "Ctrl" => Some(codes::CONTROL),
        "RightControl" | "RightCtrl" => Some(codes::RIGHT_CONTROL),
        "Shift" => Some(codes::SHIFT),
        "RightShift" => Some(codes::RIGHT_SHIFT),

        _ => None,
    }
}

/// Parse a full binding string such as `"RightOption"`, `"F9"` or
/// `"Cmd+Shift+Space"` into a [`HotKey`].
///
/// Everything before the last `+`-separated token must be a modifier name;
/// the last token is the key itself.
pub fn parse_hotkey(binding: &str) -> Option<HotKey> {
    let mut mask = Modifiers::NONE;
    let mut parts = binding.split('+').map(str::trim).peekable();

    while let Some(part) = parts.next() {
        if parts.peek().is_none() {
            // Last token: the key.
            return parse_key_name(part).map(|code| HotKey::new(code, mask));
        }
        match part {
            "Ctrl" | "Control" => mask |= Modifiers::CONTROL,
            "Opt" | "Option" | "Alt" => mask |= Modifiers::OPTION,
            "Shift" => mask |= Modifiers::SHIFT,
            "Cmd" | "Command" | "Meta" => mask |= Modifiers::COMMAND,
            _ => return None,
        }
    }

    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- Modifiers ---------------------------------------------------------

    #[test]
    fn modifier_set_operations() {
        let mut m = Modifiers::NONE;
        assert!(m.is_empty());

        m.insert(Modifiers::SHIFT);
        m |= Modifiers::COMMAND;
        assert!(m.contains(Modifiers::SHIFT));
        assert!(m.contains(Modifiers::COMMAND));
        assert!(!m.contains(Modifiers::CONTROL));

        m.remove(Modifiers::SHIFT);
        assert!(!m.contains(Modifiers::SHIFT));
        assert!(m.contains(Modifiers::COMMAND));
    }

    #[test]
    fn modifier_debug_lists_names() {
        let m = Modifiers::CONTROL | Modifiers::SHIFT;
        assert_eq!(format!("{m:?}"), "Modifiers(control|shift)");
        assert_eq!(format!("{:?}", Modifiers::NONE), "Modifiers(none)");
    }

    #[test]
    fn left_and_right_variants_share_a_bit() {
        assert_eq!(modifier_for_code(codes::SHIFT), Some(Modifiers::SHIFT));
        assert_eq!(modifier_for_code(codes::RIGHT_SHIFT), Some(Modifiers::SHIFT));
        assert_eq!(modifier_for_code(codes::RIGHT_OPTION), Some(Modifiers::OPTION));
        assert_eq!(modifier_for_code(codes::F9), None);
        assert_eq!(modifier_for_code(codes::CAPS_LOCK), None);
    }

    // ---- HotKey::matches ---------------------------------------------------

    #[test]
    fn empty_mask_matches_any_modifier_state() {
        // Right option (key 61) with no mask: a bare press matches, and so
        // does a press with command held — the empty mask ignores modifiers.
        let hk = HotKey::new(codes::RIGHT_OPTION, Modifiers::NONE);
        assert!(hk.matches(codes::RIGHT_OPTION, Modifiers::NONE));
        assert!(hk.matches(codes::RIGHT_OPTION, Modifiers::COMMAND));
        assert!(!hk.matches(codes::F9, Modifiers::NONE));
    }

    #[test]
    fn non_empty_mask_requires_exact_equality() {
        let hk = HotKey::new(codes::SPACE, Modifiers::CONTROL | Modifiers::SHIFT);
        assert!(hk.matches(codes::SPACE, Modifiers::CONTROL | Modifiers::SHIFT));
        // Subset: no.
        assert!(!hk.matches(codes::SPACE, Modifiers::CONTROL));
        // Superset: also no.
        assert!(!hk.matches(
            codes::SPACE,
            Modifiers::CONTROL | Modifiers::SHIFT | Modifiers::COMMAND
        ));
    }

    #[test]
    fn hotkey_equality_is_by_field() {
        let a = HotKey::new(codes::F9, Modifiers::COMMAND);
        let b = HotKey::new(codes::F9, Modifiers::COMMAND);
        let c = HotKey::new(codes::F9, Modifiers::NONE);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    // ---- Parsing -----------------------------------------------------------

    #[test]
    fn parse_plain_key_names() {
        assert_eq!(parse_key_name("F9"), Some(codes::F9));
        assert_eq!(parse_key_name("RightOption"), Some(codes::RIGHT_OPTION));
        assert_eq!(parse_key_name("Esc"), Some(codes::ESCAPE));
        assert_eq!(parse_key_name("xyz"), None);
    }

    #[test]
    fn parse_hotkey_with_modifiers() {
        let hk = parse_hotkey("Cmd+Shift+Space").unwrap();
        assert_eq!(hk.key_code, codes::SPACE);
        assert_eq!(hk.modifiers, Modifiers::COMMAND | Modifiers::SHIFT);
    }

    #[test]
    fn parse_hotkey_without_modifiers() {
        let hk = parse_hotkey("RightOption").unwrap();
        assert_eq!(hk, HotKey::default());
    }

    #[test]
    fn parse_hotkey_rejects_garbage() {
        assert_eq!(parse_hotkey(""), None);
        assert_eq!(parse_hotkey("Hyper+F9"), None);
        assert_eq!(parse_hotkey("Cmd+NotAKey"), None);
    }
}
