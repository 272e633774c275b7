//! Platform-free tap-event engine.
//!
//! [`EdgeFilter`] is the single place that decides, for every intercepted
//! keyboard event, whether it is the configured hotkey's press edge, its
//! release edge, or unrelated traffic.  The platform backends only translate
//! OS events into [`TapEvent`]s and act on the returned [`Verdict`]; all of
//! the contract — edge dedup against key repeat, exact-mask modifier
//! matching, tap re-enable on OS disable — lives here where it can be unit
//! tested without an event tap.

use super::keys::{modifier_for_code, HotKey, Modifiers};
use super::HotkeyEvent;

// ---------------------------------------------------------------------------
// TapEvent / Verdict
// ---------------------------------------------------------------------------

/// A normalised keyboard event as seen by the interception layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapEvent {
    /// A non-modifier key went down.  Repeats while held arrive as further
    /// `KeyDown`s with the same code.
    KeyDown { code: u16 },
    /// A non-modifier key came up.
    KeyUp { code: u16 },
    /// A modifier key changed state.  `held` is the complete held-modifier
    /// subset after the change, as reported by the OS.
    ModifierFlags { code: u16, held: Modifiers },
    /// The OS disabled the tap (timeout or user-input storm).
    Disabled,
}

/// What the backend must do with the intercepted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Deliver the event to the rest of the system unchanged.
    Pass,
    /// Swallow the event and forward the edge to the coordinator.
    Consume(HotkeyEvent),
    /// Re-enable the tap immediately and pass the triggering event through.
    Resume,
}

// ---------------------------------------------------------------------------
// EdgeFilter
// ---------------------------------------------------------------------------

/// Edge-tracking matcher for exactly one [`HotKey`].
///
/// `pressed` guarantees at most one [`HotkeyEvent::Pressed`] per physical
/// press (key repeat causes no edge) and at most one
/// [`HotkeyEvent::Released`] per release, and orders them down-before-up
/// within a cycle.
#[derive(Debug)]
pub struct EdgeFilter {
    hotkey: HotKey,
    held: Modifiers,
    pressed: bool,
}

impl EdgeFilter {
    pub fn new(hotkey: HotKey) -> Self {
        Self {
            hotkey,
            held: Modifiers::NONE,
            pressed: false,
        }
    }

    /// The binding this filter matches.
    pub fn hotkey(&self) -> HotKey {
        self.hotkey
    }

    /// Whether the hotkey is currently held.
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Clear edge and modifier state.  Called when the tap stops so a
    /// restart never begins mid-press.
    pub fn reset(&mut self) {
        self.held = Modifiers::NONE;
        self.pressed = false;
    }

    /// Classify one intercepted event.
    pub fn process(&mut self, event: TapEvent) -> Verdict {
        match event {
            TapEvent::Disabled => Verdict::Resume,

            TapEvent::KeyDown { code } => {
                // The rdev backend reports modifier keys as ordinary key
                // events; keep the held set current either way.
                if let Some(m) = modifier_for_code(code) {
                    self.held.insert(m);
                }
                if !self.pressed && self.hotkey.matches(code, self.held) {
                    self.pressed = true;
                    Verdict::Consume(HotkeyEvent::Pressed)
                } else {
                    // Unrelated key, or OS key-repeat of a held hotkey —
                    // neither causes an edge, both pass through.
                    Verdict::Pass
                }
            }

            TapEvent::KeyUp { code } => {
                if let Some(m) = modifier_for_code(code) {
                    self.held.remove(m);
                }
                // Release matches on key code alone: the user may have let
                // go of the mask modifiers before the key itself.
                if self.pressed && code == self.hotkey.key_code {
                    self.pressed = false;
                    Verdict::Consume(HotkeyEvent::Released)
                } else {
                    Verdict::Pass
                }
            }

            TapEvent::ModifierFlags { code, held } => {
                let went_down = modifier_for_code(code)
                    .map(|m| held.contains(m))
                    .unwrap_or(false);
                self.held = held;

                // A modifier key can itself be the hotkey (e.g. right
                // option); its edges arrive only as flag changes.
                if code == self.hotkey.key_code {
                    if went_down && !self.pressed && self.hotkey.matches(code, held) {
                        self.pressed = true;
                        return Verdict::Consume(HotkeyEvent::Pressed);
                    }
                    if !went_down && self.pressed {
                        self.pressed = false;
                        return Verdict::Consume(HotkeyEvent::Released);
                    }
                }
                Verdict::Pass
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotkey::keys::codes;

    fn down(code: u16) -> TapEvent {
        TapEvent::KeyDown { code }
    }

    fn up(code: u16) -> TapEvent {
        TapEvent::KeyUp { code }
    }

    fn flags(code: u16, held: Modifiers) -> TapEvent {
        TapEvent::ModifierFlags { code, held }
    }

    // ---- Edge dedup --------------------------------------------------------

    /// Holding the key produces exactly one press edge despite OS repeats,
    /// and exactly one release edge.
    #[test]
    fn repeats_cause_no_second_edge_and_pass_through() {
        let mut f = EdgeFilter::new(HotKey::new(codes::F9, Modifiers::NONE));

        assert_eq!(f.process(down(codes::F9)), Verdict::Consume(HotkeyEvent::Pressed));
        assert_eq!(f.process(down(codes::F9)), Verdict::Pass);
        assert_eq!(f.process(down(codes::F9)), Verdict::Pass);
        assert_eq!(f.process(up(codes::F9)), Verdict::Consume(HotkeyEvent::Released));
        assert_eq!(f.process(up(codes::F9)), Verdict::Pass);
    }

    #[test]
    fn release_without_press_passes_through() {
        let mut f = EdgeFilter::new(HotKey::new(codes::F9, Modifiers::NONE));
        assert_eq!(f.process(up(codes::F9)), Verdict::Pass);
        assert!(!f.is_pressed());
    }

    #[test]
    fn unrelated_keys_pass_through() {
        let mut f = EdgeFilter::new(HotKey::new(codes::F9, Modifiers::NONE));
        assert_eq!(f.process(down(codes::SPACE)), Verdict::Pass);
        assert_eq!(f.process(up(codes::SPACE)), Verdict::Pass);
        assert!(!f.is_pressed());
    }

    // ---- Modifier-mask matching --------------------------------------------

    #[test]
    fn exact_mask_match_consumes() {
        let mut f = EdgeFilter::new(HotKey::new(codes::SPACE, Modifiers::CONTROL | Modifiers::SHIFT));

        assert_eq!(f.process(down(codes::CONTROL)), Verdict::Pass);
        assert_eq!(f.process(down(codes::SHIFT)), Verdict::Pass);
        assert_eq!(
            f.process(down(codes::SPACE)),
            Verdict::Consume(HotkeyEvent::Pressed)
        );
    }

    #[test]
    fn superset_of_mask_does_not_match() {
        let mut f = EdgeFilter::new(HotKey::new(codes::SPACE, Modifiers::CONTROL));

        assert_eq!(f.process(down(codes::CONTROL)), Verdict::Pass);
        assert_eq!(f.process(down(codes::COMMAND)), Verdict::Pass);
        // control+command held, mask is control alone — not a match.
        assert_eq!(f.process(down(codes::SPACE)), Verdict::Pass);
    }

    #[test]
    fn subset_of_mask_does_not_match() {
        let mut f = EdgeFilter::new(HotKey::new(codes::SPACE, Modifiers::CONTROL | Modifiers::SHIFT));
        assert_eq!(f.process(down(codes::CONTROL)), Verdict::Pass);
        assert_eq!(f.process(down(codes::SPACE)), Verdict::Pass);
    }

    /// A zero mask ignores the modifier state entirely: key 61 with command
    /// held still triggers.
    #[test]
    fn zero_mask_matches_with_extra_modifiers_held() {
        let mut f = EdgeFilter::new(HotKey::new(codes::RIGHT_OPTION, Modifiers::NONE));

        assert_eq!(f.process(flags(codes::COMMAND, Modifiers::COMMAND)), Verdict::Pass);
        assert_eq!(
            f.process(flags(
                codes::RIGHT_OPTION,
                Modifiers::COMMAND | Modifiers::OPTION
            )),
            Verdict::Consume(HotkeyEvent::Pressed)
        );
    }

    #[test]
    fn releasing_mask_modifiers_first_still_fires_release() {
        let mut f = EdgeFilter::new(HotKey::new(codes::SPACE, Modifiers::COMMAND));

        assert_eq!(f.process(down(codes::COMMAND)), Verdict::Pass);
        assert_eq!(
            f.process(down(codes::SPACE)),
            Verdict::Consume(HotkeyEvent::Pressed)
        );
        // Command released before the key itself.
        assert_eq!(f.process(up(codes::COMMAND)), Verdict::Pass);
        assert_eq!(
            f.process(up(codes::SPACE)),
            Verdict::Consume(HotkeyEvent::Released)
        );
    }

    // ---- Modifier keys as the hotkey ---------------------------------------

    /// Right option as the binding: both edges arrive via flag changes.
    #[test]
    fn modifier_hotkey_edges_via_flags() {
        let mut f = EdgeFilter::new(HotKey::new(codes::RIGHT_OPTION, Modifiers::NONE));

        assert_eq!(
            f.process(flags(codes::RIGHT_OPTION, Modifiers::OPTION)),
            Verdict::Consume(HotkeyEvent::Pressed)
        );
        assert!(f.is_pressed());
        assert_eq!(
            f.process(flags(codes::RIGHT_OPTION, Modifiers::NONE)),
            Verdict::Consume(HotkeyEvent::Released)
        );
        assert!(!f.is_pressed());
    }

    #[test]
    fn other_modifier_flag_changes_pass_through() {
        let mut f = EdgeFilter::new(HotKey::new(codes::RIGHT_OPTION, Modifiers::NONE));
        assert_eq!(f.process(flags(codes::SHIFT, Modifiers::SHIFT)), Verdict::Pass);
        assert_eq!(f.process(flags(codes::SHIFT, Modifiers::NONE)), Verdict::Pass);
    }

    // ---- Tap disable / reset -----------------------------------------------

    #[test]
    fn os_disable_requests_resume() {
        let mut f = EdgeFilter::new(HotKey::default());
        assert_eq!(f.process(TapEvent::Disabled), Verdict::Resume);
    }

    #[test]
    fn reset_clears_pressed_and_held_state() {
        let mut f = EdgeFilter::new(HotKey::new(codes::F9, Modifiers::NONE));
        let _ = f.process(down(codes::CONTROL));
        let _ = f.process(down(codes::F9));
        assert!(f.is_pressed());

        f.reset();
        assert!(!f.is_pressed());
        // After a reset the next press is a fresh edge.
        assert_eq!(f.process(down(codes::F9)), Verdict::Consume(HotkeyEvent::Pressed));
    }
}
