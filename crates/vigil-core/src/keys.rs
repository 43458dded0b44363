//! Key-combo forwarding policy.
//!
//! OS key repeat floods the capture path with identical key-down signals;
//! the controller forwards a key event only when it is a real combination
//! and differs from the immediately preceding forwarded one.

use crate::types::KeyComboData;

/// Physical codes of bare modifier keys. Pressing one of these alone is
/// never a combination.
pub const MODIFIER_CODES: &[&str] = &[
    "ShiftLeft",
    "ShiftRight",
    "ControlLeft",
    "ControlRight",
    "AltLeft",
    "AltRight",
    "MetaLeft",
    "MetaRight",
];

/// Function-row keys (F1..F24) count as combinations even without a
/// modifier held.
fn is_function_row(code: &str) -> bool {
    let Some(rest) = code.strip_prefix('F') else {
        return false;
    };
    !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit())
}

/// A key event is forwardable when a modifier is held or it is a
/// function-row key, and it is not a bare modifier press by itself.
pub fn is_key_combination(event: &KeyComboData) -> bool {
    let has_modifier = event.shift || event.ctrl || event.alt || event.meta;
    if !has_modifier && !is_function_row(&event.code) {
        return false;
    }
    !MODIFIER_CODES.contains(&event.code.as_str())
}

/// Byte-for-byte identity over code plus all four modifier flags — the
/// comparison that collapses key-repeat floods into one logical event.
pub fn same_combination(a: &KeyComboData, b: &KeyComboData) -> bool {
    a.code == b.code && a.shift == b.shift && a.ctrl == b.ctrl && a.alt == b.alt && a.meta == b.meta
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combo(code: &str, shift: bool, ctrl: bool, alt: bool, meta: bool) -> KeyComboData {
        KeyComboData {
            code: code.into(),
            shift,
            ctrl,
            alt,
            meta,
        }
    }

    #[test]
    fn plain_keys_are_not_combinations() {
        assert!(!is_key_combination(&combo("KeyA", false, false, false, false)));
        assert!(!is_key_combination(&combo("Enter", false, false, false, false)));
    }

    #[test]
    fn modified_keys_are_combinations() {
        assert!(is_key_combination(&combo("KeyC", false, true, false, false)));
        assert!(is_key_combination(&combo("Tab", false, false, true, false)));
        assert!(is_key_combination(&combo("KeyV", false, false, false, true)));
    }

    #[test]
    fn bare_modifier_presses_are_rejected() {
        // Holding Shift reports shift=true with the modifier's own code.
        assert!(!is_key_combination(&combo("ShiftLeft", true, false, false, false)));
        assert!(!is_key_combination(&combo("MetaRight", false, false, false, true)));
    }

    #[test]
    fn function_row_counts_without_modifiers() {
        assert!(is_key_combination(&combo("F5", false, false, false, false)));
        assert!(is_key_combination(&combo("F12", false, false, false, false)));
        // Keys that merely start with F are not function keys.
        assert!(!is_key_combination(&combo("F", false, false, false, false)));
        assert!(!is_key_combination(&combo("Fn", false, false, false, false)));
    }

    #[test]
    fn same_combination_compares_all_five_fields() {
        let base = combo("KeyC", false, true, false, false);
        assert!(same_combination(&base, &base.clone()));
        assert!(!same_combination(&base, &combo("KeyV", false, true, false, false)));
        assert!(!same_combination(&base, &combo("KeyC", true, true, false, false)));
    }
}
