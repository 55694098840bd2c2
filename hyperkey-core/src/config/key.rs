/// Karabiner `key_code` names that a trigger or inner key may use.
pub const KEY_CODES: &[&str] = &[
    "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q", "r", "s",
    "t", "u", "v", "w", "x", "y", "z", "1", "2", "3", "4", "5", "6", "7", "8", "9", "0",
    "return_or_enter", "escape", "delete_or_backspace", "delete_forward", "tab", "spacebar",
    "hyphen", "equal_sign", "open_bracket", "close_bracket", "backslash", "non_us_pound",
    "semicolon", "quote", "grave_accent_and_tilde", "comma", "period", "slash",
    "non_us_backslash", "caps_lock", "up_arrow", "down_arrow", "left_arrow", "right_arrow",
    "page_up", "page_down", "home", "end", "f1", "f2", "f3", "f4", "f5", "f6", "f7", "f8", "f9",
    "f10", "f11", "f12", "f13", "f14", "f15", "f16", "f17", "f18", "f19", "f20",
    "left_control", "left_shift", "left_option", "left_command", "right_control",
    "right_shift", "right_option", "right_command", "fn", "vk_none",
];

/// Modifier names accepted in a key press.
pub const MODIFIERS: &[&str] = &[
    "any", "command", "control", "option", "shift", "caps_lock", "fn", "left_command",
    "left_control", "left_option", "left_shift", "right_command", "right_control",
    "right_option", "right_shift",
];

pub fn is_key_code(key: &str) -> bool {
    KEY_CODES.contains(&key)
}

pub fn is_modifier(modifier: &str) -> bool {
    MODIFIERS.contains(&modifier)
}
