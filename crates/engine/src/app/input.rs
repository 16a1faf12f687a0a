use serde::{Deserialize, Serialize};
use winit::keyboard::KeyCode;

/// Named controls a state reacts to, independent of the physical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    RotateLeft,
    RotateRight,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Select,
    Cancel,
    ZoomIn,
    ZoomOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlEvent {
    pub control: Control,
    pub pressed: bool,
}

impl ControlEvent {
    pub fn pressed(control: Control) -> Self {
        Self {
            control,
            pressed: true,
        }
    }

    pub fn released(control: Control) -> Self {
        Self {
            control,
            pressed: false,
        }
    }
}

/// Whether an input event was consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    Continue,
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBinding {
    pub key: String,
    pub control: Control,
}

impl KeyBinding {
    pub fn new(key: &str, control: Control) -> Self {
        Self {
            key: key.to_string(),
            control,
        }
    }
}

pub fn default_key_bindings() -> Vec<KeyBinding> {
    vec![
        KeyBinding::new("KeyQ", Control::RotateLeft),
        KeyBinding::new("KeyE", Control::RotateRight),
        KeyBinding::new("KeyW", Control::MoveUp),
        KeyBinding::new("ArrowUp", Control::MoveUp),
        KeyBinding::new("KeyS", Control::MoveDown),
        KeyBinding::new("ArrowDown", Control::MoveDown),
        KeyBinding::new("KeyA", Control::MoveLeft),
        KeyBinding::new("ArrowLeft", Control::MoveLeft),
        KeyBinding::new("KeyD", Control::MoveRight),
        KeyBinding::new("ArrowRight", Control::MoveRight),
        KeyBinding::new("Enter", Control::Select),
        KeyBinding::new("Space", Control::Select),
        KeyBinding::new("Backspace", Control::Cancel),
        KeyBinding::new("Equal", Control::ZoomIn),
        KeyBinding::new("Minus", Control::ZoomOut),
    ]
}

/// Parses the winit `KeyCode` variant name used in key bindings.
pub fn parse_key_code(name: &str) -> Option<KeyCode> {
    let key = match name {
        "ArrowUp" => KeyCode::ArrowUp,
        "ArrowDown" => KeyCode::ArrowDown,
        "ArrowLeft" => KeyCode::ArrowLeft,
        "ArrowRight" => KeyCode::ArrowRight,
        "Enter" => KeyCode::Enter,
        "Space" => KeyCode::Space,
        "Backspace" => KeyCode::Backspace,
        "Tab" => KeyCode::Tab,
        "Equal" => KeyCode::Equal,
        "Minus" => KeyCode::Minus,
        "PageUp" => KeyCode::PageUp,
        "PageDown" => KeyCode::PageDown,
        "Comma" => KeyCode::Comma,
        "Period" => KeyCode::Period,
        "NumpadAdd" => KeyCode::NumpadAdd,
        "NumpadSubtract" => KeyCode::NumpadSubtract,
        "NumpadEnter" => KeyCode::NumpadEnter,
        _ => return parse_letter_or_digit(name),
    };
    Some(key)
}

fn parse_letter_or_digit(name: &str) -> Option<KeyCode> {
    const LETTERS: [KeyCode; 26] = [
        KeyCode::KeyA,
        KeyCode::KeyB,
        KeyCode::KeyC,
        KeyCode::KeyD,
        KeyCode::KeyE,
        KeyCode::KeyF,
        KeyCode::KeyG,
        KeyCode::KeyH,
        KeyCode::KeyI,
        KeyCode::KeyJ,
        KeyCode::KeyK,
        KeyCode::KeyL,
        KeyCode::KeyM,
        KeyCode::KeyN,
        KeyCode::KeyO,
        KeyCode::KeyP,
        KeyCode::KeyQ,
        KeyCode::KeyR,
        KeyCode::KeyS,
        KeyCode::KeyT,
        KeyCode::KeyU,
        KeyCode::KeyV,
        KeyCode::KeyW,
        KeyCode::KeyX,
        KeyCode::KeyY,
        KeyCode::KeyZ,
    ];
    const DIGITS: [KeyCode; 10] = [
        KeyCode::Digit0,
        KeyCode::Digit1,
        KeyCode::Digit2,
        KeyCode::Digit3,
        KeyCode::Digit4,
        KeyCode::Digit5,
        KeyCode::Digit6,
        KeyCode::Digit7,
        KeyCode::Digit8,
        KeyCode::Digit9,
    ];

    let mut chars = if let Some(rest) = name.strip_prefix("Key") {
        let mut chars = rest.chars();
        let letter = chars.next()?;
        if !letter.is_ascii_uppercase() {
            return None;
        }
        return chars
            .next()
            .is_none()
            .then(|| LETTERS[(letter as u8 - b'A') as usize]);
    } else if let Some(rest) = name.strip_prefix("Digit") {
        rest.chars()
    } else {
        return None;
    };
    let digit = chars.next()?.to_digit(10)?;
    chars.next().is_none().then(|| DIGITS[digit as usize])
}
