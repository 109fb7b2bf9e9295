/// Keyboard shadow state
pub mod keyboard;

/// Mouse shadow state
pub mod mouse;

pub use keyboard::KeyboardInput;
pub use mouse::MouseInput;

/// Platform independent key codes. Printable keys share their value with the
/// upper case ascii character printed on the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum KeyCode {
    Null = 0,
    Backspace = 1,
    Delete,
    Tab,
    Clear,
    Enter,
    Pause,
    Escape,
    LeftShift,
    RightShift,
    LeftControl,
    RightControl,
    LeftAlt,
    RightAlt,
    LeftWindows,
    RightWindows,
    CapsLock,
    NumberLock,
    ScrollLock,
    Insert,
    PageUp,
    PageDown,
    End,
    Home,
    LeftArrow,
    RightArrow,
    UpArrow,
    DownArrow,
    Print,
    PrintScreen,
    Help,
    SpaceBar = b' ',
    Quote = b'\'',
    Plus = b'+',
    Comma = b',',
    Minus = b'-',
    Period = b'.',
    Slash = b'/',
    Keyboard0 = b'0',
    Keyboard1,
    Keyboard2,
    Keyboard3,
    Keyboard4,
    Keyboard5,
    Keyboard6,
    Keyboard7,
    Keyboard8,
    Keyboard9,
    Semicolon = b';',
    A = b'A',
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    OpenBracket = b'[',
    BackSlash = b'\\',
    CloseBracket = b']',
    Backtick = b'`',
    Menu,
    Numpad0,
    Numpad1,
    Numpad2,
    Numpad3,
    Numpad4,
    Numpad5,
    Numpad6,
    Numpad7,
    Numpad8,
    Numpad9,
    NumpadPlus,
    NumpadMinus,
    NumpadMultiply,
    NumpadDivide,
    NumpadDecimalPoint,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    F13,
    F14,
    F15,
    F16,
    F17,
    F18,
    F19,
    F20,
    F21,
    F22,
    F23,
    F24,
    BrowserBack,
    BrowserForward,
    BrowserRefresh,
    BrowserStop,
    BrowserSearch,
    BrowserFavorites,
    BrowserHome,
    MediaNextTrack,
    MediaPreviousTrack,
    MediaStop,
    MediaPlayPause,
    Play,
    Zoom,
}

/// Number of valid key codes, `Null` excluded
pub const KEY_COUNT: usize = KeyCode::Zoom as usize;

const DIGITS: [KeyCode; 10] = [
    KeyCode::Keyboard0,
    KeyCode::Keyboard1,
    KeyCode::Keyboard2,
    KeyCode::Keyboard3,
    KeyCode::Keyboard4,
    KeyCode::Keyboard5,
    KeyCode::Keyboard6,
    KeyCode::Keyboard7,
    KeyCode::Keyboard8,
    KeyCode::Keyboard9,
];

const LETTERS: [KeyCode; 26] = [
    KeyCode::A,
    KeyCode::B,
    KeyCode::C,
    KeyCode::D,
    KeyCode::E,
    KeyCode::F,
    KeyCode::G,
    KeyCode::H,
    KeyCode::I,
    KeyCode::J,
    KeyCode::K,
    KeyCode::L,
    KeyCode::M,
    KeyCode::N,
    KeyCode::O,
    KeyCode::P,
    KeyCode::Q,
    KeyCode::R,
    KeyCode::S,
    KeyCode::T,
    KeyCode::U,
    KeyCode::V,
    KeyCode::W,
    KeyCode::X,
    KeyCode::Y,
    KeyCode::Z,
];

impl KeyCode {
    pub const INVALID: KeyCode = KeyCode::Null;
    pub const EQUALS: KeyCode = KeyCode::Plus;
    pub const OPEN_CHEVRON: KeyCode = KeyCode::Comma;
    pub const UNDERSCORE: KeyCode = KeyCode::Minus;
    pub const CLOSE_CHEVRON: KeyCode = KeyCode::Period;
    pub const QUESTION: KeyCode = KeyCode::Slash;
    pub const COLON: KeyCode = KeyCode::Semicolon;
    pub const OPEN_BRACE: KeyCode = KeyCode::OpenBracket;
    pub const VERTICAL_BAR: KeyCode = KeyCode::BackSlash;
    pub const CLOSE_BRACE: KeyCode = KeyCode::CloseBracket;
    pub const TILDE: KeyCode = KeyCode::Backtick;

    /// Bit index into a key set, `None` for `Null`
    pub fn index(self) -> Option<usize> {
        (self as usize).checked_sub(1)
    }
}

/// Converts a character to the key which types it, case insensitive.
/// Characters which are not on a single key map to `KeyCode::Null`.
pub fn char_to_key_code(character: char) -> KeyCode {
    match character {
        '0'..='9' => DIGITS[character as usize - '0' as usize],
        'A'..='Z' => LETTERS[character as usize - 'A' as usize],
        'a'..='z' => LETTERS[character as usize - 'a' as usize],
        ' ' => KeyCode::SpaceBar,
        '\'' | '"' => KeyCode::Quote,
        '+' | '=' => KeyCode::Plus,
        ',' | '<' => KeyCode::Comma,
        '-' | '_' => KeyCode::Minus,
        '.' | '>' => KeyCode::Period,
        '/' | '?' => KeyCode::Slash,
        ';' | ':' => KeyCode::Semicolon,
        '[' | '{' => KeyCode::OpenBracket,
        '\\' | '|' => KeyCode::BackSlash,
        ']' | '}' => KeyCode::CloseBracket,
        '`' | '~' => KeyCode::Backtick,
        _ => KeyCode::INVALID,
    }
}

/// Mouse buttons, `Null` is never pressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MouseButton {
    Null = 0,
    Left,
    Middle,
    Right,
    XButton1,
    XButton2,
}

pub const MOUSE_BUTTON_COUNT: usize = MouseButton::XButton2 as usize;

impl MouseButton {
    pub const INVALID: MouseButton = MouseButton::Null;

    pub fn index(self) -> Option<usize> {
        (self as usize).checked_sub(1)
    }
}

/// Fixed size bit set indexed by `code - 1`, used for key and button shadow state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PressedSet {
    bits: [u64; 3],
}

impl PressedSet {
    pub fn get(&self, index: usize) -> bool {
        self.bits
            .get(index / 64)
            .map(|word| word & (1 << (index % 64)) != 0)
            .unwrap_or(false)
    }

    pub fn set(&mut self, index: usize, pressed: bool) {
        if let Some(word) = self.bits.get_mut(index / 64) {
            if pressed {
                *word |= 1 << (index % 64);
            } else {
                *word &= !(1 << (index % 64));
            }
        }
    }

    pub fn reset(&mut self) {
        self.bits = [0; 3];
    }

    pub fn any(&self) -> bool {
        self.bits.iter().any(|word| *word != 0)
    }
}
