use crate::input::{KeyCode, MouseButton};
use crate::os::EventInfo;

// win32 message ids, kept local so translation builds and tests on every platform
pub const WM_CREATE: u32 = 0x0001;
pub const WM_DESTROY: u32 = 0x0002;
pub const WM_MOVE: u32 = 0x0003;
pub const WM_SIZE: u32 = 0x0005;
pub const WM_KEYDOWN: u32 = 0x0100;
pub const WM_KEYUP: u32 = 0x0101;
pub const WM_SYSKEYDOWN: u32 = 0x0104;
pub const WM_SYSKEYUP: u32 = 0x0105;
pub const WM_MOUSEMOVE: u32 = 0x0200;
pub const WM_LBUTTONDOWN: u32 = 0x0201;
pub const WM_LBUTTONUP: u32 = 0x0202;
pub const WM_RBUTTONDOWN: u32 = 0x0204;
pub const WM_RBUTTONUP: u32 = 0x0205;
pub const WM_MBUTTONDOWN: u32 = 0x0207;
pub const WM_MBUTTONUP: u32 = 0x0208;
pub const WM_XBUTTONDOWN: u32 = 0x020B;
pub const WM_XBUTTONUP: u32 = 0x020C;

const XBUTTON1: u16 = 0x0001;

const VK_SHIFT: usize = 0x10;
const VK_CONTROL: usize = 0x11;
const VK_MENU: usize = 0x12;
const VK_LSHIFT: usize = 0xA0;
const VK_RSHIFT: usize = 0xA1;
const VK_LCONTROL: usize = 0xA2;
const VK_RCONTROL: usize = 0xA3;
const VK_LMENU: usize = 0xA4;
const VK_RMENU: usize = 0xA5;

const RIGHT_SHIFT_SCANCODE: isize = 0x36;
const EXTENDED_KEY_BIT: isize = 0x0100_0000;

fn loword(value: isize) -> u16 {
    (value & 0xffff) as u16
}

fn hiword(value: isize) -> u16 {
    ((value >> 16) & 0xffff) as u16
}

// GET_X_LPARAM / GET_Y_LPARAM, coordinates are signed on multi monitor setups
fn signed_lo(value: isize) -> i32 {
    loword(value) as i16 as i32
}

fn signed_hi(value: isize) -> i32 {
    hiword(value) as i16 as i32
}

fn mouse_button(msg: u32, wparam: usize) -> MouseButton {
    match msg {
        WM_LBUTTONDOWN | WM_LBUTTONUP => MouseButton::Left,
        WM_RBUTTONDOWN | WM_RBUTTONUP => MouseButton::Right,
        WM_MBUTTONDOWN | WM_MBUTTONUP => MouseButton::Middle,
        _ => {
            if hiword(wparam as isize) == XBUTTON1 {
                MouseButton::XButton1
            } else {
                MouseButton::XButton2
            }
        }
    }
}

/// Decodes a native message into event info, `None` for messages blaze does not report.
pub fn translate_message(msg: u32, wparam: usize, lparam: isize) -> Option<EventInfo> {
    let info = match msg {
        WM_CREATE => EventInfo::Create,
        WM_DESTROY => EventInfo::Destroy,
        WM_SIZE => EventInfo::Resize {
            width: loword(lparam) as u32,
            height: hiword(lparam) as u32,
        },
        WM_MOVE => EventInfo::Move {
            x: signed_lo(lparam),
            y: signed_hi(lparam),
        },
        WM_KEYDOWN | WM_SYSKEYDOWN => EventInfo::KeyDown {
            key: translate_virtual_key(wparam, lparam),
        },
        WM_KEYUP | WM_SYSKEYUP => EventInfo::KeyUp {
            key: translate_virtual_key(wparam, lparam),
        },
        WM_LBUTTONDOWN | WM_RBUTTONDOWN | WM_MBUTTONDOWN | WM_XBUTTONDOWN => {
            EventInfo::MouseButtonDown {
                x: signed_lo(lparam),
                y: signed_hi(lparam),
                button: mouse_button(msg, wparam),
            }
        }
        WM_LBUTTONUP | WM_RBUTTONUP | WM_MBUTTONUP | WM_XBUTTONUP => EventInfo::MouseButtonUp {
            x: signed_lo(lparam),
            y: signed_hi(lparam),
            button: mouse_button(msg, wparam),
        },
        WM_MOUSEMOVE => EventInfo::MouseMove {
            x: signed_lo(lparam),
            y: signed_hi(lparam),
        },
        _ => return None,
    };
    Some(info)
}

use KeyCode::*;

// virtual keys 0x01-0x91, 0xA0-0xC0, 0xDB-0xDE and 0xFA-0xFE, the gaps in between have no key
const VIRTUAL_KEY_TABLE: [KeyCode; 187] = [
    // 0x01 - 0x0F
    Null, Null, Null, Null, Null, Null, Null, Backspace, Tab, Null, Null, Clear, Enter, Null, Null,
    // 0x10 - 0x1F, generic shift / control / menu are resolved before lookup
    Null, Null, Null, Pause, CapsLock, Null, Null, Null, Null, Null, Null, Escape, Null, Null,
    Null, Null,
    // 0x20 - 0x2F
    SpaceBar, PageUp, PageDown, End, Home, LeftArrow, UpArrow, RightArrow, DownArrow, Null, Print,
    Null, PrintScreen, Insert, Delete, Help,
    // 0x30 - 0x39
    Keyboard0, Keyboard1, Keyboard2, Keyboard3, Keyboard4, Keyboard5, Keyboard6, Keyboard7,
    Keyboard8, Keyboard9,
    // 0x3A - 0x40
    Null, Null, Null, Null, Null, Null, Null,
    // 0x41 - 0x5A
    A, B, C, D, E, F, G, H, I, J, K, L, M, N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
    // 0x5B - 0x5F
    LeftWindows, RightWindows, Menu, Null, Null,
    // 0x60 - 0x6F
    Numpad0, Numpad1, Numpad2, Numpad3, Numpad4, Numpad5, Numpad6, Numpad7, Numpad8, Numpad9,
    NumpadMultiply, NumpadPlus, Null, NumpadMinus, NumpadDecimalPoint, NumpadDivide,
    // 0x70 - 0x87
    F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12, F13, F14, F15, F16, F17, F18, F19, F20,
    F21, F22, F23, F24,
    // 0x88 - 0x91
    Null, Null, Null, Null, Null, Null, Null, Null, NumberLock, ScrollLock,
    // 0xA0 - 0xAC
    LeftShift, RightShift, LeftControl, RightControl, LeftAlt, RightAlt, BrowserBack,
    BrowserForward, BrowserRefresh, BrowserStop, BrowserSearch, BrowserFavorites, BrowserHome,
    // 0xAD - 0xB9
    Null, Null, Null, MediaNextTrack, MediaPreviousTrack, MediaStop, MediaPlayPause, Null, Null,
    Null, Null, Null, Null,
    // 0xBA - 0xC0
    Semicolon, Plus, Comma, Minus, Period, Slash, Backtick,
    // 0xDB - 0xDE
    OpenBracket, BackSlash, CloseBracket, Quote,
    // 0xFA - 0xFE
    Play, Zoom, Null, Null, Clear,
];

/// Maps a virtual key onto its slot in the dense table, skipping the unused ranges.
fn table_index(vk: usize) -> Option<usize> {
    match vk {
        0x01..=0x91 => Some(vk - 0x01),
        0xA0..=0xC0 => Some(vk - 0x01 - 14),
        0xDB..=0xDE => Some(vk - 0x01 - 14 - 26),
        0xFA..=0xFE => Some(vk - 0x01 - 14 - 26 - 27),
        _ => None,
    }
}

/// Resolves the generic shift, control and menu keys to their left or right variant.
/// Right shift has its own scan code, right control and alt set the extended key flag.
fn resolve_sided_key(vk: usize, lparam: isize) -> usize {
    let scancode = (lparam >> 16) & 0xff;
    let extended = lparam & EXTENDED_KEY_BIT != 0;
    match vk {
        VK_SHIFT if scancode == RIGHT_SHIFT_SCANCODE => VK_RSHIFT,
        VK_SHIFT => VK_LSHIFT,
        VK_CONTROL if extended => VK_RCONTROL,
        VK_CONTROL => VK_LCONTROL,
        VK_MENU if extended => VK_RMENU,
        VK_MENU => VK_LMENU,
        _ => vk,
    }
}

/// Translates a win32 virtual key code with its key message `lparam` into a blaze key code.
/// Keys blaze does not know map to `KeyCode::Null`.
pub fn translate_virtual_key(vk: usize, lparam: isize) -> KeyCode {
    let vk = resolve_sided_key(vk, lparam);
    table_index(vk)
        .and_then(|index| VIRTUAL_KEY_TABLE.get(index).copied())
        .unwrap_or(KeyCode::INVALID)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pack(lo: i32, hi: i32) -> isize {
        (((hi as u16 as u32) << 16) | lo as u16 as u32) as isize
    }

    #[test]
    fn table_segments_line_up() {
        assert_eq!(translate_virtual_key(0x08, 0), Backspace);
        assert_eq!(translate_virtual_key(0x1B, 0), Escape);
        assert_eq!(translate_virtual_key(0x20, 0), SpaceBar);
        assert_eq!(translate_virtual_key(0x2F, 0), Help);
        assert_eq!(translate_virtual_key(0x5D, 0), Menu);
        assert_eq!(translate_virtual_key(0x6B, 0), NumpadPlus);
        assert_eq!(translate_virtual_key(0x87, 0), F24);
        assert_eq!(translate_virtual_key(0x91, 0), ScrollLock);
        assert_eq!(translate_virtual_key(0xA0, 0), LeftShift);
        assert_eq!(translate_virtual_key(0xAC, 0), BrowserHome);
        assert_eq!(translate_virtual_key(0xB3, 0), MediaPlayPause);
        assert_eq!(translate_virtual_key(0xBA, 0), Semicolon);
        assert_eq!(translate_virtual_key(0xC0, 0), Backtick);
        assert_eq!(translate_virtual_key(0xDB, 0), OpenBracket);
        assert_eq!(translate_virtual_key(0xDE, 0), Quote);
        assert_eq!(translate_virtual_key(0xFA, 0), Play);
        assert_eq!(translate_virtual_key(0xFB, 0), Zoom);
        assert_eq!(translate_virtual_key(0xFE, 0), Clear);
    }

    #[test]
    fn letters_and_digits_match_ascii() {
        for vk in (b'A'..=b'Z').chain(b'0'..=b'9') {
            assert_eq!(translate_virtual_key(vk as usize, 0) as u8, vk);
        }
    }

    #[test]
    fn skipped_ranges_are_invalid() {
        for vk in (0x92..=0x9F).chain(0xC1..=0xDA).chain(0xDF..=0xF9) {
            assert_eq!(translate_virtual_key(vk, 0), KeyCode::INVALID, "vk {:#x}", vk);
        }
        for vk in [0x00, 0xFF, 0x100, usize::MAX] {
            assert_eq!(translate_virtual_key(vk, 0), KeyCode::INVALID);
        }
    }

    #[test]
    fn generic_modifiers_resolve_to_sides() {
        let left_shift = 0x2A << 16;
        let right_shift = RIGHT_SHIFT_SCANCODE << 16;
        assert_eq!(translate_virtual_key(VK_SHIFT, left_shift), LeftShift);
        assert_eq!(translate_virtual_key(VK_SHIFT, right_shift), RightShift);
        assert_eq!(translate_virtual_key(VK_CONTROL, 0x1D << 16), LeftControl);
        assert_eq!(translate_virtual_key(VK_CONTROL, (0x1D << 16) | EXTENDED_KEY_BIT), RightControl);
        assert_eq!(translate_virtual_key(VK_MENU, 0x38 << 16), LeftAlt);
        assert_eq!(translate_virtual_key(VK_MENU, (0x38 << 16) | EXTENDED_KEY_BIT), RightAlt);
    }

    #[test]
    fn resize_payload() {
        assert_eq!(
            translate_message(WM_SIZE, 0, pack(960, 540)),
            Some(EventInfo::Resize { width: 960, height: 540 })
        );
    }

    #[test]
    fn coordinates_are_signed() {
        assert_eq!(
            translate_message(WM_MOVE, 0, pack(-1920, 40)),
            Some(EventInfo::Move { x: -1920, y: 40 })
        );
        assert_eq!(
            translate_message(WM_MOUSEMOVE, 0, pack(12, -3)),
            Some(EventInfo::MouseMove { x: 12, y: -3 })
        );
    }

    #[test]
    fn mouse_buttons() {
        assert_eq!(
            translate_message(WM_RBUTTONDOWN, 0, pack(5, 6)),
            Some(EventInfo::MouseButtonDown { x: 5, y: 6, button: MouseButton::Right })
        );
        assert_eq!(
            translate_message(WM_XBUTTONUP, 0x0002 << 16, pack(0, 0)),
            Some(EventInfo::MouseButtonUp { x: 0, y: 0, button: MouseButton::XButton2 })
        );
        assert_eq!(
            translate_message(WM_XBUTTONDOWN, 0x0001 << 16, pack(0, 0)),
            Some(EventInfo::MouseButtonDown { x: 0, y: 0, button: MouseButton::XButton1 })
        );
    }

    #[test]
    fn key_messages_and_unknown() {
        assert_eq!(
            translate_message(WM_KEYDOWN, 0x41, 0),
            Some(EventInfo::KeyDown { key: KeyCode::A })
        );
        assert_eq!(
            translate_message(WM_SYSKEYUP, VK_MENU, 0x38 << 16),
            Some(EventInfo::KeyUp { key: KeyCode::LeftAlt })
        );
        assert_eq!(translate_message(WM_CREATE, 0, 0), Some(EventInfo::Create));
        // WM_PAINT
        assert_eq!(translate_message(0x000F, 0, 0), None);
    }
}
