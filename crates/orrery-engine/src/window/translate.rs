//! winit events to engine input.

use winit::event::{ElementState, MouseButton as WinitButton, WindowEvent};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};

use crate::input::{
    InputEvent, InputState, Key, KeyState, Modifiers, MouseButton, MouseButtonState, PointerButtonEvent,
    PointerMoveEvent,
};

/// Translates one window event, or `None` for events that carry no input.
///
/// Positions stay in physical pixels, y down, to line up with the surface.
/// Button events take the pointer position tracked in `state` since winit
/// reports none with them.
pub(super) fn translate_event(state: &InputState, event: &WindowEvent) -> Option<InputEvent> {
    let modifiers = state.modifiers;
    let ev = match event {
        WindowEvent::ModifiersChanged(m) => InputEvent::ModifiersChanged(map_modifiers(m.state())),
        WindowEvent::Focused(focused) => InputEvent::Focused(*focused),
        WindowEvent::CursorLeft { .. } => InputEvent::PointerLeft,
        WindowEvent::CursorMoved { position, .. } => InputEvent::PointerMoved(PointerMoveEvent {
            x: position.x as f32,
            y: position.y as f32,
        }),
        WindowEvent::MouseInput { state: pressed, button, .. } => {
            let (x, y) = state.pointer_or_origin();
            InputEvent::PointerButton(PointerButtonEvent {
                button: map_mouse_button(*button),
                state: match pressed {
                    ElementState::Pressed => MouseButtonState::Pressed,
                    ElementState::Released => MouseButtonState::Released,
                },
                x,
                y,
                modifiers,
            })
        }
        WindowEvent::KeyboardInput { event, .. } => {
            let (key, code) = map_key(event.physical_key);
            InputEvent::Key {
                key,
                state: match event.state {
                    ElementState::Pressed => KeyState::Pressed,
                    ElementState::Released => KeyState::Released,
                },
                modifiers,
                code,
                repeat: event.repeat,
            }
        }
        _ => return None,
    };
    Some(ev)
}

fn map_modifiers(m: ModifiersState) -> Modifiers {
    Modifiers {
        shift: m.shift_key(),
        ctrl: m.control_key(),
        alt: m.alt_key(),
        meta: m.super_key(),
    }
}

fn map_mouse_button(button: WinitButton) -> MouseButton {
    match button {
        WinitButton::Left => MouseButton::Left,
        WinitButton::Right => MouseButton::Right,
        WinitButton::Middle => MouseButton::Middle,
        WinitButton::Back => MouseButton::Back,
        WinitButton::Forward => MouseButton::Forward,
        WinitButton::Other(n) => MouseButton::Other(n),
    }
}

const KEYS: &[(KeyCode, Key)] = &[
    (KeyCode::Escape, Key::Escape), (KeyCode::Enter, Key::Enter), (KeyCode::Tab, Key::Tab),
    (KeyCode::Backspace, Key::Backspace), (KeyCode::Space, Key::Space),
    (KeyCode::Insert, Key::Insert), (KeyCode::Delete, Key::Delete),
    (KeyCode::Home, Key::Home), (KeyCode::End, Key::End),
    (KeyCode::PageUp, Key::PageUp), (KeyCode::PageDown, Key::PageDown),
    (KeyCode::ArrowUp, Key::ArrowUp), (KeyCode::ArrowDown, Key::ArrowDown),
    (KeyCode::ArrowLeft, Key::ArrowLeft), (KeyCode::ArrowRight, Key::ArrowRight),
    (KeyCode::ShiftLeft, Key::Shift), (KeyCode::ShiftRight, Key::Shift),
    (KeyCode::ControlLeft, Key::Control), (KeyCode::ControlRight, Key::Control),
    (KeyCode::AltLeft, Key::Alt), (KeyCode::AltRight, Key::Alt),
    (KeyCode::SuperLeft, Key::Meta), (KeyCode::SuperRight, Key::Meta),
    (KeyCode::KeyA, Key::A), (KeyCode::KeyB, Key::B), (KeyCode::KeyC, Key::C), (KeyCode::KeyD, Key::D),
    (KeyCode::KeyE, Key::E), (KeyCode::KeyF, Key::F), (KeyCode::KeyG, Key::G), (KeyCode::KeyH, Key::H),
    (KeyCode::KeyI, Key::I), (KeyCode::KeyJ, Key::J), (KeyCode::KeyK, Key::K), (KeyCode::KeyL, Key::L),
    (KeyCode::KeyM, Key::M), (KeyCode::KeyN, Key::N), (KeyCode::KeyO, Key::O), (KeyCode::KeyP, Key::P),
    (KeyCode::KeyQ, Key::Q), (KeyCode::KeyR, Key::R), (KeyCode::KeyS, Key::S), (KeyCode::KeyT, Key::T),
    (KeyCode::KeyU, Key::U), (KeyCode::KeyV, Key::V), (KeyCode::KeyW, Key::W), (KeyCode::KeyX, Key::X),
    (KeyCode::KeyY, Key::Y), (KeyCode::KeyZ, Key::Z),
    (KeyCode::Digit0, Key::Digit0), (KeyCode::Digit1, Key::Digit1), (KeyCode::Digit2, Key::Digit2),
    (KeyCode::Digit3, Key::Digit3), (KeyCode::Digit4, Key::Digit4), (KeyCode::Digit5, Key::Digit5),
    (KeyCode::Digit6, Key::Digit6), (KeyCode::Digit7, Key::Digit7), (KeyCode::Digit8, Key::Digit8),
    (KeyCode::Digit9, Key::Digit9),
    (KeyCode::F1, Key::F1), (KeyCode::F2, Key::F2), (KeyCode::F3, Key::F3), (KeyCode::F4, Key::F4),
    (KeyCode::F5, Key::F5), (KeyCode::F6, Key::F6), (KeyCode::F7, Key::F7), (KeyCode::F8, Key::F8),
    (KeyCode::F9, Key::F9), (KeyCode::F10, Key::F10), (KeyCode::F11, Key::F11), (KeyCode::F12, Key::F12),
];

/// Engine key plus the platform key code viewer input carries.
fn map_key(physical: PhysicalKey) -> (Key, u32) {
    let PhysicalKey::Code(code) = physical else {
        // native scan codes have no stable numeric form
        return (Key::Unknown(0), 0);
    };
    let raw = code as u32;
    let key = KEYS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|&(_, key)| key)
        .unwrap_or(Key::Unknown(raw));
    (key, raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifiers_map_field_by_field() {
        let m = map_modifiers(ModifiersState::SHIFT | ModifiersState::SUPER);
        assert_eq!(m, Modifiers { shift: true, ctrl: false, alt: false, meta: true });
    }

    #[test]
    fn mouse_buttons_keep_their_identity() {
        assert_eq!(map_mouse_button(WinitButton::Middle), MouseButton::Middle);
        assert_eq!(map_mouse_button(WinitButton::Other(9)), MouseButton::Other(9));
    }

    #[test]
    fn physical_keys_map_to_engine_keys() {
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::KeyA)).0, Key::A);
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::Escape)).0, Key::Escape);
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::ShiftRight)).0, Key::Shift);
        let (key, code) = map_key(PhysicalKey::Code(KeyCode::NumpadAdd));
        assert_eq!(key, Key::Unknown(code));
    }

    #[test]
    fn only_input_events_translate() {
        let state = InputState::default();
        assert_eq!(translate_event(&state, &WindowEvent::Focused(true)), Some(InputEvent::Focused(true)));
        assert_eq!(translate_event(&state, &WindowEvent::RedrawRequested), None);
    }
}
