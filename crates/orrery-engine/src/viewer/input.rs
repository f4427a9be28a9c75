use crate::input::{InputEvent, KeyState, Modifiers, MouseButtonState};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ViewerInputKind {
    Motion,
    ButtonPress,
    ButtonRelease,
    KeyPress,
    KeyRelease,
}

/// Raw pointer/key event as the viewer consumes it.
///
/// Coordinates are window pixels with y down; `button` is 1 (left),
/// 2 (middle) or 3 (right), and 0 for events without one.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ViewerInput {
    pub kind: ViewerInputKind,
    pub x: i32,
    pub y: i32,
    pub button: u32,
    pub modifiers: Modifiers,
    pub key_code: u32,
}

impl ViewerInput {
    pub fn motion(x: i32, y: i32) -> Self {
        Self { kind: ViewerInputKind::Motion, x, y, button: 0, modifiers: Modifiers::default(), key_code: 0 }
    }

    pub fn press(button: u32, x: i32, y: i32, modifiers: Modifiers) -> Self {
        Self { kind: ViewerInputKind::ButtonPress, button, modifiers, ..Self::motion(x, y) }
    }

    pub fn release(button: u32, x: i32, y: i32) -> Self {
        Self { kind: ViewerInputKind::ButtonRelease, button, ..Self::motion(x, y) }
    }

    /// Translates a runtime event. `pointer` is the last known pointer
    /// position, used for key events which carry none.
    ///
    /// Returns `None` for events the viewer has no use for.
    pub fn from_event(event: &InputEvent, pointer: (f32, f32), modifiers: Modifiers) -> Option<Self> {
        let at = |x: f32, y: f32| (x.round() as i32, y.round() as i32);
        match event {
            InputEvent::PointerMoved(m) => {
                let (x, y) = at(m.x, m.y);
                Some(Self { modifiers, ..Self::motion(x, y) })
            }
            InputEvent::PointerButton(b) => {
                let button = b.button.number()?;
                let kind = match b.state {
                    MouseButtonState::Pressed => ViewerInputKind::ButtonPress,
                    MouseButtonState::Released => ViewerInputKind::ButtonRelease,
                };
                let (x, y) = at(b.x, b.y);
                Some(Self { kind, x, y, button, modifiers: b.modifiers, key_code: 0 })
            }
            InputEvent::Key { state, modifiers, code, .. } => {
                let kind = match state {
                    KeyState::Pressed => ViewerInputKind::KeyPress,
                    KeyState::Released => ViewerInputKind::KeyRelease,
                };
                let (x, y) = at(pointer.0, pointer.1);
                Some(Self { kind, x, y, button: 0, modifiers: *modifiers, key_code: *code })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Key, MouseButton, PointerButtonEvent, PointerMoveEvent};

    #[test]
    fn buttons_are_numbered_left_middle_right() {
        let shift = Modifiers { shift: true, ..Default::default() };
        for (button, number) in [(MouseButton::Left, 1), (MouseButton::Middle, 2), (MouseButton::Right, 3)] {
            let ev = InputEvent::PointerButton(PointerButtonEvent {
                button,
                state: MouseButtonState::Pressed,
                x: 10.4,
                y: 20.6,
                modifiers: shift,
            });
            let input = ViewerInput::from_event(&ev, (0.0, 0.0), Modifiers::default()).unwrap();
            assert_eq!(input, ViewerInput::press(number, 10, 21, shift));
        }
        let back = InputEvent::PointerButton(PointerButtonEvent {
            button: MouseButton::Back,
            state: MouseButtonState::Released,
            x: 0.0,
            y: 0.0,
            modifiers: Modifiers::default(),
        });
        assert!(ViewerInput::from_event(&back, (0.0, 0.0), Modifiers::default()).is_none());
    }

    #[test]
    fn motion_and_keys() {
        let ev = InputEvent::PointerMoved(PointerMoveEvent { x: 3.0, y: 4.0 });
        let m = ViewerInput::from_event(&ev, (0.0, 0.0), Modifiers::default()).unwrap();
        assert_eq!((m.kind, m.x, m.y), (ViewerInputKind::Motion, 3, 4));

        let key = InputEvent::Key {
            key: Key::A,
            state: KeyState::Released,
            modifiers: Modifiers::default(),
            code: 30,
            repeat: false,
        };
        let k = ViewerInput::from_event(&key, (7.0, 8.0), Modifiers::default()).unwrap();
        assert_eq!((k.kind, k.x, k.y, k.key_code), (ViewerInputKind::KeyRelease, 7, 8, 30));

        assert!(ViewerInput::from_event(&InputEvent::PointerLeft, (0.0, 0.0), Modifiers::default()).is_none());
    }
}
