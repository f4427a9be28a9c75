use std::collections::HashSet;

use super::frame::InputFrame;
use super::types::{
    InputEvent,
    Key,
    KeyState,
    Modifiers,
    MouseButton,
    MouseButtonState,
    PointerButtonEvent,
    PointerMoveEvent,
};

/// Current input state for a single window.
///
/// Holds "is down" information and the pointer position.
/// Per-frame transitions are recorded into an `InputFrame`.
#[derive(Debug, Default)]
pub struct InputState {
    pub modifiers: Modifiers,
    pub focused: bool,

    /// Pointer position in physical pixels, `None` outside the window.
    pub pointer_pos: Option<(f32, f32)>,

    pub keys_down: HashSet<Key>,
    pub buttons_down: HashSet<MouseButton>,
}

impl InputState {
    /// Applies an input event to the current state and writes deltas to `frame`.
    pub fn apply_event(&mut self, frame: &mut InputFrame, ev: InputEvent) {
        match &ev {
            InputEvent::ModifiersChanged(m) => {
                self.modifiers = *m;
            }

            InputEvent::Focused(f) => {
                self.focused = *f;
                if !*f {
                    // Releases never arrive for keys held while focus moves away.
                    self.keys_down.clear();
                    self.buttons_down.clear();
                }
            }

            InputEvent::PointerMoved(PointerMoveEvent { x, y }) => {
                self.pointer_pos = Some((*x, *y));
            }

            InputEvent::PointerLeft => {
                self.pointer_pos = None;
            }

            InputEvent::Key {
                key,
                state,
                modifiers,
                repeat,
                ..
            } => {
                self.modifiers = *modifiers;

                match state {
                    KeyState::Pressed => {
                        if self.keys_down.insert(*key) && !repeat {
                            frame.keys_pressed.insert(*key);
                        }
                    }
                    KeyState::Released => {
                        if self.keys_down.remove(key) {
                            frame.keys_released.insert(*key);
                        }
                    }
                }
            }

            InputEvent::PointerButton(PointerButtonEvent {
                button,
                state,
                x,
                y,
                modifiers,
            }) => {
                self.pointer_pos = Some((*x, *y));
                self.modifiers = *modifiers;

                match state {
                    MouseButtonState::Pressed => {
                        if self.buttons_down.insert(*button) {
                            frame.buttons_pressed.insert(*button);
                        }
                    }
                    MouseButtonState::Released => {
                        if self.buttons_down.remove(button) {
                            frame.buttons_released.insert(*button);
                        }
                    }
                }
            }
        }

        frame.push_event(ev);
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn button_down(&self, btn: MouseButton) -> bool {
        self.buttons_down.contains(&btn)
    }

    /// Last known pointer position, or the origin when it left the window.
    pub fn pointer_or_origin(&self) -> (f32, f32) {
        self.pointer_pos.unwrap_or((0.0, 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key: Key, state: KeyState) -> InputEvent {
        InputEvent::Key { key, state, modifiers: Modifiers::default(), code: 0, repeat: false }
    }

    fn button(state: MouseButtonState, x: f32, y: f32) -> InputEvent {
        InputEvent::PointerButton(PointerButtonEvent {
            button: MouseButton::Left,
            state,
            x,
            y,
            modifiers: Modifiers { shift: true, ..Default::default() },
        })
    }

    #[test]
    fn key_press_and_release_are_recorded_once() {
        let mut s = InputState::default();
        let mut f = InputFrame::default();
        s.apply_event(&mut f, key(Key::A, KeyState::Pressed));
        s.apply_event(&mut f, key(Key::A, KeyState::Pressed));
        assert!(s.key_down(Key::A));
        assert!(f.key_pressed(Key::A));
        assert_eq!(f.events.len(), 2);

        f.clear();
        s.apply_event(&mut f, key(Key::A, KeyState::Released));
        assert!(!s.key_down(Key::A));
        assert!(f.keys_released.contains(&Key::A));
        assert!(!f.key_pressed(Key::A));
    }

    #[test]
    fn buttons_track_pointer_and_modifiers() {
        let mut s = InputState::default();
        let mut f = InputFrame::default();
        s.apply_event(&mut f, button(MouseButtonState::Pressed, 12.0, 34.0));
        assert!(s.button_down(MouseButton::Left));
        assert_eq!(s.pointer_pos, Some((12.0, 34.0)));
        assert!(s.modifiers.shift);
        s.apply_event(&mut f, button(MouseButtonState::Released, 12.0, 34.0));
        assert!(!s.button_down(MouseButton::Left));
        assert!(f.buttons_released.contains(&MouseButton::Left));
    }

    #[test]
    fn focus_loss_releases_everything() {
        let mut s = InputState::default();
        let mut f = InputFrame::default();
        s.apply_event(&mut f, key(Key::Shift, KeyState::Pressed));
        s.apply_event(&mut f, button(MouseButtonState::Pressed, 0.0, 0.0));
        s.apply_event(&mut f, InputEvent::Focused(false));
        assert!(s.keys_down.is_empty());
        assert!(s.buttons_down.is_empty());
    }

    #[test]
    fn leaving_the_window_forgets_the_pointer() {
        let mut s = InputState::default();
        let mut f = InputFrame::default();
        s.apply_event(&mut f, InputEvent::PointerMoved(PointerMoveEvent { x: 5.0, y: 6.0 }));
        assert_eq!(s.pointer_or_origin(), (5.0, 6.0));
        s.apply_event(&mut f, InputEvent::PointerLeft);
        assert_eq!(s.pointer_or_origin(), (0.0, 0.0));
    }
}
