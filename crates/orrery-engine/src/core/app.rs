use super::ctx::FrameCtx;

/// What the runtime should do after an app callback.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// An application driven by [`Runtime`](crate::window::Runtime).
///
/// Input reaches the app through [`FrameCtx`]: every translated event
/// requests a redraw and is delivered with it.
pub trait App {
    /// Called once per redraw.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// Polled when the event loop goes idle; a redraw is requested only
    /// while this returns true.
    fn needs_redraw(&self) -> bool {
        true
    }

    /// Called once after the window has closed.
    fn on_exit(&mut self) {}
}
