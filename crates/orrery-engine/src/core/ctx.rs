use winit::window::{CursorIcon, Window, WindowId};

use crate::coords::ColorRgba;
use crate::device::Gpu;
use crate::input::{InputFrame, InputState};
use crate::render::FrameEncoder;
use crate::time::FrameTime;

use super::app::AppControl;

/// The window a frame is drawn for.
pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Window,
}

impl WindowCtx<'_> {
    /// Inner size in physical pixels, the unit viewports and pointer
    /// positions use.
    pub fn physical_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    pub fn set_cursor(&self, cursor: CursorIcon) {
        self.window.set_cursor(cursor);
    }

    pub fn set_title(&self, title: &str) {
        self.window.set_title(title);
    }

    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }
}

/// Everything an [`App`](super::App) sees during one redraw.
///
/// `'a` is the callback; `'w` is the window borrow inside [`Gpu`].
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    pub input: &'a InputState,
    /// Events since the previous redraw.
    pub input_frame: &'a InputFrame,
    pub time: FrameTime,
}

impl FrameCtx<'_, '_> {
    /// Clears the surface to `clear`, lets `draw` record into it and
    /// presents the result.
    ///
    /// A frame that cannot be acquired is skipped and retried on the next
    /// redraw; only a fatal surface error returns [`AppControl::Exit`].
    pub fn render<F>(&mut self, clear: ColorRgba, draw: F) -> AppControl
    where
        F: FnOnce(&mut FrameEncoder<'_>),
    {
        let mut frame = match self.gpu.acquire() {
            Ok(frame) => frame,
            Err(action) if action.retry() => {
                self.window.request_redraw();
                return AppControl::Continue;
            }
            Err(_) => return AppControl::Exit,
        };
        frame.clear(clear);
        draw(&mut self.gpu.encode_frame(&mut frame));
        self.window.window.pre_present_notify();
        self.gpu.present(frame);
        AppControl::Continue
    }
}
