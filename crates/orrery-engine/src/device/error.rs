/// How a failed surface acquisition was handled.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Lost or outdated surface, configured again; the next frame may succeed.
    Reconfigured,
    /// Timeout, or a surface that is currently zero-sized.
    SkipFrame,
    /// Out of memory. The window cannot be drawn again.
    Fatal,
}

impl SurfaceErrorAction {
    /// Whether another redraw is worth requesting.
    pub fn retry(self) -> bool {
        self != SurfaceErrorAction::Fatal
    }
}
