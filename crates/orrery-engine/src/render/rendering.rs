//! Per-frame rendering context threaded through the callstack.

use crate::coords::Viewport;
use crate::scene::RenderableScene;
use crate::viewer::SceneViewer;

use super::graphics::{GraphicsContext, Image};

/// Hands out device light slots in order for one frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LightSlotAllocator {
    capacity: usize,
    next: usize,
    dropped: usize,
}

impl LightSlotAllocator {
    #[inline]
    pub const fn new(capacity: usize) -> Self {
        Self { capacity, next: 0, dropped: 0 }
    }

    /// Forgets all allocations; called whenever lights are re-enabled.
    #[inline]
    pub fn reset(&mut self) {
        self.next = 0;
        self.dropped = 0;
    }

    /// Next free slot, or `None` (counted as dropped) once exhausted.
    pub fn allocate(&mut self) -> Option<usize> {
        if self.next < self.capacity {
            self.next += 1;
            Some(self.next - 1)
        } else {
            self.dropped += 1;
            None
        }
    }

    #[inline]
    pub fn allocated(&self) -> usize {
        self.next
    }

    #[inline]
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Things that happened while the callstack ran.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Times the scene collaborator was asked to draw.
    pub scene_draws: usize,
    pub scene_failures: usize,
    /// Lights that did not get a slot in the last lighting pass.
    pub dropped_lights: usize,
    /// Warnings issued for dropped lights; at most one per frame.
    pub light_warnings: usize,
    pub accumulation_unsupported: bool,
    pub transparency_fallback: bool,
}

/// Cached image for pixel-buffer mode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PixelBuffer {
    pub image: Option<Image>,
    pub update_requested: bool,
    /// The context cannot read pixels back; every frame renders the scene.
    pub capture_unsupported: bool,
}

impl PixelBuffer {
    #[inline]
    pub fn needs_update(&self) -> bool {
        self.update_requested || self.image.is_none()
    }
}

/// Exclusively owned by one `render_frame` call.
pub struct RenderingContext<'a> {
    pub viewer: &'a SceneViewer,
    pub gfx: &'a mut dyn GraphicsContext,
    pub scene: Option<&'a dyn RenderableScene>,
    pub viewport: Viewport,
    pub antialias: u32,
    pub transparency_layers: u32,
    pub double_buffered: bool,
    pub pixel_buffer: &'a mut PixelBuffer,
    pub lights: LightSlotAllocator,
    pub layer: usize,
    pub layer_count: usize,
    pub stats: FrameStats,
}

impl<'a> RenderingContext<'a> {
    pub fn new(
        viewer: &'a SceneViewer,
        gfx: &'a mut dyn GraphicsContext,
        scene: Option<&'a dyn RenderableScene>,
        viewport: Viewport,
        pixel_buffer: &'a mut PixelBuffer,
    ) -> Self {
        let caps = gfx.capabilities();
        Self {
            viewer,
            scene,
            viewport,
            antialias: viewer.antialias(),
            transparency_layers: viewer.transparency_layers(),
            double_buffered: caps.double_buffered,
            pixel_buffer,
            lights: LightSlotAllocator::new(caps.max_lights),
            layer: 0,
            layer_count: scene.map_or(1, |s| s.layer_count().max(1)),
            stats: FrameStats::default(),
            gfx,
        }
    }

    /// Advances to the next scene layer; false once all were drawn.
    pub fn next_layer(&mut self) -> bool {
        if self.layer + 1 < self.layer_count {
            self.layer += 1;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_hands_out_slots_in_order_then_drops() {
        let mut a = LightSlotAllocator::new(2);
        assert_eq!(a.allocate(), Some(0));
        assert_eq!(a.allocate(), Some(1));
        assert_eq!(a.allocate(), None);
        assert_eq!(a.allocate(), None);
        assert_eq!((a.allocated(), a.dropped()), (2, 2));
        a.reset();
        assert_eq!(a.allocate(), Some(0));
        assert_eq!(a.dropped(), 0);
    }

    #[test]
    fn pixel_buffer_needs_first_capture() {
        let mut pb = PixelBuffer::default();
        assert!(pb.needs_update());
        pb.image = Some(Image::filled(1, 1, [0; 4]));
        assert!(!pb.needs_update());
        pb.update_requested = true;
        assert!(pb.needs_update());
    }
}
