use crate::coords::Viewport;

/// One frame of the window surface, opened for recording.
///
/// Built by the device layer after the surface clear. A backend records its
/// passes into `encoder`; submission and present stay with the device.
pub struct FrameEncoder<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub color_view: &'a wgpu::TextureView,
    pub format: wgpu::TextureFormat,
    /// Whole surface in physical pixels, bottom-left origin.
    pub viewport: Viewport,
}

impl FrameEncoder<'_> {
    /// Size for attachments that must match the surface; never zero.
    pub fn extent(&self) -> (u32, u32) {
        (self.viewport.width.max(1) as u32, self.viewport.height.max(1) as u32)
    }
}
