use crate::coords::ColorRgba;

/// One acquired surface texture and the encoder recording into it.
///
/// [`Gpu::encode_frame`](super::Gpu::encode_frame) opens it to a backend;
/// hand it back to [`Gpu::present`](super::Gpu::present) to submit and
/// present. Dropping it instead discards the frame.
pub struct SurfaceFrame {
    pub(super) texture: wgpu::SurfaceTexture,
    pub(super) view: wgpu::TextureView,
    pub(super) encoder: wgpu::CommandEncoder,
}

impl SurfaceFrame {
    /// Records a pass that clears the whole texture to `color`.
    pub fn clear(&mut self, color: ColorRgba) {
        let [r, g, b, a] = color.to_array().map(f64::from);
        self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("orrery surface clear"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    }
}
