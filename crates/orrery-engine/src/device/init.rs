/// Adapter, device and surface preferences for [`Gpu::new`](super::Gpu::new).
///
/// Preferences the surface cannot honour are replaced by something it
/// supports; only a surface without any format is an error.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Pick an sRGB format when there is one. Vertex colours are linear and
    /// get encoded on write.
    pub prefer_srgb: bool,
    /// Falls back to FIFO when unsupported.
    pub present_mode: wgpu::PresentMode,
    /// `None` takes the surface's first alpha mode.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,
    pub power_preference: wgpu::PowerPreference,
    /// The scene backend itself needs no optional features.
    pub required_features: wgpu::Features,
    pub required_limits: wgpu::Limits,
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            power_preference: wgpu::PowerPreference::HighPerformance,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
        }
    }
}
