use std::collections::HashMap;

use crate::render::graphics::{BlendFunc, DepthFunc, Topology};

use super::vertex::GpuVertex;

pub(super) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Everything about a draw that needs a distinct render pipeline.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub(super) struct PipelineKey {
    pub topology: Topology,
    pub blend: BlendFunc,
    /// `None` disables the test and, with it, depth writes.
    pub depth_test: Option<DepthFunc>,
    pub depth_write: bool,
    /// `(constant, slope_scale bits)`; only ever set for triangles.
    pub depth_bias: Option<(i32, u32)>,
}

impl PipelineKey {
    pub fn new(
        topology: Topology,
        blend: BlendFunc,
        depth_test: Option<DepthFunc>,
        depth_mask: bool,
        polygon_offset: Option<(f32, f32)>,
    ) -> Self {
        let filled = matches!(topology, Topology::Triangles | Topology::TriangleStrip);
        Self {
            topology,
            blend,
            depth_test,
            depth_write: depth_test.is_some() && depth_mask,
            depth_bias: polygon_offset
                .filter(|_| filled)
                .map(|(factor, units)| (units.round() as i32, factor.to_bits())),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self.topology, Topology::Points | Topology::Lines | Topology::Triangles)
    }

    fn primitive_topology(&self) -> wgpu::PrimitiveTopology {
        match self.topology {
            Topology::Points => wgpu::PrimitiveTopology::PointList,
            Topology::Lines => wgpu::PrimitiveTopology::LineList,
            Topology::LineStrip => wgpu::PrimitiveTopology::LineStrip,
            Topology::Triangles => wgpu::PrimitiveTopology::TriangleList,
            Topology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        }
    }

    fn blend_state(&self) -> Option<wgpu::BlendState> {
        match self.blend {
            BlendFunc::Disabled => None,
            BlendFunc::Alpha => Some(wgpu::BlendState::ALPHA_BLENDING),
            BlendFunc::SeparateAlpha => Some(wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                    operation: wgpu::BlendOperation::Add,
                },
            }),
        }
    }

    fn depth_stencil(&self) -> wgpu::DepthStencilState {
        let depth_compare = match self.depth_test {
            None => wgpu::CompareFunction::Always,
            Some(DepthFunc::Less) => wgpu::CompareFunction::Less,
            Some(DepthFunc::LessEqual) => wgpu::CompareFunction::LessEqual,
            Some(DepthFunc::Always) => wgpu::CompareFunction::Always,
        };
        let bias = match self.depth_bias {
            Some((constant, slope)) => wgpu::DepthBiasState {
                constant,
                slope_scale: f32::from_bits(slope),
                clamp: 0.0,
            },
            None => wgpu::DepthBiasState::default(),
        };
        wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: self.depth_write,
            depth_compare,
            stencil: Default::default(),
            bias,
        }
    }
}

/// Lazily built pipelines sharing one shader and one texture binding layout.
#[derive(Default)]
pub(super) struct PipelineCache {
    format: Option<wgpu::TextureFormat>,
    shader: Option<wgpu::ShaderModule>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    layout: Option<wgpu::PipelineLayout>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl PipelineCache {
    /// Builds the shared objects; a new surface format invalidates every pipeline.
    pub fn ensure_shared(&mut self, device: &wgpu::Device, format: wgpu::TextureFormat) {
        if self.format == Some(format) && self.layout.is_some() {
            return;
        }

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("orrery scene shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("orrery texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("orrery scene pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        log::debug!("scene pipelines rebuilt for {format:?}");
        self.format = Some(format);
        self.shader = Some(shader);
        self.bind_group_layout = Some(bind_group_layout);
        self.layout = Some(layout);
        self.pipelines.clear();
    }

    pub fn bind_group_layout(&self) -> Option<&wgpu::BindGroupLayout> {
        self.bind_group_layout.as_ref()
    }

    pub fn ensure(&mut self, device: &wgpu::Device, key: PipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        let Some(format) = self.format else { return };
        let Some(shader) = self.shader.as_ref() else { return };
        let Some(layout) = self.layout.as_ref() else { return };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("orrery scene pipeline"),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[GpuVertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: key.blend_state(),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: key.primitive_topology(),
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(key.depth_stencil()),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });
        self.pipelines.insert(key, pipeline);
    }

    pub fn get(&self, key: &PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_depth_test_never_writes() {
        let key = PipelineKey::new(Topology::Triangles, BlendFunc::Alpha, None, true, None);
        assert!(!key.depth_write);
        let ds = key.depth_stencil();
        assert_eq!(ds.depth_compare, wgpu::CompareFunction::Always);
        assert!(!ds.depth_write_enabled);
    }

    #[test]
    fn depth_mask_controls_writes() {
        let on = PipelineKey::new(Topology::Triangles, BlendFunc::Alpha, Some(DepthFunc::Less), true, None);
        let off = PipelineKey { depth_write: false, ..on };
        assert!(on.depth_write);
        assert_ne!(on, off);
        assert_eq!(on.depth_stencil().depth_compare, wgpu::CompareFunction::Less);
    }

    #[test]
    fn polygon_offset_only_biases_filled_primitives() {
        let offset = Some((1.5, 1e-6));
        let tri = PipelineKey::new(Topology::Triangles, BlendFunc::Disabled, Some(DepthFunc::Less), true, offset);
        let line = PipelineKey::new(Topology::Lines, BlendFunc::Disabled, Some(DepthFunc::Less), true, offset);
        assert_eq!(tri.depth_stencil().bias.slope_scale, 1.5);
        assert!(line.depth_bias.is_none());
    }

    #[test]
    fn blend_modes_map_to_wgpu_states() {
        let key = |blend| PipelineKey::new(Topology::Triangles, blend, None, true, None);
        assert!(key(BlendFunc::Disabled).blend_state().is_none());
        assert_eq!(key(BlendFunc::Alpha).blend_state(), Some(wgpu::BlendState::ALPHA_BLENDING));
        let separate = key(BlendFunc::SeparateAlpha).blend_state();
        assert_eq!(separate.map(|b| b.alpha.src_factor), Some(wgpu::BlendFactor::One));
    }

    #[test]
    fn strips_are_not_mergeable() {
        let key = |t| PipelineKey::new(t, BlendFunc::Disabled, None, true, None);
        assert!(key(Topology::Lines).is_list());
        assert!(!key(Topology::LineStrip).is_list());
        assert!(!key(Topology::TriangleStrip).is_list());
    }
}
