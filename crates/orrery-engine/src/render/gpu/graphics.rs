use std::rc::Rc;

use crate::coords::{ColorRgba, Viewport};
use crate::light::Light;
use crate::math::Mat4;
use crate::render::graphics::{
    AccumOp, AlphaTest, BlendFunc, ClearBuffers, DepthFunc, DeviceCapabilities, DrawBuffer,
    GraphicsContext, GraphicsError, Image, LightModel, MatrixStack, Topology, Vertex,
};
use crate::render::state::FixedFunctionState;
use crate::render::FrameEncoder;

use super::pipeline::{PipelineCache, PipelineKey, DEPTH_FORMAT};
use super::vertex::{process_vertices, GpuVertex, CLIP_SLOTS};

const MAX_LIGHTS: usize = 8;

/// Contiguous vertices drawn with one pipeline, texture and viewport.
#[derive(Debug, Clone)]
struct Batch {
    key: PipelineKey,
    texture: Option<Rc<Image>>,
    viewport: Viewport,
    first: u32,
    count: u32,
}

impl Batch {
    fn accepts(&self, key: &PipelineKey, texture: Option<&Rc<Image>>, viewport: Viewport) -> bool {
        self.key == *key
            && key.is_list()
            && self.viewport == viewport
            && match (&self.texture, texture) {
                (None, None) => true,
                (Some(a), Some(b)) => Rc::ptr_eq(a, b),
                _ => false,
            }
    }
}

/// One wgpu render pass; a new one starts at every clear.
#[derive(Debug, Clone, Default)]
struct Pass {
    clear_color: Option<ColorRgba>,
    clear_depth: bool,
    batches: Vec<Batch>,
}

struct GpuTexture {
    image: Rc<Image>,
    bind_group: wgpu::BindGroup,
}

/// [`GraphicsContext`] on top of wgpu.
///
/// Calls made during a frame are resolved on the CPU into clip-space
/// vertices and grouped into passes; [`WgpuGraphics::flush`] uploads them and
/// encodes the passes into the frame's command encoder. There is no
/// accumulation buffer, order-independent transparency or stereo target, and
/// the capabilities say so.
pub struct WgpuGraphics {
    state: FixedFunctionState,
    capabilities: DeviceCapabilities,

    vertices: Vec<GpuVertex>,
    passes: Vec<Pass>,

    pipelines: PipelineCache,
    sampler: Option<wgpu::Sampler>,
    white: Option<wgpu::BindGroup>,
    textures: Vec<GpuTexture>,

    depth_view: Option<wgpu::TextureView>,
    depth_size: (u32, u32),

    vbo: Option<wgpu::Buffer>,
    vbo_capacity: usize,
}

impl Default for WgpuGraphics {
    fn default() -> Self {
        Self::new()
    }
}

impl WgpuGraphics {
    pub fn new() -> Self {
        let capabilities = DeviceCapabilities {
            accumulation: false,
            order_independent_transparency: false,
            true_alpha_blending: true,
            stereo: false,
            double_buffered: true,
            max_lights: MAX_LIGHTS,
            max_clip_planes: CLIP_SLOTS,
        };
        Self {
            state: FixedFunctionState::new(capabilities.max_lights, capabilities.max_clip_planes),
            capabilities,
            vertices: Vec::new(),
            passes: Vec::new(),
            pipelines: PipelineCache::default(),
            sampler: None,
            white: None,
            textures: Vec::new(),
            depth_view: None,
            depth_size: (0, 0),
            vbo: None,
            vbo_capacity: 0,
        }
    }

    /// Draw calls waiting for the next [`flush`](Self::flush).
    pub fn pending_batches(&self) -> usize {
        self.passes.iter().map(|p| p.batches.len()).sum()
    }

    pub fn pending_passes(&self) -> usize {
        self.passes.len()
    }

    fn current_pass(&mut self) -> &mut Pass {
        if self.passes.is_empty() {
            self.passes.push(Pass::default());
        }
        let last = self.passes.len() - 1;
        &mut self.passes[last]
    }

    fn push_vertices(&mut self, key: PipelineKey, texture: Option<Rc<Image>>, vertices: &[GpuVertex]) {
        if vertices.is_empty() {
            return;
        }
        let first = self.vertices.len() as u32;
        let count = vertices.len() as u32;
        self.vertices.extend_from_slice(vertices);

        let viewport = self.state.viewport;
        let pass = self.current_pass();
        if let Some(last) = pass.batches.last_mut() {
            if last.accepts(&key, texture.as_ref(), viewport) && last.first + last.count == first {
                last.count += count;
                return;
            }
        }
        pass.batches.push(Batch { key, texture, viewport, first, count });
    }

    /// Uploads everything recorded since the last flush and encodes it into
    /// `frame`. The recorded passes are consumed either way.
    pub fn flush(&mut self, frame: &mut FrameEncoder<'_>) {
        let passes = std::mem::take(&mut self.passes);
        let vertices = std::mem::take(&mut self.vertices);
        if passes.is_empty() {
            self.vertices = vertices;
            return;
        }

        let (width, height) = frame.extent();

        self.pipelines.ensure_shared(frame.device, frame.format);
        self.ensure_sampler(frame);
        self.ensure_depth(frame, width, height);
        self.ensure_vertex_capacity(frame, vertices.len());
        for batch in passes.iter().flat_map(|p| &p.batches) {
            self.pipelines.ensure(frame.device, batch.key);
            if let Some(image) = &batch.texture {
                self.ensure_texture(frame, image);
            }
        }
        self.textures.retain(|t| {
            passes
                .iter()
                .flat_map(|p| &p.batches)
                .any(|b| b.texture.as_ref().is_some_and(|i| Rc::ptr_eq(i, &t.image)))
        });

        if let Some(vbo) = self.vbo.as_ref() {
            if !vertices.is_empty() {
                frame.queue.write_buffer(vbo, 0, bytemuck::cast_slice(&vertices));
            }
        }

        self.encode(frame, &passes, width, height);

        self.vertices = vertices;
        self.vertices.clear();
    }

    fn encode(&self, frame: &mut FrameEncoder<'_>, passes: &[Pass], width: u32, height: u32) {
        let Some(depth_view) = self.depth_view.as_ref() else { return };
        let Some(vbo) = self.vbo.as_ref() else { return };
        let Some(white) = self.white.as_ref() else { return };

        for pass in passes {
            let color_load = match pass.clear_color {
                Some(c) => wgpu::LoadOp::Clear(wgpu::Color {
                    r: c.r as f64,
                    g: c.g as f64,
                    b: c.b as f64,
                    a: c.a as f64,
                }),
                None => wgpu::LoadOp::Load,
            };
            let depth_load =
                if pass.clear_depth { wgpu::LoadOp::Clear(1.0) } else { wgpu::LoadOp::Load };

            let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("orrery scene pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: frame.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations { load: color_load, store: wgpu::StoreOp::Store },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            if pass.batches.is_empty() {
                continue;
            }
            rpass.set_vertex_buffer(0, vbo.slice(..));

            for batch in &pass.batches {
                let Some(rect) = viewport_rect(batch.viewport, width, height) else { continue };
                let Some(pipeline) = self.pipelines.get(&batch.key) else { continue };
                let bind_group = match &batch.texture {
                    Some(image) => match self.texture_bind_group(image) {
                        Some(bg) => bg,
                        None => continue,
                    },
                    None => white,
                };
                let [x, y, w, h] = rect;
                rpass.set_viewport(x, y, w, h, 0.0, 1.0);
                rpass.set_pipeline(pipeline);
                rpass.set_bind_group(0, bind_group, &[]);
                rpass.draw(batch.first..batch.first + batch.count, 0..1);
            }
        }
    }

    fn texture_bind_group(&self, image: &Rc<Image>) -> Option<&wgpu::BindGroup> {
        self.textures.iter().find(|t| Rc::ptr_eq(&t.image, image)).map(|t| &t.bind_group)
    }

    fn ensure_sampler(&mut self, frame: &FrameEncoder<'_>) {
        if self.sampler.is_some() && self.white.is_some() {
            return;
        }
        let sampler = frame.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("orrery texture sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        self.sampler = Some(sampler);
        self.white = self.create_bind_group(frame, &Image::filled(1, 1, [255; 4]));
    }

    fn ensure_texture(&mut self, frame: &FrameEncoder<'_>, image: &Rc<Image>) {
        if self.texture_bind_group(image).is_some() {
            return;
        }
        if let Some(bind_group) = self.create_bind_group(frame, image) {
            self.textures.push(GpuTexture { image: Rc::clone(image), bind_group });
        }
    }

    fn create_bind_group(&self, frame: &FrameEncoder<'_>, image: &Image) -> Option<wgpu::BindGroup> {
        let layout = self.pipelines.bind_group_layout()?;
        let sampler = self.sampler.as_ref()?;
        if image.width == 0 || image.height == 0 {
            log::warn!("skipping empty {}x{} texture", image.width, image.height);
            return None;
        }

        let size = wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        };
        let texture = frame.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("orrery image texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        frame.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(image.width * 4),
                rows_per_image: Some(image.height),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Some(frame.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("orrery image bind group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        }))
    }

    fn ensure_depth(&mut self, frame: &FrameEncoder<'_>, width: u32, height: u32) {
        if self.depth_view.is_some() && self.depth_size == (width, height) {
            return;
        }
        let texture = frame.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("orrery depth"),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        self.depth_view = Some(texture.create_view(&wgpu::TextureViewDescriptor::default()));
        self.depth_size = (width, height);
    }

    fn ensure_vertex_capacity(&mut self, frame: &FrameEncoder<'_>, required: usize) {
        if required <= self.vbo_capacity && self.vbo.is_some() {
            return;
        }
        let new_cap = required.next_power_of_two().max(1024);
        self.vbo = Some(frame.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("orrery scene vbo"),
            size: (new_cap * std::mem::size_of::<GpuVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.vbo_capacity = new_cap;
    }
}

/// Bottom-left viewport clamped to the target, as wgpu's top-left
/// `[x, y, width, height]`.
fn viewport_rect(vp: Viewport, width: u32, height: u32) -> Option<[f32; 4]> {
    let (tw, th) = (width as i64, height as i64);
    let x0 = (vp.x as i64).clamp(0, tw);
    let x1 = (vp.x as i64 + vp.width as i64).clamp(0, tw);
    let y0 = (vp.y as i64).clamp(0, th);
    let y1 = (vp.y as i64 + vp.height as i64).clamp(0, th);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some([x0 as f32, (th - y1) as f32, (x1 - x0) as f32, (y1 - y0) as f32])
}

impl GraphicsContext for WgpuGraphics {
    fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities
    }

    fn load_matrix(&mut self, stack: MatrixStack, m: &Mat4) {
        self.state.load(stack, m);
    }

    fn mult_matrix(&mut self, stack: MatrixStack, m: &Mat4) {
        self.state.mult(stack, m);
    }

    fn push_matrix(&mut self, stack: MatrixStack) {
        self.state.push(stack);
    }

    fn pop_matrix(&mut self, stack: MatrixStack) {
        self.state.pop(stack);
    }

    fn current_matrix(&self, stack: MatrixStack) -> Mat4 {
        self.state.top(stack)
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.state.viewport = viewport;
    }

    fn set_clear_color(&mut self, color: ColorRgba) {
        self.state.clear_color = color;
    }

    fn clear(&mut self, buffers: ClearBuffers) {
        if !buffers.color && !buffers.depth {
            return;
        }
        let mergeable = self.passes.last().is_some_and(|p| p.batches.is_empty());
        if !mergeable {
            self.passes.push(Pass::default());
        }
        let color = self.state.clear_color;
        let pass = self.current_pass();
        if buffers.color {
            pass.clear_color = Some(color);
        }
        if buffers.depth {
            pass.clear_depth = true;
        }
    }

    fn set_draw_buffer(&mut self, buffer: DrawBuffer) {
        // a single mono surface: every buffer resolves to it
        self.state.draw_buffer = buffer;
    }

    fn set_depth_test(&mut self, func: Option<DepthFunc>) {
        self.state.depth_test = func;
    }

    fn set_depth_mask(&mut self, write: bool) {
        self.state.depth_mask = write;
    }

    fn set_blend(&mut self, blend: BlendFunc) {
        self.state.blend = blend;
    }

    fn set_alpha_test(&mut self, test: AlphaTest) {
        self.state.alpha_test = test;
    }

    fn set_polygon_offset(&mut self, offset: Option<(f32, f32)>) {
        self.state.polygon_offset = offset;
    }

    fn set_lighting(&mut self, enabled: bool) {
        self.state.lighting = enabled;
    }

    fn set_light_model(&mut self, model: Option<LightModel>) {
        self.state.light_model = model;
    }

    fn set_light(&mut self, slot: usize, light: Option<&Light>) {
        self.state.set_light(slot, light);
    }

    fn set_clip_plane(&mut self, slot: usize, plane: Option<[f64; 4]>) {
        self.state.set_clip_plane(slot, plane);
    }

    fn accumulate(&mut self, _op: AccumOp) -> Result<(), GraphicsError> {
        Err(GraphicsError::Unsupported("accumulation buffer"))
    }

    fn read_pixels(&mut self, _viewport: Viewport) -> Result<Image, GraphicsError> {
        Err(GraphicsError::Unsupported("pixel read-back"))
    }

    fn draw_pixels(&mut self, image: &Image) {
        let key = PipelineKey::new(Topology::Triangles, BlendFunc::Disabled, None, false, None);
        let quad = [
            GpuVertex::screen([-1.0, -1.0, 0.0, 1.0], [0.0, 0.0]),
            GpuVertex::screen([1.0, -1.0, 0.0, 1.0], [1.0, 0.0]),
            GpuVertex::screen([1.0, 1.0, 0.0, 1.0], [1.0, 1.0]),
            GpuVertex::screen([-1.0, -1.0, 0.0, 1.0], [0.0, 0.0]),
            GpuVertex::screen([1.0, 1.0, 0.0, 1.0], [1.0, 1.0]),
            GpuVertex::screen([-1.0, 1.0, 0.0, 1.0], [0.0, 1.0]),
        ];
        self.push_vertices(key, Some(Rc::new(image.clone())), &quad);
    }

    fn oit_reshape(&mut self, _width: u32, _height: u32, _layers: u32) -> Result<(), GraphicsError> {
        Err(GraphicsError::Unsupported("order independent transparency"))
    }

    fn oit_begin_layer(&mut self, layer: u32) {
        log::debug!("ignoring oit layer {layer} begin");
    }

    fn oit_end_layer(&mut self, layer: u32) {
        log::debug!("ignoring oit layer {layer} end");
    }

    fn oit_composite(&mut self, _blend: BlendFunc) {}

    fn bind_texture(&mut self, texture: Option<&Rc<Image>>) {
        self.state.texture = texture.cloned();
    }

    fn draw(&mut self, topology: Topology, vertices: &[Vertex]) {
        let s = &self.state;
        let key = PipelineKey::new(topology, s.blend, s.depth_test, s.depth_mask, s.polygon_offset);
        let texture = s.texture.clone();
        let mut out = Vec::with_capacity(vertices.len());
        process_vertices(s, vertices, &mut out);
        self.push_vertices(key, texture, &out);
    }
}
