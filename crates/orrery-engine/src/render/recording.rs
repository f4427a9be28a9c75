//! Graphics context that records instead of drawing.
//!
//! Used to observe what the render callstack asks of a device: every call
//! becomes a [`GraphicsCommand`], and draws capture the effective matrices
//! and fragment state at the time they were issued.

use std::rc::Rc;

use crate::coords::{ColorRgba, Viewport};
use crate::light::Light;
use crate::math::Mat4;

use super::graphics::{
    AccumOp, AlphaTest, BlendFunc, ClearBuffers, DepthFunc, DeviceCapabilities, DrawBuffer,
    GraphicsContext, GraphicsError, Image, LightModel, MatrixStack, Topology, Vertex,
};
use super::state::FixedFunctionState;

/// Snapshot of the state a primitive was submitted with.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub topology: Topology,
    pub vertex_count: usize,
    pub projection: Mat4,
    pub modelview: Mat4,
    pub draw_buffer: DrawBuffer,
    pub blend: BlendFunc,
    pub alpha_test: AlphaTest,
    pub depth_mask: bool,
    pub lighting: bool,
    pub textured: bool,
    pub enabled_lights: usize,
    pub enabled_clip_planes: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GraphicsCommand {
    LoadMatrix(MatrixStack, Mat4),
    MultMatrix(MatrixStack, Mat4),
    PushMatrix(MatrixStack),
    PopMatrix(MatrixStack),
    Viewport(Viewport),
    ClearColor(ColorRgba),
    Clear(ClearBuffers),
    DrawBuffer(DrawBuffer),
    DepthTest(Option<DepthFunc>),
    DepthMask(bool),
    Blend(BlendFunc),
    AlphaTest(AlphaTest),
    PolygonOffset(Option<(f32, f32)>),
    Lighting(bool),
    LightModel(Option<LightModel>),
    Light { slot: usize, enabled: bool },
    ClipPlane { slot: usize, plane: Option<[f64; 4]> },
    Accum(AccumOp),
    ReadPixels(Viewport),
    DrawPixels { width: u32, height: u32 },
    OitReshape { width: u32, height: u32, layers: u32 },
    OitBeginLayer(u32),
    OitEndLayer(u32),
    OitComposite(BlendFunc),
    BindTexture(bool),
    Draw(DrawRecord),
}

pub struct RecordingContext {
    capabilities: DeviceCapabilities,
    state: FixedFunctionState,
    commands: Vec<GraphicsCommand>,
    pixel_readback: bool,
}

impl RecordingContext {
    pub fn new(capabilities: DeviceCapabilities) -> Self {
        Self {
            state: FixedFunctionState::new(capabilities.max_lights, capabilities.max_clip_planes),
            capabilities,
            commands: Vec::new(),
            pixel_readback: true,
        }
    }

    /// Makes `read_pixels` fail as unsupported. The attempt is still recorded.
    pub fn without_read_pixels(mut self) -> Self {
        self.pixel_readback = false;
        self
    }

    pub fn commands(&self) -> &[GraphicsCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<GraphicsCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn state(&self) -> &FixedFunctionState {
        &self.state
    }

    pub fn draws(&self) -> impl Iterator<Item = &DrawRecord> {
        self.commands.iter().filter_map(|c| match c {
            GraphicsCommand::Draw(d) => Some(d),
            _ => None,
        })
    }

    pub fn count(&self, pred: impl Fn(&GraphicsCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }

    fn record(&mut self, cmd: GraphicsCommand) {
        self.commands.push(cmd);
    }
}

impl Default for RecordingContext {
    fn default() -> Self {
        Self::new(DeviceCapabilities::default())
    }
}

impl GraphicsContext for RecordingContext {
    fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities
    }

    fn load_matrix(&mut self, stack: MatrixStack, m: &Mat4) {
        self.state.load(stack, m);
        self.record(GraphicsCommand::LoadMatrix(stack, *m));
    }

    fn mult_matrix(&mut self, stack: MatrixStack, m: &Mat4) {
        self.state.mult(stack, m);
        self.record(GraphicsCommand::MultMatrix(stack, *m));
    }

    fn push_matrix(&mut self, stack: MatrixStack) {
        self.state.push(stack);
        self.record(GraphicsCommand::PushMatrix(stack));
    }

    fn pop_matrix(&mut self, stack: MatrixStack) {
        self.state.pop(stack);
        self.record(GraphicsCommand::PopMatrix(stack));
    }

    fn current_matrix(&self, stack: MatrixStack) -> Mat4 {
        self.state.top(stack)
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.state.viewport = viewport;
        self.record(GraphicsCommand::Viewport(viewport));
    }

    fn set_clear_color(&mut self, color: ColorRgba) {
        self.state.clear_color = color;
        self.record(GraphicsCommand::ClearColor(color));
    }

    fn clear(&mut self, buffers: ClearBuffers) {
        self.record(GraphicsCommand::Clear(buffers));
    }

    fn set_draw_buffer(&mut self, buffer: DrawBuffer) {
        self.state.draw_buffer = buffer;
        self.record(GraphicsCommand::DrawBuffer(buffer));
    }

    fn set_depth_test(&mut self, func: Option<DepthFunc>) {
        self.state.depth_test = func;
        self.record(GraphicsCommand::DepthTest(func));
    }

    fn set_depth_mask(&mut self, write: bool) {
        self.state.depth_mask = write;
        self.record(GraphicsCommand::DepthMask(write));
    }

    fn set_blend(&mut self, blend: BlendFunc) {
        self.state.blend = blend;
        self.record(GraphicsCommand::Blend(blend));
    }

    fn set_alpha_test(&mut self, test: AlphaTest) {
        self.state.alpha_test = test;
        self.record(GraphicsCommand::AlphaTest(test));
    }

    fn set_polygon_offset(&mut self, offset: Option<(f32, f32)>) {
        self.state.polygon_offset = offset;
        self.record(GraphicsCommand::PolygonOffset(offset));
    }

    fn set_lighting(&mut self, enabled: bool) {
        self.state.lighting = enabled;
        self.record(GraphicsCommand::Lighting(enabled));
    }

    fn set_light_model(&mut self, model: Option<LightModel>) {
        self.state.light_model = model;
        self.record(GraphicsCommand::LightModel(model));
    }

    fn set_light(&mut self, slot: usize, light: Option<&Light>) {
        self.state.set_light(slot, light);
        self.record(GraphicsCommand::Light { slot, enabled: light.is_some() });
    }

    fn set_clip_plane(&mut self, slot: usize, plane: Option<[f64; 4]>) {
        self.state.set_clip_plane(slot, plane);
        self.record(GraphicsCommand::ClipPlane { slot, plane });
    }

    fn accumulate(&mut self, op: AccumOp) -> Result<(), GraphicsError> {
        if !self.capabilities.accumulation {
            return Err(GraphicsError::Unsupported("accumulation buffer"));
        }
        self.record(GraphicsCommand::Accum(op));
        Ok(())
    }

    fn read_pixels(&mut self, viewport: Viewport) -> Result<Image, GraphicsError> {
        self.record(GraphicsCommand::ReadPixels(viewport));
        if !self.pixel_readback {
            return Err(GraphicsError::Unsupported("read pixels"));
        }
        let c = self.state.clear_color.to_array().map(|v| (v.clamp(0.0, 1.0) * 255.0) as u8);
        Ok(Image::filled(viewport.width.max(0) as u32, viewport.height.max(0) as u32, c))
    }

    fn draw_pixels(&mut self, image: &Image) {
        self.record(GraphicsCommand::DrawPixels { width: image.width, height: image.height });
    }

    fn oit_reshape(&mut self, width: u32, height: u32, layers: u32) -> Result<(), GraphicsError> {
        if !self.capabilities.order_independent_transparency {
            return Err(GraphicsError::Unsupported("order independent transparency"));
        }
        self.record(GraphicsCommand::OitReshape { width, height, layers });
        Ok(())
    }

    fn oit_begin_layer(&mut self, layer: u32) {
        self.record(GraphicsCommand::OitBeginLayer(layer));
    }

    fn oit_end_layer(&mut self, layer: u32) {
        self.record(GraphicsCommand::OitEndLayer(layer));
    }

    fn oit_composite(&mut self, blend: BlendFunc) {
        self.record(GraphicsCommand::OitComposite(blend));
    }

    fn bind_texture(&mut self, texture: Option<&Rc<Image>>) {
        self.state.texture = texture.cloned();
        self.record(GraphicsCommand::BindTexture(texture.is_some()));
    }

    fn draw(&mut self, topology: Topology, vertices: &[Vertex]) {
        let s = &self.state;
        let rec = DrawRecord {
            topology,
            vertex_count: vertices.len(),
            projection: s.top(MatrixStack::Projection),
            modelview: s.top(MatrixStack::Modelview),
            draw_buffer: s.draw_buffer,
            blend: s.blend,
            alpha_test: s.alpha_test,
            depth_mask: s.depth_mask,
            lighting: s.lighting,
            textured: s.texture.is_some(),
            enabled_lights: s.enabled_lights().count(),
            enabled_clip_planes: s.enabled_clip_planes().count(),
        };
        self.record(GraphicsCommand::Draw(rec));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    #[test]
    fn draw_captures_effective_matrices() {
        let mut gfx = RecordingContext::default();
        let t = Mat4::translation(Vec3::new(0.0, 0.0, -3.0));
        gfx.load_matrix(MatrixStack::Modelview, &t);
        gfx.push_matrix(MatrixStack::Projection);
        gfx.mult_matrix(MatrixStack::Projection, &Mat4::scale(Vec3::new(2.0, 2.0, 2.0)));
        gfx.draw(Topology::Triangles, &[Vertex::new([0.0; 3], [0.0, 0.0, 1.0], [1.0; 4]); 3]);
        gfx.pop_matrix(MatrixStack::Projection);

        let d = gfx.draws().next().cloned().unwrap();
        assert_eq!(d.modelview, t);
        assert_eq!(d.projection.m[0][0], 2.0);
        assert_eq!(d.vertex_count, 3);
        assert_eq!(gfx.current_matrix(MatrixStack::Projection), Mat4::IDENTITY);
    }

    #[test]
    fn capability_gated_operations_fail_without_support() {
        let mut gfx = RecordingContext::default();
        assert!(gfx.accumulate(AccumOp::Load(0.5)).is_err());
        assert!(gfx.oit_reshape(4, 4, 2).is_err());
        assert!(gfx.commands().is_empty());

        let mut gfx = RecordingContext::new(DeviceCapabilities {
            accumulation: true,
            order_independent_transparency: true,
            ..DeviceCapabilities::default()
        });
        assert!(gfx.accumulate(AccumOp::Load(0.5)).is_ok());
        assert!(gfx.oit_reshape(4, 4, 2).is_ok());
        assert_eq!(gfx.commands().len(), 2);
    }

    #[test]
    fn read_pixels_returns_viewport_sized_image() {
        let mut gfx = RecordingContext::default();
        gfx.set_clear_color(ColorRgba::white());
        let img = gfx.read_pixels(Viewport::from_size(3, 2)).unwrap();
        assert_eq!((img.width, img.height), (3, 2));
        assert_eq!(&img.pixels[..4], &[255, 255, 255, 255]);
    }
}
