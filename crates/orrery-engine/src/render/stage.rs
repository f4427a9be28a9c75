//! Render stages.
//!
//! Each stage applies its own effect and hands over to the remainder of the
//! callstack through [`Rest`], possibly several times (multi-pass effects).
//! Only [`RenderStage::ExecuteScene`] ends the chain.

use crate::light::Light;
use crate::math::{Mat4, Vec3};
use crate::scene::SceneDrawContext;
use crate::viewer::{StereoMode, TransparencyMode};

use super::background::draw_background;
use super::callstack::call_next;
use super::graphics::{
    AccumOp, AlphaTest, ClearBuffers, DrawBuffer, GraphicsContext, GraphicsError, MatrixStack,
};
use super::rendering::{LightSlotAllocator, RenderingContext};

const JITTER_2: [(f64, f64); 2] = [(0.25, 0.75), (0.75, 0.25)];
const JITTER_4: [(f64, f64); 4] = [(0.375, 0.25), (0.125, 0.75), (0.875, 0.25), (0.625, 0.75)];
const JITTER_8: [(f64, f64); 8] = [
    (0.5625, 0.4375),
    (0.0625, 0.9375),
    (0.3125, 0.6875),
    (0.6875, 0.8125),
    (0.8125, 0.1875),
    (0.9375, 0.5625),
    (0.4375, 0.0625),
    (0.1875, 0.3125),
];

/// Returning slightly more than the average keeps a white background white.
const ACCUM_RETURN_SCALE: f32 = 1.001;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RenderStage {
    /// Draws from, or refreshes, the cached frame image.
    PixelBuffer,
    /// Identity projection for the frame; window projection afterwards.
    InitialiseMatrices,
    Antialias,
    DepthOfField,
    /// One pass per scene layer.
    Layers,
    Background,
    ModelviewLightsClipPlanes,
    Stereo,
    Transparency(TransparencyMode),
    ApplyProjection,
    ExecuteScene,
}

/// The stages after the current one.
#[derive(Debug, Copy, Clone)]
pub struct Rest<'s>(pub(super) &'s [RenderStage]);

impl Rest<'_> {
    /// Runs the remaining stages once.
    #[inline]
    pub fn call(self, rc: &mut RenderingContext<'_>) -> bool {
        call_next(self.0, rc)
    }

    pub fn stages(&self) -> &[RenderStage] {
        self.0
    }
}

impl RenderStage {
    pub fn run(self, rc: &mut RenderingContext<'_>, rest: Rest<'_>) -> bool {
        match self {
            RenderStage::PixelBuffer => pixel_buffer(rc, rest),
            RenderStage::InitialiseMatrices => initialise_matrices(rc, rest),
            RenderStage::Antialias => antialias(rc, rest),
            RenderStage::DepthOfField => depth_of_field(rc, rest),
            RenderStage::Layers => layers(rc, rest),
            RenderStage::Background => background(rc, rest),
            RenderStage::ModelviewLightsClipPlanes => modelview_lights_clip_planes(rc, rest),
            RenderStage::Stereo => stereo(rc, rest),
            RenderStage::Transparency(TransparencyMode::Fast) => rest.call(rc),
            RenderStage::Transparency(TransparencyMode::Slow) => slow_transparency(rc, rest),
            RenderStage::Transparency(TransparencyMode::OrderIndependent) => {
                order_independent_transparency(rc, rest)
            }
            RenderStage::ApplyProjection => apply_projection(rc, rest),
            RenderStage::ExecuteScene => execute_scene(rc),
        }
    }
}

fn pixel_buffer(rc: &mut RenderingContext<'_>, rest: Rest<'_>) -> bool {
    if rc.pixel_buffer.needs_update() {
        let ok = rest.call(rc);
        if rc.pixel_buffer.capture_unsupported {
            return ok;
        }
        match rc.gfx.read_pixels(rc.viewport) {
            Ok(image) => {
                rc.pixel_buffer.image = Some(image);
                rc.pixel_buffer.update_requested = false;
            }
            Err(GraphicsError::Unsupported(what)) => {
                log::warn!("pixel buffer unavailable ({what} unsupported); rendering every frame");
                rc.pixel_buffer.capture_unsupported = true;
            }
            Err(e) => log::warn!("pixel buffer capture failed: {e}"),
        }
        return ok;
    }
    rc.gfx.set_clear_color(rc.viewer.background_color());
    rc.gfx.clear(ClearBuffers::COLOR_DEPTH);
    if let Some(image) = &rc.pixel_buffer.image {
        rc.gfx.draw_pixels(image);
    }
    true
}

fn initialise_matrices(rc: &mut RenderingContext<'_>, rest: Rest<'_>) -> bool {
    rc.gfx.load_matrix(MatrixStack::Projection, &Mat4::IDENTITY);
    let ok = rest.call(rc);
    // leave the full transform in place for picking after the frame
    rc.gfx.load_matrix(MatrixStack::Projection, &rc.viewer.matrices().window_projection);
    ok
}

/// Renders the rest once per jitter entry and averages the passes in the
/// accumulation buffer. Without one, renders once unjittered.
fn accumulate_passes(
    rc: &mut RenderingContext<'_>,
    rest: Rest<'_>,
    passes: usize,
    jitter: impl Fn(usize, &RenderingContext<'_>) -> Mat4,
) -> bool {
    if !rc.gfx.capabilities().accumulation {
        rc.stats.accumulation_unsupported = true;
        return rest.call(rc);
    }
    let weight = 1.0 / passes as f32;
    let mut ok = true;
    for pass in 0..passes {
        let m = jitter(pass, rc);
        rc.gfx.push_matrix(MatrixStack::Projection);
        rc.gfx.mult_matrix(MatrixStack::Projection, &m);
        ok &= rest.call(rc);
        rc.gfx.pop_matrix(MatrixStack::Projection);
        let op = if pass == 0 { AccumOp::Load(weight) } else { AccumOp::Accumulate(weight) };
        if let Err(e) = rc.gfx.accumulate(op) {
            log::warn!("accumulation pass {pass} failed: {e}");
            ok = false;
        }
    }
    if let Err(e) = rc.gfx.accumulate(AccumOp::Return(ACCUM_RETURN_SCALE)) {
        log::warn!("accumulation return failed: {e}");
        ok = false;
    }
    ok
}

fn jitter_table(samples: u32) -> &'static [(f64, f64)] {
    match samples {
        2 => &JITTER_2,
        4 => &JITTER_4,
        8 => &JITTER_8,
        _ => &[],
    }
}

fn antialias(rc: &mut RenderingContext<'_>, rest: Rest<'_>) -> bool {
    let table = jitter_table(rc.antialias);
    if table.is_empty() {
        return rest.call(rc);
    }
    accumulate_passes(rc, rest, table.len(), |pass, rc| {
        let (jx, jy) = table[pass];
        let (ox, oy) = (jx - 0.5, jy - 0.5);
        Mat4::translation(Vec3::new(
            2.0 * ox / rc.viewport.width as f64,
            2.0 * oy / rc.viewport.height as f64,
            0.0,
        ))
    })
}

/// Depth-dependent shear for one depth-of-field pass; the focal depth
/// scales the shear and offsets it back.
pub(crate) fn depth_of_field_shear(dx: f64, dy: f64, focal_depth: f64) -> Mat4 {
    let mut m = Mat4::IDENTITY;
    m.m[0][2] = dx / (1.0 - focal_depth);
    m.m[1][2] = dy / (1.0 - focal_depth);
    m.m[0][3] = -dx * focal_depth;
    m.m[1][3] = -dy * focal_depth;
    m
}

fn depth_of_field(rc: &mut RenderingContext<'_>, rest: Rest<'_>) -> bool {
    let dof = rc.viewer.depth_of_field();
    let focal = rc.viewer.focal_depth();
    accumulate_passes(rc, rest, JITTER_8.len(), |pass, rc| {
        let (jx, jy) = JITTER_8[pass];
        let dx = jx / (dof * rc.viewport.width as f64);
        let dy = jy / (dof * rc.viewport.height as f64);
        depth_of_field_shear(dx, dy, focal)
    })
}

fn layers(rc: &mut RenderingContext<'_>, rest: Rest<'_>) -> bool {
    rc.layer = 0;
    let mut ok = true;
    loop {
        ok &= rest.call(rc);
        if !rc.next_layer() {
            break;
        }
    }
    rc.layer = 0;
    ok
}

fn background(rc: &mut RenderingContext<'_>, rest: Rest<'_>) -> bool {
    let color = rc.viewer.background_color();
    rc.gfx.set_clear_color(color);
    if rc.layer == 0 {
        rc.gfx.clear(ClearBuffers::COLOR_DEPTH);
        if let Some(image) = rc.viewer.background_image() {
            rc.gfx.set_lighting(false);
            draw_background(
                &mut *rc.gfx,
                image,
                rc.viewer.background_placement(),
                &rc.viewer.camera().mapping,
                rc.viewport,
                color,
            );
            rc.gfx.set_lighting(true);
        }
    } else {
        // layers only keep their own depth
        rc.gfx.clear(ClearBuffers::DEPTH);
    }
    rest.call(rc)
}

fn enable_lights<'l>(
    gfx: &mut dyn GraphicsContext,
    rc_lights: &mut LightSlotAllocator,
    lights: impl Iterator<Item = &'l Light>,
) {
    rc_lights.reset();
    for light in lights.filter(|l| !l.is_ambient()) {
        if let Some(slot) = rc_lights.allocate() {
            gfx.set_light(slot, Some(light));
        }
    }
    for slot in rc_lights.allocated()..rc_lights.capacity() {
        gfx.set_light(slot, None);
    }
}

fn modelview_lights_clip_planes(rc: &mut RenderingContext<'_>, rest: Rest<'_>) -> bool {
    let viewer = rc.viewer;
    rc.gfx.load_matrix(MatrixStack::Modelview, &Mat4::IDENTITY);
    // viewer lights are head lamps: enabled in eye space
    enable_lights(&mut *rc.gfx, &mut rc.lights, viewer.lights().iter().map(|l| &**l));
    let dropped = rc.lights.dropped();
    rc.stats.dropped_lights = dropped;
    if dropped > 0 && rc.stats.light_warnings == 0 {
        log::warn!(
            "{dropped} viewer light(s) not drawn: only {} light slots available",
            rc.lights.capacity()
        );
        rc.stats.light_warnings += 1;
    }

    rc.gfx.mult_matrix(MatrixStack::Modelview, &viewer.matrices().modelview);

    let max_planes = rc.gfx.capabilities().max_clip_planes;
    for (slot, plane) in viewer.clip_planes().iter().enumerate().take(max_planes) {
        rc.gfx.set_clip_plane(slot, *plane);
    }
    rest.call(rc)
}

fn stereo(rc: &mut RenderingContext<'_>, rest: Rest<'_>) -> bool {
    let viewer = rc.viewer;
    if viewer.stereo_mode() != StereoMode::Stereo || !rc.gfx.capabilities().stereo {
        return rest.call(rc);
    }
    let distance = viewer.camera().pose.eye_distance();
    let angle = 2.0 * (0.5 * viewer.stereo_eye_spacing()).atan2(distance);
    let half = 0.5 * angle;
    let (left, right) = if rc.double_buffered {
        (DrawBuffer::BackLeft, DrawBuffer::BackRight)
    } else {
        (DrawBuffer::FrontLeft, DrawBuffer::FrontRight)
    };

    let mut ok = true;
    for (buffer, rotation) in [(left, -half), (right, half)] {
        rc.gfx.set_draw_buffer(buffer);
        rc.gfx.push_matrix(MatrixStack::Projection);
        rc.gfx.mult_matrix(MatrixStack::Projection, &Mat4::rotation_y(rotation));
        ok &= rest.call(rc);
        rc.gfx.pop_matrix(MatrixStack::Projection);
    }
    rc.gfx.set_draw_buffer(if rc.double_buffered { DrawBuffer::Back } else { DrawBuffer::Front });
    ok
}

fn slow_transparency(rc: &mut RenderingContext<'_>, rest: Rest<'_>) -> bool {
    rc.gfx.set_depth_mask(true);
    rc.gfx.set_alpha_test(AlphaTest::Equal(1.0));
    let opaque = rest.call(rc);
    rc.gfx.set_depth_mask(false);
    rc.gfx.set_alpha_test(AlphaTest::NotEqual(1.0));
    let translucent = rest.call(rc);
    rc.gfx.set_depth_mask(true);
    rc.gfx.set_alpha_test(AlphaTest::Disabled);
    opaque && translucent
}

fn order_independent_transparency(rc: &mut RenderingContext<'_>, rest: Rest<'_>) -> bool {
    let (w, h) = (rc.viewport.width.max(0) as u32, rc.viewport.height.max(0) as u32);
    let layers = rc.transparency_layers.max(1);
    if let Err(e) = rc.gfx.oit_reshape(w, h, layers) {
        log::warn!("order independent transparency unavailable, drawing unsorted: {e}");
        rc.stats.transparency_fallback = true;
        return rest.call(rc);
    }
    let mut ok = true;
    for layer in 0..layers {
        rc.gfx.oit_begin_layer(layer);
        ok &= rest.call(rc);
        rc.gfx.oit_end_layer(layer);
    }
    rc.gfx.oit_composite(rc.viewer.blending_mode().blend_func());
    ok
}

fn apply_projection(rc: &mut RenderingContext<'_>, rest: Rest<'_>) -> bool {
    rc.gfx.push_matrix(MatrixStack::Projection);
    rc.gfx.mult_matrix(MatrixStack::Projection, &rc.viewer.matrices().window_projection);
    let ok = rest.call(rc);
    rc.gfx.pop_matrix(MatrixStack::Projection);
    ok
}

fn execute_scene(rc: &mut RenderingContext<'_>) -> bool {
    let Some(scene) = rc.scene else {
        return true;
    };
    rc.stats.scene_draws += 1;
    let mut ctx = SceneDrawContext {
        gfx: &mut *rc.gfx,
        layer: rc.layer,
        layer_count: rc.layer_count,
        viewport: rc.viewport,
    };
    let ok = scene.draw(&mut ctx);
    if !ok {
        rc.stats.scene_failures += 1;
    }
    ok
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_tables_average_to_centre_for_antialias() {
        for n in [2, 4, 8] {
            let t = jitter_table(n);
            assert_eq!(t.len(), n as usize);
            let sx: f64 = t.iter().map(|j| j.0 - 0.5).sum();
            let sy: f64 = t.iter().map(|j| j.1 - 0.5).sum();
            assert!(sx.abs() < 1e-12 && sy.abs() < 1e-12, "n={n}");
        }
        assert!(jitter_table(0).is_empty());
        assert!(jitter_table(3).is_empty());
    }

    #[test]
    fn depth_of_field_shear_terms() {
        let m = depth_of_field_shear(0.1, 0.2, 0.5);
        assert_eq!((m.m[0][2], m.m[1][2]), (0.2, 0.4));
        assert_eq!((m.m[0][3], m.m[1][3]), (-0.05, -0.1));
        assert_eq!(m.m[2], [0.0, 0.0, 1.0, 0.0]);

        let pure = depth_of_field_shear(0.1, 0.2, 0.0);
        assert_eq!((pure.m[0][3], pure.m[1][3]), (0.0, 0.0));
    }
}
