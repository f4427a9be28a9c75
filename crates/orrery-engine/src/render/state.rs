//! Fixed-function state tracked on the CPU side.
//!
//! Both the recording and the wgpu backends keep one of these and resolve
//! the effective transform, lights and clip planes at draw time.

use std::rc::Rc;

use crate::coords::{ColorRgba, Viewport};
use crate::light::{Light, LightKind};
use crate::math::{Mat4, Vec3};

use super::graphics::{
    AlphaTest, BlendFunc, DepthFunc, DrawBuffer, Image, LightModel, MatrixStack,
};

/// A light resolved into eye coordinates at `set_light` time.
#[derive(Debug, Clone, PartialEq)]
pub struct EyeLight {
    pub light: Light,
    pub eye_position: Vec3,
    pub eye_direction: Vec3,
}

#[derive(Debug, Clone)]
pub struct FixedFunctionState {
    projection: Vec<Mat4>,
    modelview: Vec<Mat4>,
    pub viewport: Viewport,
    pub clear_color: ColorRgba,
    pub draw_buffer: DrawBuffer,
    pub depth_test: Option<DepthFunc>,
    pub depth_mask: bool,
    pub blend: BlendFunc,
    pub alpha_test: AlphaTest,
    pub polygon_offset: Option<(f32, f32)>,
    pub lighting: bool,
    pub light_model: Option<LightModel>,
    pub lights: Vec<Option<EyeLight>>,
    pub clip_planes: Vec<Option<[f64; 4]>>,
    pub texture: Option<Rc<Image>>,
}

impl FixedFunctionState {
    pub fn new(max_lights: usize, max_clip_planes: usize) -> Self {
        Self {
            projection: vec![Mat4::IDENTITY],
            modelview: vec![Mat4::IDENTITY],
            viewport: Viewport::default(),
            clear_color: ColorRgba::black(),
            draw_buffer: DrawBuffer::Back,
            depth_test: None,
            depth_mask: true,
            blend: BlendFunc::Disabled,
            alpha_test: AlphaTest::Disabled,
            polygon_offset: None,
            lighting: false,
            light_model: None,
            lights: vec![None; max_lights],
            clip_planes: vec![None; max_clip_planes],
            texture: None,
        }
    }

    fn stack_mut(&mut self, stack: MatrixStack) -> &mut Vec<Mat4> {
        match stack {
            MatrixStack::Projection => &mut self.projection,
            MatrixStack::Modelview => &mut self.modelview,
        }
    }

    fn stack(&self, stack: MatrixStack) -> &[Mat4] {
        match stack {
            MatrixStack::Projection => &self.projection,
            MatrixStack::Modelview => &self.modelview,
        }
    }

    pub fn top(&self, stack: MatrixStack) -> Mat4 {
        self.stack(stack).last().copied().unwrap_or(Mat4::IDENTITY)
    }

    pub fn depth(&self, stack: MatrixStack) -> usize {
        self.stack(stack).len()
    }

    pub fn load(&mut self, stack: MatrixStack, m: &Mat4) {
        if let Some(top) = self.stack_mut(stack).last_mut() {
            *top = *m;
        }
    }

    pub fn mult(&mut self, stack: MatrixStack, m: &Mat4) {
        if let Some(top) = self.stack_mut(stack).last_mut() {
            *top = *top * *m;
        }
    }

    pub fn push(&mut self, stack: MatrixStack) {
        let top = self.top(stack);
        self.stack_mut(stack).push(top);
    }

    /// Pops the top matrix. The bottom entry is never removed.
    pub fn pop(&mut self, stack: MatrixStack) {
        let s = self.stack_mut(stack);
        if s.len() > 1 {
            s.pop();
        } else {
            log::warn!("matrix stack underflow on {stack:?}");
        }
    }

    /// `projection · modelview` at this instant.
    pub fn world_to_clip(&self) -> Mat4 {
        self.top(MatrixStack::Projection) * self.top(MatrixStack::Modelview)
    }

    pub fn set_light(&mut self, slot: usize, light: Option<&Light>) {
        let mv = self.top(MatrixStack::Modelview);
        let Some(entry) = self.lights.get_mut(slot) else {
            log::warn!("light slot {slot} out of range");
            return;
        };
        *entry = light.map(|l| EyeLight {
            light: l.clone(),
            eye_position: mv.transform_point(l.position).unwrap_or(l.position),
            eye_direction: match l.kind {
                LightKind::Directional | LightKind::Spot => mv.transform_vector(l.direction),
                _ => l.direction,
            },
        });
    }

    /// Stores the plane in eye coordinates: `plane_eye = plane · modelview⁻¹`.
    pub fn set_clip_plane(&mut self, slot: usize, plane: Option<[f64; 4]>) {
        let mv = self.top(MatrixStack::Modelview);
        let Some(entry) = self.clip_planes.get_mut(slot) else {
            log::warn!("clip plane slot {slot} out of range");
            return;
        };
        *entry = plane.map(|p| match mv.inverse() {
            Some(inv) => {
                let mut out = [0.0; 4];
                for (j, o) in out.iter_mut().enumerate() {
                    *o = (0..4).map(|i| p[i] * inv.m[i][j]).sum();
                }
                out
            }
            None => p,
        });
    }

    pub fn enabled_lights(&self) -> impl Iterator<Item = &EyeLight> {
        self.lights.iter().flatten()
    }

    pub fn enabled_clip_planes(&self) -> impl Iterator<Item = &[f64; 4]> {
        self.clip_planes.iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_restores_top() {
        let mut s = FixedFunctionState::new(8, 6);
        let t = Mat4::translation(Vec3::new(1.0, 2.0, 3.0));
        s.load(MatrixStack::Projection, &t);
        s.push(MatrixStack::Projection);
        s.mult(MatrixStack::Projection, &Mat4::scale(Vec3::new(2.0, 2.0, 2.0)));
        assert_ne!(s.top(MatrixStack::Projection), t);
        s.pop(MatrixStack::Projection);
        assert_eq!(s.top(MatrixStack::Projection), t);
        assert_eq!(s.depth(MatrixStack::Projection), 1);
    }

    #[test]
    fn pop_never_empties_stack() {
        let mut s = FixedFunctionState::new(8, 6);
        s.pop(MatrixStack::Modelview);
        assert_eq!(s.depth(MatrixStack::Modelview), 1);
        assert_eq!(s.top(MatrixStack::Modelview), Mat4::IDENTITY);
    }

    #[test]
    fn clip_plane_is_stored_in_eye_space() {
        let mut s = FixedFunctionState::new(8, 6);
        s.load(MatrixStack::Modelview, &Mat4::translation(Vec3::new(0.0, 0.0, -5.0)));
        // world plane z >= 0, i.e. [0,0,1,0]; in eye space z_eye >= -5
        s.set_clip_plane(0, Some([0.0, 0.0, 1.0, 0.0]));
        let p = s.clip_planes[0].unwrap_or_default();
        assert_eq!(p, [0.0, 0.0, 1.0, 5.0]);
        assert_eq!(s.enabled_clip_planes().count(), 1);
    }

    #[test]
    fn out_of_range_slots_are_ignored() {
        let mut s = FixedFunctionState::new(1, 1);
        s.set_light(3, Some(&Light::default()));
        s.set_clip_plane(3, Some([1.0, 0.0, 0.0, 0.0]));
        assert_eq!(s.enabled_lights().count(), 0);
        assert_eq!(s.enabled_clip_planes().count(), 0);
    }
}
