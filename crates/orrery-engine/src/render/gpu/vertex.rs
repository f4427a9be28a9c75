//! Per-vertex work done on the CPU before upload.
//!
//! The wgpu backend has no fixed-function hardware to lean on, so every
//! vertex leaves here already in clip space with its lit colour, its
//! distances to the enabled clip planes and the batch's alpha test.

use bytemuck::{Pod, Zeroable};

use crate::coords::ColorRgba;
use crate::light::LightKind;
use crate::math::Vec3;
use crate::render::graphics::{AlphaTest, MatrixStack, Vertex};
use crate::render::state::{EyeLight, FixedFunctionState};

/// Clip planes the vertex layout has room for.
pub(super) const CLIP_SLOTS: usize = 6;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(super) struct GpuVertex {
    pub clip_pos: [f32; 4],
    pub color: [f32; 4],
    pub tex_coord: [f32; 2],
    pub clip_a: [f32; 4],
    pub clip_b: [f32; 2],
    /// `[mode, reference]`; mode 0 disabled, 1 equal, 2 not-equal.
    pub alpha_test: [f32; 2],
}

impl GpuVertex {
    const ATTRS: [wgpu::VertexAttribute; 6] = wgpu::vertex_attr_array![
        0 => Float32x4, // clip_pos
        1 => Float32x4, // color
        2 => Float32x2, // tex_coord
        3 => Float32x4, // clip_a
        4 => Float32x2, // clip_b
        5 => Float32x2  // alpha_test
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }

    /// A vertex already in clip space, unlit and unclipped.
    pub fn screen(clip_pos: [f32; 4], tex_coord: [f32; 2]) -> Self {
        Self {
            clip_pos,
            color: [1.0; 4],
            tex_coord,
            clip_a: [1.0; 4],
            clip_b: [1.0; 2],
            alpha_test: [0.0; 2],
        }
    }
}

fn alpha_test_params(test: AlphaTest) -> [f32; 2] {
    match test {
        AlphaTest::Disabled => [0.0, 0.0],
        AlphaTest::Equal(r) => [1.0, r],
        AlphaTest::NotEqual(r) => [2.0, r],
    }
}

/// Lighting applies only while enabled and something actually lights the
/// scene; otherwise vertex colours pass through unchanged.
fn lighting_active(state: &FixedFunctionState) -> bool {
    state.lighting && (state.light_model.is_some() || state.enabled_lights().next().is_some())
}

/// Converts `vertices` under the current state and appends them to `out`.
pub(super) fn process_vertices(
    state: &FixedFunctionState,
    vertices: &[Vertex],
    out: &mut Vec<GpuVertex>,
) {
    let modelview = state.top(MatrixStack::Modelview);
    let projection = state.top(MatrixStack::Projection);
    let normal_matrix = modelview
        .linear()
        .inverse()
        .map(|m| m.transpose())
        .unwrap_or_else(|| modelview.linear());

    let planes: Vec<[f64; 4]> = state.enabled_clip_planes().take(CLIP_SLOTS).copied().collect();
    let alpha_test = alpha_test_params(state.alpha_test);
    let lit = lighting_active(state);

    out.reserve(vertices.len());
    for v in vertices {
        let p = v.position;
        let eye = modelview.transform_vec4([p[0] as f64, p[1] as f64, p[2] as f64, 1.0]);
        let [x, y, z, w] = projection.transform_vec4(eye);

        let mut distances = [1.0f32; CLIP_SLOTS];
        for (d, plane) in distances.iter_mut().zip(&planes) {
            *d = (0..4).map(|i| plane[i] * eye[i]).sum::<f64>() as f32;
        }

        let color = if lit {
            let eye_pos = if eye[3] != 0.0 {
                Vec3::new(eye[0] / eye[3], eye[1] / eye[3], eye[2] / eye[3])
            } else {
                Vec3::new(eye[0], eye[1], eye[2])
            };
            let n = v.normal;
            let normal = normal_matrix * Vec3::new(n[0] as f64, n[1] as f64, n[2] as f64);
            shade(state, eye_pos, normal, v.color)
        } else {
            v.color
        };

        out.push(GpuVertex {
            // wgpu keeps depth in [0, w] rather than [-w, w]
            clip_pos: [x as f32, y as f32, ((z + w) * 0.5) as f32, w as f32],
            color,
            tex_coord: v.tex_coord,
            clip_a: [distances[0], distances[1], distances[2], distances[3]],
            clip_b: [distances[4], distances[5]],
            alpha_test,
        });
    }
}

fn shade(state: &FixedFunctionState, eye_pos: Vec3, normal: Vec3, color: [f32; 4]) -> [f32; 4] {
    let model = state.light_model;
    let ambient = model.map(|m| m.ambient).unwrap_or(ColorRgba::transparent());
    let local_viewer = model.is_some_and(|m| m.local_viewer);
    let two_sided = model.is_some_and(|m| m.two_sided);

    let mut n = normal.normalize_or_zero();
    if two_sided {
        let to_viewer =
            if local_viewer { (-eye_pos).normalize_or_zero() } else { Vec3::new(0.0, 0.0, 1.0) };
        if n.dot(to_viewer) < 0.0 {
            n = -n;
        }
    }

    let mut total = [ambient.r as f64, ambient.g as f64, ambient.b as f64];
    for light in state.enabled_lights() {
        let k = diffuse_factor(light, eye_pos, n);
        if k <= 0.0 {
            continue;
        }
        let c = light.light.color;
        total[0] += k * c.r as f64;
        total[1] += k * c.g as f64;
        total[2] += k * c.b as f64;
    }

    [
        (color[0] as f64 * total[0]).clamp(0.0, 1.0) as f32,
        (color[1] as f64 * total[1]).clamp(0.0, 1.0) as f32,
        (color[2] as f64 * total[2]).clamp(0.0, 1.0) as f32,
        color[3],
    ]
}

/// Attenuated, spot-limited Lambert term of one light at `eye_pos`.
fn diffuse_factor(light: &EyeLight, eye_pos: Vec3, n: Vec3) -> f64 {
    let l = &light.light;
    let (to_light, attenuation) = match l.kind {
        LightKind::Ambient => return 0.0,
        LightKind::Directional => ((-light.eye_direction).normalize_or_zero(), 1.0),
        LightKind::Point | LightKind::Spot => {
            let d = light.eye_position - eye_pos;
            let dist = d.length();
            if dist == 0.0 {
                return 0.0;
            }
            (d * (1.0 / dist), l.attenuation.factor(dist))
        }
    };

    let mut spot = 1.0;
    if l.kind == LightKind::Spot && l.spot_cutoff < 180.0 {
        let cos = (-to_light).dot(light.eye_direction.normalize_or_zero());
        if cos < l.spot_cutoff.to_radians().cos() {
            return 0.0;
        }
        spot = cos.max(0.0).powf(l.spot_exponent);
    }

    attenuation * spot * n.dot(to_light).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::light::Light;
    use crate::math::Mat4;
    use crate::render::graphics::LightModel;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    fn state() -> FixedFunctionState {
        FixedFunctionState::new(8, 6)
    }

    fn red(position: [f32; 3], normal: [f32; 3]) -> Vertex {
        Vertex::new(position, normal, [1.0, 0.0, 0.0, 0.5])
    }

    // ── transform ──────────────────────────────────────────────────────────

    #[test]
    fn depth_is_remapped_to_zero_one() {
        let s = state();
        let mut out = Vec::new();
        process_vertices(&s, &[red([0.5, 0.0, -1.0], [0.0, 0.0, 1.0])], &mut out);
        let v = out[0];
        assert!(approx(v.clip_pos[0], 0.5));
        assert!(approx(v.clip_pos[2], 0.0));
        assert!(approx(v.clip_pos[3], 1.0));

        out.clear();
        process_vertices(&s, &[red([0.0, 0.0, 1.0], [0.0, 0.0, 1.0])], &mut out);
        assert!(approx(out[0].clip_pos[2], 1.0));
    }

    #[test]
    fn modelview_and_projection_both_apply() {
        let mut s = state();
        s.load(MatrixStack::Modelview, &Mat4::translation(Vec3::new(1.0, 0.0, 0.0)));
        s.load(MatrixStack::Projection, &Mat4::scale(Vec3::new(0.5, 0.5, 0.5)));
        let mut out = Vec::new();
        process_vertices(&s, &[red([1.0, 2.0, 0.0], [0.0, 0.0, 1.0])], &mut out);
        assert!(approx(out[0].clip_pos[0], 1.0));
        assert!(approx(out[0].clip_pos[1], 1.0));
    }

    // ── clip planes and alpha test ─────────────────────────────────────────

    #[test]
    fn clip_distances_use_eye_space_planes() {
        let mut s = state();
        s.set_clip_plane(0, Some([1.0, 0.0, 0.0, 0.0]));
        s.set_clip_plane(1, Some([0.0, -1.0, 0.0, 0.5]));
        let mut out = Vec::new();
        process_vertices(&s, &[red([-2.0, 1.0, 0.0], [0.0, 0.0, 1.0])], &mut out);
        let v = out[0];
        assert!(approx(v.clip_a[0], -2.0));
        assert!(approx(v.clip_a[1], -0.5));
        // unused slots never discard
        assert_eq!(v.clip_a[2], 1.0);
        assert_eq!(v.clip_b, [1.0, 1.0]);
    }

    #[test]
    fn alpha_test_is_encoded_per_vertex() {
        let mut s = state();
        s.alpha_test = AlphaTest::NotEqual(1.0);
        let mut out = Vec::new();
        process_vertices(&s, &[red([0.0; 3], [0.0, 0.0, 1.0])], &mut out);
        assert_eq!(out[0].alpha_test, [2.0, 1.0]);
    }

    // ── lighting ───────────────────────────────────────────────────────────

    #[test]
    fn unlit_vertices_keep_their_colour() {
        let mut s = state();
        s.lighting = true;
        let mut out = Vec::new();
        process_vertices(&s, &[red([0.0; 3], [0.0, 0.0, 1.0])], &mut out);
        assert_eq!(out[0].color, [1.0, 0.0, 0.0, 0.5]);
    }

    #[test]
    fn directional_light_facing_the_normal_is_full_strength() {
        let mut s = state();
        s.lighting = true;
        s.set_light(0, Some(&Light::default()));
        let mut out = Vec::new();
        process_vertices(
            &s,
            &[red([0.0; 3], [0.0, 0.0, 1.0]), red([0.0; 3], [0.0, 0.0, -1.0])],
            &mut out,
        );
        assert!(approx(out[0].color[0], 1.0));
        assert!(approx(out[0].color[3], 0.5));
        assert!(approx(out[1].color[0], 0.0));
    }

    #[test]
    fn two_sided_lighting_flips_back_faces() {
        let mut s = state();
        s.lighting = true;
        s.light_model = Some(LightModel {
            ambient: ColorRgba::new(0.1, 0.1, 0.1, 1.0),
            local_viewer: false,
            two_sided: true,
        });
        s.set_light(0, Some(&Light::default()));
        let mut out = Vec::new();
        process_vertices(&s, &[red([0.0; 3], [0.0, 0.0, -1.0])], &mut out);
        assert!(approx(out[0].color[0], 1.0));
    }

    #[test]
    fn ambient_only_model_scales_colour() {
        let mut s = state();
        s.lighting = true;
        s.light_model = Some(LightModel {
            ambient: ColorRgba::new(0.25, 0.25, 0.25, 1.0),
            local_viewer: false,
            two_sided: false,
        });
        let mut out = Vec::new();
        process_vertices(&s, &[red([0.0; 3], [0.0, 0.0, 1.0])], &mut out);
        assert!(approx(out[0].color[0], 0.25));
    }

    #[test]
    fn spot_light_cuts_off_outside_its_cone() {
        let mut s = state();
        s.lighting = true;
        let spot = Light::spot(
            ColorRgba::white(),
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::new(0.0, 0.0, -1.0),
            10.0,
        );
        s.set_light(0, Some(&spot));
        let mut out = Vec::new();
        process_vertices(
            &s,
            &[red([0.0; 3], [0.0, 0.0, 1.0]), red([5.0, 0.0, 0.0], [0.0, 0.0, 1.0])],
            &mut out,
        );
        assert!(approx(out[0].color[0], 1.0));
        assert!(approx(out[1].color[0], 0.0));
    }
}
