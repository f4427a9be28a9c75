//! Distortion-corrected background texture.
//!
//! The visible part of the texture is tessellated into a grid of quads no
//! larger than `max_pixels_per_polygon` on screen, each vertex moved by the
//! radial lens correction so straight lines in the scene stay straight.

use std::rc::Rc;

use crate::coords::{ColorRgba, Viewport};
use crate::math::Mat4;
use crate::projection::ViewportMapping;

use super::graphics::{GraphicsContext, Image, MatrixStack, Topology, Vertex};

const DISTORT_TOLERANCE: f64 = 0.001;
const DISTORT_MAX_ITERATIONS: usize = 100;
const BACKGROUND_DEPTH: f32 = -0.999;

/// Single-coefficient radial lens distortion in texture physical space.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct RadialDistortion {
    pub centre_x: f64,
    pub centre_y: f64,
    pub factor_k1: f64,
}

impl RadialDistortion {
    #[inline]
    pub const fn new(centre_x: f64, centre_y: f64, factor_k1: f64) -> Self {
        Self { centre_x, centre_y, factor_k1 }
    }

    /// Where a recorded (distorted) point would be without the lens:
    /// `c + d·(1 + k·|d|²)`.
    pub fn correct(&self, x: f64, y: f64) -> (f64, f64) {
        let (dx, dy) = (x - self.centre_x, y - self.centre_y);
        let s = 1.0 + self.factor_k1 * (dx * dx + dy * dy);
        (self.centre_x + dx * s, self.centre_y + dy * s)
    }

    /// Inverse of [`correct`](Self::correct) by fixed-point iteration.
    ///
    /// `None` when the shift `k·r²` is outside `(-0.1, 1)`.
    pub fn distort(&self, x: f64, y: f64, tolerance: f64) -> Option<(f64, f64)> {
        let (xc, yc) = (x - self.centre_x, y - self.centre_y);
        let mut rr = xc * xc + yc * yc;
        let shift = self.factor_k1 * rr;
        if !(-0.1 < shift && shift < 1.0) || tolerance <= 0.0 {
            return None;
        }
        let tol2 = tolerance * tolerance;
        let (mut last_x, mut last_y) = (xc, yc);
        let (mut xd, mut yd) = (xc, yc);
        for _ in 0..DISTORT_MAX_ITERATIONS {
            xd = xc / (1.0 + self.factor_k1 * rr);
            yd = yc / (1.0 + self.factor_k1 * rr);
            if (xd - last_x).powi(2) + (yd - last_y).powi(2) < tol2 {
                break;
            }
            rr = xd * xd + yd * yd;
            (last_x, last_y) = (xd, yd);
        }
        Some((self.centre_x + xd, self.centre_y + yd))
    }
}

/// A texture with its physical extent and lens parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundImage {
    pub image: Rc<Image>,
    pub physical_width: f64,
    pub physical_height: f64,
    pub distortion: RadialDistortion,
}

impl BackgroundImage {
    /// Physical size equal to the texel size, no distortion.
    pub fn new(image: Rc<Image>) -> Self {
        let (w, h) = (image.width as f64, image.height as f64);
        Self { image, physical_width: w, physical_height: h, distortion: RadialDistortion::default() }
    }
}

/// Where the texture sits in user viewport coordinates.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BackgroundPlacement {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub undistort: bool,
    pub max_pixels_per_polygon: f64,
}

impl Default for BackgroundPlacement {
    fn default() -> Self {
        Self { left: 0.0, top: 0.0, width: 0.0, height: 0.0, undistort: false, max_pixels_per_polygon: 16.0 }
    }
}

/// Tessellated background ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundGrid {
    /// Orthographic extent `(left, right, bottom, top)` in texture space.
    pub extent: (f64, f64, f64, f64),
    pub texels_per_polygon: (u32, u32),
    /// One triangle strip per row of quads.
    pub strips: Vec<Vec<Vertex>>,
}

fn texels_per_polygon(ppu: f64, placed: f64, texels: u32, max_ppp: f64) -> u32 {
    let mut tpp = 1u32;
    while 2.0 * tpp as f64 * ppu * placed / texels as f64 <= max_ppp && tpp < texels {
        tpp *= 2;
    }
    tpp
}

/// Builds the background grid for `viewport`; `None` for an empty image.
pub fn background_grid(
    bg: &BackgroundImage,
    placement: &BackgroundPlacement,
    mapping: &ViewportMapping,
    viewport: Viewport,
    color: ColorRgba,
) -> Option<BackgroundGrid> {
    let (width_texels, height_texels) = (bg.image.width, bg.image.height);
    if width_texels == 0 || height_texels == 0 {
        return None;
    }
    let (tw, th) = (bg.physical_width, bg.physical_height);
    let mut tex_ratio_x = tw / width_texels as f64;
    let mut tex_ratio_y = th / height_texels as f64;
    let lens = RadialDistortion {
        factor_k1: if placement.undistort { bg.distortion.factor_k1 } else { 0.0 },
        ..bg.distortion
    };

    let vtw = if placement.width == 0.0 { 1.0 } else { placement.width };
    let vth = if placement.height == 0.0 { 1.0 } else { placement.height };
    let vl = tw / vtw * (mapping.left - placement.left);
    let vr = vl + (viewport.width as f64 / mapping.pixels_per_unit_x) * tw / vtw;
    let vt = th + th / vth * (mapping.top - placement.top);
    let vb = vt - (viewport.height as f64 / mapping.pixels_per_unit_y) * th / vth;

    let tpp_x =
        texels_per_polygon(mapping.pixels_per_unit_x, vtw, width_texels, placement.max_pixels_per_polygon);
    let tpp_y =
        texels_per_polygon(mapping.pixels_per_unit_y, vth, height_texels, placement.max_pixels_per_polygon);

    // visible texture range, widened by where the corners land after distortion
    let (mut min_x, mut max_x, mut min_y, mut max_y) = (vl.min(vr), vl.max(vr), vb.min(vt), vb.max(vt));
    if lens.factor_k1 != 0.0 {
        for (cx, cy) in [(vl, vt), (vr, vt), (vr, vb), (vl, vb)] {
            if let Some((x, y)) = lens.distort(cx, cy, DISTORT_TOLERANCE) {
                (min_x, max_x) = (min_x.min(x), max_x.max(x));
                (min_y, max_y) = (min_y.min(y), max_y.max(y));
            }
        }
    }
    let (min_x, max_x) = (min_x.max(0.0) / tex_ratio_x, max_x.min(tw) / tex_ratio_x);
    let (min_y, max_y) = (min_y.max(0.0) / tex_ratio_y, max_y.min(th) / tex_ratio_y);

    let min_i = (min_x / tpp_x as f64).floor() as i64;
    let max_i = (0.999999 * max_x / tpp_x as f64).ceil() as i64;
    let min_j = (min_y / tpp_y as f64).floor() as i64;
    let max_j = (0.999999 * max_y / tpp_y as f64).ceil() as i64;
    tex_ratio_x *= tpp_x as f64;
    tex_ratio_y *= tpp_y as f64;

    let rgba = [color.r, color.g, color.b, 1.0];
    let vertex = |x: f64, y: f64| {
        let (cx, cy) = lens.correct(x, y);
        Vertex {
            position: [cx as f32, cy as f32, BACKGROUND_DEPTH],
            normal: [0.0, 0.0, 1.0],
            color: rgba,
            tex_coord: [(x / tw) as f32, (y / th) as f32],
        }
    };

    let mut strips = Vec::new();
    for j in min_j..max_j {
        let y1 = j as f64 * tex_ratio_y;
        let y2 = ((j + 1) as f64 * tex_ratio_y).min(th);
        let mut strip = Vec::with_capacity(2 * (max_i - min_i + 1).max(0) as usize);
        for i in min_i..=max_i {
            let x = (i as f64 * tex_ratio_x).min(tw);
            strip.push(vertex(x, y1));
            strip.push(vertex(x, y2));
        }
        strips.push(strip);
    }

    Some(BackgroundGrid { extent: (vl, vr, vb, vt), texels_per_polygon: (tpp_x, tpp_y), strips })
}

/// Draws the background behind everything. Leaves the projection stack as
/// it found it and the modelview at identity.
pub fn draw_background(
    gfx: &mut dyn GraphicsContext,
    bg: &BackgroundImage,
    placement: &BackgroundPlacement,
    mapping: &ViewportMapping,
    viewport: Viewport,
    color: ColorRgba,
) {
    let Some(grid) = background_grid(bg, placement, mapping, viewport, color) else {
        log::debug!("background texture is empty; skipped");
        return;
    };
    let (l, r, b, t) = grid.extent;
    gfx.push_matrix(MatrixStack::Projection);
    gfx.load_matrix(MatrixStack::Projection, &Mat4::ortho(l, r, b, t, -1.0, 1.0));
    gfx.load_matrix(MatrixStack::Modelview, &Mat4::IDENTITY);
    gfx.bind_texture(Some(&bg.image));
    for strip in &grid.strips {
        gfx.draw(Topology::TriangleStrip, strip);
    }
    gfx.bind_texture(None);
    gfx.pop_matrix(MatrixStack::Projection);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(w: u32, h: u32) -> BackgroundImage {
        BackgroundImage::new(Rc::new(Image::filled(w, h, [0, 0, 0, 255])))
    }

    fn placement(w: f64, h: f64) -> BackgroundPlacement {
        BackgroundPlacement { width: w, height: h, ..BackgroundPlacement::default() }
    }

    // ── distortion ────────────────────────────────────────────────────────

    #[test]
    fn zero_factor_is_identity() {
        let d = RadialDistortion::new(3.0, 4.0, 0.0);
        assert_eq!(d.correct(10.0, -2.0), (10.0, -2.0));
        assert_eq!(d.distort(10.0, -2.0, 0.001), Some((10.0, -2.0)));
    }

    #[test]
    fn distort_inverts_correct() {
        let d = RadialDistortion::new(50.0, 50.0, 1e-5);
        let (cx, cy) = d.correct(80.0, 30.0);
        let (x, y) = d.distort(cx, cy, 1e-9).unwrap();
        assert!((x - 80.0).abs() < 1e-6 && (y - 30.0).abs() < 1e-6, "{x} {y}");
    }

    #[test]
    fn distort_rejects_large_shift() {
        let d = RadialDistortion::new(0.0, 0.0, 1.0);
        assert!(d.distort(2.0, 0.0, 0.001).is_none());
    }

    // ── grid ──────────────────────────────────────────────────────────────

    #[test]
    fn grid_covers_placed_texture_once_per_quad() {
        // 64x64 texels placed over 64x64 user units at 1 pixel per unit
        let grid = background_grid(
            &image(64, 64),
            &placement(64.0, 64.0),
            &ViewportMapping::default(),
            Viewport::from_size(64, 64),
            ColorRgba::white(),
        )
        .unwrap();
        assert_eq!(grid.extent, (0.0, 64.0, 0.0, 64.0));
        // doubles while 2·tpp ≤ 16 on screen
        assert_eq!(grid.texels_per_polygon, (16, 16));
        assert_eq!(grid.strips.len(), 4);
        assert!(grid.strips.iter().all(|s| s.len() == 10));
        let last = grid.strips[3][9];
        assert_eq!(last.tex_coord, [1.0, 1.0]);
        assert_eq!(last.position, [64.0, 64.0, BACKGROUND_DEPTH]);
    }

    #[test]
    fn grid_is_clamped_to_texture() {
        // viewport shows twice the texture width
        let grid = background_grid(
            &image(16, 16),
            &placement(16.0, 16.0),
            &ViewportMapping::default(),
            Viewport::from_size(32, 16),
            ColorRgba::white(),
        )
        .unwrap();
        assert_eq!(grid.extent.1, 32.0);
        let max_u = grid.strips.iter().flatten().map(|v| v.tex_coord[0]).fold(0.0, f32::max);
        assert_eq!(max_u, 1.0);
    }

    #[test]
    fn empty_image_yields_no_grid() {
        let bg = BackgroundImage::new(Rc::new(Image::filled(0, 0, [0; 4])));
        assert!(background_grid(
            &bg,
            &placement(1.0, 1.0),
            &ViewportMapping::default(),
            Viewport::from_size(8, 8),
            ColorRgba::white()
        )
        .is_none());
    }
}
