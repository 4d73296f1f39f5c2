//! Weighted, blended order-independent transparency.
//!
//! Follows McGuire and Bavoil's technique as published on the Casual Effects
//! blog (March 2015): every transparent fragment adds a depth-weighted,
//! premultiplied colour to an accumulation sum and multiplies a revealage
//! product by `1 - alpha`. Both operations commute, so fragments can arrive in
//! any order. Depth is the window-space depth in `[0, 1]`.

use crate::point3d::Point3D;

const MIN_WEIGHT: f32 = 1e-2;
const MAX_WEIGHT: f32 = 3e2;

/// Depth/coverage weight: near, opaque fragments dominate the average.
pub fn oit_weight(alpha: f32, depth: f32) -> f32 {
    let a = alpha.min(1.0) * 8.0 + 0.01;
    let b = -depth * 0.95 + 1.0;
    (a * a * a * 1e8 * b * b * b).clamp(MIN_WEIGHT, MAX_WEIGHT)
}

/// One fragment's contribution to the accumulation and revealage targets.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OitSample {
    pub accum_rgb: Point3D,
    pub accum_alpha: f32,
    /// Coverage the fragment removes from the background.
    pub alpha: f32,
}

pub fn accumulate(premultiplied_color: Point3D, alpha: f32, depth: f32) -> OitSample {
    let w = oit_weight(alpha, depth);
    OitSample {
        accum_rgb: premultiplied_color * w,
        accum_alpha: alpha * w,
        alpha,
    }
}

/// Running totals for one pixel.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OitPixel {
    pub accum_rgb: Point3D,
    pub accum_alpha: f32,
    pub revealage: f32,
}

impl Default for OitPixel {
    fn default() -> Self {
        OitPixel { accum_rgb: Point3D::default(), accum_alpha: 0.0, revealage: 1.0 }
    }
}

impl OitPixel {
    pub fn add(&mut self, sample: OitSample) {
        self.accum_rgb = self.accum_rgb + sample.accum_rgb;
        self.accum_alpha += sample.accum_alpha;
        self.revealage *= 1.0 - sample.alpha;
    }

    /// Composite the weighted average colour over `background`.
    pub fn resolve(&self, background: Point3D) -> Point3D {
        if self.revealage >= 1.0 {
            return background;
        }
        let average = self.accum_rgb / self.accum_alpha.max(1e-5);
        average * (1.0 - self.revealage) + background * self.revealage
    }
}
