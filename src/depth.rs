//! Lock-free nearest-depth tracking.
//!
//! [`atomic_minimum`] is a compare-and-swap retry loop over a cell's raw bit
//! pattern, so any number of rasterization workers can offer depths to the
//! same pixel without a lock. It only orders the depth itself: writing colour
//! or other attributes for the winning fragment is not part of the same atomic
//! step. Either re-check with [`DepthBuffer::is_nearest`] in a second pass once
//! all depths have landed, or pack an identifier next to the depth with
//! [`pack_depth_and_id`] so the winner is recorded in the same swap.

use std::path::Path;
use std::sync::atomic::{AtomicI32, AtomicI64, AtomicU32, AtomicU64, Ordering};

use anyhow::{Context, bail};
use bytemuck::Pod;
use image::{GrayImage, Luma};
use rayon::prelude::*;

/// A shared memory location that can take part in [`atomic_minimum`].
pub trait AtomicDepth: Sync {
    /// The number stored in the cell.
    type Value: Pod + PartialOrd;
    /// Raw representation swapped by the hardware; same size as `Value`.
    type Bits: Pod + Eq;

    fn load_bits(&self, order: Ordering) -> Self::Bits;

    fn compare_exchange_bits(
        &self,
        current: Self::Bits,
        new: Self::Bits,
        success: Ordering,
        failure: Ordering,
    ) -> Result<Self::Bits, Self::Bits>;

    fn load_value(&self) -> Self::Value {
        bytemuck::cast(self.load_bits(Ordering::Acquire))
    }
}

/// Lower `cell` to `candidate` if the candidate is strictly smaller, returning
/// the value the cell held just before this call took effect.
///
/// The loop only retries after losing a race to another writer. A `NaN`
/// candidate never compares smaller and is therefore never stored. Which of two
/// equal candidates ends up in the cell is unspecified.
pub fn atomic_minimum<C>(cell: &C, candidate: C::Value) -> C::Value
where
    C: AtomicDepth + ?Sized,
{
    let candidate_bits: C::Bits = bytemuck::cast(candidate);
    let mut observed_bits = cell.load_bits(Ordering::Acquire);
    loop {
        let observed: C::Value = bytemuck::cast(observed_bits);
        if !(candidate < observed) {
            return observed;
        }
        match cell.compare_exchange_bits(
            observed_bits,
            candidate_bits,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => return observed,
            Err(actual) => observed_bits = actual,
        }
    }
}

macro_rules! atomic_float {
    ($name:ident, $float:ty, $atomic:ty, $bits:ty) => {
        #[doc = concat!("`", stringify!($float), "` stored by bit pattern in an `", stringify!($atomic), "`.")]
        #[derive(Debug)]
        #[repr(transparent)]
        pub struct $name($atomic);

        impl $name {
            pub const fn new(value: $float) -> Self {
                Self(<$atomic>::new(value.to_bits()))
            }

            pub fn load(&self, order: Ordering) -> $float {
                <$float>::from_bits(self.0.load(order))
            }

            pub fn store(&self, value: $float, order: Ordering) {
                self.0.store(value.to_bits(), order)
            }

            pub fn into_inner(self) -> $float {
                <$float>::from_bits(self.0.into_inner())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new(<$float>::INFINITY)
            }
        }

        impl AtomicDepth for $name {
            type Value = $float;
            type Bits = $bits;

            #[inline(always)]
            fn load_bits(&self, order: Ordering) -> $bits {
                self.0.load(order)
            }

            #[inline(always)]
            fn compare_exchange_bits(
                &self,
                current: $bits,
                new: $bits,
                success: Ordering,
                failure: Ordering,
            ) -> Result<$bits, $bits> {
                self.0.compare_exchange_weak(current, new, success, failure)
            }
        }
    };
}

atomic_float!(AtomicF32, f32, AtomicU32, u32);
atomic_float!(AtomicF64, f64, AtomicU64, u64);

// Fixed-point depth buffers use the integer atomics directly.
macro_rules! atomic_integer {
    ($($atomic:ty => $int:ty),* $(,)?) => {$(
        impl AtomicDepth for $atomic {
            type Value = $int;
            type Bits = $int;

            #[inline(always)]
            fn load_bits(&self, order: Ordering) -> $int {
                self.load(order)
            }

            #[inline(always)]
            fn compare_exchange_bits(
                &self,
                current: $int,
                new: $int,
                success: Ordering,
                failure: Ordering,
            ) -> Result<$int, $int> {
                self.compare_exchange_weak(current, new, success, failure)
            }
        }
    )*};
}

atomic_integer!(AtomicU32 => u32, AtomicI32 => i32, AtomicU64 => u64, AtomicI64 => i64);

/// Map a float onto a `u32` whose unsigned order matches the float's order
/// (negative values below positive ones, `-0.0` just below `0.0`).
#[inline(always)]
pub fn ordered_bits(value: f32) -> u32 {
    let bits = value.to_bits();
    if bits & 0x8000_0000 != 0 { !bits } else { bits | 0x8000_0000 }
}

#[inline(always)]
pub fn from_ordered_bits(bits: u32) -> f32 {
    if bits & 0x8000_0000 != 0 {
        f32::from_bits(bits & 0x7fff_ffff)
    } else {
        f32::from_bits(!bits)
    }
}

/// Pack a depth with a fragment identifier into one `u64` for an `AtomicU64`
/// cell. Minimum-of-packed is the nearest depth, ties going to the lowest id,
/// and the winning id travels in the same swap as its depth.
#[inline(always)]
pub fn pack_depth_and_id(depth: f32, id: u32) -> u64 {
    ((ordered_bits(depth) as u64) << 32) | id as u64
}

#[inline(always)]
pub fn unpack_depth_and_id(packed: u64) -> (f32, u32) {
    (from_ordered_bits((packed >> 32) as u32), packed as u32)
}

/// Cell count of a `width` x `height` target, or `None` when the pixel index
/// would not fit in a `u32`.
pub fn pixel_count(width: u32, height: u32) -> Option<usize> {
    width.checked_mul(height).map(|n| n as usize)
}

/// Per-pixel nearest-depth cells shared by reference across workers.
///
/// Pixel accessors check `x < width` and `y < height`; coordinates outside the
/// target never alias another pixel.
pub struct DepthBuffer {
    pub width: u32,
    pub height: u32,
    cells: Vec<AtomicF32>,
}

impl DepthBuffer {
    pub fn new(width: u32, height: u32) -> anyhow::Result<Self> {
        let Some(size_calc) = pixel_count(width, height) else {
            bail!("{width}x{height} depth buffer exceeds the u32 pixel index range");
        };
        log::debug!("allocating {width}x{height} depth buffer");
        Ok(Self {
            width,
            height,
            cells: (0..size_calc).map(|_| AtomicF32::default()).collect(),
        })
    }

    pub fn clear(&mut self) {
        self.cells
            .par_iter_mut()
            .for_each(|cell| cell.store(f32::INFINITY, Ordering::Relaxed));
        log::trace!("cleared depth buffer");
    }

    #[inline(always)]
    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    pub fn cells(&self) -> &[AtomicF32] {
        &self.cells
    }

    #[inline(always)]
    pub fn cell(&self, x: u32, y: u32) -> Option<&AtomicF32> {
        self.index(x, y).and_then(|i| self.cells.get(i))
    }

    pub fn depth(&self, x: u32, y: u32) -> Option<f32> {
        self.cell(x, y).map(|c| c.load(Ordering::Acquire))
    }

    /// Offer `depth` to a pixel. True when this offer lowered the stored value;
    /// a later, nearer offer may still replace it. Out-of-range pixels are
    /// rejected with `false`.
    #[inline(always)]
    pub fn test_and_set(&self, x: u32, y: u32, depth: f32) -> bool {
        self.cell(x, y).is_some_and(|cell| atomic_minimum(cell, depth) > depth)
    }

    /// Second-pass check once every depth has been offered. Fragments with a
    /// depth equal to the final value all pass.
    #[inline(always)]
    pub fn is_nearest(&self, x: u32, y: u32, depth: f32) -> bool {
        self.depth(x, y) == Some(depth)
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.cells.iter().map(|c| c.load(Ordering::Acquire)).collect()
    }

    /// Grayscale view, nearest surface brightest and empty pixels black.
    pub fn to_image(&self) -> GrayImage {
        let depths = self.to_vec();
        let (near, far) = depths
            .iter()
            .filter(|d| d.is_finite())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &d| (lo.min(d), hi.max(d)));
        let range = (far - near).max(f32::EPSILON);
        GrayImage::from_fn(self.width, self.height, |x, y| {
            let d = depths[y as usize * self.width as usize + x as usize];
            if !d.is_finite() {
                return Luma([0]);
            }
            let t = (d - near) / range;
            Luma([(255.0 - t * 223.0).round().clamp(0.0, 255.0) as u8])
        })
    }

    pub fn save_image<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        self.to_image()
            .save(path)
            .with_context(|| format!("writing depth image to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_minimum_returns_prior_value() {
        let cell = AtomicF32::default();
        assert_eq!(atomic_minimum(&cell, 5.0), f32::INFINITY);
        assert_eq!(atomic_minimum(&cell, 7.0), 5.0);
        assert_eq!(cell.load(Ordering::Relaxed), 5.0);
        assert_eq!(atomic_minimum(&cell, 2.5), 5.0);
        assert_eq!(cell.into_inner(), 2.5);
    }

    #[test]
    fn nan_candidate_is_ignored() {
        let cell = AtomicF32::new(1.0);
        assert_eq!(atomic_minimum(&cell, f32::NAN), 1.0);
        assert_eq!(cell.load(Ordering::Relaxed), 1.0);
    }

    #[test]
    fn works_for_f64_and_integers() {
        let wide = AtomicF64::default();
        atomic_minimum(&wide, 0.125);
        assert_eq!(wide.load_value(), 0.125);

        let fixed = AtomicU32::new(u32::MAX);
        assert_eq!(atomic_minimum(&fixed, 40), u32::MAX);
        assert_eq!(atomic_minimum(&fixed, 41), 40);
        assert_eq!(fixed.load(Ordering::Relaxed), 40);

        let signed = AtomicI64::new(0);
        atomic_minimum(&signed, -9);
        assert_eq!(signed.load_value(), -9);
    }

    #[test]
    fn ordered_bits_preserve_float_order() {
        let values = [f32::NEG_INFINITY, -3.5, -0.0, 0.0, 1e-30, 2.0, f32::INFINITY];
        for pair in values.windows(2) {
            assert!(ordered_bits(pair[0]) < ordered_bits(pair[1]), "{pair:?}");
        }
        for v in values {
            assert_eq!(from_ordered_bits(ordered_bits(v)).to_bits(), v.to_bits());
        }
    }

    #[test]
    fn packed_ties_go_to_lowest_id() {
        let cell = AtomicU64::new(pack_depth_and_id(f32::INFINITY, u32::MAX));
        atomic_minimum(&cell, pack_depth_and_id(3.0, 9));
        atomic_minimum(&cell, pack_depth_and_id(3.0, 4));
        atomic_minimum(&cell, pack_depth_and_id(3.5, 1));
        assert_eq!(unpack_depth_and_id(cell.load(Ordering::Relaxed)), (3.0, 4));
    }

    #[test]
    fn depth_buffer_test_and_set() {
        let mut buffer = DepthBuffer::new(4, 3).unwrap();
        assert!(buffer.test_and_set(1, 2, 8.0));
        assert!(!buffer.test_and_set(1, 2, 9.0));
        assert!(!buffer.test_and_set(1, 2, 8.0));
        assert!(buffer.test_and_set(1, 2, 1.0));
        assert!(buffer.is_nearest(1, 2, 1.0));
        assert!(!buffer.is_nearest(1, 2, 8.0));
        assert_eq!(buffer.depth(0, 0), Some(f32::INFINITY));

        buffer.clear();
        assert!(buffer.to_vec().iter().all(|d| *d == f32::INFINITY));
    }

    #[test]
    fn depth_image_marks_empty_pixels_black() {
        let buffer = DepthBuffer::new(3, 1).unwrap();
        buffer.test_and_set(0, 0, 1.0);
        buffer.test_and_set(1, 0, 5.0);
        let img = buffer.to_image();
        assert_eq!(img.get_pixel(0, 0)[0], 255);
        assert_eq!(img.get_pixel(1, 0)[0], 32);
        assert_eq!(img.get_pixel(2, 0)[0], 0);
    }

    #[test]
    fn oversized_buffer_is_rejected() {
        assert_eq!(pixel_count(65_536, 65_536), None);
        assert_eq!(pixel_count(u32::MAX, 1), Some(u32::MAX as usize));
        let err = DepthBuffer::new(65_536, 65_536).err().unwrap();
        assert!(err.to_string().contains("65536x65536"), "{err}");
    }

    #[test]
    fn out_of_range_pixels_do_not_alias() {
        let buffer = DepthBuffer::new(4, 3).unwrap();
        // (4, 0) would land on (0, 1) with a flat row-major index.
        assert!(!buffer.test_and_set(4, 0, 1.0));
        assert!(!buffer.test_and_set(0, 3, 1.0));
        assert_eq!(buffer.depth(0, 1), Some(f32::INFINITY));
        assert_eq!(buffer.depth(4, 0), None);
        assert!(buffer.cell(3, 3).is_none());
        assert!(!buffer.is_nearest(4, 0, f32::INFINITY));
        assert!(buffer.to_vec().iter().all(|d| *d == f32::INFINITY));
    }
}
