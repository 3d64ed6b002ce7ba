//! Projection between 8-bit color space and the continuous clustering cube,
//! plus nearest-centroid search over SIMD-packed centroids.

use crate::ClusterRadius;
use palette::Srgba;
use std::array;
use wide::{f32x8, u32x8, CmpLt};

/// A point in the clustering cube.
///
/// Axes correspond to the red, green, and blue channels of a color scaled by
/// `radius / 255`. Centroids live in the same space.
pub type Sample = [f32; 3];

/// Projects a color into the clustering cube.
///
/// Each axis is `channel / 255 * radius`, so every output axis lies in
/// `[0, radius]`. Deterministic and injective over exact integer colors;
/// alpha does not participate.
#[must_use]
pub fn project(color: Srgba<u8>, radius: ClusterRadius) -> Sample {
    let radius = radius.into_inner();
    let (red, green, blue, _) = color.into_components();
    [red, green, blue].map(|channel| f32::from(channel) / 255.0 * radius)
}

/// Maps a point in the clustering cube back to a color, attaching the given
/// alpha.
///
/// The inverse of [`project`]: each channel is `axis * 255 / radius`, rounded
/// and clamped to `[0, 255]`. Clamping matters for centroids, which can sit
/// outside `[0, radius]` after a randomized initialization.
#[must_use]
pub fn sample_to_color(sample: Sample, radius: ClusterRadius, alpha: u8) -> Srgba<u8> {
    let scale = 255.0 / radius.into_inner();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let [red, green, blue] = sample.map(|axis| (axis * scale).round().clamp(0.0, 255.0) as u8);
    Srgba::new(red, green, blue, alpha)
}

/// Squared Euclidean distance between two samples.
#[must_use]
pub fn distance_squared(a: Sample, b: Sample) -> f32 {
    let [x, y, z] = array::from_fn(|i| a[i] - b[i]);
    x * x + y * y + z * z
}

/// Centroids packed eight per SIMD chunk for nearest-centroid queries.
///
/// Remainder lanes are padded with infinity so they can never be selected.
#[derive(Debug, Clone)]
pub(crate) struct CentroidChunks {
    chunks: Vec<[f32x8; 3]>,
    len: usize,
}

impl CentroidChunks {
    pub(crate) fn new(centroids: &[Sample]) -> Self {
        let full_chunks = centroids.chunks_exact(8);
        let remainder = full_chunks.remainder();

        let mut chunks = Vec::with_capacity(centroids.len().div_ceil(8));
        chunks.extend(
            full_chunks
                .clone()
                .map(|chunk| array::from_fn(|c| f32x8::new(array::from_fn(|i| chunk[i][c])))),
        );

        if !remainder.is_empty() {
            let mut arr = [[f32::INFINITY; 8]; 3];
            for (i, point) in remainder.iter().enumerate() {
                for (arr, &axis) in arr.iter_mut().zip(point) {
                    arr[i] = axis;
                }
            }
            chunks.push(arr.map(f32x8::new));
        }

        Self { chunks, len: centroids.len() }
    }

    /// The index of the centroid with minimum squared distance to `sample`.
    ///
    /// Exact distance ties resolve to the lowest centroid index, reproducibly.
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn nearest(&self, sample: Sample) -> usize {
        debug_assert!(!self.chunks.is_empty());

        let incr = u32x8::ONE;
        let mut cur_chunk = u32x8::ZERO;
        let mut min_chunk = cur_chunk;
        let mut min_distance = f32x8::splat(f32::INFINITY);

        let query = sample.map(f32x8::splat);

        for chunk in &self.chunks {
            let distance = array::from_fn::<_, 3, _>(|c| {
                let diff = query[c] - chunk[c];
                diff * diff
            })
            .into_iter()
            .fold(f32x8::ZERO, |a, b| a + b);

            // strict less-than: on an exact tie the earlier chunk keeps the lane
            #[allow(unsafe_code)]
            let mask: u32x8 = unsafe { std::mem::transmute(distance.cmp_lt(min_distance)) };
            min_chunk = mask.blend(cur_chunk, min_chunk);
            min_distance = min_distance.fast_min(distance);
            cur_chunk += incr;
        }

        let distances = min_distance.as_array_ref();
        let chunk_of_lane = min_chunk.as_array_ref();

        // scan lanes by overall centroid index so that cross-lane ties
        // also resolve to the lowest index
        let mut best = 0;
        let mut best_distance = f32::INFINITY;
        for (lane, (&distance, &chunk)) in distances.iter().zip(chunk_of_lane).enumerate() {
            let index = chunk as usize * 8 + lane;
            #[allow(clippy::float_cmp)]
            if distance < best_distance || (distance == best_distance && index < best) {
                best_distance = distance;
                best = index;
            }
        }

        debug_assert!(best < self.len);
        best
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::tests::*;
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoroshiro128PlusPlus;

    fn radius(value: f32) -> ClusterRadius {
        ClusterRadius::try_from(value).unwrap()
    }

    /// Straightforward scalar reference for [`CentroidChunks::nearest`].
    fn nearest_scalar(centroids: &[Sample], sample: Sample) -> usize {
        let mut best = 0;
        let mut best_distance = f32::INFINITY;
        for (i, &centroid) in centroids.iter().enumerate() {
            let distance = distance_squared(sample, centroid);
            if distance < best_distance {
                best_distance = distance;
                best = i;
            }
        }
        best
    }

    #[test]
    fn projection_is_deterministic_and_in_range() {
        let radius = radius(20.0);
        for color in test_colors_1024() {
            let sample = project(color, radius);
            assert_eq!(sample, project(color, radius));
            assert!(sample.iter().all(|&axis| (0.0..=20.0).contains(&axis)));
        }
    }

    #[test]
    fn projection_is_injective_over_channel_values() {
        let radius = ClusterRadius::default();
        let samples = (0..=255u8)
            .map(|r| project(Srgba::new(r, 0, 0, 255), radius))
            .collect::<Vec<_>>();
        for i in 1..samples.len() {
            assert!(samples[i - 1][0] < samples[i][0]);
        }
    }

    #[test]
    fn color_survives_a_projection_round_trip() {
        for r in [1.0, 10.0, 20.0, 1000.0] {
            let r = radius(r);
            for color in test_colors_1024() {
                let sample = project(color, r);
                assert_eq!(sample_to_color(sample, r, color.alpha), color);
            }
        }
    }

    #[test]
    fn out_of_range_samples_are_clamped() {
        let r = ClusterRadius::default();
        let color = sample_to_color([-5.0, 25.0, 10.0], r, 255);
        assert_eq!(color, Srgba::new(0u8, 255, 128, 255));
    }

    #[test]
    fn simd_nearest_matches_scalar() {
        let mut rng = Xoroshiro128PlusPlus::seed_from_u64(123);
        let point = |rng: &mut Xoroshiro128PlusPlus| {
            [(); 3].map(|()| rng.gen_range(-20.0f32..=20.0))
        };

        // both a full-chunk count and one with remainder lanes
        for k in [8, 21] {
            let centroids = (0..k).map(|_| point(&mut rng)).collect::<Vec<_>>();
            let chunks = CentroidChunks::new(&centroids);

            for _ in 0..512 {
                let query = point(&mut rng);
                assert_eq!(chunks.nearest(query), nearest_scalar(&centroids, query));
            }
        }
    }

    #[test]
    fn exact_ties_pick_the_lowest_index() {
        let far = [100.0, 100.0, 100.0];
        let near = [1.0, 2.0, 3.0];
        let query = [0.0, 0.0, 0.0];

        // duplicate winners within one lane pair, across lanes, and across
        // chunk boundaries (indices 7 and 8)
        for (a, b) in [(1, 5), (2, 9), (7, 8)] {
            let mut centroids = vec![far; 12];
            centroids[a] = near;
            centroids[b] = near;
            let chunks = CentroidChunks::new(&centroids);
            for _ in 0..3 {
                assert_eq!(chunks.nearest(query), a);
            }
        }
    }
}
