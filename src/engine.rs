//! The cluster engine: exclusive owner of the samples, centroids, and
//! partitions that make up the clustering state.

use crate::{
    sample::{project, sample_to_color, CentroidChunks, Sample},
    ClusterCount, ClusterRadius, NotInitialized, UnassignedColor, UniqueColors,
};
use palette::Srgba;
use rand::{prelude::Distribution, SeedableRng};
use rand_distr::Uniform;
use rand_xoshiro::Xoroshiro128PlusPlus;
use std::array;

/// K-means clustering state over the projected distinct colors of an image.
///
/// The engine owns K centroids and K partitions of an immutable sample list.
/// Centroids start uninitialized; the typical cycle is one [`refine`] call
/// per operator trigger, which performs a single Lloyd iteration:
/// [`initialize_centroids`] (recompute centroids from the *current*
/// partitions) followed by [`reassign`] (rebuild the partitions against the
/// new centroids). Repeating the trigger walks the clustering toward a local
/// optimum; there is deliberately no convergence detection.
///
/// All operations are pure given the engine's state and the seeded RNG, so
/// two engines built with the same inputs and seed evolve identically.
///
/// [`refine`]: ClusterEngine::refine
/// [`initialize_centroids`]: ClusterEngine::initialize_centroids
/// [`reassign`]: ClusterEngine::reassign
#[derive(Debug, Clone)]
pub struct ClusterEngine {
    /// Projected once from the deduplicated colors, immutable thereafter.
    samples: Vec<Sample>,
    /// Empty until the first `initialize_centroids`, then always of length K.
    centroids: Vec<Sample>,
    /// Always of length K. Rebuilt wholesale by `reassign`.
    partitions: Vec<Vec<Sample>>,
    cluster_count: ClusterCount,
    radius: ClusterRadius,
    rng: Xoroshiro128PlusPlus,
}

impl ClusterEngine {
    /// Creates an engine over the given distinct colors.
    ///
    /// Every color is projected into the clustering cube exactly once.
    /// Centroids are left uninitialized: call
    /// [`refine`](ClusterEngine::refine) (or
    /// [`initialize_centroids`](ClusterEngine::initialize_centroids))
    /// before querying clusters. `seed` drives all randomized centroid
    /// placement.
    #[must_use]
    pub fn new(
        colors: &UniqueColors,
        cluster_count: ClusterCount,
        radius: ClusterRadius,
        seed: u64,
    ) -> Self {
        let samples = colors
            .colors()
            .iter()
            .map(|&color| project(color, radius))
            .collect();

        let k = usize::from(cluster_count);
        Self {
            samples,
            centroids: Vec::with_capacity(k),
            partitions: vec![Vec::new(); k],
            cluster_count,
            radius,
            rng: Xoroshiro128PlusPlus::seed_from_u64(seed),
        }
    }

    /// Recomputes every centroid from the current partitions (warm restart).
    ///
    /// A cluster with a non-empty partition gets the componentwise mean of
    /// its samples; a cluster with an empty partition gets a fresh centroid
    /// drawn uniformly at random from `[-radius, radius]` on each axis. The
    /// first call therefore performs a purely random initialization, while
    /// later calls converge occupied clusters and relocate empty ones.
    pub fn initialize_centroids(&mut self) {
        let radius = self.radius.into_inner();
        let span = Uniform::new_inclusive(-radius, radius);

        if self.centroids.is_empty() {
            self.centroids.resize(usize::from(self.cluster_count), [0.0; 3]);
        }

        for (centroid, partition) in self.centroids.iter_mut().zip(&self.partitions) {
            if partition.is_empty() {
                *centroid = array::from_fn(|_| span.sample(&mut self.rng));
            } else {
                let mut sum = [0.0f64; 3];
                for sample in partition {
                    for (sum, &axis) in sum.iter_mut().zip(sample) {
                        *sum += f64::from(axis);
                    }
                }

                #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
                {
                    let count = partition.len() as f64;
                    *centroid = sum.map(|sum| (sum / count) as f32);
                }
            }
        }
    }

    /// Rebuilds all K partitions from scratch against the current centroids.
    ///
    /// Every sample is assigned to its minimum-squared-distance centroid,
    /// with exact ties going to the lowest cluster index. Previous
    /// memberships are discarded, not merged; partition buffers keep their
    /// capacity across calls. O(N·K), intended to be operator triggered.
    ///
    /// # Errors
    /// Returns [`NotInitialized`] if centroids have never been initialized.
    pub fn reassign(&mut self) -> Result<(), NotInitialized> {
        if self.centroids.is_empty() {
            return Err(NotInitialized);
        }

        let chunks = CentroidChunks::new(&self.centroids);

        for partition in &mut self.partitions {
            partition.clear();
        }

        for &sample in &self.samples {
            self.partitions[chunks.nearest(sample)].push(sample);
        }

        Ok(())
    }

    /// Performs one Lloyd iteration: [`initialize_centroids`] then
    /// [`reassign`], in exactly that order.
    ///
    /// Centroids are recomputed from the current partitions *before* samples
    /// are reassigned, so each call continues from the previous state rather
    /// than starting over. This ordering is what makes the warm restart
    /// work; do not swap it.
    ///
    /// # Errors
    /// Never fails in practice: initialization precedes reassignment.
    ///
    /// [`initialize_centroids`]: ClusterEngine::initialize_centroids
    /// [`reassign`]: ClusterEngine::reassign
    pub fn refine(&mut self) -> Result<(), NotInitialized> {
        self.initialize_centroids();
        self.reassign()
    }

    /// Finds the cluster whose centroid is nearest to the given color.
    ///
    /// The color is projected exactly like the engine's samples were, and
    /// the same lowest-index tie-break applies, so for any color in the
    /// deduplicated sample set this agrees with the partition produced by
    /// the last [`reassign`](ClusterEngine::reassign). The color does not
    /// have to be a member of that set.
    ///
    /// # Errors
    /// Returns [`UnassignedColor`] carrying the offending color if centroids
    /// have never been initialized.
    pub fn nearest_cluster(&self, color: Srgba<u8>) -> Result<usize, UnassignedColor> {
        if self.centroids.is_empty() {
            return Err(UnassignedColor { color });
        }

        let chunks = CentroidChunks::new(&self.centroids);
        Ok(chunks.nearest(project(color, self.radius)))
    }

    /// The projected samples, in deduplication order.
    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// The current centroids. Empty until the first
    /// [`initialize_centroids`](ClusterEngine::initialize_centroids),
    /// of length K afterwards.
    #[must_use]
    pub fn centroids(&self) -> &[Sample] {
        &self.centroids
    }

    /// The current partitions, one per cluster index. Samples appear in the
    /// discovery order of the last [`reassign`](ClusterEngine::reassign).
    #[must_use]
    pub fn partitions(&self) -> &[Vec<Sample>] {
        &self.partitions
    }

    /// The centroids mapped back to colors (opaque alpha), e.g. for
    /// rendering or palette listings.
    #[must_use]
    pub fn centroid_colors(&self) -> Vec<Srgba<u8>> {
        self.centroids
            .iter()
            .map(|&centroid| sample_to_color(centroid, self.radius, u8::MAX))
            .collect()
    }

    /// The configured number of clusters.
    #[must_use]
    pub const fn cluster_count(&self) -> ClusterCount {
        self.cluster_count
    }

    /// The projection radius shared by samples and centroids.
    #[must_use]
    pub const fn radius(&self) -> ClusterRadius {
        self.radius
    }

    /// Whether centroids have been initialized at least once.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        !self.centroids.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::{tests::*, ColorSlice};
    use std::collections::HashMap;

    fn unique(colors: &[Srgba<u8>]) -> UniqueColors {
        UniqueColors::new(ColorSlice::try_from(colors).unwrap())
    }

    fn count(value: u16) -> ClusterCount {
        ClusterCount::try_from(value).unwrap()
    }

    fn radius(value: f32) -> ClusterRadius {
        ClusterRadius::try_from(value).unwrap()
    }

    fn sample_multiset(samples: impl IntoIterator<Item = Sample>) -> HashMap<[u32; 3], u32> {
        let mut counts = HashMap::new();
        for sample in samples {
            *counts.entry(sample.map(f32::to_bits)).or_insert(0) += 1;
        }
        counts
    }

    fn engine_1024(k: u16, seed: u64) -> ClusterEngine {
        let colors = test_colors_1024();
        ClusterEngine::new(&unique(&colors), count(k), ClusterRadius::default(), seed)
    }

    #[test]
    fn reassign_before_initialization_fails() {
        let mut engine = engine_1024(8, 0);
        assert!(!engine.is_initialized());
        assert_eq!(engine.reassign(), Err(NotInitialized));

        engine.initialize_centroids();
        assert!(engine.is_initialized());
        assert_eq!(engine.centroids().len(), 8);
        assert_eq!(engine.reassign(), Ok(()));
    }

    #[test]
    fn partitions_cover_every_sample_exactly_once() {
        let mut engine = engine_1024(8, 7);
        engine.refine().unwrap();

        let total: usize = engine.partitions().iter().map(Vec::len).sum();
        assert_eq!(total, engine.samples().len());

        let expected = sample_multiset(engine.samples().iter().copied());
        let actual = sample_multiset(engine.partitions().iter().flatten().copied());
        assert_eq!(actual, expected);
    }

    #[test]
    fn repeated_refinement_keeps_the_invariants() {
        let mut engine = engine_1024(8, 3);
        let expected = sample_multiset(engine.samples().iter().copied());

        for _ in 0..10 {
            engine.refine().unwrap();
            assert_eq!(engine.centroids().len(), 8);
            assert_eq!(
                sample_multiset(engine.partitions().iter().flatten().copied()),
                expected
            );
        }
    }

    #[test]
    fn same_seed_same_clustering() {
        let mut a = engine_1024(8, 99);
        let mut b = engine_1024(8, 99);

        for _ in 0..3 {
            a.refine().unwrap();
            b.refine().unwrap();
            assert_eq!(a.centroids(), b.centroids());
            assert_eq!(a.partitions(), b.partitions());
        }
    }

    #[test]
    fn equidistant_centroids_assign_to_the_lowest_index() {
        let colors = test_colors_1024();
        let mut engine = ClusterEngine::new(&unique(&colors), count(4), radius(20.0), 0);

        // identical centroids make every sample an exact tie
        engine.centroids = vec![[5.0, 5.0, 5.0]; 4];
        for _ in 0..3 {
            engine.reassign().unwrap();
            assert_eq!(engine.partitions()[0].len(), engine.samples().len());
            assert!(engine.partitions()[1..].iter().all(|p| p.is_empty()));
        }
    }

    #[test]
    fn empty_partitions_get_fresh_in_range_centroids() {
        let colors = [Srgba::new(10u8, 20, 30, 255)];
        let mut engine = ClusterEngine::new(&unique(&colors), count(4), radius(20.0), 5);
        engine.refine().unwrap();

        let occupied = engine
            .partitions()
            .iter()
            .position(|p| !p.is_empty())
            .unwrap();

        engine.initialize_centroids();
        for (i, &centroid) in engine.centroids().iter().enumerate() {
            if i == occupied {
                // mean of a singleton partition is the sample itself
                assert_eq!(centroid, engine.samples()[0]);
            } else {
                assert!(centroid
                    .iter()
                    .all(|&axis| axis.is_finite() && (-20.0..=20.0).contains(&axis)));
            }
        }
    }

    #[test]
    fn a_single_cluster_absorbs_everything() {
        let mut engine = engine_1024(1, 0);
        engine.refine().unwrap();
        assert_eq!(engine.partitions().len(), 1);
        assert_eq!(engine.partitions()[0].len(), engine.samples().len());

        // second refine: centroid becomes the mean, nothing moves
        engine.refine().unwrap();
        assert_eq!(engine.partitions()[0].len(), engine.samples().len());
    }

    #[test]
    fn black_and_white_form_singleton_partitions() {
        let black = Srgba::new(0u8, 0, 0, 255);
        let white = Srgba::new(255u8, 255, 255, 255);
        let radius = radius(10.0);

        let mut engine = ClusterEngine::new(&unique(&[black, white]), count(2), radius, 0);

        // start from the two points themselves as centroids
        engine.centroids = vec![project(black, radius), project(white, radius)];
        engine.reassign().unwrap();

        // one full cycle from that state
        engine.refine().unwrap();
        let partitions = engine.partitions().to_vec();
        assert_eq!(partitions[0], vec![project(black, radius)]);
        assert_eq!(partitions[1], vec![project(white, radius)]);
        assert_eq!(engine.centroids()[0], project(black, radius));
        assert_eq!(engine.centroids()[1], project(white, radius));

        // fixed point: reassigning with unchanged centroids is idempotent
        engine.reassign().unwrap();
        assert_eq!(engine.partitions(), partitions.as_slice());
    }

    #[test]
    fn nearest_cluster_agrees_with_the_live_partition() {
        let colors = test_colors_1024();
        let unique = unique(&colors);
        let mut engine = ClusterEngine::new(&unique, count(8), ClusterRadius::default(), 11);
        engine.refine().unwrap();

        for &color in unique.colors() {
            let index = engine.nearest_cluster(color).unwrap();
            let sample = project(color, engine.radius()).map(f32::to_bits);
            assert!(engine.partitions()[index]
                .iter()
                .any(|&member| member.map(f32::to_bits) == sample));
        }
    }

    #[test]
    fn nearest_cluster_works_for_unseen_colors() {
        let mut engine = engine_1024(8, 2);
        engine.refine().unwrap();

        // a color that is almost surely not in the seeded sample set
        let color = Srgba::new(1u8, 1, 1, 1);
        let index = engine.nearest_cluster(color).unwrap();
        assert!(index < 8);
    }

    #[test]
    fn uninitialized_lookup_reports_the_color() {
        let engine = engine_1024(8, 0);
        let color = Srgba::new(1u8, 2, 3, 4);
        let err = engine.nearest_cluster(color).unwrap_err();
        assert_eq!(err, UnassignedColor { color });
        assert!(err.to_string().contains("(1, 2, 3, 4)"));
    }

    #[test]
    fn centroid_colors_round_trip_through_sample_space() {
        let colors = [Srgba::new(0u8, 0, 0, 255), Srgba::new(255u8, 255, 255, 255)];
        let radius = radius(10.0);
        let mut engine = ClusterEngine::new(&unique(&colors), count(2), radius, 0);
        engine.centroids = vec![project(colors[0], radius), project(colors[1], radius)];

        assert_eq!(engine.centroid_colors(), colors);
    }
}
