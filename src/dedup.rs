//! Deduplication of an image's pixels into its distinct colors.

use crate::ColorSlice;
use palette::Srgba;
use std::collections::HashSet;

/// Packs a color into a single `u32` hash key. Identity is exact equality of
/// all four channels, alpha included.
fn packed(color: Srgba<u8>) -> u32 {
    let (red, green, blue, alpha) = color.into_components();
    u32::from_le_bytes([red, green, blue, alpha])
}

/// The distinct colors of a [`ColorSlice`], each appearing exactly once.
///
/// Colors are kept in first-seen order for reproducibility, but no ordering
/// is part of the contract. Membership checks are hash based, so building
/// this is O(n) in the number of pixels regardless of how many of them are
/// duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueColors {
    colors: Vec<Srgba<u8>>,
    total_count: u32,
}

impl UniqueColors {
    /// Deduplicates the given colors.
    #[must_use]
    pub fn new(colors: ColorSlice<'_>) -> Self {
        let mut seen = HashSet::with_capacity(colors.len().min(1 << 16));
        let mut unique = Vec::new();

        for &color in colors.as_ref() {
            if seen.insert(packed(color)) {
                unique.push(color);
            }
        }

        Self { colors: unique, total_count: colors.num_colors() }
    }

    /// The distinct colors, each present exactly once.
    #[must_use]
    pub fn colors(&self) -> &[Srgba<u8>] {
        &self.colors
    }

    /// The number of pixels/colors in the input slice before deduplication.
    #[must_use]
    pub const fn total_count(&self) -> u32 {
        self.total_count
    }

    /// The number of distinct colors as a `u32`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn num_colors(&self) -> u32 {
        self.colors.len() as u32
    }

    /// The number of distinct colors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Whether the input contained no colors at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}
