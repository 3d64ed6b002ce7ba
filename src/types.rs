//! Configuration newtypes and error types shared across the crate.

use crate::{DEFAULT_RADIUS, MAX_CLUSTERS, MAX_PIXELS};
use palette::Srgba;
use std::{
    error::Error,
    fmt::{Debug, Display},
    ops::Deref,
};
#[cfg(feature = "image")]
use {image::RgbaImage, palette::cast::ComponentsAs};

/// An error type for when the length of an input (e.g., `Vec` or slice)
/// is above the maximum supported value.
///
/// The inner value is the maximum supported value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AboveMaxLen<T>(pub T);

impl<T: Display> Display for AboveMaxLen<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "above the maximum length of {}", self.0)
    }
}

impl<T: Debug + Display> Error for AboveMaxLen<T> {}

/// An error type for cluster counts outside the supported range of
/// `1..=`[`MAX_CLUSTERS`].
///
/// The inner value is the rejected count. A count of `0` is rejected at
/// configuration time so that the cluster engine never has to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct InvalidClusterCount(pub u16);

impl Display for InvalidClusterCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid cluster count {}: must be in 1..={MAX_CLUSTERS}",
            self.0
        )
    }
}

impl Error for InvalidClusterCount {}

/// An error type for projection radii that are not finite and strictly
/// positive.
///
/// The inner value is the rejected radius.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct InvalidRadius(pub f32);

impl Display for InvalidRadius {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid cluster radius {}: must be finite and strictly positive",
            self.0
        )
    }
}

impl Error for InvalidRadius {}

/// An error type for cluster engine operations that require centroids,
/// returned when [`initialize_centroids`](crate::ClusterEngine::initialize_centroids)
/// has never been called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotInitialized;

impl Display for NotInitialized {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "centroids have not been initialized")
    }
}

impl Error for NotInitialized {}

/// An error type for nearest-centroid lookups performed before any centroid
/// has been initialized.
///
/// Carries the color that could not be assigned. This is a contract
/// violation on the caller's part, not an expected runtime condition: once
/// centroids exist, every color has a nearest centroid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnassignedColor {
    /// The color that could not be assigned to a cluster.
    pub color: Srgba<u8>,
}

impl Display for UnassignedColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Srgba { color, alpha } = self.color;
        write!(
            f,
            "no cluster for color ({}, {}, {}, {alpha}): centroids have not been initialized",
            color.red, color.green, color.blue,
        )
    }
}

impl Error for UnassignedColor {}

/// The number of clusters (and centroids) owned by a cluster engine.
///
/// This is a simple new type wrapper around `u16` with the invariant that it
/// must be in `1..=`[`MAX_CLUSTERS`]. Fixed for the lifetime of an engine.
///
/// # Examples
/// Use `try_into` to create [`ClusterCount`]s from `u16`s,
/// or use the [`ClusterCount::DEFAULT`] constant.
///
/// ```
/// # use chromak::{ClusterCount, InvalidClusterCount};
/// # fn main() -> Result<(), InvalidClusterCount> {
/// let count = ClusterCount::try_from(8u16)?;
/// let count: ClusterCount = 8u16.try_into()?;
/// assert!(ClusterCount::try_from(0u16).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ClusterCount(u16);

impl ClusterCount {
    /// The default cluster count of `8`.
    pub const DEFAULT: Self = Self(8);

    /// The maximum supported cluster count (given by [`MAX_CLUSTERS`]).
    pub const MAX: Self = Self(MAX_CLUSTERS);

    /// Gets the inner `u16` value.
    #[must_use]
    pub const fn into_inner(self) -> u16 {
        self.0
    }
}

impl Default for ClusterCount {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<ClusterCount> for u16 {
    fn from(val: ClusterCount) -> Self {
        val.into_inner()
    }
}

impl From<ClusterCount> for usize {
    fn from(val: ClusterCount) -> Self {
        val.into_inner().into()
    }
}

impl TryFrom<u16> for ClusterCount {
    type Error = InvalidClusterCount;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        if (1..=MAX_CLUSTERS).contains(&value) {
            Ok(Self(value))
        } else {
            Err(InvalidClusterCount(value))
        }
    }
}

impl Display for ClusterCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.into_inner())
    }
}

/// The radius of the clustering cube that colors are projected into.
///
/// Each color channel is scaled by `radius / 255`, so samples lie in
/// `[0, radius]` on every axis. The radius is shared by every sample and
/// centroid and must not change for the lifetime of an engine: rescaling
/// centroids without re-projecting samples would desynchronize the two.
///
/// This is a new type wrapper around `f32` with the invariant that it must
/// be finite and strictly positive.
///
/// # Examples
/// ```
/// # use chromak::{ClusterRadius, InvalidRadius};
/// # fn main() -> Result<(), InvalidRadius> {
/// let radius = ClusterRadius::default(); // 20
/// let radius: ClusterRadius = 10.0f32.try_into()?;
/// assert!(ClusterRadius::try_from(-1.0f32).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct ClusterRadius(f32);

impl ClusterRadius {
    /// Gets the inner `f32` value.
    #[must_use]
    pub const fn into_inner(self) -> f32 {
        self.0
    }
}

impl Default for ClusterRadius {
    fn default() -> Self {
        Self(DEFAULT_RADIUS)
    }
}

impl From<ClusterRadius> for f32 {
    fn from(val: ClusterRadius) -> Self {
        val.into_inner()
    }
}

impl TryFrom<f32> for ClusterRadius {
    type Error = InvalidRadius;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(InvalidRadius(value))
        }
    }
}

impl Display for ClusterRadius {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.into_inner())
    }
}

/// A simple new type wrapper around `&'a [Srgba<u8>]` with the invariant that
/// the length of the inner slice must not be greater than [`MAX_PIXELS`].
///
/// # Examples
/// Use `try_into` or [`ColorSlice::from_truncated`] to create [`ColorSlice`]s.
///
/// From a raw color slice:
/// ```
/// # use chromak::{ColorSlice, AboveMaxLen};
/// # use palette::Srgba;
/// # fn main() -> Result<(), AboveMaxLen<u32>> {
/// let srgba = vec![Srgba::new(0u8, 0, 0, 255)];
/// let colors: ColorSlice = srgba.as_slice().try_into()?;
/// # Ok(())
/// # }
/// ```
///
/// From an image (needs the `image` feature to be enabled):
/// ```no_run
/// # use chromak::ColorSlice;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let img = image::open("some image")?.into_rgba8();
/// let colors = ColorSlice::try_from(&img)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct ColorSlice<'a>(&'a [Srgba<u8>]);

impl<'a> Clone for ColorSlice<'a> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a> Copy for ColorSlice<'a> {}

impl<'a> ColorSlice<'a> {
    /// Creates a [`ColorSlice`] without ensuring that its length
    /// is less than or equal to [`MAX_PIXELS`].
    #[allow(unused)]
    pub(crate) const fn new_unchecked(colors: &'a [Srgba<u8>]) -> Self {
        Self(colors)
    }

    /// Creates a new [`ColorSlice`] by truncating the input slice to a max
    /// length of [`MAX_PIXELS`].
    #[must_use]
    pub fn from_truncated(colors: &'a [Srgba<u8>]) -> Self {
        Self(&colors[..colors.len().min(MAX_PIXELS as usize)])
    }

    /// Returns the length of the slice as a `u32`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn num_colors(&self) -> u32 {
        self.0.len() as u32
    }
}

impl<'a> AsRef<[Srgba<u8>]> for ColorSlice<'a> {
    fn as_ref(&self) -> &[Srgba<u8>] {
        self
    }
}

impl<'a> Deref for ColorSlice<'a> {
    type Target = [Srgba<u8>];

    fn deref(&self) -> &Self::Target {
        self.0
    }
}

impl<'a> From<ColorSlice<'a>> for &'a [Srgba<u8>] {
    fn from(val: ColorSlice<'a>) -> Self {
        val.0
    }
}

impl<'a> TryFrom<&'a [Srgba<u8>]> for ColorSlice<'a> {
    type Error = AboveMaxLen<u32>;

    fn try_from(slice: &'a [Srgba<u8>]) -> Result<Self, Self::Error> {
        if slice.len() <= MAX_PIXELS as usize {
            Ok(Self(slice))
        } else {
            Err(AboveMaxLen(MAX_PIXELS))
        }
    }
}

#[cfg(feature = "image")]
impl<'a> TryFrom<&'a RgbaImage> for ColorSlice<'a> {
    type Error = AboveMaxLen<u32>;

    fn try_from(image: &'a RgbaImage) -> Result<Self, Self::Error> {
        let pixels = image.pixels().len();
        if pixels <= MAX_PIXELS as usize {
            let buf = &image.as_raw()[..(pixels * 4)];
            Ok(Self(buf.components_as()))
        } else {
            Err(AboveMaxLen(MAX_PIXELS))
        }
    }
}
