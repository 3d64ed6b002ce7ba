//! Whole-image quantization against a clustered engine.

use crate::{
    project, sample::CentroidChunks, ClusterEngine, ClusterRadius, UnassignedColor,
};
use image::RgbaImage;
use palette::{
    cast::{ComponentsAs, IntoComponents},
    Srgba,
};
#[cfg(feature = "threads")]
use rayon::prelude::*;

/// Per-pixel remap state shared by the serial and parallel paths so that
/// both produce byte-identical output.
struct Remap {
    chunks: CentroidChunks,
    palette: Vec<Srgba<u8>>,
    radius: ClusterRadius,
}

impl Remap {
    fn new(engine: &ClusterEngine) -> Self {
        Self {
            chunks: CentroidChunks::new(engine.centroids()),
            palette: engine.centroid_colors(),
            radius: engine.radius(),
        }
    }

    /// Replaces a pixel with its nearest centroid's color, preserving alpha.
    fn pixel(&self, pixel: Srgba<u8>) -> Srgba<u8> {
        let index = self.chunks.nearest(project(pixel, self.radius));
        let mut color = self.palette[index];
        color.alpha = pixel.alpha;
        color
    }
}

fn rgba_image(image: &RgbaImage, buf: Vec<Srgba<u8>>) -> RgbaImage {
    let (width, height) = image.dimensions();

    #[allow(clippy::unwrap_used)]
    {
        // buf has one color per source pixel, so it is exactly large enough
        RgbaImage::from_vec(width, height, buf.into_components()).unwrap()
    }
}

fn check_initialized<'a>(
    engine: &ClusterEngine,
    pixels: &'a [Srgba<u8>],
) -> Result<&'a [Srgba<u8>], UnassignedColor> {
    if engine.is_initialized() {
        Ok(pixels)
    } else {
        match pixels.first() {
            // report the first color that could not be assigned
            Some(&color) => Err(UnassignedColor { color }),
            None => Ok(pixels),
        }
    }
}

/// Quantizes an image against the engine's current centroids.
///
/// Every pixel is replaced by the color of its nearest centroid (the same
/// projection and tie-break as [`ClusterEngine::reassign`], so exporting
/// right after a reassignment selects exactly the cluster each pixel's
/// sample belongs to). Alpha and dimensions are preserved.
///
/// # Errors
/// Returns [`UnassignedColor`] carrying the first pixel's color if the
/// engine's centroids have never been initialized.
pub fn quantized_rgba_image(
    engine: &ClusterEngine,
    image: &RgbaImage,
) -> Result<RgbaImage, UnassignedColor> {
    let pixels: &[Srgba<u8>] = image.as_raw().components_as();
    let pixels = check_initialized(engine, pixels)?;

    let remap = Remap::new(engine);
    let buf = pixels.iter().map(|&pixel| remap.pixel(pixel)).collect();
    Ok(rgba_image(image, buf))
}

/// Parallel version of [`quantized_rgba_image`].
///
/// Produces byte-identical output: pixels are independent and the
/// nearest-centroid tie-break is deterministic, so only the work order
/// differs.
///
/// # Errors
/// See [`quantized_rgba_image`].
#[cfg(feature = "threads")]
pub fn quantized_rgba_image_par(
    engine: &ClusterEngine,
    image: &RgbaImage,
) -> Result<RgbaImage, UnassignedColor> {
    let pixels: &[Srgba<u8>] = image.as_raw().components_as();
    let pixels = check_initialized(engine, pixels)?;

    let remap = Remap::new(engine);
    let buf = pixels
        .par_iter()
        .map(|&pixel| remap.pixel(pixel))
        .collect();
    Ok(rgba_image(image, buf))
}
