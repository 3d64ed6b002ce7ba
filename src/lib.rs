//! Interactive k-means clustering over the distinct colors of an image.
//!
//! `chromak` deduplicates an image's pixels into its distinct colors, projects
//! each color into a 3D cube of configurable radius, and runs Lloyd-style
//! k-means over the projected samples. Unlike batch quantizers, refinement is
//! driven by the operator: each call to [`ClusterEngine::refine`] performs
//! exactly one centroid update followed by one reassignment pass, so repeated
//! triggering progressively refines the partition without any convergence
//! detection.
//!
//! # Example
//! ```no_run
//! # use chromak::{ClusterCount, ClusterEngine, ClusterRadius, ColorSlice, UniqueColors};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let image = image::open("some image")?.into_rgba8();
//! let colors = ColorSlice::try_from(&image)?;
//! let unique = UniqueColors::new(colors);
//!
//! let mut engine = ClusterEngine::new(
//!     &unique,
//!     ClusterCount::DEFAULT,
//!     ClusterRadius::default(),
//!     0, // rng seed for randomized centroids
//! );
//!
//! engine.refine()?; // one Lloyd iteration per trigger
//! engine.refine()?;
//!
//! let quantized = chromak::quantized_rgba_image(&engine, &image)?;
//! quantized.save("Output.png")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//! - `image`: enables integration with the [`image`] crate and whole-image
//!   quantization. Enabled by default.
//! - `threads`: exposes a parallel version of whole-image quantization via
//!   [`rayon`]. Enabled by default.
//! - `cli`: builds the interactive `chromak` shell binary.

#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::pedantic,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::expect_used,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice,
    missing_docs,
    rustdoc::all,
    clippy::float_cmp_const,
    clippy::lossy_float_literal
)]
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::many_single_char_names,
    clippy::missing_panics_doc,
    clippy::unreadable_literal,
    clippy::wildcard_imports
)]

mod dedup;
mod engine;
mod sample;
mod types;

#[cfg(feature = "image")]
mod quantize;

pub use dedup::*;
pub use engine::*;
pub use sample::{distance_squared, project, sample_to_color, Sample};
pub use types::*;

#[cfg(feature = "image")]
pub use quantize::*;

/// The maximum supported image size in number of pixels is `u32::MAX`.
pub const MAX_PIXELS: u32 = u32::MAX;

/// The maximum supported number of clusters is `256`.
pub const MAX_CLUSTERS: u16 = 256;

/// The default projection radius of the clustering cube.
pub const DEFAULT_RADIUS: f32 = 20.0;
