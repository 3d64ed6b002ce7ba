//! Interactive shell around the cluster engine.
//!
//! Loads an image, clusters its distinct colors once, then reads commands
//! from stdin: `c` runs one more Lloyd iteration, `e` exports the quantized
//! image, `p` prints the centroid palette, `q` quits. Every command runs to
//! completion before the next one is read.

#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice
)]

use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use chromak::{ClusterCount, ClusterEngine, ClusterRadius, ColorSlice, UniqueColors};
use clap::Parser;
use image::RgbaImage;

#[derive(Parser)]
#[command(about = "Interactive k-means clustering over the distinct colors of an image")]
struct Options {
    input: PathBuf,

    #[arg(short, long, default_value = "Output.png")]
    output: PathBuf,

    #[arg(short = 'k', long, default_value_t = ClusterCount::DEFAULT, value_parser = parse_cluster_count)]
    clusters: ClusterCount,

    #[arg(long, default_value_t = ClusterRadius::default(), value_parser = parse_radius)]
    radius: ClusterRadius,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[cfg(feature = "threads")]
    #[arg(short, long, default_value_t = 0)]
    threads: u8,

    #[arg(long)]
    verbose: bool,
}

fn parse_cluster_count(s: &str) -> Result<ClusterCount, String> {
    let value: u16 = s.parse().map_err(|e| format!("{e}"))?;
    value.try_into().map_err(|e| format!("{e}"))
}

fn parse_radius(s: &str) -> Result<ClusterRadius, String> {
    let value: f32 = s.parse().map_err(|e| format!("{e}"))?;
    value.try_into().map_err(|e| format!("{e}"))
}

fn main() {
    let options = Options::parse();
    let verbose = options.verbose;

    macro_rules! log {
        ($name: literal, $val: expr) => {
            if verbose {
                let time = std::time::Instant::now();
                let value = $val;
                println!("{} took {}ms", $name, time.elapsed().as_millis());
                value
            } else {
                $val
            }
        };
    }

    let image = log!("read image", image::open(&options.input).unwrap().into_rgba8());

    let pixels = ColorSlice::try_from(&image).unwrap();
    let unique = log!("deduplication", UniqueColors::new(pixels));
    println!(
        "{}: {} pixels, {} distinct colors",
        options.input.display(),
        unique.total_count(),
        unique.num_colors()
    );

    let mut engine = ClusterEngine::new(&unique, options.clusters, options.radius, options.seed);
    log!("clustering", engine.refine().unwrap());
    print_sizes(&engine);

    prompt();
    for line in io::stdin().lock().lines() {
        let line = line.unwrap();
        match line.trim() {
            "c" | "cluster" => {
                log!("clustering", engine.refine().unwrap());
                print_sizes(&engine);
            }
            "e" | "export" => {
                let quantized = log!("quantization", quantize(&options, &engine, &image));
                log!("write image", quantized.save(&options.output).unwrap());
                println!("wrote {}", options.output.display());
            }
            "p" | "palette" => print_palette(&engine),
            "q" | "quit" => break,
            "" => {}
            other => println!("unknown command: {other}"),
        }
        prompt();
    }
}

#[cfg(feature = "threads")]
fn quantize(options: &Options, engine: &ClusterEngine, image: &RgbaImage) -> RgbaImage {
    match options.threads {
        0 => chromak::quantized_rgba_image_par(engine, image).unwrap(),
        1 => chromak::quantized_rgba_image(engine, image).unwrap(),
        t => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(t.into())
                .build()
                .unwrap();

            pool.install(|| chromak::quantized_rgba_image_par(engine, image).unwrap())
        }
    }
}

#[cfg(not(feature = "threads"))]
fn quantize(_options: &Options, engine: &ClusterEngine, image: &RgbaImage) -> RgbaImage {
    chromak::quantized_rgba_image(engine, image).unwrap()
}

fn print_sizes(engine: &ClusterEngine) {
    let sizes = engine
        .partitions()
        .iter()
        .map(|partition| partition.len().to_string())
        .collect::<Vec<_>>();
    println!("cluster sizes: [{}]", sizes.join(", "));
}

fn print_palette(engine: &ClusterEngine) {
    for (i, color) in engine.centroid_colors().into_iter().enumerate() {
        let size = engine.partitions()[i].len();
        println!(
            "cluster {i}: #{:02x}{:02x}{:02x} ({size} samples)",
            color.red, color.green, color.blue
        );
    }
}

fn prompt() {
    print!("(c = re-cluster, e = export, p = palette, q = quit) > ");
    io::stdout().flush().unwrap();
}
