//! Enhance a single image and print its quality metrics.
//!
//! Usage:
//! ```sh
//! cargo run --example enhance_image -- input.jpg output.jpg
//! ```

use std::env;
use std::process;

use pixel_enhance::EnhanceEngine;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <input> <output>", args[0]);
        process::exit(1);
    }

    let input = &args[1];
    let output = &args[2];

    let engine = EnhanceEngine::new();
    let result = engine.process_file(input.as_ref(), output.as_ref());

    match (result.success, result.metrics) {
        (true, Some(m)) => println!(
            "Done: sharpness {}%, noise reduction {}%, color {}%",
            m.sharpness,
            m.noise_reduction(),
            m.color_enhance
        ),
        (true, None) => println!("Done: {}", result.message),
        (false, _) => {
            eprintln!("Error: {}", result.message);
            process::exit(1);
        }
    }
}
