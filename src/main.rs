//! # Marching Terrain Application Entry Point
//!
//! Starts the engine via the library's `run()`.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release
//! ```

fn main() {
    marching_terrain::run();
}
