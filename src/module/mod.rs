//! Format detection and transformation of module sources.
pub mod dependencies;
pub mod detect;
pub mod emit;
pub mod exports;

pub use detect::{detect, DetectedModule, LoaderModule, LoaderShape};
pub use emit::{transform, TransformOptions, TransformResult};
