//! Handwritten character lookup by elastic stroke matching.
//!
//! Strokes drawn by the user are moment-normalized into a 256×256 frame,
//! resampled at a fixed arc-length interval, and compared stroke by stroke
//! against a reference [`Dataset`]: first cheaply by stroke endpoints, then
//! precisely over whole strokes for the best hundred candidates.
//!
//! ```no_run
//! use kanji_lookup::{Dataset, Pattern, Recognizer};
//!
//! let dataset = Dataset::open("data/kanji.json").unwrap();
//! let recognizer = Recognizer::new(dataset);
//! let input: Pattern = serde_json::from_str("[[[12,80],[140,84]]]").unwrap();
//! let labels = recognizer.recognize(&input);
//! ```

mod candidates;
mod classifier;
mod config;
pub mod correspondence;
mod dataset;
pub mod distance;
mod error;
pub mod features;
mod geometry;
pub mod normalize;
#[cfg(feature = "wasm")]
mod wasm;

pub use candidates::{rank, Candidate, Match};
pub use classifier::{coarse_classification, fine_classification, prepare_pattern, recognize, Recognizer};
pub use config::RecognizerConfig;
pub use dataset::{Dataset, DatasetEntry};
pub use error::LookupError;
pub use geometry::{Pattern, Point, Stroke};
#[cfg(feature = "wasm")]
pub use wasm::{load_dataset, lookup};
