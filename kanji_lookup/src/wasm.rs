//! Browser entry points. Strokes and results cross the boundary as JSON strings.

use std::cell::RefCell;

use serde_derive::Serialize;
use wasm_bindgen::prelude::*;

use super::classifier::Recognizer;
use super::dataset::Dataset;
use super::error::LookupError;
use super::geometry::Pattern;

thread_local!(static RECOGNIZER: RefCell<Option<Recognizer>> = RefCell::new(None));

#[derive(Serialize)]
struct Failure {
    error: String,
}

#[derive(Serialize)]
struct Loaded {
    entries: usize,
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| String::from("{\"error\":\"serialization failed\"}"))
}

fn failure(err: LookupError) -> String {
    to_json(&Failure { error: err.to_string() })
}

/// Parses a JSON dataset and makes it the one [`lookup`] matches against.
///
/// Returns `{"entries": n}`, or `{"error": "..."}` if the dataset does not parse.
#[wasm_bindgen]
pub fn load_dataset(json: &str) -> String {
    match Dataset::from_json_str(json) {
        Ok(dataset) => {
            let entries = dataset.len();
            RECOGNIZER.with(|r| *r.borrow_mut() = Some(Recognizer::new(dataset)));
            to_json(&Loaded { entries })
        }
        Err(err) => failure(err),
    }
}

/// Recognizes strokes given as `[[[x, y], ...], ...]`; returns a JSON array of up to `limit` labels.
#[wasm_bindgen]
pub fn lookup(input: &str, limit: usize) -> String {
    let strokes: Pattern = match serde_json::from_str(input) {
        Ok(strokes) => strokes,
        Err(err) => return failure(err.into()),
    };
    let mut labels = RECOGNIZER.with(|r| match r.borrow().as_ref() {
        Some(recognizer) => recognizer.recognize(&strokes),
        None => Vec::new(),
    });
    labels.truncate(limit);
    to_json(&labels)
}
