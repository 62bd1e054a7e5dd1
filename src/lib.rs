//! ASL hand shape recognition over hand landmark coordinates.
//!
//! The pipeline is two pure transformations around an external classifier:
//! raw 21-point hand landmarks are normalized into a translation- and
//! scale-invariant feature vector ([`feature`]), the routed classifier turns
//! that into per-class scores ([`nn`]), and the scores are ranked and
//! thresholded into a structured prediction ([`predict`]). The [`recognizer`]
//! module wires these together behind an immutable context object, and
//! [`server`] exposes the result over a minimal HTTP interface.
//!
//! # Environment Variables
//!
//! The server binary is configured through environment variables:
//!
//! * `ASL_MODEL_RIGHT`: path to the ONNX classifier for right hands (required).
//! * `ASL_MODEL_LEFT`: path to the ONNX classifier for left hands (required).
//! * `ASL_LABELS`: path to a JSON label table (`{"0": "a", "1": "b", ...}`).
//!   If unset, a default alphabet matching the classifier's class count is
//!   generated.
//! * `ASL_LISTEN_ADDR`: socket address to serve on. Defaults to
//!   `0.0.0.0:5000`.
//! * `ASL_MIN_CONFIDENCE`: confidence threshold below which predictions are
//!   flagged as uncertain. Defaults to `0.4`.

use log::LevelFilter;

pub mod error;
pub mod feature;
pub mod labels;
pub mod landmark;
pub mod nn;
pub mod predict;
pub mod recognizer;
pub mod server;
pub mod timer;
pub mod video;

/// macro-use only, not part of public API.
#[doc(hidden)]
pub fn init_logger(calling_crate: &'static str) {
    let log_level = LevelFilter::Debug;
    env_logger::Builder::new()
        .filter(Some(calling_crate), log_level)
        .filter(Some(env!("CARGO_PKG_NAME")), log_level)
        .parse_default_env()
        .try_init()
        .ok();
}

/// Initializes logging to *stderr*.
///
/// The calling crate and this library will log at *debug* level; the
/// `RUST_LOG` environment variable can override this.
///
/// If a global logger is already registered, this macro will do nothing.
#[macro_export]
macro_rules! init_logger {
    () => {
        $crate::init_logger(env!("CARGO_CRATE_NAME"))
    };
}
