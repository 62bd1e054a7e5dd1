use std::env;
use std::sync::Arc;

use anyhow::Context;
use handshape::recognizer::{Recognizer, RecognizerConfig, DEFAULT_MIN_CONFIDENCE};
use handshape::server::Server;

fn main() -> anyhow::Result<()> {
    handshape::init_logger!();

    let config = RecognizerConfig {
        model_right: required_var("ASL_MODEL_RIGHT")?.into(),
        model_left: required_var("ASL_MODEL_LEFT")?.into(),
        labels: var("ASL_LABELS").map(Into::into),
        min_confidence: match var("ASL_MIN_CONFIDENCE") {
            Some(value) => value
                .parse()
                .context("`ASL_MIN_CONFIDENCE` must be a number")?,
            None => DEFAULT_MIN_CONFIDENCE,
        },
    };

    let recognizer = Arc::new(Recognizer::load(&config)?);
    log::info!(
        "labels: {}",
        recognizer.labels().as_slice().join(", "),
    );

    let addr = var("ASL_LISTEN_ADDR").unwrap_or_else(|| "0.0.0.0:5000".into());
    Server::bind(&*addr, recognizer)?.run()
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

fn required_var(name: &str) -> anyhow::Result<String> {
    var(name).with_context(|| format!("`{name}` must be set to a classifier path"))
}
