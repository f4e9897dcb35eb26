#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared CLI utilities for the malaria forecast toolchain.
//!
//! Provides [`init_logger`], which sets up `indicatif-log-bridge` so that
//! `log::info!` and friends are suspended while spinners redraw, a
//! [`spinner`] for slow steps (file parsing, model fitting), and bounded
//! numeric prompts for the interactive mode.

use std::time::Duration;

use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};

pub use indicatif::MultiProgress;

/// Adds a spinner with `message` to `multi`. Call
/// [`ProgressBar::finish_with_message`] or
/// [`ProgressBar::finish_and_clear`] when the step completes.
#[must_use]
pub fn spinner(multi: &MultiProgress, message: &str) -> ProgressBar {
    let bar = multi.add(ProgressBar::new_spinner());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.to_string());
    bar
}

/// Parses `input` as an integer in `min..=max`.
///
/// # Errors
///
/// Returns a message suitable for re-prompting if `input` is not a whole
/// number or is out of range.
pub fn parse_bounded(input: &str, min: usize, max: usize) -> Result<usize, String> {
    let value: usize = input
        .trim()
        .parse()
        .map_err(|_| format!("Enter a whole number between {min} and {max}"))?;
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is out of range ({min}-{max})"))
    }
}

/// Prompts for an integer in `min..=max`, re-asking until the answer is
/// valid.
///
/// # Errors
///
/// Returns [`dialoguer::Error`] if the terminal cannot be read.
pub fn prompt_bounded(
    prompt: &str,
    default: usize,
    min: usize,
    max: usize,
) -> Result<usize, dialoguer::Error> {
    let text: String = Input::new()
        .with_prompt(format!("{prompt} ({min}-{max})"))
        .default(default.to_string())
        .validate_with(move |input: &String| parse_bounded(input, min, max).map(|_| ()))
        .interact_text()?;
    Ok(parse_bounded(&text, min, max).unwrap_or(default))
}

/// Initializes the global logger wrapped in `indicatif-log-bridge` so that
/// `log::info!` and friends are suspended while spinners redraw.
///
/// Returns the [`MultiProgress`] that all spinners must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok(); // Already set in tests

    log::set_max_level(level);

    multi
}
