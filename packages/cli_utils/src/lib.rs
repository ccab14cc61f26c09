#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Terminal rendering for the tractmap binaries.
//!
//! Bridges the [`ProgressCallback`] trait onto `indicatif` bars and wires
//! the global logger through `indicatif-log-bridge`, so a build can log
//! while a bar is redrawing without tearing the terminal.

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tractmap_overlap::progress::ProgressCallback;

pub use indicatif::MultiProgress;

/// Renders [`ProgressCallback`] updates as an `indicatif` bar.
pub struct TerminalProgress {
    bar: ProgressBar,
    /// Style adopted when a total arrives; `None` keeps the spinner.
    counted_style: Option<ProgressStyle>,
}

impl TerminalProgress {
    /// Progress for work whose size arrives mid-flight, like the overlap
    /// build announcing its visit count. Spins until
    /// [`ProgressCallback::set_total()`] fires, then shows a counted bar
    /// with an ETA.
    #[must_use]
    pub fn counted(multi: &MultiProgress, message: &str) -> Arc<dyn ProgressCallback> {
        let bar = Self::add_spinner(multi, message, "{spinner:.cyan} {msg}");
        let counted_style = ProgressStyle::with_template(
            "{msg} {wide_bar:.cyan/dim} {human_pos}/{human_len} [{eta}]",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
        Arc::new(Self {
            bar,
            counted_style: Some(counted_style),
        })
    }

    /// Plain spinner for work with no usable row count, like reading an
    /// export file. Ignores any announced total.
    #[must_use]
    pub fn spinner(multi: &MultiProgress, message: &str) -> Arc<dyn ProgressCallback> {
        let bar = Self::add_spinner(multi, message, "{spinner:.green} {msg}");
        Arc::new(Self {
            bar,
            counted_style: None,
        })
    }

    fn add_spinner(multi: &MultiProgress, message: &str, template: &str) -> ProgressBar {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_style(
            ProgressStyle::with_template(template)
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_string());
        bar
    }
}

impl ProgressCallback for TerminalProgress {
    fn set_total(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
        if let Some(style) = &self.counted_style {
            self.bar.set_style(style.clone());
        }
    }

    fn set_position(&self, pos: u64) {
        self.bar.set_position(pos);
    }

    fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }

    fn set_message(&self, msg: String) {
        self.bar.set_message(msg);
    }

    fn finish(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }

    fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

/// Installs the global logger behind `indicatif-log-bridge` and hands back
/// the [`MultiProgress`] every bar must attach to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    // The bridge wants an unregistered logger, so the builder is assembled
    // by hand instead of going through init().
    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    // A second init (tests spawning the CLI twice) fails harmlessly.
    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok();

    log::set_max_level(level);

    multi
}
