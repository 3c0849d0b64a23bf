// Copyright (c) 2023 the Hearth contributors.
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

use anyhow::ensure;
use clap::ValueEnum;
use gfxfont::range::{CodepointRange, DEFAULT_RANGE, MAX_CODEPOINT};
use gfxfont::raster::DEFAULT_DPI;
use gfxfont::RenderMode;
use serde::Deserialize;
use tracing::{debug, info};

/// Dithering used for grayscale rendering.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Dither {
    #[default]
    Random,
    FloydSteinberg,
}

impl Dither {
    pub fn render_mode(self) -> RenderMode {
        match self {
            Dither::Random => RenderMode::Dither,
            Dither::FloydSteinberg => RenderMode::Diffuse,
        }
    }
}

/// Defaults for options that aren't given on the command line.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Point size.
    pub size: u32,
    pub dpi: u32,
    pub bytes_per_line: usize,
    pub seed: u64,
    pub dither: Dither,
    /// Range used when no ranges are given.
    pub default_first: u32,
    pub default_last: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            size: 12,
            dpi: DEFAULT_DPI,
            bytes_per_line: 12,
            seed: 0,
            dither: Dither::Random,
            default_first: DEFAULT_RANGE.first,
            default_last: DEFAULT_RANGE.last,
        }
    }
}

impl Config {
    pub fn default_range(&self) -> CodepointRange {
        CodepointRange::new(self.default_first, self.default_last)
    }

    fn validate(self) -> anyhow::Result<Self> {
        ensure!(self.size > 0, "size must be positive");
        ensure!(self.dpi > 0, "dpi must be positive");
        ensure!(self.bytes_per_line > 0, "bytes_per_line must be positive");
        ensure!(
            self.default_first <= MAX_CODEPOINT && self.default_last <= MAX_CODEPOINT,
            "default range 0x{:x} - 0x{:x} is beyond 0x{:x}",
            self.default_first,
            self.default_last,
            MAX_CODEPOINT
        );
        Ok(self)
    }
}

/// Gets the default path of the configuration file, if the platform has one.
pub fn get_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("rs", "gfxfont", "fontconvert")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Loads a configuration file from the given path.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    info!("Loading configuration file from {:?}", path);
    let config = std::fs::read_to_string(path)
        .map_err(|err| anyhow::anyhow!("Failed to load config file at {:?}: {:?}", path, err))?;
    parse_config(&config)
}

pub fn parse_config(text: &str) -> anyhow::Result<Config> {
    toml::from_str::<Config>(text)
        .map_err(|err| anyhow::anyhow!("Failed to deserialize config: {}", err))?
        .validate()
}

/// Loads the explicitly given file, else the default file if there is one.
pub fn resolve(explicit: Option<&Path>) -> anyhow::Result<Config> {
    if let Some(path) = explicit {
        return load_config(path);
    }

    match get_config_path() {
        Some(path) if path.exists() => load_config(&path),
        _ => {
            debug!("No configuration file; using defaults");
            Ok(Config::default())
        }
    }
}
