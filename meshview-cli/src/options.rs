//! Command line arguments and their mapping onto viewer options

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use meshview_io::{CompressionKind, ModelFormat, ModelSource};
use meshview_viewer::ViewerOptions;
use tracing::info;

/// Where the model comes from and how to read it
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Model file (stl, obj, ply; optionally .gz/.zlib compressed)
    pub file: PathBuf,

    /// Override format detection (stl, obj, ply, gltf, 3mf, ...)
    #[arg(long, value_parser = parse_format)]
    pub format: Option<ModelFormat>,

    /// Override compression detection
    #[arg(long, value_enum)]
    pub compression: Option<CompressionArg>,
}

impl SourceArgs {
    pub fn model_source(&self) -> ModelSource {
        let mut source = ModelSource::from_path(self.file.clone());
        if let Some(format) = self.format {
            source = source.with_format(format);
        }
        if let Some(compression) = self.compression {
            source = source.with_compression(compression.into());
        }
        source
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionArg {
    None,
    Zlib,
    Gzip,
}

impl From<CompressionArg> for CompressionKind {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::None => CompressionKind::None,
            CompressionArg::Zlib => CompressionKind::Zlib,
            CompressionArg::Gzip => CompressionKind::Gzip,
        }
    }
}

/// Window and scene settings for `meshview view`
#[derive(Args, Debug, Clone, Default)]
pub struct DisplayArgs {
    /// TOML file with viewer options
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub width: Option<u32>,

    #[arg(long)]
    pub height: Option<u32>,

    /// Background color as RRGGBB hex
    #[arg(long, value_parser = parse_hex_color)]
    pub background: Option<u32>,

    /// Model color as RRGGBB hex
    #[arg(long, value_parser = parse_hex_color)]
    pub model_color: Option<u32>,

    #[arg(long, allow_hyphen_values = true)]
    pub camera_x: Option<f32>,

    #[arg(long, allow_hyphen_values = true)]
    pub camera_y: Option<f32>,

    #[arg(long, allow_hyphen_values = true)]
    pub camera_z: Option<f32>,

    /// Start with the wireframe layer on
    #[arg(long)]
    pub wireframe: bool,

    /// Start with the measurement overlay on
    #[arg(long)]
    pub measurements: bool,

    /// Start with the info panel on
    #[arg(long)]
    pub info_panel: bool,

    /// Start with the shaded layer off
    #[arg(long)]
    pub no_shaded: bool,

    /// Start with the ground plane off
    #[arg(long)]
    pub no_ground: bool,
}

impl DisplayArgs {
    /// Options from the config file (if any) with flags applied on top
    pub fn viewer_options(&self) -> Result<ViewerOptions> {
        let mut options = match &self.config {
            Some(path) => load_options(path)?,
            None => ViewerOptions::default(),
        };
        self.apply(&mut options);
        Ok(options)
    }

    fn apply(&self, options: &mut ViewerOptions) {
        if let Some(width) = self.width {
            options.width = width;
        }
        if let Some(height) = self.height {
            options.height = height;
        }
        if let Some(color) = self.background {
            options.background_color = color;
        }
        if let Some(color) = self.model_color {
            options.model_color = color;
        }
        options.camera_x = self.camera_x.or(options.camera_x);
        options.camera_y = self.camera_y.or(options.camera_y);
        options.camera_z = self.camera_z.or(options.camera_z);

        options.wireframe |= self.wireframe;
        options.measurement_overlay |= self.measurements;
        options.info_panel |= self.info_panel;
        if self.no_shaded {
            options.shaded = false;
        }
        if self.no_ground {
            options.ground_plane = false;
        }
    }
}

/// Read viewer options from a TOML file
pub fn load_options(path: &Path) -> Result<ViewerOptions> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let options: ViewerOptions =
        toml::from_str(&content).with_context(|| format!("invalid config {}", path.display()))?;
    info!(path = %path.display(), "loaded viewer options");
    Ok(options)
}

fn parse_format(value: &str) -> std::result::Result<ModelFormat, String> {
    match ModelFormat::from_extension(value.trim_start_matches('.')) {
        ModelFormat::Unknown if !value.eq_ignore_ascii_case("unknown") => {
            Err(format!("unknown model format '{}'", value))
        }
        format => Ok(format),
    }
}

fn parse_hex_color(value: &str) -> std::result::Result<u32, String> {
    let digits = value
        .trim_start_matches('#')
        .trim_start_matches("0x")
        .trim_start_matches("0X");
    if digits.len() != 6 {
        return Err(format!("expected RRGGBB, got '{}'", value));
    }
    u32::from_str_radix(digits, 16).map_err(|e| format!("invalid color '{}': {}", value, e))
}
