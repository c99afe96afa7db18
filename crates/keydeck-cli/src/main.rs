//! keydeck Control Tool
//!
//! CLI for setting colors, images and labels on Stream Deck keys.

mod config;
mod rendering;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use image::imageops::FilterType;
use keydeck_hw::{RenderSurface, Size, StreamDeck, STREAM_DECK_ORIGINAL};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use config::Config;
use rendering::{parse_hex_color, PixmapSurface, TextRenderer};

#[derive(Parser)]
#[command(name = "keydeckctl")]
#[command(about = "Control tool for Stream Deck keys")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file (default: ~/.config/keydeck/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial number of the device to use
    #[arg(long)]
    serial: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List attached devices
    List,
    /// Set a key to a solid color
    Color {
        /// Key index (0-based)
        key: usize,
        /// Red (0-255)
        #[arg(allow_negative_numbers = true)]
        red: i32,
        /// Green (0-255)
        #[arg(allow_negative_numbers = true)]
        green: i32,
        /// Blue (0-255)
        #[arg(allow_negative_numbers = true)]
        blue: i32,
    },
    /// Clear one key or all keys to black
    Clear {
        /// Key index (0-based)
        #[arg(required_unless_present = "all")]
        key: Option<usize>,
        /// Clear every key
        #[arg(long, conflicts_with = "key")]
        all: bool,
    },
    /// Show an image file on a key
    Image {
        /// Key index (0-based)
        key: usize,
        /// Image file (PNG, JPEG, ...)
        path: PathBuf,
        /// Write the rendered key to a PNG file instead of the device
        #[arg(long)]
        preview: Option<PathBuf>,
    },
    /// Show a text label on a key
    Label {
        /// Key index (0-based)
        key: usize,
        /// Label text
        text: String,
        /// Font size in pixels (overrides config)
        #[arg(long)]
        size: Option<f32>,
        /// Text color in hex format (overrides config)
        #[arg(long)]
        color: Option<String>,
        /// Background color in hex format (overrides config)
        #[arg(long)]
        background: Option<String>,
        /// Write the rendered key to a PNG file instead of the device
        #[arg(long)]
        preview: Option<PathBuf>,
    },
    /// Set backlight brightness
    Brightness {
        /// Brightness in percent (0-100)
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        percent: u8,
    },
    /// Reset the device to its boot logo
    Reset,
    /// Print key presses until interrupted
    Watch,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match cli.config.clone().or_else(config::default_path) {
        Some(path) => Config::load_or_default(&path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };

    match cli.command {
        Commands::List => {
            let devices = StreamDeck::list().context("Failed to enumerate devices")?;
            if devices.is_empty() {
                println!("No devices found");
            }
            for device in devices {
                println!(
                    "{} (serial: {}, keys: {}, path: {})",
                    device.product.name,
                    device.serial.as_deref().unwrap_or("unknown"),
                    device.product.key_count,
                    device.path
                );
            }
        }
        Commands::Color {
            key,
            red,
            green,
            blue,
        } => {
            let deck = open_deck(cli.serial.as_deref(), &config)?;
            deck.key(key)?.set_color(red, green, blue)?;
            println!("Key {} set to ({}, {}, {})", key, red, green, blue);
        }
        Commands::Clear { key, all } => {
            let deck = open_deck(cli.serial.as_deref(), &config)?;
            if all {
                for key in deck.keys() {
                    key.clear()?;
                }
                println!("All keys cleared");
            } else if let Some(key) = key {
                deck.key(key)?.clear()?;
                println!("Key {} cleared", key);
            }
        }
        Commands::Image { key, path, preview } => {
            let image = load_image(&path)?;
            let paint = |surface: &mut PixmapSurface, size: Size| {
                let icon = image
                    .resize_exact(size.width, size.height, FilterType::Lanczos3)
                    .to_rgb8();
                surface.fill(0x000000);
                surface.draw_rgb_image(&icon);
            };
            render_key(cli.serial.as_deref(), &config, key, preview.as_deref(), paint)?;
            if preview.is_none() {
                println!("Key {} set to {}", key, path.display());
            }
        }
        Commands::Label {
            key,
            text,
            size,
            color,
            background,
            preview,
        } => {
            let label = &config.label;
            let Some(font) = label.font.as_ref() else {
                bail!("No label font configured (set [label] font in the config file)");
            };
            let renderer = TextRenderer::from_file(font)?;
            let size = size.unwrap_or(label.size);
            let color = parse_color(color.as_deref().unwrap_or(&label.color))?;
            let background = parse_color(background.as_deref().unwrap_or(&label.background))?;

            let paint = |surface: &mut PixmapSurface, _: Size| {
                surface.fill(background);
                renderer.draw_centered(surface.pixmap_mut(), &text, size, color);
            };
            render_key(cli.serial.as_deref(), &config, key, preview.as_deref(), paint)?;
            if preview.is_none() {
                println!("Key {} labelled {:?}", key, text);
            }
        }
        Commands::Brightness { percent } => {
            let deck = open_deck(cli.serial.as_deref(), &config)?;
            deck.set_brightness(percent)?;
            println!("Brightness set to {}%", percent);
        }
        Commands::Reset => {
            let deck = open_deck(cli.serial.as_deref(), &config)?;
            deck.reset()?;
            println!("Device reset");
        }
        Commands::Watch => {
            let deck = open_deck(cli.serial.as_deref(), &config)?;
            let mut previous = vec![false; deck.key_count()];
            info!("Watching {} keys", deck.key_count());
            loop {
                if !deck.poll_keys(-1)? {
                    continue;
                }
                for key in deck.keys() {
                    let pressed = key.is_pressed();
                    if pressed != previous[key.index()] {
                        println!(
                            "Key {} {}",
                            key.index(),
                            if pressed { "pressed" } else { "released" }
                        );
                        previous[key.index()] = pressed;
                    }
                }
            }
        }
    }

    Ok(())
}

/// Opens the device selected on the command line or in the config.
fn open_deck(serial: Option<&str>, config: &Config) -> Result<StreamDeck> {
    let deck = match serial.or(config.serial.as_deref()) {
        Some(serial) => StreamDeck::open_serial(serial)
            .with_context(|| format!("Failed to open device with serial {}", serial))?,
        None => StreamDeck::open().context("Failed to open device")?,
    };

    if let Some(brightness) = config.brightness {
        deck.set_brightness(brightness)?;
    }

    Ok(deck)
}

/// Decodes an image file.
fn load_image(path: &Path) -> Result<image::DynamicImage> {
    let image = image::open(path)
        .with_context(|| format!("Failed to open image {}", path.display()))?;
    debug!(
        "Loaded {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );
    Ok(image)
}

/// Paints a key image onto the device, or into a PNG file when `preview` is set.
fn render_key<F>(
    serial: Option<&str>,
    config: &Config,
    key: usize,
    preview: Option<&Path>,
    paint: F,
) -> Result<()>
where
    F: FnOnce(&mut PixmapSurface, Size),
{
    match preview {
        Some(output) => write_preview(output, STREAM_DECK_ORIGINAL.icon_size, paint),
        None => {
            let deck = open_deck(serial, config)?;
            deck.key(key)?.set_image(paint)?;
            Ok(())
        }
    }
}

fn parse_color(hex: &str) -> Result<u32> {
    parse_hex_color(hex).with_context(|| format!("Invalid color: {}", hex))
}

/// Renders a key icon off-device and saves it as PNG.
fn write_preview<F>(output: &Path, icon_size: u32, paint: F) -> Result<()>
where
    F: FnOnce(&mut PixmapSurface, Size),
{
    let Some(mut surface) = PixmapSurface::allocate(icon_size, icon_size) else {
        bail!("Could not allocate a {}x{} preview surface", icon_size, icon_size);
    };
    paint(&mut surface, Size::square(icon_size));

    let png = surface.to_png()?;
    std::fs::write(output, png)
        .with_context(|| format!("Failed to write preview {}", output.display()))?;
    println!("Preview written to {}", output.display());
    Ok(())
}
