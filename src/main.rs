use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use textoverlay::config::EngineConfig;
use textoverlay::{BlendMode, Engine, Position, RenderedImage, StyleConfig};

/// TextOverlay - find where a caption fits on an image and draw it there
#[derive(Parser, Debug)]
#[command(name = "textoverlay")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (built-in defaults when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score all nine placements and print them as JSON
    Analyze {
        image: PathBuf,
        text: String,

        /// Also print style suggestions for the best position
        #[arg(long, default_value_t = 0)]
        suggestions: usize,
    },

    /// Render text at an explicit position
    Render {
        image: PathBuf,
        text: String,

        /// Grid position, e.g. bottom_right
        #[arg(short, long)]
        position: Position,

        /// Output file (format from extension)
        #[arg(short, long, default_value = "overlay.png")]
        output: PathBuf,

        #[command(flatten)]
        style: StyleArgs,
    },

    /// Analyze, choose position and style automatically, then render
    Run {
        image: PathBuf,
        text: String,

        /// Use this position instead of the best-ranked one
        #[arg(short, long)]
        position: Option<Position>,

        #[arg(short, long, default_value = "overlay.png")]
        output: PathBuf,
    },
}

/// Overrides on top of the configured default style
#[derive(Args, Debug)]
struct StyleArgs {
    #[arg(long)]
    font: Option<String>,

    #[arg(long)]
    size: Option<u32>,

    /// Palette name, #RRGGBB or rgb(r, g, b)
    #[arg(long)]
    color: Option<String>,

    #[arg(long)]
    opacity: Option<f32>,

    #[arg(long)]
    blend: Option<BlendMode>,

    #[arg(long)]
    no_shadow: bool,
}

impl StyleArgs {
    fn apply(&self, base: &StyleConfig) -> StyleConfig {
        let mut style = base.clone();
        if let Some(font) = &self.font {
            style.font_family = font.clone();
        }
        if let Some(size) = self.size {
            style.font_size = size;
        }
        if let Some(color) = &self.color {
            style.text_color = color.clone();
        }
        if let Some(opacity) = self.opacity {
            style.opacity = opacity;
        }
        if let Some(blend) = self.blend {
            style.blend_mode = blend;
        }
        if self.no_shadow {
            style.shadow = false;
        }
        style
    }
}

fn load_image(path: &Path) -> Result<image::DynamicImage> {
    image::open(path).with_context(|| format!("Failed to open image {}", path.display()))
}

fn save(rendered: RenderedImage, path: &Path) -> Result<()> {
    rendered
        .into_dynamic()
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => EngineConfig::default(),
    };

    textoverlay::logging::init_subscriber(&config.logging)
        .context("Failed to initialize logging subsystem")?;

    let engine = Engine::new(config).context("Invalid configuration")?;

    match cli.command {
        Command::Analyze {
            image,
            text,
            suggestions,
        } => {
            let img = load_image(&image)?;
            let analysis = engine.analyze_detailed(&img, &text, None)?;
            let mut output = serde_json::json!({
                "best": analysis.placements.best().position,
                "placements": analysis.placements,
            });
            if suggestions > 0 {
                let best = analysis.placements.best().position;
                output["suggestions"] = serde_json::to_value(analysis.suggest_styles(
                    best,
                    engine.default_style(),
                    suggestions,
                ))?;
            }
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Command::Render {
            image,
            text,
            position,
            output,
            style,
        } => {
            let img = load_image(&image)?;
            let style = style.apply(engine.default_style());
            let rendered = engine.render(&img, &text, position, &style)?;
            tracing::info!(
                output = %output.display(),
                fingerprint = %rendered.fingerprint(),
                "Render written"
            );
            save(rendered, &output)?;
        }
        Command::Run {
            image,
            text,
            position,
            output,
        } => {
            let img = load_image(&image)?;
            let result = engine.run(&img, &text, position)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "position": result.position,
                    "style": result.style,
                    "fingerprint": result.image.fingerprint(),
                }))?
            );
            save(result.image, &output)?;
        }
    }

    Ok(())
}
