//! Filament CLI - Render roster network visualizations to SVG.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser};
use filament::config::FilamentConfig;
use filament::layout::{LayoutGenerator, Viewport};
use filament::roster::{Roster, Subject};
use filament::scene::SvgScene;
use filament::view::NetworkView;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "filament")]
#[command(about = "Generate network visualizations from roster subjects")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(long, default_value = "filament.toml")]
    config: PathBuf,

    /// Roster JSON file (overrides roster.path)
    #[arg(long)]
    roster: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Render the settled network for one subject
    Render {
        #[command(flatten)]
        subject: SubjectArgs,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        size: SizeArgs,
    },

    /// Print the generated layout as JSON
    Layout {
        #[command(flatten)]
        subject: SubjectArgs,

        /// Output file path (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        size: SizeArgs,
    },

    /// Select one roster member, then another, and capture frames
    Transition {
        /// Roster index selected first
        #[arg(long, default_value = "0")]
        from: usize,

        /// Roster index selected second
        #[arg(long, default_value = "1")]
        to: usize,

        /// Frame times in milliseconds after the second selection
        #[arg(long, value_delimiter = ',', default_values_t = [0, 400, 800, 1600])]
        at: Vec<u64>,

        /// Output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        #[command(flatten)]
        size: SizeArgs,
    },

    /// Render every roster member
    Showcase {
        /// Output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        #[command(flatten)]
        size: SizeArgs,
    },
}

#[derive(Args)]
struct SubjectArgs {
    /// Roster index of the subject
    #[arg(short, long, default_value = "0")]
    index: usize,

    /// Subject id; when set, the subject is built from these flags instead
    /// of the roster
    #[arg(long)]
    id: Option<String>,

    #[arg(long, requires = "id")]
    name: Option<String>,

    #[arg(long, requires = "id")]
    since: Option<String>,

    #[arg(long, requires = "id")]
    area: Option<String>,
}

#[derive(Args)]
struct SizeArgs {
    /// Width of the output
    #[arg(long)]
    width: Option<u32>,

    /// Height of the output
    #[arg(long)]
    height: Option<u32>,
}

impl SizeArgs {
    fn resolve(&self, config: &FilamentConfig) -> (u32, u32) {
        (
            self.width.unwrap_or(config.output.width),
            self.height.unwrap_or(config.output.height),
        )
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("filament=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = FilamentConfig::load(&cli.config)?;
    let roster_path = cli
        .roster
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.roster.path));

    match cli.command {
        Commands::Render {
            subject,
            output,
            size,
        } => {
            let (width, height) = size.resolve(&config);
            let subject = resolve_subject(&subject, &roster_path)?;

            let svg = render_settled(&config, &subject, width, height);
            let output_path = output.unwrap_or_else(|| {
                PathBuf::from(&config.output.directory).join(format!("{}.svg", file_stem(&subject)))
            });
            write_output(&output_path, &svg)?;
            println!("Saved to {}", output_path.display());
        }

        Commands::Layout {
            subject,
            output,
            size,
        } => {
            let (width, height) = size.resolve(&config);
            let subject = resolve_subject(&subject, &roster_path)?;

            let generator = LayoutGenerator::new(config.layout.clone());
            let layout = generator.generate(&subject, Viewport::new(width as f64, height as f64));
            let json = serde_json::to_string_pretty(&layout)?;

            match output {
                Some(path) => {
                    write_output(&path, &json)?;
                    println!("Saved to {}", path.display());
                }
                None => println!("{}", json),
            }
        }

        Commands::Transition {
            from,
            to,
            mut at,
            output_dir,
            size,
        } => {
            let (width, height) = size.resolve(&config);
            let roster = Roster::load(&roster_path)?;
            let first = member(&roster, from)?;
            let second = member(&roster, to)?;
            let viewport = Viewport::new(width as f64, height as f64);

            let output_dir = output_dir
                .unwrap_or_else(|| PathBuf::from(&config.output.directory).join("transition"));
            fs::create_dir_all(&output_dir)
                .with_context(|| format!("failed to create {}", output_dir.display()))?;

            let mut view = NetworkView::new(
                SvgScene::new(width, height, config.render.clone()),
                config.layout.clone(),
                config.animation.clone(),
            );
            view.on_subject_selected(first, viewport);
            view.settle();

            println!("Transition {} -> {}", first.name, second.name);
            let start = view.now_ms();
            view.on_subject_selected(second, viewport);

            at.sort_unstable();
            for offset in at {
                view.advance(start + offset);
                let path = output_dir.join(format!("frame_{:05}.svg", offset));
                write_output(&path, &view.surface().to_svg())?;
                println!(
                    "  {}ms: {} points, {} edges -> {}",
                    offset,
                    view.surface().point_ids().len(),
                    view.surface().edge_ids().len(),
                    path.display()
                );
            }
        }

        Commands::Showcase { output_dir, size } => {
            let (width, height) = size.resolve(&config);
            let roster = Roster::load(&roster_path)?;
            let output_dir = output_dir
                .unwrap_or_else(|| PathBuf::from(&config.output.directory).join("showcase"));
            fs::create_dir_all(&output_dir)
                .with_context(|| format!("failed to create {}", output_dir.display()))?;

            println!("Rendering {} members...", roster.len());
            for subject in roster.members() {
                let svg = render_settled(&config, subject, width, height);
                let filename = format!("{}.svg", file_stem(subject));
                write_output(&output_dir.join(&filename), &svg)?;
                println!("  Created {}", filename);
            }

            println!("Done! Showcase saved to {}", output_dir.display());
        }
    }

    Ok(())
}

fn resolve_subject(args: &SubjectArgs, roster_path: &Path) -> Result<Subject> {
    if let Some(id) = &args.id {
        return Ok(Subject::new(
            id.clone(),
            args.name.clone().unwrap_or_default(),
            args.since.clone().unwrap_or_default(),
            args.area.clone().unwrap_or_default(),
        ));
    }

    let roster = Roster::load(roster_path)?;
    member(&roster, args.index).cloned()
}

fn member(roster: &Roster, index: usize) -> Result<&Subject> {
    match roster.get(index) {
        Some(subject) => Ok(subject),
        None => bail!(
            "roster index {} out of range ({} members)",
            index,
            roster.len()
        ),
    }
}

/// Select `subject` on a fresh scene and let every transition finish.
fn render_settled(config: &FilamentConfig, subject: &Subject, width: u32, height: u32) -> String {
    let mut view = NetworkView::new(
        SvgScene::new(width, height, config.render.clone()),
        config.layout.clone(),
        config.animation.clone(),
    );
    view.on_subject_selected(subject, Viewport::new(width as f64, height as f64));
    view.settle();
    view.surface().to_svg()
}

fn file_stem(subject: &Subject) -> String {
    let stem = subject.id.replace(|c: char| !c.is_alphanumeric(), "_");
    if stem.is_empty() {
        "subject".to_string()
    } else {
        format!("network_{}", stem)
    }
}

fn write_output(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
