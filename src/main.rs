use anyhow::{anyhow, Context, Result};
use cli::{Cli, ConfigArgs, RenderArgs};
use indicatif::{ProgressBar, ProgressStyle};
use nb_book::{fonts, Configuration, ConvertOptions, Notebook};
use std::process::ExitCode;

mod cli;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = try_main() {
        eprintln!("{}: {e:#}", console::style("Error").red());
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn try_main() -> Result<()> {
    use clap::Parser;
    let cli = Cli::parse();

    match &cli.command {
        cli::Commands::Config(args) => write_config(args),
        cli::Commands::Render(args) => render(args),
    }
}

fn write_config(args: &ConfigArgs) -> Result<()> {
    if args.output.exists() && !args.force {
        return Err(anyhow!(
            "{} already exists, pass --force to overwrite it",
            args.output.display()
        ));
    }
    Configuration::default().save(&args.output)?;
    println!("{} written!", args.output.display());
    Ok(())
}

fn render(args: &RenderArgs) -> Result<()> {
    println!("Loading configuration...");
    let config = Configuration::load(&args.config)?;

    let contents = std::fs::read(&args.notebook)
        .with_context(|| format!("Failed to read {}", args.notebook.display()))?;
    let notebook = Notebook::from_slice(&contents)
        .with_context(|| format!("Failed to parse {}", args.notebook.display()))?;

    let face = fonts::resolve(&config.fonts, &config.theme.font_family)
        .with_context(|| format!("Failed to load font `{}`", config.theme.font_family))?;
    if face.is_fallback() {
        println!(
            "{}: font `{}` not found, using the built-in placeholder face",
            console::style("Warning").yellow(),
            config.theme.font_family
        );
    }

    let progress = ProgressBar::new(notebook.cells.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("can parse progress style")
            .progress_chars("#>-"),
    );
    progress.set_message(format!("Rendering {}...", args.format));

    let options = ConvertOptions {
        parallel: config.parallel && !args.sequential,
        cancel: None,
        progress: Some(progress.clone()),
    };
    let assembled = nb_book::convert(&notebook, args.format, &config, &face, &options)
        .with_context(|| format!("Failed to render {}", args.format))?;
    progress.finish_and_clear();

    let outfile = args
        .output
        .clone()
        .unwrap_or_else(|| args.notebook.with_extension(args.format.extension()));
    std::fs::write(&outfile, &assembled.bytes)
        .with_context(|| format!("Failed to write {}", outfile.display()))?;

    let size = byte_unit::Byte::from_u128(assembled.bytes.len() as u128)
        .map(|b| b.get_appropriate_unit(byte_unit::UnitType::Binary).to_string())
        .unwrap_or_else(|| format!("{} B", assembled.bytes.len()));
    let stats = &assembled.stats;

    println!();
    println!("  Output:      {} ({size})", outfile.display());
    println!("  Code images: {}", stats.images);
    if stats.text_blocks > 0 {
        println!("  Text blocks: {}", stats.text_blocks);
    }
    if let Some(pages) = stats.pages {
        println!("  Pages:       {pages}");
    }
    println!("  Skipped:     {}", stats.skipped);
    if stats.failed > 0 {
        println!(
            "  {}      {} (see log output)",
            console::style("Failed:").red(),
            stats.failed
        );
    }

    Ok(())
}
