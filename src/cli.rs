use clap::{Args, Parser, Subcommand};
use nb_book::OutputKind;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Where to write the configuration
    #[clap(short, long, default_value = nb_book::config::CONFIG_FILE)]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[clap(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// The .ipynb notebook to convert
    pub notebook: PathBuf,

    /// Output format, pdf or docx
    #[clap(short = 't', long, default_value = "pdf")]
    pub format: OutputKind,

    /// Output file, defaults to the notebook path with the format's extension
    #[clap(short, long)]
    pub output: Option<PathBuf>,

    /// Configuration file; defaults are used when it doesn't exist
    #[clap(short, long, env = "NB_BOOK_CONFIG", default_value = nb_book::config::CONFIG_FILE)]
    pub config: PathBuf,

    /// Render cells one at a time instead of in parallel
    #[clap(long)]
    pub sequential: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generates an nb-book.toml config file with the default settings
    Config(ConfigArgs),
    /// Renders a notebook's code cells into a PDF or DOCX document
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
#[clap(author, version, about)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}
