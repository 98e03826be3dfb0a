//! Command-line front end: renders one bio card to a PNG file or prints it as
//! a data URI.

use biocard::{BioCard, CardInput, Color, ImageSlot, download_file_name, resolve_slot};
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "biocard", version, about = "Render a bio card to PNG")]
struct Cli {
    /// Recruit name (drawn upper-cased)
    #[arg(long)]
    name: String,

    /// Role or rank line
    #[arg(long, default_value = "")]
    role: String,

    /// Biography text file; blank lines separate paragraphs
    #[arg(long, value_name = "FILE")]
    bio_file: Option<PathBuf>,

    /// Date label, e.g. "june 3 , 2025"
    #[arg(long, default_value = "")]
    date: String,

    /// Optional centered footer
    #[arg(long)]
    footer: Option<String>,

    /// Text color as #RRGGBB
    #[arg(long, value_name = "HEX")]
    text_color: Option<String>,

    /// Portrait image path or data URI
    #[arg(long, value_name = "SRC")]
    photo: Option<String>,

    /// Logo image path or data URI (defaults to the built-in badge)
    #[arg(long, value_name = "SRC", conflicts_with = "no_logo")]
    logo: Option<String>,

    /// Render without a logo and without the text exclusion zone
    #[arg(long, action = ArgAction::SetTrue)]
    no_logo: bool,

    /// Background image path or data URI
    #[arg(long, value_name = "SRC")]
    background: Option<String>,

    /// Additional font directories to load (repeatable)
    #[arg(long = "font-dir", value_name = "DIR")]
    font_dir: Vec<PathBuf>,

    /// Skip system font fallbacks
    #[arg(long, action = ArgAction::SetTrue)]
    no_system_fonts: bool,

    /// Output PNG path (defaults to the suggested download name)
    #[arg(long, value_name = "FILE", conflicts_with = "data_uri")]
    out: Option<PathBuf>,

    /// Print a data:image/png;base64 URI instead of writing a file
    #[arg(long, action = ArgAction::SetTrue)]
    data_uri: bool,

    /// JSONL layout trace
    #[arg(long, value_name = "FILE")]
    debug_log: Option<PathBuf>,

    /// JSONL timing log
    #[arg(long, value_name = "FILE")]
    perf_log: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("biocard: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut builder = BioCard::builder().system_fonts(!cli.no_system_fonts);
    for dir in &cli.font_dir {
        builder = builder.register_font_dir(dir);
    }
    if let Some(path) = &cli.debug_log {
        builder = builder.debug_log(path);
    }
    if let Some(path) = &cli.perf_log {
        builder = builder.perf_log(path);
    }
    let card = builder.build()?;

    let biography = match &cli.bio_file {
        Some(path) => std::fs::read_to_string(path)?,
        None => String::new(),
    };
    let mut input = CardInput::new(cli.name.as_str(), cli.role.as_str(), biography, cli.date.as_str());
    if let Some(footer) = &cli.footer {
        input = input.with_footer(footer.as_str());
    }
    if let Some(raw) = &cli.text_color {
        let color = Color::from_hex(raw).ok_or_else(|| format!("invalid text color '{raw}'"))?;
        input = input.with_text_color(color);
    }
    input.portrait = resolve_slot(ImageSlot::Portrait, cli.photo.as_deref());
    input.background = resolve_slot(ImageSlot::Background, cli.background.as_deref());
    if !cli.no_logo {
        input.logo = resolve_slot(ImageSlot::Logo, cli.logo.as_deref());
    }

    if cli.data_uri {
        println!("{}", card.render_data_uri(&input)?);
        return Ok(());
    }
    let out = cli
        .out
        .unwrap_or_else(|| PathBuf::from(download_file_name(&cli.name)));
    let bytes = card.render_to_file(&input, &out)?;
    eprintln!("wrote {} ({bytes} bytes)", out.display());
    Ok(())
}
