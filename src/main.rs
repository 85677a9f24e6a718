//! epubseed - EPUB to JSON seed converter

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use epubseed::export::{self, CompatOptions, OutputOptions};
use epubseed::{AssetStore, ConvertOptions, Converter, Error, ExtractMode, Result};

#[derive(Parser)]
#[command(name = "epubseed")]
#[command(version, about = "Convert EPUB books into JSON seed records", long_about = None)]
#[command(after_help = "EXAMPLES:
    epubseed convert --epub book.epub --out data/book --book-id demo --jsonl --compat
    epubseed cover --epub book.epub --out seed/demo-cover.jpg
    epubseed seed --dir data/book --out seed --suffix demo")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log skipped items and unresolved references
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress output messages
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Convert an EPUB into books.json and book_chapters.json
    Convert(ConvertArgs),
    /// Extract the cover image
    Cover {
        #[arg(long, value_name = "PATH")]
        epub: PathBuf,
        /// Destination file
        #[arg(long, value_name = "PATH")]
        out: PathBuf,
    },
    /// Convert books.json / book_chapters.json in DIR to JSONL
    Jsonl {
        #[arg(long, value_name = "DIR")]
        dir: PathBuf,
    },
    /// Write ASCII-safe *.compat.jsonl files from the JSONL files in DIR
    Compat {
        #[arg(long, value_name = "DIR")]
        dir: PathBuf,
    },
    /// Fold the compat JSONL files in DIR into seed JSON arrays
    Seed {
        #[arg(long, value_name = "DIR")]
        dir: PathBuf,
        #[arg(long, value_name = "DIR")]
        out: PathBuf,
        /// Written as books.<SUFFIX>.json and book_chapters.<SUFFIX>.json
        #[arg(long, value_name = "NAME", default_value = "seed")]
        suffix: String,
    },
}

#[derive(Args)]
struct ConvertArgs {
    /// Input EPUB file
    #[arg(long, value_name = "PATH")]
    epub: PathBuf,

    /// Output directory for the record files and the cover
    #[arg(long, value_name = "DIR")]
    out: PathBuf,

    #[arg(long, value_name = "ID", default_value = "book")]
    book_id: String,

    /// Also copy the cover image to this path
    #[arg(long, value_name = "PATH")]
    seed_cover_out: Option<PathBuf>,

    /// Images are written under DIR/<book-id>/
    #[arg(long, value_name = "DIR", default_value = "seed/assets")]
    seed_assets_dir: PathBuf,

    /// Extraction strategy: blocks or lines
    #[arg(long, value_name = "MODE", default_value = "blocks")]
    mode: ExtractMode,

    /// Also write books.jsonl and book_chapters.jsonl
    #[arg(long)]
    jsonl: bool,

    /// Also write the *.compat.jsonl variants
    #[arg(long)]
    compat: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = match cli.command {
        Command::Convert(args) => convert(&args, cli.quiet),
        Command::Cover { epub, out } => cover(&epub, &out, cli.quiet),
        Command::Jsonl { dir } => report(export::json_to_jsonl(&dir), cli.quiet),
        Command::Compat { dir } => report(export::compat_dir(&dir, &CompatOptions::default()), cli.quiet),
        Command::Seed { dir, out, suffix } => report(export::seed_dir(&dir, &out, &suffix), cli.quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn convert(args: &ConvertArgs, quiet: bool) -> Result<()> {
    // Parse the package before touching the filesystem.
    let mut converter = Converter::open(&args.epub)?;
    let mut assets = AssetStore::recreate(args.seed_assets_dir.join(&args.book_id))?;

    let options = ConvertOptions::new(&args.book_id).with_mode(args.mode);
    let conversion = converter.convert(&options, &mut assets)?;

    let output = OutputOptions::default()
        .with_jsonl(args.jsonl)
        .with_compat(args.compat);
    let written = export::write_conversion(&args.out, &conversion, &output)?;

    let cover_path = match &conversion.cover {
        Some(cover) => Some(export::write_cover(&args.out, &args.book_id, cover)?),
        None => None,
    };
    let seed_cover = match (&cover_path, &args.seed_cover_out) {
        (Some(from), Some(to)) => {
            export::copy_file(from, to)?;
            Some(to)
        }
        _ => None,
    };

    if !quiet {
        println!("OK: {}", conversion.book.title);
        println!("chapters: {}", conversion.chapters.len());
        println!("assets: {}", conversion.asset_count);
        match cover_path.as_deref().and_then(Path::file_name) {
            Some(name) => println!("cover: {}", name.to_string_lossy()),
            None => println!("cover: not found"),
        }
        if let Some(path) = seed_cover {
            println!("seed_cover: {}", path.display());
        }
        println!("seed_assets_dir: {}", assets.root().display());
        for path in written {
            println!("wrote: {}", path.display());
        }
    }

    Ok(())
}

fn cover(epub: &Path, out: &Path, quiet: bool) -> Result<()> {
    let mut converter = Converter::open(epub)?;
    let cover = converter.find_cover()?.ok_or(Error::CoverNotFound)?;
    if let Some(parent) = out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(out, &cover.data)?;

    if !quiet {
        println!("cover extracted: {} ({} bytes)", out.display(), cover.data.len());
    }
    Ok(())
}

fn report(result: Result<Vec<PathBuf>>, quiet: bool) -> Result<()> {
    for path in result? {
        if !quiet {
            println!("wrote: {}", path.display());
        }
    }
    Ok(())
}
