//! PDF Curator CLI tool
//!
//! A command-line tool for merging PDFs without losing their links.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::path::{Path, PathBuf};
use std::process;

use pdf_curator::config::{MergeConfig, PageBox, DEFAULT_MAX_DEPTH};
use pdf_curator::input::expand_globs;
use pdf_curator::pdf::{extract_metadata, list_links, merge_pdfs, LinkTarget, MergeOptions, PageRef};

/// PDF Curator - Merge PDFs and keep their hyperlinks working
#[derive(Parser)]
#[command(name = "pdf-curator")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Merge numbered PDFs in order
    pdf-curator merge -o handbook.pdf \"[0-9]*.pdf\"

    # Size pages by their MediaBox and keep links to the page they sit on
    pdf-curator merge -o out.pdf --page-box media --keep-self-links a.pdf b.pdf

    # Show what links a merge would pick up
    pdf-curator -v links chapter.pdf")]
struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge multiple PDF files into one, preserving links
    Merge {
        /// Input PDF files (in order). Supports glob patterns like "*.pdf"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,

        /// Page box used to size imported pages (media, crop, bleed, trim, art)
        #[arg(long, default_value_t = PageBox::CropBox, value_parser = parse_page_box)]
        page_box: PageBox,

        /// Keep links whose target is the page they are on
        #[arg(long)]
        keep_self_links: bool,

        /// Write object streams uncompressed
        #[arg(long)]
        no_compress: bool,

        /// Maximum reference depth followed while reading links
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,

        /// Open the output file after creation
        #[arg(long)]
        open: bool,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },

    /// List the links found on each page of a PDF file
    Links {
        /// PDF file to inspect
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Merge {
            inputs,
            output,
            page_box,
            keep_self_links,
            no_compress,
            max_depth,
            open,
        } => {
            let config = MergeConfig {
                page_box,
                max_depth,
                keep_self_links,
                compress: !no_compress,
            };
            cmd_merge(inputs, output, config, open)
        }
        Commands::Info { input } => cmd_info(&input),
        Commands::Links { input } => cmd_links(&input),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Warnings by default, `RUST_LOG` still wins when set
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn parse_page_box(value: &str) -> std::result::Result<PageBox, String> {
    value.parse().map_err(|e: pdf_curator::Error| e.to_string())
}

/// Open a file with the system default application
fn open_file(path: &Path) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(path).spawn()?;
    }
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(path).spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", &path.display().to_string()])
            .spawn()?;
    }
    Ok(())
}

fn cmd_merge(inputs: Vec<String>, output: PathBuf, config: MergeConfig, open: bool) -> Result<()> {
    let inputs = expand_globs(inputs.as_slice())?;

    for path in &inputs {
        if !path.exists() {
            bail!("Input file not found: {}", path.display());
        }
    }

    eprintln!("Merging {} PDF files...", inputs.len());

    let options = MergeOptions {
        input_paths: inputs,
        output_path: output.clone(),
        config,
    };
    merge_pdfs(&options).with_context(|| format!("Failed to write {}", output.display()))?;

    eprintln!("Merged to: {}", output.display());

    if open {
        open_file(&output)?;
    }

    Ok(())
}

fn cmd_info(input: &Path) -> Result<()> {
    let metadata = extract_metadata(input).with_context(|| format!("Failed to read {}", input.display()))?;

    println!("File:         {}", input.display());
    println!("Pages:        {}", metadata.page_count);
    if let Some(title) = &metadata.title {
        println!("Title:        {}", title);
    }
    if let Some(author) = &metadata.author {
        println!("Author:       {}", author);
    }
    println!("Links:        {}", metadata.link_count);
    if metadata.has_destinations {
        println!("Destinations: {}", metadata.named_destination_count);
    } else {
        println!("Destinations: none");
    }

    Ok(())
}

fn cmd_links(input: &Path) -> Result<()> {
    let pages = list_links(input, &MergeConfig::default())
        .with_context(|| format!("Failed to read {}", input.display()))?;

    if pages.is_empty() {
        println!("No links found in {}", input.display());
        return Ok(());
    }

    for page in pages {
        println!("Page {}:", page.page_number);
        for link in &page.links {
            match &link.target {
                LinkTarget::ExternalUri(uri) => println!("  {} -> {}", link.rect, uri),
                LinkTarget::ResolvedPage(PageRef::Local { page, .. } | PageRef::Global(page)) => {
                    println!("  {} -> page {}", link.rect, page)
                }
            }
        }
        for deferred in &page.deferred {
            let kind = if deferred.cross_file { "cross-file" } else { "unresolved" };
            println!("  {} -> {} destination '{}'", deferred.rect, kind, deferred.name);
        }
    }

    Ok(())
}
