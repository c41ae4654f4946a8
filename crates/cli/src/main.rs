//! CLI tool for converting presentations to structured Markdown.

use anyhow::{bail, Context, Result};
use clap::Parser;
use deckmark_core::{Conversion, ConvertOptions, DocumentAssembler, Presentation};
use deckmark_pptx::PptxParser;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

/// Convert presentations (.pptx, or a JSON shape tree) to Markdown.
#[derive(Parser, Debug)]
#[command(name = "deckmark")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input file(s): .pptx or .json
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Output directory (default: same as input file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print output to stdout instead of writing to file
    #[arg(short, long)]
    print: bool,

    /// Omit speaker notes blocks
    #[arg(long)]
    no_notes: bool,

    /// Convert slides one at a time instead of in parallel
    #[arg(long)]
    sequential: bool,

    /// Text boxes anchored above this y (points) are title candidates
    #[arg(long, default_value_t = deckmark_core::options::DEFAULT_TITLE_MAX_Y)]
    title_max_y: f64,

    /// Text boxes whose first run exceeds this size (points) are title candidates
    #[arg(long, default_value_t = deckmark_core::options::DEFAULT_TITLE_MIN_FONT_SIZE)]
    title_font_size: f64,

    /// Maximum group nesting before a slide is reported as unreadable
    #[arg(long, default_value_t = deckmark_core::options::DEFAULT_MAX_GROUP_DEPTH)]
    max_depth: usize,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Input formats the CLI understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputFormat {
    /// Office Open XML package.
    Pptx,
    /// A serialized `Presentation`.
    Json,
}

impl InputFormat {
    /// Detect format from file magic bytes, then extension.
    fn detect(magic: &[u8], path: &Path) -> Result<Self> {
        // PPTX is a ZIP file (PK\x03\x04)
        if magic.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
            return Ok(Self::Pptx);
        }

        // Legacy PPT is an OLE/CFB file (D0 CF 11 E0 A1 B1 1A E1)
        if magic.starts_with(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1]) {
            bail!("legacy .ppt files are not supported; save as .pptx first");
        }

        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref()
        {
            Some("json") => Ok(Self::Json),
            // Damaged packages still get the failure document.
            Some("pptx") => Ok(Self::Pptx),
            _ => bail!("Could not detect file format"),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let failed = run(&args);
    if failed > 0 {
        bail!("{} of {} files could not be converted", failed, args.input.len());
    }

    Ok(())
}

/// Convert every input, reporting per-file errors and carrying on.
///
/// Returns the number of inputs that failed.
fn run(args: &Args) -> usize {
    let options = ConvertOptions::new()
        .with_title_max_y(args.title_max_y)
        .with_title_min_font_size(args.title_font_size)
        .with_max_group_depth(args.max_depth)
        .with_notes(!args.no_notes)
        .with_parallel(!args.sequential);
    let converter = Converter {
        parser: PptxParser::new().with_max_group_depth(args.max_depth),
        assembler: DocumentAssembler::new(&options),
    };

    let mut failed = 0;
    for input_path in &args.input {
        if args.verbose {
            eprintln!("Processing: {}", input_path.display());
        }

        if let Err(e) = convert_file(input_path, args, &converter) {
            eprintln!("Error processing {}: {:#}", input_path.display(), e);
            failed += 1;
        }
    }

    failed
}

/// Decoder and assembler configured from the command line.
struct Converter {
    parser: PptxParser,
    assembler: DocumentAssembler,
}

/// Convert one input and print it or write it next to the input.
fn convert_file(input_path: &Path, args: &Args, converter: &Converter) -> Result<()> {
    let conversion = process_file(input_path, converter)?;
    if args.verbose {
        report(&conversion);
    }

    if args.print {
        println!("{}", conversion.markdown);
    } else {
        let output_path = get_output_path(input_path, args.output.as_ref())?;
        write_output(&output_path, &conversion.markdown)?;
        if args.verbose {
            eprintln!("Written to: {}", output_path.display());
        }
    }

    Ok(())
}

/// Convert a single file.
///
/// I/O problems are errors; an unreadable container is not, it yields the
/// failure document like any other conversion.
fn process_file(input_path: &Path, converter: &Converter) -> Result<Conversion> {
    let file = File::open(input_path)
        .with_context(|| format!("Failed to open {}", input_path.display()))?;
    let mut reader = BufReader::new(file);

    let mut magic = Vec::with_capacity(8);
    reader
        .by_ref()
        .take(8)
        .read_to_end(&mut magic)
        .with_context(|| "Failed to read file header")?;

    // Re-open file for parsing; the header read consumed the start
    let file = File::open(input_path)?;
    let reader = BufReader::new(file);

    let assembler = &converter.assembler;
    let conversion = match InputFormat::detect(&magic, input_path)? {
        InputFormat::Pptx => {
            log::debug!("Parsing as PPTX");
            let decoded = converter.parser.parse(reader);
            assembler.convert_decoded(decoded.map(|document| document.slides))
        }
        InputFormat::Json => {
            log::debug!("Parsing as JSON shape tree");
            let decoded: std::result::Result<Presentation, _> = serde_json::from_reader(reader);
            assembler.convert_decoded(decoded.map(|presentation| presentation.slides))
        }
    };

    Ok(conversion)
}

fn report(conversion: &Conversion) {
    if let Some(error) = &conversion.document_error {
        eprintln!("  Could not read document: {}", error);
        return;
    }

    eprintln!("  Found {} slides", conversion.slide_count);
    if !conversion.failed_slides.is_empty() {
        let numbers: Vec<String> = conversion
            .failed_slides
            .iter()
            .map(|n| n.to_string())
            .collect();
        eprintln!("  Unreadable slides: {}", numbers.join(", "));
    }
}

/// Determine the output path for a processed file.
fn get_output_path(input_path: &Path, output_dir: Option<&PathBuf>) -> Result<PathBuf> {
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");

    let output_filename = format!("{}.md", stem);

    let output_path = match output_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
            dir.join(output_filename)
        }
        None => {
            if let Some(parent) = input_path.parent() {
                parent.join(output_filename)
            } else {
                PathBuf::from(output_filename)
            }
        }
    };

    Ok(output_path)
}

/// Write output to a file.
fn write_output(path: &Path, content: &str) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write to {}", path.display()))?;
    file.write_all(b"\n")
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}
