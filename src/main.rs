//! letterforge – command-line HR letter generator.
//!
//! Reads a JSON generation request and writes the letter as PDF. If the
//! output path is omitted the PDF is written next to the request with the
//! same stem (e.g. `offer.json` → `offer.pdf`).

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use hr_letter_forge::layout_config::LayoutConfig;
use hr_letter_forge::pipeline::{generate_pdf, GenerationRequest};
use hr_letter_forge::{templates, Error};

#[derive(Parser)]
#[command(name = "letterforge", about = "Render HR letter templates to PDF")]
struct Args {
    /// Generation request (JSON)
    #[arg(required_unless_present_any = ["sample", "list_samples"])]
    input: Option<PathBuf>,
    /// Output PDF file (defaults to input with .pdf extension)
    output: Option<PathBuf>,
    /// Layout configuration (JSON); missing fields take A4 defaults
    #[arg(long)]
    config: Option<PathBuf>,
    /// Also write the laid-out page model as JSON
    #[arg(long)]
    layout_json: Option<PathBuf>,
    /// Only classify the template variables; exit 2 if any is unknown
    #[arg(long)]
    check: bool,
    /// Use a bundled sample body instead of the request's
    #[arg(long)]
    sample: Option<String>,
    /// List the bundled samples and exit
    #[arg(long)]
    list_samples: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if args.list_samples {
        for sample in templates::samples() {
            println!("{:<12} {}", sample.name, sample.description);
        }
        return;
    }

    if let Err(e) = run(&args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Error> {
    let mut request = match &args.input {
        Some(path) => GenerationRequest::from_json(&fs::read_to_string(path)?)?,
        None => GenerationRequest::default(),
    };

    if let Some(name) = &args.sample {
        let Some(sample) = templates::find(name) else {
            eprintln!("Error: unknown sample '{name}' (see --list-samples)");
            process::exit(1);
        };
        request.body = sample.body.to_string();
        request
            .custom_names
            .extend(sample.custom_names.iter().map(|n| n.to_string()));
        if request.subject.is_empty() {
            request.subject = sample.description.to_string();
        }
    }

    if args.check {
        let classification = request.check();
        println!("{}", serde_json::to_string_pretty(&classification)?);
        if !classification.is_resolved() {
            process::exit(2);
        }
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => LayoutConfig::from_json(&fs::read_to_string(path)?)?,
        None => LayoutConfig::a4(),
    };

    let output = args.output.clone().unwrap_or_else(|| match (&args.input, &args.sample) {
        (Some(input), _) => input.with_extension("pdf"),
        (None, Some(name)) => PathBuf::from(format!("{name}.pdf")),
        (None, None) => PathBuf::from("letter.pdf"),
    });

    let (bytes, doc) = generate_pdf(&request, &config)?;
    write_file(&output, &bytes)?;
    if let Some(path) = &args.layout_json {
        write_file(path, doc.to_json().as_bytes())?;
    }

    for w in &doc.warnings {
        eprintln!("Warning (page {}): {}", w.page, w.message);
    }
    let pages = doc.page_count();
    eprintln!(
        "Wrote '{}' ({} bytes, {} page{})",
        output.display(),
        bytes.len(),
        pages,
        if pages == 1 { "" } else { "s" }
    );
    Ok(())
}

/// Write `bytes`, creating the parent directory if necessary.
fn write_file(path: &Path, bytes: &[u8]) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, bytes)?;
    Ok(())
}
