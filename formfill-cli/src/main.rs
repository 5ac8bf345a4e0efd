use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use formfill::fill::{fill_form, FieldMapping, FillOptions};
use formfill::parser::PdfDocument;
use formfill::repair::{repair_acroform, FieldMap, FieldMapEntry, RepairOptions};
use formfill::validation::validate_values;
use formfill::{inspect, StructureReport};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "formfill",
    about = "Repair and fill PDF application forms",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild a document's AcroForm from its page annotations
    Repair {
        /// Input PDF file
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Coordinate-to-name table (JSON array of {x, y, name} entries)
        #[arg(short, long)]
        map: Option<PathBuf>,

        /// Skip re-parsing the output to verify the repaired fields
        #[arg(long)]
        no_verify: bool,
    },

    /// Fill form fields from a JSON value file
    Fill {
        /// Input PDF file (usually a repaired template)
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Field values (JSON object, field name to value)
        #[arg(short, long)]
        data: PathBuf,

        /// Optional name translation (JSON object, data key to PDF field name)
        #[arg(short, long)]
        mapping: Option<PathBuf>,

        /// Validate values before filling; abort on errors
        #[arg(long)]
        validate: bool,

        /// Required field names, checked when validating
        #[arg(long = "require")]
        required: Vec<String>,

        /// Fields that receive only the day of an ISO date value
        #[arg(long = "day-field")]
        day_fields: Vec<String>,
    },

    /// Report a document's form structure
    Inspect {
        /// Input PDF file
        input: PathBuf,

        /// Show per-field and per-page detail
        #[arg(short, long)]
        detailed: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Repair {
            input,
            output,
            map,
            no_verify,
        } => {
            let bytes = std::fs::read(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            let field_map = match map {
                Some(path) => load_field_map(&path)?,
                None => FieldMap::new(),
            };
            let options = RepairOptions::default().with_verification(!no_verify);

            let outcome = repair_acroform(&bytes, &field_map, &options)
                .with_context(|| format!("repairing {}", input.display()))?;

            std::fs::write(&output, &outcome.bytes)
                .with_context(|| format!("writing {}", output.display()))?;

            if outcome.used_fallback {
                println!(
                    "Verification failed; wrote a verbatim copy to {}",
                    output.display()
                );
            } else {
                println!(
                    "Repaired {} field(s) into {}",
                    outcome.fields.len(),
                    output.display()
                );
            }
            for field in &outcome.fields {
                println!("  - {} ({}) x{}", field.name, field.field_type, field.instances);
            }
            for warning in &outcome.warnings {
                eprintln!("warning: {warning}");
            }
        }

        Commands::Fill {
            input,
            output,
            data,
            mapping,
            validate,
            required,
            day_fields,
        } => {
            let bytes = std::fs::read(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            let raw_values: HashMap<String, String> = load_json(&data)?;

            let values = match mapping {
                Some(path) => {
                    let table: HashMap<String, String> = load_json(&path)?;
                    FieldMapping::from(table).translate(&raw_values)
                }
                None => raw_values,
            };

            if validate {
                let required: Vec<&str> = required.iter().map(String::as_str).collect();
                let report = validate_values(&values, &required);
                for warning in &report.warnings {
                    eprintln!("warning: {warning}");
                }
                for error in &report.errors {
                    eprintln!("error: {error}");
                }
                report
                    .ensure_valid()
                    .context("refusing to fill with invalid values")?;
            }

            let mut doc = PdfDocument::parse(&bytes)
                .with_context(|| format!("parsing {}", input.display()))?;

            let mut options = FillOptions::new();
            for name in day_fields {
                options = options.with_day_field(name);
            }

            let report = fill_form(&mut doc, &values, &options)?;
            std::fs::write(&output, doc.to_bytes()?)
                .with_context(|| format!("writing {}", output.display()))?;

            println!(
                "Filled {} field(s) into {}",
                report.filled.len(),
                output.display()
            );
            if !report.unmatched.is_empty() {
                println!("No matching field for: {}", report.unmatched.join(", "));
            }
            for warning in &report.warnings {
                eprintln!("warning: {warning}");
            }
        }

        Commands::Inspect { input, detailed } => {
            let bytes = std::fs::read(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            let report = inspect(&bytes)
                .with_context(|| format!("inspecting {}", input.display()))?;
            print_report(&report, detailed);
        }
    }

    Ok(())
}

fn load_field_map(path: &Path) -> Result<FieldMap> {
    let entries: Vec<FieldMapEntry> = load_json(path)?;
    Ok(FieldMap::from_entries(entries))
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn print_report(report: &StructureReport, detailed: bool) {
    println!("Version:      {}", report.version);
    println!("Pages:        {}", report.page_count);
    println!(
        "Annotations:  {}",
        report.annotations_per_page.iter().sum::<usize>()
    );
    println!(
        "AcroForm:     {}",
        match (report.has_acro_form, report.is_xfa) {
            (true, true) => "present (XFA)",
            (true, false) => "present",
            (false, _) => "missing",
        }
    );
    println!("Fields:       {}", report.fields.len());

    if detailed {
        for field in &report.fields {
            let field_type = field
                .field_type
                .map(|t| t.to_string())
                .unwrap_or_else(|| "untyped".to_string());
            let value = if field.has_value { ", has value" } else { "" };
            let required = if field.flags.contains(formfill::FieldFlags::REQUIRED) {
                ", required"
            } else {
                ""
            };
            println!("  - {} ({field_type}{value}{required})", field.name);
        }
        for (index, count) in report.annotations_per_page.iter().enumerate() {
            println!("  page {}: {count} annotation(s)", index + 1);
        }
        println!(
            "Raw markers:  {} /Tx, {} /Btn, {} names, {} values",
            report.markers.text_fields,
            report.markers.buttons,
            report.markers.field_names,
            report.markers.field_values
        );
        for name in &report.name_samples {
            println!("  seen name: {name}");
        }
    }

    if report.looks_repairable() {
        println!("The raw bytes carry named fields the accessor cannot see; try `formfill repair`.");
    }
}
