use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use proto_field_model::descriptor::{FieldDescriptor, Label, TypeDescriptor};
use proto_field_model::error::{Error, Result};
use proto_field_model::schema::{Message, Schema};
use proto_field_model::type_map::ScalarCategory;

/// Inspect the field descriptor model built from a JSON schema document.
///
/// Loads the schema, resolves every enum and message reference, and prints
/// what a code emitter sees for each field: target type name, scalar
/// category, cardinality, and derived identifiers.
#[derive(Parser)]
#[command(name = "proto-field-model", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved descriptor of every field.
    Inspect {
        /// Schema document to load.
        #[arg(long, env = "PROTO_FIELD_MODEL_SCHEMA")]
        schema: PathBuf,

        /// Only show this message (dotted full name, e.g. "tutorial.Person").
        #[arg(long)]
        message: Option<String>,

        /// Output format.
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,

        /// Exit with an error if any type reference is left unresolved.
        #[arg(long)]
        strict: bool,

        /// Suppress warnings and the summary line.
        #[arg(long, short)]
        quiet: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Table,
    Json,
}

/// One field as a code emitter would see it.
#[derive(Serialize)]
struct FieldReport<'a> {
    message: String,
    name: &'a str,
    number: u32,
    label: Label,
    #[serde(rename = "type")]
    type_: &'a str,
    type_name: &'a str,
    declared_type_name: Option<&'a str>,
    namespace: Option<&'a str>,
    scalar_category: Option<ScalarCategory>,
    resolved: Option<String>,
    camel_case_name: String,
    const_name: String,
    default: Option<String>,
}

impl<'a> FieldReport<'a> {
    fn new(message: &Message, field: &'a FieldDescriptor) -> Self {
        let resolved = field.type_descriptor().map(|descriptor| match descriptor {
            TypeDescriptor::Enum(e) => format!("enum {}", e.full_name()),
            TypeDescriptor::Message(m) => format!("message {}", m.full_name()),
        });
        Self {
            message: message.full_name(),
            name: field.name(),
            number: field.number(),
            label: field.label(),
            type_: field.type_(),
            type_name: field.type_name(),
            declared_type_name: field.declared_type_name(),
            namespace: field.namespace(),
            scalar_category: field.scalar_category().ok(),
            resolved,
            camel_case_name: field.camel_case_name(),
            const_name: field.const_name(),
            default: field.default_value().map(ToString::to_string),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");

        // Print cause chain.
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = std::error::Error::source(cause);
        }

        process::exit(1);
    }
}

fn init_logging(quiet: bool) {
    let fallback = if quiet { "error" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Inspect {
            schema,
            message,
            format,
            strict,
            quiet,
        } => {
            init_logging(quiet);

            let loaded = proto_field_model::schema::load_schema(&schema)?;
            let messages = select_messages(&loaded, message.as_deref())?;

            let reports: Vec<FieldReport<'_>> = messages
                .iter()
                .flat_map(|m| m.fields().iter().map(move |f| FieldReport::new(m, f)))
                .collect();

            match format {
                Format::Table => print_table(&reports),
                Format::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
            }

            let unresolved = loaded.unresolved_count();
            if !quiet {
                eprintln!(
                    "{} messages, {} enums, {} fields ({} unresolved)",
                    loaded.messages().len(),
                    loaded.enums().len(),
                    reports.len(),
                    unresolved
                );
            }
            if strict && unresolved > 0 {
                return Err(Error::Schema(format!(
                    "{unresolved} type reference(s) could not be resolved"
                )));
            }
        }
    }

    Ok(())
}

fn select_messages<'a>(schema: &'a Schema, filter: Option<&str>) -> Result<Vec<&'a Message>> {
    let Some(name) = filter else {
        return Ok(schema.messages().iter().collect());
    };
    match schema.message(name) {
        Some(m) => Ok(vec![m]),
        None => {
            let available: Vec<String> = schema.messages().iter().map(Message::full_name).collect();
            Err(Error::Schema(format!(
                "message '{name}' not found (available: {})",
                available.join(", ")
            )))
        }
    }
}

fn print_table(reports: &[FieldReport<'_>]) {
    println!(
        "{:<28} {:>5} {:<20} {:<9} {:<20} {:<10} {:<22} {}",
        "MESSAGE", "NUM", "FIELD", "LABEL", "TYPE NAME", "CATEGORY", "CONST", "DEFAULT"
    );
    for r in reports {
        let category = r.scalar_category.map_or("-", ScalarCategory::as_str);
        println!(
            "{:<28} {:>5} {:<20} {:<9} {:<20} {:<10} {:<22} {}",
            r.message,
            r.number,
            r.name,
            r.label.as_str(),
            r.type_name,
            category,
            r.const_name,
            r.default.as_deref().unwrap_or("-")
        );
    }
}
