//! # Rotulo CLI
//!
//! Command-line interface for label content.
//!
//! ## Usage
//!
//! ```bash
//! # Show stored content the way the editor shows it
//! echo '<b>{{product.name}}</b>' | rotulo display --fields fields.json
//!
//! # Convert edited display content back to storage form
//! rotulo storage --fields fields.json '{{Producto}} / {{Lote}}'
//!
//! # Normalize markup through the editor tree
//! rotulo extract --mode html '<strong>{{lot}}</strong>'
//!
//! # Project a label against values
//! rotulo render --label label.json --values values.json
//!
//! # Report duplicate keys and unencodable barcodes
//! rotulo check --label label.json --values values.json
//!
//! # Start the preview API
//! rotulo serve --listen 0.0.0.0:8080
//! ```
//!
//! Set `RUST_LOG=debug` for editor and projection traces.

use clap::{Parser, Subcommand, ValueEnum};
use std::io::Read;
use std::path::{Path, PathBuf};

use rotulo::{
    RotuloError,
    config::RotuloConfig,
    content::{self, ContentMode, FieldMap, FieldOption},
    label::Label,
    printer::PrinterConfig,
    project::Values,
    server::{self, ServerConfig},
};

/// Rotulo - label content engine
#[derive(Parser, Debug)]
#[command(name = "rotulo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert storage content (`{{field}}`) to display content (`{{label}}`)
    Display {
        /// Content (read from stdin when omitted)
        content: Option<String>,

        /// JSON array of `{"value", "label"}` field options
        #[arg(long, value_name = "FILE")]
        fields: Option<PathBuf>,
    },

    /// Convert display content back to storage content
    Storage {
        /// Content (read from stdin when omitted)
        content: Option<String>,

        /// JSON array of `{"value", "label"}` field options
        #[arg(long, value_name = "FILE")]
        fields: Option<PathBuf>,
    },

    /// Load content into the editor tree and serialize it back
    Extract {
        /// Content (read from stdin when omitted)
        content: Option<String>,

        /// JSON array of `{"value", "label"}` field options
        #[arg(long, value_name = "FILE")]
        fields: Option<PathBuf>,

        /// How the content is interpreted
        #[arg(long, value_enum, default_value = "html")]
        mode: ModeArg,
    },

    /// Render every element of a label as JSON
    Render {
        /// Label document
        #[arg(long, value_name = "FILE")]
        label: PathBuf,

        /// JSON object of field values
        #[arg(long, value_name = "FILE")]
        values: Option<PathBuf>,

        /// Printer resolution for the canvas size report (203 or 300)
        #[arg(long)]
        printer: Option<String>,
    },

    /// Report duplicate field keys and barcode payloads that cannot print
    Check {
        /// Label document
        #[arg(long, value_name = "FILE")]
        label: PathBuf,

        /// JSON object of field values
        #[arg(long, value_name = "FILE")]
        values: Option<PathBuf>,
    },

    /// Start the HTTP preview API
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8080")]
        listen: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Plain,
    Html,
}

impl From<ModeArg> for ContentMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Plain => ContentMode::Plain,
            ModeArg::Html => ContentMode::Html,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), RotuloError> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => RotuloConfig::load(path)?,
        None => RotuloConfig::default(),
    };

    match cli.command {
        Commands::Display { content, fields } => {
            let fields = load_fields(fields.as_deref())?;
            println!("{}", content::to_display(&read_content(content)?, &fields));
        }
        Commands::Storage { content, fields } => {
            let fields = load_fields(fields.as_deref())?;
            println!("{}", content::to_storage(&read_content(content)?, &fields.invert()));
        }
        Commands::Extract { content, fields, mode } => {
            let fields = load_fields(fields.as_deref())?;
            let tree = content::load(&read_content(content)?, mode.into(), &fields);
            println!("{}", content::extract(&tree));
        }
        Commands::Render { label, values, printer } => {
            let label = load_label(&label)?;
            let values = load_values(values.as_deref())?;
            if let Some(printer) = printer {
                let printer = PrinterConfig::parse(&printer).map_err(RotuloError::Config)?;
                let (w, h) = label.canvas.to_dots(&printer);
                eprintln!("Canvas: {}x{} dots ({})", w, h, printer.name);
            }
            let rendered = label.render(&values, &config.projector);
            println!("{}", serde_json::to_string_pretty(&rendered)?);
        }
        Commands::Check { label, values } => {
            let label = load_label(&label)?;
            let values = load_values(values.as_deref())?;
            let issues = label.check(&values, &config.projector);
            if issues.is_empty() {
                println!("No issues found in '{}'", label.name);
                return Ok(());
            }
            for issue in &issues {
                match &issue.element {
                    Some(id) => println!("  [{}] {}", id, issue.message),
                    None => println!("  {}", issue.message),
                }
            }
            return Err(RotuloError::Label(format!("{} issue(s) found", issues.len())));
        }
        Commands::Serve { listen } => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::serve(ServerConfig { listen_addr: listen }, config))?;
        }
    }

    Ok(())
}

/// Content from the argument, or all of stdin without the trailing newline.
fn read_content(arg: Option<String>) -> Result<String, RotuloError> {
    if let Some(content) = arg {
        return Ok(content);
    }
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    Ok(buf.trim_end_matches(['\r', '\n']).to_string())
}

fn load_fields(path: Option<&Path>) -> Result<FieldMap, RotuloError> {
    let Some(path) = path else {
        return Ok(FieldMap::new());
    };
    let options: Vec<FieldOption> = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    Ok(FieldMap::from_options(&options))
}

fn load_values(path: Option<&Path>) -> Result<Values, RotuloError> {
    match path {
        Some(path) => Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?),
        None => Ok(Values::new()),
    }
}

fn load_label(path: &Path) -> Result<Label, RotuloError> {
    Label::from_json(&std::fs::read_to_string(path)?)
}
