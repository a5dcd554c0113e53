//! Landing Insights CLI - rank landing pages per marketing channel
//!
//! ```bash
//! landing-insights analyze export.csv             # Print rankings per channel
//! landing-insights analyze export.csv --export out.csv -o results.json
//! landing-insights columns export.csv             # Show detected columns
//! landing-insights parse export.csv               # Just parse CSV to JSON
//! landing-insights serve                          # Start HTTP server (port 3000)
//! ```

use clap::{Args, Parser, Subcommand};
use landing_insights::{
    analyze_file, format_delimiter, parse_file_auto, write_csv, ChannelResult, ColumnMap,
    PipelineOptions,
};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_PORT: u16 = 3000;

#[derive(Parser)]
#[command(name = "landing-insights")]
#[command(about = "Rank landing pages per marketing channel from analytics CSV exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a CSV file and output JSON rows
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show which headers map to landing page, sessions, channel and key events
    Columns {
        /// Input CSV file
        input: PathBuf,
    },

    /// Full pipeline: filter, compute conversion rates, rank per channel
    Analyze {
        /// Input CSV file
        input: PathBuf,

        /// Write channel results and export rows as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the filtered rows as a downloadable CSV
        #[arg(short, long)]
        export: Option<PathBuf>,

        #[command(flatten)]
        rules: RuleArgs,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: $PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Args)]
struct RuleArgs {
    /// Minimum sessions for a landing page to count
    #[arg(long, default_value = "50")]
    min_sessions: i64,

    /// Minimum key events / transactions for a landing page to count
    #[arg(long, default_value = "10")]
    min_transactions: i64,

    /// URL fragment to exclude (repeatable, replaces the defaults)
    #[arg(long = "exclude-term")]
    excluded_terms: Vec<String>,

    /// Also drop the bare "/" landing page
    #[arg(long)]
    exclude_root: bool,

    /// Pages per top and bottom slice
    #[arg(long, default_value = "5")]
    slice_size: usize,
}

impl From<RuleArgs> for PipelineOptions {
    fn from(args: RuleArgs) -> Self {
        let defaults = PipelineOptions::default();
        PipelineOptions {
            min_sessions: args.min_sessions,
            min_transactions: args.min_transactions,
            excluded_terms: if args.excluded_terms.is_empty() {
                defaults.excluded_terms
            } else {
                args.excluded_terms
            },
            exclude_root_page: args.exclude_root,
            slice_size: args.slice_size,
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),

        Commands::Columns { input } => cmd_columns(&input),

        Commands::Analyze {
            input,
            output,
            export,
            rules,
        } => cmd_analyze(&input, output.as_deref(), export.as_deref(), rules.into()),

        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let table = parse_file_auto(input)?;

    eprintln!("   Encoding: {}", table.encoding);
    eprintln!("   Delimiter: '{}'", format_delimiter(table.delimiter));
    if table.skipped_preamble > 0 {
        eprintln!("   Skipped {} comment line(s)", table.skipped_preamble);
    }
    eprintln!("   Columns: {}", table.headers.join(", "));
    eprintln!("✅ Parsed {} records", table.records.len());

    let json = serde_json::to_string_pretty(&table.records)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_columns(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let table = parse_file_auto(input)?;
    let columns = ColumnMap::resolve(&table.headers)?;
    let unmatched = columns.unmatched(&table.headers);

    for field in landing_insights::CanonicalField::ALL {
        let note = if unmatched.contains(&field) { "  (default, not in file)" } else { "" };
        println!("{:<16} → {}{}", field.to_string(), columns.header(field), note);
    }

    Ok(())
}

fn cmd_analyze(
    input: &Path,
    output: Option<&Path>,
    export: Option<&Path>,
    options: PipelineOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());

    let analysis = analyze_file(input, &options)?;
    let results = &analysis.output.channel_results;

    for channel in results {
        print_channel(channel);
    }
    if results.is_empty() {
        println!("No landing page met the thresholds.");
    }

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&serde_json::json!({
            "channelResults": results,
            "exportRows": &analysis.output.export_rows,
        }))?;
        fs::write(path, json)?;
        eprintln!("💾 Results written to: {}", path.display());
    }

    if let Some(path) = export {
        let file = fs::File::create(path)?;
        write_csv(&analysis.output.export_rows, file)?;
        eprintln!(
            "💾 {} rows exported to: {}",
            analysis.output.export_rows.len(),
            path.display()
        );
    }

    eprintln!("\n✨ Done!");
    Ok(())
}

fn print_channel(channel: &ChannelResult) {
    println!("\n📊 {}", channel.channel_name);
    println!("   Top pages:");
    for record in &channel.top5 {
        println!(
            "     {:>7.2}%  {:>8} sessions  {}",
            record.conversion_rate(),
            record.sessions(),
            record.landing_page()
        );
    }
    if !channel.bottom5.is_empty() {
        println!("   Bottom pages:");
        for record in &channel.bottom5 {
            println!(
                "     {:>7.2}%  {:>8} sessions  {}",
                record.conversion_rate(),
                record.sessions(),
                record.landing_page()
            );
        }
    }
}

async fn cmd_serve(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let port = match port {
        Some(p) => p,
        None => match std::env::var("PORT") {
            Ok(value) => value.parse()?,
            Err(_) => DEFAULT_PORT,
        },
    };
    landing_insights::server::start_server(port).await
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
