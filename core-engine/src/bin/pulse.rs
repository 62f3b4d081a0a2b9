//! pulse - command-line front end for capture analysis
//!
//! ```text
//! pulse analyze --model models/packet_model.json capture.pcap
//! pulse quick   --model models/packet_model.json capture.pcap
//! pulse features capture.pcap --out features.csv
//! pulse evaluate --model model/xgboost.json --features results/selected_features.csv --data data/
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use pulse_core::analysis::{AnalysisReport, PacketAnalyzer, QuickReport};
use pulse_core::capture::{decode, read_capture_file};
use pulse_core::constants::{APP_NAME, APP_VERSION, DEFAULT_MAX_DETAILS};
use pulse_core::evaluate::{self, LabeledDataset, DEFAULT_LABEL_COLUMN};
use pulse_core::features::{extract_packet, layout, FlowSchema, LayoutInfo};
use pulse_core::model::{LabelSet, LoadedModel};

#[derive(Parser, Debug)]
#[command(name = "pulse")]
#[command(about = "Classify packets in capture files with a tree-ensemble model", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Full per-packet analysis of a capture
    Analyze(AnalyzeArgs),

    /// Counts and the first threats only
    Quick(QuickArgs),

    /// Export the packet feature matrix as CSV
    Features(FeaturesArgs),

    /// Score a flow model against labeled CSV data
    Evaluate(EvaluateArgs),
}

#[derive(Parser, Debug)]
struct AnalyzeArgs {
    /// Packet model (tree-ensemble JSON)
    #[arg(short, long, default_value = "models/packet_model.json")]
    model: PathBuf,

    /// Capture file (.pcap, .pcapng, .cap)
    pcap: PathBuf,

    /// Packets always listed in the details section
    #[arg(long, default_value_t = DEFAULT_MAX_DETAILS)]
    max_details: usize,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct QuickArgs {
    #[arg(short, long, default_value = "models/packet_model.json")]
    model: PathBuf,

    pcap: PathBuf,

    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct FeaturesArgs {
    pcap: PathBuf,

    /// Output CSV file
    #[arg(short, long, default_value = "features.csv")]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct EvaluateArgs {
    /// Flow model (tree-ensemble JSON)
    #[arg(short, long)]
    model: PathBuf,

    /// Selected-features CSV (TopFeatures column)
    #[arg(short, long, default_value = "results/selected_features.csv")]
    features: PathBuf,

    /// Labeled CSV file or directory of CSV files
    #[arg(short, long)]
    data: PathBuf,

    #[arg(long, default_value = DEFAULT_LABEL_COLUMN)]
    label_column: String,

    /// Results table
    #[arg(short, long, default_value = "model_results.csv")]
    out: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    log::debug!("{} v{}", APP_NAME, APP_VERSION);

    match cli.command {
        Commands::Analyze(args) => analyze(args),
        Commands::Quick(args) => quick(args),
        Commands::Features(args) => features(args),
        Commands::Evaluate(args) => evaluate_model(args),
    }
}

fn load_analyzer(path: &Path) -> Result<PacketAnalyzer> {
    let model = LoadedModel::load(path).with_context(|| format!("loading packet model {}", path.display()))?;
    Ok(PacketAnalyzer::from_model(Arc::new(model))?)
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

// ============================================================================
// COMMANDS
// ============================================================================

fn analyze(args: AnalyzeArgs) -> Result<()> {
    let analyzer = load_analyzer(&args.model)?;
    let capture = read_capture_file(&args.pcap).with_context(|| format!("reading {}", args.pcap.display()))?;

    let report = analyzer.analyze(&capture, &file_name(&args.pcap), args.max_details);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_analysis(&report);
    }
    Ok(())
}

fn quick(args: QuickArgs) -> Result<()> {
    let analyzer = load_analyzer(&args.model)?;
    let capture = read_capture_file(&args.pcap).with_context(|| format!("reading {}", args.pcap.display()))?;

    let report = analyzer.quick_scan(&capture);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_quick(&report);
    }
    Ok(())
}

fn features(args: FeaturesArgs) -> Result<()> {
    let capture = read_capture_file(&args.pcap).with_context(|| format!("reading {}", args.pcap.display()))?;
    let info = LayoutInfo::current();
    log::info!("Feature layout v{} (hash {:08x})", info.version, info.hash);

    let mut writer = csv::Writer::from_path(&args.out)?;
    let mut header = vec!["packet_number".to_string()];
    header.extend(layout::feature_names());
    writer.write_record(&header)?;

    for raw in &capture.packets {
        let vector = extract_packet(&decode(raw));
        let mut row = vec![(raw.index + 1).to_string()];
        row.extend(vector.as_slice().iter().map(|v| v.to_string()));
        writer.write_record(&row)?;
    }
    writer.flush()?;

    println!("Wrote {} rows to {}", capture.len(), args.out.display());
    Ok(())
}

fn evaluate_model(args: EvaluateArgs) -> Result<()> {
    let model = LoadedModel::load(&args.model).with_context(|| format!("loading flow model {}", args.model.display()))?;
    let schema = FlowSchema::load(&args.features)?;
    let dataset = LabeledDataset::load(&args.data, &schema, &args.label_column)?;

    let labels = if model.class_labels().is_empty() {
        LabelSet::cicids2017()
    } else {
        LabelSet::new(model.class_labels().to_vec())
    };

    let name = model.ensemble().name.clone().unwrap_or_else(|| file_name(&args.model));
    let report = evaluate::evaluate(&name, &model, &labels, &dataset)?;
    print!("{}", report);

    evaluate::write_results_csv(&args.out, &[report])?;
    println!("Results saved to {}", args.out.display());
    Ok(())
}

// ============================================================================
// OUTPUT
// ============================================================================

fn print_counts<'a>(counts: impl Iterator<Item = (&'a str, u64)>, percentages: impl Iterator<Item = (&'a str, f64)>) {
    for ((label, count), (_, pct)) in counts.zip(percentages) {
        println!("  {:<16} {:>8}  ({:.2}%)", label, count, pct);
    }
}

fn print_analysis(report: &AnalysisReport) {
    println!("{}", "=".repeat(60));
    println!("{}: {} packets", report.filename, report.total_packets);
    println!("{}", "=".repeat(60));
    print_counts(report.summary.counts.iter(), report.summary.percentages.iter());
    println!("Threats detected: {}", report.threats_detected);
    if report.skipped_packets > 0 {
        println!("Skipped packets: {}", report.skipped_packets);
    }

    if !report.threat_packets.is_empty() {
        println!("\nThreat packets:");
        for t in &report.threat_packets {
            println!(
                "  #{:<6} {:<14} {:>6.2}%  {}",
                t.detail.packet_number, t.detail.prediction, t.detail.confidence, t.detail.summary
            );
        }
    }
}

fn print_quick(report: &QuickReport) {
    println!("{} packets ({} analyzed, {} failed)", report.total_packets, report.packets_analyzed, report.packets_failed);
    print_counts(report.results.iter(), report.percentages.iter());
    for t in &report.top_threats {
        println!("  #{:<6} {:<14} {:>6.2}%  {}", t.packet, t.kind, t.confidence, t.summary);
    }
}
