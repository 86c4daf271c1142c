//! topdf CLI - batch HTML to PDF conversion tool

mod renderer;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use renderer::CommandRenderer;
use topdf::{
    build_archive, BatchReport, ConversionEngine, ConvertOptions, DirectoryScanner, OutputTarget,
    PreparePreset, ScanOptions, Statistics,
};

#[derive(Parser)]
#[command(name = "topdf")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Convert a tree of HTML documents to PDFs, mirroring the directory layout", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert every HTML document under a directory
    Convert {
        /// Directory to scan
        #[arg(value_name = "DIR")]
        input: PathBuf,

        /// Output directory name created under the scan root
        #[arg(short, long, value_name = "NAME", default_value = "output")]
        output: String,

        /// Renderer command reading HTML on stdin and writing PDF to stdout
        #[arg(long, env = "TOPDF_RENDERER", default_value = "wkhtmltopdf --quiet - -")]
        renderer: String,

        /// Extensions to convert
        #[arg(long, value_delimiter = ',', default_value = "html,htm")]
        ext: Vec<String>,

        /// Pass documents to the renderer without sanitization
        #[arg(long)]
        no_prepare: bool,

        /// Also write a zip of the converted documents
        #[arg(long, value_name = "FILE")]
        zip: Option<PathBuf>,

        /// Print the full report as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// List the documents a conversion would process
    Scan {
        /// Directory to scan
        #[arg(value_name = "DIR")]
        input: PathBuf,

        /// Extensions to include
        #[arg(long, value_delimiter = ',', default_value = "html,htm")]
        ext: Vec<String>,

        /// Print the document list as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            input,
            output,
            renderer,
            ext,
            no_prepare,
            zip,
            json,
        } => cmd_convert(&input, &output, &renderer, ext, no_prepare, zip, json),
        Commands::Scan { input, ext, json } => cmd_scan(&input, ext, json),
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_convert(
    input: &std::path::Path,
    output: &str,
    renderer_cmd: &str,
    ext: Vec<String>,
    no_prepare: bool,
    zip: Option<PathBuf>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let scanner = DirectoryScanner::new(input, ScanOptions::new().with_extensions(ext.clone()))?;
    let documents = scanner.to_vec();

    if documents.is_empty() {
        println!("{}", "No documents found.".yellow());
        return Ok(());
    }

    let prepare = if no_prepare {
        PreparePreset::Off
    } else {
        PreparePreset::Standard
    };
    let options = ConvertOptions::new()
        .with_source_extensions(ext)
        .with_prepare(prepare);
    let engine = ConversionEngine::new(Arc::new(CommandRenderer::new(renderer_cmd)?), options);

    let output_root = scanner.root().join(output);
    let target = OutputTarget::Directory(output_root.clone());

    let pb = ProgressBar::new(documents.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let mut outcomes = Vec::with_capacity(documents.len());
    for document in &documents {
        pb.set_message(document.relative_path_string());
        outcomes.push(engine.convert_one(document, &target));
        pb.inc(1);
    }
    pb.finish_with_message("Done!");

    let statistics = Statistics::from_outcomes(&outcomes);
    let report = BatchReport {
        outcomes,
        statistics,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report, &output_root);
    }

    if let Some(zip_path) = zip {
        let bytes = build_archive(&report.outcomes)?;
        std::fs::write(&zip_path, &bytes)?;
        println!(
            "{} {} ({})",
            "Archive written to".green(),
            zip_path.display(),
            format_size(bytes.len() as u64)
        );
    }

    if report.statistics.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn print_summary(report: &BatchReport, output_root: &std::path::Path) {
    println!("\n{}", "Conversion summary:".green().bold());
    println!("  Total:      {}", report.statistics.total);
    println!(
        "  Converted:  {}",
        report.statistics.successful.to_string().green()
    );
    let failed = report.statistics.failed.to_string();
    println!(
        "  Failed:     {}",
        if report.statistics.failed > 0 {
            failed.red().to_string()
        } else {
            failed
        }
    );
    println!("  Success:    {:.1}%", report.statistics.success_rate);
    println!("  Output:     {}", output_root.display());

    for outcome in report.outcomes.iter().filter(|o| !o.success) {
        println!(
            "  {} {}: {}",
            "✗".red(),
            outcome.source.relative_path_string(),
            outcome.error.as_deref().unwrap_or("unknown error")
        );
    }
}

fn cmd_scan(
    input: &std::path::Path,
    ext: Vec<String>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let scanner = DirectoryScanner::new(input, ScanOptions::new().with_extensions(ext))?;
    let documents = scanner.to_vec();

    if json {
        println!("{}", serde_json::to_string_pretty(&documents)?);
        return Ok(());
    }

    for document in &documents {
        println!(
            "  {} {} ({})",
            "├─".dimmed(),
            document.relative_path_string(),
            format_size(document.size_bytes)
        );
    }
    println!(
        "{} {} document(s) under {}",
        "Found".green().bold(),
        documents.len(),
        scanner.root().display()
    );

    Ok(())
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    match bytes {
        b if b >= MB => format!("{:.1} MB", b as f64 / MB as f64),
        b if b >= KB => format!("{:.1} KB", b as f64 / KB as f64),
        b => format!("{} B", b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }
}
