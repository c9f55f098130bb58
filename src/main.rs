use clap::Parser;
use shotmark_etl::app::project_picker;
use shotmark_etl::core::Storage;
use shotmark_etl::domain::model::ConversionReport;
use shotmark_etl::utils::error::{ErrorSeverity, EtlError};
use shotmark_etl::utils::{logger, validation::Validate};
use shotmark_etl::{EtlEngine, LocalStorage, MarkerPipeline, TomlConfig, UuidGenerator};
use std::path::Path;

#[derive(Parser, Debug)]
#[command(name = "shotmark-etl")]
#[command(about = "Copy in-camera shot marks from XML sidecars onto editor timeline clips")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "shotmark.toml")]
    config: String,

    /// Project folder name; asks interactively when omitted
    #[arg(short, long)]
    project: Option<String>,

    /// Override paths.xml_folder from the config
    #[arg(long)]
    xml_folder: Option<String>,

    /// Do not copy the project file before writing
    #[arg(long)]
    no_backup: bool,

    /// Show what would be added without touching the project
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();
    println!("=== Shot marks XML to timeline markers ===\n");

    let code = match run(&args).await {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!(
                "❌ Conversion failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium | ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            }
        }
    };

    println!("\nProcess finished.");
    std::process::exit(code);
}

async fn run(args: &Args) -> Result<(), EtlError> {
    let mut config = TomlConfig::from_file(&args.config).map_err(|e| match e {
        EtlError::IoError(io) => EtlError::config(format!(
            "cannot read config file '{}': {}",
            args.config, io
        )),
        other => other,
    })?;

    logger::init_cli_logger(args.verbose, config.log_level());
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    if let Some(xml_folder) = &args.xml_folder {
        config.paths.xml_folder = xml_folder.clone();
        tracing::info!("🔧 XML folder overridden to: {}", xml_folder);
    }

    config.validate()?;

    let projects_folder = Path::new(&config.paths.projects_folder);
    let project_name = match &args.project {
        Some(name) => name.clone(),
        None => {
            let projects = project_picker::list_projects(projects_folder)?;
            let stdin = std::io::stdin();
            let index =
                project_picker::prompt_selection(&projects, stdin.lock(), std::io::stdout())?;
            projects[index].clone()
        }
    };

    let project_dir = projects_folder.join(&project_name);
    let storage = LocalStorage::new(&project_dir);
    let project_path = storage.full_path(config.project_file());
    if !project_path.is_file() {
        return Err(EtlError::project(format!(
            "{} does not exist",
            project_path.display()
        )));
    }
    tracing::info!("🎬 Project: {}", project_name);

    if args.dry_run {
        let engine = EtlEngine::new(MarkerPipeline::new(storage, config, UuidGenerator));
        let report = engine.dry_run().await?;
        print_report(&report);
        return Ok(());
    }

    if !args.no_backup {
        if let Some(backup) = config.backup_file_name(&chrono::Local::now()) {
            storage.copy_file(config.project_file(), &backup).await?;
            println!("Backup created: {}", backup);
        }
    }

    let engine = EtlEngine::new(MarkerPipeline::new(storage, config, UuidGenerator));
    let summary = engine.run().await?;

    if summary.persisted_to.is_some() {
        println!(
            "\nSuccess: {} markers added to the clips in your timeline.",
            summary.report.total_markers
        );
    } else {
        println!("\nNo matching clips or relevant markers (Frame > 0) found.");
    }

    Ok(())
}

fn print_report(report: &ConversionReport) {
    println!("🔍 Dry run:");
    println!("  XML files scanned: {}", report.files_scanned);
    println!("  Without matching clip: {}", report.files_unmatched);
    println!("  Without shot marks: {}", report.files_without_markers);
    for clip in &report.clips {
        println!(
            "  -> Clip {} ({}): {} shot marks on {} segment(s)",
            clip.prefix,
            clip.file_name,
            clip.markers,
            clip.segments.len()
        );
    }
    println!("  Markers that would be added: {}", report.total_markers);
}
