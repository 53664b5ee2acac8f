use anyhow::Result;
use clap::Parser;
use tracing::info;
use translation_extractor::config::Config;
use translation_extractor::fs::LocalFs;
use translation_extractor::orchestrator::{Orchestrator, RunOptions, RunReport};

/// Extract translation keys from templates and write locale catalogs
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The locale to extract translations for
    #[arg(long)]
    locale: Option<String>,

    /// Overwrite existing translations instead of merging with them
    #[arg(long)]
    force: bool,

    /// Fill empty keys using the configured translation provider
    #[arg(long)]
    translate: bool,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file (ignored when variables come from the environment)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("translation_extractor=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;

    println!("🔍 Scanning for translation keys...\n");
    if config.ai.enabled || args.translate {
        println!("🤖 AI Translation enabled ({})\n", config.ai.provider.kind);
    }

    let options = RunOptions {
        locale: args.locale,
        force: args.force,
        translate: args.translate,
    };
    let orchestrator = Orchestrator::new(&config, &LocalFs);

    let report = orchestrator.run(&options).await?;
    if report.keys_found == 0 {
        println!("⚠️  No translation keys found.");
        return Ok(());
    }

    print_report(&report);
    info!("Extraction finished for {}", report.locale);
    Ok(())
}

fn print_report(report: &RunReport) {
    println!("✅ Found {} unique translation keys.\n", report.keys_found);

    println!("📝 Sample keys:");
    for key in &report.sample_keys {
        println!("   - {}", key);
    }
    if report.keys_found > report.sample_keys.len() {
        println!(
            "   ... and {} more",
            report.keys_found - report.sample_keys.len()
        );
    }
    println!();

    let path = report
        .catalog_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    println!("💾 Translations saved to: {}\n", path);

    let stats = &report.stats;
    let mut rows = vec![
        ("Total Keys", stats.total.to_string()),
        ("Translated", stats.translated.to_string()),
        ("Untranslated", stats.untranslated.to_string()),
        ("Progress", format!("{}%", stats.percentage)),
    ];
    if stats.ai_translated > 0 || stats.ai_failed > 0 {
        rows.push(("AI Translated", stats.ai_translated.to_string()));
        if stats.ai_failed > 0 {
            rows.push(("AI Failed", stats.ai_failed.to_string()));
        }
    }
    if let Some(metrics) = &report.metrics {
        if metrics.api_calls > 0 {
            rows.push(("API Success", format!("{:.1}%", metrics.api_success_rate)));
        }
    }

    println!("📊 Statistics:");
    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    for (label, value) in &rows {
        println!("   {:<width$}  {}", label, value, width = width);
    }
    println!();

    if stats.ai_failed > 0 {
        println!(
            "⚠️  {} keys failed to translate (see logs for details)",
            stats.ai_failed
        );
    }

    if stats.untranslated > 0 {
        println!("💡 Tip: Edit {} to add translations for untranslated keys.", path);
    } else {
        println!("🎉 All keys have translations!");
    }
}
