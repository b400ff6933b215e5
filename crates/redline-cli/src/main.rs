use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use redline_core::{
    read_settings, write_settings, Language, ReviewRequest, Settings, DEFAULT_FILENAME,
};
use redline_review::engine::{CompletionClient, LlmTransport};
use redline_review::{review, Refactor, Review, ReviewResult};

#[derive(Parser, Debug)]
#[command(name = "redline", version, about = "AI code review from the terminal")]
struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Review a source file ("-" reads from stdin)
    Review {
        file: PathBuf,
        #[arg(long, help = "Language to review as (defaults to the file extension)")]
        language: Option<String>,
        #[arg(long, help = "Filename shown to the model (defaults to the path's basename)")]
        filename: Option<String>,
        #[arg(long, help = "Model to use (defaults to the configured one)")]
        model: Option<String>,
    },
    /// Show or update provider settings
    Config {
        #[arg(long)]
        provider: Option<String>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        api_key: Option<String>,
    },
    /// List reviewable languages
    Languages,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    match cli.command {
        Commands::Review {
            file,
            language,
            filename,
            model,
        } => run_review(cli.json, file, language, filename, model).await,
        Commands::Config {
            provider,
            model,
            api_key,
        } => run_config(cli.json, provider, model, api_key),
        Commands::Languages => run_languages(cli.json),
    }
}

/// Diagnostics go to stderr so `--json` output on stdout stays parseable.
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("REDLINE_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_review(
    json: bool,
    file: PathBuf,
    language: Option<String>,
    filename: Option<String>,
    model: Option<String>,
) -> anyhow::Result<()> {
    let code = read_code(&file)?;
    if code.trim().is_empty() {
        bail!("nothing to review: {} is empty", file.display());
    }

    let settings = Settings::load();
    if !settings.configured() {
        tracing::warn!(
            provider = %settings.provider,
            "no api key configured; the request will likely be rejected"
        );
    }

    let language = resolve_language(language.as_deref(), &file)?;
    let filename = filename.unwrap_or_else(|| basename(&file));
    let model = model.unwrap_or_else(|| settings.model.clone());

    let request = ReviewRequest {
        code,
        filename,
        language: language.to_string(),
        model,
    };

    let client = CompletionClient::new(LlmTransport::new(settings));
    let result = review(&client, &request).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }

    if let ReviewResult::Failure { error } = result {
        bail!("review failed: {error}");
    }
    Ok(())
}

fn run_config(
    json: bool,
    provider: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
) -> anyhow::Result<()> {
    let mut settings = read_settings();
    let updating = provider.is_some() || model.is_some() || api_key.is_some();

    if let Some(provider) = provider {
        settings.provider = provider;
    }
    if let Some(model) = model {
        settings.model = model;
    }
    // An empty or omitted --api-key keeps the stored one.
    if let Some(api_key) = api_key.filter(|key| !key.is_empty()) {
        settings.api_key = api_key;
    }
    if updating {
        write_settings(&settings)?;
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "provider": settings.provider,
                "model": settings.model,
                "apiKeySet": !settings.api_key.is_empty(),
            }))?
        );
    } else {
        println!("provider: {}", settings.provider);
        println!("model: {}", settings.model);
        println!(
            "api key: {}",
            if settings.api_key.is_empty() {
                "unset"
            } else {
                "set"
            }
        );
    }
    Ok(())
}

fn run_languages(json: bool) -> anyhow::Result<()> {
    if json {
        let names: Vec<&str> = Language::ALL.iter().map(Language::as_str).collect();
        println!("{}", serde_json::to_string_pretty(&names)?);
    } else {
        for language in Language::ALL {
            println!("{language}");
        }
    }
    Ok(())
}

fn read_code(file: &Path) -> anyhow::Result<String> {
    if file == Path::new("-") {
        let mut code = String::new();
        std::io::stdin()
            .read_to_string(&mut code)
            .context("read stdin")?;
        return Ok(code);
    }
    std::fs::read_to_string(file).with_context(|| format!("read {}", file.display()))
}

fn resolve_language(flag: Option<&str>, file: &Path) -> anyhow::Result<Language> {
    if let Some(name) = flag {
        return Ok(name.parse::<Language>()?);
    }
    let detected = file
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(Language::from_extension);
    Ok(detected.unwrap_or(Language::Python))
}

fn basename(file: &Path) -> String {
    if file == Path::new("-") {
        return DEFAULT_FILENAME.to_string();
    }
    file.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string())
}

fn print_result(result: &ReviewResult) {
    match result {
        ReviewResult::Structured(parsed) => print_review(parsed),
        ReviewResult::RawFallback {
            raw_response,
            error,
        } => {
            println!("{error}");
            println!();
            println!("{raw_response}");
        }
        // Failures are reported through the process error path.
        ReviewResult::Failure { .. } => {}
    }
}

fn print_review(parsed: &Review) {
    println!("Summary");
    println!("  {}", parsed.summary.as_deref().unwrap_or("N/A"));
    print_section("Issues", &parsed.issues);
    print_section("Improvements", &parsed.improvements);
    print_section("Performance Suggestions", &parsed.performance);
    print_section("Security Concerns", &parsed.security);
    println!();
    println!("Refactored Code");
    match &parsed.refactor {
        Some(Refactor::Code { code }) => println!("{code}"),
        Some(Refactor::Text(text)) => println!("  {text}"),
        None => println!("  N/A"),
    }
}

fn print_section(title: &str, items: &[String]) {
    println!();
    println!("{title}");
    if items.is_empty() {
        println!("  (none)");
        return;
    }
    for item in items {
        println!("  - {item}");
    }
}
