/*!
 * Warp Intent CLI
 *
 * Command-line front end for the intent classifier. Classifies input lines,
 * detects not-found output and runs failed-command triage, printing either
 * human-readable text or JSON for scripting.
 */

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing::debug;
use warp_intent::classifier::{IntentClassifier, TriageOutcome, COMMON_COMMANDS};
use warp_intent::config::IntentConfig;
use warp_intent::logging::{init_logging, LogConfig};
use warp_intent::not_found::classify_not_found;
use warp_intent::subcommands::SubcommandRegistry;
use warp_intent::triage::TriageRequest;
use warp_intent::typo::find_typo_suggestion;

#[derive(Parser)]
#[command(name = "intent_cli")]
#[command(about = "Warp Intent - command vs natural-language classification and failure triage", long_about = None)]
struct Cli {
    /// Emit JSON instead of human-readable output
    #[arg(long, global = true)]
    json: bool,

    /// Config file (default: ~/.warp_intent/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log verbosity when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify an input line as COMMAND or NATURAL_LANGUAGE
    Classify {
        /// The input line; multiple words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        input: Vec<String>,

        /// Skip listing shell builtins, functions and aliases
        #[arg(long)]
        no_discovery: bool,
    },

    /// Suggest the closest candidate for a mistyped word
    Suggest {
        input: String,

        /// Comma-separated candidates (default: multi-level tools and common commands)
        #[arg(short, long, value_delimiter = ',')]
        candidates: Vec<String>,

        /// Maximum edit distance
        #[arg(short, long)]
        max_distance: Option<usize>,
    },

    /// Check command output (stdin) for a not-found error
    NotFound,

    /// List multi-level tools, or the subcommands of one tool
    Subcommands { tool: Option<String> },

    /// Ask the assistant whether a failed command deserves a notification
    Triage {
        /// The command that failed
        #[arg(long)]
        command: Option<String>,

        #[arg(short, long, allow_negative_numbers = true)]
        exit_code: i32,

        /// Working directory for the assistant process
        #[arg(long)]
        cwd: Option<PathBuf>,

        /// Assistant executable, overriding config
        #[arg(long)]
        assistant: Option<PathBuf>,

        /// Print the prompt instead of running the assistant
        #[arg(long)]
        prompt_only: bool,
    },

    /// Print the effective configuration as YAML
    Config,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(LogConfig {
        default_filter: cli.log_level.clone(),
        ..LogConfig::default()
    });

    let config = load_config(cli.config.as_ref())?;
    debug!(?config, "loaded config");

    match cli.command {
        Commands::Classify { input, no_discovery } => {
            classify(&config, &input.join(" "), no_discovery, cli.json).await
        }
        Commands::Suggest {
            input,
            candidates,
            max_distance,
        } => suggest(&config, &input, candidates, max_distance, cli.json),
        Commands::NotFound => not_found(cli.json),
        Commands::Subcommands { tool } => subcommands(tool.as_deref(), cli.json),
        Commands::Triage {
            command,
            exit_code,
            cwd,
            assistant,
            prompt_only,
        } => {
            let mut config = config;
            if let Some(path) = assistant {
                config.assistant_path = path.to_string_lossy().into_owned();
            }
            triage(&config, command, exit_code, cwd, prompt_only, cli.json).await
        }
        Commands::Config => {
            print!("{}", config.to_yaml()?);
            Ok(())
        }
        Commands::Version => {
            println!("intent_cli v{}", env!("CARGO_PKG_VERSION"));
            println!("Warp Intent Classifier and Failure Triage");
            Ok(())
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<IntentConfig> {
    let mut config = match path {
        Some(path) => IntentConfig::load(path)?,
        None => IntentConfig::load(IntentConfig::default_path())?,
    };
    config.apply_env()?;
    Ok(config)
}

fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("failed to read stdin")?;
    Ok(buffer)
}

async fn classify(config: &IntentConfig, input: &str, no_discovery: bool, json: bool) -> Result<()> {
    let classifier = IntentClassifier::from_config(config);
    if !no_discovery {
        classifier.initialize_detection().await;
    }

    let result = classifier.classify(input);
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let intent = serde_json::to_value(result.intent)?;
    println!("{}\t{}", intent.as_str().unwrap_or_default(), result.cleaned_input);
    if let Some(suggested) = &result.suggested_input {
        println!("Did you mean: {}", suggested);
    }
    Ok(())
}

fn suggest(
    config: &IntentConfig,
    input: &str,
    candidates: Vec<String>,
    max_distance: Option<usize>,
    json: bool,
) -> Result<()> {
    let candidates = if candidates.is_empty() {
        SubcommandRegistry::builtin()
            .tools()
            .into_iter()
            .chain(COMMON_COMMANDS.iter().copied())
            .map(str::to_string)
            .collect()
    } else {
        candidates
    };

    let max_distance = max_distance.unwrap_or(config.typo_max_distance);
    let suggestion = find_typo_suggestion(input, &candidates, max_distance);

    if json {
        println!("{}", json!({ "input": input, "suggestion": suggestion }));
    } else {
        match suggestion {
            Some(s) => println!("{}", s),
            None => println!("No suggestion for '{}'", input),
        }
    }
    Ok(())
}

fn not_found(json: bool) -> Result<()> {
    let output = read_stdin()?;
    let kind = classify_not_found(&output);

    if json {
        println!(
            "{}",
            json!({ "commandNotFound": kind.is_some(), "kind": kind })
        );
    } else {
        match kind {
            Some(kind) => println!("command not found ({:?})", kind),
            None => println!("no not-found error"),
        }
    }
    Ok(())
}

fn subcommands(tool: Option<&str>, json: bool) -> Result<()> {
    let registry = SubcommandRegistry::builtin();

    let names: Vec<&str> = match tool {
        None => registry.tools(),
        Some(tool) => {
            let Some(subs) = registry.get_subcommands(tool) else {
                bail!("no subcommand table for '{}'", tool);
            };
            let mut subs: Vec<&str> = subs.iter().copied().collect();
            subs.sort_unstable();
            subs
        }
    };

    if json {
        println!("{}", serde_json::to_string(&names)?);
    } else {
        for name in names {
            println!("{}", name);
        }
    }
    Ok(())
}

async fn triage(
    config: &IntentConfig,
    command: Option<String>,
    exit_code: i32,
    cwd: Option<PathBuf>,
    prompt_only: bool,
    json: bool,
) -> Result<()> {
    let request = TriageRequest {
        command,
        exit_code,
        recent_output: read_stdin()?,
        cwd,
    };

    if prompt_only {
        print!("{}", request.prompt());
        return Ok(());
    }

    let classifier = IntentClassifier::from_config(config);
    let outcome = classifier.triage_failure(&request).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    match outcome {
        TriageOutcome::Notify { message } => println!("notify: {}", message),
        TriageOutcome::Suppress { reason } => println!("suppress: {:?}", reason),
    }
    Ok(())
}
