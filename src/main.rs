//! hfimagen CLI: type a prompt, get `generated.png`.

use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use hfimagen::{
    logger::{self, LogLevel, LoggerConfig},
    render::{self, DownloadOffer},
    GenerationResult, ImageRequestClient, InferenceConfig,
};
use serde_json::json;

const TIP: &str = "Tip: be specific (styles, camera, mood). Example: 'Cinematic portrait of a samurai, dramatic lighting, 35mm film'";

#[derive(Parser)]
#[command(name = "hfimagen")]
#[command(author, version, about = "Text → Image via the Hugging Face Inference API", long_about = None)]
struct Cli {
    /// Describe the image (read from stdin when omitted)
    prompt: Vec<String>,

    /// Model id on the inference API (overrides HF_MODEL_ID)
    #[arg(short, long)]
    model: Option<String>,

    /// Directory to write generated.png into
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Print the PNG as a data URI instead of writing a file
    #[arg(long)]
    data_uri: bool,

    /// List well-known text-to-image models and exit
    #[arg(long)]
    list_models: bool,

    /// Output format (text or json)
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Log as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Also append log lines to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    let cli = Cli::parse();

    let logger_config = if cli.json_logs {
        LoggerConfig::production()
    } else {
        LoggerConfig::new()
    };
    let mut logger_config = if cli.verbose {
        logger_config.with_level(LogLevel::Debug)
    } else {
        logger_config.with_level(LogLevel::Warn)
    };
    if let Some(path) = cli.log_file.as_ref() {
        logger_config = logger_config.with_file_output(path.clone());
    }
    if let Err(e) = logger::init_with_config(logger_config) {
        eprintln!("{}", e);
        return ExitCode::from(2);
    }

    logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    if dotenv_loaded {
        log::info!("✅ .env file loaded");
    } else {
        log::debug!("No .env file found, using process environment");
    }

    if cli.list_models {
        for model in ImageRequestClient::supported_models() {
            println!("{:<42} {} ({})", model.id, model.name, model.provider);
        }
        return ExitCode::SUCCESS;
    }

    let mut config = match InferenceConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("No usable Hugging Face token found ({}). Set HF_TOKEN in the environment or a .env file.", e);
            return ExitCode::from(2);
        }
    };
    if let Some(model) = cli.model.as_deref() {
        config = config.with_model(model);
    }
    logger::log_config_info(&config);

    let client = match ImageRequestClient::new(config) {
        Ok(client) => client,
        Err(e) => {
            log::error!("Failed to initialize client: {}", e);
            return ExitCode::from(2);
        }
    };

    let prompt = match read_prompt(&cli.prompt) {
        Ok(prompt) => prompt,
        Err(e) => {
            eprintln!("Could not read prompt from stdin: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if prompt.trim().is_empty() {
        eprintln!("Type a prompt first.");
        return ExitCode::FAILURE;
    }

    if cli.format == OutputFormat::Text {
        eprintln!("{}", TIP);
        eprintln!("Generating image — this can take 20–60 seconds...");
    }

    match client.generate(&prompt).await {
        GenerationResult::Success { image_bytes } => {
            let offer = match DownloadOffer::from_image_bytes(&image_bytes) {
                Ok(offer) => offer,
                Err(e) => {
                    log::error!("Could not re-encode image: {}", e);
                    eprintln!("The model returned an image that could not be re-encoded: {}", e);
                    return ExitCode::FAILURE;
                }
            };
            deliver(&cli, &offer)
        }
        GenerationResult::Failure(failure) => {
            let message = render::describe_failure(&failure);
            match cli.format {
                OutputFormat::Json => println!(
                    "{}",
                    json!({ "ok": false, "failure": failure, "message": message })
                ),
                OutputFormat::Text => eprintln!("{}", message),
            }
            ExitCode::FAILURE
        }
    }
}

fn read_prompt(args: &[String]) -> std::io::Result<String> {
    if !args.is_empty() {
        return Ok(args.join(" "));
    }

    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        eprintln!("Describe the image (example: 'A cozy tea shop at night, warm lights'), then press Ctrl-D:");
    }
    let mut prompt = String::new();
    stdin.read_to_string(&mut prompt)?;
    Ok(prompt)
}

fn deliver(cli: &Cli, offer: &DownloadOffer) -> ExitCode {
    if cli.data_uri {
        match cli.format {
            OutputFormat::Json => println!("{}", offer.to_json(None, true)),
            OutputFormat::Text => println!("{}", offer.to_data_uri()),
        }
        return ExitCode::SUCCESS;
    }

    match offer.save_to(&cli.output_dir) {
        Ok(path) => {
            match cli.format {
                OutputFormat::Json => println!("{}", offer.to_json(Some(&path), false)),
                OutputFormat::Text => println!("{}", path.display()),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Failed to save image: {}", e);
            eprintln!("Failed to save image: {}", e);
            ExitCode::FAILURE
        }
    }
}
