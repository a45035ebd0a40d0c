//! CLI for Flag Portrait - national pride portraits via Gemini.

use clap::{Args, Parser, Subcommand, ValueEnum};
use flag_portrait::generation::{
    GeminiClient, GeminiModel, GenerationClient, PORTRAIT_INSTRUCTION,
};
use flag_portrait::{Download, Locale, Session, Slot, View};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "flag-portrait")]
#[command(about = "Turn a portrait and a national flag into a profile picture with Gemini")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Language for user-facing messages
    #[arg(long, global = true, value_enum, default_value = "en")]
    locale: LocaleArg,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a portrait from a photo and a flag
    Generate(GenerateArgs),

    /// Verify that the API key is accepted
    Check(CredentialArgs),

    /// Print the instruction sent with every request
    Prompt,
}

#[derive(Args)]
struct CredentialArgs {
    /// Google AI API key (defaults to GOOGLE_API_KEY, GEMINI_API_KEY or API_KEY)
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Gemini model to use
    #[arg(short, long, value_enum, default_value = "nano-banana")]
    model: ModelArg,
}

#[derive(Args)]
struct GenerateArgs {
    /// Your personal photo
    #[arg(long)]
    person: PathBuf,

    /// Your country's flag
    #[arg(long)]
    flag: PathBuf,

    /// Output file, or directory for national_pride_portrait.png
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    #[command(flatten)]
    credential: CredentialArgs,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    NanoBanana,
    NanoBananaPro,
}

impl From<ModelArg> for GeminiModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::NanoBanana => GeminiModel::NanoBanana,
            ModelArg::NanoBananaPro => GeminiModel::NanoBananaPro,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LocaleArg {
    En,
    Ar,
}

impl From<LocaleArg> for Locale {
    fn from(arg: LocaleArg) -> Self {
        match arg {
            LocaleArg::En => Locale::En,
            LocaleArg::Ar => Locale::Ar,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let locale = Locale::from(cli.locale);
    let outcome = match cli.command {
        Commands::Generate(args) => generate_portrait(args, cli.json, locale).await,
        Commands::Check(args) => check_credentials(args, cli.json).await,
        Commands::Prompt => {
            println!("{PORTRAIT_INSTRUCTION}");
            Ok(())
        }
    };

    // Only the category-derived message reaches the user
    if let Err(e) = outcome {
        let kind = e.kind();
        let message = kind.user_message(locale);
        if cli.json {
            let result = serde_json::json!({
                "success": false,
                "error_kind": kind,
                "message": message,
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
            std::process::exit(1);
        }
        anyhow::bail!(message);
    }

    Ok(())
}

fn build_client(args: CredentialArgs) -> flag_portrait::Result<GeminiClient> {
    let mut builder = GeminiClient::builder().model(args.model.into());
    if let Some(key) = args.api_key {
        builder = builder.api_key(key);
    }
    builder.build()
}

async fn generate_portrait(
    args: GenerateArgs,
    json_output: bool,
    locale: Locale,
) -> flag_portrait::Result<()> {
    let client = build_client(args.credential)?;
    let mut session = Session::new();

    let _ = session.upload_file(Slot::Person, &args.person).await?;
    let _ = session.upload_file(Slot::Flag, &args.flag).await?;
    if !json_output {
        render(&session, locale);
    }

    if session.can_generate() && !json_output {
        eprintln!("Generating your portrait...");
    }
    let _ = session.generate(&client).await?;
    if !json_output {
        render(&session, locale);
    }

    let Some(download) = session.download() else {
        return Ok(());
    };
    let saved = save_download(&download, &args.output)?;

    if json_output {
        let result = serde_json::json!({
            "type": "portrait",
            "success": true,
            "state": session.state().name(),
            "output": saved.display().to_string(),
            "size_bytes": download.image.to_bytes()?.len(),
            "format": download.image.format().extension(),
            "model": client.model().as_str(),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Saved portrait: {}", saved.display());
    }

    session.reset();
    Ok(())
}

fn save_download(download: &Download, output: &Path) -> flag_portrait::Result<PathBuf> {
    if output.is_dir() {
        download.save_to(output)
    } else {
        download.save_as(output)?;
        Ok(output.to_path_buf())
    }
}

fn render(session: &Session, locale: Locale) {
    match session.view() {
        View::Upload {
            person,
            flag,
            can_generate,
            error,
            ..
        } => {
            let mark = |present: bool| if present { "✓" } else { "✗" };
            eprintln!("  {} portrait", mark(person.is_some()));
            eprintln!("  {} flag", mark(flag.is_some()));
            if let Some(kind) = error {
                eprintln!("  {}", kind.user_message(locale));
            } else if can_generate {
                eprintln!("Ready to generate.");
            }
        }
        View::Progress => eprintln!("Generating your portrait..."),
        View::Result { image } => {
            eprintln!("Portrait ready ({}).", image.mime_type());
        }
    }
}

async fn check_credentials(args: CredentialArgs, json_output: bool) -> flag_portrait::Result<()> {
    let client = build_client(args)?;
    client.health_check().await?;

    if json_output {
        let result = serde_json::json!({
            "success": true,
            "provider": client.name(),
            "model": client.model().as_str(),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "API key accepted by {} ({})",
            client.name(),
            client.model().as_str()
        );
    }
    Ok(())
}
