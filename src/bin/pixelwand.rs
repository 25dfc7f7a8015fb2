//! CLI for PixelWand - AI photo editing.

use clap::{Args, Parser, Subcommand, ValueEnum};
use pixelwand::{edit_with, EditClient, EditSession, GeminiEditClient, GeminiModel, SessionStatus};
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pixelwand")]
#[command(about = "Edit photos with natural-language instructions via Gemini")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Edit an image according to a text instruction
    Edit(EditArgs),
}

#[derive(Args)]
struct EditArgs {
    /// Path to the image to edit (JPEG, PNG or WEBP)
    input: PathBuf,

    /// What to change, in plain language
    instruction: String,

    /// Output file path
    #[arg(short, long, default_value = pixelwand::DOWNLOAD_FILE_NAME)]
    output: PathBuf,

    /// Model variant to use
    #[arg(long, value_enum, default_value = "flash")]
    model: ModelArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    Flash,
    Pro,
}

impl From<ModelArg> for GeminiModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Flash => GeminiModel::FlashImage,
            ModelArg::Pro => GeminiModel::ProImage,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Edit(args) => run_edit(args, cli.json).await,
    }
}

async fn run_edit(args: EditArgs, json_output: bool) -> anyhow::Result<()> {
    let client = GeminiEditClient::builder().model(args.model.into()).build();

    let session = Mutex::new(EditSession::new());
    let photo = pixelwand::ingest(&args.input).await?;
    session.lock().await.set_original(photo);

    if let Err(rejected) = edit_with(&session, &client, &args.instruction).await {
        anyhow::bail!("{rejected}");
    }

    let session = session.lock().await;
    match session.status() {
        SessionStatus::Succeeded { message } => {
            let edited = session
                .edited()
                .expect("succeeded session always holds an edited image");
            edited.save(&args.output)?;

            if json_output {
                let result = serde_json::json!({
                    "success": true,
                    "output": args.output.display().to_string(),
                    "size_bytes": edited.size(),
                    "mime_type": edited.mime_type(),
                    "model": client.model(),
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!(
                    "{} Saved {} ({} bytes, {})",
                    message,
                    args.output.display(),
                    edited.size(),
                    edited.mime_type()
                );
            }
            Ok(())
        }
        SessionStatus::Failed { error } => {
            if json_output {
                let result = serde_json::json!({ "success": false, "error": error });
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
            anyhow::bail!("{error}")
        }
        other => anyhow::bail!("edit ended in unexpected state: {other:?}"),
    }
}
