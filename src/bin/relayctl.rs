use clap::{Parser, Subcommand};
use prompt_relay::api::models::ImageResult;
use prompt_relay::Config;
use serde_json::{json, Value};

const DEFAULT_RELAY_URL: &str = "http://127.0.0.1:8082";

#[derive(Parser, Debug)]
#[command(name = "relayctl", about = "CLI for the prompt relay", version)]
struct Cli {
    /// Relay base URL (overrides RELAY_URL)
    #[arg(global = true, long)]
    relay_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check that the relay is up
    Health,
    /// Generate an image and print its URL
    Generate {
        /// Prompt describing the image
        prompt: String,
        /// Print the full JSON response instead of the bare URL
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load env and parse CLI
    Config::dotenv_load();
    let cli = Cli::parse();

    let relay_url = cli
        .relay_url
        .or_else(|| std::env::var("RELAY_URL").ok())
        .unwrap_or_else(|| DEFAULT_RELAY_URL.to_string());
    let relay_url = relay_url.trim_end_matches('/');
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Health => {
            let response = client.get(format!("{}/", relay_url)).send().await.map_err(|e| {
                eprintln!("Error: relay unreachable at {}: {}", relay_url, e);
                e
            })?;
            let status = response.status();
            println!("{} {}", status.as_u16(), response.text().await?);
            if !status.is_success() {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Generate { prompt, json } => {
            let response = client
                .post(format!("{}/generate-image", relay_url))
                .json(&json!({ "prompt": prompt }))
                .send()
                .await
                .map_err(|e| {
                    eprintln!("Error: relay unreachable at {}: {}", relay_url, e);
                    e
                })?;

            let status = response.status();
            let text = response.text().await?;
            if !status.is_success() {
                let body: Value = serde_json::from_str(&text).unwrap_or(Value::String(text));
                eprintln!("Error ({}): {}", status.as_u16(), serde_json::to_string_pretty(&body)?);
                std::process::exit(1);
            }

            let result: ImageResult = serde_json::from_str(&text)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", result.image_url);
            }
            Ok(())
        }
    }
}
