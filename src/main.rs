use std::env;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use weather_bot::{
    chatbot::Chatbot,
    classifier::IntentClassifier,
    config::Settings,
    manager::ModelManager,
    weather::{transport::ReqwestTransport, WeatherLookup},
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // -----------------------------
    // Logging
    // -----------------------------
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("weather_bot=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let settings = Settings::from_env();
    if settings.api_key.is_none() {
        info!("API key not set; weather lookups will fail until it is");
    }

    // -----------------------------
    // Models
    // -----------------------------
    let model_settings = settings.clone();
    let models = tokio::task::spawn_blocking(move || ModelManager::load(&model_settings))
        .await
        .context("model loading task panicked")??;

    let classifier =
        IntentClassifier::new(Arc::new(models))?.with_threshold(settings.threshold);
    let lookup = WeatherLookup::new(ReqwestTransport::new(), &settings);
    let bot = Chatbot::new(classifier, lookup);

    // -----------------------------
    // One-shot or interactive
    // -----------------------------
    let question = env::args().skip(1).collect::<Vec<_>>().join(" ");
    if !question.trim().is_empty() {
        println!("{}", bot.respond(question.trim()).await);
        return Ok(());
    }

    println!("Ask me about the weather. Type 'bye' to quit.");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.eq_ignore_ascii_case("bye") {
            println!("Goodbye!");
            break;
        }

        println!("{}", bot.respond(trimmed).await);
    }

    Ok(())
}
