use std::sync::Arc;

use anyhow::{Result, bail};

use waypoint::config::Config;
use waypoint::semantic::AnthropicExtractor;
use waypoint::{Category, Parser};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(category), Some(url)) = (args.next(), args.next()) else {
        bail!("usage: waypoint <flight|lodging> <url>");
    };
    let category: Category = category.parse().map_err(anyhow::Error::msg)?;

    // Load configuration and wire the pipeline
    let config = Config::from_env()?;
    let extractor = Arc::new(AnthropicExtractor::new(&config)?);
    let parser = Parser::new(config, extractor)?;

    match parser.parse(category, &url).await {
        Ok(record) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        Err(error) => {
            eprintln!("error ({}): {error}", error.severity().status_hint());
            std::process::exit(1);
        }
    }
}
