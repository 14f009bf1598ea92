//! HTTP front end exposing inference + normalisation without persistence.

use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use sentibench::batch::{BatchOptions, Batcher};
use sentibench::cli::{self, ServeArgs};
use sentibench::config::AppConfig;
use sentibench::serve::{self, App};

fn main() -> anyhow::Result<()> {
    cli::init_tracing();
    let args = ServeArgs::parse();
    let config = AppConfig::load(Some(&args.config_path)).with_context(|| {
        format!(
            "failed to load configuration from {}",
            args.config_path.display()
        )
    })?;

    let classifier = config.provider.build_classifier(config.api_token.as_deref());
    let options = BatchOptions {
        truncate_chars: config.inference.truncate_chars,
        pause: config.inference.pause_secs.map(Duration::from_secs),
    };
    let batcher = Batcher::new(classifier, config.provider.label_scheme(), options);

    let addr = args.listen_addr.unwrap_or(config.listen_addr);
    serve::run(&addr, App::new(batcher))
}
