use activity::ActivityStore;
use downloader::Downloader;
use std::sync::Arc;
use ::telegram::{telegram, BotConfig, LogBuffer, State};
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "info,teloxide=error,hyper=warn,reqwest=warn";

/// Console output plus a copy of every line in `log_buffer` for /logs
fn init_tracing(log_buffer: &LogBuffer, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let (plain, json) = if json {
        (None, Some(tracing_subscriber::fmt::layer().json()))
    } else {
        (Some(tracing_subscriber::fmt::layer()), None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(plain)
        .with(json)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(log_buffer.clone()),
        )
        .init();
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    let _ = dotenv::dotenv();

    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Please check your settings in the .env file");
            return;
        }
    };

    let log_buffer = LogBuffer::default();
    init_tracing(&log_buffer, config.log_json);

    let store = match ActivityStore::open(&config.database_path) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Failed to open activity database {}: {}", config.database_path.display(), e);
            return;
        }
    };

    let downloader = match Downloader::new(config.downloader_config()) {
        Ok(downloader) => downloader,
        Err(e) => {
            tracing::error!("Failed to initialize downloader: {}", e);
            return;
        }
    };

    if config.admin_ids.is_empty() {
        tracing::warn!("ADMIN_IDS is empty, admin commands are disabled");
    }

    let bot = Bot::new(&config.bot_token);
    if let Err(e) = telegram::set_bot_commands(&bot).await {
        tracing::warn!("Failed to register bot commands: {}", e);
    }

    tracing::info!("Bot started successfully!");

    Dispatcher::builder(bot, telegram::schema())
        .dependencies(dptree::deps![
            InMemStorage::<State>::new(),
            Arc::new(config),
            store,
            downloader,
            log_buffer
        ])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
