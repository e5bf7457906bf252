//! Bot bootstrap: wiring, webhook registration, serving.

use std::sync::Arc;
use std::time::Duration;

use teloxide::prelude::*;
use tracing::{info, warn};
use url::Url;

use optimo_core::{AssemblyAiTranscriber, BotConfig, OpenAiCompletion};

use crate::error::{BotError, Result};
use crate::server;
use crate::state::{AppState, ServerSettings};
use crate::transport::TeloxideTransport;

/// How the bot should run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Call `setWebhook` before serving (needs `WEBHOOK_URL`).
    pub register_webhook: bool,
    /// Sweep reminders in-process at this period, in addition to `/cron`.
    pub sweep_interval: Option<Duration>,
}

/// The Optimo Telegram bot.
pub struct OptimoBot {
    config: BotConfig,
    transport: TeloxideTransport,
    state: AppState,
}

impl OptimoBot {
    /// Opens the store and builds the service clients. No network calls.
    pub fn new(config: BotConfig) -> Result<Self> {
        let http = optimo_core::http_client(config.http_timeout)?;
        let kv = config.store.open(http.clone())?;

        let transport = TeloxideTransport::new(config.telegram_token.clone(), config.http_timeout)?;
        let completion = OpenAiCompletion::new(http.clone(), config.completion.clone());
        let transcriber = AssemblyAiTranscriber::new(http, config.transcription.clone());

        let mut settings = ServerSettings::new(config.timezone, config.claim_ttl);
        settings.webhook_secret = config.webhook_secret.clone();
        settings.cron_secret = config.cron_secret.clone();

        let state = AppState::new(
            settings,
            kv,
            config.mode_ttl,
            Arc::new(transport.clone()),
            Arc::new(completion),
            Arc::new(transcriber),
        );

        Ok(Self {
            config,
            transport,
            state,
        })
    }

    /// Fetches the bot's username and uses it for command parsing.
    pub async fn get_me(&mut self) -> Result<String> {
        let me = self.transport.bot().get_me().await?;
        let username = me.username().to_string();
        Arc::make_mut(&mut self.state.settings).bot_username = username.clone();
        Ok(username)
    }

    /// The public webhook URL, if one is configured.
    pub fn webhook_url(&self) -> Option<String> {
        self.config
            .webhook_url
            .as_ref()
            .map(|base| format!("{}/webhook", base))
    }

    /// Registers `<WEBHOOK_URL>/webhook` with Telegram.
    pub async fn register_webhook(&self) -> Result<()> {
        let Some(raw) = self.webhook_url() else {
            return Err(BotError::WebhookFailed("WEBHOOK_URL is not set".to_string()));
        };
        let url = Url::parse(&raw).map_err(|e| BotError::WebhookFailed(format!("{}: {}", raw, e)))?;

        let mut req = self.transport.bot().set_webhook(url);
        if let Some(secret) = &self.config.webhook_secret {
            req = req.secret_token(secret.clone());
        }
        req.await
            .map_err(|e| BotError::WebhookFailed(e.to_string()))?;

        info!(url = %raw, "Webhook registered");
        Ok(())
    }

    /// Serves the webhook until Ctrl+C.
    pub async fn run(self, options: RunOptions) -> Result<()> {
        if options.register_webhook {
            self.register_webhook().await?;
        } else {
            info!("Skipping webhook registration");
        }

        let sweep_task = options.sweep_interval.map(|period| {
            info!(
                period_secs = period.as_secs(),
                "Reminders are delivered up to one sweep interval late"
            );
            self.state.sweeper().spawn_loop(period)
        });

        let addr = self.config.bind_address();
        let result = server::serve(&addr, self.state.clone(), shutdown_signal()).await;

        if let Some(task) = sweep_task {
            task.abort();
        }
        info!("Bot stopped");
        result.map_err(BotError::from)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
