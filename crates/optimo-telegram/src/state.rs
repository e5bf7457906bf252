//! State shared by the webhook, cron and health handlers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono_tz::Tz;
use optimo_core::{CompletionService, TranscriptionService};
use optimo_persistence::{ModeStore, NoteLog, ReminderStore, SharedKv};

use crate::sweeper::Sweeper;
use crate::transport::ChatTransport;

/// Settings the handlers read on every request.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Timezone `HH:MM` reminders are interpreted in.
    pub timezone: Tz,
    /// Lifetime of a reminder delivery lease.
    pub claim_ttl: Duration,
    /// Expected webhook secret header, if any.
    pub webhook_secret: Option<String>,
    /// Expected cron bearer token, if any.
    pub cron_secret: Option<String>,
    /// Bot username, for `/cmd@botname` parsing.
    pub bot_username: String,
    /// Server start time.
    pub start_time: Instant,
}

impl ServerSettings {
    pub fn new(timezone: Tz, claim_ttl: Duration) -> Self {
        Self {
            timezone,
            claim_ttl,
            webhook_secret: None,
            cron_secret: None,
            bot_username: String::new(),
            start_time: Instant::now(),
        }
    }

    /// Returns the server uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// Everything a handler needs, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<ServerSettings>,
    pub transport: Arc<dyn ChatTransport>,
    pub completion: Arc<dyn CompletionService>,
    pub transcriber: Arc<dyn TranscriptionService>,
    pub reminders: ReminderStore,
    pub notes: NoteLog,
    pub modes: ModeStore,
}

impl AppState {
    /// Wires the stores over `kv` and the given services.
    pub fn new(
        settings: ServerSettings,
        kv: SharedKv,
        mode_ttl: Duration,
        transport: Arc<dyn ChatTransport>,
        completion: Arc<dyn CompletionService>,
        transcriber: Arc<dyn TranscriptionService>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            transport,
            completion,
            transcriber,
            reminders: ReminderStore::new(kv.clone()),
            notes: NoteLog::new(kv.clone()),
            modes: ModeStore::new(kv, mode_ttl),
        }
    }

    /// A sweeper over this state's reminders and transport.
    pub fn sweeper(&self) -> Sweeper {
        Sweeper::new(
            self.reminders.clone(),
            self.transport.clone(),
            self.settings.claim_ttl,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings = ServerSettings::new(chrono_tz::UTC, Duration::from_secs(120));
        assert!(settings.webhook_secret.is_none());
        assert!(settings.bot_username.is_empty());
        assert!(settings.uptime_seconds() < 5);
    }
}
