use serde::{Deserialize, Serialize};

/// Top-level configuration of the linkshelf daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppSettings {
    pub database_path: String,
    pub storage: StorageSettings,
    pub favicon: FaviconSettings,
    pub ranking: RankingSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            database_path: "linkshelf.db".to_string(),
            storage: StorageSettings::default(),
            favicon: FaviconSettings::default(),
            ranking: RankingSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

/// Where favicon images are kept. Exactly one backend is active.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StorageSettings {
    Local {
        directory: String,
    },
    S3 {
        bucket: String,
        region: String,
        #[serde(default)]
        endpoint: Option<String>,
        #[serde(default)]
        prefix: Option<String>,
    },
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings::Local {
            directory: "favicons".to_string(),
        }
    }
}

/// Favicon pipeline tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FaviconSettings {
    pub page_timeout_secs: u64,
    pub icon_timeout_secs: u64,
    pub lookup_timeout_secs: u64,
    /// Lookup service URL; `{domain}` is replaced by the page host.
    pub lookup_service_url: String,
    pub user_agent: String,
    pub max_body_bytes: usize,
}

impl Default for FaviconSettings {
    fn default() -> Self {
        Self {
            page_timeout_secs: 5,
            icon_timeout_secs: 5,
            lookup_timeout_secs: 3,
            lookup_service_url: "https://www.google.com/s2/favicons?domain={domain}&sz=128"
                .to_string(),
            user_agent: format!("linkshelf/{}", env!("CARGO_PKG_VERSION")),
            max_body_bytes: 5 * 1024 * 1024,
        }
    }
}

/// Ranking cache and scheduled job settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankingSettings {
    pub top_n: usize,
    /// Six-field cron expression (seconds first).
    pub rebuild_cron: String,
    pub cleanup_cron: String,
    pub rebuild_on_startup: bool,
    pub title_timeout_secs: u64,
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            top_n: 100,
            rebuild_cron: "0 0 4 * * *".to_string(),
            cleanup_cron: "0 0 3 * * *".to_string(),
            rebuild_on_startup: true,
            title_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
