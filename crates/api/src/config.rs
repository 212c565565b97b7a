use std::path::PathBuf;

use verso_core::error::CoreError;
use verso_core::topic::TopicLexicon;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Postgres connection string. Without it versions are kept in memory.
    pub database_url: Option<String>,
    /// JSON file overriding the built-in topic lexicon.
    pub topic_lexicon_path: Option<PathBuf>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `DATABASE_URL`         | unset (in-memory store)    |
    /// | `TOPIC_LEXICON_PATH`   | unset (built-in lexicon)   |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let database_url = non_empty_var("DATABASE_URL");
        let topic_lexicon_path = non_empty_var("TOPIC_LEXICON_PATH").map(PathBuf::from);

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            database_url,
            topic_lexicon_path,
        }
    }

    /// Load the topic lexicon, from `topic_lexicon_path` when configured.
    pub fn load_topic_lexicon(&self) -> Result<TopicLexicon, CoreError> {
        let Some(path) = &self.topic_lexicon_path else {
            return Ok(TopicLexicon::default());
        };
        let json = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Validation(format!(
                "Cannot read topic lexicon {}: {e}",
                path.display()
            ))
        })?;
        TopicLexicon::from_json(&json)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(topic_lexicon_path: Option<PathBuf>) -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            cors_origins: Vec::new(),
            request_timeout_secs: 30,
            database_url: None,
            topic_lexicon_path,
        }
    }

    #[test]
    fn default_lexicon_without_path() {
        assert_eq!(config(None).load_topic_lexicon().unwrap(), TopicLexicon::default());
    }

    #[test]
    fn lexicon_loaded_from_file() {
        let path = std::env::temp_dir().join(format!("verso-lexicon-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"fallback_label": "misc"}"#).unwrap();

        let lexicon = config(Some(path.clone())).load_topic_lexicon().unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(lexicon.fallback_label, "misc");
        assert_eq!(lexicon.connectives, TopicLexicon::default().connectives);
    }

    #[test]
    fn lexicon_with_blank_fallback_is_rejected() {
        let path = std::env::temp_dir().join(format!("verso-blank-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"fallback_label": "  "}"#).unwrap();

        let result = config(Some(path.clone())).load_topic_lexicon();
        std::fs::remove_file(&path).unwrap();

        assert!(result.is_err());
    }

    #[test]
    fn missing_lexicon_file_is_an_error() {
        let path = PathBuf::from("/definitely/not/here/lexicon.json");
        assert!(config(Some(path)).load_topic_lexicon().is_err());
    }
}
