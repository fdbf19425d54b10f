use std::env::var;
use std::path::PathBuf;
use tracing::Level;

#[derive(Debug, Clone)]
pub struct Config {
    /// Workspace opened before the first request, if any.
    pub workspace: Option<PathBuf>,
    pub log_level: Level,
    /// Fill absent records from the bundled seed data when a workspace opens.
    pub seed: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace: None,
            log_level: Level::INFO,
            seed: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| var(k).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let workspace = get("TRACKERD_WORKSPACE")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);
        let log_level = get("TRACKERD_LOG")
            .and_then(|s| s.trim().parse::<Level>().ok())
            .unwrap_or(defaults.log_level);
        let seed = get("TRACKERD_SEED")
            .map(|s| !is_false_like(&s))
            .unwrap_or(defaults.seed);
        Self {
            workspace,
            log_level,
            seed,
        }
    }
}

fn is_false_like(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "off" | "no"
    )
}
