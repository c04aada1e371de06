use std::env;
use std::path::PathBuf;

/// Path of the SQLite document store. Unset means persistence is disabled and
/// the board runs on in-memory seed data only.
pub const ENV_DATABASE: &str = "ROOMBOARD_DATABASE";
/// Set to `0` or `false` to let empty workers/rooms snapshots replace the
/// cached (seed) data instead of being ignored.
pub const ENV_RETAIN_SEED: &str = "ROOMBOARD_RETAIN_SEED";

#[derive(Debug, Clone)]
pub struct BoardConfig {
    pub database: Option<PathBuf>,
    /// Ignore empty incoming snapshots for the workers and rooms collections,
    /// so seed data survives until the external store is populated. Masks a
    /// legitimate delete-all as "no change"; flip off for strict replace
    /// semantics.
    pub retain_seed_on_empty: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig {
            database: None,
            retain_seed_on_empty: true,
        }
    }
}

impl BoardConfig {
    pub fn from_env() -> Self {
        let database = env::var(ENV_DATABASE)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        let retain_seed_on_empty = env::var(ENV_RETAIN_SEED)
            .map(|value| !matches!(value.trim(), "0" | "false" | "FALSE"))
            .unwrap_or(true);
        BoardConfig {
            database,
            retain_seed_on_empty,
        }
    }

    pub fn in_memory() -> Self {
        BoardConfig::default()
    }

    pub fn with_database(path: impl Into<PathBuf>) -> Self {
        BoardConfig {
            database: Some(path.into()),
            ..BoardConfig::default()
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.database.is_some()
    }
}
