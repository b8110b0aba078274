//! Application configuration constants.
//!
//! Engine tuning values live here as constants; the storage backend and
//! server address are loaded at startup from `config.toml`, the environment
//! or defaults, in that order.

use serde::Deserialize;
use std::path::PathBuf;

// ==================== Spaced Repetition ====================

/// Review intervals in days, indexed by repetitions - 1
pub const SR_INTERVALS: [i64; 5] = [1, 3, 7, 14, 30];

/// Interval at which a word can count as mastered
pub const MASTERY_INTERVAL_DAYS: i64 = 30;

/// Minimum success rate for a word to count as mastered
pub const MASTERY_SUCCESS_RATE: f64 = 0.8;

/// Success rate below which a word is flagged as struggling
pub const STRUGGLING_THRESHOLD: f64 = 0.5;

/// A single student's word needs this many attempts before it can be flagged
pub const STRUGGLING_MIN_ATTEMPTS: i64 = 3;

/// Teacher analytics only report words with at least this many attempts overall
pub const ANALYTICS_MIN_ATTEMPTS: i64 = 5;

// ==================== Gamification ====================

/// Minimum XP for each level (level = index + 1)
pub const LEVEL_THRESHOLDS: [u32; 11] = [0, 100, 300, 600, 1000, 1500, 2100, 2800, 3600, 4500, 5500];

/// Base points for difficulties 1..=5
pub const POINTS_BY_DIFFICULTY: [u32; 5] = [10, 20, 30, 40, 50];

/// Base points when the difficulty is outside 1..=5
pub const DEFAULT_POINTS: u32 = 10;

/// Bonus points per streak step
pub const STREAK_BONUS_PER_ANSWER: u32 = 2;

/// Cap on the streak bonus
pub const MAX_STREAK_BONUS: u32 = 20;

/// Correct answers needed for the perfect round and speed demon badges
pub const BADGE_ROUND_SIZE: u32 = 10;

/// Speed demon badge time limit in seconds
pub const SPEED_DEMON_SECONDS: i64 = 30;

// ==================== Exercise Configuration ====================

/// Number of multiple choice options (1 correct + 3 distractors)
pub const OPTION_COUNT: usize = 4;

/// How long wrong-answer feedback stays visible before it is cleared
pub const WRONG_FEEDBACK_DELAY_MS: u64 = 500;

/// Correct-answer delay for exercise kinds that let feedback render first
pub const DELAYED_ADVANCE_MS: u64 = 600;

// ==================== Practice Runs ====================

/// Idle practice runs are dropped after this many hours
pub const PRACTICE_RUN_EXPIRY_HOURS: i64 = 1;

// ==================== Stories ====================

/// Story difficulty when the request leaves it out
pub const DEFAULT_STORY_DIFFICULTY: u8 = 2;

/// Example sentences generated per word unless asked otherwise
pub const DEFAULT_SENTENCE_COUNT: usize = 3;

/// Upper bound on example sentences per request
pub const MAX_SENTENCE_COUNT: usize = 10;

// ==================== Runtime Configuration ====================

/// Configuration file structure for config.toml
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    storage: Option<StorageSection>,
    server: Option<ServerSection>,
}

#[derive(Debug, Default, Deserialize)]
struct StorageSection {
    backend: Option<String>,
    path: Option<String>,
    snapshot: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSection {
    addr: Option<String>,
    port: Option<u16>,
}

/// Which persistence strategy to use
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// In-memory store, optionally snapshotted to a JSON file
    Demo { snapshot: Option<PathBuf> },
    /// Durable SQLite database
    Sqlite { path: PathBuf },
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::Demo { snapshot: None }
    }
}

/// Resolved runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub storage: StorageBackend,
    pub server_addr: String,
    pub server_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageBackend::default(),
            server_addr: DEFAULT_SERVER_ADDR.to_string(),
            server_port: DEFAULT_SERVER_PORT,
        }
    }
}

impl AppConfig {
    /// Get the full server bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server_addr, self.server_port)
    }
}

/// Server address to bind to when nothing is configured
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0";

/// Server port when nothing is configured
pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Default SQLite path when the sqlite backend is chosen without a path
pub const DEFAULT_DATABASE_PATH: &str = "data/vocab.db";

/// Load configuration with priority: config.toml > .env / environment > default
pub fn load_config() -> AppConfig {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let file = std::fs::read_to_string("config.toml")
        .ok()
        .and_then(|contents| match toml::from_str::<ConfigFile>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!("Ignoring malformed config.toml: {}", e);
                None
            }
        })
        .unwrap_or_default();

    resolve(file, |key| std::env::var(key).ok())
}

fn resolve(file: ConfigFile, env: impl Fn(&str) -> Option<String>) -> AppConfig {
    let storage_file = file.storage.unwrap_or_default();
    let server_file = file.server.unwrap_or_default();

    let backend = storage_file
        .backend
        .or_else(|| env("VOCAB_STORAGE"))
        .unwrap_or_else(|| "demo".to_string());

    let storage = match backend.trim().to_lowercase().as_str() {
        "sqlite" => {
            let path = storage_file
                .path
                .or_else(|| env("DATABASE_PATH"))
                .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string());
            tracing::info!("Using sqlite storage at {}", path);
            StorageBackend::Sqlite { path: PathBuf::from(path) }
        }
        other => {
            if other != "demo" {
                tracing::warn!("Unknown storage backend '{}', falling back to demo", other);
            }
            let snapshot = storage_file
                .snapshot
                .or_else(|| env("DEMO_SNAPSHOT"))
                .map(PathBuf::from);
            tracing::info!("Using demo storage (snapshot: {:?})", snapshot);
            StorageBackend::Demo { snapshot }
        }
    };

    let server_addr = server_file
        .addr
        .or_else(|| env("SERVER_ADDR"))
        .unwrap_or_else(|| DEFAULT_SERVER_ADDR.to_string());
    let server_port = server_file
        .port
        .or_else(|| env("SERVER_PORT").and_then(|p| p.parse().ok()))
        .unwrap_or(DEFAULT_SERVER_PORT);

    AppConfig {
        storage,
        server_addr,
        server_port,
    }
}
