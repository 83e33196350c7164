use crate::error::{config_error, env_error, SoonlyResult};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Default settings document location
pub const DEFAULT_SETTINGS_FILE: &str = "config.json";
/// Default event cache location
pub const DEFAULT_CACHE_FILE: &str = "events_cache.json";
/// Default OAuth token location
pub const DEFAULT_TOKEN_FILE: &str = "token.json";

/// Smallest window the overlay can be resized to
pub const MIN_WINDOW_WIDTH: i32 = 200;
pub const MIN_WINDOW_HEIGHT: i32 = 150;

/// Runtime configuration, read from the environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Google Calendar API client ID
    pub google_client_id: String,
    /// Google Calendar API client secret
    pub google_client_secret: String,
    /// Path of the JSON settings document
    pub settings_file: PathBuf,
    /// Path of the cached event list
    pub cache_file: PathBuf,
    /// Path of the OAuth token
    pub token_file: PathBuf,
    /// Seconds between provider refreshes
    pub refresh_interval: u64,
    /// Milliseconds between display recomputations
    pub tick_millis: u64,
    /// Number of events requested from the provider
    pub event_count: usize,
    /// Maximum events fetched from each calendar
    pub per_calendar_limit: usize,
    /// Locale for overlay text
    pub locale: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            google_client_id: String::new(),
            google_client_secret: String::new(),
            settings_file: PathBuf::from(DEFAULT_SETTINGS_FILE),
            cache_file: PathBuf::from(DEFAULT_CACHE_FILE),
            token_file: PathBuf::from(DEFAULT_TOKEN_FILE),
            refresh_interval: 300,
            tick_millis: 1000,
            event_count: 10,
            per_calendar_limit: 10,
            locale: String::from("en"),
        }
    }
}

impl Config {
    /// Load configuration from the environment (and `.env` if present)
    pub fn load() -> SoonlyResult<Self> {
        dotenv().ok();

        let defaults = Config::default();

        let google_client_id =
            env::var("GOOGLE_CLIENT_ID").map_err(|_| env_error("GOOGLE_CLIENT_ID"))?;
        let google_client_secret =
            env::var("GOOGLE_CLIENT_SECRET").map_err(|_| env_error("GOOGLE_CLIENT_SECRET"))?;

        let settings_file = env::var("SOONLY_SETTINGS_FILE")
            .map(PathBuf::from)
            .unwrap_or(defaults.settings_file);
        let cache_file = env::var("SOONLY_CACHE_FILE")
            .map(PathBuf::from)
            .unwrap_or(defaults.cache_file);
        let token_file = env::var("SOONLY_TOKEN_FILE")
            .map(PathBuf::from)
            .unwrap_or(defaults.token_file);

        let refresh_interval = parse_var("SOONLY_REFRESH_INTERVAL", defaults.refresh_interval)?;
        let tick_millis = parse_var("SOONLY_TICK_MILLIS", defaults.tick_millis)?;
        let event_count = parse_var("SOONLY_EVENT_COUNT", defaults.event_count)?;
        let per_calendar_limit =
            parse_var("SOONLY_PER_CALENDAR_LIMIT", defaults.per_calendar_limit)?;

        if refresh_interval == 0 || tick_millis == 0 {
            return Err(config_error("Refresh and tick intervals must be positive"));
        }

        let locale = env::var("SOONLY_LOCALE").unwrap_or(defaults.locale);

        Ok(Config {
            google_client_id,
            google_client_secret,
            settings_file,
            cache_file,
            token_file,
            refresh_interval,
            tick_millis,
            event_count,
            per_calendar_limit,
            locale,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> SoonlyResult<T> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| config_error(&format!("Invalid {} value: {}", name, raw))),
        Err(_) => Ok(default),
    }
}

/// The persisted settings document (`config.json`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_transparency")]
    pub transparency: f64,
    #[serde(default = "default_win_x")]
    pub win_x: i32,
    #[serde(default = "default_win_y")]
    pub win_y: i32,
    #[serde(default = "default_win_width")]
    pub win_width: i32,
    #[serde(default = "default_win_height")]
    pub win_height: i32,
    /// Event titles hidden from the overlay (exact match on the trimmed title)
    #[serde(default)]
    pub excluded_titles: Vec<String>,
    /// Calendars to fetch events from
    #[serde(default)]
    pub calendar_ids: Vec<String>,
    /// Event summaries dropped at fetch time
    #[serde(default)]
    pub exclude_keywords: Vec<String>,
    /// Keys we don't know about, kept so saving doesn't lose them
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_transparency() -> f64 {
    0.9
}

fn default_win_x() -> i32 {
    100
}

fn default_win_y() -> i32 {
    100
}

fn default_win_width() -> i32 {
    400
}

fn default_win_height() -> i32 {
    320
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            transparency: default_transparency(),
            win_x: default_win_x(),
            win_y: default_win_y(),
            win_width: default_win_width(),
            win_height: default_win_height(),
            excluded_titles: Vec::new(),
            calendar_ids: Vec::new(),
            exclude_keywords: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl Settings {
    /// Window geometry as `(x, y, width, height)`
    pub fn window_geometry(&self) -> (i32, i32, i32, i32) {
        (self.win_x, self.win_y, self.win_width, self.win_height)
    }
}

/// Persistence for [`Settings`]
pub trait ConfigStore: Send + Sync {
    /// Load the settings, falling back to defaults when nothing usable is stored
    fn load(&self) -> SoonlyResult<Settings>;

    /// Replace the stored settings
    fn save(&self, settings: &Settings) -> SoonlyResult<()>;

    /// Load, modify and save in one step
    fn update(&self, change: &mut dyn FnMut(&mut Settings)) -> SoonlyResult<Settings> {
        let mut settings = self.load()?;
        change(&mut settings);
        self.save(&settings)?;
        Ok(settings)
    }

    /// Window opacity for windowed front-ends, clamped to `0.0..=1.0`.
    /// The terminal overlay stores it but doesn't draw with it.
    fn set_transparency(&self, value: f64) -> SoonlyResult<Settings> {
        let value = if value.is_finite() { value.clamp(0.0, 1.0) } else { default_transparency() };
        self.update(&mut |s| s.transparency = value)
    }

    /// Window position and size, never smaller than the minimum window
    fn set_window_geometry(&self, x: i32, y: i32, width: i32, height: i32) -> SoonlyResult<Settings> {
        self.update(&mut |s| {
            s.win_x = x;
            s.win_y = y;
            s.win_width = width.max(MIN_WINDOW_WIDTH);
            s.win_height = height.max(MIN_WINDOW_HEIGHT);
        })
    }

    fn set_calendar_ids(&self, calendar_ids: Vec<String>) -> SoonlyResult<Settings> {
        self.update(&mut |s| s.calendar_ids = calendar_ids.clone())
    }

    fn set_excluded_titles(&self, titles: Vec<String>) -> SoonlyResult<Settings> {
        self.update(&mut |s| s.excluded_titles = titles.clone())
    }
}

/// Settings stored as a pretty-printed JSON file
#[derive(Debug, Clone)]
pub struct JsonConfigStore {
    path: PathBuf,
}

impl JsonConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for JsonConfigStore {
    fn load(&self) -> SoonlyResult<Settings> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Settings::default()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<Settings>(&content) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                warn!("Ignoring unreadable settings file {}: {}", self.path.display(), e);
                Ok(Settings::default())
            }
        }
    }

    fn save(&self, settings: &Settings) -> SoonlyResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, json)?;

        Ok(())
    }
}
