use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use directories::BaseDirs;
use reqwest::Url;
use serde::de::Deserializer;
use serde::Deserialize;

use crate::query::DEFAULT_QUIET_PERIOD;
use crate::view::DEFAULT_COUNTRY;

const CONFIG_FILE_NAME: &str = "config.toml";
const LOG_FILE_NAME: &str = "cbrowse.log";
const APP_NAME: &str = "cbrowse";

pub const DEFAULT_ENDPOINT: &str = "https://contact.mediusware.com/api/contacts/?format=json";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone)]
pub struct Config {
    /// File the configuration was read from; `None` when running on defaults
    pub config_path: Option<PathBuf>,
    pub endpoint: String,
    pub debounce: Duration,
    pub request_timeout: Duration,
    /// Country shown by the restricted view
    pub country: String,
    pub log_file: Option<PathBuf>,
    pub keys: Keys,
    pub ui: UiConfig,
    /// Problems found while loading, reported once logging is up
    pub warnings: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            debounce: DEFAULT_QUIET_PERIOD,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            country: DEFAULT_COUNTRY.to_string(),
            log_file: None,
            keys: Keys::default(),
            ui: UiConfig::default(),
            warnings: Vec::new(),
        }
    }
}

// =============================================================================
// UI configuration
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct UiConfig {
    pub colors: UiColors,
}

#[derive(Debug, Clone)]
pub struct UiColors {
    pub border: RgbColor,
    pub selection_bg: RgbColor,
    pub selection_fg: RgbColor,
    pub status_fg: RgbColor,
    pub status_bg: RgbColor,
    pub error_fg: RgbColor,
}

impl Default for UiColors {
    fn default() -> Self {
        Self {
            border: RgbColor::new(255, 165, 0),
            selection_bg: RgbColor::new(255, 165, 0),
            selection_fg: RgbColor::new(0, 0, 0),
            status_fg: RgbColor::new(255, 165, 0),
            status_bg: RgbColor::new(0, 0, 0),
            error_fg: RgbColor::new(255, 80, 80),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    fn from_hex(value: &str) -> Option<Self> {
        let hex = value.trim().trim_start_matches('#');
        if hex.len() != 6 {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(hex.get(range)?, 16).ok();
        Some(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl<'de> Deserialize<'de> for RgbColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Helper {
            Hex(String),
            Array([u8; 3]),
            Map { r: u8, g: u8, b: u8 },
        }

        match Helper::deserialize(deserializer)? {
            Helper::Hex(value) => RgbColor::from_hex(&value)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid hex color `{}`", value))),
            Helper::Array([r, g, b]) => Ok(RgbColor { r, g, b }),
            Helper::Map { r, g, b } => Ok(RgbColor { r, g, b }),
        }
    }
}

// =============================================================================
// Key Bindings - Context-aware with multiple bindings per action
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct Keys {
    pub global: GlobalKeys,
    pub browser: BrowserKeys,
    pub tasks: TaskKeys,
}

/// Keys outside text inputs (landing screen, result list)
#[derive(Debug, Clone)]
pub struct GlobalKeys {
    pub quit: Vec<String>,
    pub next: Vec<String>,
    pub prev: Vec<String>,
    pub confirm: Vec<String>,
}

impl Default for GlobalKeys {
    fn default() -> Self {
        Self {
            quit: vec!["q".into()],
            next: vec!["j".into(), "down".into()],
            prev: vec!["k".into(), "up".into()],
            confirm: vec!["enter".into()],
        }
    }
}

/// Contact modal keys; function keys so they also work while typing
#[derive(Debug, Clone)]
pub struct BrowserKeys {
    pub only_even: Vec<String>,
    pub view_all: Vec<String>,
    pub view_us: Vec<String>,
    pub refresh: Vec<String>,
    pub close: Vec<String>,
    pub focus_results: Vec<String>,
    pub focus_search: Vec<String>,
    pub page_down: Vec<String>,
    pub page_up: Vec<String>,
}

impl Default for BrowserKeys {
    fn default() -> Self {
        Self {
            only_even: vec!["f2".into()],
            view_all: vec!["f3".into()],
            view_us: vec!["f4".into()],
            refresh: vec!["f5".into()],
            close: vec!["esc".into()],
            focus_results: vec!["tab".into(), "down".into()],
            focus_search: vec!["/".into(), "backtab".into()],
            page_down: vec!["pagedown".into()],
            page_up: vec!["pageup".into()],
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskKeys {
    pub next_field: Vec<String>,
    pub prev_field: Vec<String>,
    pub submit: Vec<String>,
    pub show_all: Vec<String>,
    pub show_active: Vec<String>,
    pub show_completed: Vec<String>,
    pub back: Vec<String>,
}

impl Default for TaskKeys {
    fn default() -> Self {
        Self {
            next_field: vec!["tab".into()],
            prev_field: vec!["backtab".into()],
            submit: vec!["enter".into()],
            show_all: vec!["f2".into()],
            show_active: vec!["f3".into()],
            show_completed: vec!["f4".into()],
            back: vec!["esc".into()],
        }
    }
}

// =============================================================================
// Serde deserialization types (support both single string and array)
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum KeyBinding {
    Single(String),
    Multiple(Vec<String>),
}

impl KeyBinding {
    fn into_vec(self) -> Vec<String> {
        match self {
            KeyBinding::Single(s) => vec![s],
            KeyBinding::Multiple(v) => v,
        }
    }
}

fn bindings(file: Option<KeyBinding>, default: Vec<String>) -> Vec<String> {
    file.map(KeyBinding::into_vec).unwrap_or(default)
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    endpoint: Option<String>,
    debounce_ms: Option<u64>,
    request_timeout_secs: Option<u64>,
    country: Option<String>,
    log_file: Option<PathBuf>,
    keys: KeysFile,
    ui: UiFile,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct KeysFile {
    global: GlobalKeysFile,
    browser: BrowserKeysFile,
    tasks: TaskKeysFile,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct GlobalKeysFile {
    quit: Option<KeyBinding>,
    next: Option<KeyBinding>,
    prev: Option<KeyBinding>,
    confirm: Option<KeyBinding>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct BrowserKeysFile {
    only_even: Option<KeyBinding>,
    view_all: Option<KeyBinding>,
    view_us: Option<KeyBinding>,
    refresh: Option<KeyBinding>,
    close: Option<KeyBinding>,
    focus_results: Option<KeyBinding>,
    focus_search: Option<KeyBinding>,
    page_down: Option<KeyBinding>,
    page_up: Option<KeyBinding>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct TaskKeysFile {
    next_field: Option<KeyBinding>,
    prev_field: Option<KeyBinding>,
    submit: Option<KeyBinding>,
    show_all: Option<KeyBinding>,
    show_active: Option<KeyBinding>,
    show_completed: Option<KeyBinding>,
    back: Option<KeyBinding>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct UiFile {
    colors: UiColorsFile,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct UiColorsFile {
    border: Option<RgbColor>,
    selection_bg: Option<RgbColor>,
    selection_fg: Option<RgbColor>,
    status_fg: Option<RgbColor>,
    status_bg: Option<RgbColor>,
    error_fg: Option<RgbColor>,
}

// =============================================================================
// Conversion from file types to runtime types
// =============================================================================

impl From<KeysFile> for Keys {
    fn from(file: KeysFile) -> Self {
        Self {
            global: file.global.into(),
            browser: file.browser.into(),
            tasks: file.tasks.into(),
        }
    }
}

impl From<GlobalKeysFile> for GlobalKeys {
    fn from(file: GlobalKeysFile) -> Self {
        let d = GlobalKeys::default();
        Self {
            quit: bindings(file.quit, d.quit),
            next: bindings(file.next, d.next),
            prev: bindings(file.prev, d.prev),
            confirm: bindings(file.confirm, d.confirm),
        }
    }
}

impl From<BrowserKeysFile> for BrowserKeys {
    fn from(file: BrowserKeysFile) -> Self {
        let d = BrowserKeys::default();
        Self {
            only_even: bindings(file.only_even, d.only_even),
            view_all: bindings(file.view_all, d.view_all),
            view_us: bindings(file.view_us, d.view_us),
            refresh: bindings(file.refresh, d.refresh),
            close: bindings(file.close, d.close),
            focus_results: bindings(file.focus_results, d.focus_results),
            focus_search: bindings(file.focus_search, d.focus_search),
            page_down: bindings(file.page_down, d.page_down),
            page_up: bindings(file.page_up, d.page_up),
        }
    }
}

impl From<TaskKeysFile> for TaskKeys {
    fn from(file: TaskKeysFile) -> Self {
        let d = TaskKeys::default();
        Self {
            next_field: bindings(file.next_field, d.next_field),
            prev_field: bindings(file.prev_field, d.prev_field),
            submit: bindings(file.submit, d.submit),
            show_all: bindings(file.show_all, d.show_all),
            show_active: bindings(file.show_active, d.show_active),
            show_completed: bindings(file.show_completed, d.show_completed),
            back: bindings(file.back, d.back),
        }
    }
}

impl From<UiFile> for UiConfig {
    fn from(file: UiFile) -> Self {
        let d = UiColors::default();
        let c = file.colors;
        Self {
            colors: UiColors {
                border: c.border.unwrap_or(d.border),
                selection_bg: c.selection_bg.unwrap_or(d.selection_bg),
                selection_fg: c.selection_fg.unwrap_or(d.selection_fg),
                status_fg: c.status_fg.unwrap_or(d.status_fg),
                status_bg: c.status_bg.unwrap_or(d.status_bg),
                error_fg: c.error_fg.unwrap_or(d.error_fg),
            },
        }
    }
}

// =============================================================================
// Key binding validation
// =============================================================================

/// Single characters preserve case (since 'M' means Shift+m, different from 'm').
/// Multi-character key names are case-insensitive.
fn normalize_binding(binding: &str) -> String {
    let trimmed = binding.trim();
    if trimmed.chars().count() == 1 {
        trimmed.to_string()
    } else {
        trimmed.to_ascii_lowercase()
    }
}

fn check_context_collisions(bindings: &[(&str, &[String])], context_name: &str) -> Result<()> {
    let mut seen: HashMap<String, &str> = HashMap::new();

    for (action_name, keys) in bindings {
        for key in *keys {
            let normalized = normalize_binding(key);
            if normalized.is_empty() {
                continue;
            }
            if let Some(existing_action) = seen.get(&normalized) {
                bail!(
                    "key binding collision in [keys.{}]: '{}' is bound to both '{}' and '{}'",
                    context_name,
                    key,
                    existing_action,
                    action_name
                );
            }
            seen.insert(normalized, action_name);
        }
    }

    Ok(())
}

fn validate_key_bindings(keys: &Keys) -> Result<()> {
    check_context_collisions(
        &[
            ("quit", &keys.global.quit),
            ("next", &keys.global.next),
            ("prev", &keys.global.prev),
            ("confirm", &keys.global.confirm),
        ],
        "global",
    )?;

    let b = &keys.browser;
    check_context_collisions(
        &[
            ("only_even", &b.only_even),
            ("view_all", &b.view_all),
            ("view_us", &b.view_us),
            ("refresh", &b.refresh),
            ("close", &b.close),
            ("focus_results", &b.focus_results),
            ("page_down", &b.page_down),
            ("page_up", &b.page_up),
        ],
        "browser",
    )?;
    // The search field shortcut is only read from the result list, where
    // the global navigation keys also apply.
    check_context_collisions(
        &[
            ("focus_search", &b.focus_search),
            ("next", &keys.global.next),
            ("prev", &keys.global.prev),
            ("confirm", &keys.global.confirm),
            ("quit", &keys.global.quit),
        ],
        "browser",
    )?;

    let t = &keys.tasks;
    check_context_collisions(
        &[
            ("next_field", &t.next_field),
            ("prev_field", &t.prev_field),
            ("submit", &t.submit),
            ("show_all", &t.show_all),
            ("show_active", &t.show_active),
            ("show_completed", &t.show_completed),
            ("back", &t.back),
        ],
        "tasks",
    )?;

    Ok(())
}

// =============================================================================
// Loading
// =============================================================================

fn config_root() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine base directories")?;
    Ok(base.config_dir().join(APP_NAME))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_root()?.join(CONFIG_FILE_NAME))
}

/// Default log location inside the platform data directory.
pub fn default_log_file() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine base directories")?;
    Ok(base.data_dir().join(APP_NAME).join(LOG_FILE_NAME))
}

/// Expand ~ to home directory in paths
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = home::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

/// Load configuration.
///
/// An explicit path must exist. Without one, the default location is used
/// when present and built-in defaults otherwise.
pub fn load(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                bail!("configuration file not found at {}", path.display());
            }
            path.to_path_buf()
        }
        None => {
            let path = config_path()?;
            if !path.exists() {
                return Ok(Config::default());
            }
            path
        }
    };

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read configuration file at {}", path.display()))?;
    let mut config =
        parse(&raw).with_context(|| format!("invalid configuration in {}", path.display()))?;
    config.config_path = Some(path);
    Ok(config)
}

/// Parse configuration from TOML text.
pub fn parse(raw: &str) -> Result<Config> {
    let value: toml::Value = toml::from_str(raw).context("failed to parse configuration as TOML")?;

    let mut warnings = Vec::new();
    warn_unknown_keys(&value, &mut warnings);

    let file: ConfigFile = value
        .try_into()
        .context("failed to deserialize configuration")?;

    let endpoint = file
        .endpoint
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
    let parsed = Url::parse(&endpoint).map_err(|err| anyhow!("invalid `endpoint` {}: {}", endpoint, err))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("`endpoint` must be an http or https URL, got {}", endpoint);
    }

    let debounce = match file.debounce_ms {
        Some(0) => bail!("`debounce_ms` must be greater than zero"),
        Some(ms) => Duration::from_millis(ms),
        None => DEFAULT_QUIET_PERIOD,
    };

    let request_timeout = match file.request_timeout_secs {
        Some(0) => bail!("`request_timeout_secs` must be greater than zero"),
        Some(secs) => Duration::from_secs(secs),
        None => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
    };

    let country = file
        .country
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_COUNTRY.to_string());

    let keys: Keys = file.keys.into();
    validate_key_bindings(&keys)?;

    Ok(Config {
        config_path: None,
        endpoint,
        debounce,
        request_timeout,
        country,
        log_file: file.log_file.as_deref().map(expand_tilde),
        keys,
        ui: file.ui.into(),
        warnings,
    })
}

// =============================================================================
// Unknown key warnings
// =============================================================================

const KNOWN_TOP_LEVEL: &[&str] = &[
    "endpoint",
    "debounce_ms",
    "request_timeout_secs",
    "country",
    "log_file",
    "keys",
    "ui",
];
const KNOWN_KEY_CONTEXTS: &[&str] = &["global", "browser", "tasks"];
const KNOWN_GLOBAL_KEYS: &[&str] = &["quit", "next", "prev", "confirm"];
const KNOWN_BROWSER_KEYS: &[&str] = &[
    "only_even",
    "view_all",
    "view_us",
    "refresh",
    "close",
    "focus_results",
    "focus_search",
    "page_down",
    "page_up",
];
const KNOWN_TASK_KEYS: &[&str] = &[
    "next_field",
    "prev_field",
    "submit",
    "show_all",
    "show_active",
    "show_completed",
    "back",
];
const KNOWN_UI: &[&str] = &["colors"];
const KNOWN_UI_COLORS: &[&str] = &[
    "border",
    "selection_bg",
    "selection_fg",
    "status_fg",
    "status_bg",
    "error_fg",
];

fn warn_unknown_keys(value: &toml::Value, warnings: &mut Vec<String>) {
    warn_unknown_in(value, "", KNOWN_TOP_LEVEL, warnings);

    if let Some(keys) = value.get("keys") {
        warn_unknown_in(keys, "keys", KNOWN_KEY_CONTEXTS, warnings);
        for (context, known) in [
            ("global", KNOWN_GLOBAL_KEYS),
            ("browser", KNOWN_BROWSER_KEYS),
            ("tasks", KNOWN_TASK_KEYS),
        ] {
            if let Some(section) = keys.get(context) {
                warn_unknown_in(section, &format!("keys.{}", context), known, warnings);
            }
        }
    }

    if let Some(ui) = value.get("ui") {
        warn_unknown_in(ui, "ui", KNOWN_UI, warnings);
        if let Some(colors) = ui.get("colors") {
            warn_unknown_in(colors, "ui.colors", KNOWN_UI_COLORS, warnings);
        }
    }
}

fn warn_unknown_in(value: &toml::Value, context: &str, known: &[&str], warnings: &mut Vec<String>) {
    let Some(table) = value.as_table() else {
        return;
    };
    for key in table.keys() {
        if !known.contains(&key.as_str()) {
            let message = if context.is_empty() {
                format!("unknown configuration key `{}`", key)
            } else {
                format!("unknown configuration key `{}` in [{}]", key, context)
            };
            warnings.push(message);
        }
    }
}
