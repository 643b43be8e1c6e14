use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use directories::BaseDirs;
use serde::de::Deserializer;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::db::Database;
use crate::listing::ListLabels;

const CONFIG_FILE_NAME: &str = "config.toml";
const LOG_FILE_NAME: &str = "rolo.log";
const APP_NAME: &str = "rolo";

#[derive(Debug, Clone)]
pub struct Config {
    /// File the configuration was read from, if any
    pub config_path: Option<PathBuf>,
    pub db_path: PathBuf,
    pub loader: LoaderConfig,
    pub keys: Keys,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Default)]
pub struct LoaderConfig {
    /// Added before every route load; makes the spinner visible
    pub latency: Duration,
}

// =============================================================================
// UI configuration
// =============================================================================

#[derive(Debug, Clone)]
pub struct UiConfig {
    pub colors: UiColors,
    pub labels: ListLabels,
    pub sidebar_width: u16,
}

#[derive(Debug, Clone)]
pub struct UiColors {
    pub border: RgbColor,
    pub selection_bg: RgbColor,
    pub selection_fg: RgbColor,
    pub separator: RgbColor,
    pub status_fg: RgbColor,
    pub status_bg: RgbColor,
    pub error_fg: RgbColor,
    pub active_fg: RgbColor,
    pub pending_fg: RgbColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

// =============================================================================
// Key Bindings - Context-aware with multiple bindings per action
// =============================================================================

/// All key bindings organized by context
#[derive(Debug, Clone)]
pub struct Keys {
    /// Keys that work whenever no text field has focus
    pub global: GlobalKeys,
    pub search_input: SearchInputKeys,
    pub list: ListKeys,
    pub detail: DetailKeys,
    pub editor: EditorKeys,
}

#[derive(Debug, Clone)]
pub struct GlobalKeys {
    pub quit: Vec<String>,
    pub search: Vec<String>,
    pub new: Vec<String>,
    pub back: Vec<String>,
    pub forward: Vec<String>,
    /// Reload the current location in place
    pub reload: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SearchInputKeys {
    /// Leave the search box for the list
    pub cancel: Vec<String>,
    /// Open the highlighted contact
    pub confirm: Vec<String>,
    pub next: Vec<String>,
    pub prev: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ListKeys {
    pub open: Vec<String>,
    pub next: Vec<String>,
    pub prev: Vec<String>,
    pub focus_detail: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DetailKeys {
    pub edit: Vec<String>,
    pub delete: Vec<String>,
    pub favorite: Vec<String>,
    pub focus_list: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct EditorKeys {
    pub save: Vec<String>,
    pub cancel: Vec<String>,
    pub next: Vec<String>,
    pub prev: Vec<String>,
}

impl Default for GlobalKeys {
    fn default() -> Self {
        Self {
            quit: vec!["q".into()],
            search: vec!["/".into()],
            new: vec!["n".into()],
            back: vec!["[".into(), "Backspace".into()],
            forward: vec!["]".into()],
            reload: vec!["r".into()],
        }
    }
}

impl Default for SearchInputKeys {
    fn default() -> Self {
        Self {
            cancel: vec!["Escape".into()],
            confirm: vec!["Enter".into()],
            next: vec!["Down".into(), "Tab".into()],
            prev: vec!["Up".into(), "Backtab".into()],
        }
    }
}

impl Default for ListKeys {
    fn default() -> Self {
        Self {
            open: vec!["Enter".into(), "l".into()],
            next: vec!["j".into(), "Down".into()],
            prev: vec!["k".into(), "Up".into()],
            focus_detail: vec!["Tab".into()],
        }
    }
}

impl Default for DetailKeys {
    fn default() -> Self {
        Self {
            edit: vec!["e".into()],
            delete: vec!["d".into()],
            favorite: vec!["f".into()],
            focus_list: vec!["Tab".into(), "h".into(), "Escape".into()],
        }
    }
}

impl Default for EditorKeys {
    fn default() -> Self {
        Self {
            save: vec!["Enter".into()],
            cancel: vec!["Escape".into()],
            next: vec!["Tab".into(), "Down".into()],
            prev: vec!["Backtab".into(), "Up".into()],
        }
    }
}

impl Default for Keys {
    fn default() -> Self {
        Self {
            global: GlobalKeys::default(),
            search_input: SearchInputKeys::default(),
            list: ListKeys::default(),
            detail: DetailKeys::default(),
            editor: EditorKeys::default(),
        }
    }
}

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

impl Default for KeyBinding {
    fn default() -> Self {
        KeyBinding::Multiple(vec![])
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct KeysFile {
    global: GlobalKeysFile,
    search_input: SearchInputKeysFile,
    list: ListKeysFile,
    detail: DetailKeysFile,
    editor: EditorKeysFile,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct GlobalKeysFile {
    quit: KeyBinding,
    search: KeyBinding,
    new: KeyBinding,
    back: KeyBinding,
    forward: KeyBinding,
    reload: KeyBinding,
}

impl Default for GlobalKeysFile {
    fn default() -> Self {
        let defaults = GlobalKeys::default();
        Self {
            quit: KeyBinding::Multiple(defaults.quit),
            search: KeyBinding::Multiple(defaults.search),
            new: KeyBinding::Multiple(defaults.new),
            back: KeyBinding::Multiple(defaults.back),
            forward: KeyBinding::Multiple(defaults.forward),
            reload: KeyBinding::Multiple(defaults.reload),
        }
    }
}

impl From<GlobalKeysFile> for GlobalKeys {
    fn from(file: GlobalKeysFile) -> Self {
        Self {
            quit: file.quit.into_vec(),
            search: file.search.into_vec(),
            new: file.new.into_vec(),
            back: file.back.into_vec(),
            forward: file.forward.into_vec(),
            reload: file.reload.into_vec(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SearchInputKeysFile {
    cancel: KeyBinding,
    confirm: KeyBinding,
    next: KeyBinding,
    prev: KeyBinding,
}

impl Default for SearchInputKeysFile {
    fn default() -> Self {
        let defaults = SearchInputKeys::default();
        Self {
            cancel: KeyBinding::Multiple(defaults.cancel),
            confirm: KeyBinding::Multiple(defaults.confirm),
            next: KeyBinding::Multiple(defaults.next),
            prev: KeyBinding::Multiple(defaults.prev),
        }
    }
}

impl From<SearchInputKeysFile> for SearchInputKeys {
    fn from(file: SearchInputKeysFile) -> Self {
        Self {
            cancel: file.cancel.into_vec(),
            confirm: file.confirm.into_vec(),
            next: file.next.into_vec(),
            prev: file.prev.into_vec(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ListKeysFile {
    open: KeyBinding,
    next: KeyBinding,
    prev: KeyBinding,
    focus_detail: KeyBinding,
}

impl Default for ListKeysFile {
    fn default() -> Self {
        let defaults = ListKeys::default();
        Self {
            open: KeyBinding::Multiple(defaults.open),
            next: KeyBinding::Multiple(defaults.next),
            prev: KeyBinding::Multiple(defaults.prev),
            focus_detail: KeyBinding::Multiple(defaults.focus_detail),
        }
    }
}

impl From<ListKeysFile> for ListKeys {
    fn from(file: ListKeysFile) -> Self {
        Self {
            open: file.open.into_vec(),
            next: file.next.into_vec(),
            prev: file.prev.into_vec(),
            focus_detail: file.focus_detail.into_vec(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DetailKeysFile {
    edit: KeyBinding,
    delete: KeyBinding,
    favorite: KeyBinding,
    focus_list: KeyBinding,
}

impl Default for DetailKeysFile {
    fn default() -> Self {
        let defaults = DetailKeys::default();
        Self {
            edit: KeyBinding::Multiple(defaults.edit),
            delete: KeyBinding::Multiple(defaults.delete),
            favorite: KeyBinding::Multiple(defaults.favorite),
            focus_list: KeyBinding::Multiple(defaults.focus_list),
        }
    }
}

impl From<DetailKeysFile> for DetailKeys {
    fn from(file: DetailKeysFile) -> Self {
        Self {
            edit: file.edit.into_vec(),
            delete: file.delete.into_vec(),
            favorite: file.favorite.into_vec(),
            focus_list: file.focus_list.into_vec(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct EditorKeysFile {
    save: KeyBinding,
    cancel: KeyBinding,
    next: KeyBinding,
    prev: KeyBinding,
}

impl Default for EditorKeysFile {
    fn default() -> Self {
        let defaults = EditorKeys::default();
        Self {
            save: KeyBinding::Multiple(defaults.save),
            cancel: KeyBinding::Multiple(defaults.cancel),
            next: KeyBinding::Multiple(defaults.next),
            prev: KeyBinding::Multiple(defaults.prev),
        }
    }
}

impl From<EditorKeysFile> for EditorKeys {
    fn from(file: EditorKeysFile) -> Self {
        Self {
            save: file.save.into_vec(),
            cancel: file.cancel.into_vec(),
            next: file.next.into_vec(),
            prev: file.prev.into_vec(),
        }
    }
}

impl From<KeysFile> for Keys {
    fn from(file: KeysFile) -> Self {
        Self {
            global: file.global.into(),
            search_input: file.search_input.into(),
            list: file.list.into(),
            detail: file.detail.into(),
            editor: file.editor.into(),
        }
    }
}

// =============================================================================
// Key binding validation
// =============================================================================

/// Canonical form for collision detection. Single characters keep their case
/// ('N' is Shift+n); key names are case-insensitive.
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

/// Global keys are live in the list and detail contexts, so they are
/// checked together with each of them.
fn validate_key_bindings(keys: &Keys) -> Result<()> {
    let global: [(&str, &[String]); 6] = [
        ("quit", &keys.global.quit),
        ("search", &keys.global.search),
        ("new", &keys.global.new),
        ("back", &keys.global.back),
        ("forward", &keys.global.forward),
        ("reload", &keys.global.reload),
    ];

    let mut list = global.to_vec();
    list.extend([
        ("open", keys.list.open.as_slice()),
        ("next", keys.list.next.as_slice()),
        ("prev", keys.list.prev.as_slice()),
        ("focus_detail", keys.list.focus_detail.as_slice()),
    ]);
    check_context_collisions(&list, "list")?;

    let mut detail = global.to_vec();
    detail.extend([
        ("edit", keys.detail.edit.as_slice()),
        ("delete", keys.detail.delete.as_slice()),
        ("favorite", keys.detail.favorite.as_slice()),
        ("focus_list", keys.detail.focus_list.as_slice()),
    ]);
    check_context_collisions(&detail, "detail")?;

    check_context_collisions(
        &[
            ("cancel", &keys.search_input.cancel),
            ("confirm", &keys.search_input.confirm),
            ("next", &keys.search_input.next),
            ("prev", &keys.search_input.prev),
        ],
        "search_input",
    )?;

    check_context_collisions(
        &[
            ("save", &keys.editor.save),
            ("cancel", &keys.editor.cancel),
            ("next", &keys.editor.next),
            ("prev", &keys.editor.prev),
        ],
        "editor",
    )?;

    Ok(())
}

// =============================================================================
// Config file structure
// =============================================================================

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    db_path: Option<PathBuf>,
    loader: LoaderFile,
    keys: KeysFile,
    ui: UiFile,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct LoaderFile {
    latency_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct UiFile {
    colors: UiColorsFile,
    labels: UiLabelsFile,
    sidebar_width: u16,
}

impl Default for UiFile {
    fn default() -> Self {
        Self {
            colors: UiColorsFile::default(),
            labels: UiLabelsFile::default(),
            sidebar_width: 34,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct UiColorsFile {
    border: RgbColor,
    selection_bg: RgbColor,
    selection_fg: RgbColor,
    separator: RgbColor,
    status_fg: RgbColor,
    status_bg: RgbColor,
    error_fg: RgbColor,
    active_fg: RgbColor,
    pending_fg: RgbColor,
}

impl Default for UiColorsFile {
    fn default() -> Self {
        Self {
            border: RgbColor::new(255, 165, 0),
            selection_bg: RgbColor::new(255, 165, 0),
            selection_fg: RgbColor::new(0, 0, 0),
            separator: RgbColor::new(255, 165, 0),
            status_fg: RgbColor::new(255, 165, 0),
            status_bg: RgbColor::new(0, 0, 0),
            error_fg: RgbColor::new(255, 85, 85),
            active_fg: RgbColor::new(255, 165, 0),
            pending_fg: RgbColor::new(128, 128, 128),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct UiLabelsFile {
    no_name: String,
    favorite: String,
    empty: String,
}

impl Default for UiLabelsFile {
    fn default() -> Self {
        let defaults = ListLabels::default();
        Self {
            no_name: defaults.no_name,
            favorite: defaults.favorite,
            empty: defaults.empty,
        }
    }
}

impl From<UiFile> for UiConfig {
    fn from(file: UiFile) -> Self {
        let colors = file.colors;
        Self {
            colors: UiColors {
                border: colors.border,
                selection_bg: colors.selection_bg,
                selection_fg: colors.selection_fg,
                separator: colors.separator,
                status_fg: colors.status_fg,
                status_bg: colors.status_bg,
                error_fg: colors.error_fg,
                active_fg: colors.active_fg,
                pending_fg: colors.pending_fg,
            },
            labels: ListLabels {
                no_name: file.labels.no_name,
                favorite: file.labels.favorite,
                empty: file.labels.empty,
            },
            sidebar_width: if file.sidebar_width < 16 {
                16
            } else {
                file.sidebar_width
            },
        }
    }
}

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl<'de> serde::Deserialize<'de> for RgbColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Helper {
            Array([u8; 3]),
            Map { r: u8, g: u8, b: u8 },
        }

        let helper = Helper::deserialize(deserializer)?;
        let (r, g, b) = match helper {
            Helper::Array(values) => (values[0], values[1], values[2]),
            Helper::Map { r, g, b } => (r, g, b),
        };
        Ok(RgbColor { r, g, b })
    }
}

// =============================================================================
// Loading
// =============================================================================

fn config_root() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine base directories")?;
    Ok(base.config_dir().join(APP_NAME))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_root()?.join(CONFIG_FILE_NAME))
}

/// `<data dir>/rolo/rolo.log`
pub fn default_log_path() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine data directories")?;
    Ok(base.data_dir().join(APP_NAME).join(LOG_FILE_NAME))
}

/// Load configuration.
///
/// An explicit `path` must exist. Without one, the default location is
/// tried and defaults are used when nothing is there.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let (path, required) = match path {
        Some(path) => (Some(path.to_path_buf()), true),
        None => (default_config_path().ok(), false),
    };

    let existing = path.filter(|p| {
        if p.exists() {
            return true;
        }
        debug!(path = %p.display(), "no configuration file");
        false
    });

    let (cfg_file, config_path) = match existing {
        Some(path) => (read_config_file(&path)?, Some(path)),
        None if required => bail!("configuration file not found"),
        None => (ConfigFile::default(), None),
    };

    build_config(cfg_file, config_path)
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration file at {}", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}

fn parse_config_str(raw: &str) -> Result<ConfigFile> {
    let value: toml::Value = toml::from_str(raw).context("failed to parse TOML")?;
    warn_unknown_keys(&value);
    let cfg_file: ConfigFile = value
        .try_into()
        .context("failed to deserialize configuration")?;
    Ok(cfg_file)
}

fn build_config(cfg_file: ConfigFile, config_path: Option<PathBuf>) -> Result<Config> {
    let db_path = match cfg_file.db_path {
        Some(path) => expand_tilde(&path),
        None => Database::default_path()?,
    };

    let keys: Keys = cfg_file.keys.into();
    validate_key_bindings(&keys)?;

    Ok(Config {
        config_path,
        db_path,
        loader: LoaderConfig {
            latency: Duration::from_millis(cfg_file.loader.latency_ms),
        },
        keys,
        ui: cfg_file.ui.into(),
    })
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

fn warn_unknown_keys(value: &toml::Value) {
    let Some(table) = value.as_table() else {
        return;
    };

    let known = HashSet::from(["db_path", "loader", "keys", "ui"]);
    for key in table.keys() {
        if !known.contains(key.as_str()) {
            warn!("unknown configuration key `{}`", key);
        }
    }

    if let Some(keys) = table.get("keys").and_then(|v| v.as_table()) {
        let contexts = HashSet::from(["global", "search_input", "list", "detail", "editor"]);
        for key in keys.keys() {
            if !contexts.contains(key.as_str()) {
                warn!("unknown key binding context `keys.{}`", key);
            }
        }
    }
}
