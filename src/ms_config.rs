// Client preferences and best-time records
// Persisted to disk as TOML under the platform config directory

use chrono::Local;
use directories::ProjectDirs;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Difficulty presets and custom settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Difficulty {
    Beginner,                    // 9x9, 10 bombs
    Intermediate,                // 16x16, 40 bombs
    Expert,                      // 30x16, 99 bombs
    Custom(usize, usize, usize), // cols, rows, bombs
}

impl Serialize for Difficulty {
    /// Serialized by name; custom sizes live in their own fields
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D>(deserializer: D) -> Result<Difficulty, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "Beginner" => Ok(Difficulty::Beginner),
            "Intermediate" => Ok(Difficulty::Intermediate),
            "Expert" => Ok(Difficulty::Expert),
            // rebuilt from custom_cols/rows/bombs after loading
            "Custom" => Ok(Difficulty::Custom(0, 0, 0)),
            _ => Err(serde::de::Error::custom("unknown difficulty")),
        }
    }
}

impl Difficulty {
    /// Board size requested from the server: (cols, rows, bombs)
    pub fn params(&self) -> (usize, usize, usize) {
        match self {
            Difficulty::Beginner => (9, 9, 10),
            Difficulty::Intermediate => (16, 16, 40),
            Difficulty::Expert => (30, 16, 99),
            Difficulty::Custom(c, r, b) => (*c, *r, *b),
        }
    }

    /// Stable identifier used in the config file
    pub fn name(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Expert => "Expert",
            Difficulty::Custom(_, _, _) => "Custom",
        }
    }

    pub fn to_index(&self) -> usize {
        match self {
            Difficulty::Beginner => 0,
            Difficulty::Intermediate => 1,
            Difficulty::Expert => 2,
            Difficulty::Custom(_, _, _) => 3,
        }
    }

    pub fn from_index(i: usize, cols: usize, rows: usize, bombs: usize) -> Difficulty {
        match i {
            0 => Difficulty::Beginner,
            1 => Difficulty::Intermediate,
            2 => Difficulty::Expert,
            _ => Difficulty::Custom(cols, rows, bombs),
        }
    }

    /// The preset matching a board size, if any
    pub fn for_board(cols: usize, rows: usize, bombs: usize) -> Option<Difficulty> {
        [Difficulty::Beginner, Difficulty::Intermediate, Difficulty::Expert]
            .into_iter()
            .find(|d| d.params() == (cols, rows, bombs))
    }
}

/// Best completion time
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub secs: u64,
    pub date: String, // YYYY-MM-DD
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub difficulty: Difficulty,

    pub best_beginner: Option<Record>,
    pub best_intermediate: Option<Record>,
    pub best_expert: Option<Record>,

    pub custom_cols: usize,
    pub custom_rows: usize,
    pub custom_bombs: usize,

    pub show_indicator: bool,
    pub ascii_icons: bool,
    pub language: String, // "en" or "zh"

    /// Email used to sign in; empty until the first sign-in.
    pub player: String,
}

impl Default for Config {
    fn default() -> Self {
        let system_lang = sys_locale::get_locale().unwrap_or_else(|| "en".to_string());
        let language = if system_lang.to_lowercase().starts_with("zh") {
            "zh".to_string()
        } else {
            "en".to_string()
        };

        Config {
            difficulty: Difficulty::Beginner,
            best_beginner: None,
            best_intermediate: None,
            best_expert: None,
            custom_cols: 36,
            custom_rows: 20,
            custom_bombs: 150,
            show_indicator: false,
            ascii_icons: false,
            language,
            player: String::new(),
        }
    }
}

impl Config {
    fn record_slot(&self, d: &Difficulty) -> Option<&Option<Record>> {
        match d {
            Difficulty::Beginner => Some(&self.best_beginner),
            Difficulty::Intermediate => Some(&self.best_intermediate),
            Difficulty::Expert => Some(&self.best_expert),
            Difficulty::Custom(_, _, _) => None,
        }
    }

    /// Best time in seconds; never for Custom
    pub fn get_record(&self, d: &Difficulty) -> Option<u64> {
        self.record_slot(d).and_then(|r| r.as_ref()).map(|r| r.secs)
    }

    pub fn get_record_detail(&self, d: &Difficulty) -> Option<(u64, String)> {
        self.record_slot(d)
            .and_then(|r| r.as_ref())
            .map(|r| (r.secs, r.date.clone()))
    }

    /// Store `secs` if it beats the current record. Returns true on a new record.
    pub fn set_record(&mut self, d: &Difficulty, secs: u64) -> bool {
        let date = Local::now().format("%Y-%m-%d").to_string();
        let slot = match d {
            Difficulty::Beginner => &mut self.best_beginner,
            Difficulty::Intermediate => &mut self.best_intermediate,
            Difficulty::Expert => &mut self.best_expert,
            Difficulty::Custom(_, _, _) => return false,
        };
        if slot.as_ref().is_none_or(|v| secs < v.secs) {
            *slot = Some(Record { secs, date });
            return true;
        }
        false
    }

    /// Parse a config file body, restoring Custom sizes from their fields
    pub fn from_toml(s: &str) -> Result<Config, toml::de::Error> {
        let mut cfg: Config = toml::from_str(s)?;
        if matches!(cfg.difficulty, Difficulty::Custom(_, _, _)) {
            cfg.difficulty = Difficulty::Custom(cfg.custom_cols, cfg.custom_rows, cfg.custom_bombs);
        }
        Ok(cfg)
    }
}

/// Config directory of the running executable,
/// e.g. ~/.config/mswpr on Linux; the current directory as fallback
pub fn config_dir() -> Option<PathBuf> {
    let exe = env::current_exe().ok()?;
    let name = exe.file_stem()?.to_str()?.to_string();
    match ProjectDirs::from("com", "xhbl", &name) {
        Some(proj) => Some(proj.config_dir().to_path_buf()),
        None => env::current_dir().ok(),
    }
}

pub fn config_path() -> Option<PathBuf> {
    let exe = env::current_exe().ok()?;
    let name = exe.file_stem()?.to_str()?.to_string();
    config_dir().map(|d| d.join(format!("{name}.toml")))
}

/// Load the config at `path`, writing defaults when it is missing or unreadable
pub fn load_or_create_at(path: &Path) -> Config {
    if let Ok(s) = fs::read_to_string(path) {
        match Config::from_toml(&s) {
            Ok(cfg) => return cfg,
            Err(e) => log::warn!("ignoring unreadable config {}: {e}", path.display()),
        }
    }
    let cfg = Config::default();
    if let Err(e) = save_at(&cfg, path) {
        log::warn!("cannot write default config {}: {e}", path.display());
    }
    cfg
}

pub fn save_at(cfg: &Config, path: &Path) -> io::Result<()> {
    let s = toml::to_string(cfg).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, s)
}

pub fn load_or_create_config() -> Config {
    match config_path() {
        Some(path) => load_or_create_at(&path),
        None => Config::default(),
    }
}

pub fn save_config(cfg: &Config) {
    if let Some(path) = config_path() {
        if let Err(e) = save_at(cfg, &path) {
            log::warn!("cannot save config {}: {e}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_only_improve() {
        let mut cfg = Config::default();
        assert!(cfg.set_record(&Difficulty::Beginner, 40));
        assert!(!cfg.set_record(&Difficulty::Beginner, 55));
        assert!(cfg.set_record(&Difficulty::Beginner, 31));
        assert_eq!(cfg.get_record(&Difficulty::Beginner), Some(31));
        assert_eq!(cfg.get_record(&Difficulty::Expert), None);
    }

    #[test]
    fn custom_games_are_not_recorded() {
        let mut cfg = Config::default();
        assert!(!cfg.set_record(&Difficulty::Custom(5, 5, 3), 1));
        assert_eq!(cfg.get_record(&Difficulty::Custom(5, 5, 3)), None);
    }

    #[test]
    fn presets_are_found_by_size() {
        assert_eq!(Difficulty::for_board(16, 16, 40), Some(Difficulty::Intermediate));
        assert_eq!(Difficulty::for_board(16, 16, 41), None);
    }

    #[test]
    fn custom_difficulty_survives_a_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("mswpr.toml");

        let mut cfg = load_or_create_at(&path);
        assert!(path.exists());
        cfg.custom_cols = 12;
        cfg.custom_rows = 7;
        cfg.custom_bombs = 9;
        cfg.difficulty = Difficulty::Custom(12, 7, 9);
        cfg.player = "ann@example.com".into();
        save_at(&cfg, &path).unwrap();

        let back = load_or_create_at(&path);
        assert_eq!(back.difficulty, Difficulty::Custom(12, 7, 9));
        assert_eq!(back.player, "ann@example.com");
    }

    #[test]
    fn broken_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mswpr.toml");
        fs::write(&path, "difficulty = 7").unwrap();
        let cfg = load_or_create_at(&path);
        assert_eq!(cfg.difficulty, Difficulty::Beginner);
    }
}
