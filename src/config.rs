/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// A missing file or missing keys fall back to defaults; a file that
/// exists but cannot be read or parsed is reported as a `ConfigError`.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub view: ViewConfig,
    pub audio: AudioConfig,
    pub gamepad: GamepadConfig,
    pub log_file: PathBuf,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimingConfig {
    pub tick_rate_ms: u64,
    pub golem_walk_ms: u64,  // spawn cell → door
    pub golem_exit_ms: u64,  // walk away after the smash
    pub golem_fade_ms: u64,
    pub notice_ticks: u32,
}

/// Visible area in world units, centered on the room.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewConfig {
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Debug)]
pub struct AudioConfig {
    pub music_path: PathBuf,
    pub music_volume: f32,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub summon: Vec<String>,
    pub restart: Vec<String>,
    pub quit: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config.toml parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    view: TomlView,
    #[serde(default)]
    audio: TomlAudio,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_golem_walk")]
    golem_walk_ms: u64,
    #[serde(default = "default_golem_exit")]
    golem_exit_ms: u64,
    #[serde(default = "default_golem_fade")]
    golem_fade_ms: u64,
    #[serde(default = "default_notice_ticks")]
    notice_ticks: u32,
}

#[derive(Deserialize, Debug)]
struct TomlView {
    #[serde(default = "default_view_width")]
    width: f32,
    #[serde(default = "default_view_height")]
    height: f32,
}

#[derive(Deserialize, Debug)]
struct TomlAudio {
    #[serde(default = "default_music_path")]
    music_path: String,
    #[serde(default = "default_music_volume")]
    music_volume: f32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_summon")]
    summon: Vec<String>,
    #[serde(default = "default_restart")]
    restart: Vec<String>,
    #[serde(default = "default_quit")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_log_file")]
    log_file: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 33 }
fn default_golem_walk() -> u64 { 2000 }
fn default_golem_exit() -> u64 { 2000 }
fn default_golem_fade() -> u64 { 1000 }
fn default_notice_ticks() -> u32 { 60 }  // ~2s at 33ms tick

fn default_view_width() -> f32 { 288.0 }   // 18 tiles
fn default_view_height() -> f32 { 240.0 }  // 15 tiles

fn default_music_path() -> String { "assets/backgroundMusic.mp3".into() }
fn default_music_volume() -> f32 { 0.5 }

fn default_summon() -> Vec<String> { vec!["A".into()] }
fn default_restart() -> Vec<String> { vec!["Start".into()] }
fn default_quit() -> Vec<String> { vec!["Select".into()] }

fn default_log_file() -> String { "dungeon.log".into() }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            tick_rate_ms: default_tick_rate(),
            golem_walk_ms: default_golem_walk(),
            golem_exit_ms: default_golem_exit(),
            golem_fade_ms: default_golem_fade(),
            notice_ticks: default_notice_ticks(),
        }
    }
}

impl Default for TomlView {
    fn default() -> Self {
        TomlView { width: default_view_width(), height: default_view_height() }
    }
}

impl Default for TomlAudio {
    fn default() -> Self {
        TomlAudio { music_path: default_music_path(), music_volume: default_music_volume() }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            summon: default_summon(),
            restart: default_restart(),
            quit: default_quit(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral { log_file: default_log_file() }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig::from(TomlTiming::default())
    }
}

impl From<TomlTiming> for TimingConfig {
    fn from(t: TomlTiming) -> Self {
        TimingConfig {
            tick_rate_ms: t.tick_rate_ms.max(1),
            golem_walk_ms: t.golem_walk_ms,
            golem_exit_ms: t.golem_exit_ms,
            golem_fade_ms: t.golem_fade_ms,
            notice_ticks: t.notice_ticks,
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        ViewConfig { width: default_view_width(), height: default_view_height() }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    pub fn load() -> Result<Self, ConfigError> {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs)?;
        Ok(GameConfig::from_toml(toml_cfg, &search_dirs))
    }

    /// Parse a config document directly (no file lookup).
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let cfg = parse(text, Path::new("config.toml"))?;
        Ok(GameConfig::from_toml(cfg, &[]))
    }

    fn from_toml(cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        GameConfig {
            timing: TimingConfig::from(cfg.timing),
            view: ViewConfig {
                width: view_extent(cfg.view.width, default_view_width()),
                height: view_extent(cfg.view.height, default_view_height()),
            },
            audio: AudioConfig {
                music_path: resolve_path(&cfg.audio.music_path, search_dirs),
                music_volume: finite_or(cfg.audio.music_volume, default_music_volume()).clamp(0.0, 1.0),
            },
            gamepad: GamepadConfig {
                summon: cfg.gamepad.summon,
                restart: cfg.gamepad.restart,
                quit: cfg.gamepad.quit,
            },
            log_file: PathBuf::from(cfg.general.log_file),
        }
    }
}

/// The grass backdrop is built over the whole view, so the view size is
/// bounded on both sides.
const VIEW_MIN: f32 = 16.0;
const VIEW_MAX: f32 = 2048.0;

fn view_extent(raw: f32, default: f32) -> f32 {
    finite_or(raw, default).clamp(VIEW_MIN, VIEW_MAX)
}

fn finite_or(raw: f32, default: f32) -> f32 {
    if raw.is_finite() { raw } else { default }
}

/// Relative asset paths are looked up in the candidate dirs; the first
/// that exists wins, otherwise the path stays relative to CWD.
fn resolve_path(raw: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let p = PathBuf::from(raw);
    if p.is_absolute() {
        return p;
    }
    search_dirs.iter()
        .map(|d| d.join(raw))
        .find(|candidate| candidate.exists())
        .unwrap_or(p)
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> Result<TomlConfig, ConfigError> {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|source| ConfigError::Read { path: path.clone(), source })?;
            return parse(&text, &path);
        }
    }
    Ok(TomlConfig::default())
}

fn parse(text: &str, path: &Path) -> Result<TomlConfig, ConfigError> {
    toml::from_str::<TomlConfig>(text)
        .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = GameConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.timing, TimingConfig::default());
        assert_eq!(cfg.timing.golem_walk_ms, 2000);
        assert_eq!(cfg.timing.golem_exit_ms, 2000);
        assert_eq!(cfg.timing.golem_fade_ms, 1000);
        assert_eq!(cfg.view, ViewConfig::default());
        assert!((cfg.audio.music_volume - 0.5).abs() < f32::EPSILON);
        assert_eq!(cfg.log_file, PathBuf::from("dungeon.log"));
        assert_eq!(cfg.gamepad.summon, vec!["A".to_string()]);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let cfg = GameConfig::from_toml_str(
            "[timing]\ngolem_walk_ms = 500\n\n[audio]\nmusic_volume = 0.2\n",
        ).unwrap();
        assert_eq!(cfg.timing.golem_walk_ms, 500);
        assert_eq!(cfg.timing.golem_fade_ms, 1000);
        assert_eq!(cfg.timing.tick_rate_ms, 33);
        assert!((cfg.audio.music_volume - 0.2).abs() < 1e-6);
        assert_eq!(cfg.audio.music_path, PathBuf::from("assets/backgroundMusic.mp3"));
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let cfg = GameConfig::from_toml_str(
            "[timing]\ntick_rate_ms = 0\n[audio]\nmusic_volume = 3.0\n[view]\nwidth = 1.0\n",
        ).unwrap();
        assert_eq!(cfg.timing.tick_rate_ms, 1);
        assert_eq!(cfg.audio.music_volume, 1.0);
        assert_eq!(cfg.view.width, 16.0);
    }

    #[test]
    fn huge_or_non_finite_view_is_bounded() {
        let cfg = GameConfig::from_toml_str("[view]\nwidth = inf\nheight = 1e9\n").unwrap();
        assert_eq!(cfg.view.width, 288.0);
        assert_eq!(cfg.view.height, 2048.0);

        let cfg = GameConfig::from_toml_str("[view]\nwidth = nan\n[audio]\nmusic_volume = nan\n").unwrap();
        assert_eq!(cfg.view.width, 288.0);
        assert!((cfg.audio.music_volume - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn malformed_document_is_an_error() {
        let err = GameConfig::from_toml_str("[timing\ntick_rate_ms = 5").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("parse error"));
    }

    #[test]
    fn wrong_type_is_an_error() {
        let err = GameConfig::from_toml_str("[timing]\ngolem_walk_ms = \"slow\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn absolute_asset_path_is_kept() {
        let p = if cfg!(windows) { "C:\\music.ogg" } else { "/tmp/music.ogg" };
        assert_eq!(resolve_path(p, &[PathBuf::from(".")]), PathBuf::from(p));
    }
}
