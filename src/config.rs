use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

/// Overrides the location of the user overlay.
pub const CONFIG_ENV_VAR: &str = "SAFETY_NET_CONFIG";

// ── Final (merged) config types ──

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub wrappers: WrapperConfig,
    #[serde(default)]
    pub commands: Commands,
    #[serde(default)]
    pub rm: RmConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    /// Deepest level of embedded commands analyzed.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

fn default_max_depth() -> usize {
    8
}

/// Programs that run another program named in their arguments.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct WrapperConfig {
    /// Multi-call binaries dispatching on their first argument (busybox, toybox).
    #[serde(default)]
    pub multicall: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Commands {
    /// Programs denied unconditionally.
    #[serde(default)]
    pub deny: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct RmConfig {
    /// Directories under which `rm -rf` of an absolute path is allowed.
    #[serde(default)]
    pub safe_roots: Vec<String>,
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    settings: SettingsOverlay,
    #[serde(default)]
    wrappers: WrappersOverlay,
    #[serde(default)]
    commands: CommandsOverlay,
    #[serde(default)]
    rm: RmOverlay,
}

#[derive(Debug, Deserialize, Default)]
struct SettingsOverlay {
    max_depth: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct WrappersOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    multicall: Vec<String>,
    #[serde(default)]
    remove_multicall: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct CommandsOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    deny: Vec<String>,
    #[serde(default)]
    remove_deny: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RmOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    safe_roots: Vec<String>,
    #[serde(default)]
    remove_safe_roots: Vec<String>,
}

// ── Merge logic ──

/// Merge a user list into a default list.
/// In replace mode: user list replaces default entirely.
/// In merge mode: remove items first, then extend with additions (deduped).
fn merge_list(base: &mut Vec<String>, add: Vec<String>, remove: &[String], replace: bool) {
    if replace {
        *base = add;
    } else {
        base.retain(|item| !remove.contains(item));
        for item in add {
            if !base.contains(&item) {
                base.push(item);
            }
        }
    }
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge the user overlay (see [`Config::overlay_path`]) if it exists
    ///
    /// A missing overlay is normal. An unreadable or invalid one is logged
    /// and ignored, so a typo never disables the guard.
    pub fn load() -> Self {
        let mut config = Self::default_config();
        if let Some(overlay) = Self::load_overlay() {
            config.apply_overlay(overlay);
        }
        config
    }

    /// `$SAFETY_NET_CONFIG` (with `~` and `$VARS` expanded), else
    /// `~/.config/safety-net/config.toml`.
    pub fn overlay_path() -> Option<PathBuf> {
        if let Ok(custom) = std::env::var(CONFIG_ENV_VAR)
            && !custom.trim().is_empty()
        {
            return match shellexpand::full(&custom) {
                Ok(path) => Some(PathBuf::from(path.as_ref())),
                Err(e) => {
                    log::warn!("cannot expand {CONFIG_ENV_VAR}={custom:?}: {e}");
                    None
                }
            };
        }
        let home = std::env::var_os("HOME")?;
        Some(PathBuf::from(home).join(".config/safety-net/config.toml"))
    }

    fn load_overlay() -> Option<ConfigOverlay> {
        let path = Self::overlay_path()?;
        let content = std::fs::read_to_string(&path).ok()?;
        match toml::from_str(&content) {
            Ok(overlay) => {
                log::debug!("loaded config overlay from {}", path.display());
                Some(overlay)
            }
            Err(e) => {
                log::warn!("config parse error in {}: {e}", path.display());
                None
            }
        }
    }

    /// Apply an overlay on top of this config (merge semantics).
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        // Settings: scalar overrides
        if let Some(v) = overlay.settings.max_depth {
            self.settings.max_depth = v;
        }

        let w = overlay.wrappers;
        merge_list(
            &mut self.wrappers.multicall,
            w.multicall,
            &w.remove_multicall,
            w.replace,
        );

        let c = overlay.commands;
        merge_list(&mut self.commands.deny, c.deny, &c.remove_deny, c.replace);

        let r = overlay.rm;
        merge_list(
            &mut self.rm.safe_roots,
            r.safe_roots,
            &r.remove_safe_roots,
            r.replace,
        );
    }

    /// Apply an overlay from a TOML string.
    pub fn apply_overlay_str(&mut self, toml_str: &str) -> Result<(), toml::de::Error> {
        let overlay: ConfigOverlay = toml::from_str(toml_str)?;
        self.apply_overlay(overlay);
        Ok(())
    }

    /// The merged configuration rendered as TOML (`--dump-config`).
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlaid(toml_str: &str) -> Config {
        let mut config = Config::default_config();
        config.apply_overlay_str(toml_str).unwrap();
        config
    }

    #[test]
    fn default_config_parses() {
        let config = Config::default_config();
        assert_eq!(config.settings.max_depth, 8);
        assert_eq!(config.wrappers.multicall, vec!["busybox", "toybox"]);
        assert_eq!(config.commands.deny, vec!["shred", "wipefs", "mkfs"]);
        assert_eq!(config.rm.safe_roots, vec!["/tmp", "/var/tmp"]);
    }

    #[test]
    fn missing_sections_use_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.settings.max_depth, 8);
        assert!(config.commands.deny.is_empty());
    }

    // ── Merge semantics ──

    #[test]
    fn overlay_extends_deny_list() {
        let config = overlaid(
            r#"
            [commands]
            deny = ["srm"]
        "#,
        );
        assert!(config.commands.deny.contains(&"shred".to_string()));
        assert!(config.commands.deny.contains(&"srm".to_string()));
    }

    #[test]
    fn overlay_removes_from_deny_list() {
        let config = overlaid(
            r#"
            [commands]
            remove_deny = ["wipefs"]
        "#,
        );
        assert!(!config.commands.deny.contains(&"wipefs".to_string()));
        assert!(config.commands.deny.contains(&"mkfs".to_string()));
    }

    #[test]
    fn overlay_replace_safe_roots() {
        let config = overlaid(
            r#"
            [rm]
            replace = true
            safe_roots = ["/scratch"]
        "#,
        );
        assert_eq!(config.rm.safe_roots, vec!["/scratch"]);
    }

    #[test]
    fn overlay_extends_multicall() {
        let config = overlaid(
            r#"
            [wrappers]
            multicall = ["uutils"]
        "#,
        );
        assert_eq!(config.wrappers.multicall, vec!["busybox", "toybox", "uutils"]);
    }

    #[test]
    fn overlay_max_depth() {
        let config = overlaid(
            r#"
            [settings]
            max_depth = 3
        "#,
        );
        assert_eq!(config.settings.max_depth, 3);
    }

    #[test]
    fn overlay_omitted_settings_unchanged() {
        let config = overlaid(
            r#"
            [commands]
            deny = ["srm"]
        "#,
        );
        assert_eq!(config.settings.max_depth, 8);
    }

    #[test]
    fn overlay_no_duplicates() {
        let config = overlaid(
            r#"
            [commands]
            deny = ["shred", "shred"]
        "#,
        );
        let count = config.commands.deny.iter().filter(|c| *c == "shred").count();
        assert_eq!(count, 1);
    }

    #[test]
    fn invalid_overlay_is_an_error() {
        let mut config = Config::default_config();
        assert!(config.apply_overlay_str("[settings]\nmax_depth = \"deep\"").is_err());
        assert_eq!(config.settings.max_depth, 8);
    }

    #[test]
    fn dump_round_trips() {
        let config = Config::default_config();
        let dumped = config.to_toml().unwrap();
        let parsed: Config = toml::from_str(&dumped).unwrap();
        assert_eq!(parsed.commands.deny, config.commands.deny);
    }
}
