use std::collections::{HashMap, HashSet};
use std::num::ParseIntError;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Name of the wildcard section holding defaults for every channel
const GLOBAL_SECTION: &str = "*";

/// File name of the configuration file inside the home directory
const CONFIG_FILE_NAME: &str = ".podspoolrc";

/// Settings for a single configured channel.
///
/// Built once per run by overlaying the channel's section onto the `[*]`
/// defaults (channel wins on conflict). Immutable after construction.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    name: String,
    url: String,
    settings: HashMap<String, String>,
}

impl ChannelConfig {
    /// Build a channel configuration from already-merged settings.
    ///
    /// [`load_config`] is the usual entry point; this exists for callers
    /// that assemble channels programmatically.
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        settings: HashMap<String, String>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            settings,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Feed URL. Guaranteed present; sections without one are dropped
    /// during loading.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Raw access to any configured setting
    pub fn get(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(String::as_str)
    }

    /// Destination directory for downloaded episodes, if configured
    pub fn spool(&self) -> Option<&Path> {
        self.get("spool").map(Path::new)
    }

    /// Literal output filename override, if configured
    pub fn filespec(&self) -> Option<&str> {
        self.get("filespec")
    }

    /// Playlist file to append downloaded paths to, if configured
    pub fn playlist(&self) -> Option<&Path> {
        self.get("playlist").map(Path::new)
    }

    /// Number of feed items to consider per run. Unset means 1.
    pub fn max_episodes(&self) -> Result<usize, ParseIntError> {
        match self.get("max_episodes") {
            Some(value) => value.trim().parse(),
            None => Ok(1),
        }
    }
}

/// The parsed configuration: channels in file order, plus warnings about
/// sections that were dropped.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub channels: Vec<ChannelConfig>,
    pub warnings: Vec<String>,
}

/// Default configuration path under the user's home directory
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_FILE_NAME)
}

/// Load and merge the INI-style configuration file.
///
/// Values are taken verbatim (no interpolation), key casing is preserved,
/// and section order is kept. A channel section without a `url` setting is
/// dropped with a warning rather than failing the load.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    let sections = parse_ini(&text, path)?;
    Ok(merge_sections(sections))
}

type Section = (String, HashMap<String, String>);

fn parse_ini(text: &str, path: &Path) -> Result<Vec<Section>, ConfigError> {
    let mut sections: Vec<Section> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    let parse_error = |line: usize, reason: String| ConfigError::Parse {
        path: path.to_path_buf(),
        line,
        reason,
    };

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(rest) = line.strip_prefix('[') {
            let name = rest
                .strip_suffix(']')
                .ok_or_else(|| parse_error(index + 1, "malformed section header".to_string()))?
                .trim()
                .to_string();
            if !seen.insert(name.clone()) {
                return Err(parse_error(index + 1, format!("duplicate section '{name}'")));
            }
            sections.push((name, HashMap::new()));
        } else if let Some((key, value)) = split_key_value(line) {
            let Some((_, settings)) = sections.last_mut() else {
                return Err(parse_error(
                    index + 1,
                    "key/value pair before any section header".to_string(),
                ));
            };
            // Duplicate keys within a section: last occurrence wins
            settings.insert(key, value);
        } else {
            return Err(parse_error(index + 1, format!("invalid line '{line}'")));
        }
    }

    Ok(sections)
}

/// Split a `key=value` (or `key: value`) line, preserving key casing and
/// taking the value verbatim apart from surrounding whitespace.
fn split_key_value(line: &str) -> Option<(String, String)> {
    let delimiter = line.find(['=', ':'])?;
    let key = line[..delimiter].trim();
    if key.is_empty() {
        return None;
    }
    let value = line[delimiter + 1..].trim();
    Some((key.to_string(), value.to_string()))
}

fn merge_sections(sections: Vec<Section>) -> Config {
    let global = sections
        .iter()
        .find(|(name, _)| name == GLOBAL_SECTION)
        .map(|(_, settings)| settings.clone())
        .unwrap_or_default();

    let mut channels = Vec::new();
    let mut warnings = Vec::new();

    for (name, settings) in sections {
        if name == GLOBAL_SECTION {
            continue;
        }

        let mut merged = global.clone();
        merged.extend(settings);

        match merged.remove("url") {
            Some(url) => channels.push(ChannelConfig {
                name,
                url,
                settings: merged,
            }),
            None => warnings.push(format!("No URL specified for channel '{name}', skipping")),
        }
    }

    Config { channels, warnings }
}
