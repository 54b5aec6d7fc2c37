use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub providers: ProviderConfig,
    pub enrich: EnrichConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub lrclib_url: String,
    /// Optional second LRCLIB-compatible endpoint, tried after the primary.
    pub lrclib_fallback_url: Option<String>,
    pub musicbrainz_url: String,
    pub coverart_url: String,
    /// Identifies this client to the providers; MusicBrainz requires one.
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichConfig {
    /// MusicBrainz search timeout.
    pub search_timeout_secs: u64,
    /// Per-release cover art probe timeout.
    pub art_probe_timeout_secs: u64,
    /// LRCLIB request timeout.
    pub lyrics_timeout_secs: u64,
    /// Assumed track length when the caller knows none, for timing synthesis.
    pub default_duration_secs: f64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            lrclib_url: "https://lrclib.net/api".to_string(),
            lrclib_fallback_url: None,
            musicbrainz_url: "https://musicbrainz.org/ws/2".to_string(),
            coverart_url: "https://coverartarchive.org".to_string(),
            user_agent: format!("liner/{} (https://github.com/liner)", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            search_timeout_secs: 5,
            art_probe_timeout_secs: 3,
            lyrics_timeout_secs: 10,
            default_duration_secs: 180.0,
        }
    }
}

pub fn save(cfg: &Config, override_path: Option<&Path>) -> anyhow::Result<()> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
    }
    let raw = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&path, raw).with_context(|| format!("write {}", path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(&path, fs::Permissions::from_mode(0o600));
    }
    Ok(())
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let proj =
        ProjectDirs::from("dev", "liner", "liner").context("ProjectDirs unavailable")?;
    Ok(proj.config_dir().join("config.toml"))
}

pub fn load(override_path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    if !path.exists() {
        let cfg = Config::default();
        save(&cfg, Some(&path))?;
        return Ok(cfg);
    }

    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let cfg = toml::from_str::<Config>(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
