use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Environment variable holding the token for every profile.
pub const TOKEN_ENV: &str = "JIRA_AGILE_TOKEN";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Represents the full configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub default_profile: Option<String>,
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Config {
    /// Load configuration from the provided path or the default config file.
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let path = path
            .map(|p| p.as_ref().to_path_buf())
            .unwrap_or_else(Config::default_path);

        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Config::default());
        }

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Unable to read config file at {}", path.display()))?;

        serde_yaml::from_str(&raw)
            .with_context(|| format!("Malformed YAML in config file {}", path.display()))
    }

    /// Persist the configuration to disk, creating parent directories if needed.
    pub fn save<P: AsRef<Path>>(&self, path: Option<P>) -> Result<()> {
        let path = path
            .map(|p| p.as_ref().to_path_buf())
            .unwrap_or_else(Config::default_path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Unable to create config directory {}", parent.display())
            })?;
        }

        let serialized = serde_yaml::to_string(self)?;
        fs::write(&path, serialized)
            .with_context(|| format!("Unable to write config file {}", path.display()))?;

        Ok(())
    }

    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    /// Returns the requested profile, else the default one, else the first by name.
    pub fn resolve_profile<'a>(
        &'a self,
        requested: Option<&'a str>,
    ) -> Option<(&'a str, &'a Profile)> {
        if let Some(name) = requested {
            self.profiles.get(name).map(|profile| (name, profile))
        } else if let Some(default_name) = self.default_profile.as_deref() {
            self.profiles
                .get(default_name)
                .map(|profile| (default_name, profile))
        } else {
            self.profiles
                .iter()
                .next()
                .map(|(name, profile)| (name.as_str(), profile))
        }
    }

    /// Resolves a profile into everything needed to build a client, reading
    /// tokens from the process environment.
    pub fn active_profile(&self, requested: Option<&str>) -> Result<ActiveProfile> {
        self.active_profile_with(requested, |key| std::env::var(key).ok())
    }

    pub fn active_profile_with<F>(&self, requested: Option<&str>, env: F) -> Result<ActiveProfile>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (name, profile) = self.resolve_profile(requested).ok_or_else(|| match requested {
            Some(name) => anyhow!("Profile '{name}' is not configured."),
            None => anyhow!("No profile configured. Add one to {}", Config::default_path().display()),
        })?;

        let base_url = profile
            .base_url
            .clone()
            .ok_or_else(|| anyhow!("Profile '{name}' is missing a base_url."))?;

        let token = resolve_token(name, profile, env);
        if token.is_some() && profile.username.is_none() {
            debug!(profile = name, "No username configured, token will be sent as bearer");
        }

        Ok(ActiveProfile {
            name: name.to_string(),
            base_url,
            username: profile.username.clone(),
            token,
            timeout: profile.timeout(),
        })
    }

    pub fn default_path() -> PathBuf {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".jira-agile");
        path.push("config.yaml");
        path
    }
}

/// Values are optional to support partially configured setups, e.g. when
/// the token only lives in the environment.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Profile {
    pub base_url: Option<String>,
    pub username: Option<String>,
    pub api_token: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Profile {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

/// A resolved profile ready to build a client from.
#[derive(Debug, Clone)]
pub struct ActiveProfile {
    pub name: String,
    pub base_url: String,
    pub username: Option<String>,
    pub token: Option<String>,
    pub timeout: Duration,
}

/// Token lookup: `JIRA_AGILE_TOKEN_{PROFILE}` → `JIRA_AGILE_TOKEN` → profile `api_token`.
pub fn resolve_token<F>(name: &str, profile: &Profile, env: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let profile_var = format!("{TOKEN_ENV}_{}", name.to_uppercase().replace('-', "_"));
    env(&profile_var)
        .filter(|t| !t.trim().is_empty())
        .or_else(|| env(TOKEN_ENV).filter(|t| !t.trim().is_empty()))
        .or_else(|| profile.api_token.clone().filter(|t| !t.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn profile(base_url: &str) -> Profile {
        Profile {
            base_url: Some(base_url.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_load_missing_file() {
        let config = Config::load(Some("/nonexistent/config.yaml")).unwrap();
        assert!(config.profiles.is_empty());
        assert!(config.default_profile.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let mut config = Config {
            default_profile: Some("work".to_string()),
            ..Default::default()
        };
        config.profiles.insert(
            "work".to_string(),
            Profile {
                base_url: Some("https://jira.example.com".to_string()),
                username: Some("fred".to_string()),
                timeout_secs: Some(5),
                ..Default::default()
            },
        );

        let temp_file = NamedTempFile::new().unwrap();
        config.save(Some(temp_file.path())).unwrap();
        let loaded = Config::load(Some(temp_file.path())).unwrap();

        assert_eq!(loaded.default_profile, Some("work".to_string()));
        let work = loaded.profile("work").unwrap();
        assert_eq!(work.base_url.as_deref(), Some("https://jira.example.com"));
        assert_eq!(work.username.as_deref(), Some("fred"));
        assert_eq!(work.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_load_malformed_yaml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "profiles: [unclosed").unwrap();

        let err = Config::load(Some(temp_file.path())).unwrap_err();
        assert!(err.to_string().contains("Malformed YAML"));
    }

    #[test]
    fn test_resolve_profile_order() {
        let mut config = Config::default();
        config
            .profiles
            .insert("beta".to_string(), profile("https://beta.example.com"));
        config
            .profiles
            .insert("alpha".to_string(), profile("https://alpha.example.com"));

        assert_eq!(config.resolve_profile(None).unwrap().0, "alpha");

        config.default_profile = Some("beta".to_string());
        assert_eq!(config.resolve_profile(None).unwrap().0, "beta");
        assert_eq!(config.resolve_profile(Some("alpha")).unwrap().0, "alpha");
        assert!(config.resolve_profile(Some("gamma")).is_none());
    }

    #[test]
    fn test_active_profile_requires_base_url() {
        let mut config = Config::default();
        config
            .profiles
            .insert("broken".to_string(), Profile::default());

        let err = config.active_profile_with(None, no_env).unwrap_err();
        assert!(err.to_string().contains("missing a base_url"));
    }

    #[test]
    fn test_active_profile_unknown_name() {
        let config = Config::default();
        let err = config.active_profile_with(Some("work"), no_env).unwrap_err();
        assert!(err.to_string().contains("'work' is not configured"));
    }

    #[test]
    fn test_token_precedence() {
        let stored = Profile {
            api_token: Some("from-file".to_string()),
            ..profile("https://jira.example.com")
        };

        let env: HashMap<&str, &str> = HashMap::from([
            ("JIRA_AGILE_TOKEN_TEAM_A", "from-profile-env"),
            ("JIRA_AGILE_TOKEN", "from-generic-env"),
        ]);
        let lookup = |key: &str| env.get(key).map(|v| v.to_string());

        assert_eq!(
            resolve_token("team-a", &stored, lookup).as_deref(),
            Some("from-profile-env")
        );
        assert_eq!(
            resolve_token("other", &stored, lookup).as_deref(),
            Some("from-generic-env")
        );
        assert_eq!(
            resolve_token("other", &stored, no_env).as_deref(),
            Some("from-file")
        );
    }

    #[test]
    fn test_blank_tokens_are_ignored() {
        let stored = Profile {
            api_token: Some("   ".to_string()),
            ..Default::default()
        };
        let lookup = |key: &str| (key == TOKEN_ENV).then(|| String::new());
        assert!(resolve_token("work", &stored, lookup).is_none());
    }

    #[test]
    fn test_yaml_layout() {
        let mut config = Config {
            default_profile: Some("prod".to_string()),
            ..Default::default()
        };
        config.profiles.insert(
            "prod".to_string(),
            Profile {
                base_url: Some("https://jira.example.com".to_string()),
                username: Some("admin".to_string()),
                api_token: Some("secret-token-123".to_string()),
                timeout_secs: None,
            },
        );

        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("default_profile: prod"));
        assert!(yaml.contains("base_url: https://jira.example.com"));
        assert!(yaml.contains("secret-token-123"));
    }
}
