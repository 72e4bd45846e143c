use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::CliError;

pub const DEFAULT_API_URL: &str = "https://console.dakaei.com/api/chat";
pub const DEFAULT_MODEL: &str = "qwen3-32b";
pub const API_KEY_ENV: &str = "DAKAEI_API_KEY";

/// Stored as `{apiUrl, model, apiKey?}`; snake_case keys are still read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileConfig {
    #[serde(alias = "api_url")]
    pub api_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default, alias = "api_key", skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            model: default_model(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    pub profile: String,
    pub profiles: HashMap<String, ProfileConfig>,
}

impl Default for CliConfig {
    fn default() -> Self {
        let mut profiles = HashMap::new();
        profiles.insert("default".to_string(), ProfileConfig::default());
        Self {
            profile: "default".to_string(),
            profiles,
        }
    }
}

pub fn config_path() -> Result<PathBuf, CliError> {
    let base = dirs::config_dir().ok_or_else(|| {
        CliError::Configuration("Could not resolve config directory for this OS.".to_string())
    })?;
    Ok(base.join("intellistudy").join("config.json"))
}

pub fn load_config() -> Result<CliConfig, CliError> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<CliConfig, CliError> {
    if !path.exists() {
        return Ok(CliConfig::default());
    }

    let text = fs::read_to_string(path)?;
    let mut config: CliConfig = serde_json::from_str(&text).map_err(|e| {
        CliError::Configuration(format!("Invalid config file {}: {e}", path.display()))
    })?;
    let profile = config.profile.clone();
    ensure_profile(&mut config, &profile);
    Ok(config)
}

pub fn save_config_to(config: &CliConfig, path: &Path) -> Result<(), CliError> {
    let parent = path
        .parent()
        .ok_or_else(|| CliError::Configuration("Invalid config path.".to_string()))?;
    fs::create_dir_all(parent)?;
    fs::write(path, serde_json::to_string_pretty(config)?)?;
    Ok(())
}

pub fn active_profile_name(config: &CliConfig, profile_override: Option<&str>) -> String {
    profile_override
        .map(|s| s.to_string())
        .unwrap_or_else(|| config.profile.clone())
}

pub fn ensure_profile(config: &mut CliConfig, profile_name: &str) {
    if !config.profiles.contains_key(profile_name) {
        config
            .profiles
            .insert(profile_name.to_string(), ProfileConfig::default());
    }
}

pub fn profile_ref<'a>(config: &'a CliConfig, profile_name: &str) -> Option<&'a ProfileConfig> {
    config.profiles.get(profile_name)
}

pub fn profile_mut<'a>(
    config: &'a mut CliConfig,
    profile_name: &str,
) -> Option<&'a mut ProfileConfig> {
    config.profiles.get_mut(profile_name)
}

pub fn resolve_api_url(
    config: &CliConfig,
    profile_name: &str,
    api_override: Option<&str>,
) -> Result<String, CliError> {
    if let Some(url) = api_override {
        validate_url(url)?;
        return Ok(url.to_string());
    }

    let profile = profile_ref(config, profile_name).ok_or_else(|| {
        CliError::Configuration(format!("Profile '{profile_name}' does not exist."))
    })?;
    validate_url(&profile.api_url)?;
    Ok(profile.api_url.clone())
}

pub fn resolve_model(config: &CliConfig, profile_name: &str, model_override: Option<&str>) -> String {
    if let Some(model) = model_override.map(str::trim).filter(|m| !m.is_empty()) {
        return model.to_string();
    }
    profile_ref(config, profile_name)
        .map(|p| p.model.clone())
        .unwrap_or_else(default_model)
}

/// The environment variable wins over the profile. A missing key is not an
/// error here; requests fail on it when they are made.
pub fn resolve_api_key(config: &CliConfig, profile_name: &str) -> Option<String> {
    pick_api_key(
        std::env::var(API_KEY_ENV).ok(),
        profile_ref(config, profile_name).and_then(|p| p.api_key.clone()),
    )
}

fn pick_api_key(env_value: Option<String>, profile_value: Option<String>) -> Option<String> {
    env_value
        .into_iter()
        .chain(profile_value)
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
}

pub fn validate_url(value: &str) -> Result<(), CliError> {
    let parsed = Url::parse(value)?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(CliError::Configuration(
            "API URL must use http:// or https://.".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_default_profile() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.profile, "default");
        let profile = profile_ref(&config, "default").unwrap();
        assert_eq!(profile.api_url, DEFAULT_API_URL);
        assert_eq!(profile.model, DEFAULT_MODEL);
        assert!(profile.api_key.is_none());
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = CliConfig::default();
        ensure_profile(&mut config, "work");
        let work = profile_mut(&mut config, "work").unwrap();
        work.model = "deepseek-chat".to_string();
        work.api_key = Some("secret".to_string());
        config.profile = "work".to_string();
        save_config_to(&config, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profile, "work");
        assert_eq!(resolve_model(&loaded, "work", None), "deepseek-chat");
        assert_eq!(
            profile_ref(&loaded, "work").unwrap().api_key.as_deref(),
            Some("secret")
        );
    }

    #[test]
    fn older_files_without_model_get_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"profile":"default","profiles":{"default":{"api_url":"http://localhost:9000/chat"}}}"#,
        )
        .unwrap();
        let loaded = load_config_from(&path).unwrap();
        assert_eq!(resolve_model(&loaded, "default", None), DEFAULT_MODEL);
        assert_eq!(
            resolve_api_url(&loaded, "default", None).unwrap(),
            "http://localhost:9000/chat"
        );
    }

    #[test]
    fn profiles_are_written_with_camel_case_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = CliConfig::default();
        if let Some(profile) = profile_mut(&mut config, "default") {
            profile.api_key = Some("sk-123".to_string());
        }
        save_config_to(&config, &path).unwrap();

        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let profile = &raw["profiles"]["default"];
        assert_eq!(profile["apiUrl"], DEFAULT_API_URL);
        assert_eq!(profile["model"], DEFAULT_MODEL);
        assert_eq!(profile["apiKey"], "sk-123");
        assert!(profile.get("api_url").is_none());
    }

    #[test]
    fn older_snake_case_key_is_still_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"profile":"default","profiles":{"default":{"api_url":"http://localhost:9000/chat","api_key":"old"}}}"#,
        )
        .unwrap();
        let loaded = load_config_from(&path).unwrap();
        let profile = profile_ref(&loaded, "default").unwrap();
        assert_eq!(profile.api_key.as_deref(), Some("old"));
    }

    #[test]
    fn corrupt_file_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            load_config_from(&path),
            Err(CliError::Configuration(_))
        ));
    }

    #[test]
    fn env_key_beats_profile_key_and_blank_is_ignored() {
        assert_eq!(
            pick_api_key(Some("env".into()), Some("profile".into())).as_deref(),
            Some("env")
        );
        assert_eq!(
            pick_api_key(Some("  ".into()), Some("profile".into())).as_deref(),
            Some("profile")
        );
        assert_eq!(pick_api_key(None, None), None);
    }

    #[test]
    fn override_and_validation() {
        let config = CliConfig::default();
        assert_eq!(
            resolve_api_url(&config, "default", Some("http://127.0.0.1:1/x")).unwrap(),
            "http://127.0.0.1:1/x"
        );
        assert!(resolve_api_url(&config, "default", Some("ftp://host")).is_err());
        assert!(resolve_api_url(&config, "missing", None).is_err());
        assert_eq!(resolve_model(&config, "default", Some(" m1 ")), "m1");
    }
}
