//! `config`: profiles holding the endpoint, model and API key.

use clap::{Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;

use crate::app::Runtime;
use crate::config::{
    CliConfig, ProfileConfig, ensure_profile, profile_mut, profile_ref, save_config_to,
    validate_url,
};
use crate::errors::{CliError, redact_secret};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create the active profile, prompting for a key unless one is given
    Init {
        #[arg(long = "api-url")]
        api_url: Option<String>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long = "api-key")]
        api_key: Option<String>,
    },
    /// Print one setting of the active profile
    Get {
        key: ConfigKey,
        /// Print the API key unredacted
        #[arg(long = "show-key")]
        show_key: bool,
    },
    /// Change one setting of the active profile
    Set { key: ConfigKey, value: String },
    /// List profiles; the active one is starred
    Profiles,
    /// Make a profile active, creating it with defaults if needed
    Use { profile: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfigKey {
    #[value(name = "apiUrl")]
    ApiUrl,
    #[value(name = "model")]
    Model,
    #[value(name = "apiKey")]
    ApiKey,
}

impl ConfigKey {
    fn name(self) -> &'static str {
        match self {
            ConfigKey::ApiUrl => "apiUrl",
            ConfigKey::Model => "model",
            ConfigKey::ApiKey => "apiKey",
        }
    }

    /// Validates `value` and stores it. A blank key clears it.
    fn apply(self, profile: &mut ProfileConfig, value: &str) -> Result<(), CliError> {
        let value = value.trim();
        match self {
            ConfigKey::ApiUrl => {
                validate_url(value)?;
                profile.api_url = value.to_string();
            }
            ConfigKey::Model if value.is_empty() => {
                return Err(CliError::Usage("Model name cannot be empty.".to_string()));
            }
            ConfigKey::Model => profile.model = value.to_string(),
            ConfigKey::ApiKey => profile.api_key = (!value.is_empty()).then(|| value.to_string()),
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileSummary<'a> {
    name: &'a str,
    active: bool,
    api_url: &'a str,
    model: &'a str,
    has_api_key: bool,
}

fn summarize_profiles<'a>(config: &'a CliConfig, active: &str) -> Vec<ProfileSummary<'a>> {
    let mut summaries: Vec<ProfileSummary<'a>> = config
        .profiles
        .iter()
        .map(|(name, profile)| ProfileSummary {
            name: name.as_str(),
            active: name == active,
            api_url: &profile.api_url,
            model: &profile.model,
            has_api_key: profile.api_key.as_deref().is_some_and(|k| !k.is_empty()),
        })
        .collect();
    summaries.sort_by(|a, b| a.name.cmp(b.name));
    summaries
}

pub async fn handle(runtime: &mut Runtime, command: ConfigCommand) -> Result<(), CliError> {
    match command {
        ConfigCommand::Init {
            api_url,
            model,
            api_key,
        } => init(runtime, api_url, model, api_key).await,
        ConfigCommand::Get { key, show_key } => get(runtime, key, show_key).await,
        ConfigCommand::Set { key, value } => set(runtime, key, value).await,
        ConfigCommand::Profiles => profiles(runtime).await,
        ConfigCommand::Use { profile } => use_profile(runtime, profile).await,
    }
}

async fn init(
    runtime: &mut Runtime,
    api_url: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
) -> Result<(), CliError> {
    let interactive = !is_ci() && !runtime.output.json && !runtime.output.quiet;
    let api_key = match api_key {
        Some(key) => Some(key),
        None if interactive => {
            let typed = rpassword::prompt_password("API key (optional, Enter to skip): ")
                .map_err(|e| CliError::Generic(format!("Failed reading API key: {e}")))?;
            Some(typed).filter(|k| !k.trim().is_empty())
        }
        None => None,
    };

    let profile_name = runtime.active_profile();
    ensure_profile(&mut runtime.config, &profile_name);
    if let Some(profile) = profile_mut(&mut runtime.config, &profile_name) {
        if let Some(url) = api_url {
            ConfigKey::ApiUrl.apply(profile, &url)?;
        }
        if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
            ConfigKey::Model.apply(profile, &model)?;
        }
        if let Some(key) = api_key {
            ConfigKey::ApiKey.apply(profile, &key)?;
        }
    }
    runtime.config.profile = profile_name;
    save_config_to(&runtime.config, &runtime.config_path)?;

    let path = &runtime.config_path;
    if runtime.output.json {
        runtime.output.print_json(&json!({ "ok": true, "path": path }))?;
    } else {
        runtime
            .output
            .print_human(&format!("Config initialized: {}", path.display()));
    }
    Ok(())
}

async fn get(runtime: &mut Runtime, key: ConfigKey, show_key: bool) -> Result<(), CliError> {
    let profile_name = runtime.active_profile();
    let profile = profile_ref(&runtime.config, &profile_name).ok_or_else(|| {
        CliError::Usage(format!(
            "Profile '{profile_name}' not found. Run `intellistudy config init` first."
        ))
    })?;

    // Model and key go through the same resolution a request would use.
    let value = match key {
        ConfigKey::ApiUrl => Some(profile.api_url.clone()),
        ConfigKey::Model => Some(runtime.resolved_model()),
        ConfigKey::ApiKey => runtime
            .resolved_api_key()
            .map(|k| if show_key { k } else { redact_secret(&k) }),
    };

    if runtime.output.json {
        runtime
            .output
            .print_json(&json!({ "key": key.name(), "value": value }))?;
    } else {
        runtime
            .output
            .print_human(value.as_deref().unwrap_or("(not set)"));
    }
    Ok(())
}

async fn set(runtime: &mut Runtime, key: ConfigKey, value: String) -> Result<(), CliError> {
    let profile_name = runtime.active_profile();
    ensure_profile(&mut runtime.config, &profile_name);
    let profile = profile_mut(&mut runtime.config, &profile_name).ok_or_else(|| {
        CliError::Generic(format!("Profile '{profile_name}' could not be created."))
    })?;
    key.apply(profile, &value)?;
    save_config_to(&runtime.config, &runtime.config_path)?;

    if runtime.output.json {
        runtime
            .output
            .print_json(&json!({ "ok": true, "key": key.name() }))?;
    } else {
        runtime.output.print_human(&format!("{} updated.", key.name()));
    }
    Ok(())
}

async fn profiles(runtime: &mut Runtime) -> Result<(), CliError> {
    let active = runtime.active_profile();
    let summaries = summarize_profiles(&runtime.config, &active);

    if runtime.output.json {
        return runtime
            .output
            .print_json(&json!({ "profiles": summaries }));
    }
    for summary in &summaries {
        let marker = if summary.active { "*" } else { " " };
        let key = if summary.has_api_key { "" } else { ", no key" };
        runtime
            .output
            .print_human(&format!("{marker} {} ({}{key})", summary.name, summary.model));
    }
    Ok(())
}

async fn use_profile(runtime: &mut Runtime, profile_name: String) -> Result<(), CliError> {
    ensure_profile(&mut runtime.config, &profile_name);
    runtime.config.profile = profile_name;
    save_config_to(&runtime.config, &runtime.config_path)?;

    let active = &runtime.config.profile;
    if runtime.output.json {
        runtime
            .output
            .print_json(&json!({ "ok": true, "profile": active }))?;
    } else {
        runtime.output.print_human(&format!("Active profile: {active}"));
    }
    Ok(())
}

fn is_ci() -> bool {
    std::env::var("CI").is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}
