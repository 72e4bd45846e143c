use std::path::PathBuf;

use crate::api::ApiClient;
use crate::config::{CliConfig, active_profile_name, resolve_api_key, resolve_api_url, resolve_model};
use crate::errors::CliError;
use crate::output::OutputMode;

#[derive(Debug, Clone)]
pub struct Runtime {
    pub output: OutputMode,
    pub config: CliConfig,
    pub config_path: PathBuf,
    pub profile_override: Option<String>,
    pub api_url_override: Option<String>,
    pub model_override: Option<String>,
    pub timeout_ms: u64,
    pub stream: bool,
}

impl Runtime {
    pub fn active_profile(&self) -> String {
        active_profile_name(&self.config, self.profile_override.as_deref())
    }

    pub fn resolved_api_url(&self) -> Result<String, CliError> {
        resolve_api_url(
            &self.config,
            &self.active_profile(),
            self.api_url_override.as_deref(),
        )
    }

    pub fn resolved_model(&self) -> String {
        resolve_model(
            &self.config,
            &self.active_profile(),
            self.model_override.as_deref(),
        )
    }

    pub fn resolved_api_key(&self) -> Option<String> {
        resolve_api_key(&self.config, &self.active_profile())
    }

    pub fn api_client(&self) -> Result<ApiClient, CliError> {
        ApiClient::new(
            self.resolved_api_url()?,
            self.resolved_api_key(),
            self.resolved_model(),
            self.stream,
            self.timeout_ms,
            self.output.debug,
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::profile_mut;

    /// A quiet runtime with a key in the profile, aimed at `api_url`.
    pub(crate) fn quiet_runtime(api_url: String) -> Runtime {
        let mut config = CliConfig::default();
        if let Some(profile) = profile_mut(&mut config, "default") {
            profile.api_key = Some("test-key".to_string());
        }
        Runtime {
            output: OutputMode {
                json: false,
                quiet: true,
                verbose: false,
                debug: false,
            },
            config,
            config_path: PathBuf::from("unused.json"),
            profile_override: None,
            api_url_override: Some(api_url),
            model_override: None,
            timeout_ms: 5_000,
            stream: false,
        }
    }

    #[test]
    fn overrides_win_over_the_profile() {
        let mut runtime = quiet_runtime("http://localhost:9/api/chat".to_string());
        runtime.model_override = Some("deepseek-chat".to_string());
        assert_eq!(runtime.resolved_api_url().unwrap(), "http://localhost:9/api/chat");
        assert_eq!(runtime.resolved_model(), "deepseek-chat");
        assert_eq!(runtime.active_profile(), "default");

        runtime.api_url_override = Some("ftp://nope".to_string());
        assert!(runtime.api_client().is_err());
    }
}
