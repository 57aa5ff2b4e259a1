use std::path::PathBuf;
use std::sync::Arc;

use arc_swap::ArcSwap;
use figment::{
    Figment,
    providers::{Format, Json, Serialized},
};
use serde::{Deserialize, Serialize};
use smartcare_llm::{
    DEFAULT_GEMINI_MODEL, Model, ProviderConfig, RIG_GEMINI_PROVIDER_ID, SessionConfig,
    resolve_model,
};
use snafu::{ResultExt, Snafu};

use crate::content::SYSTEM_INSTRUCTION;

pub const DEFAULT_PROVIDER_ID: &str = RIG_GEMINI_PROVIDER_ID;
pub const SETTINGS_DIRECTORY_NAME: &str = "smartcare";
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Environment variables consulted, in order, when the file carries no API key.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];
pub const MODEL_ENV_VAR: &str = "GEMINI_MODEL";
pub const BASE_URL_ENV_VAR: &str = "GEMINI_BASE_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_provider_id")]
    pub provider_id: String,
    #[serde(default)]
    pub api_key: String,
    /// Empty means the provider's public endpoint.
    #[serde(default)]
    pub endpoint: String,
    #[serde(default = "default_model_name")]
    pub model_name: String,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<u64>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            provider_id: default_provider_id(),
            api_key: String::new(),
            endpoint: String::new(),
            model_name: default_model_name(),
            temperature: None,
            max_tokens: None,
        }
    }
}

impl ProviderSettings {
    pub fn to_provider_config(&self) -> Option<ProviderConfig> {
        if self.api_key.trim().is_empty() {
            return None;
        }

        Some(ProviderConfig::new(
            &self.provider_id,
            &self.api_key,
            &self.endpoint,
        ))
    }

    pub fn is_valid(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn model(&self) -> Model {
        resolve_model(&self.model_name)
    }

    /// Session parameters with the recruiter persona as preamble.
    pub fn session_config(&self) -> SessionConfig {
        let mut config = SessionConfig::new(self.model().id).with_preamble(SYSTEM_INSTRUCTION);
        if let Some(temperature) = self.temperature {
            config = config.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            config = config.with_max_tokens(max_tokens);
        }
        config
    }

    /// Fills gaps from environment variables resolved through `lookup`.
    ///
    /// A key already present in the file wins; model and endpoint variables override.
    pub fn with_environment<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if self.api_key.trim().is_empty()
            && let Some(api_key) = API_KEY_ENV_VARS.iter().find_map(|name| non_blank(*name))
        {
            self.api_key = api_key;
        }

        if let Some(model_name) = non_blank(MODEL_ENV_VAR) {
            self.model_name = model_name;
        }

        if let Some(endpoint) = non_blank(BASE_URL_ENV_VAR) {
            self.endpoint = endpoint;
        }

        self.normalized()
    }

    pub fn with_process_environment(self) -> Self {
        self.with_environment(|name| std::env::var(name).ok())
    }

    pub fn normalized(mut self) -> Self {
        self.provider_id = if self.provider_id.trim().is_empty() {
            default_provider_id()
        } else {
            self.provider_id.trim().to_string()
        };
        self.api_key = self.api_key.trim().to_string();
        self.endpoint = self.endpoint.trim().to_string();
        self.model_name = if self.model_name.trim().is_empty() {
            default_model_name()
        } else {
            self.model_name.trim().to_string()
        };
        self.temperature = self
            .temperature
            .filter(|value| value.is_finite())
            .map(|value| value.clamp(0.0, 2.0));
        self.max_tokens = self.max_tokens.filter(|value| *value > 0);

        self
    }
}

pub struct SettingsStore {
    settings: Arc<ArcSwap<ProviderSettings>>,
    config_path: PathBuf,
}

impl SettingsStore {
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|path| path.join(SETTINGS_DIRECTORY_NAME))
            .unwrap_or_else(|| PathBuf::from(".smartcare"))
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join(SETTINGS_FILE_NAME)
    }

    pub fn new(config_path: PathBuf) -> Self {
        let settings = Self::load_from_disk(&config_path);
        Self {
            settings: Arc::new(ArcSwap::from_pointee(settings)),
            config_path,
        }
    }

    pub fn load() -> Self {
        Self::new(Self::default_config_path())
    }

    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    pub fn settings(&self) -> Arc<ProviderSettings> {
        self.settings.load_full()
    }

    pub fn update(&self, settings: ProviderSettings) -> Result<(), SettingsError> {
        let normalized_settings = settings.normalized();
        self.persist(&normalized_settings)?;
        self.settings.store(Arc::new(normalized_settings));
        Ok(())
    }

    fn load_from_disk(path: &PathBuf) -> ProviderSettings {
        if !path.exists() {
            tracing::info!("settings file not found at {:?}, using defaults", path);
            return ProviderSettings::default();
        }

        let figment = Figment::from(Serialized::defaults(ProviderSettings::default()))
            .merge(Json::file(path));

        match figment.extract::<ProviderSettings>() {
            Ok(settings) => settings.normalized(),
            Err(error) => {
                tracing::warn!(
                    "failed to parse settings from {:?}: {}. using defaults",
                    path,
                    error
                );
                ProviderSettings::default()
            }
        }
    }

    fn persist(&self, settings: &ProviderSettings) -> Result<(), SettingsError> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).context(CreateDirSnafu {
                stage: "create-settings-directory",
                path: parent.to_path_buf(),
            })?;
        }

        let content = serde_json::to_string_pretty(settings).context(SerializeConfigSnafu {
            stage: "serialize-settings-json",
        })?;

        let temp_path = self.config_path.with_extension("json.tmp");
        std::fs::write(&temp_path, content).context(WriteFileSnafu {
            stage: "write-temporary-settings-file",
            path: temp_path.clone(),
        })?;

        std::fs::rename(&temp_path, &self.config_path).context(RenameTempFileSnafu {
            stage: "rename-temporary-settings-file",
            from: temp_path,
            to: self.config_path.clone(),
        })?;

        tracing::info!("saved settings to {:?}", self.config_path);
        Ok(())
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SettingsError {
    #[snafu(display("failed to create settings directory at {path:?} on `{stage}`: {source}"))]
    CreateDir {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("failed to serialize settings on `{stage}`: {source}"))]
    SerializeConfig {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("failed to write settings file at {path:?} on `{stage}`: {source}"))]
    WriteFile {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display(
        "failed to replace settings file from {from:?} to {to:?} on `{stage}`: {source}"
    ))]
    RenameTempFile {
        stage: &'static str,
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}

fn default_provider_id() -> String {
    DEFAULT_PROVIDER_ID.to_string()
}

fn default_model_name() -> String {
    DEFAULT_GEMINI_MODEL.to_string()
}
