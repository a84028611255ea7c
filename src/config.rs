use anyhow::{Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::llm::openai::OpenAiSettings;
use crate::llm::{DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL, DEFAULT_TEMPERATURE};

const CONFIG_DIR_NAME: &str = "chefchat";
const CONFIG_FILE_NAME: &str = "config.toml";
const TEMPERATURE_RANGE: std::ops::RangeInclusive<f32> = 0.0..=2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub config_path: PathBuf,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub temperature: f32,
    pub stream: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFileConfig {
    openai_api_key: Option<String>,
    openai_model: Option<String>,
    openai_base_url: Option<String>,
    temperature: Option<f32>,
    stream: Option<bool>,
}

impl AppConfig {
    /// Precedence, highest first: OS environment, `.env` in the working
    /// directory, config file, built-in defaults.
    pub fn load_with_path(explicit_path: Option<&Path>) -> Result<Self> {
        let (config_path, config_is_explicit) = match explicit_path {
            Some(path) => (path.to_path_buf(), true),
            None => (discover_config_path()?, false),
        };
        let file_config = if config_is_explicit {
            read_file_config(&config_path)?
        } else {
            load_file_config(&config_path)?.unwrap_or_default()
        };

        dotenvy::dotenv().ok();

        let temperature = file_config.temperature.unwrap_or(DEFAULT_TEMPERATURE);
        if !TEMPERATURE_RANGE.contains(&temperature) {
            return Err(config_error(
                &config_path,
                "temperature",
                &format!("{temperature} is outside 0.0..=2.0"),
            ));
        }

        Ok(Self {
            openai_api_key: env_non_empty("OPENAI_API_KEY")
                .or_else(|| non_empty_owned(file_config.openai_api_key.as_deref())),
            openai_model: env_non_empty("OPENAI_MODEL")
                .or_else(|| non_empty_owned(file_config.openai_model.as_deref()))
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            openai_base_url: env_non_empty("OPENAI_BASE_URL")
                .or_else(|| non_empty_owned(file_config.openai_base_url.as_deref()))
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            temperature,
            stream: file_config.stream.unwrap_or(true),
            config_path,
        })
    }

    pub fn openai_settings(&self) -> OpenAiSettings {
        OpenAiSettings {
            api_key: self.openai_api_key.clone(),
            model: self.openai_model.clone(),
            base_url: self.openai_base_url.clone(),
            temperature: self.temperature,
            stream: self.stream,
        }
    }
}

fn discover_config_path() -> Result<PathBuf> {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        let trimmed = xdg.trim();
        if trimmed.is_empty() {
            bail!("Failed to resolve config path: XDG_CONFIG_HOME is set but empty");
        }

        return Ok(PathBuf::from(trimmed)
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME));
    }

    let home = dirs::home_dir()
        .ok_or_else(|| anyhow!("Failed to resolve config path: HOME directory is unavailable"))?;

    Ok(home
        .join(".config")
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME))
}

fn load_file_config(config_path: &Path) -> Result<Option<RawFileConfig>> {
    if !config_path.is_file() {
        return Ok(None);
    }

    read_file_config(config_path).map(Some)
}

fn read_file_config(config_path: &Path) -> Result<RawFileConfig> {
    let config_text = fs::read_to_string(config_path).map_err(|err| {
        anyhow!(
            "Failed to load config {}: unable to read file: {err}",
            config_path.display()
        )
    })?;

    toml::from_str(&config_text)
        .map_err(|err| anyhow!("Failed to load config {}: {err}", config_path.display()))
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .and_then(|value| non_empty_owned(Some(value.as_str())))
}

fn non_empty_owned(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(ToOwned::to_owned)
}

fn config_error(config_path: &Path, key_path: &str, reason: &str) -> anyhow::Error {
    anyhow!(
        "Failed to load config {}: {key_path}: {reason}",
        config_path.display()
    )
}

#[cfg(test)]
mod tests {
    use super::AppConfig;
    use crate::llm::{DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL};
    use serial_test::serial;
    use std::env;
    use std::fs;
    use std::path::{Path, PathBuf};

    fn reset_vars() {
        unsafe {
            env::remove_var("OPENAI_API_KEY");
            env::remove_var("OPENAI_MODEL");
            env::remove_var("OPENAI_BASE_URL");
            env::remove_var("XDG_CONFIG_HOME");
        }
    }

    fn with_cwd<T>(path: &Path, f: impl FnOnce() -> T) -> T {
        let cwd = env::current_dir().expect("current dir");
        env::set_current_dir(path).expect("set current dir");
        let result = f();
        env::set_current_dir(cwd).expect("restore current dir");
        result
    }

    fn write_default_config(root: &Path, content: &str) -> PathBuf {
        let config_dir = root.join("chefchat");
        fs::create_dir_all(&config_dir).expect("create config dir");
        let path = config_dir.join("config.toml");
        fs::write(&path, content).expect("write config");
        path
    }

    #[test]
    #[serial]
    fn load_uses_defaults_when_nothing_is_configured() {
        let tmp = tempfile::tempdir().expect("tempdir");
        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp.path());
        }

        let cfg = with_cwd(tmp.path(), || AppConfig::load_with_path(None).expect("load config"));
        assert_eq!(cfg.openai_api_key, None);
        assert_eq!(cfg.openai_model, DEFAULT_OPENAI_MODEL);
        assert_eq!(cfg.openai_base_url, DEFAULT_OPENAI_BASE_URL);
        assert_eq!(cfg.temperature, 0.7);
        assert!(cfg.stream);
        assert_eq!(cfg.config_path, tmp.path().join("chefchat/config.toml"));
    }

    #[test]
    #[serial]
    fn load_env_overrides_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_default_config(
            tmp.path(),
            r#"
openai_api_key = "file_key"
openai_model = "file_model"
openai_base_url = "https://example.com/v1"
temperature = 0.2
stream = false
"#,
        );

        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp.path());
            env::set_var("OPENAI_API_KEY", "os_key");
            env::set_var("OPENAI_MODEL", "os_model");
        }

        let cfg = with_cwd(tmp.path(), || AppConfig::load_with_path(None).expect("load config"));
        assert_eq!(cfg.openai_api_key.as_deref(), Some("os_key"));
        assert_eq!(cfg.openai_model, "os_model");
        assert_eq!(cfg.openai_base_url, "https://example.com/v1");
        assert_eq!(cfg.temperature, 0.2);
        assert!(!cfg.stream);
    }

    #[test]
    #[serial]
    fn load_reads_key_from_dotenv_without_overriding_os_env() {
        let tmp = tempfile::tempdir().expect("tempdir");
        fs::write(
            tmp.path().join(".env"),
            "OPENAI_API_KEY=dotenv_key\nOPENAI_MODEL=dotenv_model\n",
        )
        .expect("write env file");

        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp.path());
            env::set_var("OPENAI_MODEL", "os_model");
        }

        let cfg = with_cwd(tmp.path(), || AppConfig::load_with_path(None).expect("load config"));
        assert_eq!(cfg.openai_api_key.as_deref(), Some("dotenv_key"));
        assert_eq!(cfg.openai_model, "os_model");
        reset_vars();
    }

    #[test]
    #[serial]
    fn load_with_explicit_path_reads_that_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let explicit = tmp.path().join("custom.toml");
        fs::write(&explicit, r#"openai_model = "from_explicit""#).expect("write config");

        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp.path());
        }

        let cfg = with_cwd(tmp.path(), || {
            AppConfig::load_with_path(Some(&explicit)).expect("load config")
        });
        assert_eq!(cfg.openai_model, "from_explicit");
        assert_eq!(cfg.config_path, explicit);
    }

    #[test]
    #[serial]
    fn load_fails_when_explicit_path_is_missing() {
        let tmp = tempfile::tempdir().expect("tempdir");
        reset_vars();

        let missing = tmp.path().join("nope.toml");
        let err = with_cwd(tmp.path(), || {
            AppConfig::load_with_path(Some(&missing)).expect_err("load should fail")
        });
        assert!(err.to_string().contains("unable to read file"));
    }

    #[test]
    #[serial]
    fn load_fails_when_xdg_config_home_is_empty() {
        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", "   ");
        }

        let err = AppConfig::load_with_path(None).expect_err("load should fail");
        assert!(
            err.to_string()
                .contains("Failed to resolve config path: XDG_CONFIG_HOME is set but empty")
        );
        reset_vars();
    }

    #[test]
    #[serial]
    fn load_fails_on_unknown_root_key() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_default_config(tmp.path(), "unknown_key = 1");

        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp.path());
        }

        let err = with_cwd(tmp.path(), || AppConfig::load_with_path(None).expect_err("load should fail"));
        assert!(err.to_string().contains("Failed to load config"));
        assert!(err.to_string().contains("unknown field"));
    }

    #[test]
    #[serial]
    fn load_fails_on_out_of_range_temperature() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_default_config(tmp.path(), "temperature = 3.5");

        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp.path());
        }

        let err = with_cwd(tmp.path(), || AppConfig::load_with_path(None).expect_err("load should fail"));
        assert!(
            err.to_string()
                .contains("temperature: 3.5 is outside 0.0..=2.0")
        );
    }

    #[test]
    #[serial]
    fn openai_settings_mirror_loaded_values() {
        let tmp = tempfile::tempdir().expect("tempdir");
        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp.path());
            env::set_var("OPENAI_API_KEY", "os_key");
        }

        let cfg = with_cwd(tmp.path(), || AppConfig::load_with_path(None).expect("load config"));
        let settings = cfg.openai_settings();
        assert_eq!(settings.api_key.as_deref(), Some("os_key"));
        assert_eq!(settings.model, DEFAULT_OPENAI_MODEL);
        assert!(settings.stream);
        reset_vars();
    }
}
