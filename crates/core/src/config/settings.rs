use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

const SETTINGS_FILE_NAMES: [&str; 2] = [".runbridge.json", "runbridge.json"];
const STORE_DIR: &str = ".runbridge";
const STORE_FILE: &str = "run-store.json";

/// Process environment consulted while locating settings and the store
#[derive(Debug, Clone, Default)]
pub struct SettingsEnv {
    /// `RUNBRIDGE_ROOT`: highest directory searched for a settings file
    pub root: Option<PathBuf>,
    /// `HOME`: search boundary when no root is set
    pub home: Option<PathBuf>,
    /// `RUNBRIDGE_STORE`: explicit store location
    pub store: Option<PathBuf>,
}

impl SettingsEnv {
    pub fn from_env() -> Self {
        Self {
            root: std::env::var_os("RUNBRIDGE_ROOT").map(PathBuf::from),
            home: std::env::var_os("HOME").map(PathBuf::from),
            store: std::env::var_os("RUNBRIDGE_STORE").map(PathBuf::from),
        }
    }

    fn boundary(&self) -> Option<&Path> {
        self.root.as_deref().or(self.home.as_deref())
    }
}

/// Host settings for the Run core
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RunSettings {
    /// Location of the persisted `run` section
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,
    /// Preferred executor per input extension for quick-run actions
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub default_executors: IndexMap<String, String>,
    /// Directory used by the `cwd` working directory policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,

    /// File the settings were loaded from (internal, not exposed in JSON)
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl RunSettings {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut settings: Self = serde_json::from_str(&contents)
            .map_err(|e| Error::ConfigError(format!("Failed to parse settings: {e}")))?;
        settings.source = Some(path.to_path_buf());
        Ok(settings)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize settings: {e}")))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Walk up from `start_path` looking for a settings file, stopping at `boundary`
    pub fn find_settings_file(start_path: &Path, boundary: Option<&Path>) -> Option<PathBuf> {
        let mut current = if start_path.is_file() {
            start_path.parent()?
        } else {
            start_path
        };

        loop {
            for name in SETTINGS_FILE_NAMES {
                let candidate = current.join(name);
                if candidate.is_file() {
                    tracing::debug!("Found settings at {:?}", candidate);
                    return Some(candidate);
                }
            }

            if boundary.is_some_and(|b| current == b) {
                tracing::debug!("Reached settings search boundary at {:?}", current);
                return None;
            }
            current = current.parent()?;
        }
    }

    /// Settings that apply to `start_path`, or defaults when none are found
    pub fn discover(start_path: &Path, env: &SettingsEnv) -> Result<Self> {
        match Self::find_settings_file(start_path, env.boundary()) {
            Some(path) => Self::load_from_file(&path),
            None => {
                tracing::debug!("No settings found from {:?}, using defaults", start_path);
                Ok(Self::default())
            }
        }
    }

    /// Where the persisted store lives.
    ///
    /// `RUNBRIDGE_STORE` wins; otherwise `store_path` resolved against the
    /// settings file's directory; otherwise `.runbridge/run-store.json` next
    /// to the settings file, under `$HOME`, or under the working directory.
    pub fn resolved_store_path(&self, env: &SettingsEnv) -> PathBuf {
        if let Some(store) = &env.store {
            return store.clone();
        }

        let settings_dir = self
            .source
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf);

        if let Some(store_path) = &self.store_path {
            return match (&settings_dir, store_path.is_relative()) {
                (Some(dir), true) => dir.join(store_path),
                _ => store_path.clone(),
            };
        }

        let base = settings_dir
            .or_else(|| env.home.clone())
            .unwrap_or_else(|| self.working_dir());
        base.join(STORE_DIR).join(STORE_FILE)
    }

    /// Directory used for the `cwd` policy
    pub fn working_dir(&self) -> PathBuf {
        self.working_dir
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn default_executor_for(&self, extension: &str) -> Option<&str> {
        self.default_executors.get(extension).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_settings_serialization() {
        let mut settings = RunSettings::default();
        settings
            .default_executors
            .insert("py".to_string(), "external-terminal".to_string());
        settings.store_path = Some(PathBuf::from("state/run.json"));

        let value = serde_json::to_value(&settings).unwrap();
        assert_eq!(
            value,
            json!({
                "store_path": "state/run.json",
                "default_executors": {"py": "external-terminal"}
            })
        );
        let parsed: RunSettings = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_discover_walks_up_to_boundary() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let nested = root.join("project").join("src");
        fs::create_dir_all(&nested).unwrap();
        fs::write(
            root.join("project").join(".runbridge.json"),
            r#"{"default_executors": {"sh": "external-terminal"}}"#,
        )
        .unwrap();
        fs::write(root.join("runbridge.json"), r#"{"working_dir": "/outer"}"#).unwrap();

        let env = SettingsEnv {
            root: Some(root.to_path_buf()),
            ..Default::default()
        };
        let settings = RunSettings::discover(&nested, &env).unwrap();
        assert_eq!(settings.default_executor_for("sh"), Some("external-terminal"));
        assert!(settings.working_dir.is_none());

        let bounded = SettingsEnv {
            root: Some(nested.clone()),
            ..Default::default()
        };
        let settings = RunSettings::discover(&nested, &bounded).unwrap();
        assert_eq!(settings, RunSettings::default());
    }

    #[test]
    fn test_store_path_resolution() {
        let temp_dir = TempDir::new().unwrap();
        let settings_path = temp_dir.path().join(".runbridge.json");
        fs::write(&settings_path, r#"{"store_path": "state/run.json"}"#).unwrap();
        let settings = RunSettings::load_from_file(&settings_path).unwrap();

        let env = SettingsEnv::default();
        assert_eq!(
            settings.resolved_store_path(&env),
            temp_dir.path().join("state/run.json")
        );

        let explicit = SettingsEnv {
            store: Some(PathBuf::from("/var/lib/run.json")),
            ..Default::default()
        };
        assert_eq!(
            settings.resolved_store_path(&explicit),
            PathBuf::from("/var/lib/run.json")
        );

        let home_only = SettingsEnv {
            home: Some(PathBuf::from("/home/user")),
            ..Default::default()
        };
        assert_eq!(
            RunSettings::default().resolved_store_path(&home_only),
            PathBuf::from("/home/user/.runbridge/run-store.json")
        );
    }

    #[test]
    fn test_invalid_settings_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(".runbridge.json");
        fs::write(&path, "{ nope").unwrap();
        assert!(matches!(
            RunSettings::load_from_file(&path),
            Err(Error::ConfigError(_))
        ));
    }
}
