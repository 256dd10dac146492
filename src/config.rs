use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable selecting the listening port
pub const PORT_ENV: &str = "PORT";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SurveyConfig {
    pub database: Option<String>,
    pub port: Option<u16>,
    pub static_dir: Option<String>,
}

impl SurveyConfig {
    /// Config written by `survey-server init`
    pub fn starter() -> Self {
        Self {
            database: Some(default_database_path().display().to_string()),
            port: Some(DEFAULT_PORT),
            static_dir: Some(default_static_dir().display().to_string()),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("survey.toml")
}

pub fn default_database_path() -> PathBuf {
    PathBuf::from("survey.db")
}

pub fn default_static_dir() -> PathBuf {
    PathBuf::from("frontend")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<SurveyConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: SurveyConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &SurveyConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Value of `PORT`, treating an empty variable as unset
pub fn port_from_env() -> Option<String> {
    std::env::var(PORT_ENV).ok().filter(|v| !v.trim().is_empty())
}

/// Settings the `serve` command runs with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeSettings {
    pub port: u16,
    pub database: PathBuf,
    pub static_dir: PathBuf,
}

/// Explicit command-line values, each overriding everything else
#[derive(Debug, Clone, Default)]
pub struct ServeOverrides {
    pub port: Option<u16>,
    pub database: Option<PathBuf>,
    pub static_dir: Option<PathBuf>,
}

impl ServeSettings {
    /// Resolve settings. Port precedence: flag, `PORT`, config file, default.
    pub fn resolve(
        overrides: ServeOverrides,
        config: Option<&SurveyConfig>,
        env_port: Option<&str>,
    ) -> anyhow::Result<Self> {
        let env_port = env_port
            .map(|raw| {
                raw.trim()
                    .parse::<u16>()
                    .map_err(|_| anyhow::anyhow!("invalid {} value: {:?}", PORT_ENV, raw))
            })
            .transpose()?;

        let port = overrides
            .port
            .or(env_port)
            .or(config.and_then(|c| c.port))
            .unwrap_or(DEFAULT_PORT);

        let database = overrides
            .database
            .or_else(|| config.and_then(|c| c.database.as_ref()).map(PathBuf::from))
            .unwrap_or_else(default_database_path);

        let static_dir = overrides
            .static_dir
            .or_else(|| config.and_then(|c| c.static_dir.as_ref()).map(PathBuf::from))
            .unwrap_or_else(default_static_dir);

        Ok(Self { port, database, static_dir })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ServeSettings::resolve(ServeOverrides::default(), None, None).unwrap();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.database, PathBuf::from("survey.db"));
        assert_eq!(settings.static_dir, PathBuf::from("frontend"));
    }

    #[test]
    fn test_port_precedence() {
        let config = SurveyConfig {
            port: Some(9000),
            ..Default::default()
        };

        let from_file = ServeSettings::resolve(ServeOverrides::default(), Some(&config), None).unwrap();
        assert_eq!(from_file.port, 9000);

        let from_env = ServeSettings::resolve(ServeOverrides::default(), Some(&config), Some("3000")).unwrap();
        assert_eq!(from_env.port, 3000);

        let overrides = ServeOverrides {
            port: Some(4000),
            ..Default::default()
        };
        let from_flag = ServeSettings::resolve(overrides, Some(&config), Some("3000")).unwrap();
        assert_eq!(from_flag.port, 4000);
    }

    #[test]
    fn test_invalid_env_port() {
        let err = ServeSettings::resolve(ServeOverrides::default(), None, Some("eighty")).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_write_and_load_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("survey.toml");

        assert_eq!(load_config(Some(&path)).unwrap(), None);

        write_config(&path, &SurveyConfig::starter(), false).unwrap();
        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded, SurveyConfig::starter());

        assert!(write_config(&path, &SurveyConfig::starter(), false).is_err());
        assert!(write_config(&path, &SurveyConfig::default(), true).is_ok());
    }

    #[test]
    fn test_ensure_db_dir() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("data").join("survey.db");

        ensure_db_dir(&db_path).unwrap();
        assert!(dir.path().join("data").is_dir());
    }
}
