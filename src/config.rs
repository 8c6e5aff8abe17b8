use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::quiz::PASSING_SCORE;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory backing the persisted store, in-memory only when unset
    pub storage_dir: Option<PathBuf>,
    /// Daily-rotated log directory, stdout when unset
    pub log_dir: Option<PathBuf>,
    pub passing_score: f64,
    pub registration: RegistrationConfig,
    pub certificate: CertificatePolicy,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    /// New registrations start `approved` instead of `pending`
    pub auto_approve: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificatePolicy {
    /// Only `approved` registrations count toward certificate eligibility
    pub require_approval: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: None,
            log_dir: None,
            passing_score: PASSING_SCORE,
            registration: RegistrationConfig::default(),
            certificate: CertificatePolicy::default(),
        }
    }
}

impl Config {
    /// Load from a TOML file if given, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    anyhow::anyhow!("failed to read config {}: {}", path.display(), e)
                })?;
                toml::from_str::<Config>(&content)?
            }
            None => Config::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> anyhow::Result<()> {
        let _ = dotenvy::dotenv();
        if let Ok(dir) = dotenvy::var("WORKSHOP_STORAGE_DIR") {
            self.storage_dir = Some(PathBuf::from(dir));
        }
        if let Ok(dir) = dotenvy::var("WORKSHOP_LOG_DIR") {
            self.log_dir = Some(PathBuf::from(dir));
        }
        if let Ok(score) = dotenvy::var("WORKSHOP_PASSING_SCORE") {
            self.passing_score = score
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid WORKSHOP_PASSING_SCORE {:?}: {}", score, e))?;
        }
        if !(0.0..=100.0).contains(&self.passing_score) {
            anyhow::bail!("passing score must be within 0..=100, got {}", self.passing_score);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            passing_score = 80.0
            [certificate]
            require_approval = true
            "#,
        )
        .unwrap();
        assert_eq!(config.passing_score, 80.0);
        assert!(config.certificate.require_approval);
        assert!(!config.registration.auto_approve);
        assert!(config.storage_dir.is_none());
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.passing_score, 70.0);
        assert!(!config.certificate.require_approval);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("nope.toml"))).is_err());
    }
}
