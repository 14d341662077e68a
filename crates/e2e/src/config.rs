//! Harness configuration

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use calcmatrix_common::{BuildVariant, CaseMatrix, NumberFormat};

use crate::error::{E2eError, E2eResult};
use crate::playwright::PlaywrightConfig;
use crate::preflight::PreflightConfig;

/// One build of the calculator, switched on or off for a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildToggle {
    pub id: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl BuildToggle {
    pub fn new(id: impl Into<String>, enabled: bool) -> Self {
        Self {
            id: id.into(),
            enabled,
        }
    }
}

/// Harness configuration, usually read from `calcmatrix.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Builds in the order they run
    pub builds: Vec<BuildToggle>,

    /// Digit rule for expected answers
    pub number_format: NumberFormat,

    /// Cases of one build executed at the same time
    pub concurrency: usize,

    /// Upper bound for a single case, setup included
    pub case_timeout_secs: u64,

    /// Directory of YAML case tables overriding the built-in ones
    pub tables_dir: Option<PathBuf>,

    /// Output directory for results
    pub output_dir: PathBuf,

    pub playwright: PlaywrightConfig,
    pub preflight: PreflightConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        let mut builds = vec![BuildToggle::new("Prototype", true)];
        builds.extend((1..=9).map(|n| BuildToggle::new(n.to_string(), false)));

        Self {
            builds,
            number_format: NumberFormat::default(),
            concurrency: 1,
            case_timeout_secs: 120,
            tables_dir: None,
            output_dir: PathBuf::from("test-results"),
            playwright: PlaywrightConfig::default(),
            preflight: PreflightConfig::default(),
        }
    }
}

impl HarnessConfig {
    /// Load configuration from file, falling back to defaults when absent
    pub fn load(path: &Path) -> E2eResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> E2eResult<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    pub fn validate(&self) -> E2eResult<()> {
        let mut seen = HashSet::new();
        for build in &self.builds {
            if build.id.trim().is_empty() {
                return Err(E2eError::Config("build id must not be empty".to_string()));
            }
            if !seen.insert(build.id.as_str()) {
                return Err(E2eError::Config(format!("build '{}' listed twice", build.id)));
            }
        }
        if self.enabled_builds().is_empty() {
            return Err(E2eError::Config("no build is enabled".to_string()));
        }
        if self.concurrency == 0 {
            return Err(E2eError::Config("concurrency must be at least 1".to_string()));
        }
        if self.case_timeout_secs == 0 {
            return Err(E2eError::Config("case_timeout_secs must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn enabled_builds(&self) -> Vec<BuildVariant> {
        self.builds
            .iter()
            .filter(|b| b.enabled)
            .map(|b| BuildVariant::new(b.id.clone()))
            .collect()
    }

    pub fn disabled_builds(&self) -> Vec<BuildVariant> {
        self.builds
            .iter()
            .filter(|b| !b.enabled)
            .map(|b| BuildVariant::new(b.id.clone()))
            .collect()
    }

    /// Enable exactly the given builds, appending unknown ids in order
    pub fn enable_only(&mut self, ids: &[String]) {
        for build in &mut self.builds {
            build.enabled = ids.contains(&build.id);
        }
        for id in ids {
            if !self.builds.iter().any(|b| &b.id == id) {
                self.builds.push(BuildToggle::new(id.clone(), true));
            }
        }
    }

    pub fn enable_all(&mut self) {
        for build in &mut self.builds {
            build.enabled = true;
        }
    }

    pub fn case_timeout(&self) -> Duration {
        Duration::from_secs(self.case_timeout_secs)
    }

    /// Built-in case tables, with overrides from `tables_dir` if set
    pub fn case_matrix(&self) -> E2eResult<CaseMatrix> {
        match &self.tables_dir {
            Some(dir) => Ok(CaseMatrix::load_overrides(dir)?),
            None => Ok(CaseMatrix::builtin()),
        }
    }
}
