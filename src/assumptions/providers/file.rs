//! Assumptions read from a JSON file, for offline and reproducible runs.
//!
//! The file holds one object per method, each in the same shape a
//! reasoning-model reply uses:
//!
//! ```json
//! {
//!   "dcf": { "stage_1_fcfe_growth_rates_pct": [10, 8, 6], "perpetual_growth_rate_g_pct": 3 },
//!   "multiples": { "selected_pe_multiple_value": 18, "selected_eps_value": 2.4 }
//! }
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::assumptions::parsing::assumptions_from_value;
use crate::assumptions::{AssumptionProvider, ProviderError};
use crate::models::{AssumptionKind, AssumptionRequest, Assumptions};

#[derive(Debug, Clone, Default, Deserialize)]
struct AssumptionFile {
    #[serde(default)]
    dcf: Option<Value>,
    #[serde(default)]
    multiples: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct FileAssumptionProvider {
    path: PathBuf,
    file: AssumptionFile,
}

impl FileAssumptionProvider {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read assumptions file: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse assumptions file: {}", path.display()))
            .map(|p| p.with_path(path))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let file: AssumptionFile = serde_json::from_str(content)?;
        Ok(Self {
            path: PathBuf::new(),
            file,
        })
    }

    fn with_path(mut self, path: &Path) -> Self {
        self.path = path.to_path_buf();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl AssumptionProvider for FileAssumptionProvider {
    async fn assumptions(&self, request: &AssumptionRequest) -> Result<Assumptions, ProviderError> {
        let section = match request.kind {
            AssumptionKind::Dcf => self.file.dcf.as_ref(),
            AssumptionKind::Multiples => self.file.multiples.as_ref(),
        };
        let value = section.ok_or_else(|| {
            ProviderError::Unavailable(format!("no {} section in assumptions file", request.kind))
        })?;
        assumptions_from_value(value, request)
    }

    fn name(&self) -> &str {
        "file"
    }
}
