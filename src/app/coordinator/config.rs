//! Per-run options for the coordinator

use serde::{Deserialize, Serialize};

use crate::constants::catalog;

/// What a single run should do
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    /// Theme tag selecting the datasets of interest
    pub theme: String,
    /// Treat every matching dataset as due
    pub force_refresh: bool,
    /// Report what is due without fetching or touching the ledger
    pub dry_run: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            theme: catalog::DEFAULT_THEME.to_string(),
            force_refresh: false,
            dry_run: false,
        }
    }
}

impl RunOptions {
    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = theme.into();
        self
    }

    pub fn with_force_refresh(mut self, force: bool) -> Self {
        self.force_refresh = force;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_options_builders() {
        let options = RunOptions::default()
            .with_theme("Dialysis facilities")
            .with_force_refresh(true)
            .with_dry_run(true);
        assert_eq!(options.theme, "Dialysis facilities");
        assert!(options.force_refresh);
        assert!(options.dry_run);
        assert_eq!(RunOptions::default().theme, "Hospitals");
    }
}
