use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::AppError;
use crate::settings::Settings;
use crate::store::ProjectStore;

// ── Application State ──────────────────────────────────────────────

/// State shared by every transport (stdio MCP, HTTP API, CLI).
///
/// Projects are not held open: each tool call names its `projectPath` and
/// gets a fresh [`ProjectStore`].
pub struct AppState {
    pub settings: Settings,
    pub config_dir: PathBuf,
    /// Serializes tool execution for transports that accept concurrent requests.
    pub gate: Mutex<()>,
}

impl AppState {
    pub fn new(settings: Settings, config_dir: PathBuf) -> Self {
        Self {
            settings,
            config_dir,
            gate: Mutex::new(()),
        }
    }

    /// Open a project with this server's backup retention applied.
    pub fn store(&self, project_path: &Path) -> Result<ProjectStore, AppError> {
        Ok(ProjectStore::open(project_path)?.with_backup_keep(self.settings.backup_keep))
    }

    /// Run `f` while holding the request gate.
    pub fn exclusive<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = self.gate.lock();
        f()
    }
}
