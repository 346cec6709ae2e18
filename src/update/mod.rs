//! Staged self-update mechanism.
//!
//! Updates are two-phase:
//!
//! 1. **Stage** (mid-session): download the replacement to
//!    `<active>.staged.part`, then atomically rename it to
//!    `<active>.staged`.  The running image is never touched, so a crash
//!    or power cut mid-download leaves at worst a `.part` orphan.
//! 2. **Promote** (next boot, before anything else runs): rename
//!    `<active>.staged` directly over `<active>`.  The rename is the
//!    commit point; there is no delete-first window with neither file
//!    present.
//!
//! A staged file is never read or executed by the running process —
//! promotion is the only path by which it becomes active.

use std::fs;
use std::path::PathBuf;

use log::{info, warn};

use crate::app::ports::HttpPort;
use crate::error::{PromoteError, StageError};

/// Suffix of a fully-staged replacement awaiting promotion.
const STAGED_SUFFIX: &str = ".staged";
/// Suffix of an in-progress download; never promoted.
const PART_SUFFIX: &str = ".staged.part";

// ───────────────────────────────────────────────────────────────
// Components
// ───────────────────────────────────────────────────────────────

/// The replaceable firmware components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// Appliance-protocol driver image.
    Wash,
    /// Control-loop image.
    Main,
}

impl Component {
    pub const ALL: [Component; 2] = [Component::Wash, Component::Main];

    /// Active file name inside the data directory.
    pub fn active_name(self) -> &'static str {
        match self {
            Self::Wash => "wash",
            Self::Main => "main",
        }
    }
}

impl core::fmt::Display for Component {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.active_name())
    }
}

// ───────────────────────────────────────────────────────────────
// Updater
// ───────────────────────────────────────────────────────────────

/// Outcome of a staging attempt that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// Body written and committed to `<active>.staged`.
    Staged,
    /// Server answered non-200 (or body over budget); nothing written.
    /// The command is still acknowledged upstream — the update is simply
    /// dropped until re-issued.
    Skipped,
}

pub struct Updater {
    dir: PathBuf,
    max_bytes: usize,
}

impl Updater {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    fn active_path(&self, component: Component) -> PathBuf {
        self.dir.join(component.active_name())
    }

    fn staged_path(&self, component: Component) -> PathBuf {
        self.dir
            .join(format!("{}{}", component.active_name(), STAGED_SUFFIX))
    }

    fn part_path(&self, component: Component) -> PathBuf {
        self.dir
            .join(format!("{}{}", component.active_name(), PART_SUFFIX))
    }

    /// Whether a staged replacement is waiting for the next boot.
    pub fn is_staged(&self, component: Component) -> bool {
        self.staged_path(component).exists()
    }

    /// Download `url` and stage it as the replacement for `component`.
    ///
    /// Ok(Skipped) on a non-200 response: no file is written and the
    /// caller proceeds as if no update existed.  Err only on transport
    /// or filesystem failure.
    pub fn stage(
        &self,
        component: Component,
        url: &str,
        http: &mut impl HttpPort,
    ) -> Result<StageOutcome, StageError> {
        let response = http.get(url).map_err(StageError::Download)?;
        if !response.is_ok() {
            warn!(
                "update[{component}]: server answered {} for {url}, nothing staged",
                response.status
            );
            return Ok(StageOutcome::Skipped);
        }
        if response.body.len() > self.max_bytes {
            warn!(
                "update[{component}]: body {}B exceeds {}B budget, nothing staged",
                response.body.len(),
                self.max_bytes
            );
            return Ok(StageOutcome::Skipped);
        }

        let part = self.part_path(component);
        fs::write(&part, &response.body).map_err(|e| StageError::Write(e.kind()))?;

        // Commit point: a crash before this rename leaves only the .part
        // orphan, which is ignored at boot and overwritten on retry.
        fs::rename(&part, self.staged_path(component)).map_err(|e| {
            let _ = fs::remove_file(&part);
            StageError::Commit(e.kind())
        })?;

        info!(
            "update[{component}]: staged {}B, active after reboot",
            response.body.len()
        );
        Ok(StageOutcome::Staged)
    }

    /// Promote every staged component.  Runs once at boot, before any
    /// networking or appliance logic.
    ///
    /// Best-effort per component: a failure on `wash` does not block
    /// `main`.  With nothing staged this is a no-op returning Ok.
    pub fn promote_all(&self) -> Result<(), PromoteError> {
        let mut first_failure = None;

        for component in Component::ALL {
            let staged = self.staged_path(component);
            if !staged.exists() {
                continue;
            }
            // Atomic replace over the active file; no delete-first gap.
            match fs::rename(&staged, self.active_path(component)) {
                Ok(()) => info!("update[{component}]: promoted staged file"),
                Err(e) => {
                    warn!("update[{component}]: promotion failed: {e}");
                    first_failure.get_or_insert(PromoteError::Rename(e.kind()));
                }
            }
        }

        match first_failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
