//! Rule table registry: bundled default, file loading and the process-wide
//! table used by the CLI.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use tracing::{debug, info};

use crate::error::{Error, Result};

use super::types::RuleTable;

/// Default rule table compiled into the binary
const BUNDLED_RULES: &str = include_str!("../../config/rules/default.toml");

/// Table installed at process start
static GLOBAL_RULES: OnceLock<Arc<RuleTable>> = OnceLock::new();

/// Raw TOML of the bundled rule table
pub fn bundled_source() -> &'static str {
    BUNDLED_RULES
}

/// Parse the bundled rule table
pub fn bundled() -> Result<RuleTable> {
    RuleTable::from_toml_str(BUNDLED_RULES, "bundled rules")
}

/// Load and validate a rule table from disk
pub fn load_from_path(path: &Path) -> Result<RuleTable> {
    let content = fs::read_to_string(path).map_err(|e| Error::IoRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let table = RuleTable::from_toml_str(&content, &path.display().to_string())?;
    debug!(path = %path.display(), labels = table.labels.len(), "Rule table loaded");
    Ok(table)
}

/// The table at `path`, or the bundled table when no path is given
pub fn resolve(path: Option<&str>) -> Result<RuleTable> {
    match path {
        Some(p) => load_from_path(&PathBuf::from(shellexpand::tilde(p).as_ref())),
        None => bundled(),
    }
}

/// Install the process-wide rule table
///
/// Only the first call takes effect; later calls fail so a run can never
/// see two different tables.
pub fn install(table: RuleTable) -> Result<Arc<RuleTable>> {
    let table = Arc::new(table);
    GLOBAL_RULES
        .set(Arc::clone(&table))
        .map_err(|_| Error::Internal("rule table already installed".to_string()))?;
    info!(
        version = %table.version,
        labels = table.labels.len(),
        axes = table.axes.len(),
        "Rule table installed"
    );
    Ok(table)
}

/// The installed table, falling back to the bundled default
pub fn global() -> Result<Arc<RuleTable>> {
    if let Some(table) = GLOBAL_RULES.get() {
        return Ok(Arc::clone(table));
    }
    let table = Arc::new(bundled()?);
    Ok(Arc::clone(GLOBAL_RULES.get_or_init(|| table)))
}

/// Write the bundled rule table to a file as a starting point for edits
pub fn init_rules(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::rules_invalid(format!(
            "Rule file already exists: {}. Use --force to overwrite.",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| Error::IoWrite {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }
    fs::write(path, BUNDLED_RULES).map_err(|e| Error::IoWrite {
        path: path.to_path_buf(),
        source: e,
    })?;
    info!(path = %path.display(), "Rule table written");
    Ok(())
}
