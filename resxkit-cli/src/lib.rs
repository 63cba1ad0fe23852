//! CLI library for testing purposes

pub mod config;
pub mod discovery;
pub mod validation;

use std::path::Path;
use std::sync::Arc;

use resxkit::{DefaultFileFilter, FileFilter, ResourceContext, ResourceManager};
use tracing::warn;

pub use config::{CONFIG_FILE_NAME, load_configuration};
pub use discovery::discover_files;

/// Loads configuration, discovers files below `root` and loads every resource group.
///
/// Groups that fail to load are reported and left out; the rest stay usable.
pub fn open_manager(
    root: &Path,
    config: Option<&Path>,
    excludes: &[String],
) -> Result<ResourceManager, String> {
    validation::validate_root_dir(root)?;
    let configuration = load_configuration(root, config)?;
    let files = discover_files(root, excludes)?;

    let filter: Arc<dyn FileFilter> = Arc::new(DefaultFileFilter::new(&configuration));
    let mut manager = ResourceManager::new(ResourceContext::new(configuration), filter);
    let handle = ResourceManager::spawn_load(manager.context().clone(), manager.filter(), files);
    let batch = handle
        .join()
        .map_err(|_| "Resource loading panicked".to_string())?;
    let summary = manager.apply_load(batch);
    for (identity, error) in &summary.errors {
        warn!("{}: {}", identity, error);
        eprintln!("Warning: skipped {}: {}", identity, error);
    }
    Ok(manager)
}
