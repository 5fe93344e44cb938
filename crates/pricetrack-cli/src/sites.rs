//! `sites` and `check-sites` handlers.

use std::path::Path;

use pricetrack_core::AppConfig;
use pricetrack_scraper::SiteRegistry;

/// Build the registry for a run from the configured sites file, or the
/// built-in profiles when the default file is absent.
///
/// # Errors
///
/// Returns an error if an explicitly configured file is missing or any
/// sites file fails to load.
pub(crate) fn load_registry(config: &AppConfig) -> anyhow::Result<SiteRegistry> {
    let resolved = pricetrack_core::resolve_sites(config)?;
    tracing::info!(
        source = %resolved.source,
        sites = resolved.sites.len(),
        "site profiles loaded"
    );
    Ok(SiteRegistry::from_configs(resolved.sites))
}

pub(crate) fn run_sites(config: &AppConfig) -> anyhow::Result<()> {
    let registry = load_registry(config)?;

    if registry.profiles().is_empty() {
        println!("no site profiles registered");
        return Ok(());
    }

    println!("{:<16}{:<24}{:<13}PRICE / PHOTO", "NAME", "HOST", "STRATEGY");
    for profile in registry.profiles() {
        println!(
            "{:<16}{:<24}{:<13}{} / {}",
            profile.name(),
            profile.host(),
            profile.strategy().to_string(),
            profile.price_chain(),
            profile.photo_chain()
        );
    }
    Ok(())
}

pub(crate) fn run_check_sites(path: &Path) -> anyhow::Result<()> {
    let file = pricetrack_core::load_sites(path)?;
    println!("{}: {} site(s) valid", path.display(), file.sites.len());
    Ok(())
}
