//! One-shot settings administration against the store.

use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::info;

use trendwatch_core::models::Settings;
use trendwatch_core::TermStore;

/// Current settings as pretty JSON.
pub fn show_settings(store: &dyn TermStore) -> Result<String> {
    let settings = store.load_settings().context("Failed to load settings")?;
    Ok(serde_json::to_string_pretty(&settings)?)
}

/// Parse and validate a settings document without touching the store.
pub fn parse_settings(json: &str) -> Result<Settings> {
    let settings: Settings = serde_json::from_str(json).context("Invalid settings JSON")?;

    if let Some(pin) = &settings.pinned_word {
        if pin.word.trim().is_empty() {
            bail!("pinnedWord.word must not be empty");
        }
    }
    if let Some(annotation) = settings
        .trend_annotations
        .iter()
        .find(|a| a.word.trim().is_empty())
    {
        bail!("trendAnnotations entry with message {:?} has an empty word", annotation.message);
    }

    Ok(settings)
}

/// Replace the stored settings with the contents of `path`. The running
/// service picks them up on its next settings refresh.
pub fn set_settings(store: &dyn TermStore, path: &Path) -> Result<Settings> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
    let settings = parse_settings(&json)
        .with_context(|| format!("Failed to parse settings file: {}", path.display()))?;
    store
        .save_settings(&settings)
        .context("Failed to save settings")?;
    info!(
        blacklist_trends = settings.blacklist_trends.len(),
        blacklist_words = settings.blacklist_words.len(),
        "Settings saved"
    );
    Ok(settings)
}
