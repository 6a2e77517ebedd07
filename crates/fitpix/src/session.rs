//! State held by the app between renders.

use fitpix_core::preset::STANDARD;
use fitpix_core::{KeyValueStore, Preset, ProcessingOptions, SettingsError, SettingsStore};

/// The settings store plus the values the UI shows from it.
///
/// Reads that fail at startup fall back to the Standard preset so the
/// page stays usable; the failure is logged.
pub struct Session<S> {
    store: SettingsStore<S>,
    active_name: String,
    options: ProcessingOptions,
}

impl<S: KeyValueStore> Session<S> {
    /// Load the active preset name and options from `backend`, seeding
    /// defaults on first run.
    pub fn load(backend: S) -> Self {
        let mut store = SettingsStore::new(backend);
        let active_name = store.get_active_preset_name().unwrap_or_else(|e| {
            log::error!("reading active preset name: {e}");
            STANDARD.to_owned()
        });
        let options = store.get_active_options().unwrap_or_else(|e| {
            log::error!("reading active options: {e}");
            ProcessingOptions::default()
        });
        log::debug!("loaded settings: {active_name} {options:?}");
        Self {
            store,
            active_name,
            options,
        }
    }

    /// Name of the active preset.
    pub fn active_name(&self) -> &str {
        &self.active_name
    }

    /// Options for the next run.
    pub const fn options(&self) -> ProcessingOptions {
        self.options
    }

    /// All presets, in display order.
    pub fn presets(&self) -> Vec<Preset> {
        self.store.list_presets()
    }

    /// The underlying key-value backend.
    pub const fn backend(&self) -> &S {
        self.store.backend()
    }

    /// Switch to the preset called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if the name is unknown or the write
    /// fails; the session is left unchanged.
    pub fn select_preset(&mut self, name: &str) -> Result<(), SettingsError> {
        let options = self.store.apply_preset(name)?;
        name.clone_into(&mut self.active_name);
        self.options = options;
        Ok(())
    }

    /// Save hand-edited options as the Custom preset and activate it.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if the options are invalid or the write
    /// fails; the session is left unchanged.
    pub fn save_custom(&mut self, options: ProcessingOptions) -> Result<(), SettingsError> {
        self.store.save_custom_options(&options)?;
        fitpix_core::preset::CUSTOM.clone_into(&mut self.active_name);
        self.options = options;
        Ok(())
    }
}

/// Counter that tells a finished run whether it is still wanted.
///
/// Every new trigger (a file pick, an upload, an options change) calls
/// [`begin`](Self::begin); a run that completes with an older token
/// must discard its result.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

impl Generation {
    /// Invalidate every earlier token and return the new one.
    pub const fn begin(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(1);
        self.0
    }

    /// Whether `token` came from the latest [`begin`](Self::begin).
    pub const fn is_current(self, token: u64) -> bool {
        self.0 == token
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use fitpix_core::preset::{CUSTOM, SOCIAL_MEDIA};
    use fitpix_core::settings::ACTIVE_OPTIONS_KEY;
    use fitpix_core::{MemoryStore, OutputFormat};

    use super::*;

    #[test]
    fn first_load_shows_standard() {
        let session = Session::load(MemoryStore::new());
        assert_eq!(session.active_name(), STANDARD);
        assert_eq!(session.options(), ProcessingOptions::default());
        assert_eq!(session.presets().len(), 5);
    }

    #[test]
    fn selecting_a_preset_updates_view_and_store() {
        let mut session = Session::load(MemoryStore::new());
        session.select_preset(SOCIAL_MEDIA).unwrap();
        assert_eq!(session.active_name(), SOCIAL_MEDIA);
        assert_eq!(session.options().max_width, 1080);

        let reloaded = Session::load(session.backend().clone());
        assert_eq!(reloaded.active_name(), SOCIAL_MEDIA);
        assert_eq!(reloaded.options(), session.options());
    }

    #[test]
    fn unknown_preset_leaves_session_alone() {
        let mut session = Session::load(MemoryStore::new());
        assert!(session.select_preset("Ultra").is_err());
        assert_eq!(session.active_name(), STANDARD);
    }

    #[test]
    fn saving_custom_activates_it() {
        let mut session = Session::load(MemoryStore::new());
        let edited = ProcessingOptions::new(300_000, 800, 600, 0.7, OutputFormat::Jpeg);
        session.save_custom(edited).unwrap();
        assert_eq!(session.active_name(), CUSTOM);
        assert_eq!(session.options(), edited);
    }

    #[test]
    fn invalid_custom_options_are_rejected() {
        let mut session = Session::load(MemoryStore::new());
        let mut edited = ProcessingOptions::default();
        edited.max_width = 0;
        assert!(session.save_custom(edited).is_err());
        assert_eq!(session.active_name(), STANDARD);
    }

    #[test]
    fn newer_generation_invalidates_older_runs() {
        let mut generation = Generation::default();
        let first = generation.begin();
        assert!(generation.is_current(first));

        let second = generation.begin();
        assert!(!generation.is_current(first));
        assert!(generation.is_current(second));
    }

    #[test]
    fn stale_completion_is_dropped_after_new_pick() {
        // upload A starts processing, then B is picked before A finishes
        let mut generation = Generation::default();
        let run_a = generation.begin();
        generation.begin(); // pick of B
        let run_b = generation.begin(); // processing of B

        let landed: Vec<_> = [run_a, run_b]
            .into_iter()
            .filter(|&token| generation.is_current(token))
            .collect();
        assert_eq!(landed, [run_b]);
    }

    #[test]
    fn corrupt_record_falls_back_to_defaults() {
        let mut backend = MemoryStore::new();
        backend.set(ACTIVE_OPTIONS_KEY, "not json").unwrap();
        let session = Session::load(backend);
        assert_eq!(session.options(), ProcessingOptions::default());
    }
}
