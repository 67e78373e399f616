//! Language directory — code ↔ display name ↔ backend code.
//!
//! [`LanguageDirectory`] is an immutable mapping injected into the pipeline
//! at construction time rather than a module-level table, so alternate
//! locales or backends can be substituted without touching pipeline logic.
//!
//! Codes follow the transcription backend's ISO-639-3 style (`"eng"`,
//! `"urd"`, `"pus"`). The `backend_code` exists for backends that expect a
//! different identifier than the one the UI selects; for the default
//! directory the two are identical.

// ---------------------------------------------------------------------------
// Language
// ---------------------------------------------------------------------------

/// A single directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Language {
    /// Code used throughout the pipeline (e.g. `"eng"`).
    pub code: String,
    /// Human-readable display name (e.g. `"English"`).
    pub name: String,
    /// Code the translation / synthesis backend expects.
    pub backend_code: String,
}

impl Language {
    fn new(code: &str, name: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            backend_code: code.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// LanguageDirectory
// ---------------------------------------------------------------------------

/// Immutable set of supported languages.
///
/// # Example
/// ```rust
/// use medbridge::languages::LanguageDirectory;
///
/// let dir = LanguageDirectory::default();
/// assert_eq!(dir.display_name("urd"), "Urdu");
/// assert_eq!(dir.backend_code("eng"), "eng");
/// ```
#[derive(Debug, Clone)]
pub struct LanguageDirectory {
    entries: Vec<Language>,
}

impl LanguageDirectory {
    /// Build a directory from an explicit entry list.
    pub fn new(entries: Vec<Language>) -> Self {
        Self { entries }
    }

    /// Look up a language by its pipeline code.
    pub fn get(&self, code: &str) -> Option<&Language> {
        self.entries.iter().find(|l| l.code == code)
    }

    /// Display name for `code`, falling back to the raw code for languages
    /// the directory does not know about.
    pub fn display_name(&self, code: &str) -> String {
        self.get(code)
            .map(|l| l.name.clone())
            .unwrap_or_else(|| code.to_string())
    }

    /// Backend identifier for `code`, falling back to the raw code.
    pub fn backend_code(&self, code: &str) -> String {
        self.get(code)
            .map(|l| l.backend_code.clone())
            .unwrap_or_else(|| code.to_string())
    }

    /// All entries, in directory order.
    pub fn entries(&self) -> &[Language] {
        &self.entries
    }
}

impl Default for LanguageDirectory {
    /// The stock directory shipped with the application.
    fn default() -> Self {
        Self::new(vec![
            Language::new("eng", "English"),
            Language::new("spa", "Spanish"),
            Language::new("fra", "French"),
            Language::new("deu", "German"),
            Language::new("ita", "Italian"),
            Language::new("por", "Portuguese"),
            Language::new("rus", "Russian"),
            Language::new("jpn", "Japanese"),
            Language::new("kor", "Korean"),
            Language::new("zho", "Chinese"),
            Language::new("ara", "Arabic"),
            Language::new("hin", "Hindi"),
            Language::new("urd", "Urdu"),
            Language::new("pus", "Pashto"),
        ])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directory_contains_encounter_languages() {
        let dir = LanguageDirectory::default();
        assert!(dir.get("eng").is_some());
        assert!(dir.get("urd").is_some());
        assert!(dir.get("pus").is_some());
    }

    #[test]
    fn display_name_resolves_known_code() {
        let dir = LanguageDirectory::default();
        assert_eq!(dir.display_name("pus"), "Pashto");
    }

    #[test]
    fn display_name_falls_back_to_raw_code() {
        let dir = LanguageDirectory::default();
        assert_eq!(dir.display_name("xyz"), "xyz");
    }

    #[test]
    fn backend_code_defaults_to_pipeline_code() {
        let dir = LanguageDirectory::default();
        assert_eq!(dir.backend_code("ara"), "ara");
        assert_eq!(dir.backend_code("unknown"), "unknown");
    }

    #[test]
    fn custom_directory_overrides_backend_code() {
        let dir = LanguageDirectory::new(vec![Language {
            code: "eng".into(),
            name: "English".into(),
            backend_code: "en-US".into(),
        }]);
        assert_eq!(dir.backend_code("eng"), "en-US");
    }
}
