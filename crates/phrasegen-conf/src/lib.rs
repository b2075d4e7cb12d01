use std::fs;

use camino::Utf8Path;
use camino::Utf8PathBuf;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError as ExternalConfigError;
use config::Environment;
use config::File;
use config::FileFormat;
use config::builder::DefaultState;
use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration build/deserialize error")]
    Config(#[from] ExternalConfigError),
    #[error("Failed to read Cargo.toml")]
    ManifestIo(#[from] std::io::Error),
    #[error("Failed to parse Cargo.toml TOML")]
    ManifestParse(#[from] toml::de::Error),
    #[error("Failed to serialize extracted Cargo.toml metadata")]
    ManifestSerialize(#[from] toml::ser::Error),
}

/// What code generation does when a placeholder names a macro occurrence the
/// current expansion never produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingOccurrence {
    /// Abort generation for the template.
    #[default]
    Error,
    /// Span placeholders become `0`, variable placeholders become empty text.
    Empty,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub debug: bool,
    pub default_language: String,
    /// Text prepended to every training input; each prefix yields its own expansions.
    pub prefixes: Vec<String>,
    pub missing_occurrence: MissingOccurrence,
    /// Upper bound on expansions per template. `None` means unbounded.
    pub max_expansions: Option<usize>,
    /// Log a progress line every this many training samples.
    pub progress_interval: usize,
    pub keep_punctuation: bool,
    /// Commit a module even when some of its templates failed.
    pub keep_going: bool,
    pub store_path: Option<Utf8PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            default_language: "en".to_string(),
            prefixes: Vec::new(),
            missing_occurrence: MissingOccurrence::Error,
            max_expansions: None,
            progress_interval: 100,
            keep_punctuation: false,
            keep_going: false,
            store_path: None,
        }
    }
}

#[must_use]
pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "phrasegen", "phrasegen")
}

impl Settings {
    pub fn new(project_root: &Utf8Path) -> Result<Self, ConfigError> {
        let user_config_file =
            project_dirs().map(|proj_dirs| proj_dirs.config_dir().join("phrasegen.toml"));
        let user_config_file =
            user_config_file.and_then(|path| Utf8PathBuf::from_path_buf(path).ok());

        let builder = Self::builder(project_root, user_config_file.as_deref())?.add_source(
            Environment::with_prefix("PHRASEGEN")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("prefixes"),
        );

        let settings = builder.build()?.try_deserialize()?;
        tracing::debug!("Loaded settings for {}: {:?}", project_root, settings);
        Ok(settings)
    }

    fn load_from_paths(
        project_root: &Utf8Path,
        user_config_path: Option<&Utf8Path>,
    ) -> Result<Self, ConfigError> {
        let config = Self::builder(project_root, user_config_path)?.build()?;
        let settings = config.try_deserialize()?;
        Ok(settings)
    }

    fn builder(
        project_root: &Utf8Path,
        user_config_path: Option<&Utf8Path>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = user_config_path {
            builder = builder.add_source(
                File::from(path.as_std_path())
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let manifest_path = project_root.join("Cargo.toml");
        if manifest_path.exists() {
            let content = fs::read_to_string(&manifest_path)?;
            let manifest: toml::Table = toml::from_str(&content)?;

            let metadata = manifest
                .get("package")
                .and_then(|package| package.get("metadata"))
                .and_then(|metadata| metadata.get("phrasegen"))
                .and_then(|value| value.as_table());

            if let Some(table) = metadata {
                let metadata_toml = toml::to_string(table)?;
                builder = builder.add_source(File::from_str(&metadata_toml, FileFormat::Toml));
            }
        }

        builder = builder.add_source(
            File::from(project_root.join(".phrasegen.toml").as_std_path())
                .format(FileFormat::Toml)
                .required(false),
        );

        builder = builder.add_source(
            File::from(project_root.join("phrasegen.toml").as_std_path())
                .format(FileFormat::Toml)
                .required(false),
        );

        Ok(builder)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    fn root(dir: &tempfile::TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    mod defaults {
        use super::*;

        #[test]
        fn test_load_no_files() {
            let dir = tempdir().unwrap();
            let settings = Settings::load_from_paths(&root(&dir), None).unwrap();
            assert_eq!(settings, Settings::default());
            assert_eq!(settings.default_language, "en");
            assert_eq!(settings.progress_interval, 100);
            assert_eq!(settings.missing_occurrence, MissingOccurrence::Error);
        }
    }

    mod project_files {
        use super::*;

        #[test]
        fn test_load_phrasegen_toml_only() {
            let dir = tempdir().unwrap();
            fs::write(dir.path().join("phrasegen.toml"), "debug = true").unwrap();
            let settings = Settings::load_from_paths(&root(&dir), None).unwrap();
            assert!(settings.debug);
        }

        #[test]
        fn test_load_dot_phrasegen_toml_only() {
            let dir = tempdir().unwrap();
            fs::write(
                dir.path().join(".phrasegen.toml"),
                "prefixes = [\"computer, \", \"\"]\nmax_expansions = 500",
            )
            .unwrap();
            let settings = Settings::load_from_paths(&root(&dir), None).unwrap();
            assert_eq!(settings.prefixes, vec!["computer, ".to_string(), String::new()]);
            assert_eq!(settings.max_expansions, Some(500));
        }

        #[test]
        fn test_load_cargo_metadata_only() {
            let dir = tempdir().unwrap();
            let content = "[package]\nname = \"skills\"\n\n[package.metadata.phrasegen]\nmissing_occurrence = \"empty\"\n";
            fs::write(dir.path().join("Cargo.toml"), content).unwrap();
            let settings = Settings::load_from_paths(&root(&dir), None).unwrap();
            assert_eq!(settings.missing_occurrence, MissingOccurrence::Empty);
        }

        #[test]
        fn test_cargo_without_metadata_uses_defaults() {
            let dir = tempdir().unwrap();
            fs::write(dir.path().join("Cargo.toml"), "[package]\nname = \"skills\"\n").unwrap();
            let settings = Settings::load_from_paths(&root(&dir), None).unwrap();
            assert_eq!(settings, Settings::default());
        }
    }

    mod priority {
        use super::*;

        #[test]
        fn test_project_priority_phrasegen_overrides_dot_phrasegen() {
            let dir = tempdir().unwrap();
            fs::write(dir.path().join(".phrasegen.toml"), "default_language = \"de\"").unwrap();
            fs::write(dir.path().join("phrasegen.toml"), "default_language = \"fr\"").unwrap();
            let settings = Settings::load_from_paths(&root(&dir), None).unwrap();
            assert_eq!(settings.default_language, "fr");
        }

        #[test]
        fn test_project_priority_dot_phrasegen_overrides_cargo() {
            let dir = tempdir().unwrap();
            let manifest = "[package]\nname = \"skills\"\n\n[package.metadata.phrasegen]\nkeep_going = false\n";
            fs::write(dir.path().join("Cargo.toml"), manifest).unwrap();
            fs::write(dir.path().join(".phrasegen.toml"), "keep_going = true").unwrap();
            let settings = Settings::load_from_paths(&root(&dir), None).unwrap();
            assert!(settings.keep_going);
        }

        #[test]
        fn test_user_priority_project_overrides_user() {
            let user_dir = tempdir().unwrap();
            let project_dir = tempdir().unwrap();
            let user_conf_path = root(&user_dir).join("phrasegen.toml");
            fs::write(&user_conf_path, "progress_interval = 10").unwrap();
            fs::write(
                project_dir.path().join("phrasegen.toml"),
                "progress_interval = 1000",
            )
            .unwrap();

            let settings =
                Settings::load_from_paths(&root(&project_dir), Some(&user_conf_path)).unwrap();
            assert_eq!(settings.progress_interval, 1000);
        }
    }

    mod user_config {
        use super::*;

        #[test]
        fn test_load_user_config_only() {
            let user_dir = tempdir().unwrap();
            let project_dir = tempdir().unwrap();
            let user_conf_path = root(&user_dir).join("phrasegen.toml");
            fs::write(&user_conf_path, "keep_punctuation = true").unwrap();

            let settings =
                Settings::load_from_paths(&root(&project_dir), Some(&user_conf_path)).unwrap();
            assert!(settings.keep_punctuation);
        }

        #[test]
        fn test_no_user_config_file_present() {
            let user_dir = tempdir().unwrap();
            let project_dir = tempdir().unwrap();
            let user_conf_path = root(&user_dir).join("phrasegen.toml");
            fs::write(project_dir.path().join("phrasegen.toml"), "debug = true").unwrap();

            let settings =
                Settings::load_from_paths(&root(&project_dir), Some(&user_conf_path)).unwrap();
            assert!(settings.debug);
        }
    }

    mod errors {
        use super::*;

        #[test]
        fn test_invalid_toml_content() {
            let dir = tempdir().unwrap();
            fs::write(dir.path().join("phrasegen.toml"), "debug = not_a_boolean").unwrap();
            let result = Settings::load_from_paths(&root(&dir), None);
            assert!(matches!(result.unwrap_err(), ConfigError::Config(_)));
        }

        #[test]
        fn test_invalid_missing_occurrence_policy() {
            let dir = tempdir().unwrap();
            fs::write(dir.path().join("phrasegen.toml"), "missing_occurrence = \"zero\"").unwrap();
            let result = Settings::load_from_paths(&root(&dir), None);
            assert!(matches!(result.unwrap_err(), ConfigError::Config(_)));
        }

        #[test]
        fn test_invalid_cargo_manifest() {
            let dir = tempdir().unwrap();
            fs::write(dir.path().join("Cargo.toml"), "[package\nname = ").unwrap();
            let result = Settings::load_from_paths(&root(&dir), None);
            assert!(matches!(result.unwrap_err(), ConfigError::ManifestParse(_)));
        }
    }
}
