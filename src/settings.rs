use std::fs;
use std::path::PathBuf;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dataset::DataSet;
use crate::domain::{Mode, movie_name_of};
use crate::error::Bax2BamError;

pub const DEFAULT_SETTINGS_FILE: &str = "bax2bam.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub mode: Option<Mode>,
    #[serde(default)]
    pub output_prefix: Option<String>,
    #[serde(default)]
    pub output_xml: Option<String>,
    #[serde(default)]
    pub transcoder: Option<String>,
}

// command line values win over the settings file
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub modes: Vec<Mode>,
    pub inputs: Vec<String>,
    pub output_prefix: Option<String>,
    pub dataset_xml: Option<String>,
    pub output_xml: Option<String>,
    pub transcoder: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    // None when conflicting modes were requested
    pub mode: Option<Mode>,
    pub input_files: Vec<String>,
    pub output_bam_prefix: String,
    pub output_bam_filename: String,
    pub scraps_bam_filename: Option<String>,
    pub dataset_xml_filename: Option<String>,
    pub output_xml_filename: Option<String>,
    pub transcoder: Option<String>,
}

impl Settings {
    pub fn with_outputs(mode: Option<Mode>, prefix: &str) -> Self {
        let (output_bam_filename, scraps_bam_filename) = match mode {
            Some(mode) => (
                format!("{prefix}.{}", mode.output_suffix()),
                mode.scraps_suffix()
                    .map(|suffix| format!("{prefix}.{suffix}")),
            ),
            None => (String::new(), None),
        };
        Self {
            mode,
            input_files: Vec::new(),
            output_bam_prefix: prefix.to_string(),
            output_bam_filename,
            scraps_bam_filename,
            dataset_xml_filename: None,
            output_xml_filename: None,
            transcoder: None,
        }
    }

    pub fn output_xml_path(&self) -> String {
        match non_empty(self.output_xml_filename.clone()) {
            Some(path) => path,
            None => format!("{}.dataset.xml", self.output_bam_prefix),
        }
    }
}

pub struct SettingsLoader;

impl SettingsLoader {
    pub fn resolve(
        path: Option<&str>,
        overrides: SettingsOverrides,
    ) -> Result<Settings, Bax2BamError> {
        let file = match path {
            Some(path) => Self::read_file(PathBuf::from(path))?,
            None => {
                let default_path = PathBuf::from(DEFAULT_SETTINGS_FILE);
                if default_path.exists() {
                    Self::read_file(default_path)?
                } else {
                    SettingsFile::default()
                }
            }
        };
        Self::resolve_settings(file, overrides)
    }

    fn read_file(path: PathBuf) -> Result<SettingsFile, Bax2BamError> {
        let content =
            fs::read_to_string(&path).map_err(|_| Bax2BamError::ConfigRead(path.clone()))?;
        debug!(path = %path.display(), "loaded settings file");
        serde_json::from_str(&content).map_err(|err| Bax2BamError::ConfigParse(err.to_string()))
    }

    pub fn resolve_settings(
        file: SettingsFile,
        overrides: SettingsOverrides,
    ) -> Result<Settings, Bax2BamError> {
        let mode = match overrides.modes.as_slice() {
            [] => Some(file.mode.unwrap_or(Mode::Subread)),
            [mode] => Some(*mode),
            modes => {
                warn!(count = modes.len(), "multiple conversion modes requested");
                None
            }
        };

        let mut dataset_xml = non_empty(overrides.dataset_xml);
        let input_files = match overrides.inputs.as_slice() {
            [] => return Err(Bax2BamError::NoInputs),
            [single] if single.ends_with(".xml") => {
                let movies = movie_files_from_dataset(Utf8Path::new(single))?;
                if dataset_xml.is_none() {
                    dataset_xml = Some(single.clone());
                }
                movies
            }
            inputs => inputs.to_vec(),
        };
        if input_files.is_empty() {
            return Err(Bax2BamError::NoInputs);
        }

        let prefix = non_empty(overrides.output_prefix)
            .or_else(|| non_empty(file.output_prefix))
            .unwrap_or_else(|| movie_name_of(&input_files[0]));

        let mut settings = Settings::with_outputs(mode, &prefix);
        settings.input_files = input_files;
        settings.dataset_xml_filename = dataset_xml;
        settings.output_xml_filename =
            non_empty(overrides.output_xml).or_else(|| non_empty(file.output_xml));
        settings.transcoder = non_empty(overrides.transcoder).or_else(|| non_empty(file.transcoder));
        Ok(settings)
    }
}

pub fn movie_files_from_dataset(path: &Utf8Path) -> Result<Vec<String>, Bax2BamError> {
    let dataset = DataSet::from_file(path)?;
    let base_dir = path.parent().unwrap_or(Utf8Path::new(""));
    Ok(dataset
        .external_resources()
        .iter()
        .filter(|resource| resource.is_legacy_movie_file())
        .map(|resource| {
            let file = resource.file_path();
            if file.starts_with('/') || base_dir.as_str().is_empty() {
                file.to_string()
            } else {
                base_dir.join(file).to_string()
            }
        })
        .collect())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_subread_outputs() {
        let settings = Settings::with_outputs(Some(Mode::Subread), "movieA");
        assert_eq!(settings.output_bam_filename, "movieA.subreads.bam");
        assert_eq!(
            settings.scraps_bam_filename.as_deref(),
            Some("movieA.scraps.bam")
        );
        assert_eq!(settings.output_xml_path(), "movieA.dataset.xml");
    }

    #[test]
    fn empty_output_xml_falls_back_to_prefix() {
        let mut settings = Settings::with_outputs(Some(Mode::Ccs), "movieA");
        settings.output_xml_filename = Some(String::new());
        assert_eq!(settings.output_xml_path(), "movieA.dataset.xml");
        settings.output_xml_filename = Some("out/custom.xml".to_string());
        assert_eq!(settings.output_xml_path(), "out/custom.xml");
    }

    #[test]
    fn only_the_empty_string_counts_as_absent() {
        let mut settings = Settings::with_outputs(Some(Mode::Ccs), "movieA");
        settings.output_xml_filename = Some("  ".to_string());
        assert_eq!(settings.output_xml_path(), "  ");

        let resolved = SettingsLoader::resolve_settings(
            SettingsFile::default(),
            SettingsOverrides {
                inputs: vec!["movieA.1.bax.h5".to_string()],
                output_xml: Some(" ".to_string()),
                ..SettingsOverrides::default()
            },
        )
        .unwrap();
        assert_eq!(resolved.output_xml_filename.as_deref(), Some(" "));
    }
}
