use serde::{Deserialize, Serialize};

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Run configuration. Every key is optional; an empty document is valid.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JoineryConfig {
    #[serde(default)]
    pub template: TemplateConfig,
    #[serde(default)]
    pub links: LinkConfig,
    #[serde(default)]
    pub input: InputConfig,
}

// ---------------------------------------------------------------------------
// Template
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateConfig {
    /// Sheet describing every record type. Must exist in the template.
    #[serde(default = "default_dictionary_sheet")]
    pub dictionary_sheet: String,
    /// Sheet describing controlled vocabularies. Must exist in the template.
    #[serde(default = "default_terms_sheet")]
    pub terms_sheet: String,
    /// Sheet whose header row carries the template version.
    #[serde(default = "default_readme_sheet")]
    pub readme_sheet: String,
    /// Header cell index of the version on the readme sheet.
    #[serde(default = "default_version_column")]
    pub version_column: usize,
}

fn default_dictionary_sheet() -> String {
    "Dictionary".into()
}

fn default_terms_sheet() -> String {
    "Terms and Value Sets".into()
}

fn default_readme_sheet() -> String {
    "README and INSTRUCTIONS".into()
}

fn default_version_column() -> usize {
    2
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            dictionary_sheet: default_dictionary_sheet(),
            terms_sheet: default_terms_sheet(),
            readme_sheet: default_readme_sheet(),
            version_column: default_version_column(),
        }
    }
}

impl TemplateConfig {
    /// Sheets that must be present before any reconciliation proceeds.
    pub fn required_sheets(&self) -> [&str; 2] {
        [&self.dictionary_sheet, &self.terms_sheet]
    }
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkConfig {
    /// Substring marking an encoded linking column, e.g. `parent.id`.
    #[serde(default = "default_marker")]
    pub marker: String,
    /// Delimiter between the prefix and the restored id.
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default)]
    pub on_malformed: MalformedPolicy,
}

fn default_marker() -> String {
    ".id".into()
}

fn default_delimiter() -> String {
    "::".into()
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            marker: default_marker(),
            delimiter: default_delimiter(),
            on_malformed: MalformedPolicy::default(),
        }
    }
}

/// What to do with a non-empty encoded value that lacks the delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedPolicy {
    /// Restore as an empty cell and keep going.
    #[default]
    Empty,
    /// Abort the run.
    Error,
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputConfig {
    /// Column tagging an extract with its record type.
    #[serde(default = "default_type_column")]
    pub type_column: String,
    #[serde(default)]
    pub on_duplicate: DuplicatePolicy,
    /// Record type whose id names the output workbook.
    #[serde(default = "default_study_type")]
    pub study_type: String,
    #[serde(default = "default_study_column")]
    pub study_column: String,
}

fn default_type_column() -> String {
    "type".into()
}

fn default_study_type() -> String {
    "study".into()
}

fn default_study_column() -> String {
    "study_id".into()
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            type_column: default_type_column(),
            on_duplicate: DuplicatePolicy::default(),
            study_type: default_study_type(),
            study_column: default_study_column(),
        }
    }
}

/// What to do when two extracts carry the same record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Last extract read wins; the replaced one is reported.
    #[default]
    Replace,
    /// Abort the run.
    Error,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl JoineryConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: JoineryConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.links.marker.is_empty() {
            return Err(ReconError::ConfigValidation("links.marker must not be empty".into()));
        }

        // The parent node is everything before the first '.', so the marker needs one
        if !self.links.marker.contains('.') {
            return Err(ReconError::ConfigValidation(format!(
                "links.marker must contain '.', got \"{}\"",
                self.links.marker
            )));
        }

        if self.links.delimiter.is_empty() {
            return Err(ReconError::ConfigValidation(
                "links.delimiter must not be empty".into(),
            ));
        }

        if self.input.type_column.is_empty() {
            return Err(ReconError::ConfigValidation(
                "input.type_column must not be empty".into(),
            ));
        }

        if self.template.dictionary_sheet == self.template.terms_sheet {
            return Err(ReconError::ConfigValidation(format!(
                "template.dictionary_sheet and template.terms_sheet are both \"{}\"",
                self.template.terms_sheet
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
