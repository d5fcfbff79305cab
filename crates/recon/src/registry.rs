use std::collections::HashMap;

use crate::config::TemplateConfig;
use crate::error::ReconError;

/// Declared columns of one template sheet, in template order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSchema {
    pub name: String,
    pub columns: Vec<String>,
}

/// Per-sheet column declarations read from the template. Immutable once built.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    sheets: Vec<SheetSchema>,
    index: HashMap<String, usize>,
}

impl SchemaRegistry {
    /// Build from `(sheet name, header)` pairs in template order.
    ///
    /// Blank and repeated column names are skipped so every entry is a
    /// duplicate-free ordered list. Fails if a required sheet is absent.
    pub fn from_sheets<I>(sheets: I, config: &TemplateConfig) -> Result<Self, ReconError>
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        let mut registry = Self {
            sheets: Vec::new(),
            index: HashMap::new(),
        };

        for (name, header) in sheets {
            let mut columns: Vec<String> = Vec::with_capacity(header.len());
            for column in header {
                if column.is_empty() {
                    continue;
                }
                if columns.contains(&column) {
                    log::warn!("sheet '{name}': duplicate column '{column}' ignored");
                    continue;
                }
                columns.push(column);
            }

            match registry.index.get(&name) {
                Some(&idx) => registry.sheets[idx].columns = columns,
                None => {
                    registry.index.insert(name.clone(), registry.sheets.len());
                    registry.sheets.push(SheetSchema { name, columns });
                }
            }
        }

        for sheet in config.required_sheets() {
            if !registry.contains(sheet) {
                return Err(ReconError::MissingRequiredSheet {
                    sheet: sheet.to_string(),
                });
            }
        }

        log::debug!("schema registry built with {} sheet(s)", registry.sheets.len());
        Ok(registry)
    }

    /// Declared columns for a record type, in template order.
    pub fn columns_for(&self, record_type: &str) -> Result<&[String], ReconError> {
        self.index
            .get(record_type)
            .map(|&idx| self.sheets[idx].columns.as_slice())
            .ok_or_else(|| ReconError::UnknownRecordType(record_type.to_string()))
    }

    pub fn contains(&self, sheet: &str) -> bool {
        self.index.contains_key(sheet)
    }

    /// All sheets in template order.
    pub fn sheets(&self) -> &[SheetSchema] {
        &self.sheets
    }

    /// Sheets that can receive record-type data: everything except the
    /// structural dictionary, terms and readme sheets.
    pub fn record_type_sheets<'a>(
        &'a self,
        config: &'a TemplateConfig,
    ) -> impl Iterator<Item = &'a SheetSchema> + 'a {
        self.sheets.iter().filter(move |s| {
            s.name != config.dictionary_sheet
                && s.name != config.terms_sheet
                && s.name != config.readme_sheet
        })
    }
}
