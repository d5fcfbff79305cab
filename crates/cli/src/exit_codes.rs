//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (unspecified)                          |
//! | 2    | CLI usage error (bad args, missing file, no extracts) |
//! | 3    | I/O error reading extracts or writing the workbook   |
//! | 4    | Parse error (CSV/TSV, xlsx template, config TOML)    |
//! | 5    | Template is missing a required sheet                 |
//! | 6    | Record type with no template sheet                   |
//! | 7    | Malformed encoded link (`on_malformed = "error"`)    |
//! | 8    | Duplicate record type (`on_duplicate = "error"`)     |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `recon_exit_code` or the command's error handling

use joinery_recon::ReconError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options or files,
/// or an input directory without extracts.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Input / output (3-4)
// =============================================================================

/// Cannot read an input or write the output workbook.
pub const EXIT_IO: u8 = 3;

/// Input could not be parsed (extract, template or config).
pub const EXIT_PARSE: u8 = 4;

// =============================================================================
// Reconciliation (5-8)
// =============================================================================

/// Template lacks the dictionary or terms sheet.
pub const EXIT_MISSING_SHEET: u8 = 5;

/// An extract's record type has no sheet in the template.
pub const EXIT_UNKNOWN_TYPE: u8 = 6;

/// An encoded link value lacks the delimiter (strict mode only).
pub const EXIT_MALFORMED_LINK: u8 = 7;

/// Two extracts declare the same record type (strict mode only).
pub const EXIT_DUPLICATE_TYPE: u8 = 8;

/// Map a ReconError to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_PARSE,
        ReconError::MissingRequiredSheet { .. } => EXIT_MISSING_SHEET,
        ReconError::UnknownRecordType(_) => EXIT_UNKNOWN_TYPE,
        ReconError::MalformedLink { .. } => EXIT_MALFORMED_LINK,
        ReconError::DuplicateRecordType { .. } => EXIT_DUPLICATE_TYPE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_IO,
            EXIT_PARSE,
            EXIT_MISSING_SHEET,
            EXIT_UNKNOWN_TYPE,
            EXIT_MALFORMED_LINK,
            EXIT_DUPLICATE_TYPE,
        ];
        let unique: std::collections::BTreeSet<u8> = codes.iter().copied().collect();
        assert_eq!(unique.len(), codes.len());
        assert_eq!(codes, [0, 1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn recon_errors_have_distinct_codes() {
        let errors = [
            ReconError::MissingRequiredSheet { sheet: "Dictionary".into() },
            ReconError::UnknownRecordType("diagnosis".into()),
            ReconError::MalformedLink {
                record_type: "sample".into(),
                column: "participant.id".into(),
                row: 1,
                value: "P1".into(),
            },
            ReconError::DuplicateRecordType {
                record_type: "sample".into(),
                previous: "a.tsv".into(),
                source: "b.csv".into(),
            },
        ];
        let codes: Vec<u8> = errors.iter().map(recon_exit_code).collect();
        assert_eq!(codes, vec![5, 6, 7, 8]);
        assert_eq!(recon_exit_code(&ReconError::ConfigParse("x".into())), EXIT_PARSE);
    }
}
