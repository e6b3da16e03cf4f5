//! Process environment lookups for credential settings.
//!
//! A variable that is set to whitespace reads the same as one that is unset,
//! so an exported-but-blank `AZURE_CLIENT_SECRET=` never shadows a value from
//! the auth file.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnvVarError {
    #[error("{name} is not set")]
    NotFound { name: String },

    #[error("{name} is set but blank")]
    Empty { name: String },

    #[error("{name} is not valid UTF-8")]
    InvalidUtf8 { name: String },
}

pub struct EnvUtils;

impl EnvUtils {
    /// Trimmed value of `name`.
    pub fn read(name: &str) -> Result<String, EnvVarError> {
        let name_owned = || name.to_string();
        let raw = std::env::var(name).map_err(|e| match e {
            std::env::VarError::NotPresent => EnvVarError::NotFound { name: name_owned() },
            std::env::VarError::NotUnicode(_) => EnvVarError::InvalidUtf8 { name: name_owned() },
        })?;

        match raw.trim() {
            "" => Err(EnvVarError::Empty { name: name_owned() }),
            value => Ok(value.to_string()),
        }
    }

    /// Value of the first variable in `names` that holds something usable.
    /// Unreadable variables are skipped with a debug record.
    pub fn get_first_var(names: &[&str]) -> Option<String> {
        names.iter().find_map(|name| match Self::read(name) {
            Ok(value) => Some(value),
            Err(EnvVarError::NotFound { .. }) => None,
            Err(e) => {
                log::debug!("Ignoring {e}");
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // variable names are unique per test; the environment is process-wide

    #[test]
    fn blank_values_count_as_empty() {
        unsafe { std::env::set_var("BUSFORGE_TEST_BLANK", "   ") };
        assert_eq!(
            EnvUtils::read("BUSFORGE_TEST_BLANK"),
            Err(EnvVarError::Empty {
                name: "BUSFORGE_TEST_BLANK".to_string()
            })
        );
        assert_eq!(EnvUtils::get_first_var(&["BUSFORGE_TEST_BLANK"]), None);
    }

    #[test]
    fn first_var_skips_missing_names() {
        unsafe { std::env::set_var("BUSFORGE_TEST_FALLBACK", " value ") };
        assert_eq!(
            EnvUtils::get_first_var(&["BUSFORGE_TEST_UNSET_PRIMARY", "BUSFORGE_TEST_FALLBACK"]),
            Some("value".to_string())
        );
        assert_eq!(EnvUtils::get_first_var(&["BUSFORGE_TEST_UNSET_OTHER"]), None);
    }
}
