//! Environment variable expansion for configuration values.

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in `value`.
///
/// `field` names the configuration key in error messages. A value without any
/// `${` is returned unchanged, bare `$` included. Once a value contains `${`,
/// bare `$VAR` references in it are expanded too, and an unset one is an error
/// like an unset `${VAR}`.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, UnsetVar> {
        std::env::var(var).map(Some).map_err(|_| UnsetVar(var.to_owned()))
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", e.cause.0),
    })
}

/// Variable referenced without a default that is not set.
struct UnsetVar(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_without_reference_is_unchanged() {
        assert_eq!(expand_env("#ffffff", "render.background").unwrap(), "#ffffff");
        assert_eq!(expand_env("$HOME/bin/mmdc", "render.mmdc").unwrap(), "$HOME/bin/mmdc");
    }

    #[test]
    fn test_expands_set_variable() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("MDR_TEST_MMDC_BIN", "/opt/mmdc/bin");
        }
        let result = expand_env("${MDR_TEST_MMDC_BIN}/mmdc", "render.mmdc").unwrap();
        assert_eq!(result, "/opt/mmdc/bin/mmdc");
        unsafe {
            std::env::remove_var("MDR_TEST_MMDC_BIN");
        }
    }

    #[test]
    fn test_default_used_when_unset() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("MDR_TEST_THEME_UNSET");
        }
        let result = expand_env("${MDR_TEST_THEME_UNSET:-forest}", "render.theme").unwrap();
        assert_eq!(result, "forest");
    }

    #[test]
    fn test_empty_default() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("MDR_TEST_EMPTY_DEFAULT");
        }
        assert_eq!(expand_env("${MDR_TEST_EMPTY_DEFAULT:-}", "render.mmdc").unwrap(), "");
    }

    #[test]
    fn test_bare_reference_expanded_alongside_braced() {
        // SAFETY: variable names are unique to this test
        unsafe {
            std::env::set_var("MDR_TEST_BARE_ROOT", "/opt");
            std::env::remove_var("MDR_TEST_BARE_UNSET");
            std::env::remove_var("MDR_TEST_BARE_DIR");
        }

        let result = expand_env("${MDR_TEST_BARE_DIR:-bin}/$MDR_TEST_BARE_ROOT", "render.mmdc");
        assert_eq!(result.unwrap(), "bin//opt");

        let err = expand_env("${MDR_TEST_BARE_DIR:-bin}/$MDR_TEST_BARE_UNSET", "render.mmdc")
            .unwrap_err();
        assert!(err.to_string().contains("MDR_TEST_BARE_UNSET"));

        unsafe {
            std::env::remove_var("MDR_TEST_BARE_ROOT");
        }
    }

    #[test]
    fn test_unset_variable_names_field() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("MDR_TEST_MISSING");
        }
        let err = expand_env("${MDR_TEST_MISSING}", "render.out_dir").unwrap_err();

        assert!(matches!(err, ConfigError::EnvVar { .. }));
        let message = err.to_string();
        assert!(message.contains("MDR_TEST_MISSING"));
        assert!(message.contains("render.out_dir"));
    }
}
