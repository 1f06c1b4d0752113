//! Generator options
//!
//! The host passes a single parameter string such as
//! `kernel=cpp,experimental-codegen=enabled,crate_mapping=map.txt`. It is parsed
//! once per invocation into an immutable [`Options`] value that is threaded
//! explicitly through generation.

use std::{fmt, path::PathBuf, str::FromStr};

use rustc_hash::FxHashSet;

use crate::error::{GenerateError, Result};

/// Backend the generated code is written against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kernel {
    /// Self-contained runtime (`kernel=upb`)
    Standalone,
    /// Runtime backed by generated C++ (`kernel=cpp`); needs companion thunks
    NativeInterop,
}

impl FromStr for Kernel {
    type Err = GenerateError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "upb" => Ok(Self::Standalone),
            "cpp" => Ok(Self::NativeInterop),
            other => Err(GenerateError::configuration(format!(
                "Unknown kernel '{other}', expected 'upb' or 'cpp'"
            ))),
        }
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standalone => write!(f, "upb"),
            Self::NativeInterop => write!(f, "cpp"),
        }
    }
}

/// Parsed generator options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub kernel: Kernel,
    /// Path of the import path to crate name mapping file
    pub mapping_file_path: Option<PathBuf>,
    /// Drop output that has no functional effect (feature proto includes)
    pub strip_nonfunctional_codegen: bool,
}

impl Options {
    /// Parse the generator parameter string
    pub fn parse(parameter: &str) -> Result<Self> {
        let mut kernel = None;
        let mut mapping_file_path = None;
        let mut strip_nonfunctional_codegen = false;
        let mut experimental_enabled = false;
        let mut seen = FxHashSet::default();

        for pair in parameter.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = match pair.split_once('=') {
                Some((key, value)) => (key.trim(), Some(value.trim())),
                None => (pair, None),
            };
            if !seen.insert(key) {
                return Err(GenerateError::configuration(format!(
                    "Option '{key}' given more than once"
                )));
            }

            match (key, value) {
                ("kernel", Some(value)) => kernel = Some(value.parse::<Kernel>()?),
                ("crate_mapping", Some(value)) if !value.is_empty() => {
                    mapping_file_path = Some(PathBuf::from(value));
                }
                ("experimental-codegen", Some("enabled")) => experimental_enabled = true,
                ("experimental-codegen", _) => {
                    return Err(GenerateError::configuration(
                        "The only valid value for 'experimental-codegen' is 'enabled'",
                    ));
                }
                ("strip_nonfunctional_codegen", None | Some("true")) => {
                    strip_nonfunctional_codegen = true;
                }
                ("strip_nonfunctional_codegen", Some("false")) => {}
                (key @ ("kernel" | "crate_mapping" | "strip_nonfunctional_codegen"), value) => {
                    return Err(GenerateError::configuration(format!(
                        "Invalid value {value:?} for option '{key}'"
                    )));
                }
                (key, _) => {
                    return Err(GenerateError::configuration(format!(
                        "Unknown option '{key}'"
                    )));
                }
            }
        }

        if !experimental_enabled {
            return Err(GenerateError::configuration(
                "The Rust codegen is highly experimental. Future versions will break existing \
                 code. Use at your own risk. You can opt-in by passing \
                 'experimental-codegen=enabled' to the generator options.",
            ));
        }

        let kernel = kernel.ok_or_else(|| {
            GenerateError::configuration("Mandatory option 'kernel' was not set ('upb' or 'cpp')")
        })?;

        Ok(Self {
            kernel,
            mapping_file_path,
            strip_nonfunctional_codegen,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_parse_full_parameter() {
        let opts = Options::parse(
            "kernel=cpp, experimental-codegen=enabled,crate_mapping=out/map.txt,\
             strip_nonfunctional_codegen",
        )
        .unwrap();
        assert_eq!(
            opts,
            Options {
                kernel: Kernel::NativeInterop,
                mapping_file_path: Some(PathBuf::from("out/map.txt")),
                strip_nonfunctional_codegen: true,
            }
        );
    }

    #[test]
    fn test_parse_minimal_parameter() {
        let opts = Options::parse("experimental-codegen=enabled,kernel=upb").unwrap();
        assert_eq!(opts.kernel, Kernel::Standalone);
        assert_eq!(opts.mapping_file_path, None);
        assert!(!opts.strip_nonfunctional_codegen);
    }

    #[test]
    fn test_experimental_opt_in_is_required() {
        let err = Options::parse("kernel=upb").unwrap_err();
        assert!(matches!(err, GenerateError::Configuration(_)));
        assert!(err.to_string().contains("experimental-codegen=enabled"));

        let err = Options::parse("kernel=upb,experimental-codegen=yes").unwrap_err();
        assert!(matches!(err, GenerateError::Configuration(_)));
    }

    #[test]
    fn test_kernel_is_required() {
        let err = Options::parse("experimental-codegen=enabled").unwrap_err();
        assert!(err.to_string().contains("kernel"), "{err}");
    }

    #[test]
    fn test_rejects_bad_options() {
        for parameter in [
            "experimental-codegen=enabled,kernel=java",
            "experimental-codegen=enabled,kernel",
            "experimental-codegen=enabled,kernel=upb,kernel=cpp",
            "experimental-codegen=enabled,kernel=upb,bogus=1",
            "experimental-codegen=enabled,kernel=upb,strip_nonfunctional_codegen=maybe",
            "experimental-codegen=enabled,kernel=upb,crate_mapping=",
        ] {
            let err = Options::parse(parameter).unwrap_err();
            assert!(
                matches!(err, GenerateError::Configuration(_)),
                "{parameter}: {err:?}"
            );
        }
    }

    #[test]
    fn test_kernel_display_round_trips() {
        for kernel in [Kernel::Standalone, Kernel::NativeInterop] {
            assert_eq!(kernel.to_string().parse::<Kernel>().unwrap(), kernel);
        }
    }
}
