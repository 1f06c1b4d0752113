//! Import path to crate name mapping
//!
//! The build system tells the generator which crate owns every schema file it
//! may reference. The mapping file is a sequence of blocks:
//!
//! ```text
//! crate_name
//! 2
//! path/to/first.proto
//! path/to/second.proto
//! ```

use std::{fs, path::Path};

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashMap;

use crate::{
    config::Options,
    error::{GenerateError, Result},
};

static CRATE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("valid crate name regex"));

/// Read-only mapping from import path to the owning crate's name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrateMapping {
    import_path_to_crate: FxHashMap<String, String>,
}

impl CrateMapping {
    /// Build the mapping named by `opts`, or an empty one if none was given
    pub fn from_options(opts: &Options) -> Result<Self> {
        match &opts.mapping_file_path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|err| {
            GenerateError::configuration(format!(
                "Could not read crate mapping file {}: {err}",
                path.display()
            ))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut mapping = FxHashMap::default();
        let mut lines = content.lines().map(str::trim).enumerate().peekable();

        loop {
            // Skip blank separators, including trailing ones
            while lines.next_if(|(_, line)| line.is_empty()).is_some() {}
            let Some((line_no, crate_name)) = lines.next() else {
                break;
            };
            if !CRATE_NAME.is_match(crate_name) {
                return Err(GenerateError::configuration(format!(
                    "Invalid crate name '{crate_name}' on line {} of crate mapping",
                    line_no + 1
                )));
            }

            let (count_line, count) = lines.next().ok_or_else(|| {
                GenerateError::configuration(format!(
                    "Missing file count for crate '{crate_name}' in crate mapping"
                ))
            })?;
            let count: usize = count.parse().map_err(|_| {
                GenerateError::configuration(format!(
                    "Invalid file count '{count}' on line {} of crate mapping",
                    count_line + 1
                ))
            })?;

            for _ in 0..count {
                let import_path = match lines.next() {
                    Some((_, path)) if !path.is_empty() => path,
                    _ => {
                        return Err(GenerateError::configuration(format!(
                            "Crate '{crate_name}' declares {count} files but lists fewer"
                        )));
                    }
                };
                match mapping.get(import_path) {
                    Some(previous) if previous != crate_name => {
                        return Err(GenerateError::configuration(format!(
                            "'{import_path}' is mapped to both '{previous}' and '{crate_name}'"
                        )));
                    }
                    _ => {}
                }
                mapping.insert(import_path.to_owned(), crate_name.to_owned());
            }
        }

        debug!("Loaded crate mapping with {} import paths", mapping.len());
        Ok(Self {
            import_path_to_crate: mapping,
        })
    }

    /// Crate name for `import_path` as written in the mapping
    pub fn crate_name(&self, import_path: &str) -> Option<&str> {
        self.import_path_to_crate.get(import_path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.import_path_to_crate.len()
    }

    pub fn is_empty(&self) -> bool {
        self.import_path_to_crate.is_empty()
    }
}
