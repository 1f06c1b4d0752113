//! Which schema files belong to the crate being generated

use log::debug;
use rustc_hash::FxHashSet;

use crate::{
    crate_mapping::CrateMapping,
    descriptor::{FileId, SchemaFile},
    error::{GenerateError, Result},
    naming,
};

/// Membership of the current compilation unit plus crate naming for files
/// outside of it.
///
/// Read-only once built; safe to share across the sequential per-file
/// generation calls of one invocation.
#[derive(Debug)]
pub struct CrateMembership<'a> {
    files_in_current_crate: Vec<FileId>,
    file_set: FxHashSet<FileId>,
    crate_mapping: &'a CrateMapping,
}

impl<'a> CrateMembership<'a> {
    /// Build the membership for an ordered list of distinct files.
    ///
    /// A file listed twice would be declared as a module twice, so repeats are
    /// a precondition violation.
    pub fn new(
        files_in_current_crate: Vec<FileId>,
        crate_mapping: &'a CrateMapping,
    ) -> Result<Self> {
        let mut file_set = FxHashSet::default();
        for &file in &files_in_current_crate {
            if !file_set.insert(file) {
                return Err(GenerateError::precondition(format!(
                    "file {file:?} is listed more than once in the current crate"
                )));
            }
        }
        Ok(Self {
            files_in_current_crate,
            file_set,
            crate_mapping,
        })
    }

    pub fn is_file_in_current_crate(&self, file: FileId) -> bool {
        self.file_set.contains(&file)
    }

    /// The file whose output hosts the crate root
    pub fn primary_file(&self) -> Result<FileId> {
        self.files_in_current_crate
            .first()
            .copied()
            .ok_or_else(|| GenerateError::precondition("the current crate contains no files"))
    }

    /// Every file of the crate except the primary one, in crate order
    pub fn non_primary_files(&self) -> &[FileId] {
        self.files_in_current_crate.get(1..).unwrap_or_default()
    }

    /// Name of the crate that owns `file`.
    ///
    /// Files missing from the mapping get a name derived from their import
    /// path, so this never fails. Keywords come back as raw identifiers.
    pub fn crate_name_for(&self, file: &SchemaFile) -> String {
        let name = match self.crate_mapping.crate_name(&file.name) {
            Some(name) => name.replace('-', "_"),
            None => {
                let fallback = naming::default_crate_name(file);
                debug!(
                    "No crate mapping for '{}', falling back to crate name '{fallback}'",
                    file.name
                );
                fallback
            }
        };
        naming::rs_safe_name(&name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::GeneratorRequest;

    const SET: &str = r#"
files_to_generate = ["a.proto", "b.proto"]
[[file]]
name = "a.proto"
[[file]]
name = "b.proto"
[[file]]
name = "dep/my-dep.proto"
[[file]]
name = "type.proto"
"#;

    #[test]
    fn test_membership() {
        let request = GeneratorRequest::from_toml(SET).unwrap();
        let mapping = CrateMapping::default();
        let membership =
            CrateMembership::new(request.files_to_generate.clone(), &mapping).unwrap();

        let a = request.pool.find_by_name("a.proto").unwrap();
        let b = request.pool.find_by_name("b.proto").unwrap();
        let dep = request.pool.find_by_name("dep/my-dep.proto").unwrap();

        assert_eq!(membership.primary_file().unwrap(), a);
        assert_eq!(membership.non_primary_files(), &[b]);
        assert!(membership.is_file_in_current_crate(a));
        assert!(membership.is_file_in_current_crate(b));
        assert!(!membership.is_file_in_current_crate(dep));
    }

    #[test]
    fn test_empty_crate_has_no_primary_file() {
        let mapping = CrateMapping::default();
        let membership = CrateMembership::new(Vec::new(), &mapping).unwrap();
        assert!(matches!(
            membership.primary_file(),
            Err(GenerateError::Precondition(_))
        ));
        assert!(membership.non_primary_files().is_empty());
    }

    #[test]
    fn test_crate_name_lookup_and_fallback() {
        let request = GeneratorRequest::from_toml(SET).unwrap();
        let dep = request.pool.file(request.pool.find_by_name("dep/my-dep.proto").unwrap());

        let mapping = CrateMapping::parse("dep-crate\n1\ndep/my-dep.proto\n").unwrap();
        let membership =
            CrateMembership::new(request.files_to_generate.clone(), &mapping).unwrap();
        assert_eq!(membership.crate_name_for(dep), "dep_crate");

        let empty = CrateMapping::default();
        let membership =
            CrateMembership::new(request.files_to_generate.clone(), &empty).unwrap();
        assert_eq!(membership.crate_name_for(dep), "my_dep");
    }

    #[test]
    fn test_repeated_file_is_a_precondition_violation() {
        let request = GeneratorRequest::from_toml(SET).unwrap();
        let a = request.pool.find_by_name("a.proto").unwrap();
        let b = request.pool.find_by_name("b.proto").unwrap();
        let mapping = CrateMapping::default();
        let err = CrateMembership::new(vec![a, b, a], &mapping).unwrap_err();
        assert!(matches!(err, GenerateError::Precondition(_)), "{err:?}");
    }

    #[test]
    fn test_keyword_crate_names_are_escaped() {
        let request = GeneratorRequest::from_toml(SET).unwrap();
        let ty = request.pool.file(request.pool.find_by_name("type.proto").unwrap());
        let dep = request.pool.file(request.pool.find_by_name("dep/my-dep.proto").unwrap());

        let empty = CrateMapping::default();
        let membership =
            CrateMembership::new(request.files_to_generate.clone(), &empty).unwrap();
        assert_eq!(membership.crate_name_for(ty), "r#type");

        let mapping = CrateMapping::parse("crate\n1\ndep/my-dep.proto\n").unwrap();
        let membership =
            CrateMembership::new(request.files_to_generate.clone(), &mapping).unwrap();
        assert_eq!(membership.crate_name_for(dep), "crate_");
    }
}
