//! Schema descriptor model
//!
//! An arena of already-validated schema files. Files reference each other by
//! [`FileId`] and are never copied once loaded; everything downstream borrows
//! the [`DescriptorPool`].
//!
//! The on-disk form is a TOML descriptor set listing each file's messages,
//! enums and import edges, plus the ordered list of files making up the
//! compilation unit.

use std::{fs, path::Path};

use anyhow::{Context, Result, anyhow, bail};
use log::debug;
use petgraph::{algo::toposort, graph::DiGraph};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Deserialize;

/// Unique identifier for a schema file inside a [`DescriptorPool`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(u32);

impl FileId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

/// Whether an import edge is visible to importers of the importer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// `import public "..."`
    Public,
    /// Plain `import "..."`
    Private,
}

/// A single import edge of a schema file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    pub file: FileId,
    pub visibility: Visibility,
}

impl Dependency {
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDescriptor {
    /// Name as declared, e.g. `Foo`
    pub name: String,
    /// Package-qualified name, e.g. `pkg.Foo`
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDescriptor {
    pub name: String,
    pub full_name: String,
}

/// One node of the schema dependency graph
#[derive(Debug, Clone)]
pub struct SchemaFile {
    pub id: FileId,
    /// Import path, e.g. `google/protobuf/timestamp.proto`
    pub name: String,
    pub package: String,
    pub messages: Vec<MessageDescriptor>,
    pub enums: Vec<EnumDescriptor>,
    pub dependencies: Vec<Dependency>,
}

impl SchemaFile {
    /// Targets of the `import public` edges, in declaration order
    pub fn public_dependencies(&self) -> impl Iterator<Item = FileId> + '_ {
        self.dependencies
            .iter()
            .filter(|dep| dep.is_public())
            .map(|dep| dep.file)
    }
}

/// Arena holding every schema file known to one generator invocation
#[derive(Debug, Default)]
pub struct DescriptorPool {
    files: Vec<SchemaFile>,
    name_to_id: FxHashMap<String, FileId>,
}

impl DescriptorPool {
    /// Get a file by id.
    ///
    /// Ids are only ever minted by this pool, so a miss means a caller mixed
    /// up pools.
    pub fn file(&self, id: FileId) -> &SchemaFile {
        &self.files[id.as_usize()]
    }

    /// Get a file by an id that may come from outside this pool
    pub fn get(&self, id: FileId) -> Option<&SchemaFile> {
        self.files.get(id.as_usize())
    }

    pub fn find_by_name(&self, name: &str) -> Option<FileId> {
        self.name_to_id.get(name).copied()
    }

    fn len(&self) -> usize {
        self.files.len()
    }
}

/// Serialized form of a descriptor set
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DescriptorSetToml {
    files_to_generate: Vec<String>,
    #[serde(default, rename = "file")]
    files: Vec<FileToml>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileToml {
    name: String,
    #[serde(default)]
    package: String,
    #[serde(default)]
    messages: Vec<String>,
    #[serde(default)]
    enums: Vec<String>,
    #[serde(default)]
    dependencies: Vec<DependencyToml>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DependencyToml {
    path: String,
    #[serde(default)]
    public: bool,
}

/// A loaded descriptor set: the pool plus the files the host asked for
#[derive(Debug)]
pub struct GeneratorRequest {
    pub pool: DescriptorPool,
    /// Files compiled together into the output crate. The first one is the
    /// primary file.
    pub files_to_generate: Vec<FileId>,
}

impl GeneratorRequest {
    /// Load a descriptor set from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read descriptor set {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid descriptor set {}", path.display()))
    }

    /// Parse and validate a descriptor set
    pub fn from_toml(content: &str) -> Result<Self> {
        let set: DescriptorSetToml = toml::from_str(content)?;
        Self::from_set(set)
    }

    fn from_set(set: DescriptorSetToml) -> Result<Self> {
        let mut pool = DescriptorPool::default();

        // First pass: assign ids so that edges can point forward
        for (index, file) in set.files.iter().enumerate() {
            let id = FileId::new(u32::try_from(index)?);
            if pool.name_to_id.insert(file.name.clone(), id).is_some() {
                bail!("Duplicate schema file '{}'", file.name);
            }
        }

        let mut graph = DiGraph::<FileId, ()>::with_capacity(set.files.len(), 0);
        let nodes: Vec<_> = (0..set.files.len())
            .map(|index| graph.add_node(FileId::new(index as u32)))
            .collect();

        for (index, file) in set.files.into_iter().enumerate() {
            let id = FileId::new(index as u32);
            let mut dependencies = Vec::with_capacity(file.dependencies.len());
            for dep in &file.dependencies {
                let target = pool.find_by_name(&dep.path).ok_or_else(|| {
                    anyhow!("'{}' imports unknown file '{}'", file.name, dep.path)
                })?;
                graph.add_edge(nodes[index], nodes[target.as_usize()], ());
                dependencies.push(Dependency {
                    file: target,
                    visibility: if dep.public {
                        Visibility::Public
                    } else {
                        Visibility::Private
                    },
                });
            }

            let qualify = |name: &str| {
                if file.package.is_empty() {
                    name.to_owned()
                } else {
                    format!("{}.{}", file.package, name)
                }
            };
            let messages = file
                .messages
                .iter()
                .map(|name| MessageDescriptor {
                    name: name.clone(),
                    full_name: qualify(name),
                })
                .collect();
            let enums = file
                .enums
                .iter()
                .map(|name| EnumDescriptor {
                    name: name.clone(),
                    full_name: qualify(name),
                })
                .collect();

            pool.files.push(SchemaFile {
                id,
                name: file.name,
                package: file.package,
                messages,
                enums,
                dependencies,
            });
        }

        if let Err(cycle) = toposort(&graph, None) {
            let id = graph[cycle.node_id()];
            bail!("Import cycle detected involving '{}'", pool.file(id).name);
        }

        let mut seen = FxHashSet::default();
        let mut files_to_generate = Vec::with_capacity(set.files_to_generate.len());
        for name in &set.files_to_generate {
            let id = pool.find_by_name(name).ok_or_else(|| {
                anyhow!("File to generate '{name}' is not in the descriptor set")
            })?;
            if !seen.insert(id) {
                bail!("File to generate '{name}' is listed more than once");
            }
            files_to_generate.push(id);
        }

        debug!(
            "Loaded {} schema files, {} to generate",
            pool.len(),
            files_to_generate.len()
        );

        Ok(Self {
            pool,
            files_to_generate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SET: &str = r#"
files_to_generate = ["pkg/a.proto"]

[[file]]
name = "dep/x.proto"
package = "dep"
messages = ["X"]

[[file]]
name = "pkg/a.proto"
package = "pkg"
messages = ["Foo", "Bar"]
enums = ["Color"]
dependencies = [
    { path = "dep/x.proto", public = true },
    { path = "google/protobuf/cpp_features.proto" },
]

[[file]]
name = "google/protobuf/cpp_features.proto"
"#;

    #[test]
    fn test_load_descriptor_set() {
        let request = GeneratorRequest::from_toml(SET).unwrap();
        assert_eq!(request.pool.len(), 3);

        let a = request.pool.find_by_name("pkg/a.proto").unwrap();
        assert_eq!(request.files_to_generate, vec![a]);

        let file = request.pool.file(a);
        assert_eq!(file.messages[1].full_name, "pkg.Bar");
        assert_eq!(file.enums[0].full_name, "pkg.Color");
        assert_eq!(file.dependencies.len(), 2);
        assert!(file.dependencies[0].is_public());
        assert!(!file.dependencies[1].is_public());

        let x = request.pool.find_by_name("dep/x.proto").unwrap();
        assert_eq!(file.public_dependencies().collect::<Vec<_>>(), vec![x]);
    }

    #[test]
    fn test_unqualified_names_without_package() {
        let request = GeneratorRequest::from_toml(
            r#"
files_to_generate = ["a.proto"]
[[file]]
name = "a.proto"
messages = ["Foo"]
"#,
        )
        .unwrap();
        let file = request.pool.file(request.files_to_generate[0]);
        assert_eq!(file.messages[0].full_name, "Foo");
    }

    #[test]
    fn test_unknown_dependency_is_rejected() {
        let err = GeneratorRequest::from_toml(
            r#"
files_to_generate = ["a.proto"]
[[file]]
name = "a.proto"
dependencies = [{ path = "missing.proto" }]
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("missing.proto"), "{err}");
    }

    #[test]
    fn test_duplicate_file_is_rejected() {
        let err = GeneratorRequest::from_toml(
            r#"
files_to_generate = []
[[file]]
name = "a.proto"
[[file]]
name = "a.proto"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Duplicate"), "{err}");
    }

    #[test]
    fn test_import_cycle_is_rejected() {
        let err = GeneratorRequest::from_toml(
            r#"
files_to_generate = ["a.proto"]
[[file]]
name = "a.proto"
dependencies = [{ path = "b.proto" }]
[[file]]
name = "b.proto"
dependencies = [{ path = "a.proto", public = true }]
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("cycle"), "{err}");
    }

    #[test]
    fn test_repeated_file_to_generate_is_rejected() {
        let err = GeneratorRequest::from_toml(
            r#"
files_to_generate = ["a.proto", "b.proto", "a.proto"]
[[file]]
name = "a.proto"
[[file]]
name = "b.proto"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("more than once"), "{err}");
    }

    #[test]
    fn test_get_unknown_id() {
        let request = GeneratorRequest::from_toml(SET).unwrap();
        assert!(request.pool.get(FileId::new(2)).is_some());
        assert!(request.pool.get(FileId::new(7)).is_none());
    }
}
