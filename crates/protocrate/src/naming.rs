//! Deterministic names for generated files, modules and types

use std::fmt::Write;

use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;

use crate::{config::Kernel, descriptor::SchemaFile};

/// Feature definition schemas whose includes carry no behavior
static KNOWN_FEATURE_PROTOS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "google/protobuf/cpp_features.proto",
        "google/protobuf/java_features.proto",
        "google/protobuf/go_features.proto",
    ]
    .into_iter()
    .collect()
});

/// Strict and reserved keywords that need a raw identifier
const RUST_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "dyn",
    "do", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

/// Keywords that cannot be raw identifiers either
const NON_RAW_KEYWORDS: &[&str] = &["crate", "self", "super", "Self"];

fn strip_proto(name: &str) -> &str {
    name.strip_suffix(".proto").unwrap_or(name)
}

pub fn is_known_feature_proto(import_path: &str) -> bool {
    KNOWN_FEATURE_PROTOS.contains(import_path)
}

/// Generated Rust source for `file`, relative to the output root
pub fn rs_file(kernel: Kernel, file: &SchemaFile) -> String {
    let extension = match kernel {
        Kernel::Standalone => "u.pb.rs",
        Kernel::NativeInterop => "c.pb.rs",
    };
    format!("{}.{extension}", strip_proto(&file.name))
}

/// Generated C++ thunks for `file` (native-interop kernel only)
pub fn thunks_cc_file(file: &SchemaFile) -> String {
    format!("{}.pb.thunks.cc", strip_proto(&file.name))
}

/// C++ header generated for `file` by the C++ generator
pub fn header_file(file: &SchemaFile) -> String {
    format!("{}.pb.h", strip_proto(&file.name))
}

/// Name of the private module holding a non-primary file's code.
///
/// Injective over import paths: `_` is doubled before other characters are
/// escaped with a `_` prefix. Keywords come back as raw identifiers.
pub fn internal_module_name(file: &SchemaFile) -> String {
    let stem = strip_proto(&file.name);
    let mut out = String::with_capacity(stem.len() + 4);
    if stem.starts_with(|c: char| c.is_ascii_digit()) {
        out.push('_');
    }
    for c in stem.chars() {
        match c {
            '_' => out.push_str("__"),
            '/' => out.push_str("_s"),
            '-' => out.push_str("_d"),
            '.' => out.push_str("_p"),
            c if c.is_ascii_alphanumeric() => out.push(c),
            c => {
                let _ = write!(out, "_x{:x}_", u32::from(c));
            }
        }
    }
    rs_safe_name(&out)
}

/// Crate name used when the mapping does not know `file`
pub fn default_crate_name(file: &SchemaFile) -> String {
    let stem = strip_proto(&file.name);
    let base = stem.rsplit('/').next().unwrap_or(stem);
    let mut name: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

/// Escape `name` so it can be used as a Rust identifier
pub fn rs_safe_name(name: &str) -> String {
    if NON_RAW_KEYWORDS.contains(&name) {
        format!("{name}_")
    } else if RUST_KEYWORDS.contains(&name) {
        format!("r#{name}")
    } else {
        name.to_owned()
    }
}

/// Fully qualified path of a type `name` defined in crate `crate_name`
pub fn rs_type_path(crate_name: &str, name: &str) -> String {
    format!("::{crate_name}::{}", rs_safe_name(name))
}
