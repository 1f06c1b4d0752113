//! Text emission into generated output files
//!
//! Templates are raw string literals written at the indentation of the
//! surrounding Rust code. [`Printer::emit`] strips the leading blank line and
//! the common indentation, then substitutes `$name$` placeholders. `$$`
//! produces a literal `$`.

use std::io::{BufWriter, Write};

use crate::{
    error::{GenerateError, Result},
    types::FxIndexMap,
};

/// Shorthands available to every Rust template
const RUST_SHORTHANDS: &[(&str, &str)] = &[
    ("std", "::std"),
    ("pb", "::protobuf"),
    ("pbi", "::protobuf::__internal"),
    ("pbr", "::protobuf::__internal::runtime"),
    ("NonNull", "::std::ptr::NonNull"),
    ("Phantom", "::std::marker::PhantomData"),
    ("Result", "::std::result::Result"),
    ("Option", "::std::option::Option"),
];

/// An open output stream plus template substitution.
///
/// The underlying stream is flushed when the printer is dropped, so early
/// returns never leave buffered output behind.
pub struct Printer {
    path: String,
    sink: BufWriter<Box<dyn Write>>,
    vars: FxIndexMap<String, String>,
}

impl std::fmt::Debug for Printer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Printer")
            .field("path", &self.path)
            .field("vars", &self.vars)
            .finish_non_exhaustive()
    }
}

impl Printer {
    pub fn new(path: impl Into<String>, sink: Box<dyn Write>) -> Self {
        Self {
            path: path.into(),
            sink: BufWriter::new(sink),
            vars: FxIndexMap::default(),
        }
    }

    /// Make the common `$pb$`, `$std$`, ... shorthands available
    pub fn with_rust_shorthands(mut self) -> Self {
        for (name, value) in RUST_SHORTHANDS {
            self.vars.insert((*name).to_owned(), (*value).to_owned());
        }
        self
    }

    /// Substitute `vars` (and the printer's own variables) into `template`
    /// and write the result.
    pub fn emit(&mut self, vars: &[(&str, &str)], template: &str) -> Result<()> {
        let text = self.render(vars, template)?;
        self.print_raw(&text)
    }

    /// Write `text` verbatim
    pub fn print_raw(&mut self, text: &str) -> Result<()> {
        self.sink
            .write_all(text.as_bytes())
            .map_err(|err| GenerateError::output(&self.path, err))
    }

    /// Flush everything written so far
    pub fn flush(&mut self) -> Result<()> {
        self.sink
            .flush()
            .map_err(|err| GenerateError::output(&self.path, err))
    }

    fn lookup<'a>(&'a self, vars: &[(&str, &'a str)], name: &str) -> Option<&'a str> {
        vars.iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
            .or_else(|| self.vars.get(name).map(String::as_str))
    }

    fn render(&self, vars: &[(&str, &str)], template: &str) -> Result<String> {
        let mut out = String::with_capacity(template.len());
        for line in dedent(template) {
            let mut rest = line;
            while let Some(start) = rest.find('$') {
                out.push_str(&rest[..start]);
                let after = &rest[start + 1..];
                let end = after.find('$').ok_or_else(|| {
                    GenerateError::precondition(format!(
                        "unterminated variable in template line '{line}'"
                    ))
                })?;
                let name = &after[..end];
                if name.is_empty() {
                    out.push('$');
                } else {
                    let value = self.lookup(vars, name).ok_or_else(|| {
                        GenerateError::precondition(format!(
                            "undefined template variable '{name}'"
                        ))
                    })?;
                    out.push_str(value);
                }
                rest = &after[end + 1..];
            }
            out.push_str(rest);
            out.push('\n');
        }
        Ok(out)
    }
}

impl Drop for Printer {
    fn drop(&mut self) {
        let _ = self.sink.flush();
    }
}

/// Lines of `template` without the first blank line, the trailing
/// whitespace-only line and the common indentation.
fn dedent(template: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = template.lines().collect();
    if lines.first().is_some_and(|line| line.trim().is_empty()) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }

    let indent = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    lines
        .into_iter()
        .map(|line| line.get(indent..).unwrap_or_else(|| line.trim_start()))
        .collect()
}
