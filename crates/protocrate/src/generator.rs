//! Generation of one schema file's outputs
//!
//! The host calls [`RustGenerator::generate`] once for every file of the crate,
//! not once per crate. The primary file's output additionally declares all
//! other files as submodules. With the C++ kernel every file also gets a
//! companion `.pb.thunks.cc` holding the `extern "C"` glue.

use log::{debug, info, trace};

use crate::{
    config::{Kernel, Options},
    context::Context,
    crate_mapping::CrateMapping,
    crate_membership::CrateMembership,
    descriptor::{DescriptorPool, FileId, SchemaFile},
    entity::{EntityGenerator, SkeletonGenerator},
    error::{GenerateError, Result},
    host::GeneratorHost,
    naming,
    printer::Printer,
    reexports::emit_public_imports,
    submodules::declare_submodules_for_non_primary_srcs,
};

/// Runtime includes every thunks file needs after the schema headers
const THUNKS_RUNTIME_INCLUDES: &str = r#"
    #include "google/protobuf/map.h"
    #include "google/protobuf/repeated_field.h"
    #include "google/protobuf/repeated_ptr_field.h"
    #include "rust/cpp_kernel/serialized_data.h"
    #include "rust/cpp_kernel/strings.h"
"#;

/// Outputs besides the primary Rust file, per kernel
enum KernelOutputs {
    Standalone,
    NativeInterop { thunks: Printer },
}

/// Drives generation of a single file through the [`EntityGenerator`] `G`
#[derive(Debug, Default)]
pub struct RustGenerator<G = SkeletonGenerator> {
    entities: G,
}

impl RustGenerator {
    /// Generator producing the [`SkeletonGenerator`] type shapes
    pub fn skeleton() -> Self {
        Self::new(SkeletonGenerator)
    }
}

impl<G: EntityGenerator> RustGenerator<G> {
    pub fn new(entities: G) -> Self {
        Self { entities }
    }

    pub fn entities(&self) -> &G {
        &self.entities
    }

    /// Parse `parameter`, load the crate mapping it names and generate `file`
    pub fn generate(
        &self,
        file: FileId,
        parameter: &str,
        pool: &DescriptorPool,
        host: &mut dyn GeneratorHost,
    ) -> Result<()> {
        let opts = Options::parse(parameter)?;
        let crate_mapping = CrateMapping::from_options(&opts)?;
        self.generate_with(file, &opts, &crate_mapping, pool, host)
    }

    /// [`Self::generate`] reported the way protoc plugins report: a success
    /// flag and an error message for the host.
    pub fn generate_for_host(
        &self,
        file: FileId,
        parameter: &str,
        pool: &DescriptorPool,
        host: &mut dyn GeneratorHost,
    ) -> (bool, String) {
        match self.generate(file, parameter, pool, host) {
            Ok(()) => (true, String::new()),
            Err(err) => (false, err.to_string()),
        }
    }

    /// Generate `file` with already parsed options and crate mapping
    pub fn generate_with(
        &self,
        file: FileId,
        opts: &Options,
        crate_mapping: &CrateMapping,
        pool: &DescriptorPool,
        host: &mut dyn GeneratorHost,
    ) -> Result<()> {
        let schema = pool.get(file).ok_or_else(|| {
            GenerateError::precondition(format!("file {file:?} is not in the descriptor pool"))
        })?;
        if let Some(unknown) = host.parsed_files().iter().find(|id| pool.get(**id).is_none()) {
            return Err(GenerateError::precondition(format!(
                "crate file {unknown:?} is not in the descriptor pool"
            )));
        }

        let membership = CrateMembership::new(host.parsed_files().to_vec(), crate_mapping)?;
        let primary_file = membership.primary_file()?;
        if !membership.is_file_in_current_crate(file) {
            return Err(GenerateError::precondition(format!(
                "'{}' is not part of the crate being generated",
                schema.name
            )));
        }

        let is_primary = file == primary_file;
        // Non-primary files are compiled as a module of the primary one
        let modules = if is_primary {
            Vec::new()
        } else {
            vec![naming::internal_module_name(schema)]
        };

        let rs_path = naming::rs_file(opts.kernel, schema);
        info!("Generating {rs_path} ({} kernel)", opts.kernel);
        let mut printer = open_printer(host, rs_path)?.with_rust_shorthands();
        let mut ctx = Context::new(opts, pool, &membership, &modules, &mut printer);

        if is_primary {
            debug!(
                "'{}' is the primary file, declaring {} submodules",
                schema.name,
                membership.non_primary_files().len()
            );
            declare_submodules_for_non_primary_srcs(
                &mut ctx,
                primary_file,
                membership.non_primary_files(),
            )?;
        }

        let mut outputs = match opts.kernel {
            Kernel::Standalone => KernelOutputs::Standalone,
            Kernel::NativeInterop => {
                let mut thunks = open_printer(host, naming::thunks_cc_file(schema))?;
                emit_thunks_preamble(&mut thunks, opts, pool, schema)?;
                KernelOutputs::NativeInterop { thunks }
            }
        };

        emit_public_imports(&mut ctx, file)?;

        for msg in &schema.messages {
            self.entities.generate_message(&mut ctx, msg)?;
            ctx.printer().print_raw("\n")?;

            if let KernelOutputs::NativeInterop { thunks } = &mut outputs {
                let mut thunks_ctx = ctx.with_printer(thunks);
                thunks_ctx.emit(&[("Msg", msg.full_name.as_str())], "// $Msg$")?;
                self.entities.generate_message_thunks(&mut thunks_ctx, msg)?;
                thunks_ctx.printer().print_raw("\n")?;
            }
        }

        for enum_ in &schema.enums {
            self.entities.generate_enum(&mut ctx, enum_)?;
            ctx.printer().print_raw("\n")?;

            // Enums have no thunks yet; the companion output only gets a marker
            if let KernelOutputs::NativeInterop { thunks } = &mut outputs {
                let mut thunks_ctx = ctx.with_printer(thunks);
                thunks_ctx.emit(&[("enum", enum_.full_name.as_str())], "// $enum$")?;
                thunks_ctx.printer().print_raw("\n")?;
            }
        }

        printer.flush()?;
        if let KernelOutputs::NativeInterop { mut thunks } = outputs {
            thunks.flush()?;
        }
        Ok(())
    }
}

fn open_printer(host: &mut dyn GeneratorHost, path: String) -> Result<Printer> {
    let sink = host
        .open(&path)
        .map_err(|err| GenerateError::output(path.as_str(), err))?;
    Ok(Printer::new(path, sink))
}

/// Include the file's own C++ header and those of its dependencies.
///
/// Feature proto headers are skipped when non-functional codegen is stripped.
fn emit_thunks_preamble(
    thunks: &mut Printer,
    opts: &Options,
    pool: &DescriptorPool,
    file: &SchemaFile,
) -> Result<()> {
    let proto_h = naming::header_file(file);
    thunks.emit(&[("proto_h", proto_h.as_str())], r#"#include "$proto_h$""#)?;

    for dep in &file.dependencies {
        let dep_file = pool.file(dep.file);
        if opts.strip_nonfunctional_codegen && naming::is_known_feature_proto(&dep_file.name) {
            trace!("Stripping feature proto include for '{}'", dep_file.name);
            continue;
        }
        let proto_dep_h = naming::header_file(dep_file);
        thunks.emit(
            &[("proto_dep_h", proto_dep_h.as_str())],
            r#"#include "$proto_dep_h$""#,
        )?;
    }

    thunks.emit(&[], THUNKS_RUNTIME_INCLUDES)
}
