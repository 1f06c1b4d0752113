//! Per-file generation context

use crate::{
    config::{Kernel, Options},
    crate_membership::CrateMembership,
    descriptor::{DescriptorPool, FileId},
    error::Result,
    naming,
    printer::Printer,
};

/// Everything a generator needs while writing one file's output.
///
/// Created fresh for each generated file. All shared state is borrowed
/// read-only; only the printer is mutable.
#[derive(Debug)]
pub struct Context<'a> {
    pub opts: &'a Options,
    pub pool: &'a DescriptorPool,
    pub membership: &'a CrateMembership<'a>,
    /// Module path of the file being generated, relative to the crate root.
    /// Empty for the primary file.
    modules: &'a [String],
    printer: &'a mut Printer,
}

impl<'a> Context<'a> {
    pub fn new(
        opts: &'a Options,
        pool: &'a DescriptorPool,
        membership: &'a CrateMembership<'a>,
        modules: &'a [String],
        printer: &'a mut Printer,
    ) -> Self {
        Self {
            opts,
            pool,
            membership,
            modules,
            printer,
        }
    }

    /// Same context, writing to a different printer
    pub fn with_printer<'b>(&'b self, printer: &'b mut Printer) -> Context<'b> {
        Context {
            opts: self.opts,
            pool: self.pool,
            membership: self.membership,
            modules: self.modules,
            printer,
        }
    }

    pub fn kernel(&self) -> Kernel {
        self.opts.kernel
    }

    pub fn is_cpp(&self) -> bool {
        self.opts.kernel == Kernel::NativeInterop
    }

    pub fn modules(&self) -> &[String] {
        self.modules
    }

    /// Crate-relative path of `name` as defined by the file being generated
    pub fn crate_relative_path(&self, name: &str) -> String {
        let mut path = String::from("crate::");
        for module in self.modules {
            path.push_str(module);
            path.push_str("::");
        }
        path.push_str(&naming::rs_safe_name(name));
        path
    }

    /// Fully qualified path of `name` defined in `file`, seen from the crate
    /// being generated.
    ///
    /// Files of the current crate are glob re-exported at the crate root, so
    /// `crate::Name` reaches them no matter which module defines them.
    pub fn rs_type_path(&self, file: FileId, name: &str) -> String {
        if self.membership.is_file_in_current_crate(file) {
            format!("crate::{}", naming::rs_safe_name(name))
        } else {
            let crate_name = self.membership.crate_name_for(self.pool.file(file));
            naming::rs_type_path(&crate_name, name)
        }
    }

    pub fn printer(&mut self) -> &mut Printer {
        &mut *self.printer
    }

    pub fn emit(&mut self, vars: &[(&str, &str)], template: &str) -> Result<()> {
        self.printer.emit(vars, template)
    }
}
