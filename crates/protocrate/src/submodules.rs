//! Module declarations for the non-primary files of a crate
//!
//! rustc only discovers the crate root, so the primary file's output declares
//! every other generated file as a private module via `#[path]` and glob
//! re-exports it. Types of all files then live side by side at the crate root.

use log::debug;

use crate::{
    context::Context,
    descriptor::FileId,
    error::Result,
    naming,
    relative_path::RelativePath,
};

/// Declare each of `non_primary_srcs` as a submodule of `primary_file`'s output.
///
/// Declarations follow the order of `non_primary_srcs`; nothing is emitted
/// when the crate only has its primary file.
pub fn declare_submodules_for_non_primary_srcs(
    ctx: &mut Context<'_>,
    primary_file: FileId,
    non_primary_srcs: &[FileId],
) -> Result<()> {
    let pool = ctx.pool;
    let kernel = ctx.kernel();
    let primary_relpath = RelativePath::new(&naming::rs_file(kernel, pool.file(primary_file)))?;

    for &non_primary in non_primary_srcs {
        let file = pool.file(non_primary);
        let non_primary_path = RelativePath::new(&naming::rs_file(kernel, file))?;
        let relative_mod_path = primary_relpath.relative(&non_primary_path);
        let mod_name = naming::internal_module_name(file);
        debug!(
            "Declaring '{}' as module `{mod_name}` at {relative_mod_path}",
            file.name
        );

        ctx.emit(
            &[
                ("file_path", relative_mod_path.as_str()),
                ("mod_name", mod_name.as_str()),
            ],
            r#"
                #[path="$file_path$"]
                #[allow(non_snake_case)]
                mod $mod_name$;

                #[allow(unused_imports)]
                pub use $mod_name$::*;
            "#,
        )?;
    }
    Ok(())
}
