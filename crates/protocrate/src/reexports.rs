//! Re-exports for `import public` across crate boundaries
//!
//! `import public` is transitive: if `a.proto` publicly imports `x.proto`, which
//! publicly imports `y.proto`, users of `a.proto`'s crate see the types of both.
//! Files of the current crate are never re-exported here since their types are
//! already defined in it. Only messages and enums of publicly imported files
//! are re-exported, never entire crates, because a crate may hold files that
//! nobody imported publicly.

use log::debug;
use rustc_hash::FxHashSet;

use crate::{
    context::Context,
    descriptor::{FileId, SchemaFile},
    error::Result,
};

/// Emit `pub use` items for every message and enum of every file outside the
/// current crate that is reachable from `file` through public imports.
///
/// Private imports are never followed. Each file is visited at most once, so
/// diamond-shaped public import graphs do not produce duplicate items.
pub fn emit_public_imports(ctx: &mut Context<'_>, file: FileId) -> Result<()> {
    let mut files_to_visit = vec![file];
    let mut visited = FxHashSet::default();

    while let Some(current) = files_to_visit.pop() {
        if !visited.insert(current) {
            continue;
        }

        let pool = ctx.pool;
        let dep = pool.file(current);
        if !ctx.membership.is_file_in_current_crate(current) {
            emit_public_imports_for_dep_file(ctx, dep)?;
        }

        // Reversed so that the stack pops public imports in declaration order
        files_to_visit.extend(
            dep.public_dependencies()
                .filter(|id| !visited.contains(id))
                .collect::<Vec<_>>()
                .into_iter()
                .rev(),
        );
    }

    Ok(())
}

/// `pub use` the messages (with their view and mutator) and enums of `dep`
fn emit_public_imports_for_dep_file(ctx: &mut Context<'_>, dep: &SchemaFile) -> Result<()> {
    debug!("Re-exporting types of publicly imported '{}'", dep.name);

    for msg in &dep.messages {
        let path = ctx.rs_type_path(dep.id, &msg.name);
        ctx.emit(
            &[("pkg::Msg", path.as_str())],
            r#"
                pub use $pkg::Msg$;
                pub use $pkg::Msg$View;
                pub use $pkg::Msg$Mut;
            "#,
        )?;
    }
    for enum_ in &dep.enums {
        let path = ctx.rs_type_path(dep.id, &enum_.name);
        ctx.emit(
            &[("pkg::Enum", path.as_str())],
            r#"
                pub use $pkg::Enum$;
            "#,
        )?;
    }
    Ok(())
}
