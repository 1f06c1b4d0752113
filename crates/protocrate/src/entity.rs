//! Per-message and per-enum code generators
//!
//! The orchestrator only decides *where* entity code goes; the shapes of the
//! generated types come from an [`EntityGenerator`]. [`SkeletonGenerator`]
//! produces the type declarations every kernel needs and, for the C++
//! kernel, the `extern "C"` thunks that back them.

use std::fmt;

use crate::{
    context::Context,
    descriptor::{EnumDescriptor, MessageDescriptor},
    error::Result,
};

/// Writes the code for one message or enum into the context's printer
pub trait EntityGenerator: fmt::Debug {
    /// Rust declarations for `msg`
    fn generate_message(&self, ctx: &mut Context<'_>, msg: &MessageDescriptor) -> Result<()>;

    /// C++ thunk definitions for `msg` (native-interop kernel only)
    fn generate_message_thunks(
        &self,
        ctx: &mut Context<'_>,
        msg: &MessageDescriptor,
    ) -> Result<()>;

    /// Rust declarations for `enum_`
    fn generate_enum(&self, ctx: &mut Context<'_>, enum_: &EnumDescriptor) -> Result<()>;
}

/// Symbol name of a C++ thunk for `full_name`
pub fn thunk_name(full_name: &str, op: &str) -> String {
    format!("__rust_proto_thunk__{}_{op}", full_name.replace('.', "_"))
}

/// C++ spelling of a fully qualified schema name
fn cpp_type_name(full_name: &str) -> String {
    format!("::{}", full_name.replace('.', "::"))
}

/// Minimal type skeletons: an owned message, its view and mutator, and an
/// open enum newtype
#[derive(Debug, Default, Clone, Copy)]
pub struct SkeletonGenerator;

impl EntityGenerator for SkeletonGenerator {
    fn generate_message(&self, ctx: &mut Context<'_>, msg: &MessageDescriptor) -> Result<()> {
        let path = ctx.crate_relative_path(&msg.name);
        let name = crate::naming::rs_safe_name(&msg.name);
        let vars = [
            ("Msg", name.as_str()),
            ("full_name", msg.full_name.as_str()),
            ("path", path.as_str()),
        ];

        ctx.emit(
            &vars,
            r#"
                /// Generated from `$full_name$`, defined at `$path$`.
                #[derive(Debug, Default)]
                pub struct $Msg$ {
                    inner: $pbr$::MessageInner,
                }

                #[derive(Debug, Clone, Copy)]
                pub struct $Msg$View<'msg> {
                    msg: &'msg $Msg$,
                }

                #[derive(Debug)]
                pub struct $Msg$Mut<'msg> {
                    msg: &'msg mut $Msg$,
                }

                impl $Msg$ {
                    pub fn as_view(&self) -> $Msg$View<'_> {
                        $Msg$View { msg: self }
                    }

                    pub fn as_mut(&mut self) -> $Msg$Mut<'_> {
                        $Msg$Mut { msg: self }
                    }
                }
            "#,
        )?;

        if ctx.is_cpp() {
            let new_thunk = thunk_name(&msg.full_name, "new");
            let delete_thunk = thunk_name(&msg.full_name, "delete");
            ctx.emit(
                &[
                    ("new_thunk", new_thunk.as_str()),
                    ("delete_thunk", delete_thunk.as_str()),
                ],
                r#"
                    unsafe extern "C" {
                        fn $new_thunk$() -> $pbr$::RawMessage;
                        fn $delete_thunk$(raw_msg: $pbr$::RawMessage);
                    }
                "#,
            )?;
        }
        Ok(())
    }

    fn generate_message_thunks(
        &self,
        ctx: &mut Context<'_>,
        msg: &MessageDescriptor,
    ) -> Result<()> {
        let cpp_type = cpp_type_name(&msg.full_name);
        let new_thunk = thunk_name(&msg.full_name, "new");
        let delete_thunk = thunk_name(&msg.full_name, "delete");
        ctx.emit(
            &[
                ("QualifiedMsg", cpp_type.as_str()),
                ("new_thunk", new_thunk.as_str()),
                ("delete_thunk", delete_thunk.as_str()),
            ],
            r#"
                extern "C" {
                void* $new_thunk$() { return new $QualifiedMsg$(); }
                void $delete_thunk$(void* msg) { delete static_cast<$QualifiedMsg$*>(msg); }
                }  // extern "C"
            "#,
        )
    }

    fn generate_enum(&self, ctx: &mut Context<'_>, enum_: &EnumDescriptor) -> Result<()> {
        let name = crate::naming::rs_safe_name(&enum_.name);
        ctx.emit(
            &[("Enum", name.as_str()), ("full_name", enum_.full_name.as_str())],
            r#"
                /// Generated from `$full_name$`.
                #[repr(transparent)]
                #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
                pub struct $Enum$(i32);

                impl $Enum$ {
                    pub const fn from_i32(value: i32) -> Self {
                        Self(value)
                    }

                    pub const fn value(self) -> i32 {
                        self.0
                    }
                }

                impl $std$::convert::From<$Enum$> for i32 {
                    fn from(value: $Enum$) -> i32 {
                        value.0
                    }
                }
            "#,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thunk_names() {
        assert_eq!(thunk_name("pkg.sub.Foo", "new"), "__rust_proto_thunk__pkg_sub_Foo_new");
        assert_eq!(cpp_type_name("pkg.sub.Foo"), "::pkg::sub::Foo");
    }
}
