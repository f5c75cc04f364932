// ─── Internal helpers: metadata defaults ─────────────────────────────────────
//
// Used exclusively by `define_module!`.  Not part of the public API.

#[macro_export]
#[doc(hidden)]
macro_rules! __module_version {
    () => {
        ::std::env!("CARGO_PKG_VERSION")
    };
    ($ver:literal) => {
        $ver
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! __module_desc {
    () => {
        ""
    };
    ($desc:literal) => {
        $desc
    };
}

// ─── define_module! ──────────────────────────────────────────────────────────

/// Declares a plugin module and evaluates to its [`ModuleDescriptor`].
///
/// The result is a constant expression, so it can initialise a `static`.
/// Handler expressions are evaluated every time the module is instantiated,
/// which happens again on every reload.
///
/// Event kinds are the variant names of [`EventKind`](demibot_core::EventKind).
///
/// ```rust,ignore
/// pub static TOOLS: ModuleDescriptor = define_module! {
///     name: "tools",
///     version: "1.2.0",
///     desc: "Small utilities",
///     commands: {
///         "echo" => handler(echo),
///         "lookup" => blocking(lookup),
///     },
///     events: {
///         Message => handler(watch),
///         Action => handler(watch),
///     },
/// };
/// ```
///
/// [`ModuleDescriptor`]: crate::plugin::ModuleDescriptor
#[macro_export]
macro_rules! define_module {
    (
        name: $name:literal
        $(, version: $ver:literal)?
        $(, desc: $desc:literal)?
        $(, commands: { $($cmd:literal => $cmd_handler:expr),* $(,)? })?
        $(, events: { $($kind:ident => $ev_handler:expr),* $(,)? })?
        $(,)?
    ) => {{
        fn __create(
            _ctx: &$crate::plugin::ModuleLoadContext,
        ) -> ::std::result::Result<$crate::plugin::PluginModule, $crate::BoxError> {
            let builder = $crate::plugin::PluginModule::builder($name);
            $($(let builder = builder.command($cmd, $cmd_handler);)*)?
            $($(let builder = builder.on($crate::__EventKind::$kind, $ev_handler);)*)?
            ::std::result::Result::Ok(builder.build())
        }

        $crate::plugin::ModuleDescriptor {
            name: $name,
            create: __create,
            metadata: $crate::plugin::ModuleMetadata {
                version: $crate::__module_version!($($ver)?),
                desc: $crate::__module_desc!($($desc)?),
            },
        }
    }};
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use demibot_core::EventKind;

    use crate::context::HandlerContext;
    use crate::handler::handler;
    use crate::plugin::ModuleDescriptor;
    use crate::BoxError;

    async fn pong(ctx: HandlerContext) -> Result<String, BoxError> {
        Ok(format!("{}: pong", ctx.nick()))
    }

    async fn quiet(_ctx: HandlerContext) -> Result<(), BoxError> {
        Ok(())
    }

    static FULL: ModuleDescriptor = define_module! {
        name: "full",
        version: "2.0.0",
        desc: "Everything set",
        commands: {
            "pong" => handler(pong),
            "hush" => handler(quiet),
        },
        events: {
            Message => handler(quiet),
            Message => handler(quiet),
            Notice => handler(quiet),
        },
    };

    static BARE: ModuleDescriptor = define_module! {
        name: "bare",
    };

    #[test]
    fn test_descriptor_metadata() {
        assert_eq!(FULL.name, "full");
        assert_eq!(FULL.metadata.version, "2.0.0");
        assert_eq!(FULL.metadata.desc, "Everything set");
        assert_eq!(BARE.metadata.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(BARE.metadata.desc, "");
    }

    #[test]
    fn test_instantiate_builds_tables() {
        let module = FULL
            .instantiate(Arc::new(serde_json::json!({ "k": 1 })))
            .unwrap();
        assert_eq!(module.name(), "full");
        assert_eq!(module.command_names().collect::<Vec<_>>(), vec!["hush", "pong"]);
        assert_eq!(module.handlers_for(EventKind::Message).len(), 2);
        assert_eq!(module.handlers_for(EventKind::Notice).len(), 1);
        assert_eq!(module.config()["k"], 1);

        let bare = BARE.instantiate(Arc::new(serde_json::Value::Null)).unwrap();
        assert_eq!(bare.command_names().count(), 0);
    }
}
