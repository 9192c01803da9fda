//! [`FormatHandler`] trait and the generic [`FormatRegistry`] that holds
//! instances of it keyed by extension.

use std::collections::HashMap;

use crate::errors::IoRegistryError;

/// The capability set a registered file-format backend exposes: a display
/// name, the extensions it claims for import and for export, and the data
/// dimensionality it supports.
///
/// Concrete backends (HDF5, TIFF, a JSON sidecar format, ...) are out of
/// scope here -- only the registration contract matters, matching the
/// original's `io_base` pattern where every concrete reader/writer
/// registers itself against this same shape.
pub trait FormatHandler {
    fn format_name(&self) -> &str;
    fn extensions_import(&self) -> &[&str];
    fn extensions_export(&self) -> &[&str];
    /// The data dimensionalities this handler supports, e.g. `&[2, 3]` for
    /// a handler that can read both images and image stacks.
    fn dimensions(&self) -> &[usize];
}

/// A registry of [`FormatHandler`]s keyed by the extensions they claim.
///
/// Registration happens at a fixed call site during startup (plugin
/// discovery, or `main`), not via automatic class-body scanning -- Rust has
/// no metaclass hook to reuse here, so the registration step is explicit.
pub struct FormatRegistry<H: FormatHandler> {
    import_handlers: HashMap<String, usize>,
    export_handlers: HashMap<String, usize>,
    handlers: Vec<H>,
}

impl<H: FormatHandler> FormatRegistry<H> {
    pub fn new() -> Self {
        Self {
            import_handlers: HashMap::new(),
            export_handlers: HashMap::new(),
            handlers: Vec::new(),
        }
    }

    /// Register a handler, claiming all of its import/export extensions.
    /// Fails if an extension is already claimed by another handler in the
    /// same direction.
    pub fn register(&mut self, handler: H) -> Result<(), IoRegistryError> {
        for ext in handler.extensions_import() {
            if let Some(&existing) = self.import_handlers.get(*ext) {
                return Err(IoRegistryError::ExtensionCollision {
                    extension: ext.to_string(),
                    existing_handler: self.handlers[existing].format_name().to_string(),
                });
            }
        }
        for ext in handler.extensions_export() {
            if let Some(&existing) = self.export_handlers.get(*ext) {
                return Err(IoRegistryError::ExtensionCollision {
                    extension: ext.to_string(),
                    existing_handler: self.handlers[existing].format_name().to_string(),
                });
            }
        }
        let index = self.handlers.len();
        for ext in handler.extensions_import() {
            self.import_handlers.insert(ext.to_string(), index);
        }
        for ext in handler.extensions_export() {
            self.export_handlers.insert(ext.to_string(), index);
        }
        self.handlers.push(handler);
        Ok(())
    }

    pub fn for_import_extension(&self, ext: &str) -> Result<&H, IoRegistryError> {
        self.import_handlers
            .get(ext)
            .map(|&i| &self.handlers[i])
            .ok_or_else(|| IoRegistryError::UnknownExtension(ext.to_string()))
    }

    pub fn for_export_extension(&self, ext: &str) -> Result<&H, IoRegistryError> {
        self.export_handlers
            .get(ext)
            .map(|&i| &self.handlers[i])
            .ok_or_else(|| IoRegistryError::UnknownExtension(ext.to_string()))
    }

    /// A `"Name files (*.ext1 *.ext2);;..."`-style file-filter string, in
    /// registration order. No GUI in this crate consumes it, but the
    /// registry is the single source of truth for file-format metadata, so
    /// the format stays available for whatever front end is layered on.
    pub fn get_string_of_formats(&self) -> String {
        self.handlers
            .iter()
            .map(|h| {
                let exts = h
                    .extensions_import()
                    .iter()
                    .chain(h.extensions_export())
                    .map(|e| format!("*.{e}"))
                    .collect::<Vec<_>>()
                    .join(" ");
                format!("{} ({})", h.format_name(), exts)
            })
            .collect::<Vec<_>>()
            .join(";;")
    }

    pub fn handlers(&self) -> &[H] {
        &self.handlers
    }
}

impl<H: FormatHandler> Default for FormatRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stub {
        name: &'static str,
        import: Vec<&'static str>,
        export: Vec<&'static str>,
    }

    impl FormatHandler for Stub {
        fn format_name(&self) -> &str {
            self.name
        }
        fn extensions_import(&self) -> &[&str] {
            &self.import
        }
        fn extensions_export(&self) -> &[&str] {
            &self.export
        }
        fn dimensions(&self) -> &[usize] {
            &[2]
        }
    }

    #[test]
    fn registers_and_looks_up_by_extension() {
        let mut reg = FormatRegistry::new();
        reg.register(Stub {
            name: "Json",
            import: vec!["json"],
            export: vec!["json"],
        })
        .unwrap();
        assert_eq!(reg.for_import_extension("json").unwrap().format_name(), "Json");
    }

    #[test]
    fn collision_on_extension_is_rejected() {
        let mut reg = FormatRegistry::new();
        reg.register(Stub {
            name: "A",
            import: vec!["dat"],
            export: vec![],
        })
        .unwrap();
        let err = reg
            .register(Stub {
                name: "B",
                import: vec!["dat"],
                export: vec![],
            })
            .unwrap_err();
        assert!(matches!(err, IoRegistryError::ExtensionCollision { .. }));
    }
}
