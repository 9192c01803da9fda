//! The process-wide registry of known plugins.

use std::collections::HashMap;
use std::path::Path;

use crate::errors::PluginError;
use crate::observability::messages::plugin::{PluginDirectoryScanned, PluginRegistered};
use crate::observability::messages::StructuredLog;

use super::base::{Plugin, PluginType};

type PluginFactory = fn() -> Box<dyn Plugin>;

/// A name-keyed registry of plugin factories.
///
/// The original discovers plugins by scanning a directory of `.py` files at
/// import time and introspecting each module for `Plugin` subclasses.
/// Rust has no equivalent dynamic-load-and-introspect story without unsafe
/// `dlopen` against an unstable ABI, so plugins instead register themselves
/// through an explicit call (typically from a crate-level `register_all`
/// function called once at startup). [`Self::discover`] still walks a
/// directory, but looks for a small manifest file naming already-linked-in
/// plugins rather than loading arbitrary code -- the "declare what's
/// available by scanning a directory" contract survives even though the
/// loading mechanism does not.
#[derive(Default)]
pub struct PluginCollection {
    factories: HashMap<String, (PluginFactory, PluginType)>,
}

impl PluginCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        plugin_type: PluginType,
        factory: PluginFactory,
    ) -> Result<(), PluginError> {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(PluginError::DuplicatePlugin(name));
        }
        let type_name = match plugin_type {
            PluginType::Input => "input",
            PluginType::Proc => "processing",
            PluginType::Output => "output",
        };
        PluginRegistered {
            name: &name,
            plugin_type: type_name,
        }
        .log();
        self.factories.insert(name, (factory, plugin_type));
        Ok(())
    }

    /// Instantiate a fresh plugin by name.
    pub fn get(&self, name: &str) -> Result<Box<dyn Plugin>, PluginError> {
        self.factories
            .get(name)
            .map(|(factory, _)| factory())
            .ok_or_else(|| PluginError::UnknownPlugin(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn plugin_type_of(&self, name: &str) -> Result<PluginType, PluginError> {
        self.factories
            .get(name)
            .map(|(_, ty)| *ty)
            .ok_or_else(|| PluginError::UnknownPlugin(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(|s| s.as_str())
    }

    /// Look for a `plugins.manifest` file under `paths` listing already-
    /// registered plugin names, one per line, and report how many of them
    /// are indeed known to this collection. This does not register new
    /// plugins -- it is a consistency check between what the collection
    /// knows and what a deployment expects to find, the Rust-native
    /// reading of "scan a directory for plugins".
    pub fn discover(&self, paths: &[&Path]) -> Result<usize, PluginError> {
        let mut found = 0;
        for path in paths {
            let manifest = path.join("plugins.manifest");
            let text = match std::fs::read_to_string(&manifest) {
                Ok(t) => t,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(PluginError::DiscoveryIoError(
                        manifest.display().to_string(),
                        e.to_string(),
                    ))
                }
            };
            let here = text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && self.contains(l))
                .count();
            PluginDirectoryScanned {
                path: &path.display().to_string(),
                found: here,
            }
            .log();
            found += here;
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::parameter::ParameterCollection;
    use crate::plugin::{PluginKwargs, Task};

    struct NoOpPlugin;

    impl Plugin for NoOpPlugin {
        fn plugin_name(&self) -> &str {
            "noop"
        }
        fn plugin_type(&self) -> PluginType {
            PluginType::Proc
        }
        fn default_params(&self) -> ParameterCollection {
            ParameterCollection::new()
        }
        fn params(&self) -> &ParameterCollection {
            unimplemented!()
        }
        fn params_mut(&mut self) -> &mut ParameterCollection {
            unimplemented!()
        }
        fn input_data_dim(&self) -> Option<usize> {
            Some(2)
        }
        fn output_data_dim(&self) -> Option<usize> {
            Some(2)
        }
        fn pre_execute(&mut self) -> Result<(), PluginError> {
            Ok(())
        }
        fn execute(
            &mut self,
            _task: Task,
            _input: Option<Dataset>,
            kwargs: PluginKwargs,
        ) -> Result<(Dataset, PluginKwargs), PluginError> {
            Ok((Dataset::zeros(vec![1]), kwargs))
        }
        fn calculate_result_shape(&mut self) -> Result<Vec<isize>, PluginError> {
            Ok(vec![1])
        }
        fn set_input_shape(&mut self, _shape: Vec<isize>) {}
        fn clone_plugin(&self) -> Box<dyn Plugin> {
            Box::new(NoOpPlugin)
        }
    }

    fn make_noop() -> Box<dyn Plugin> {
        Box::new(NoOpPlugin)
    }

    #[test]
    fn register_and_get_round_trip() {
        let mut c = PluginCollection::new();
        c.register("noop", PluginType::Proc, make_noop).unwrap();
        let p = c.get("noop").unwrap();
        assert_eq!(p.plugin_name(), "noop");
    }

    #[test]
    fn duplicate_registration_errors() {
        let mut c = PluginCollection::new();
        c.register("noop", PluginType::Proc, make_noop).unwrap();
        assert!(matches!(
            c.register("noop", PluginType::Proc, make_noop),
            Err(PluginError::DuplicatePlugin(_))
        ));
    }

    #[test]
    fn unknown_plugin_errors() {
        let c = PluginCollection::new();
        assert!(matches!(c.get("missing"), Err(PluginError::UnknownPlugin(_))));
    }
}
