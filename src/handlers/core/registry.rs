//! Module registry.
//!
//! Holds loaded modules in registration order and answers routing queries.
//! Lookups return snapshots of `Arc`s, so a module unregistered while one of
//! its invocations is running finishes that invocation normally.

use super::traits::{Help, Module};
use crate::classifier::is_valid_command_name;
use crate::error::RegistryError;
use crate::intent::ShorthandKind;
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

/// One loaded module's contract.
pub struct ModuleDescriptor {
    pub name: String,
    pub commands: BTreeSet<String>,
    pub events: BTreeSet<String>,
    pub shorthands: BTreeSet<ShorthandKind>,
    pub required_permissions: Vec<String>,
    pub help: Help,
    pub hidden: bool,
    pub handler: Arc<dyn Module>,
}

impl ModuleDescriptor {
    /// Read `module`'s config once and validate it.
    pub fn load(module: Arc<dyn Module>) -> Result<Self, RegistryError> {
        let config = module.config();
        let name = module.name().to_string();

        if config.commands.is_empty() && config.events.is_empty() && config.shorthands.is_empty()
        {
            return Err(RegistryError::UnreachableModule(name));
        }
        if let Some(bad) = config.commands.iter().find(|c| !is_valid_command_name(c)) {
            return Err(RegistryError::InvalidCommandName {
                module: name,
                command: bad.clone(),
            });
        }

        Ok(Self {
            name,
            commands: config.commands,
            events: config.events,
            shorthands: config.shorthands,
            required_permissions: config.permissions,
            help: config.help,
            hidden: config.hidden,
            handler: module,
        })
    }
}

impl std::fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("name", &self.name)
            .field("commands", &self.commands)
            .field("events", &self.events)
            .field("shorthands", &self.shorthands)
            .field("required_permissions", &self.required_permissions)
            .field("hidden", &self.hidden)
            .finish()
    }
}

/// Registry of loaded modules.
#[derive(Default)]
pub struct Registry {
    modules: RwLock<Vec<Arc<ModuleDescriptor>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module. Names are unique; reload goes through [`Registry::reload`].
    pub fn register(&self, descriptor: ModuleDescriptor) -> Result<(), RegistryError> {
        let mut modules = self.modules.write();
        if modules.iter().any(|m| m.name == descriptor.name) {
            return Err(RegistryError::DuplicateModule(descriptor.name));
        }
        warn_on_shared_commands(&modules, &descriptor);

        info!(
            module = %descriptor.name,
            commands = ?descriptor.commands,
            events = ?descriptor.events,
            "module registered"
        );
        modules.push(Arc::new(descriptor));
        Ok(())
    }

    /// Load and register in one step.
    pub fn register_module(&self, module: Arc<dyn Module>) -> Result<(), RegistryError> {
        self.register(ModuleDescriptor::load(module)?)
    }

    /// Remove a module immediately. Returns the removed descriptor.
    pub fn unregister(&self, name: &str) -> Result<Arc<ModuleDescriptor>, RegistryError> {
        let mut modules = self.modules.write();
        let pos = modules
            .iter()
            .position(|m| m.name == name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        info!(module = %name, "module unregistered");
        Ok(modules.remove(pos))
    }

    /// Replace a loaded module in place, keeping its registration position.
    ///
    /// The replacement is validated before the swap; on error the old
    /// module stays loaded.
    pub fn reload(&self, module: Arc<dyn Module>) -> Result<(), RegistryError> {
        let descriptor = ModuleDescriptor::load(module)?;
        let mut modules = self.modules.write();
        let pos = modules
            .iter()
            .position(|m| m.name == descriptor.name)
            .ok_or_else(|| RegistryError::NotFound(descriptor.name.clone()))?;
        info!(module = %descriptor.name, "module reloaded");
        modules[pos] = Arc::new(descriptor);
        Ok(())
    }

    pub fn find_command_handlers(&self, command: &str) -> Vec<Arc<ModuleDescriptor>> {
        self.select(|m| m.commands.contains(command))
    }

    pub fn find_event_handlers(&self, signal: &str) -> Vec<Arc<ModuleDescriptor>> {
        self.select(|m| m.events.contains(signal))
    }

    pub fn find_shorthand_handlers(&self, kind: ShorthandKind) -> Vec<Arc<ModuleDescriptor>> {
        self.select(|m| m.shorthands.contains(&kind))
    }

    /// Whether any module claims `command` (lower-cased).
    pub fn is_command(&self, command: &str) -> bool {
        self.modules.read().iter().any(|m| m.commands.contains(command))
    }

    pub fn command_names(&self) -> BTreeSet<String> {
        self.modules
            .read()
            .iter()
            .flat_map(|m| m.commands.iter().cloned())
            .collect()
    }

    /// Modules shown by help listings.
    pub fn advertised(&self) -> Vec<Arc<ModuleDescriptor>> {
        self.select(|m| !m.hidden && !m.commands.is_empty())
    }

    pub fn names(&self) -> Vec<String> {
        self.modules.read().iter().map(|m| m.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.modules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.read().is_empty()
    }

    fn select(&self, pred: impl Fn(&ModuleDescriptor) -> bool) -> Vec<Arc<ModuleDescriptor>> {
        self.modules
            .read()
            .iter()
            .filter(|m| pred(m))
            .cloned()
            .collect()
    }
}

fn warn_on_shared_commands(existing: &[Arc<ModuleDescriptor>], new: &ModuleDescriptor) {
    for module in existing {
        for command in module.commands.intersection(&new.commands) {
            warn!(
                command = %command,
                first = %module.name,
                second = %new.name,
                "command claimed by more than one module; first permitted one wins"
            );
        }
    }
}
