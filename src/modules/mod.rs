//! Built-in modules and the static manifest that loads them.
//!
//! Which built-ins run is decided by `[modules] enabled`; every name there
//! must appear in [`BUILTIN_NAMES`].

mod forget;
mod headlines;
mod help;
mod infoitem;
mod karma;
mod owner;
mod seen;

pub use forget::Forget;
pub use headlines::{Headlines, HttpSource};
pub use help::HelpIndex;
pub use infoitem::InfoItem;
pub use karma::Karma;
pub use owner::Owner;
pub use seen::Seen;

use crate::error::RegistryError;
use crate::handlers::{Module, Registry};
use crate::state::SharedCache;
use std::sync::Arc;
use tracing::info;

/// Names accepted in `[modules] enabled`, in default load order.
pub const BUILTIN_NAMES: &[&str] = &[
    "owner",
    "help",
    "karma",
    "infoitem",
    "forget",
    "seen",
    "headlines",
];

/// Builds built-in modules by name.
pub struct Manifest {
    owner_command: String,
    headlines: Arc<SharedCache<Vec<String>>>,
    max_headlines: usize,
}

impl Manifest {
    pub fn new(owner_command: impl Into<String>) -> Self {
        Self {
            owner_command: owner_command.into(),
            headlines: Arc::new(SharedCache::default()),
            max_headlines: 3,
        }
    }

    /// Serve headlines from `cache`, showing at most `max_items`.
    pub fn with_headlines(mut self, cache: Arc<SharedCache<Vec<String>>>, max_items: usize) -> Self {
        self.headlines = cache;
        self.max_headlines = max_items;
        self
    }

    pub fn instantiate(&self, name: &str) -> Result<Arc<dyn Module>, RegistryError> {
        let module: Arc<dyn Module> = match name {
            "owner" => Arc::new(Owner::new(&self.owner_command)),
            "help" => Arc::new(HelpIndex),
            "karma" => Arc::new(Karma),
            "infoitem" => Arc::new(InfoItem),
            "forget" => Arc::new(Forget),
            "seen" => Arc::new(Seen::new()),
            "headlines" => Arc::new(Headlines::new(
                Arc::clone(&self.headlines),
                self.max_headlines,
            )),
            other => return Err(RegistryError::UnknownModule(other.to_string())),
        };
        Ok(module)
    }

    /// Register every module in `enabled`, in order.
    pub fn load(&self, registry: &Registry, enabled: &[String]) -> Result<(), RegistryError> {
        for name in enabled {
            registry.register_module(self.instantiate(name)?)?;
        }
        info!(count = enabled.len(), "built-in modules loaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_loads() {
        let registry = Registry::new();
        let names: Vec<String> = BUILTIN_NAMES.iter().map(|s| s.to_string()).collect();
        Manifest::new("owner").load(&registry, &names).unwrap();
        assert_eq!(registry.names(), names);
        assert!(registry.is_command("karma"));
        assert!(registry.is_command("owner"));
    }

    #[test]
    fn unknown_name_is_rejected() {
        let Err(err) = Manifest::new("owner").instantiate("weather") else {
            panic!("weather is not a built-in");
        };
        assert_eq!(err, RegistryError::UnknownModule("weather".into()));
    }

    #[test]
    fn owner_command_name_follows_config() {
        let registry = Registry::new();
        Manifest::new("claim")
            .load(&registry, &["owner".to_string()])
            .unwrap();
        assert!(registry.is_command("claim"));
        assert!(!registry.is_command("owner"));
    }
}
