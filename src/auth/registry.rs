use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::{basic, AccessController, Constructor, Error, Options};

/// Maps auth scheme names to the constructors building their access controllers.
#[derive(Default)]
pub struct SchemeRegistry {
    constructors: HashMap<String, Constructor>,
}

impl SchemeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every scheme shipped with the server.
    pub fn with_builtin_schemes() -> Result<Self, Error> {
        let mut registry = Self::new();
        registry.register(basic::SCHEME_NAME, basic::new_access_controller)?;
        Ok(registry)
    }

    pub fn register(&mut self, name: &str, constructor: Constructor) -> Result<(), Error> {
        if self.constructors.contains_key(name) {
            return Err(Error::DuplicateScheme(name.to_string()));
        }

        debug!("Registering auth scheme '{name}'");
        self.constructors.insert(name.to_string(), constructor);
        Ok(())
    }

    pub fn build(
        &self,
        name: &str,
        options: &Options,
    ) -> Result<Arc<dyn AccessController>, Error> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| Error::SchemeNotFound(name.to_string()))?;

        constructor(options)
    }
}
