//! Controller registry: explicit mapping from `"Controller.method"` descriptors to callables.
//!
//! Routes may name their handler by descriptor instead of passing a closure. Descriptors are
//! resolved once, when the route table is built ([`crate::router::RouterBuilder::build`]), so a
//! typo in a route file fails at start-up instead of on the first request.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::handler::Handler;

/// Why a descriptor could not be resolved.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolutionError {
    /// The descriptor is not of the form `Controller.method`
    #[error("Malformed handler descriptor '{0}': expected 'Controller.method'")]
    MalformedDescriptor(String),
    /// No controller is registered under this name
    #[error("Controller not found: {0}")]
    UnknownController(String),
    /// The controller exists but has no such method
    #[error("Method not found: {controller}.{method}")]
    UnknownMethod {
        /// Controller name from the descriptor
        controller: String,
        /// Method name from the descriptor
        method: String,
    },
}

/// A named group of handler methods.
pub struct Controller {
    name: String,
    methods: HashMap<String, Arc<dyn Handler>>,
}

impl Controller {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: HashMap::new(),
        }
    }

    /// Register a method.
    #[must_use]
    pub fn method<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&HandlerRequest) -> HandlerResponse + Send + Sync + 'static,
    {
        self.methods.insert(name.to_string(), Arc::new(f));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Method names, sorted.
    #[must_use]
    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Registry of controllers keyed by name.
#[derive(Default)]
pub struct ControllerRegistry {
    controllers: HashMap<String, Controller>,
}

impl ControllerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a controller. A controller with the same name is replaced.
    pub fn register(&mut self, controller: Controller) -> &mut Self {
        let name = controller.name.clone();
        if self.controllers.insert(name.clone(), controller).is_some() {
            warn!(controller = %name, "Replaced existing controller");
        } else {
            debug!(
                controller = %name,
                total_controllers = self.controllers.len(),
                "Controller registered"
            );
        }
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    /// Resolve `"Controller.method"`.
    ///
    /// The controller name is looked up as written first, then with a `Controller` suffix, so
    /// `"Home.index"` finds a controller registered as `HomeController`.
    pub fn resolve(&self, descriptor: &str) -> Result<Arc<dyn Handler>, ResolutionError> {
        let (controller, method) = descriptor
            .split_once('.')
            .filter(|(c, m)| !c.is_empty() && !m.is_empty() && !m.contains('.'))
            .ok_or_else(|| ResolutionError::MalformedDescriptor(descriptor.to_string()))?;

        let found = self
            .controllers
            .get(controller)
            .or_else(|| self.controllers.get(&format!("{controller}Controller")))
            .ok_or_else(|| ResolutionError::UnknownController(controller.to_string()))?;

        found
            .methods
            .get(method)
            .map(Arc::clone)
            .ok_or_else(|| ResolutionError::UnknownMethod {
                controller: controller.to_string(),
                method: method.to_string(),
            })
    }
}
