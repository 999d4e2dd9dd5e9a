use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use lspwire_jsonrpc::{Request, ResponseMessage};

/// Something that can answer a method.
///
/// `response` is `None` for notifications. For requests it starts as a
/// `null` result; set a result or an error on it before returning.
pub trait Handler: Send + Sync {
    fn handle(&self, request: &Request, response: Option<&mut ResponseMessage>);
}

impl<F> Handler for F
where
    F: Fn(&Request, Option<&mut ResponseMessage>) + Send + Sync,
{
    fn handle(&self, request: &Request, response: Option<&mut ResponseMessage>) {
        self(request, response)
    }
}

/// Method name to handler mapping.
///
/// Populate it before serving: servers take the registry by value and share
/// it read-only across connections, so it cannot change once accepting
/// starts.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a closure for `method`, replacing any earlier handler.
    pub fn register<F>(&mut self, method: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(&Request, Option<&mut ResponseMessage>) + Send + Sync + 'static,
    {
        self.register_handler(method, handler)
    }

    /// Register any [`Handler`] implementation for `method`.
    pub fn register_handler(
        &mut self,
        method: impl Into<String>,
        handler: impl Handler + 'static,
    ) -> &mut Self {
        self.handlers.insert(method.into(), Arc::new(handler));
        self
    }

    /// Exact-match lookup.
    pub fn get(&self, method: &str) -> Option<&dyn Handler> {
        self.handlers.get(method).map(|handler| handler.as_ref())
    }

    pub fn contains(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered method names, sorted.
    pub fn methods(&self) -> Vec<&str> {
        let mut methods: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        methods.sort_unstable();
        methods
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("methods", &self.methods())
            .finish()
    }
}
