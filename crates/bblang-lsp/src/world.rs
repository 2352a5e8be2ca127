//! Server state owned by the main loop.

use bblang_core::{CompilationCache, Compiler, FileUri};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::runtime::Handle;

use crate::client::Client;
use crate::compile::{compile_document, CompileContext};
use crate::documents::DocumentStore;
use crate::scheduler::{BoxFuture, CompilationScheduler, CompileFn};
use crate::server::ServerOptions;

/// Documents, schedulers and the handles compiles need.
#[derive(Debug)]
pub struct World {
    context: CompileContext,
    schedulers: HashMap<FileUri, CompilationScheduler>,
    runtime: Handle,
    options: ServerOptions,
}

impl World {
    /// Create an empty world. Schedulers are spawned on `runtime`.
    pub fn new(
        compiler: Arc<dyn Compiler>,
        client: Client,
        runtime: Handle,
        options: ServerOptions,
    ) -> Self {
        Self {
            context: CompileContext {
                documents: Arc::new(RwLock::new(DocumentStore::new())),
                cache: Arc::new(CompilationCache::new()),
                compiler,
                client,
                client_settings: Arc::new(RwLock::new(serde_json::Value::Null)),
            },
            schedulers: HashMap::new(),
            runtime,
            options,
        }
    }

    /// The document store.
    pub const fn documents(&self) -> &Arc<RwLock<DocumentStore>> {
        &self.context.documents
    }

    /// Outgoing messages.
    pub const fn client(&self) -> &Client {
        &self.context.client
    }

    /// The compilation cache.
    pub const fn cache(&self) -> &Arc<CompilationCache> {
        &self.context.cache
    }

    /// The runtime requests and schedulers run on.
    pub const fn runtime(&self) -> &Handle {
        &self.runtime
    }

    /// Replace the client settings used by the next compiles.
    pub fn set_client_settings(&self, settings: serde_json::Value) {
        *self.context.client_settings.write() = settings;
    }

    /// The scheduler for `uri`, spawning it on first use.
    pub fn scheduler(&mut self, uri: &FileUri) -> &CompilationScheduler {
        let context = &self.context;
        let runtime = &self.runtime;
        let options = self.options;
        self.schedulers.entry(uri.clone()).or_insert_with(|| {
            let context = context.clone();
            let uri = uri.clone();
            let compile: CompileFn = Arc::new(move || -> BoxFuture<Option<i32>> {
                Box::pin(compile_document(context.clone(), uri.clone()))
            });
            CompilationScheduler::spawn(runtime, options.debounce, options.queue_capacity, compile)
        })
    }

    /// Ask for the current version of `uri` to be compiled.
    pub fn request_compile(&mut self, uri: &FileUri) {
        let version = self.version_of(uri);
        self.scheduler(uri).request(version);
    }

    /// The scheduler of `uri` and the version a request should wait for.
    /// `None` when the document is not open.
    pub fn compilation_waiter(&mut self, uri: &FileUri) -> Option<(CompilationScheduler, i32)> {
        if self.context.documents.read().try_get(uri).is_none() {
            return None;
        }
        let version = self.version_of(uri);
        Some((self.scheduler(uri).clone(), version))
    }

    /// Forget `uri`: drop the document, stop its scheduler and clear its
    /// diagnostics.
    pub fn close(&mut self, uri: &FileUri) {
        self.context.documents.write().remove(uri);
        self.stop(uri);
        self.context.client.publish_diagnostics(uri, Vec::new(), None);
    }

    /// Stop the scheduler of `uri` without touching the store.
    pub fn stop(&mut self, uri: &FileUri) {
        if let Some(scheduler) = self.schedulers.remove(uri) {
            scheduler.cancel();
        }
    }

    /// Stop every scheduler.
    pub fn shutdown(&mut self) {
        for (_, scheduler) in self.schedulers.drain() {
            scheduler.cancel();
        }
    }

    /// Number of live schedulers.
    pub fn scheduler_count(&self) -> usize {
        self.schedulers.len()
    }

    fn version_of(&self, uri: &FileUri) -> i32 {
        self.context
            .documents
            .read()
            .try_get(uri)
            .and_then(|document| document.version())
            .unwrap_or(0)
    }
}
