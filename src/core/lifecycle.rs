//! Host application lifecycle.
//!
//! [`App`] owns the store handle and a list of "before serve" hooks. [`App::start`]
//! runs the hooks once, in registration order, and hands back what they recorded.
//! Hooks see the store only through the [`ServeEvent`] they are given.

use crate::core::error::SeedError;
use crate::core::provision::{self, ProvisionReport};
use crate::core::schema::CollectionSchema;
use crate::core::store::CollectionStore;

/// Passed to every before-serve hook.
pub struct ServeEvent<'a> {
    store: &'a dyn CollectionStore,
    reports: Vec<ProvisionReport>,
}

impl<'a> ServeEvent<'a> {
    pub fn store(&self) -> &'a dyn CollectionStore {
        self.store
    }

    pub fn record(&mut self, report: ProvisionReport) {
        self.reports.push(report);
    }
}

pub type BeforeServeHook = Box<dyn Fn(&mut ServeEvent<'_>) -> Result<(), SeedError>>;

/// What the before-serve phase produced.
#[derive(Debug, Default)]
pub struct Startup {
    pub reports: Vec<ProvisionReport>,
}

impl Startup {
    pub fn warnings(&self) -> Vec<String> {
        self.reports.iter().flat_map(|r| r.warnings()).collect()
    }
}

pub struct App<S: CollectionStore> {
    store: S,
    before_serve: Vec<BeforeServeHook>,
}

impl<S: CollectionStore> App<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            before_serve: Vec::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn on_before_serve<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut ServeEvent<'_>) -> Result<(), SeedError> + 'static,
    {
        self.before_serve.push(Box::new(hook));
        self
    }

    /// Runs the before-serve hooks. A hook returning `Err` aborts startup.
    pub fn start(&self) -> Result<Startup, SeedError> {
        let mut event = ServeEvent {
            store: &self.store,
            reports: Vec::new(),
        };
        for (idx, hook) in self.before_serve.iter().enumerate() {
            hook(&mut event).inspect_err(|e| {
                tracing::error!(hook = idx, error = %e, "before-serve hook failed; aborting startup");
            })?;
        }
        tracing::debug!(hooks = self.before_serve.len(), "before-serve phase complete");
        Ok(Startup {
            reports: event.reports,
        })
    }
}

/// Registers a hook that provisions `schemas` best-effort. The hook itself never fails,
/// so provisioning problems cannot abort startup.
pub fn register_schema_provisioner<S: CollectionStore>(
    app: &mut App<S>,
    schemas: Vec<CollectionSchema>,
) {
    app.on_before_serve(move |event| {
        let report = provision::provision_all(event.store(), &schemas);
        event.record(report);
        Ok(())
    });
}
