//! Actor type bindings
//!
//! Maps public actor-type names to concrete implementations. Registered
//! once before the host starts serving; read-only thereafter.
//!
//! A stateful binding hydrates the actor's declared state BEFORE the actor
//! is constructed and injects the loaded cell; the same cell is committed
//! after the call. The state shape (store, fields, policy) travels with
//! the schema type, so a state-bearing actor without a schema cannot be
//! registered at all.

use crate::actor::VirtualActor;
use async_trait::async_trait;
use selkie_core::{ActorKey, Result, BULK_READ_PARALLELISM_DEFAULT};
use selkie_state::{Metadata, StateCell, StateEngine, StateHandle, StateSchema};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

/// A constructed actor together with its pending durable-state commit
pub struct ActiveInstance {
    pub(crate) actor: Box<dyn VirtualActor>,
    pub(crate) durable: Option<Box<dyn DurableState>>,
}

/// Commit half of a hydrated state cell
#[async_trait]
pub(crate) trait DurableState: Send + Sync {
    async fn commit(&self, engine: &StateEngine) -> Result<()>;
}

struct CellCommitter<S: StateSchema> {
    cell: StateCell<S>,
}

#[async_trait]
impl<S: StateSchema> DurableState for CellCommitter<S> {
    async fn commit(&self, engine: &StateEngine) -> Result<()> {
        let handle = self.cell.lock().await;
        engine.save_object(&handle, None).await
    }
}

/// Constructs an actor instance for one dispatch
#[async_trait]
pub trait ActorFactory: Send + Sync {
    /// Hydrate declared state (if any) and construct the actor
    async fn activate(&self, key: &ActorKey, engine: &StateEngine) -> Result<ActiveInstance>;
}

struct StatelessFactory<F> {
    make: F,
}

#[async_trait]
impl<A, F> ActorFactory for StatelessFactory<F>
where
    A: VirtualActor + 'static,
    F: Fn(ActorKey) -> A + Send + Sync,
{
    async fn activate(&self, key: &ActorKey, _engine: &StateEngine) -> Result<ActiveInstance> {
        Ok(ActiveInstance {
            actor: Box::new((self.make)(key.clone())),
            durable: None,
        })
    }
}

struct StatefulFactory<F, S> {
    make: F,
    parallelism: u32,
    _schema: PhantomData<fn() -> S>,
}

#[async_trait]
impl<A, S, F> ActorFactory for StatefulFactory<F, S>
where
    A: VirtualActor + 'static,
    S: StateSchema,
    F: Fn(ActorKey, StateCell<S>) -> A + Send + Sync,
{
    async fn activate(&self, key: &ActorKey, engine: &StateEngine) -> Result<ActiveInstance> {
        let handle: StateHandle<S> = engine
            .load_object(&key.state_prefix(), self.parallelism, &Metadata::new())
            .await?;
        let cell = StateCell::new(handle);
        let actor = (self.make)(key.clone(), cell.clone());

        Ok(ActiveInstance {
            actor: Box::new(actor),
            durable: Some(Box::new(CellCommitter { cell })),
        })
    }
}

/// One registered actor type
pub struct ActorTypeBinding {
    actor_type: String,
    factory: Arc<dyn ActorFactory>,
}

impl ActorTypeBinding {
    /// The public actor type name
    pub fn actor_type(&self) -> &str {
        &self.actor_type
    }

    pub(crate) async fn activate(
        &self,
        key: &ActorKey,
        engine: &StateEngine,
    ) -> Result<ActiveInstance> {
        self.factory.activate(key, engine).await
    }
}

/// Process-wide actor type registry
#[derive(Default)]
pub struct ActorRegistry {
    bindings: HashMap<String, ActorTypeBinding>,
    entities: Vec<String>,
}

impl ActorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an actor type with no declared state
    pub fn register<A, F>(&mut self, actor_type: impl Into<String>, make: F)
    where
        A: VirtualActor + 'static,
        F: Fn(ActorKey) -> A + Send + Sync + 'static,
    {
        self.bind(actor_type.into(), Arc::new(StatelessFactory { make }));
    }

    /// Register a state-bearing actor type
    ///
    /// The constructor receives the hydrated state cell; the runtime
    /// commits the same cell after each dispatch.
    pub fn register_stateful<A, S, F>(&mut self, actor_type: impl Into<String>, make: F)
    where
        A: VirtualActor + 'static,
        S: StateSchema,
        F: Fn(ActorKey, StateCell<S>) -> A + Send + Sync + 'static,
    {
        self.bind(
            actor_type.into(),
            Arc::new(StatefulFactory {
                make,
                parallelism: BULK_READ_PARALLELISM_DEFAULT,
                _schema: PhantomData,
            }),
        );
    }

    fn bind(&mut self, actor_type: String, factory: Arc<dyn ActorFactory>) {
        let binding = ActorTypeBinding {
            actor_type: actor_type.clone(),
            factory,
        };
        if self.bindings.insert(actor_type.clone(), binding).is_none() {
            self.entities.push(actor_type);
        }
    }

    /// Look up the binding for an actor type name
    pub fn resolve(&self, actor_type: &str) -> Option<&ActorTypeBinding> {
        self.bindings.get(actor_type)
    }

    /// Registered type names, in registration order
    pub fn entities(&self) -> &[String] {
        &self.entities
    }
}
