//! Invocation dispatcher
//!
//! TigerStyle: Resolve, hydrate, activate once, dispatch, commit. In that
//! order, sequentially, under the identity's dispatch slot.
//!
//! The commit is best-effort, not two-phase: when the durable commit fails
//! after the method body ran, in-memory side effects and the activation
//! transition stand, and the caller sees a 500 meaning "method executed,
//! durability unconfirmed", never "nothing happened".

use crate::registry::ActorRegistry;
use crate::tracker::ActivationTracker;
use selkie_core::{
    ActorKey, CallKind, Error, InvocationDescriptor, InvocationResponse, Result,
};
use selkie_state::StateEngine;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Turns inbound invocation descriptors into lifecycle-managed actor calls
pub struct Dispatcher {
    registry: Arc<ActorRegistry>,
    engine: Arc<StateEngine>,
    tracker: ActivationTracker,
}

impl Dispatcher {
    pub fn new(registry: Arc<ActorRegistry>, engine: Arc<StateEngine>) -> Self {
        Self {
            registry,
            engine,
            tracker: ActivationTracker::new(),
        }
    }

    /// Dispatch one invocation and map failures to response codes
    ///
    /// Unknown actor types produce a 404 with no body; every other failure
    /// produces a 500 whose body carries the message in an `error` field.
    #[instrument(
        skip(self, descriptor),
        fields(
            actor_type = %descriptor.actor_type,
            actor_id = %descriptor.actor_id,
            call = ?descriptor.call,
        ),
        level = "info"
    )]
    pub async fn dispatch(&self, descriptor: &InvocationDescriptor) -> InvocationResponse {
        match self.try_dispatch(descriptor).await {
            Ok(response) => response,
            Err(e) if e.is_not_found() => {
                warn!(actor_type = %descriptor.actor_type, "unknown actor type");
                InvocationResponse::not_found()
            }
            Err(e) => {
                error!(error = %e, "dispatch failed");
                InvocationResponse::error(e.to_string())
            }
        }
    }

    async fn try_dispatch(&self, descriptor: &InvocationDescriptor) -> Result<InvocationResponse> {
        let binding = self
            .registry
            .resolve(&descriptor.actor_type)
            .ok_or_else(|| Error::actor_type_not_found(&descriptor.actor_type))?;
        let key = ActorKey::new(&descriptor.actor_type, &descriptor.actor_id)?;

        // Turn-based execution: at most one in-flight call per identity.
        let slot = self.tracker.slot(&key);
        let mut activated = slot.lock().await;

        // Hydrate declared state and construct the actor bound to it.
        let mut instance = binding.activate(&key, &self.engine).await?;

        // At most once per activation epoch; a failed hook leaves the
        // identity not-activated so the next dispatch retries.
        if !*activated {
            instance
                .actor
                .on_activation()
                .await
                .map_err(|e| Error::activation_failed(key.qualified_name(), e.to_string()))?;
            *activated = true;
            info!(actor = %key, "actor activated");
        }

        let mut body = None;
        match descriptor.call {
            CallKind::Method => {
                let method = descriptor.method_name.as_deref().unwrap_or_default();
                match method {
                    "remind" => {
                        let reminder = descriptor.reminder_name.as_deref().ok_or_else(|| {
                            Error::invocation_failed(
                                key.qualified_name(),
                                "remind",
                                "missing reminder name",
                            )
                        })?;
                        let data = reminder_data(descriptor.body.as_ref());
                        instance.actor.remind(reminder, data).await?;
                    }
                    "timer" => {
                        let (callback, args) = timer_payload(&key, descriptor.body.as_ref())?;
                        instance.actor.invoke(&callback, args).await?;
                    }
                    _ => {
                        let args = descriptor.body.clone().unwrap_or(Value::Null);
                        body = Some(instance.actor.invoke(method, args).await?);
                    }
                }
            }
            CallKind::Delete => {
                instance.actor.on_deactivation().await?;
                *activated = false;
                info!(actor = %key, "actor deactivated");
            }
        }

        // Durable commit. In-memory effects above are not rolled back on
        // failure; the error propagates with the method already applied.
        if let Some(durable) = &instance.durable {
            durable.commit(&self.engine).await?;
        }

        Ok(match body {
            Some(value) => InvocationResponse::ok(value),
            None => InvocationResponse::accepted(),
        })
    }

    /// Whether an identity is currently activated (test and probe hook)
    pub async fn is_activated(&self, key: &ActorKey) -> bool {
        self.tracker.is_activated(key).await
    }
}

/// Decode a reminder body's `data` field
///
/// The payload may itself be a JSON-encoded string; a string that parses
/// as JSON is decoded to its inner value, anything else passes through.
fn reminder_data(body: Option<&Value>) -> Value {
    let data = body
        .and_then(|b| b.get("data"))
        .cloned()
        .unwrap_or(Value::Null);
    match data {
        Value::String(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        other => other,
    }
}

/// Decode a timer body into its callback name and argument list
fn timer_payload(key: &ActorKey, body: Option<&Value>) -> Result<(String, Value)> {
    let body = body.ok_or_else(|| {
        Error::invocation_failed(key.qualified_name(), "timer", "missing timer payload")
    })?;
    let callback = body
        .get("callback")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            Error::invocation_failed(key.qualified_name(), "timer", "missing callback name")
        })?;
    let args = body
        .get("data")
        .cloned()
        .unwrap_or_else(|| Value::Array(Vec::new()));
    Ok((callback.to_string(), args))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::VirtualActor;
    use async_trait::async_trait;
    use selkie_state::{
        ConsistencyPolicy, MemoryStateBackend, StateBackend, StateCell, StateSchema, WriteEntry,
    };
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Records lifecycle hooks and deliveries for assertions
    #[derive(Default)]
    struct Hooks {
        activations: AtomicUsize,
        deactivations: AtomicUsize,
        reminders: Mutex<Vec<(String, Value)>>,
        invokes: Mutex<Vec<(String, Value)>>,
    }

    struct Probe {
        hooks: Arc<Hooks>,
    }

    #[async_trait]
    impl VirtualActor for Probe {
        async fn on_activation(&mut self) -> Result<()> {
            self.hooks.activations.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn on_deactivation(&mut self) -> Result<()> {
            self.hooks.deactivations.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn remind(&mut self, reminder: &str, data: Value) -> Result<()> {
            self.hooks
                .reminders
                .lock()
                .unwrap()
                .push((reminder.to_string(), data));
            Ok(())
        }

        async fn invoke(&mut self, method: &str, args: Value) -> Result<Value> {
            self.hooks
                .invokes
                .lock()
                .unwrap()
                .push((method.to_string(), args.clone()));
            match method {
                "fail" => Err(Error::invocation_failed("Probe", method, "boom")),
                _ => Ok(json!({ "echo": method })),
            }
        }
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    struct CounterState {
        count: i64,
    }

    impl StateSchema for CounterState {
        const STORE: &'static str = "statestore";

        fn fields() -> &'static [&'static str] {
            &["count"]
        }

        fn policy() -> ConsistencyPolicy {
            ConsistencyPolicy::eventual_first_write()
        }
    }

    struct Counter {
        key: ActorKey,
        state: StateCell<CounterState>,
        backend: Arc<MemoryStateBackend>,
    }

    #[async_trait]
    impl VirtualActor for Counter {
        async fn remind(&mut self, _reminder: &str, _data: Value) -> Result<()> {
            Ok(())
        }

        async fn invoke(&mut self, method: &str, _args: Value) -> Result<Value> {
            match method {
                "increment" => {
                    let count = self.state.with_mut(|s| {
                        s.count += 1;
                        s.count
                    })
                    .await;
                    Ok(json!(count))
                }
                "increment_raced" => {
                    let count = self.state.with_mut(|s| {
                        s.count += 1;
                        s.count
                    })
                    .await;
                    // A concurrent writer advances the same field between
                    // our load and our commit.
                    let field_key = format!("{}count", self.key.state_prefix());
                    self.backend
                        .save_bulk(
                            CounterState::STORE,
                            vec![WriteEntry::unconditional(field_key, json!(100))],
                        )
                        .await?;
                    Ok(json!(count))
                }
                "get" => {
                    let count = self.state.with(|s| s.count).await;
                    Ok(json!(count))
                }
                other => Err(Error::UnknownMethod {
                    method: other.to_string(),
                }),
            }
        }
    }

    fn probe_dispatcher(hooks: Arc<Hooks>) -> Dispatcher {
        let mut registry = ActorRegistry::new();
        registry.register("Probe", move |_key| Probe {
            hooks: hooks.clone(),
        });
        let engine = Arc::new(StateEngine::new(Arc::new(MemoryStateBackend::new())));
        Dispatcher::new(Arc::new(registry), engine)
    }

    fn counter_dispatcher() -> (Dispatcher, Arc<MemoryStateBackend>) {
        let backend = Arc::new(MemoryStateBackend::new());
        let mut registry = ActorRegistry::new();
        let factory_backend = backend.clone();
        registry.register_stateful("Counter", move |key, state| Counter {
            key,
            state,
            backend: factory_backend.clone(),
        });
        let engine = Arc::new(StateEngine::new(backend.clone()));
        (Dispatcher::new(Arc::new(registry), engine), backend)
    }

    #[tokio::test]
    async fn test_unregistered_type_is_404_without_body() {
        let dispatcher = probe_dispatcher(Arc::new(Hooks::default()));
        let descriptor = InvocationDescriptor::method("Ghost", "g-1", "anything", None);

        let response = dispatcher.dispatch(&descriptor).await;
        assert_eq!(response.code, 404);
        assert!(response.body.is_none());
    }

    #[tokio::test]
    async fn test_activation_runs_at_most_once() {
        let hooks = Arc::new(Hooks::default());
        let dispatcher = probe_dispatcher(hooks.clone());

        for _ in 0..3 {
            let descriptor = InvocationDescriptor::method("Probe", "p-1", "ping", None);
            let response = dispatcher.dispatch(&descriptor).await;
            assert_eq!(response.code, 200);
        }

        assert_eq!(hooks.activations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_delete_deactivates_and_next_dispatch_reactivates() {
        let hooks = Arc::new(Hooks::default());
        let dispatcher = probe_dispatcher(hooks.clone());
        let key = ActorKey::new("Probe", "p-1").unwrap();

        let ping = InvocationDescriptor::method("Probe", "p-1", "ping", None);
        dispatcher.dispatch(&ping).await;
        assert!(dispatcher.is_activated(&key).await);

        let response = dispatcher
            .dispatch(&InvocationDescriptor::delete("Probe", "p-1"))
            .await;
        assert_eq!(response.code, 200);
        assert!(response.body.is_none());
        assert_eq!(hooks.deactivations.load(Ordering::SeqCst), 1);
        assert!(!dispatcher.is_activated(&key).await);

        dispatcher.dispatch(&ping).await;
        assert_eq!(hooks.activations.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_delete_on_cold_identity_activates_first() {
        let hooks = Arc::new(Hooks::default());
        let dispatcher = probe_dispatcher(hooks.clone());

        dispatcher
            .dispatch(&InvocationDescriptor::delete("Probe", "cold"))
            .await;

        assert_eq!(hooks.activations.load(Ordering::SeqCst), 1);
        assert_eq!(hooks.deactivations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_remind_decodes_data_and_skips_method_path() {
        let hooks = Arc::new(Hooks::default());
        let dispatcher = probe_dispatcher(hooks.clone());

        let descriptor = InvocationDescriptor::reminder(
            "Probe",
            "p-1",
            "tick",
            Some(json!({ "data": "{\"n\": 5}" })),
        );
        let response = dispatcher.dispatch(&descriptor).await;

        assert_eq!(response.code, 200);
        assert!(response.body.is_none());

        let reminders = hooks.reminders.lock().unwrap();
        assert_eq!(*reminders, vec![("tick".to_string(), json!({ "n": 5 }))]);
        assert!(hooks.invokes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_timer_invokes_named_callback() {
        let hooks = Arc::new(Hooks::default());
        let dispatcher = probe_dispatcher(hooks.clone());

        let descriptor = InvocationDescriptor::method(
            "Probe",
            "p-1",
            "timer",
            Some(json!({ "callback": "tick", "data": [1, 2] })),
        );
        let response = dispatcher.dispatch(&descriptor).await;

        assert_eq!(response.code, 200);
        assert!(response.body.is_none());

        let invokes = hooks.invokes.lock().unwrap();
        assert_eq!(*invokes, vec![("tick".to_string(), json!([1, 2]))]);
    }

    #[tokio::test]
    async fn test_method_result_becomes_response_body() {
        let dispatcher = probe_dispatcher(Arc::new(Hooks::default()));

        let descriptor = InvocationDescriptor::method("Probe", "p-1", "ping", None);
        let response = dispatcher.dispatch(&descriptor).await;

        assert_eq!(response.code, 200);
        assert_eq!(response.body, Some(json!({ "echo": "ping" })));
    }

    #[tokio::test]
    async fn test_method_failure_is_500_with_error_body() {
        let dispatcher = probe_dispatcher(Arc::new(Hooks::default()));

        let descriptor = InvocationDescriptor::method("Probe", "p-1", "fail", None);
        let response = dispatcher.dispatch(&descriptor).await;

        assert_eq!(response.code, 500);
        let body = response.body.unwrap();
        assert!(body["error"].as_str().unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn test_counter_commits_and_reloads_across_dispatches() {
        let (dispatcher, backend) = counter_dispatcher();

        let increment = InvocationDescriptor::method("Counter", "c-1", "increment", None);

        // First dispatch: no etag yet, unconditional commit
        let response = dispatcher.dispatch(&increment).await;
        assert_eq!(response.code, 200);
        assert_eq!(response.body, Some(json!(1)));
        assert_eq!(
            backend
                .current_etag("statestore", "Counter||c-1||count")
                .await
                .as_deref(),
            Some("1")
        );

        // Second dispatch: loads count=1 with etag "1", commits on it
        let response = dispatcher.dispatch(&increment).await;
        assert_eq!(response.body, Some(json!(2)));
        assert_eq!(
            backend
                .current_etag("statestore", "Counter||c-1||count")
                .await
                .as_deref(),
            Some("2")
        );
    }

    #[tokio::test]
    async fn test_counter_conflict_surfaces_commit_failure() {
        let (dispatcher, backend) = counter_dispatcher();

        let increment = InvocationDescriptor::method("Counter", "c-1", "increment", None);
        dispatcher.dispatch(&increment).await;

        // The raced increment loses to a writer that advances the field
        // between its load and its commit.
        let raced = InvocationDescriptor::method("Counter", "c-1", "increment_raced", None);
        let response = dispatcher.dispatch(&raced).await;

        assert_eq!(response.code, 500);
        let body = response.body.unwrap();
        assert!(body["error"].as_str().unwrap().contains("etag mismatch"));

        // The concurrent writer's value stands
        let get = InvocationDescriptor::method("Counter", "c-1", "get", None);
        let response = dispatcher.dispatch(&get).await;
        assert_eq!(response.body, Some(json!(100)));
    }
}
