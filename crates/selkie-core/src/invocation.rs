//! Inbound invocation descriptors
//!
//! A normalized view of one request from the sidecar: which actor, which
//! kind of call, and the decoded payload. Built once per request by the
//! HTTP layer and immutable afterwards.

use serde_json::Value;

/// The kind of call carried by an invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// A method, reminder, or timer call (`PUT .../method/{name}`)
    Method,
    /// An explicit deactivation (`DELETE /actors/{type}/{id}`)
    Delete,
}

/// Normalized view of an inbound actor invocation
#[derive(Debug, Clone)]
pub struct InvocationDescriptor {
    /// Public actor type name from the request path
    pub actor_type: String,
    /// Actor instance id from the request path
    pub actor_id: String,
    /// Call kind derived from the HTTP method
    pub call: CallKind,
    /// Method name segment (absent for `Delete`)
    pub method_name: Option<String>,
    /// Reminder name segment, when present
    pub reminder_name: Option<String>,
    /// Decoded request body, when present
    pub body: Option<Value>,
}

impl InvocationDescriptor {
    /// Descriptor for a plain method call
    pub fn method(
        actor_type: impl Into<String>,
        actor_id: impl Into<String>,
        method_name: impl Into<String>,
        body: Option<Value>,
    ) -> Self {
        Self {
            actor_type: actor_type.into(),
            actor_id: actor_id.into(),
            call: CallKind::Method,
            method_name: Some(method_name.into()),
            reminder_name: None,
            body,
        }
    }

    /// Descriptor for a reminder delivery (`method/remind/{reminder}`)
    pub fn reminder(
        actor_type: impl Into<String>,
        actor_id: impl Into<String>,
        reminder_name: impl Into<String>,
        body: Option<Value>,
    ) -> Self {
        Self {
            actor_type: actor_type.into(),
            actor_id: actor_id.into(),
            call: CallKind::Method,
            method_name: Some("remind".into()),
            reminder_name: Some(reminder_name.into()),
            body,
        }
    }

    /// Descriptor for an explicit deactivation
    pub fn delete(actor_type: impl Into<String>, actor_id: impl Into<String>) -> Self {
        Self {
            actor_type: actor_type.into(),
            actor_id: actor_id.into(),
            call: CallKind::Delete,
            method_name: None,
            reminder_name: None,
            body: None,
        }
    }
}

/// Outcome of one dispatch, ready to be written back to the sidecar
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationResponse {
    /// HTTP status code
    pub code: u16,
    /// JSON response body, when the call kind produces one
    pub body: Option<Value>,
}

impl InvocationResponse {
    /// Successful dispatch with a response body
    pub fn ok(body: Value) -> Self {
        Self {
            code: 200,
            body: Some(body),
        }
    }

    /// Successful dispatch with no body (reminders, timers, deactivation)
    pub fn accepted() -> Self {
        Self {
            code: 200,
            body: None,
        }
    }

    /// Unknown or non-actor target type
    pub fn not_found() -> Self {
        Self {
            code: 404,
            body: None,
        }
    }

    /// Failed dispatch; the message is carried in an `error` field
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            code: 500,
            body: Some(serde_json::json!({ "error": message.into() })),
        }
    }
}
