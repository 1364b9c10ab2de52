//! The dispatcher: the single entry point every transport calls.
//!
//! A call moves through `Received -> Resolved -> Validated -> Invoked ->
//! Completed`, leaving early with a failure envelope from any state. Nothing
//! escapes [`Dispatcher::dispatch`] except an [`InvocationResult`]: handler
//! errors, backend errors and panics are all caught at one boundary.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::Value;
use tracing::{Instrument, debug, info_span, warn};

use super::arguments::ArgumentBag;
use super::registry::ToolRegistry;

/// Why a call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    UnknownTool,
    InvalidArguments,
    HandlerError,
    UnknownResource,
}

impl FailureKind {
    /// Category used when no tool-specific one applies.
    pub fn default_category(&self) -> &'static str {
        match self {
            Self::UnknownTool => "Tool lookup",
            Self::InvalidArguments => "Argument validation",
            Self::HandlerError => "Tool execution",
            Self::UnknownResource => "Resource read",
        }
    }
}

/// Outcome of one dispatch, produced exactly once per call.
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationResult {
    Success {
        payload: Value,
    },
    Failure {
        kind: FailureKind,
        /// Label prefixed to the message when rendered.
        category: String,
        message: String,
    },
}

impl InvocationResult {
    pub fn success(payload: Value) -> Self {
        Self::Success { payload }
    }

    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            category: kind.default_category().to_string(),
            message: message.into(),
        }
    }

    fn handler_failure(category: &str, message: impl Into<String>) -> Self {
        Self::Failure {
            kind: FailureKind::HandlerError,
            category: category.to_string(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }

    /// Text block sent back to the client.
    ///
    /// String payloads are returned verbatim, other payloads as pretty JSON.
    /// Failures read `"<category> failed: <message>"`.
    pub fn render(&self) -> String {
        match self {
            Self::Success {
                payload: Value::String(text),
            } => text.clone(),
            Self::Success { payload } => {
                serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string())
            }
            Self::Failure {
                category, message, ..
            } => format!("{} failed: {}", category, message),
        }
    }
}

/// Routes tool calls to their handlers.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Run one tool call to completion.
    pub async fn dispatch(&self, name: &str, raw_args: Option<Value>) -> InvocationResult {
        let span = info_span!("dispatch", tool = %name);
        self.dispatch_inner(name, raw_args).instrument(span).await
    }

    async fn dispatch_inner(&self, name: &str, raw_args: Option<Value>) -> InvocationResult {
        debug!("Received");

        let Some(descriptor) = self.registry.resolve(name) else {
            warn!("Unknown tool requested: {}", name);
            return InvocationResult::failure(
                FailureKind::UnknownTool,
                format!("Unknown tool: {}", name),
            );
        };
        debug!("Resolved");

        let mut args = match ArgumentBag::from_value(raw_args) {
            Ok(args) => args,
            Err(message) => {
                warn!("Rejected arguments: {}", message);
                return InvocationResult::failure(FailureKind::InvalidArguments, message);
            }
        };

        let outcome = descriptor.schema.validate(args.as_map());
        let mut missing = outcome.missing_required.clone();
        let mut hard_problems = Vec::new();
        for mismatch in &outcome.type_mismatches {
            warn!("Ignoring invalid argument: {}", mismatch);
            args.remove(&mismatch.field);
            let required = descriptor
                .schema
                .get(&mismatch.field)
                .is_some_and(|f| f.required);
            if required {
                missing.push(mismatch.field.clone());
                hard_problems.push(mismatch.to_string());
            }
        }

        if !missing.is_empty() {
            let mut message = format!("missing required argument(s): {}", missing.join(", "));
            if !hard_problems.is_empty() {
                message.push_str(&format!(" ({})", hard_problems.join("; ")));
            }
            warn!("Validation failed: {}", message);
            return InvocationResult::failure(FailureKind::InvalidArguments, message);
        }
        debug!("Validated");

        let handler = Arc::clone(&descriptor.handler);
        let call = AssertUnwindSafe(handler.call(&args)).catch_unwind();
        debug!("Invoked");

        let result = match call.await {
            Ok(Ok(payload)) => InvocationResult::success(payload),
            Ok(Err(e)) => {
                warn!("Handler failed: {}", e);
                InvocationResult::handler_failure(&descriptor.category, e.to_string())
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                warn!("Handler panicked: {}", message);
                InvocationResult::handler_failure(
                    &descriptor.category,
                    format!("handler panicked: {}", message),
                )
            }
        };
        debug!(is_error = result.is_error(), "Completed");
        result
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::error::ToolError;
    use crate::domains::tools::handlers::ToolHandler;
    use crate::domains::tools::registry::ToolDescriptor;
    use crate::domains::tools::schema::{FieldKind, FieldSpec, ToolSchema};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records its calls and echoes the argument bag.
    #[derive(Default)]
    struct Recorder {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl ToolHandler for Recorder {
        async fn call(&self, args: &ArgumentBag) -> Result<Value, ToolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Object(args.as_map().clone()))
        }
    }

    struct Panics;

    #[async_trait::async_trait]
    impl ToolHandler for Panics {
        async fn call(&self, _args: &ArgumentBag) -> Result<Value, ToolError> {
            panic!("boom");
        }
    }

    fn dispatcher_with(recorder: Arc<Recorder>) -> Dispatcher {
        let schema = ToolSchema::empty()
            .field(FieldSpec::new("a", FieldKind::Number, "").required())
            .field(FieldSpec::new("mode", FieldKind::String, "").one_of(["fast", "slow"]));

        let mut builder = ToolRegistry::builder();
        builder
            .register(ToolDescriptor::new("record", "", "Recording", schema, recorder))
            .unwrap();
        builder
            .register(ToolDescriptor::new(
                "explode",
                "",
                "Explosion",
                ToolSchema::empty(),
                Arc::new(Panics),
            ))
            .unwrap();
        Dispatcher::new(Arc::new(builder.build()))
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let recorder = Arc::new(Recorder::default());
        let dispatcher = dispatcher_with(recorder.clone());

        let result = dispatcher.dispatch("nonexistent_tool", Some(json!({}))).await;
        assert_eq!(result.failure_kind(), Some(FailureKind::UnknownTool));
        assert_eq!(result.render(), "Tool lookup failed: Unknown tool: nonexistent_tool");
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_required_blocks_handler() {
        let recorder = Arc::new(Recorder::default());
        let dispatcher = dispatcher_with(recorder.clone());

        let result = dispatcher.dispatch("record", Some(json!({}))).await;
        assert_eq!(result.failure_kind(), Some(FailureKind::InvalidArguments));
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);

        let result = dispatcher.dispatch("record", Some(json!({"a": 5}))).await;
        assert!(!result.is_error());
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_absent_arguments_are_empty_bag() {
        let recorder = Arc::new(Recorder::default());
        let dispatcher = dispatcher_with(recorder);

        let result = dispatcher.dispatch("explode", None).await;
        assert_eq!(result.failure_kind(), Some(FailureKind::HandlerError));
    }

    #[tokio::test]
    async fn test_non_object_arguments_rejected() {
        let recorder = Arc::new(Recorder::default());
        let dispatcher = dispatcher_with(recorder.clone());

        let result = dispatcher.dispatch("record", Some(json!("a=5"))).await;
        assert_eq!(result.failure_kind(), Some(FailureKind::InvalidArguments));
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_optional_value_is_dropped() {
        let recorder = Arc::new(Recorder::default());
        let dispatcher = dispatcher_with(recorder);

        let result = dispatcher
            .dispatch("record", Some(json!({"a": 1, "mode": "warp", "extra": true})))
            .await;
        match result {
            InvocationResult::Success { payload } => {
                assert_eq!(payload, json!({"a": 1, "extra": true}));
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_required_value_is_hard_failure() {
        let recorder = Arc::new(Recorder::default());
        let dispatcher = dispatcher_with(recorder.clone());

        let result = dispatcher.dispatch("record", Some(json!({"a": "5"}))).await;
        assert_eq!(result.failure_kind(), Some(FailureKind::InvalidArguments));
        assert!(result.render().contains("'a' must be of type number"));
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let recorder = Arc::new(Recorder::default());
        let dispatcher = dispatcher_with(recorder.clone());

        let result = dispatcher.dispatch("explode", Some(json!({}))).await;
        assert_eq!(result.failure_kind(), Some(FailureKind::HandlerError));
        assert_eq!(result.render(), "Explosion failed: handler panicked: boom");

        let result = dispatcher.dispatch("record", Some(json!({"a": 2}))).await;
        assert!(!result.is_error());
    }

    #[test]
    fn test_render_success() {
        assert_eq!(InvocationResult::success(json!("dlroW olleH")).render(), "dlroW olleH");
        assert_eq!(InvocationResult::success(json!(22)).render(), "22");
        assert_eq!(
            InvocationResult::success(json!({"a": 1})).render(),
            "{\n  \"a\": 1\n}"
        );
    }
}
