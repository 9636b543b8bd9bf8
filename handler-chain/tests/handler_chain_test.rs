//! Integration tests for [`handler_chain::HandlerChain`].
//!
//! Covers: before/after order, a before stopping the chain, Stop from handle skipping later
//! handlers, and errors propagating to the caller.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use handler_chain::HandlerChain;
use relay_core::{
    CanonicalId, ClassifiedMessage, Handler, HandlerResponse, MessageDirection,
    ParticipantAddress, RelayError, RelayMessage,
};

fn create_test_message(text: &str) -> RelayMessage {
    RelayMessage {
        message: ClassifiedMessage {
            id: "test_message_id".to_string(),
            sender_address: ParticipantAddress::direct("919800000001"),
            sender_phone: CanonicalId::from("919800000001"),
            receiver_phone: CanonicalId::from("919811111111"),
            partner: CanonicalId::from("919800000001"),
            partner_name: "Asha".to_string(),
            display_name: "Asha".to_string(),
            author: "Asha".to_string(),
            text: text.to_string(),
            direction: MessageDirection::Incoming,
            received_at: Utc::now(),
        },
        history: vec![format!("[10:00:00] Asha (919800000001): {}", text)],
    }
}

/// **Test: before, handle and after each run once per handler.**
#[tokio::test]
async fn test_handler_chain_runs_all_phases() {
    let counts = Arc::new(PhaseCounts::default());
    let chain = HandlerChain::new().add_handler(Arc::new(CountingHandler(counts.clone())));

    let result = chain.handle(&create_test_message("2 pizzas")).await.unwrap();

    assert_eq!(result, HandlerResponse::Continue);
    assert_eq!(counts.before.load(Ordering::SeqCst), 1);
    assert_eq!(counts.handle.load(Ordering::SeqCst), 1);
    assert_eq!(counts.after.load(Ordering::SeqCst), 1);
}

/// **Test: a before returning false stops the chain; no handle runs.**
#[tokio::test]
async fn test_before_false_stops_chain() {
    struct BlockingHandler;

    #[async_trait::async_trait]
    impl Handler for BlockingHandler {
        async fn before(&self, _message: &RelayMessage) -> relay_core::Result<bool> {
            Ok(false)
        }
    }

    let counts = Arc::new(PhaseCounts::default());
    let chain = HandlerChain::new()
        .add_handler(Arc::new(BlockingHandler))
        .add_handler(Arc::new(CountingHandler(counts.clone())));

    let result = chain.handle(&create_test_message("hi")).await.unwrap();

    assert_eq!(result, HandlerResponse::Stop);
    assert_eq!(counts.handle.load(Ordering::SeqCst), 0);
}

/// **Test: Stop from handle skips later handlers' handle but every after still runs.**
#[tokio::test]
async fn test_stop_from_handle_skips_rest() {
    struct StopHandler;

    #[async_trait::async_trait]
    impl Handler for StopHandler {
        async fn handle(&self, _message: &RelayMessage) -> relay_core::Result<HandlerResponse> {
            Ok(HandlerResponse::Stop)
        }
    }

    let counts = Arc::new(PhaseCounts::default());
    let chain = HandlerChain::new()
        .add_handler(Arc::new(StopHandler))
        .add_handler(Arc::new(CountingHandler(counts.clone())));

    let result = chain.handle(&create_test_message("hi")).await.unwrap();

    assert_eq!(result, HandlerResponse::Stop);
    assert_eq!(counts.handle.load(Ordering::SeqCst), 0);
    assert_eq!(counts.after.load(Ordering::SeqCst), 1);
}

/// **Test: before runs first→last, after runs last→first.**
#[tokio::test]
async fn test_multiple_handlers_executed_in_order() {
    let order = Arc::new(Mutex::new(Vec::new()));

    struct OrderHandler {
        name: &'static str,
        order: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait::async_trait]
    impl Handler for OrderHandler {
        async fn before(&self, _message: &RelayMessage) -> relay_core::Result<bool> {
            self.order.lock().unwrap().push(format!("before_{}", self.name));
            Ok(true)
        }

        async fn handle(&self, _message: &RelayMessage) -> relay_core::Result<HandlerResponse> {
            self.order.lock().unwrap().push(format!("handle_{}", self.name));
            Ok(HandlerResponse::Ignore)
        }

        async fn after(
            &self,
            _message: &RelayMessage,
            _response: &HandlerResponse,
        ) -> relay_core::Result<()> {
            self.order.lock().unwrap().push(format!("after_{}", self.name));
            Ok(())
        }
    }

    let chain = HandlerChain::new()
        .add_handler(Arc::new(OrderHandler {
            name: "first",
            order: order.clone(),
        }))
        .add_handler(Arc::new(OrderHandler {
            name: "second",
            order: order.clone(),
        }));

    chain.handle(&create_test_message("hi")).await.unwrap();

    let executed = order.lock().unwrap();
    assert_eq!(
        *executed,
        vec![
            "before_first",
            "before_second",
            "handle_first",
            "handle_second",
            "after_second",
            "after_first"
        ]
    );
}

/// **Test: a handler error is returned to the caller.**
#[tokio::test]
async fn test_handler_error_propagates() {
    struct FailingHandler;

    #[async_trait::async_trait]
    impl Handler for FailingHandler {
        async fn handle(&self, _message: &RelayMessage) -> relay_core::Result<HandlerResponse> {
            Err(RelayError::Notify("boom".to_string()))
        }
    }

    let chain = HandlerChain::new().add_handler(Arc::new(FailingHandler));
    let result = chain.handle(&create_test_message("hi")).await;

    assert!(matches!(
        result,
        Err(RelayError::Notify(ref reason)) if reason == "boom"
    ));
}

// --- Helpers used by tests ---

#[derive(Default)]
struct PhaseCounts {
    before: AtomicUsize,
    handle: AtomicUsize,
    after: AtomicUsize,
}

struct CountingHandler(Arc<PhaseCounts>);

#[async_trait::async_trait]
impl Handler for CountingHandler {
    async fn before(&self, _message: &RelayMessage) -> relay_core::Result<bool> {
        self.0.before.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn handle(&self, _message: &RelayMessage) -> relay_core::Result<HandlerResponse> {
        self.0.handle.fetch_add(1, Ordering::SeqCst);
        Ok(HandlerResponse::Continue)
    }

    async fn after(
        &self,
        _message: &RelayMessage,
        _response: &HandlerResponse,
    ) -> relay_core::Result<()> {
        self.0.after.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
