use std::cell::RefCell;
use std::rc::Rc;

use crate::backend::ChatBackend;
use crate::controller::{CommandOutcome, IgnoreReason};
use crate::conversation::{Message, CONNECT_ERROR_MARKER};
use crate::gate::{Operation, RequestGate};

/// Single-turn chat against `POST /ask`.
///
/// Keeps a local log with the same rules as the full controller: the question
/// is shown immediately, failures become an inline error entry, and only one
/// question may be outstanding. There is no conversation identity and no
/// authentication.
pub struct QuickAsk {
    backend: Rc<dyn ChatBackend>,
    log: RefCell<Vec<Message>>,
    gate: RequestGate,
}

impl QuickAsk {
    pub fn new(backend: Rc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            log: RefCell::new(Vec::new()),
            gate: RequestGate::new(),
        }
    }

    pub fn messages(&self) -> Vec<Message> {
        self.log.borrow().clone()
    }

    pub fn is_waiting(&self) -> bool {
        self.gate.is_busy()
    }

    pub async fn ask(&self, text: &str) -> CommandOutcome {
        let text = text.trim();
        if text.is_empty() {
            return CommandOutcome::Ignored(IgnoreReason::EmptyInput);
        }
        let result = {
            let Some(_guard) = self.gate.try_acquire(Operation::Send) else {
                return CommandOutcome::Ignored(IgnoreReason::Busy);
            };
            self.log.borrow_mut().push(Message::user(text));
            self.backend.ask(text).await
        };

        match result {
            Ok(answer) => {
                self.log.borrow_mut().push(Message::assistant(answer));
                CommandOutcome::Completed
            }
            Err(e) => {
                log::warn!("Ask failed: {}", e);
                self.log.borrow_mut().push(Message::error(CONNECT_ERROR_MARKER));
                CommandOutcome::Failed(e.to_string())
            }
        }
    }
}
