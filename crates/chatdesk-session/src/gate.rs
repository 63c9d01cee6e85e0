use std::cell::Cell;

/// Kind of backend request a session can have outstanding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Login,
    Send,
    Load,
    Search,
}

/// Admits at most one outstanding backend request per session.
#[derive(Debug, Default)]
pub struct RequestGate {
    busy: Cell<Option<Operation>>,
}

impl RequestGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// The operation currently holding the gate, if any
    pub fn current(&self) -> Option<Operation> {
        self.busy.get()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.get().is_some()
    }

    /// Claim the gate for `op`. Released when the guard drops.
    pub fn try_acquire(&self, op: Operation) -> Option<GateGuard<'_>> {
        if let Some(holder) = self.busy.get() {
            log::debug!("{:?} refused: {:?} already in flight", op, holder);
            return None;
        }
        self.busy.set(Some(op));
        Some(GateGuard { gate: self })
    }
}

#[must_use = "the gate is released as soon as the guard is dropped"]
pub struct GateGuard<'a> {
    gate: &'a RequestGate,
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        self.gate.busy.set(None);
    }
}
