use chatdesk_types::Credential;
use std::cell::RefCell;

/// Where a credential lives between page loads or process runs.
///
/// Implementations may fail; the [`TokenStore`] logs and swallows those
/// failures so the in-memory credential stays authoritative for the session.
pub trait CredentialPersistence {
    fn load(&self) -> anyhow::Result<Option<Credential>>;
    fn save(&self, credential: &Credential) -> anyhow::Result<()>;
    fn remove(&self) -> anyhow::Result<()>;
}

/// Persistence that forgets everything when the store is dropped
#[derive(Debug, Default)]
pub struct MemoryPersistence;

impl CredentialPersistence for MemoryPersistence {
    fn load(&self) -> anyhow::Result<Option<Credential>> {
        Ok(None)
    }

    fn save(&self, _credential: &Credential) -> anyhow::Result<()> {
        Ok(())
    }

    fn remove(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Holder of the session credential.
///
/// Only the controller's authentication transitions call [`set`](Self::set)
/// and [`clear`](Self::clear); everything else reads.
pub struct TokenStore {
    current: RefCell<Option<Credential>>,
    persistence: Box<dyn CredentialPersistence>,
}

impl TokenStore {
    /// Empty store with no persistence
    pub fn in_memory() -> Self {
        Self {
            current: RefCell::new(None),
            persistence: Box::new(MemoryPersistence),
        }
    }

    /// Store seeded from whatever `persistence` kept from an earlier session
    pub fn restore(persistence: Box<dyn CredentialPersistence>) -> Self {
        let current = match persistence.load() {
            Ok(credential) => credential,
            Err(e) => {
                log::warn!("Failed to load saved credential: {:#}", e);
                None
            }
        };
        if current.is_some() {
            log::debug!("Restored saved credential");
        }
        Self {
            current: RefCell::new(current),
            persistence,
        }
    }

    pub fn get(&self) -> Option<Credential> {
        self.current.borrow().clone()
    }

    pub fn is_present(&self) -> bool {
        self.current.borrow().is_some()
    }

    pub fn set(&self, credential: Credential) {
        if let Err(e) = self.persistence.save(&credential) {
            log::warn!("Failed to persist credential: {:#}", e);
        }
        *self.current.borrow_mut() = Some(credential);
    }

    pub fn clear(&self) {
        if let Err(e) = self.persistence.remove() {
            log::warn!("Failed to remove persisted credential: {:#}", e);
        }
        self.current.borrow_mut().take();
    }
}
