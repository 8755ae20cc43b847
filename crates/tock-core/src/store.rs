//! Persistence contract for the alarm rule list.

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;

/// Key under which the rule list is stored.
pub const ALARMS_KEY: &str = "alarms";

/// A blob store holding the serialized rule list under [`ALARMS_KEY`].
///
/// The matcher reads once on load and writes the whole list after every
/// mutation. Write failures are logged by the caller and superseded by the
/// next successful save.
pub trait RuleStore {
    type Error: std::error::Error;

    /// Returns the stored JSON array, or `None` if nothing was saved yet.
    fn load_blob(&self) -> Result<Option<String>, Self::Error>;

    /// Replaces the stored JSON array.
    fn save_blob(&self, blob: &str) -> Result<(), Self::Error>;
}

/// In-memory store. Clones share the same blob, so a test can keep one clone
/// and inspect what the matcher saved.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blob: Rc<RefCell<Option<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Rc::new(RefCell::new(Some(blob.into()))),
        }
    }

    pub fn blob(&self) -> Option<String> {
        self.blob.borrow().clone()
    }
}

impl RuleStore for MemoryStore {
    type Error = Infallible;

    fn load_blob(&self) -> Result<Option<String>, Self::Error> {
        Ok(self.blob())
    }

    fn save_blob(&self, blob: &str) -> Result<(), Self::Error> {
        *self.blob.borrow_mut() = Some(blob.to_string());
        Ok(())
    }
}
