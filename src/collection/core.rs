use std::fmt;
use std::sync::Arc;

use crate::adapter::Adapter;
use crate::transform::{Identity, Transform};

/// Binds a collection name to an adapter and a value transform. Holds no
/// records itself; every call goes through the adapter.
#[derive(Clone)]
pub struct Collection {
    name: String,
    pub(crate) adapter: Arc<dyn Adapter>,
    pub(crate) transform: Arc<dyn Transform>,
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection").field("name", &self.name).field("transform", &self.transform).finish()
    }
}

impl Collection {
    pub fn new(name: &str, adapter: Arc<dyn Adapter>) -> Self {
        Self::with_transform(name, adapter, Arc::new(Identity))
    }

    pub fn with_transform(name: &str, adapter: Arc<dyn Adapter>, transform: Arc<dyn Transform>) -> Self {
        Self { name: name.to_string(), adapter, transform }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn adapter(&self) -> &Arc<dyn Adapter> {
        &self.adapter
    }
}
