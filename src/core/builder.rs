use std::sync::Arc;

use crate::config::GroupConfig;
use crate::core::group::Group;
use crate::subscribers::{LogWriter, Subscribe, SubscriberSet};

/// Builder for constructing a [`Group`] with custom subscribers.
pub struct GroupBuilder {
    cfg: GroupConfig,
    subscribers: Option<Vec<Arc<dyn Subscribe>>>,
}

impl GroupBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: GroupConfig) -> Self {
        Self {
            cfg,
            subscribers: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Replaces the default [`LogWriter`]. An empty list disables event delivery.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = Some(subscribers);
        self
    }

    /// Builds the group.
    pub fn build(self) -> Group {
        let subs = self
            .subscribers
            .unwrap_or_else(|| vec![Arc::new(LogWriter::new())]);
        Group::from_parts(self.cfg, SubscriberSet::new(subs))
    }
}
