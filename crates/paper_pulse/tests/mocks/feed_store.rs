use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use episode_feed::{FeedStore, FeedStoreError, StoredFeed};

/// In-memory feed with a revision counter for conditional writes
#[derive(Clone, Default)]
pub struct MockFeedStore {
    pub feed: Arc<Mutex<Option<StoredFeed>>>,
    pub loads: Arc<AtomicUsize>,
    pub saves: Arc<Mutex<Vec<String>>>,
    /// Number of upcoming saves rejected as conflicting
    pub conflicts: Arc<AtomicUsize>,
    pub fail_with: Option<String>,
}

impl MockFeedStore {
    pub fn with_xml(xml: &str) -> Self {
        let store = Self::default();
        *store.feed.lock().unwrap() = Some(StoredFeed {
            xml: xml.to_string(),
            revision: Some("rev-0".to_string()),
        });
        store
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }

    pub fn with_conflicts(self, count: usize) -> Self {
        self.conflicts.store(count, Ordering::SeqCst);
        self
    }

    pub fn xml(&self) -> Option<String> {
        self.feed.lock().unwrap().as_ref().map(|feed| feed.xml.clone())
    }

    pub fn save_count(&self) -> usize {
        self.saves.lock().unwrap().len()
    }
}

impl FeedStore for MockFeedStore {
    async fn load(&self) -> Result<Option<StoredFeed>, FeedStoreError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if let Some(ref msg) = self.fail_with {
            return Err(FeedStoreError::Io(std::io::Error::other(msg.clone())));
        }
        Ok(self.feed.lock().unwrap().clone())
    }

    async fn save(&self, xml: &str, revision: Option<&str>) -> Result<(), FeedStoreError> {
        if self
            .conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(FeedStoreError::Conflict);
        }

        let mut feed = self.feed.lock().unwrap();
        let current = feed.as_ref().and_then(|feed| feed.revision.clone());
        if current.as_deref() != revision {
            return Err(FeedStoreError::Conflict);
        }

        let next = self.saves.lock().unwrap().len() + 1;
        self.saves.lock().unwrap().push(xml.to_string());
        *feed = Some(StoredFeed {
            xml: xml.to_string(),
            revision: Some(format!("rev-{next}")),
        });
        Ok(())
    }
}
