//! Read-through cache for navigation pages.
//!
//! Keyed by organization, fixed expiry, never invalidated proactively:
//! stale reads are accepted up to the expiry window.

use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::Result;
use parking_lot::RwLock;
use pulse_core::OrgId;

use crate::entities::NavPage;

struct Entry {
    loaded_at: Instant,
    pages: Vec<NavPage>,
}

pub struct NavCache {
    ttl: Duration,
    entries: RwLock<HashMap<i64, Entry>>,
}

impl NavCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Return the cached navigation for `org`, loading it through `load`
    /// when missing or expired.
    pub async fn get_or_load<F, Fut>(&self, org: OrgId, load: F) -> Result<Vec<NavPage>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<NavPage>>>,
    {
        {
            let entries = self.entries.read();
            if let Some(entry) = entries.get(&org.0) {
                if entry.loaded_at.elapsed() < self.ttl {
                    return Ok(entry.pages.clone());
                }
            }
        }

        let pages = load().await?;
        self.entries.write().insert(
            org.0,
            Entry {
                loaded_at: Instant::now(),
                pages: pages.clone(),
            },
        );
        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn nav(title: &str) -> Vec<NavPage> {
        vec![NavPage {
            id: 1,
            slug: "home".into(),
            title: title.into(),
            nav_order: 0,
        }]
    }

    #[tokio::test]
    async fn second_read_within_ttl_skips_loader() {
        let cache = NavCache::new(Duration::from_secs(60));
        let loads = AtomicUsize::new(0);

        for _ in 0..2 {
            let pages = cache
                .get_or_load(OrgId(8), || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(nav("Home"))
                })
                .await
                .unwrap();
            assert_eq!(pages[0].title, "Home");
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn entries_are_per_organization() {
        let cache = NavCache::new(Duration::from_secs(60));

        cache
            .get_or_load(OrgId(1), || async { Ok(nav("One")) })
            .await
            .unwrap();
        let other = cache
            .get_or_load(OrgId(2), || async { Ok(nav("Two")) })
            .await
            .unwrap();

        assert_eq!(other[0].title, "Two");
    }

    #[tokio::test]
    async fn expired_entry_is_reloaded() {
        let cache = NavCache::new(Duration::from_millis(20));
        let loads = AtomicUsize::new(0);

        cache
            .get_or_load(OrgId(1), || async {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok(nav("Old"))
            })
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(40)).await;

        let pages = cache
            .get_or_load(OrgId(1), || async {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok(nav("New"))
            })
            .await
            .unwrap();

        assert_eq!(loads.load(Ordering::SeqCst), 2);
        assert_eq!(pages[0].title, "New");
    }
}
