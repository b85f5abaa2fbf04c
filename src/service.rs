// src/service.rs
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::cache::{MemoryViewCache, ViewCache};
use crate::models::{ListQuery, RegistrationForm, SubmissionResult, User, UserListing};
use crate::remote::UserDirectory;

/// Registration submissions and the user listing, backed by a remote directory.
///
/// Every public operation returns a [`SubmissionResult`]; errors from the
/// remote are folded into it here and never reach the caller.
pub struct RegistrationService<D, C> {
    directory: D,
    cache: Arc<C>,
    view_tag: String,
}

impl<D: UserDirectory, C: ViewCache> RegistrationService<D, C> {
    /// `view_tag` names the cached listing that a successful registration makes stale.
    pub fn new(directory: D, cache: Arc<C>, view_tag: impl Into<String>) -> Self {
        Self {
            directory,
            cache,
            view_tag: view_tag.into(),
        }
    }

    pub fn view_tag(&self) -> &str {
        &self.view_tag
    }

    pub fn cache(&self) -> &Arc<C> {
        &self.cache
    }

    /// Forwards one registration to the remote.
    ///
    /// On success the listing view is invalidated exactly once; on any
    /// failure it is left alone.
    pub async fn submit(&self, form: &RegistrationForm) -> SubmissionResult<User> {
        let submission_id = Uuid::new_v4();
        let start = Instant::now();
        log::info!("[{}] Submitting registration for {}", submission_id, form.email());

        match self.directory.create_user(form).await {
            Ok(user) => {
                log::info!(
                    "[{}] Registered user {} ({}ms)",
                    submission_id,
                    user.id,
                    start.elapsed().as_millis()
                );
                self.cache.invalidate(&self.view_tag).await;
                SubmissionResult::success(user)
            }
            Err(e) => {
                log::warn!(
                    "[{}] Registration failed ({:?}): {}",
                    submission_id,
                    e.failure_kind(),
                    e
                );
                SubmissionResult::from_error(&e)
            }
        }
    }

    /// Fetches the current users straight from the remote.
    pub async fn list(&self, query: &ListQuery) -> SubmissionResult<Vec<User>> {
        let result = self.directory.list_users(query).await;
        if let Err(e) = &result {
            log::warn!("Listing users failed ({:?}): {}", e.failure_kind(), e);
        }
        result.into()
    }
}

impl<D: UserDirectory> RegistrationService<D, MemoryViewCache> {
    /// Serves the listing from cache when a fresh rendering exists for this query.
    ///
    /// Only successful fetches are stored, and only if no invalidation
    /// happened while the fetch was in flight.
    pub async fn list_cached(&self, query: &ListQuery) -> SubmissionResult<UserListing> {
        let key = query.cache_key(&self.view_tag);

        if let Some(view) = self.cache.get(&key).await {
            match serde_json::from_value::<Vec<User>>(view.value) {
                Ok(users) => {
                    log::debug!("Serving '{}' from cache", key);
                    return SubmissionResult::success(UserListing {
                        users,
                        fetched_at: view.fetched_at,
                        from_cache: true,
                    });
                }
                Err(e) => log::warn!("Discarding unreadable cached view '{}': {}", key, e),
            }
        }

        // Read before fetching: an invalidation landing mid-fetch must win over this result.
        let generation = self.cache.generation(&key).await;

        let users = match self.list(query).await {
            SubmissionResult::Success { payload } => payload,
            SubmissionResult::Failure { kind, message } => {
                return SubmissionResult::Failure { kind, message };
            }
        };

        let stored = match serde_json::to_value(&users) {
            Ok(value) => self.cache.store_at(&key, generation, value).await,
            Err(e) => {
                log::warn!("Could not cache '{}': {}", key, e);
                None
            }
        };
        let fetched_at = stored.map_or_else(chrono::Utc::now, |view| view.fetched_at);

        SubmissionResult::success(UserListing {
            users,
            fetched_at,
            from_cache: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{RelayError, Result};
    use crate::models::{CONNECTIVITY_ERROR, FailureKind, GENERIC_SERVER_ERROR};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Which way the fake remote should fail, if at all.
    #[derive(Clone)]
    enum Fault {
        None,
        Reject(u16, Option<&'static str>),
        Transport,
        Malformed,
    }

    struct FakeDirectory {
        fault: Fault,
        calls: AtomicUsize,
    }

    impl FakeDirectory {
        fn new(fault: Fault) -> Self {
            Self {
                fault,
                calls: AtomicUsize::new(0),
            }
        }

        async fn outcome<T>(&self, ok: T) -> Result<T> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.fault {
                Fault::None => Ok(ok),
                Fault::Reject(status, message) => Err(RelayError::RemoteRejection {
                    status: *status,
                    message: message.map(str::to_string),
                }),
                Fault::Transport => {
                    // An unparseable URL makes reqwest fail before any I/O.
                    let err = reqwest::Client::new()
                        .get("not a url")
                        .send()
                        .await
                        .unwrap_err();
                    Err(RelayError::Transport(err))
                }
                Fault::Malformed => Err(RelayError::MalformedBody("EOF while parsing".to_string())),
            }
        }
    }

    impl UserDirectory for FakeDirectory {
        async fn create_user(&self, form: &RegistrationForm) -> Result<User> {
            self.outcome(User::new("1", form.name(), form.email())).await
        }

        async fn list_users(&self, _query: &ListQuery) -> Result<Vec<User>> {
            self.outcome(vec![User::new("1", "Ada", "ada@example.com")]).await
        }
    }

    #[derive(Default)]
    struct CountingCache {
        invalidations: AtomicUsize,
    }

    impl ViewCache for CountingCache {
        async fn invalidate(&self, _tag: &str) {
            self.invalidations.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn form() -> RegistrationForm {
        RegistrationForm::new("Ada", "ada@example.com").unwrap()
    }

    fn service(fault: Fault) -> RegistrationService<FakeDirectory, CountingCache> {
        RegistrationService::new(FakeDirectory::new(fault), Arc::new(CountingCache::default()), "/users")
    }

    fn invalidations(service: &RegistrationService<FakeDirectory, CountingCache>) -> usize {
        service.cache().invalidations.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn test_success_invalidates_exactly_once() {
        let service = service(Fault::None);
        let result = service.submit(&form()).await;

        assert_eq!(
            result,
            SubmissionResult::success(User::new("1", "Ada", "ada@example.com"))
        );
        assert_eq!(invalidations(&service), 1);
        assert_eq!(service.directory.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_every_fault_class_yields_a_failure_value() {
        let cases = [
            (
                Fault::Reject(400, Some("email already exists")),
                FailureKind::RemoteRejection,
                "email already exists",
            ),
            (Fault::Reject(500, None), FailureKind::RemoteRejection, GENERIC_SERVER_ERROR),
            (Fault::Transport, FailureKind::TransportFailure, CONNECTIVITY_ERROR),
            (Fault::Malformed, FailureKind::TransportFailure, CONNECTIVITY_ERROR),
        ];

        for (fault, kind, message) in cases {
            let service = service(fault);
            let result = service.submit(&form()).await;

            assert_eq!(result, SubmissionResult::failure(kind, message));
            assert_eq!(invalidations(&service), 0);
            assert_eq!(service.directory.calls.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test]
    async fn test_list_failure_is_folded() {
        let service = service(Fault::Transport);
        let result = service.list(&ListQuery::default()).await;
        assert_eq!(result.kind(), Some(FailureKind::TransportFailure));
        assert_eq!(result.message(), Some(CONNECTIVITY_ERROR));
    }

    #[tokio::test]
    async fn test_list_cached_reuses_fresh_view_until_submit() {
        let service = RegistrationService::new(
            FakeDirectory::new(Fault::None),
            Arc::new(MemoryViewCache::new()),
            "/users",
        );
        let query = ListQuery::default();

        let first = service.list_cached(&query).await;
        assert!(!first.payload().unwrap().from_cache);

        let second = service.list_cached(&query).await;
        assert!(second.payload().unwrap().from_cache);
        assert_eq!(service.directory.calls.load(Ordering::SeqCst), 1);

        assert!(service.submit(&form()).await.is_success());

        let third = service.list_cached(&query).await;
        assert!(!third.payload().unwrap().from_cache);
        // one list, one submit, one re-list
        assert_eq!(service.directory.calls.load(Ordering::SeqCst), 3);
    }

    /// Lists whatever had been created when the listing started, then stalls.
    #[derive(Default)]
    struct SlowListingDirectory {
        created: AtomicUsize,
    }

    impl UserDirectory for SlowListingDirectory {
        async fn create_user(&self, form: &RegistrationForm) -> Result<User> {
            let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(User::new(n.to_string(), form.name(), form.email()))
        }

        async fn list_users(&self, _query: &ListQuery) -> Result<Vec<User>> {
            let n = self.created.load(Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok((1..=n)
                .map(|i| User::new(i.to_string(), "Ada", "ada@example.com"))
                .collect())
        }
    }

    #[tokio::test]
    async fn test_submit_during_listing_fetch_is_not_masked_by_cache() {
        let service = RegistrationService::new(
            SlowListingDirectory::default(),
            Arc::new(MemoryViewCache::new()),
            "/users",
        );
        let query = ListQuery::default();

        let (listed, submitted) = tokio::join!(service.list_cached(&query), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            service.submit(&form()).await
        });
        assert!(submitted.is_success());
        assert_eq!(listed.payload().unwrap().users.len(), 0);
        assert_eq!(service.cache().len().await, 0);

        let next = service.list_cached(&query).await;
        let listing = next.payload().unwrap();
        assert!(!listing.from_cache);
        assert_eq!(listing.users.len(), 1);

        let again = service.list_cached(&query).await;
        assert!(again.payload().unwrap().from_cache);
    }

    #[tokio::test]
    async fn test_concurrent_listings_and_submits_settle_on_fresh_view() {
        let service = RegistrationService::new(
            SlowListingDirectory::default(),
            Arc::new(MemoryViewCache::new()),
            "/users",
        );
        let query = ListQuery::default();
        let forms: Vec<_> = (0..4)
            .map(|i| RegistrationForm::new("Ada", &format!("ada{}@example.com", i)).unwrap())
            .collect();

        let listings = futures::future::join_all((0..4).map(|_| service.list_cached(&query)));
        let submits = futures::future::join_all(forms.iter().map(|f| service.submit(f)));
        let (_, submitted) = tokio::join!(listings, submits);
        assert!(submitted.iter().all(SubmissionResult::is_success));

        let settled = service.list_cached(&query).await;
        assert_eq!(settled.payload().unwrap().users.len(), 4);
    }

    #[tokio::test]
    async fn test_list_cached_does_not_store_failures() {
        let service = RegistrationService::new(
            FakeDirectory::new(Fault::Reject(503, None)),
            Arc::new(MemoryViewCache::new()),
            "/users",
        );

        let result = service.list_cached(&ListQuery::default()).await;
        assert_eq!(result.kind(), Some(FailureKind::RemoteRejection));
        assert_eq!(service.cache().len().await, 0);
    }
}
