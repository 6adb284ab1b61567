//! Lifecycle events and the registration state machine.
//!
//! A worker moves through uninstalled → installing → installed →
//! activating → active, driven entirely by its host. The worker itself is
//! a passive subscriber to three event kinds: install, fetch, activate.
//!
//! `Registration` is the explicit stand-in for the host runtime: it
//! delivers each event to an [`EventHandler`], awaits the handler's work to
//! settlement before moving the phase forward, and refuses events that
//! arrive in the wrong phase. Install always precedes activate; fetch is
//! only delivered while active.

use bytes::Bytes;
use std::collections::BTreeMap;
use tgb_core::Error;

/// Lifecycle phase of a registration.
///
/// `Installed` is the installed/waiting state between a settled install
/// and activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Uninstalled,
    Installing,
    Installed,
    Activating,
    Active,
}

/// An intercepted outbound request, identified by URL and method.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub method: String,
}

impl FetchRequest {
    /// A GET request, the only kind the precache ever answers.
    pub fn get(url: impl Into<String>) -> Self {
        Self { url: url.into(), method: "GET".to_string() }
    }

    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self { url: url.into(), method: method.into() }
    }
}

/// Which path answered a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeSource {
    Cache,
    Network,
}

/// Response handed back to the requester.
#[derive(Debug, Clone)]
pub struct ServedResponse {
    pub source: ServeSource,
    pub status: u16,
    pub content_type: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

/// The lifecycle-event capability set a worker implements.
#[async_trait::async_trait]
pub trait EventHandler: Send + Sync {
    async fn on_install(&self) -> Result<(), Error>;

    async fn on_fetch(&self, request: &FetchRequest) -> Result<ServedResponse, Error>;

    async fn on_activate(&self) -> Result<(), Error>;
}

/// Host-runtime stand-in driving a handler through the lifecycle.
///
/// Install and activate take `&mut self`: lifecycle phases are exclusive
/// and there are no concurrent writers. Fetch takes `&self`: concurrent
/// fetch invocations share only the read-only bucket.
pub struct Registration<H> {
    handler: H,
    phase: LifecyclePhase,
}

impl<H: EventHandler> Registration<H> {
    pub fn new(handler: H) -> Self {
        Self { handler, phase: LifecyclePhase::Uninstalled }
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Deliver the install event.
    ///
    /// The phase does not advance until the handler's work settles. A
    /// failed install reverts to `Uninstalled`, leaving the registration
    /// ready for the host's retry.
    pub async fn install(&mut self) -> Result<(), Error> {
        if self.phase != LifecyclePhase::Uninstalled {
            return Err(Error::Lifecycle(format!("install delivered in phase {:?}", self.phase)));
        }
        self.phase = LifecyclePhase::Installing;
        match self.handler.on_install().await {
            Ok(()) => {
                self.phase = LifecyclePhase::Installed;
                Ok(())
            }
            Err(e) => {
                self.phase = LifecyclePhase::Uninstalled;
                Err(e)
            }
        }
    }

    /// Deliver the activate event.
    ///
    /// Requires a settled install. A failed activation reverts to
    /// `Installed`.
    pub async fn activate(&mut self) -> Result<(), Error> {
        if self.phase != LifecyclePhase::Installed {
            return Err(Error::Lifecycle(format!("activate delivered in phase {:?}", self.phase)));
        }
        self.phase = LifecyclePhase::Activating;
        match self.handler.on_activate().await {
            Ok(()) => {
                self.phase = LifecyclePhase::Active;
                Ok(())
            }
            Err(e) => {
                self.phase = LifecyclePhase::Installed;
                Err(e)
            }
        }
    }

    /// Deliver a fetch event. Only an active registration serves fetches.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<ServedResponse, Error> {
        if self.phase != LifecyclePhase::Active {
            return Err(Error::Lifecycle(format!("fetch delivered in phase {:?}", self.phase)));
        }
        self.handler.on_fetch(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Handler stub: fails the first `fail_installs` install deliveries,
    /// optionally fails activation.
    #[derive(Default)]
    struct StubHandler {
        fail_installs: AtomicUsize,
        fail_activate: bool,
    }

    #[async_trait::async_trait]
    impl EventHandler for StubHandler {
        async fn on_install(&self) -> Result<(), Error> {
            if self.fail_installs.load(Ordering::SeqCst) > 0 {
                self.fail_installs.fetch_sub(1, Ordering::SeqCst);
                return Err(Error::PrecacheFailed("stub install failure".to_string()));
            }
            Ok(())
        }

        async fn on_fetch(&self, _request: &FetchRequest) -> Result<ServedResponse, Error> {
            Ok(ServedResponse {
                source: ServeSource::Network,
                status: 200,
                content_type: None,
                headers: BTreeMap::new(),
                body: Bytes::new(),
            })
        }

        async fn on_activate(&self) -> Result<(), Error> {
            if self.fail_activate {
                return Err(Error::HttpError("stub activate failure".to_string()));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_phase_progression() {
        let mut registration = Registration::new(StubHandler::default());
        assert_eq!(registration.phase(), LifecyclePhase::Uninstalled);

        registration.install().await.unwrap();
        assert_eq!(registration.phase(), LifecyclePhase::Installed);

        registration.activate().await.unwrap();
        assert_eq!(registration.phase(), LifecyclePhase::Active);
    }

    #[tokio::test]
    async fn test_activate_before_install_rejected() {
        let mut registration = Registration::new(StubHandler::default());
        let result = registration.activate().await;
        assert!(matches!(result, Err(Error::Lifecycle(_))));
        assert_eq!(registration.phase(), LifecyclePhase::Uninstalled);
    }

    #[tokio::test]
    async fn test_fetch_before_activation_rejected() {
        let mut registration = Registration::new(StubHandler::default());
        registration.install().await.unwrap();

        let result = registration.fetch(&FetchRequest::get("/")).await;
        assert!(matches!(result, Err(Error::Lifecycle(_))));
    }

    #[tokio::test]
    async fn test_install_twice_rejected() {
        let mut registration = Registration::new(StubHandler::default());
        registration.install().await.unwrap();

        let result = registration.install().await;
        assert!(matches!(result, Err(Error::Lifecycle(_))));
        assert_eq!(registration.phase(), LifecyclePhase::Installed);
    }

    #[tokio::test]
    async fn test_failed_install_allows_retry() {
        let handler = StubHandler { fail_installs: AtomicUsize::new(1), fail_activate: false };
        let mut registration = Registration::new(handler);

        let result = registration.install().await;
        assert!(matches!(result, Err(Error::PrecacheFailed(_))));
        assert_eq!(registration.phase(), LifecyclePhase::Uninstalled);

        registration.install().await.unwrap();
        assert_eq!(registration.phase(), LifecyclePhase::Installed);
    }

    #[tokio::test]
    async fn test_failed_activate_reverts_to_installed() {
        let handler = StubHandler { fail_installs: AtomicUsize::new(0), fail_activate: true };
        let mut registration = Registration::new(handler);
        registration.install().await.unwrap();

        let result = registration.activate().await;
        assert!(result.is_err());
        assert_eq!(registration.phase(), LifecyclePhase::Installed);
    }

    #[tokio::test]
    async fn test_fetch_after_activation_served() {
        let mut registration = Registration::new(StubHandler::default());
        registration.install().await.unwrap();
        registration.activate().await.unwrap();

        let served = registration.fetch(&FetchRequest::get("/")).await.unwrap();
        assert_eq!(served.status, 200);
    }
}
