//! Login state machine
//!
//! One [`AuthHandshake`] per login attempt:
//!
//! ```text
//! Idle → AwaitingProviderCode → ExchangingProviderToken
//!      → ExchangingServiceToken → Authenticated
//! ```
//!
//! Any step may end in `Failed(reason)`. Tokens obtained before a failure
//! stay persisted. Listeners registered with [`AuthHandshake::subscribe`]
//! receive exactly one terminal [`HandshakeEvent`] per attempt.

use tokio::sync::broadcast;

use crate::api::gateway::RemoteGateway;
use crate::core::credentials::CredentialStore;
use crate::core::storage::Storage;
use crate::error::{BuildTrackerError, FailureReason, Result};

/// Capacity of the completion channel; one terminal event per attempt
const EVENT_CAPACITY: usize = 4;

/// Where a login attempt currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeState {
    Idle,
    /// Authorization page presented; waiting for the redirect
    AwaitingProviderCode,
    ExchangingProviderToken,
    ExchangingServiceToken,
    Authenticated,
    Failed(FailureReason),
}

impl HandshakeState {
    /// True once the attempt can make no further progress
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Authenticated | Self::Failed(_))
    }
}

/// Terminal outcome broadcast to listeners
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeEvent {
    Authenticated,
    Failed(FailureReason),
}

/// A single login attempt
pub struct AuthHandshake<'a, G: RemoteGateway + ?Sized, S: Storage> {
    gateway: &'a G,
    credentials: &'a mut CredentialStore<S>,
    state: HandshakeState,
    /// Anti-forgery token sent with the authorization request
    sent_state: Option<String>,
    events: broadcast::Sender<HandshakeEvent>,
    notified: bool,
}

impl<'a, G: RemoteGateway + ?Sized, S: Storage> AuthHandshake<'a, G, S> {
    pub fn new(gateway: &'a G, credentials: &'a mut CredentialStore<S>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            gateway,
            credentials,
            state: HandshakeState::Idle,
            sent_state: None,
            events,
            notified: false,
        }
    }

    /// Register for the terminal event; subscribe before calling `complete`
    pub fn subscribe(&self) -> broadcast::Receiver<HandshakeEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> &HandshakeState {
        &self.state
    }

    /// Anti-forgery token of the current attempt
    pub fn sent_state(&self) -> Option<&str> {
        self.sent_state.as_deref()
    }

    /// Record that the authorization page was presented with `state_token`
    pub fn begin(&mut self, state_token: impl Into<String>) -> Result<()> {
        if self.state != HandshakeState::Idle {
            return Err(BuildTrackerError::InvalidInput(format!(
                "Cannot start a login while in state {:?}",
                self.state
            )));
        }
        self.sent_state = Some(state_token.into());
        self.transition(HandshakeState::AwaitingProviderCode);
        Ok(())
    }

    /// Exchange the redirect's code for both tokens
    ///
    /// `returned_state` is the state echoed back in the redirect. Any failure
    /// moves the attempt to `Failed` and is also returned.
    pub async fn complete(&mut self, code: &str, returned_state: &str) -> Result<()> {
        if self.state != HandshakeState::AwaitingProviderCode {
            return Err(BuildTrackerError::InvalidInput(format!(
                "No authorization is pending (state {:?})",
                self.state
            )));
        }

        let sent_state = self.sent_state.clone().unwrap_or_default();
        if sent_state != returned_state {
            return self.fail(BuildTrackerError::StateMismatch);
        }

        self.transition(HandshakeState::ExchangingProviderToken);
        let exchanged = self
            .gateway
            .exchange_authorization_code(code, &sent_state)
            .await;
        let source_host_token = match exchanged {
            Ok(token) => token,
            Err(e) => return self.fail(e),
        };
        if let Err(e) = self
            .credentials
            .set_source_host_token(Some(source_host_token.clone()))
        {
            return self.fail(e);
        }

        self.transition(HandshakeState::ExchangingServiceToken);
        let exchanged = self
            .gateway
            .exchange_for_service_token(&source_host_token)
            .await;
        let ci_token = match exchanged {
            Ok(token) => token,
            Err(e) => return self.fail(e),
        };
        if let Err(e) = self.credentials.set_ci_token(Some(ci_token)) {
            return self.fail(e);
        }

        self.transition(HandshakeState::Authenticated);
        self.notify(HandshakeEvent::Authenticated);
        Ok(())
    }

    /// Return a finished or failed attempt to `Idle` for a fresh start
    pub fn reset(&mut self) {
        self.sent_state = None;
        self.notified = false;
        self.transition(HandshakeState::Idle);
    }

    fn transition(&mut self, next: HandshakeState) {
        tracing::info!(from = ?self.state, to = ?next, "handshake transition");
        self.state = next;
    }

    fn fail(&mut self, err: BuildTrackerError) -> Result<()> {
        let reason = FailureReason::from(&err);
        tracing::warn!(reason = %reason, "handshake failed");
        self.transition(HandshakeState::Failed(reason.clone()));
        self.notify(HandshakeEvent::Failed(reason));
        Err(err)
    }

    fn notify(&mut self, event: HandshakeEvent) {
        if self.notified {
            return;
        }
        self.notified = true;
        // No listeners is fine
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use secrecy::{ExposeSecret, SecretString};
    use tokio::sync::broadcast::error::TryRecvError;

    use super::*;
    use crate::api::auth::{CiToken, SourceHostToken};
    use crate::api::gateway::MockRemoteGateway;
    use crate::core::credentials::{CI_TOKEN_KEY, SOURCE_HOST_TOKEN_KEY};
    use crate::core::storage::MemoryStorage;

    fn github_token() -> SourceHostToken {
        SourceHostToken {
            token: SecretString::from("gho_token".to_string()),
            token_type: "bearer".to_string(),
            scope: "repo".to_string(),
        }
    }

    fn credentials() -> (CredentialStore<Arc<MemoryStorage>>, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        (CredentialStore::new(storage.clone()), storage)
    }

    #[tokio::test]
    async fn test_successful_handshake_persists_both_tokens() {
        let mut gateway = MockRemoteGateway::new();
        gateway
            .expect_exchange_authorization_code()
            .withf(|code, state| code.to_string() == "code-1" && state.to_string() == "s1")
            .times(1)
            .returning(|_, _| Ok(github_token()));
        gateway
            .expect_exchange_for_service_token()
            .withf(|token| token.token.expose_secret() == "gho_token")
            .times(1)
            .returning(|_| Ok(CiToken::new("travis_token")));

        let (mut creds, storage) = credentials();
        {
            let mut handshake = AuthHandshake::new(&gateway, &mut creds);
            let mut rx = handshake.subscribe();

            handshake.begin("s1").unwrap();
            assert_eq!(handshake.state(), &HandshakeState::AwaitingProviderCode);

            handshake.complete("code-1", "s1").await.unwrap();
            assert_eq!(handshake.state(), &HandshakeState::Authenticated);
            assert!(handshake.state().is_terminal());

            assert_eq!(rx.try_recv().unwrap(), HandshakeEvent::Authenticated);
            assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        }

        assert!(creds.is_authenticated());
        assert_eq!(
            creds.ci_token().unwrap().token.expose_secret(),
            "travis_token"
        );
        assert!(storage.read(CI_TOKEN_KEY).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_state_mismatch_fails_without_network_or_tokens() {
        // No expectations: any gateway call panics
        let gateway = MockRemoteGateway::new();
        let (mut creds, storage) = credentials();

        {
            let mut handshake = AuthHandshake::new(&gateway, &mut creds);
            let mut rx = handshake.subscribe();
            handshake.begin("s1").unwrap();

            let result = handshake.complete("code-1", "s2").await;
            assert!(matches!(result, Err(BuildTrackerError::StateMismatch)));
            assert_eq!(
                handshake.state(),
                &HandshakeState::Failed(FailureReason::StateMismatch)
            );
            assert_eq!(
                rx.try_recv().unwrap(),
                HandshakeEvent::Failed(FailureReason::StateMismatch)
            );
        }

        assert!(!creds.is_authenticated());
        assert!(storage.read(SOURCE_HOST_TOKEN_KEY).unwrap().is_none());
        assert!(storage.read(CI_TOKEN_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_service_exchange_failure_keeps_source_host_token() {
        let mut gateway = MockRemoteGateway::new();
        gateway
            .expect_exchange_authorization_code()
            .returning(|_, _| Ok(github_token()));
        gateway
            .expect_exchange_for_service_token()
            .returning(|_| Err(BuildTrackerError::NetworkUnavailable("timed out".into())));

        let (mut creds, storage) = credentials();
        {
            let mut handshake = AuthHandshake::new(&gateway, &mut creds);
            let mut rx = handshake.subscribe();
            handshake.begin("s1").unwrap();

            let err = handshake.complete("code-1", "s1").await.unwrap_err();
            assert!(err.is_offline());
            assert_eq!(
                handshake.state(),
                &HandshakeState::Failed(FailureReason::NetworkUnavailable)
            );
            assert_eq!(
                rx.try_recv().unwrap(),
                HandshakeEvent::Failed(FailureReason::NetworkUnavailable)
            );
        }

        assert!(!creds.is_authenticated());
        assert!(creds.source_host_token().is_some());
        assert!(storage.read(SOURCE_HOST_TOKEN_KEY).unwrap().is_some());
        assert!(storage.read(CI_TOKEN_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_code_exchange_decode_failure() {
        let mut gateway = MockRemoteGateway::new();
        gateway
            .expect_exchange_authorization_code()
            .returning(|_, _| Err(BuildTrackerError::DecodeFailure("missing access_token".into())));

        let (mut creds, storage) = credentials();
        let mut handshake = AuthHandshake::new(&gateway, &mut creds);
        handshake.begin("s1").unwrap();

        assert!(handshake.complete("bad", "s1").await.is_err());
        assert_eq!(
            handshake.state(),
            &HandshakeState::Failed(FailureReason::DecodeFailure)
        );
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_every_listener_hears_the_outcome() {
        let mut gateway = MockRemoteGateway::new();
        gateway
            .expect_exchange_authorization_code()
            .returning(|_, _| Ok(github_token()));
        gateway
            .expect_exchange_for_service_token()
            .returning(|_| Ok(CiToken::new("travis_token")));

        let (mut creds, _) = credentials();
        let mut handshake = AuthHandshake::new(&gateway, &mut creds);
        let mut first = handshake.subscribe();
        let mut second = handshake.subscribe();

        handshake.begin("s1").unwrap();
        handshake.complete("code", "s1").await.unwrap();

        assert_eq!(first.recv().await.unwrap(), HandshakeEvent::Authenticated);
        assert_eq!(second.recv().await.unwrap(), HandshakeEvent::Authenticated);
    }

    #[tokio::test]
    async fn test_complete_requires_pending_authorization() {
        let gateway = MockRemoteGateway::new();
        let (mut creds, _) = credentials();
        let mut handshake = AuthHandshake::new(&gateway, &mut creds);

        assert!(matches!(
            handshake.complete("code", "s1").await,
            Err(BuildTrackerError::InvalidInput(_))
        ));
        assert_eq!(handshake.state(), &HandshakeState::Idle);
    }

    #[tokio::test]
    async fn test_reset_allows_new_attempt() {
        let gateway = MockRemoteGateway::new();
        let (mut creds, _) = credentials();
        let mut handshake = AuthHandshake::new(&gateway, &mut creds);

        handshake.begin("s1").unwrap();
        assert!(handshake.begin("s2").is_err());
        let _ = handshake.complete("code", "wrong").await;
        assert!(handshake.state().is_terminal());

        handshake.reset();
        assert_eq!(handshake.state(), &HandshakeState::Idle);
        handshake.begin("s2").unwrap();
        assert_eq!(handshake.sent_state(), Some("s2"));
    }
}
