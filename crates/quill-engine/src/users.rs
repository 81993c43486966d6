use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use quill_auth::{AuthenticatedIdentity, FederatedVerifier, PasswordHasher, TokenSigner};
use quill_store::{Store, UserStore};
use quill_types::{normalize_email, Credential, NewUser, ProfileUpdate, User};

use crate::error::{EngineError, EngineResult};

/// Shortest accepted local password, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

const BAD_LOGIN: &str = "Incorrect email or password";

/// Registration input for a local account.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// A freshly issued session.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user: User,
    /// Token lifetime in seconds.
    pub expires_in: i64,
}

/// Accounts, sign-in, and profiles.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn Store>,
    signer: Arc<TokenSigner>,
    hasher: Arc<dyn PasswordHasher>,
    federation: Arc<dyn FederatedVerifier>,
}

impl UserService {
    pub fn new(
        store: Arc<dyn Store>,
        signer: Arc<TokenSigner>,
        hasher: Arc<dyn PasswordHasher>,
        federation: Arc<dyn FederatedVerifier>,
    ) -> Self {
        Self {
            store,
            signer,
            hasher,
            federation,
        }
    }

    pub async fn register(&self, input: Registration) -> EngineResult<User> {
        if input.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(EngineError::InvalidArgument(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let hash = self.hasher.hash(&input.password)?;
        let user = User::new(NewUser {
            email: input.email,
            first_name: input.first_name,
            last_name: input.last_name,
            credential: Credential::Password { hash },
            photo_url: None,
        })?;
        self.store.insert_user(user.clone()).await?;
        info!(user = %user.id, "user registered");
        Ok(user)
    }

    /// Check a local password and issue a session token.
    pub async fn login(&self, email: &str, password: &str) -> EngineResult<Session> {
        let email = normalize_email(email)?;
        let user = self
            .store
            .user_by_email(&email)
            .await?
            .ok_or_else(|| EngineError::Unauthenticated(BAD_LOGIN.into()))?;
        let verified = user
            .credential
            .password_hash()
            .is_some_and(|digest| self.hasher.verify(password, digest));
        if !verified {
            warn!(user = %user.id, "password login rejected");
            return Err(EngineError::Unauthenticated(BAD_LOGIN.into()));
        }
        self.session_for(user)
    }

    /// Sign in with a provider-issued token.
    ///
    /// Resolution order: the federated identity, then an existing account
    /// with the same email, then a new federated account.
    pub async fn federated_login(&self, token: &str) -> EngineResult<Session> {
        if token.trim().is_empty() {
            return Err(EngineError::InvalidArgument("token is required".into()));
        }
        let profile = self.federation.verify(token).await?;

        if let Some(user) = self
            .store
            .user_by_federated(&profile.provider, &profile.subject)
            .await?
        {
            return self.session_for(user);
        }

        let email = normalize_email(&profile.email)?;
        if let Some(user) = self.store.user_by_email(&email).await? {
            info!(user = %user.id, provider = %profile.provider, "federated login matched existing email");
            return self.session_for(user);
        }

        let user = User::new(NewUser {
            email,
            first_name: profile.given_name,
            last_name: profile.family_name,
            credential: Credential::Federated {
                provider: profile.provider,
                subject: profile.subject,
            },
            photo_url: profile.picture,
        })?;
        self.store.insert_user(user.clone()).await?;
        info!(user = %user.id, "federated user created");
        self.session_for(user)
    }

    pub async fn update_profile(
        &self,
        who: AuthenticatedIdentity,
        update: ProfileUpdate,
    ) -> EngineResult<User> {
        let user = self
            .store
            .modify_user(who.user_id, Box::new(move |u| u.apply_profile(update)))
            .await?;
        info!(user = %user.id, "profile updated");
        Ok(user)
    }

    pub async fn get(&self, who: AuthenticatedIdentity) -> EngineResult<User> {
        self.store
            .user(who.user_id)
            .await?
            .ok_or(EngineError::not_found("user"))
    }

    pub async fn list(&self) -> EngineResult<Vec<User>> {
        Ok(self.store.users().await?)
    }

    fn session_for(&self, user: User) -> EngineResult<Session> {
        let token = self.signer.issue(user.id)?;
        Ok(Session {
            token,
            user,
            expires_in: self.signer.ttl_secs(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_auth::{FederatedProfile, SaltedBlake3Hasher, StaticFederatedVerifier};
    use quill_store::InMemoryStore;

    fn grace() -> FederatedProfile {
        FederatedProfile {
            provider: "google".into(),
            subject: "g-1".into(),
            email: "Grace@Example.com".into(),
            given_name: "Grace".into(),
            family_name: "Hopper".into(),
            picture: Some("https://img.example.com/g.png".into()),
        }
    }

    fn service() -> (Arc<TokenSigner>, UserService) {
        let signer = Arc::new(TokenSigner::generate(3600));
        let federation = StaticFederatedVerifier::new().with_profile("grace-token", grace());
        let users = UserService::new(
            Arc::new(InMemoryStore::new()),
            Arc::clone(&signer),
            Arc::new(SaltedBlake3Hasher::new(4)),
            Arc::new(federation),
        );
        (signer, users)
    }

    fn ada() -> Registration {
        Registration {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            password: "analytical".into(),
        }
    }

    #[tokio::test]
    async fn register_then_login() {
        let (signer, users) = service();
        let user = users.register(ada()).await.unwrap();
        assert!(!user.credential.is_federated());

        let session = users.login(" ADA@example.com ", "analytical").await.unwrap();
        assert_eq!(session.user.id, user.id);
        assert_eq!(session.expires_in, 3600);
        assert_eq!(signer.verify(&session.token).unwrap().sub, user.id);
    }

    #[tokio::test]
    async fn short_password_rejected() {
        let (_, users) = service();
        let err = users
            .register(Registration {
                password: "12345".into(),
                ..ada()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let (_, users) = service();
        users.register(ada()).await.unwrap();
        let err = users.register(ada()).await.unwrap_err();
        assert_eq!(err, EngineError::Conflict("Email already exists".into()));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_alike() {
        let (_, users) = service();
        users.register(ada()).await.unwrap();

        let wrong = users.login("ada@example.com", "babbage").await.unwrap_err();
        let unknown = users.login("nobody@example.com", "analytical").await.unwrap_err();
        assert_eq!(wrong, unknown);
        assert_eq!(wrong, EngineError::Unauthenticated(BAD_LOGIN.into()));
    }

    #[tokio::test]
    async fn federated_login_creates_passwordless_user_once() {
        let (_, users) = service();
        let first = users.federated_login("grace-token").await.unwrap();
        assert!(first.user.credential.is_federated());
        assert_eq!(first.user.credential.password_hash(), None);
        assert_eq!(first.user.email, "grace@example.com");
        assert_eq!(first.user.photo_url, "https://img.example.com/g.png");

        let again = users.federated_login("grace-token").await.unwrap();
        assert_eq!(again.user.id, first.user.id);
        assert_eq!(users.list().await.unwrap().len(), 1);

        let err = users.login("grace@example.com", "").await.unwrap_err();
        assert!(matches!(err, EngineError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn federated_login_links_existing_email() {
        let (_, users) = service();
        let local = users
            .register(Registration {
                email: "grace@example.com".into(),
                ..ada()
            })
            .await
            .unwrap();
        let session = users.federated_login("grace-token").await.unwrap();
        assert_eq!(session.user.id, local.id);
    }

    #[tokio::test]
    async fn unknown_federated_token_is_unauthenticated() {
        let (_, users) = service();
        let err = users.federated_login("forged").await.unwrap_err();
        assert_eq!(err, EngineError::Unauthenticated("Federated login failed".into()));
    }

    #[tokio::test]
    async fn profile_update_ignores_blank_fields() {
        let (_, users) = service();
        let user = users.register(ada()).await.unwrap();
        let who = AuthenticatedIdentity::new(user.id);

        let updated = users
            .update_profile(
                who,
                ProfileUpdate {
                    first_name: Some("  ".into()),
                    bio: Some("Mathematician".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.first_name, "Ada");
        assert_eq!(updated.bio, "Mathematician");
        assert_eq!(users.get(who).await.unwrap().bio, "Mathematician");
    }

    #[tokio::test]
    async fn serialized_user_has_no_credential() {
        let (_, users) = service();
        let user = users.register(ada()).await.unwrap();
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("credential").is_none());
        assert_eq!(json["firstName"], "Ada");
    }
}
