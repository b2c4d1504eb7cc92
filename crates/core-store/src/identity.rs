//! Identity capability with an e-mail domain allow-list.

use std::future::Future;
use thiserror::Error;
use tokio::sync::watch;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Invalid e-mail address: {0}")]
    InvalidEmail(String),
    #[error("Access restricted to {0} accounts only")]
    Restricted(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Filesystem-safe owner id derived from the e-mail address.
    pub id: String,
    pub email: String,
}

impl User {
    pub fn from_email(email: &str) -> Self {
        let email = email.trim().to_ascii_lowercase();
        let id = email
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        Self { id, email }
    }

    /// Part before `@`, used as a short display name.
    pub fn display_name(&self) -> &str {
        self.email.split('@').next().unwrap_or("User")
    }
}

/// Domains whose addresses may sign in. An empty list admits everyone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainAllowList {
    domains: Vec<String>,
}

impl DomainAllowList {
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            domains: domains
                .into_iter()
                .map(|d| d.as_ref().trim().trim_start_matches('@').to_ascii_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    pub fn check(&self, email: &str) -> Result<(), IdentityError> {
        let email = email.trim().to_ascii_lowercase();
        let Some((local, domain)) = email.rsplit_once('@') else {
            return Err(IdentityError::InvalidEmail(email));
        };
        if local.is_empty() || domain.is_empty() {
            return Err(IdentityError::InvalidEmail(email));
        }
        if self.domains.is_empty() || self.domains.iter().any(|d| d == domain) {
            Ok(())
        } else {
            Err(IdentityError::Restricted(self.domains.join(", ")))
        }
    }
}

pub trait IdentityProvider: Send + Sync {
    fn sign_in(&self, email: &str) -> impl Future<Output = Result<User, IdentityError>> + Send;
    fn sign_out(&self) -> impl Future<Output = ()> + Send;
    fn current_user(&self) -> Option<User>;
    /// Session-change notifications; the current value is the signed-in user.
    fn subscribe(&self) -> watch::Receiver<Option<User>>;
}

/// Identity provider for a single local operator. Sign-in succeeds for any
/// allow-listed address without a round trip.
#[derive(Debug)]
pub struct LocalIdentity {
    allow: DomainAllowList,
    session: watch::Sender<Option<User>>,
}

impl LocalIdentity {
    pub fn new(allow: DomainAllowList) -> Self {
        let (session, _) = watch::channel(None);
        Self { allow, session }
    }
}

impl IdentityProvider for LocalIdentity {
    async fn sign_in(&self, email: &str) -> Result<User, IdentityError> {
        if let Err(err) = self.allow.check(email) {
            tracing::warn!(target: "identity", %err, "sign_in_rejected");
            return Err(err);
        }
        let user = User::from_email(email);
        tracing::info!(target: "identity", user = user.id.as_str(), "signed_in");
        self.session.send_replace(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) {
        if self.session.send_replace(None).is_some() {
            tracing::info!(target: "identity", "signed_out");
        }
    }

    fn current_user(&self) -> Option<User> {
        self.session.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.session.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_matches_domain_exactly() {
        let allow = DomainAllowList::new(["@Infocusp.com"]);
        assert!(allow.check("dev@infocusp.com").is_ok());
        assert!(allow.check(" Dev@INFOCUSP.com ").is_ok());
        assert_eq!(
            allow.check("dev@evil-infocusp.com"),
            Err(IdentityError::Restricted("infocusp.com".into()))
        );
        assert!(matches!(allow.check("nobody"), Err(IdentityError::InvalidEmail(_))));
        assert!(matches!(allow.check("@infocusp.com"), Err(IdentityError::InvalidEmail(_))));
    }

    #[test]
    fn empty_allow_list_admits_everyone() {
        assert!(DomainAllowList::default().check("a@b.c").is_ok());
    }

    #[test]
    fn user_id_is_path_safe() {
        let u = User::from_email("Jane.Doe@Example.com");
        assert_eq!(u.id, "jane-doe-example-com");
        assert_eq!(u.display_name(), "jane.doe");
    }

    #[tokio::test]
    async fn session_changes_are_observable() {
        let idp = LocalIdentity::new(DomainAllowList::new(["example.com"]));
        let mut rx = idp.subscribe();
        assert_eq!(idp.current_user(), None);

        assert!(idp.sign_in("x@other.org").await.is_err());
        assert_eq!(idp.current_user(), None);

        let user = idp.sign_in("me@example.com").await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_ref(), Some(&user));

        idp.sign_out().await;
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), None);
    }
}
