use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{required, TypeError};
use crate::id::UserId;

/// Longest accepted profile bio, in characters.
pub const MAX_BIO_LEN: usize = 500;

/// How a user proves their identity.
///
/// Exactly one method exists per user: a federated account carries no
/// password at all.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Local account with a password digest.
    Password { hash: String },
    /// Account backed by an external identity provider.
    Federated { provider: String, subject: String },
}

impl Credential {
    pub fn password_hash(&self) -> Option<&str> {
        match self {
            Self::Password { hash } => Some(hash),
            Self::Federated { .. } => None,
        }
    }

    pub fn is_federated(&self) -> bool {
        matches!(self, Self::Federated { .. })
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Password { .. } => write!(f, "Password(<redacted>)"),
            Self::Federated { provider, subject } => {
                write!(f, "Federated({provider}:{subject})")
            }
        }
    }
}

/// Input for creating a user.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub credential: Credential,
    pub photo_url: Option<String>,
}

/// A registered user. The credential is never serialized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip)]
    pub credential: Credential,
    pub photo_url: String,
    pub bio: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    pub instagram: String,
    pub linkedin: String,
    pub github: String,
    pub facebook: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Validate input and build a new user record.
    pub fn new(input: NewUser) -> Result<Self, TypeError> {
        let email = normalize_email(&input.email)?;
        let first_name = required("firstName", &input.first_name)?;
        let last_name = required("lastName", &input.last_name)?;
        if let Credential::Federated { provider, subject } = &input.credential {
            required("provider", provider)?;
            required("subject", subject)?;
        }
        let now = Utc::now();
        Ok(Self {
            id: UserId::new(),
            email,
            first_name,
            last_name,
            credential: input.credential,
            photo_url: input.photo_url.unwrap_or_default(),
            bio: String::new(),
            occupation: None,
            instagram: String::new(),
            linkedin: String::new(),
            github: String::new(),
            facebook: String::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Public fields shown next to authored content.
    pub fn summary(&self) -> AuthorSummary {
        AuthorSummary {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            photo_url: self.photo_url.clone(),
        }
    }

    /// Apply a profile update. Blank fields are ignored.
    pub fn apply_profile(&mut self, update: ProfileUpdate) -> Result<(), TypeError> {
        fn filled(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        if let Some(bio) = filled(update.bio.clone()) {
            if bio.chars().count() > MAX_BIO_LEN {
                return Err(TypeError::invalid(
                    "bio",
                    format!("at most {MAX_BIO_LEN} characters"),
                ));
            }
            self.bio = bio;
        }
        if let Some(v) = filled(update.first_name) {
            self.first_name = v;
        }
        if let Some(v) = filled(update.last_name) {
            self.last_name = v;
        }
        if let Some(v) = filled(update.occupation) {
            self.occupation = Some(v);
        }
        if let Some(v) = filled(update.instagram) {
            self.instagram = v;
        }
        if let Some(v) = filled(update.facebook) {
            self.facebook = v;
        }
        if let Some(v) = filled(update.linkedin) {
            self.linkedin = v;
        }
        if let Some(v) = filled(update.github) {
            self.github = v;
        }
        if let Some(v) = filled(update.photo_url) {
            self.photo_url = v;
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Author fields embedded in blog and comment listings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub photo_url: String,
}

/// Partial profile update.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub occupation: Option<String>,
    pub bio: Option<String>,
    pub instagram: Option<String>,
    pub facebook: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub photo_url: Option<String>,
}

/// Trim, lowercase, and structurally check an email address.
pub fn normalize_email(raw: &str) -> Result<String, TypeError> {
    let email = required("email", raw)?.to_lowercase();
    let Some((local, domain)) = email.split_once('@') else {
        return Err(TypeError::invalid("email", "missing @"));
    };
    let domain_ok = domain
        .rsplit_once('.')
        .map(|(host, tld)| !host.is_empty() && tld.len() >= 2)
        .unwrap_or(false);
    if local.is_empty() || !domain_ok || domain.contains('@') || email.contains(char::is_whitespace)
    {
        return Err(TypeError::invalid("email", "malformed address"));
    }
    Ok(email)
}
