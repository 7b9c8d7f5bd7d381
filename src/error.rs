use warp::reject::Reject;

/// Reasons a username, password, or email fails the credential policy.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Username must be between 2 and 50 characters")]
    InvalidLength,
    #[error("Username may only contain letters, digits, underscores, and hyphens")]
    InvalidCharacter,
    #[error("Username must not start or end with whitespace")]
    LeadingOrTrailingWhitespace,
    #[error("Password must be at least 12 characters")]
    TooShort,
    #[error("Password must contain at least one uppercase letter")]
    MissingUppercase,
    #[error("Password must contain at least one lowercase letter")]
    MissingLowercase,
    #[error("Password must contain at least one digit")]
    MissingDigit,
    #[error("Password must contain at least one special character")]
    MissingSpecialChar,
    #[error("Invalid email address format")]
    InvalidEmail,
}

/// Reasons a bearer token fails verification.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    #[error("token could not be decoded")]
    Malformed,
    #[error("token signature does not match")]
    BadSignature,
    #[error("token has expired")]
    Expired,
}

/// Errors surfaced by the persistence collaborator.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("a user with that username already exists")]
    DuplicateUsername,
    #[error("no user with that id")]
    NotFound,
    #[error("error during storage operation")]
    Backend {
        #[from]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("an account with that username already exists")]
    DuplicateUsername,
    #[error("username or password incorrect")]
    InvalidCredentials,
    #[error("user not found")]
    NotFound,
    #[error("token subject no longer exists")]
    IdentityGone,
    #[error(transparent)]
    Policy(#[from] PolicyError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("failed to sign access token")]
    TokenIssue {
        #[from]
        source: jsonwebtoken::errors::Error,
    },
    #[error("failed to hash password")]
    Hash {
        #[from]
        source: argon2::Error,
    },
    #[error("error during storage operation")]
    Store {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUsername => AuthError::DuplicateUsername,
            StoreError::NotFound => AuthError::NotFound,
            StoreError::Backend { source } => AuthError::Store { source },
        }
    }
}

impl Reject for AuthError {}
