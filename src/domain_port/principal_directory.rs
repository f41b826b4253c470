use crate::application_port::AuthError;
use crate::domain_model::{Principal, Role, SubjectId};

/// Directory row as needed for login. The password hash never travels past
/// the login handler.
#[derive(Debug, Clone)]
pub struct PrincipalRecord {
    pub subject: SubjectId,
    pub email: String,
    pub role: Role,
    pub password_hash: String,
    pub is_active: bool,
}

/// The external user directory. This subsystem only reads from it; account
/// management lives elsewhere.
#[async_trait::async_trait]
pub trait PrincipalDirectory: Send + Sync {
    async fn find_by_subject(&self, subject: SubjectId) -> Result<Option<Principal>, AuthError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<PrincipalRecord>, AuthError>;
}
