use crate::application_port::AuthError;
use crate::domain_model::{Principal, Role, SubjectId};
use crate::domain_port::{PrincipalDirectory, PrincipalRecord};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

/// Read-only adapter over the user directory's `principal` table. This
/// subsystem never writes to it.
pub struct MySqlPrincipalDirectory {
    pool: MySqlPool,
}

impl MySqlPrincipalDirectory {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlPrincipalDirectory { pool }
    }

    #[inline]
    fn subject_as_bytes(subject: &SubjectId) -> &[u8] {
        subject.0.as_bytes()
    }

    #[inline]
    fn subject_from_bytes(bytes: &[u8]) -> Result<SubjectId, AuthError> {
        Ok(SubjectId(
            Uuid::from_slice(bytes).map_err(|e| AuthError::Store(e.to_string()))?,
        ))
    }

    fn parse_role(role: &str) -> Result<Role, AuthError> {
        match role {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(AuthError::Store(format!("unknown role: {other}"))),
        }
    }

    fn row_to_record(row: MySqlRow) -> Result<PrincipalRecord, AuthError> {
        let subject_bytes: Vec<u8> = row
            .try_get("subject")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let subject = Self::subject_from_bytes(&subject_bytes)?;

        let email: String = row
            .try_get("email")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let role: String = row
            .try_get("role")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let password_hash: String = row
            .try_get("password_hash")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let is_active: bool = row
            .try_get("is_active")
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(PrincipalRecord {
            subject,
            email,
            role: Self::parse_role(&role)?,
            password_hash,
            is_active,
        })
    }
}

#[async_trait::async_trait]
impl PrincipalDirectory for MySqlPrincipalDirectory {
    async fn find_by_subject(&self, subject: SubjectId) -> Result<Option<Principal>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT subject, email, role, password_hash, is_active
FROM principal
WHERE subject = ? AND is_active = TRUE
"#,
        )
        .bind(Self::subject_as_bytes(&subject))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        let record = row_opt.map(Self::row_to_record).transpose()?;
        Ok(record.map(|r| Principal {
            subject: r.subject,
            role: r.role,
            email: Some(r.email),
        }))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<PrincipalRecord>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT subject, email, role, password_hash, is_active
FROM principal
WHERE email = ?
"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        row_opt.map(Self::row_to_record).transpose()
    }
}
