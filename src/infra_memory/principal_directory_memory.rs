use crate::application_port::AuthError;
use crate::domain_model::{Principal, SubjectId};
use crate::domain_port::{PrincipalDirectory, PrincipalRecord};
use dashmap::DashMap;

/// Directory stand-in for dev and tests. Seeded at construction or via
/// [`MemoryPrincipalDirectory::insert`]; no TTL, principals live forever.
#[derive(Default)]
pub struct MemoryPrincipalDirectory {
    by_subject: DashMap<SubjectId, PrincipalRecord>,
}

impl MemoryPrincipalDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: PrincipalRecord) {
        self.by_subject.insert(record.subject, record);
    }
}

#[async_trait::async_trait]
impl PrincipalDirectory for MemoryPrincipalDirectory {
    async fn find_by_subject(&self, subject: SubjectId) -> Result<Option<Principal>, AuthError> {
        Ok(self.by_subject.get(&subject).map(|record| Principal {
            subject: record.subject,
            role: record.role,
            email: Some(record.email.clone()),
        }))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<PrincipalRecord>, AuthError> {
        Ok(self
            .by_subject
            .iter()
            .find(|record| record.email == email)
            .map(|record| record.value().clone()))
    }
}
