//! Business logic services

pub mod access_policy;
pub mod reading_sessions;
pub mod returns;

use crate::{config::AccessConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub access_policy: access_policy::AccessPolicyService,
    pub reading_sessions: reading_sessions::ReadingSessionsService,
    pub returns: returns::ReturnsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, access_config: AccessConfig) -> Self {
        let access_policy = access_policy::AccessPolicyService::new(
            repository.clone(),
            access_config.cooldown_hours,
        );
        Self {
            reading_sessions: reading_sessions::ReadingSessionsService::new(
                repository.clone(),
                access_policy.clone(),
            ),
            returns: returns::ReturnsService::new(repository, access_config.fine_due_days),
            access_policy,
        }
    }
}
