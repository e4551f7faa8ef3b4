use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::db::{
    Repository,
    error::Result,
    model::{PermissionGrant, ProposalName, Visit, VisitName},
};

/// The already-verified login of whoever sent the request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);
impl Identity {
    #[must_use]
    pub fn new(login: impl Into<String>) -> Self {
        Self(login.into())
    }

    #[must_use]
    pub fn login(&self) -> &str {
        let Self(login) = self;
        login
    }
}

/// Something a top-level field exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource<'a> {
    Proposal(&'a ProposalName),
    Visit(&'a VisitName),
    Beamline(&'a str),
    DataCollection(u32),
    Sample(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    Allowed,
    /// Nobody is logged in.
    Unauthenticated,
    /// Somebody is logged in, but may not see this.
    Forbidden,
}

const ADMIN_SUFFIX: &str = "_admin";

/// The class of instrument a beamline belongs to, which admin permissions are scoped by.
#[must_use]
pub fn beamline_class(beamline: &str) -> Option<&'static str> {
    match beamline {
        "i02" | "i02-1" | "i02-2" | "i03" | "i04" | "i04-1" | "i23" | "i24" => Some("mx"),
        _ => None,
    }
}

/// Beamline classes the permissions make someone an admin for. `mx_admin` grants `mx`.
pub fn admin_classes(grants: &[PermissionGrant]) -> HashSet<&str> {
    grants
        .iter()
        .filter_map(|g| g.permission_type.strip_suffix(ADMIN_SUFFIX))
        .collect()
}

async fn is_beamline_admin(
    repository: &dyn Repository,
    identity: &Identity,
    beamline: Option<&str>,
) -> Result<bool> {
    let Some(class) = beamline.and_then(beamline_class) else {
        return Ok(false);
    };

    let grants = repository.permissions(identity.login()).await?;

    Ok(admin_classes(&grants).contains(class))
}

async fn may_see_visit(
    repository: &dyn Repository,
    identity: &Identity,
    visit: &Visit,
) -> Result<bool> {
    let Visit { session, .. } = visit;

    if repository
        .session_has_person(session.session_id, identity.login())
        .await?
    {
        return Ok(true);
    }

    is_beamline_admin(repository, identity, session.beamline_name.as_deref()).await
}

/// Treats a missing resource as one the identity may not see, so that existence is not leaked.
fn found<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err),
    }
}

/// Decides whether `identity` may see `resource`.
///
/// * proposals: members of the proposal
/// * visits: members of the session, and admins for the beamline's class
/// * beamlines: admins for the beamline's class
/// * data collections: whoever may see the owning visit, and members of the owning proposal
/// * samples: members of the owning proposal
///
/// # Errors
/// Only when the permission lookups themselves fail.
pub async fn authorize(
    repository: &dyn Repository,
    identity: Option<&Identity>,
    resource: Resource<'_>,
) -> Result<Access> {
    let Some(identity) = identity else {
        return Ok(Access::Unauthenticated);
    };
    let login = identity.login();

    let allowed = match resource {
        Resource::Proposal(name) => match found(repository.proposal(name).await)? {
            Some(proposal) => {
                repository
                    .proposal_has_person(proposal.proposal_id, login)
                    .await?
            }
            None => false,
        },
        Resource::Visit(name) => match found(repository.visit(name).await)? {
            Some(visit) => may_see_visit(repository, identity, &visit).await?,
            None => false,
        },
        Resource::Beamline(name) => is_beamline_admin(repository, identity, Some(name)).await?,
        Resource::DataCollection(dcid) => {
            let session_id = repository
                .data_collections(&[dcid])
                .await?
                .into_iter()
                .find_map(|row| row.session_id);

            match session_id {
                Some(session_id) => match found(repository.visit_by_id(session_id).await)? {
                    Some(visit) => {
                        repository
                            .proposal_has_person(visit.proposal.proposal_id, login)
                            .await?
                            || may_see_visit(repository, identity, &visit).await?
                    }
                    None => false,
                },
                None => false,
            }
        }
        Resource::Sample(sample_id) => match repository.sample_proposal_id(sample_id).await? {
            Some(proposal_id) => repository.proposal_has_person(proposal_id, login).await?,
            None => false,
        },
    };

    let access = if allowed {
        Access::Allowed
    } else {
        Access::Forbidden
    };
    tracing::debug!(login, ?resource, ?access, "authorization decision");

    Ok(access)
}
