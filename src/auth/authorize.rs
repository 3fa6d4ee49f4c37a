use thiserror::Error;

use super::session::{PrivilegeLevel, Session};

/// A request, described by the entities it touches.
///
/// User operations carry the target's org once it is known. Org-level
/// callers need it; everyone else is decided on ids alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation<'a> {
    CreateOrg,
    ReadOrg { org: &'a str },
    UpdateOrg { org: &'a str },
    CreateUser { org: &'a str },
    ReadUser { user: &'a str, org: Option<&'a str> },
    UpdateUser { user: &'a str, org: Option<&'a str> },
    UpdateSelf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Forbidden")]
pub struct Forbidden;

/// Pure decision table, no store access
pub fn can_perform(session: &Session, op: &Operation<'_>) -> Decision {
    use Operation::*;
    use PrivilegeLevel as P;

    let allowed = match (session.privilege, *op) {
        (P::Root, _) => true,
        (_, UpdateSelf) => true,
        (_, ReadOrg { org }) => org == session.org.id,
        (P::Org, CreateUser { org }) => org == session.org.id,
        (P::Org, ReadUser { org, .. }) | (P::Org, UpdateUser { org, .. }) => {
            org == Some(session.org.id.as_str())
        }
        (P::User, ReadUser { user, .. }) => user == session.user.id,
        _ => false,
    };

    if allowed {
        Decision::Allow
    } else {
        Decision::Deny
    }
}

pub fn authorize(session: &Session, op: &Operation<'_>) -> Result<(), Forbidden> {
    match can_perform(session, op) {
        Decision::Allow => Ok(()),
        Decision::Deny => Err(Forbidden),
    }
}
