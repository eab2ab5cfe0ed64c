use serde::{Deserialize, Serialize};

use super::MemberId;

/// An authenticated member of the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
}

impl Member {
    pub fn new(id: MemberId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Identity a task runs on behalf of.
///
/// Unauthenticated requests carry the configured public actor id instead of
/// a member; nothing reads identity from ambient state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Actor {
    Public { id: MemberId },
    Member(Member),
}

impl Actor {
    /// Resolve the actor for a request, falling back to the public actor.
    pub fn resolve(member: Option<Member>, public_actor_id: MemberId) -> Self {
        match member {
            Some(member) => Self::Member(member),
            None => Self::Public {
                id: public_actor_id,
            },
        }
    }

    pub fn id(&self) -> MemberId {
        match self {
            Self::Public { id } => *id,
            Self::Member(member) => member.id,
        }
    }

}
