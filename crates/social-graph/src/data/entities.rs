//! Domain entities of the social graph: users and the FOLLOW relationship

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data::identifiers::ElementId;

/// Postal address nested inside a [`User`].
///
/// Stored flattened on the user vertex under the `address_` namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub address_line: Option<String>,
    pub zip_code: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

impl Address {
    /// True when no field carries a value. An empty address is stored the
    /// same way as an absent one.
    pub fn is_empty(&self) -> bool {
        self.address_line.is_none()
            && self.zip_code.is_none()
            && self.city.is_none()
            && self.state.is_none()
            && self.country.is_none()
    }
}

/// A user vertex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Server-generated on insert; ignored when supplied by callers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ElementId>,
    /// Unique across all users, case-sensitive as stored.
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
}

impl User {
    pub fn new(username: impl Into<String>, name: Option<&str>) -> Self {
        Self {
            id: None,
            username: username.into(),
            name: name.map(str::to_string),
            address: None,
        }
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }
}

/// Reference from an edge to one of its endpoint users.
///
/// The codec only ever produces `Lazy` references carrying the endpoint id;
/// repositories replace them with `Loaded` users when they fetch endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserRef {
    Loaded(User),
    Lazy { id: ElementId },
}

impl UserRef {
    pub fn lazy(id: impl Into<ElementId>) -> Self {
        UserRef::Lazy { id: id.into() }
    }

    /// Identifier of the referenced user, if known.
    pub fn id(&self) -> Option<&ElementId> {
        match self {
            UserRef::Loaded(user) => user.id.as_ref(),
            UserRef::Lazy { id } => Some(id),
        }
    }

    pub fn as_user(&self) -> Option<&User> {
        match self {
            UserRef::Loaded(user) => Some(user),
            UserRef::Lazy { .. } => None,
        }
    }
}

/// A FOLLOW edge from `source` (OUT vertex) to `target` (IN vertex).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowEdge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ElementId>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub start_period: Option<NaiveDate>,
    #[serde(default)]
    pub end_period: Option<NaiveDate>,
    /// The followed user.
    #[serde(default, rename = "in", skip_serializing_if = "Option::is_none")]
    pub target: Option<UserRef>,
    /// The following user.
    #[serde(default, rename = "out", skip_serializing_if = "Option::is_none")]
    pub source: Option<UserRef>,
}

impl FollowEdge {
    pub fn with_status(status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
            ..Self::default()
        }
    }
}
