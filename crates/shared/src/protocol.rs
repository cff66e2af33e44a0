use serde::{Deserialize, Serialize};

use crate::domain::{PostId, Timestamp};

/// A post as held by the remote store. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub body: String,
    pub author: String,
    pub timestamp: Timestamp,
}

/// Body of a create call. Id and timestamp are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub body: String,
    pub author: String,
}
