//! Wire types shared between the post store client and its front ends.

pub mod domain;
pub mod error;
pub mod protocol;
