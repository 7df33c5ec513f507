//! The `Execute` trait implemented by every engine command.
//!
//! Commands are structs where the fields ARE the parameters. Each command
//! receives the context plus the acting identity; there is no ambient
//! current-user anywhere in the engine.

use crate::context::CollectionsContext;
use crate::error::Result;
use crate::types::Actor;
use async_trait::async_trait;

/// A single engine operation.
#[async_trait]
pub trait Execute {
    /// What the operation yields on success.
    type Output;

    async fn execute(&self, ctx: &CollectionsContext, actor: &Actor) -> Result<Self::Output>;
}
