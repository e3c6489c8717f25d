pub mod mutations;
pub mod queries;
pub mod schema;

use async_graphql::{Context, Result};

use crate::config::MomentsConfig;
use crate::extractors::CurrentUser;
use crate::state::DbPool;

pub use schema::{build_schema, MomentsSchema};

/// Per-request data every resolver needs. The HTTP handler injects all three.
pub(crate) fn request_data<'a>(
    ctx: &Context<'a>,
) -> Result<(&'a DbPool, &'a MomentsConfig, &'a CurrentUser)> {
    Ok((
        ctx.data::<DbPool>()?,
        ctx.data::<MomentsConfig>()?,
        ctx.data::<CurrentUser>()?,
    ))
}
