use async_trait::async_trait;

use crate::context::Context;
use crate::error::Result;
use crate::listing::{parse_list_reply, ListLoader, ListQuery, ListResult, ListSource};
use crate::model::Coach;

pub const COACHES_PATH: &str = "/api/coaches";
pub const SPECIALTY_PARAM: &str = "specialty";
pub const EMPTY_MESSAGE: &str = "No coaches found";
pub const FAILURE_MESSAGE: &str = "Failed to load coaches";

/// The marketplace listing endpoint.
pub struct CoachDirectory {
    ctx: Context,
}

impl CoachDirectory {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ListSource<Coach> for CoachDirectory {
    async fn fetch(&self, query: &ListQuery) -> Result<ListResult<Coach>> {
        let mut url = self.ctx.config.endpoint(COACHES_PATH)?;
        url.query_pairs_mut()
            .extend_pairs(query.params(SPECIALTY_PARAM));
        let reply = self.ctx.transport.get(url).await?;
        parse_list_reply(&reply, query)
    }
}

pub type Marketplace = ListLoader<Coach, CoachDirectory>;

pub fn marketplace(ctx: Context) -> Marketplace {
    ListLoader::new(CoachDirectory::new(ctx.clone()), ctx.config).with_failure_message(FAILURE_MESSAGE)
}
