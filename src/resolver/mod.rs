//! Website lookup strategies
//!
//! Both strategies sit behind [`SiteResolver`]. A lookup never fails the
//! batch: every error is logged and reported as "no site".

pub mod portal;
pub mod search;

use async_trait::async_trait;

use crate::config::ResolverStrategy;
use crate::entity::Entity;

pub use portal::{extract_site_link, CascadeRule, PortalResolver, PortalSelectors, PortalSession, SiteLink};
pub use search::SearchResolver;

#[async_trait]
pub trait SiteResolver: Send {
    /// Which input column identifies an entity for this resolver
    fn strategy(&self) -> ResolverStrategy;

    /// Candidate website for `entity`, or `None` when nothing qualifies
    async fn resolve_site(&mut self, entity: &Entity) -> Option<String>;

    /// Release any session held for the batch. Must be safe to call twice.
    fn close(&mut self) {}
}
