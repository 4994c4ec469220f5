//! Visibility of content items inside a shared portfolio.
//!
//! Rules, in order:
//! 1. The creator always sees their item.
//! 2. Items outside any portfolio are creator-only.
//! 3. Everyone else must be a member of the item's portfolio.
//! 4. Personal items stay creator-only even inside a portfolio.
//! 5. Organizational items are visible to members who hold a grant for one
//!    of the organizations the item references.
//!
//! The publish target is authoritative when present. Publication records
//! only classify legacy items that carry no publish target.

use std::collections::{BTreeSet, HashMap, HashSet};

use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use tracing::debug;

use entity::{organization_grant, post, post_publication};

use crate::error::{PortfolioError, Result};
use crate::service::PortfolioService;

pub const PERSONAL_TARGET: &str = "personal";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "organizationId")]
pub enum PublishTarget {
    Personal,
    Organization(String),
}

impl PublishTarget {
    /// None for an absent or blank target.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
        if raw.eq_ignore_ascii_case(PERSONAL_TARGET) {
            Some(Self::Personal)
        } else {
            Some(Self::Organization(raw.to_string()))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visibility {
    Personal,
    /// Organizations referenced by the item.
    Organizational(BTreeSet<String>),
}

/// A post as the access predicate sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: String,
    pub user_id: String,
    pub portfolio_id: Option<String>,
    pub publish_target: Option<PublishTarget>,
    /// Organization ids named by the item's publication records.
    pub publication_orgs: Vec<String>,
}

impl ContentItem {
    pub fn from_models(post: &post::Model, publications: &[post_publication::Model]) -> Self {
        Self {
            id: post.id.clone(),
            user_id: post.user_id.clone(),
            portfolio_id: post.portfolio_id.clone(),
            publish_target: PublishTarget::parse(post.publish_target.as_deref()),
            publication_orgs: publications
                .iter()
                .filter_map(|p| p.organization_id.as_deref())
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn visibility(&self) -> Visibility {
        match &self.publish_target {
            Some(PublishTarget::Personal) => Visibility::Personal,
            Some(PublishTarget::Organization(org)) => {
                Visibility::Organizational(BTreeSet::from([org.clone()]))
            }
            None if self.publication_orgs.is_empty() => Visibility::Personal,
            None => Visibility::Organizational(self.publication_orgs.iter().cloned().collect()),
        }
    }
}

/// Everything the predicate needs to know about the requesting user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: String,
    /// Portfolio the viewer owns or has joined.
    pub portfolio_id: Option<String>,
    pub organization_ids: HashSet<String>,
}

impl Viewer {
    pub fn can_see(&self, item: &ContentItem) -> bool {
        if item.user_id == self.user_id {
            return true;
        }

        let Some(item_portfolio) = item.portfolio_id.as_deref() else {
            return false;
        };
        if self.portfolio_id.as_deref() != Some(item_portfolio) {
            return false;
        }

        match item.visibility() {
            Visibility::Personal => false,
            Visibility::Organizational(orgs) => {
                orgs.iter().any(|org| self.organization_ids.contains(org))
            }
        }
    }
}

impl PortfolioService {
    /// Organizations the user has independently authorized.
    pub async fn organization_grants(&self, user_id: &str) -> Result<HashSet<String>> {
        let grants = organization_grant::Entity::find()
            .filter(organization_grant::Column::UserId.eq(user_id))
            .all(&self.db)
            .await?;
        Ok(grants.into_iter().map(|g| g.organization_id).collect())
    }

    pub async fn load_viewer(&self, user_id: &str) -> Result<Viewer> {
        let portfolio_id = self.get_portfolio_for_user(user_id).await?.map(|p| p.id);
        let organization_ids = if portfolio_id.is_some() {
            self.organization_grants(user_id).await?
        } else {
            HashSet::new()
        };

        Ok(Viewer {
            user_id: user_id.to_string(),
            portfolio_id,
            organization_ids,
        })
    }

    pub async fn load_content_item(&self, item_id: &str) -> Result<Option<ContentItem>> {
        let Some(post) = post::Entity::find_by_id(item_id.to_string())
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let publications = post_publication::Entity::find()
            .filter(post_publication::Column::PostId.eq(post.id.clone()))
            .all(&self.db)
            .await?;

        Ok(Some(ContentItem::from_models(&post, &publications)))
    }

    pub async fn can_access(&self, user_id: &str, item_id: &str) -> Result<bool> {
        let item = self
            .load_content_item(item_id)
            .await?
            .ok_or(PortfolioError::NotFound("Post"))?;

        if item.user_id == user_id {
            return Ok(true);
        }

        let viewer = self.load_viewer(user_id).await?;
        let allowed = viewer.can_see(&item);
        debug!(user_id = %user_id, item_id = %item_id, allowed, "Access check");
        Ok(allowed)
    }

    /// Keep only the items the user may see.
    ///
    /// A user with no portfolio can only see their own items, so the
    /// membership and grant lookups are skipped entirely.
    pub async fn filter_accessible_items(&self, user_id: &str, items: Vec<ContentItem>) -> Result<Vec<ContentItem>> {
        let Some(portfolio) = self.get_portfolio_for_user(user_id).await? else {
            return Ok(items.into_iter().filter(|i| i.user_id == user_id).collect());
        };

        let viewer = Viewer {
            user_id: user_id.to_string(),
            portfolio_id: Some(portfolio.id),
            organization_ids: self.organization_grants(user_id).await?,
        };
        Ok(items.into_iter().filter(|i| viewer.can_see(i)).collect())
    }

    /// The user's own posts plus the posts of their portfolio they may see,
    /// newest first.
    pub async fn list_accessible_items(&self, user_id: &str) -> Result<Vec<ContentItem>> {
        let viewer = self.load_viewer(user_id).await?;

        let mut scope = Condition::any().add(post::Column::UserId.eq(user_id));
        if let Some(portfolio_id) = viewer.portfolio_id.as_deref() {
            scope = scope.add(post::Column::PortfolioId.eq(portfolio_id));
        }

        let posts = post::Entity::find()
            .filter(scope)
            .order_by_desc(post::Column::CreatedAt)
            .all(&self.db)
            .await?;
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = posts.iter().map(|p| p.id.clone()).collect();
        let mut publications: HashMap<String, Vec<post_publication::Model>> = HashMap::new();
        for publication in post_publication::Entity::find()
            .filter(post_publication::Column::PostId.is_in(ids))
            .all(&self.db)
            .await?
        {
            publications.entry(publication.post_id.clone()).or_default().push(publication);
        }

        Ok(posts
            .iter()
            .map(|p| {
                let pubs = publications.get(&p.id).map(Vec::as_slice).unwrap_or(&[]);
                ContentItem::from_models(p, pubs)
            })
            .filter(|item| viewer.can_see(item))
            .collect())
    }
}
