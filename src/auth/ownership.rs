//! Resolution of a verified identity plus a target id into a handle on a
//! resource the identity owns.
//!
//! Ownership is derived, never trusted from the request: the caller's
//! portfolio is looked up from the identity, and every child record is
//! fetched with a single predicate on both its id and that portfolio id.
//! A record that exists under someone else's portfolio resolves exactly
//! like one that does not exist at all.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::Identity;
use crate::error::Error;
use crate::store::Store;
use crate::types::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Portfolio,
    Project,
    Achievement,
    Like,
}

impl ResourceKind {
    /// Name of the record a lookup of this kind targets.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::Portfolio => "Portfolio",
            // A like is addressed by its project.
            ResourceKind::Project | ResourceKind::Like => "Project",
            ResourceKind::Achievement => "Achievement",
        }
    }
}

/// What a request wants to act on, before ownership is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceLocator {
    Portfolio,
    Project(i64),
    Achievement(i64),
    Like { project_id: i64 },
}

impl ResourceLocator {
    #[must_use]
    pub fn kind(self) -> ResourceKind {
        match self {
            ResourceLocator::Portfolio => ResourceKind::Portfolio,
            ResourceLocator::Project(_) => ResourceKind::Project,
            ResourceLocator::Achievement(_) => ResourceKind::Achievement,
            ResourceLocator::Like { .. } => ResourceKind::Like,
        }
    }
}

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("identity has no portfolio")]
    PortfolioMissing,

    #[error("resource not found")]
    NotFound,

    #[error(transparent)]
    Storage(Error),
}

impl From<Error> for ResourceError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound => ResourceError::NotFound,
            other => ResourceError::Storage(other),
        }
    }
}

/// A resource proven to belong to the portfolio of the identity that
/// resolved it. Only the resolvers in this module construct one.
#[derive(Debug, Clone)]
pub struct Owned<T> {
    portfolio_id: i64,
    resource: T,
}

impl<T> Owned<T> {
    #[must_use]
    pub fn portfolio_id(&self) -> i64 {
        self.portfolio_id
    }

    #[must_use]
    pub fn get(&self) -> &T {
        &self.resource
    }

    #[must_use]
    pub fn into_inner(self) -> T {
        self.resource
    }
}

/// A portfolio child row addressed by `(id, portfolio_id)`.
pub trait OwnedRecord: Sized {
    fn id(&self) -> i64;

    /// Sets the identifying columns back to the resolved values so an
    /// update cannot move the row.
    fn pin(&mut self, id: i64, portfolio_id: i64);

    fn touch(&mut self, now: DateTime<Utc>);

    fn find(store: &dyn Store, id: i64, portfolio_id: i64) -> Result<Option<Self>, Error>;

    fn save(&self, store: &dyn Store) -> Result<(), Error>;

    fn remove(store: &dyn Store, id: i64, portfolio_id: i64) -> Result<bool, Error>;
}

impl OwnedRecord for Project {
    fn id(&self) -> i64 {
        self.id
    }

    fn pin(&mut self, id: i64, portfolio_id: i64) {
        self.id = id;
        self.portfolio_id = portfolio_id;
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    fn find(store: &dyn Store, id: i64, portfolio_id: i64) -> Result<Option<Self>, Error> {
        store.get_project(id, portfolio_id)
    }

    fn save(&self, store: &dyn Store) -> Result<(), Error> {
        store.update_project(self)
    }

    fn remove(store: &dyn Store, id: i64, portfolio_id: i64) -> Result<bool, Error> {
        store.delete_project(id, portfolio_id)
    }
}

impl OwnedRecord for Achievement {
    fn id(&self) -> i64 {
        self.id
    }

    fn pin(&mut self, id: i64, portfolio_id: i64) {
        self.id = id;
        self.portfolio_id = portfolio_id;
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    fn find(store: &dyn Store, id: i64, portfolio_id: i64) -> Result<Option<Self>, Error> {
        store.get_achievement(id, portfolio_id)
    }

    fn save(&self, store: &dyn Store) -> Result<(), Error> {
        store.update_achievement(self)
    }

    fn remove(store: &dyn Store, id: i64, portfolio_id: i64) -> Result<bool, Error> {
        store.delete_achievement(id, portfolio_id)
    }
}

impl<T: OwnedRecord> Owned<T> {
    /// Applies `edit` and writes the record back under the same
    /// `(id, portfolio_id)` it was resolved with, stamped at `now`.
    pub fn update(
        self,
        store: &dyn Store,
        now: DateTime<Utc>,
        edit: impl FnOnce(&mut T),
    ) -> Result<T, ResourceError> {
        let Owned {
            portfolio_id,
            mut resource,
        } = self;
        let id = resource.id();

        edit(&mut resource);
        resource.pin(id, portfolio_id);
        resource.touch(now);

        resource.save(store)?;
        Ok(resource)
    }

    pub fn delete(self, store: &dyn Store) -> Result<(), ResourceError> {
        if T::remove(store, self.resource.id(), self.portfolio_id)? {
            Ok(())
        } else {
            Err(ResourceError::NotFound)
        }
    }
}

impl Owned<Portfolio> {
    /// Applies `edit` and writes the portfolio back; its id and owner are
    /// restored before the write.
    pub fn update_portfolio(
        self,
        store: &dyn Store,
        now: DateTime<Utc>,
        edit: impl FnOnce(&mut Portfolio),
    ) -> Result<Portfolio, ResourceError> {
        let mut portfolio = self.resource;
        let (id, owner_id) = (portfolio.id, portfolio.owner_id);

        edit(&mut portfolio);
        portfolio.id = id;
        portfolio.owner_id = owner_id;
        portfolio.updated_at = now;

        store.update_portfolio(&portfolio)?;
        Ok(portfolio)
    }

    pub fn create_project(&self, store: &dyn Store, project: &NewProject) -> Result<Project, ResourceError> {
        Ok(store.create_project(self.portfolio_id, project)?)
    }

    pub fn projects(&self, store: &dyn Store) -> Result<Vec<Project>, ResourceError> {
        Ok(store.list_projects(self.portfolio_id)?)
    }

    pub fn create_achievement(
        &self,
        store: &dyn Store,
        achievement: &NewAchievement,
    ) -> Result<Achievement, ResourceError> {
        Ok(store.create_achievement(self.portfolio_id, achievement)?)
    }

    pub fn achievements(&self, store: &dyn Store) -> Result<Vec<Achievement>, ResourceError> {
        Ok(store.list_achievements(self.portfolio_id)?)
    }
}

/// The right of an identity to like or unlike an existing project.
///
/// Liking is not restricted to owners; the handle only proves the project
/// exists and pins the user id to the caller.
#[derive(Debug, Clone)]
pub struct LikeHandle {
    user_id: i64,
    project: Project,
}

impl LikeHandle {
    #[must_use]
    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Returns true if a new like was recorded.
    pub fn like(&self, store: &dyn Store) -> Result<bool, ResourceError> {
        Ok(store.create_like(self.user_id, self.project.id)?)
    }

    /// Returns true if an existing like was removed.
    pub fn unlike(&self, store: &dyn Store) -> Result<bool, ResourceError> {
        Ok(store.delete_like(self.user_id, self.project.id)?)
    }
}

#[derive(Debug, Clone)]
pub enum OwnedResource {
    Portfolio(Owned<Portfolio>),
    Project(Owned<Project>),
    Achievement(Owned<Achievement>),
    Like(LikeHandle),
}

pub fn resolve_portfolio(
    store: &dyn Store,
    identity: &Identity,
) -> Result<Owned<Portfolio>, ResourceError> {
    let portfolio = store
        .get_portfolio_by_owner(identity.user_id)?
        .ok_or(ResourceError::PortfolioMissing)?;

    Ok(Owned {
        portfolio_id: portfolio.id,
        resource: portfolio,
    })
}

pub fn resolve_owned<T: OwnedRecord>(
    store: &dyn Store,
    identity: &Identity,
    id: i64,
) -> Result<Owned<T>, ResourceError> {
    let portfolio_id = resolve_portfolio(store, identity)?.portfolio_id;

    let resource = T::find(store, id, portfolio_id)?.ok_or(ResourceError::NotFound)?;

    Ok(Owned {
        portfolio_id,
        resource,
    })
}

pub fn resolve_like(
    store: &dyn Store,
    identity: &Identity,
    project_id: i64,
) -> Result<LikeHandle, ResourceError> {
    let project = store
        .get_project_by_id(project_id)?
        .ok_or(ResourceError::NotFound)?;

    Ok(LikeHandle {
        user_id: identity.user_id,
        project,
    })
}

/// Resolves any locator for `identity`. The result is always scoped to the
/// identity; no locator can name another user's portfolio.
pub fn authorize_ownership(
    store: &dyn Store,
    identity: &Identity,
    locator: ResourceLocator,
) -> Result<OwnedResource, ResourceError> {
    Ok(match locator {
        ResourceLocator::Portfolio => OwnedResource::Portfolio(resolve_portfolio(store, identity)?),
        ResourceLocator::Project(id) => OwnedResource::Project(resolve_owned(store, identity, id)?),
        ResourceLocator::Achievement(id) => {
            OwnedResource::Achievement(resolve_owned(store, identity, id)?)
        }
        ResourceLocator::Like { project_id } => {
            OwnedResource::Like(resolve_like(store, identity, project_id)?)
        }
    })
}

/// Builds the read-only view of `username`'s portfolio. `viewer` only
/// affects the `liked_by_user` flags.
pub fn resolve_public_portfolio(
    store: &dyn Store,
    username: &str,
    viewer: Option<&Identity>,
) -> Result<PublicPortfolio, ResourceError> {
    let user = store
        .get_user_by_username(username)?
        .ok_or(ResourceError::NotFound)?;

    let portfolio = store
        .get_portfolio_by_owner(user.id)?
        .ok_or(ResourceError::PortfolioMissing)?;

    let likes = store.list_portfolio_likes(portfolio.id)?;
    let mut counts: HashMap<i64, i64> = HashMap::new();
    for like in &likes {
        *counts.entry(like.project_id).or_default() += 1;
    }

    let projects = store
        .list_projects(portfolio.id)?
        .into_iter()
        .map(|project| {
            let liked_by_user = viewer.is_some_and(|v| {
                likes
                    .iter()
                    .any(|l| l.project_id == project.id && l.user_id == v.user_id)
            });
            PublicProject {
                likes_count: counts.get(&project.id).copied().unwrap_or(0),
                liked_by_user,
                project,
            }
        })
        .collect();

    let achievements = store.list_achievements(portfolio.id)?;

    Ok(PublicPortfolio {
        user: PublicUser::from(&user),
        portfolio,
        projects,
        achievements,
    })
}
