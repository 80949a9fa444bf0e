//! Read-models served to anonymous and third-party viewers.

use serde::Serialize;

use super::{Achievement, Portfolio, Project, User};

/// Profile fields that are safe to show to anyone.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub social_media_links: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture_url: Option<String>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            bio: user.bio.clone(),
            social_media_links: user.social_media_links.clone(),
            profile_picture_url: user.profile_picture_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicProject {
    #[serde(flatten)]
    pub project: Project,
    pub likes_count: i64,
    /// Whether the viewing identity, if any, has liked this project.
    pub liked_by_user: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicPortfolio {
    #[serde(flatten)]
    pub portfolio: Portfolio,
    pub user: PublicUser,
    pub projects: Vec<PublicProject>,
    pub achievements: Vec<Achievement>,
}
