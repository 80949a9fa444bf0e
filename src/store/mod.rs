mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
///
/// Every lookup or mutation of a portfolio child takes the parent
/// `portfolio_id` and applies it in the same statement as the row id, so a
/// row owned by someone else is indistinguishable from a missing one.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // User operations

    /// Creates the user and their portfolio in a single transaction.
    /// Returns `Error::AlreadyExists` if the username or email is taken.
    fn create_user_with_portfolio(
        &self,
        user: &NewUser,
        portfolio: &NewPortfolio,
    ) -> Result<(User, Portfolio)>;
    fn get_user(&self, id: i64) -> Result<Option<User>>;
    fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    fn update_user(&self, user: &User) -> Result<()>;
    fn update_user_password(&self, id: i64, password_hash: &str) -> Result<()>;

    // Portfolio operations
    fn get_portfolio_by_owner(&self, owner_id: i64) -> Result<Option<Portfolio>>;
    fn update_portfolio(&self, portfolio: &Portfolio) -> Result<()>;

    // Project operations
    fn create_project(&self, portfolio_id: i64, project: &NewProject) -> Result<Project>;
    fn get_project(&self, id: i64, portfolio_id: i64) -> Result<Option<Project>>;
    fn get_project_by_id(&self, id: i64) -> Result<Option<Project>>;
    fn list_projects(&self, portfolio_id: i64) -> Result<Vec<Project>>;
    fn update_project(&self, project: &Project) -> Result<()>;
    fn delete_project(&self, id: i64, portfolio_id: i64) -> Result<bool>;

    // Achievement operations
    fn create_achievement(&self, portfolio_id: i64, achievement: &NewAchievement)
    -> Result<Achievement>;
    fn get_achievement(&self, id: i64, portfolio_id: i64) -> Result<Option<Achievement>>;
    fn list_achievements(&self, portfolio_id: i64) -> Result<Vec<Achievement>>;
    fn update_achievement(&self, achievement: &Achievement) -> Result<()>;
    fn delete_achievement(&self, id: i64, portfolio_id: i64) -> Result<bool>;

    // Like operations

    /// Returns false if the user already liked the project.
    fn create_like(&self, user_id: i64, project_id: i64) -> Result<bool>;
    /// Returns false if there was no like to remove.
    fn delete_like(&self, user_id: i64, project_id: i64) -> Result<bool>;
    fn list_portfolio_likes(&self, portfolio_id: i64) -> Result<Vec<Like>>;
}
