use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

const USER_COLUMNS: &str = "id, username, email, password_hash, bio, social_media_links, \
     profile_picture_url, created_at, updated_at";
const PORTFOLIO_COLUMNS: &str =
    "id, owner_id, title, description, about_me, contact_info, layout, created_at, updated_at";
const PROJECT_COLUMNS: &str = "id, portfolio_id, title, description, technologies, link, \
     image_url, featured, created_at, updated_at";
const ACHIEVEMENT_COLUMNS: &str =
    "id, portfolio_id, title, description, date, created_at, updated_at";

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .inspect_err(|e| tracing::error!("Invalid date in database: '{}' - {}", s, e))
        .ok()
}

fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Maps unique-constraint failures to `Error::AlreadyExists`.
fn map_unique(err: rusqlite::Error) -> Error {
    if is_constraint_violation(&err) {
        Error::AlreadyExists
    } else {
        Error::from(err)
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        bio: row.get(4)?,
        social_media_links: row.get(5)?,
        profile_picture_url: row.get(6)?,
        created_at: parse_datetime(&row.get::<_, String>(7)?),
        updated_at: parse_datetime(&row.get::<_, String>(8)?),
    })
}

fn portfolio_from_row(row: &Row<'_>) -> rusqlite::Result<Portfolio> {
    Ok(Portfolio {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        about_me: row.get(4)?,
        contact_info: row.get(5)?,
        layout: row.get(6)?,
        created_at: parse_datetime(&row.get::<_, String>(7)?),
        updated_at: parse_datetime(&row.get::<_, String>(8)?),
    })
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        portfolio_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        technologies: row.get(4)?,
        link: row.get(5)?,
        image_url: row.get(6)?,
        featured: row.get(7)?,
        created_at: parse_datetime(&row.get::<_, String>(8)?),
        updated_at: parse_datetime(&row.get::<_, String>(9)?),
    })
}

fn achievement_from_row(row: &Row<'_>) -> rusqlite::Result<Achievement> {
    Ok(Achievement {
        id: row.get(0)?,
        portfolio_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        date: row.get::<_, Option<String>>(4)?.and_then(|s| parse_date(&s)),
        created_at: parse_datetime(&row.get::<_, String>(5)?),
        updated_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // User operations

    fn create_user_with_portfolio(
        &self,
        user: &NewUser,
        portfolio: &NewPortfolio,
    ) -> Result<(User, Portfolio)> {
        let now = Utc::now();
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO users (username, email, password_hash, bio, social_media_links,
                                profile_picture_url, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                user.username,
                user.email,
                user.password_hash,
                user.bio,
                user.social_media_links,
                user.profile_picture_url,
                format_datetime(&now),
            ],
        )
        .map_err(map_unique)?;
        let user_id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO portfolios (owner_id, title, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![
                user_id,
                portfolio.title,
                portfolio.description,
                format_datetime(&now)
            ],
        )
        .map_err(map_unique)?;
        let portfolio_id = tx.last_insert_rowid();

        tx.commit()?;

        let created_user = User {
            id: user_id,
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            bio: user.bio.clone(),
            social_media_links: user.social_media_links.clone(),
            profile_picture_url: user.profile_picture_url.clone(),
            created_at: now,
            updated_at: now,
        };
        let created_portfolio = Portfolio {
            id: portfolio_id,
            owner_id: user_id,
            title: portfolio.title.clone(),
            description: portfolio.description.clone(),
            about_me: None,
            contact_info: None,
            layout: None,
            created_at: now,
            updated_at: now,
        };

        Ok((created_user, created_portfolio))
    }

    fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id],
            user_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
            params![username],
            user_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn update_user(&self, user: &User) -> Result<()> {
        let rows = self
            .conn()
            .execute(
                "UPDATE users SET username = ?1, email = ?2, bio = ?3, social_media_links = ?4,
                                  profile_picture_url = ?5, updated_at = ?6
                 WHERE id = ?7",
                params![
                    user.username,
                    user.email,
                    user.bio,
                    user.social_media_links,
                    user.profile_picture_url,
                    format_datetime(&user.updated_at),
                    user.id,
                ],
            )
            .map_err(map_unique)?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn update_user_password(&self, id: i64, password_hash: &str) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3",
            params![password_hash, format_datetime(&Utc::now()), id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    // Portfolio operations

    fn get_portfolio_by_owner(&self, owner_id: i64) -> Result<Option<Portfolio>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {PORTFOLIO_COLUMNS} FROM portfolios WHERE owner_id = ?1"),
            params![owner_id],
            portfolio_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn update_portfolio(&self, portfolio: &Portfolio) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE portfolios SET title = ?1, description = ?2, about_me = ?3,
                                   contact_info = ?4, layout = ?5, updated_at = ?6
             WHERE id = ?7 AND owner_id = ?8",
            params![
                portfolio.title,
                portfolio.description,
                portfolio.about_me,
                portfolio.contact_info,
                portfolio.layout,
                format_datetime(&portfolio.updated_at),
                portfolio.id,
                portfolio.owner_id,
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    // Project operations

    fn create_project(&self, portfolio_id: i64, project: &NewProject) -> Result<Project> {
        let now = Utc::now();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO projects (portfolio_id, title, description, technologies, link,
                                   image_url, featured, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                portfolio_id,
                project.title,
                project.description,
                project.technologies,
                project.link,
                project.image_url,
                project.featured,
                format_datetime(&now),
            ],
        )?;

        Ok(Project {
            id: conn.last_insert_rowid(),
            portfolio_id,
            title: project.title.clone(),
            description: project.description.clone(),
            technologies: project.technologies.clone(),
            link: project.link.clone(),
            image_url: project.image_url.clone(),
            featured: project.featured,
            created_at: now,
            updated_at: now,
        })
    }

    fn get_project(&self, id: i64, portfolio_id: i64) -> Result<Option<Project>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1 AND portfolio_id = ?2"),
            params![id, portfolio_id],
            project_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_project_by_id(&self, id: i64) -> Result<Option<Project>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
            params![id],
            project_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_projects(&self, portfolio_id: i64) -> Result<Vec<Project>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE portfolio_id = ?1 ORDER BY id"
        ))?;

        let rows = stmt.query_map(params![portfolio_id], project_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_project(&self, project: &Project) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE projects SET title = ?1, description = ?2, technologies = ?3, link = ?4,
                                 image_url = ?5, featured = ?6, updated_at = ?7
             WHERE id = ?8 AND portfolio_id = ?9",
            params![
                project.title,
                project.description,
                project.technologies,
                project.link,
                project.image_url,
                project.featured,
                format_datetime(&project.updated_at),
                project.id,
                project.portfolio_id,
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_project(&self, id: i64, portfolio_id: i64) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM projects WHERE id = ?1 AND portfolio_id = ?2",
            params![id, portfolio_id],
        )?;
        Ok(rows > 0)
    }

    // Achievement operations

    fn create_achievement(
        &self,
        portfolio_id: i64,
        achievement: &NewAchievement,
    ) -> Result<Achievement> {
        let now = Utc::now();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO achievements (portfolio_id, title, description, date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![
                portfolio_id,
                achievement.title,
                achievement.description,
                achievement.date.as_ref().map(format_date),
                format_datetime(&now),
            ],
        )?;

        Ok(Achievement {
            id: conn.last_insert_rowid(),
            portfolio_id,
            title: achievement.title.clone(),
            description: achievement.description.clone(),
            date: achievement.date,
            created_at: now,
            updated_at: now,
        })
    }

    fn get_achievement(&self, id: i64, portfolio_id: i64) -> Result<Option<Achievement>> {
        let conn = self.conn();
        conn.query_row(
            &format!(
                "SELECT {ACHIEVEMENT_COLUMNS} FROM achievements WHERE id = ?1 AND portfolio_id = ?2"
            ),
            params![id, portfolio_id],
            achievement_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_achievements(&self, portfolio_id: i64) -> Result<Vec<Achievement>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ACHIEVEMENT_COLUMNS} FROM achievements WHERE portfolio_id = ?1
             ORDER BY date IS NULL, date DESC, id"
        ))?;

        let rows = stmt.query_map(params![portfolio_id], achievement_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_achievement(&self, achievement: &Achievement) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE achievements SET title = ?1, description = ?2, date = ?3, updated_at = ?4
             WHERE id = ?5 AND portfolio_id = ?6",
            params![
                achievement.title,
                achievement.description,
                achievement.date.as_ref().map(format_date),
                format_datetime(&achievement.updated_at),
                achievement.id,
                achievement.portfolio_id,
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_achievement(&self, id: i64, portfolio_id: i64) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM achievements WHERE id = ?1 AND portfolio_id = ?2",
            params![id, portfolio_id],
        )?;
        Ok(rows > 0)
    }

    // Like operations

    fn create_like(&self, user_id: i64, project_id: i64) -> Result<bool> {
        let result = self.conn().execute(
            "INSERT INTO likes (user_id, project_id, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT (user_id, project_id) DO NOTHING",
            params![user_id, project_id, format_datetime(&Utc::now())],
        );

        match result {
            Ok(rows) => Ok(rows > 0),
            // The unique case is absorbed above, so this is a dangling project or user.
            Err(e) if is_constraint_violation(&e) => Err(Error::NotFound),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn delete_like(&self, user_id: i64, project_id: i64) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM likes WHERE user_id = ?1 AND project_id = ?2",
            params![user_id, project_id],
        )?;
        Ok(rows > 0)
    }

    fn list_portfolio_likes(&self, portfolio_id: i64) -> Result<Vec<Like>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT l.id, l.user_id, l.project_id, l.created_at
             FROM likes l
             JOIN projects p ON l.project_id = p.id
             WHERE p.portfolio_id = ?1
             ORDER BY l.id",
        )?;

        let rows = stmt.query_map(params![portfolio_id], |row| {
            Ok(Like {
                id: row.get(0)?,
                user_id: row.get(1)?,
                project_id: row.get(2)?,
                created_at: parse_datetime(&row.get::<_, String>(3)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }}
