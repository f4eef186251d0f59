use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;
use crate::models::option::{StatOption, ID_STATISTIC_MEMBER_COUNT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    /// Author of comments synchronized from external clients.
    DefaultCommenter,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::DefaultCommenter => "defaultCommenter",
            Self::Member => "member",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "admin" => Some(Self::Admin),
            "defaultCommenter" => Some(Self::DefaultCommenter),
            "member" => Some(Self::Member),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserStatus {
    Active,
    /// Account exists for attribution only and must never pass a login check.
    NoLogin,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::NoLogin => "no_login",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "active" => Some(Self::Active),
            "no_login" => Some(Self::NoLogin),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub display_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub status: UserStatus,
    pub created_at: NaiveDateTime,
}

/// Input to account creation. `password` is plain text and is hashed on insert.
#[derive(Debug, Clone)]
pub struct UserForm {
    pub email: String,
    pub display_name: String,
    pub password: String,
    pub role: Role,
    pub status: UserStatus,
}

impl UserForm {
    pub fn validate(&self) -> Result<(), String> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(format!("invalid email: {:?}", self.email));
        }
        if self.display_name.trim().is_empty() {
            return Err("display name is required".to_string());
        }
        if self.password.is_empty() {
            return Err("password is required".to_string());
        }
        Ok(())
    }
}

impl User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let role: String = row.get("role")?;
        let status: String = row.get("status")?;
        Ok(User {
            id: row.get("id")?,
            email: row.get("email")?,
            display_name: row.get("display_name")?,
            password_hash: row.get("password_hash")?,
            role: Role::parse(&role).unwrap_or(Role::Member),
            status: UserStatus::parse(&status).unwrap_or(UserStatus::NoLogin),
            created_at: row.get("created_at")?,
        })
    }

    const SELECT_COLS: &'static str =
        "id, email, display_name, password_hash, role, status, created_at";

    pub fn can_login(&self) -> bool {
        self.status == UserStatus::Active
    }

    // ── Lookups ──

    pub fn get_by_id(pool: &DbPool, id: i64) -> Option<User> {
        let conn = pool.get().ok()?;
        conn.query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", Self::SELECT_COLS),
            params![id],
            Self::from_row,
        )
        .ok()
    }

    pub fn get_by_email(pool: &DbPool, email: &str) -> Option<User> {
        let conn = pool.get().ok()?;
        conn.query_row(
            &format!("SELECT {} FROM users WHERE email = ?1", Self::SELECT_COLS),
            params![email.trim()],
            Self::from_row,
        )
        .ok()
    }

    /// The first administrator created.
    pub fn get_admin(pool: &DbPool) -> Option<User> {
        let conn = pool.get().ok()?;
        conn.query_row(
            &format!(
                "SELECT {} FROM users WHERE role = ?1 ORDER BY id ASC LIMIT 1",
                Self::SELECT_COLS
            ),
            params![Role::Admin.as_str()],
            Self::from_row,
        )
        .ok()
    }

    pub fn count(pool: &DbPool) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap_or(0)
    }

    pub fn count_by_role(pool: &DbPool, role: Role) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row(
            "SELECT COUNT(*) FROM users WHERE role = ?1",
            params![role.as_str()],
            |row| row.get(0),
        )
        .unwrap_or(0)
    }

    // ── Create ──

    /// Validate, hash and insert a user, bumping the member counter in the same
    /// transaction. Duplicate emails are rejected.
    pub fn create(pool: &DbPool, form: &UserForm, bcrypt_cost: u32) -> Result<i64, String> {
        form.validate()?;
        let email = form.email.trim();

        let hash = bcrypt::hash(&form.password, bcrypt_cost).map_err(|e| e.to_string())?;

        let mut conn = pool.get().map_err(|e| e.to_string())?;
        let tx = conn.transaction().map_err(|e| e.to_string())?;

        let taken: i64 = tx
            .query_row(
                "SELECT COUNT(*) FROM users WHERE email = ?1",
                params![email],
                |row| row.get(0),
            )
            .map_err(|e| e.to_string())?;
        if taken > 0 {
            return Err(format!("email already registered: {}", email));
        }

        tx.execute(
            "INSERT INTO users (email, display_name, password_hash, role, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                email,
                form.display_name.trim(),
                hash,
                form.role.as_str(),
                form.status.as_str()
            ],
        )
        .map_err(|e| e.to_string())?;
        let id = tx.last_insert_rowid();

        if !StatOption::increment(&tx, ID_STATISTIC_MEMBER_COUNT, 1)? {
            log::warn!("member counter missing; user {} not counted", email);
        }

        tx.commit().map_err(|e| e.to_string())?;
        Ok(id)
    }
}
