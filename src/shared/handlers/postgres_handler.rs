use crate::shared::util::config;
use crate::shared::types::account::{Account, Role};

use cached::proc_macro::cached;
use chrono::Utc;
use json_value_merge::Merge;
use serde::Serialize;
use serde_json::Value;
use sqlx::Row;
use sqlx::postgres::{PgRow, PgPool};
use uuid::Uuid;

#[derive(Clone, Serialize)]
pub struct UserSearchResult {
    id: Uuid,
    name: String,
    pfp_url: String
}

// Hash verification must do the same work whether or not the email
// exists, so unknown emails verify against this throwaway digest
#[cached]
fn dummy_hash() -> String {
    libpasta::hash_password("fake_password")
}

fn row_to_account(row: &PgRow) -> Account {
    Account {
        id: row.get::<Uuid, &str>("id"),
        name: row.get::<String, &str>("name"),
        email: row.get::<String, &str>("email"),
        bio: row.get::<String, &str>("bio"),
        pfp_url: row.try_get::<String, &str>("pfp_url").unwrap_or("".to_string()),
        role: row.get::<Role, &str>("role"),
        suspended: row.get::<bool, &str>("suspended"),
        created: row.get::<chrono::DateTime<Utc>, &str>("created"),
        settings: row.try_get::<Value, &str>("settings").unwrap_or(
            serde_json::from_str("{}").unwrap())
    }
}

#[derive(Clone)]
pub struct PostgresHandler {
    pool: PgPool
}

impl PostgresHandler {
    pub async fn new() -> Result<PostgresHandler, sqlx::Error> {
        Ok(PostgresHandler { pool: config::get_pool().await })
    }
}

impl PostgresHandler {
    // Called on first launch for setup
    pub async fn init(&self) -> Result<(), sqlx::Error> {
        sqlx::query(r#"
        CREATE TABLE IF NOT EXISTS users (
            id uuid primary key unique,
            email text NOT NULL unique CHECK(length(email) < 255),
            name text NOT NULL CHECK(length(name) < 65),
            bio text NOT NULL DEFAULT '',
            pfp_url text CHECK(length(pfp_url) < 2048),
            role integer NOT NULL,
            suspended boolean NOT NULL DEFAULT false,
            password_hash text NOT NULL,
            settings json CHECK(pg_column_size(settings) < 1048576),
            created timestamptz NOT NULL
        );"#).execute(&self.pool).await?;
        Ok(())
    }

    pub async fn find_by_email(&self, email: &str) -> Option<Account> {
        match sqlx::query("SELECT * FROM users WHERE email = $1;")
                .bind(email.to_lowercase()).fetch_one(&self.pool).await {
            Ok(row) => Some(row_to_account(&row)),
            Err(_err) => None
        }
    }

    /// Check a login attempt. Unknown email and wrong password are not
    /// distinguishable from the return value
    pub async fn can_login(&self, email: &str, mut password: &str) -> Result<Option<Account>, sqlx::Error> {
        // Too long password: replace password with a dummy and flag
        // that it should always be invalid
        let mut password_correct_override = true;
        if password.len() > config::get_config().count.max_password_length {
            password = "fake_password";
            password_correct_override = false;
        }

        let row = match sqlx::query("SELECT * FROM users WHERE email = $1;")
            .bind(email.to_lowercase()).fetch_one(&self.pool).await {
            Ok(row) => Some(row),
            Err(_err) => None
        };
        let hash = match &row {
            Some(row) => row.get::<String, &str>("password_hash"),
            None => dummy_hash()
        };

        let correct = libpasta::verify_password(&hash, &password)
            && password.chars().count() > 0
            && password_correct_override
            && row.is_some();
        if !correct { return Ok(None); }
        Ok(Some(row_to_account(&row.unwrap())))
    }

    pub async fn create_account(&self, name: &str, email: &str, password: &str, bio: &str, role: Role)
            -> Result<Account, sqlx::Error> {
        let mut id: Uuid;
        loop {
            id = Uuid::new_v4();
            if self.get_user(&id).await.is_err() { break; }
        }

        let password_hash = libpasta::hash_password(&password);
        sqlx::query(r#"INSERT INTO users(id, email, name, bio, role, suspended, password_hash, created)
            VALUES($1, $2, $3, $4, $5, false, $6, $7);"#)
            .bind(id).bind(email.to_lowercase()).bind(name).bind(bio)
            .bind(role).bind(password_hash).bind(chrono::offset::Utc::now())
            .execute(&self.pool).await?;
        Ok(self.get_user(&id).await?)
    }

    pub async fn get_user(&self, id: &Uuid) -> Result<Account, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1;")
            .bind(id).fetch_one(&self.pool).await?;
        Ok(row_to_account(&row))
    }

    pub async fn search_users(&self, filter: &str) -> Result<Vec<UserSearchResult>, sqlx::Error> {
        Ok(sqlx::query("SELECT * FROM users WHERE (email ILIKE $1 || '%') or
            (name ILIKE '%' || $1 || '%') LIMIT 20;")
                .bind(filter)
                .map(|row: PgRow| UserSearchResult {
                    id: row.get::<Uuid, &str>("id"),
                    name: row.get::<String, &str>("name"),
                    pfp_url: row.try_get::<String, &str>("pfp_url").unwrap_or("".to_string())
                })
                .fetch_all(&self.pool).await?)
    }

    pub async fn change_profile(&self, id: &Uuid, name: Option<String>, bio: Option<String>,
            pfp_url: Option<String>, settings: Option<Value>) -> Result<Account, sqlx::Error> {
        let user = self.get_user(id).await?;

        let name = name.unwrap_or(user.name);
        let bio = bio.unwrap_or(user.bio);
        let pfp_url = pfp_url.unwrap_or(user.pfp_url);

        let mut new_settings = user.settings;
        if let Some(settings) = settings {
            new_settings.merge(settings);
        }

        sqlx::query("UPDATE users SET name = $2, bio = $3, pfp_url = $4, settings = to_json($5) WHERE id = $1;")
            .bind(id).bind(name).bind(bio).bind(pfp_url).bind(new_settings)
            .execute(&self.pool).await?;
        Ok(self.get_user(id).await?)
    }

    pub async fn change_password(&self, id: &Uuid, password: &str) -> Result<(), sqlx::Error> {
        let password_hash = libpasta::hash_password(&password);
        sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2;")
            .bind(password_hash).bind(id)
            .execute(&self.pool).await?;
        Ok(())
    }

    // Last writer wins: no lock is held between the guard check and
    // this write
    pub async fn change_role(&self, id: &Uuid, role: Role) -> Result<Account, sqlx::Error> {
        sqlx::query("UPDATE users SET role = $1 WHERE id = $2;")
            .bind(role).bind(id)
            .execute(&self.pool).await?;
        Ok(self.get_user(id).await?)
    }

    pub async fn set_suspended(&self, id: &Uuid, suspended: bool) -> Result<Account, sqlx::Error> {
        sqlx::query("UPDATE users SET suspended = $1 WHERE id = $2;")
            .bind(suspended).bind(id)
            .execute(&self.pool).await?;
        Ok(self.get_user(id).await?)
    }

    /// Market rows for the account must already be gone, the market
    /// schema references users(id)
    pub async fn delete_account(&self, id: &Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM users WHERE id = $1;")
            .bind(id).execute(&self.pool).await?;
        Ok(())
    }
}
