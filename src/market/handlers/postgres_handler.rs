use crate::market::types::post::{Comment, Post, SortPost};
use crate::shared::util::config;

use chrono::Utc;
use std::cmp;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgRow};
use uuid::Uuid;

macro_rules! update_if_not_none {
    ($base: ident, $property: ident) => {
        if $property.is_some() {
            $base.$property = $property.unwrap();
        }
    };
}

fn row_to_post(row: &PgRow) -> Post {
    Post {
        id: row.get::<Uuid, &str>("id"),
        owner: row.get::<Uuid, &str>("owner_id"),
        title: row.get::<String, &str>("title"),
        desc: row.get::<String, &str>("description"),
        price_cents: row.get::<i64, &str>("price_cents"),
        image_url: row.get::<String, &str>("image_url"),
        image_delete_handle: row.get::<String, &str>("image_delete_handle"),
        approved: row.get::<bool, &str>("approved"),
        created: row.get::<chrono::DateTime<Utc>, &str>("created"),
        edited: row.get::<chrono::DateTime<Utc>, &str>("edited"),
        rating: row.try_get::<Option<f64>, &str>("rating").unwrap_or(None)
    }
}

fn row_to_comment(row: &PgRow) -> Comment {
    Comment {
        id: row.get::<i32, &str>("id"),
        post_id: row.get::<Uuid, &str>("post_id"),
        author: row.get::<Uuid, &str>("author_id"),
        content: row.get::<String, &str>("content"),
        created: row.get::<chrono::DateTime<Utc>, &str>("created")
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

    // Called on first launch for setup
    pub async fn init(&self) -> Result<(), sqlx::Error> {
        sqlx::query(format!("CREATE SCHEMA IF NOT EXISTS market AUTHORIZATION {};", config::get_config().database.user).as_str())
            .execute(&self.pool).await?;

        sqlx::query(r#"CREATE TABLE IF NOT EXISTS market.posts (
            id uuid primary key unique,
            owner_id uuid NOT NULL REFERENCES users(id),
            title text NOT NULL CHECK(length(title) < 256),
            description text NOT NULL,
            price_cents bigint NOT NULL CHECK(price_cents >= 0),
            image_url text NOT NULL CHECK(length(image_url) < 2048),
            image_delete_handle text NOT NULL,
            approved boolean NOT NULL,
            created timestamptz NOT NULL,
            edited timestamptz NOT NULL
        );"#).execute(&self.pool).await?;

        sqlx::query(r#"CREATE TABLE IF NOT EXISTS market.favorites (
            user_id uuid NOT NULL REFERENCES users(id),
            post_id uuid NOT NULL REFERENCES market.posts(id),
            UNIQUE(user_id, post_id)
        );"#).execute(&self.pool).await?;

        sqlx::query(r#"CREATE TABLE IF NOT EXISTS market.purchases (
            post_id uuid NOT NULL REFERENCES market.posts(id),
            buyer_id uuid NOT NULL REFERENCES users(id),
            price_cents bigint NOT NULL,
            time timestamptz NOT NULL,
            UNIQUE(buyer_id, post_id)
        );"#).execute(&self.pool).await?;

        sqlx::query(r#"CREATE TABLE IF NOT EXISTS market.ratings (
            post_id uuid NOT NULL REFERENCES market.posts(id),
            user_id uuid NOT NULL REFERENCES users(id),
            stars integer NOT NULL CHECK(stars >= 1 and stars <= 5),
            UNIQUE(user_id, post_id)
        );"#).execute(&self.pool).await?;

        sqlx::query(r#"CREATE TABLE IF NOT EXISTS market.comments (
            id SERIAL PRIMARY KEY,
            post_id uuid NOT NULL REFERENCES market.posts(id),
            author_id uuid NOT NULL REFERENCES users(id),
            content text NOT NULL CHECK(length(content) < 4096),
            created timestamptz NOT NULL
        );"#).execute(&self.pool).await?;

        Ok(())
    }

    pub async fn get_post(&self, post_id: &Uuid) -> Option<Post> {
        match sqlx::query(r#"SELECT p.*,
            (SELECT AVG(stars)::float8 FROM market.ratings r WHERE r.post_id = p.id) as rating
            FROM market.posts p WHERE p.id = $1;"#)
                .bind(post_id).fetch_one(&self.pool).await {
            Ok(row) => Some(row_to_post(&row)),
            Err(_err) => None
        }
    }

    pub async fn create_post(&self, owner: &Uuid, title: String, desc: String, price_cents: i64,
            image_url: String, image_delete_handle: String)
            -> Result<Post, sqlx::Error> {
        let mut id: Uuid;
        loop {
            id = Uuid::new_v4();
            if self.get_post(&id).await.is_none() { break; }
        }

        let created = chrono::offset::Utc::now();
        let edited = created.clone();

        // New listings wait for a manager before they show up publicly
        sqlx::query(r#"INSERT INTO market.posts(id, owner_id, title, description, price_cents,
            image_url, image_delete_handle, approved, created, edited)
            VALUES($1, $2, $3, $4, $5, $6, $7, false, $8, $9);"#)
            .bind(id).bind(owner).bind(title).bind(desc).bind(price_cents)
            .bind(image_url).bind(image_delete_handle).bind(created).bind(edited)
            .execute(&self.pool).await?;

        Ok(self.get_post(&id).await.unwrap())
    }

    pub async fn modify_post(&self, post_id: &Uuid, title: Option<String>, desc: Option<String>,
            price_cents: Option<i64>) -> Result<Post, sqlx::Error> {
        let mut p = self.get_post(&post_id).await.unwrap();
        p.edited = chrono::offset::Utc::now();

        update_if_not_none!(p, title);
        update_if_not_none!(p, desc);
        update_if_not_none!(p, price_cents);

        // Edits drop the listing back out of the approved pool
        sqlx::query(r#"UPDATE market.posts SET title = $2, description = $3, price_cents = $4,
            approved = false, edited = $5 WHERE id = $1;"#)
            .bind(post_id).bind(p.title).bind(p.desc).bind(p.price_cents).bind(p.edited)
            .execute(&self.pool).await?;

        Ok(self.get_post(&post_id).await.unwrap())
    }

    pub async fn set_approved(&self, post_id: &Uuid, approved: bool) -> Result<Post, sqlx::Error> {
        sqlx::query("UPDATE market.posts SET approved = $2 WHERE id = $1;")
            .bind(post_id).bind(approved)
            .execute(&self.pool).await?;
        Ok(self.get_post(&post_id).await.unwrap())
    }

    pub async fn delete_post(&self, post_id: &Uuid) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM market.favorites WHERE post_id = $1;")
            .bind(post_id).execute(&mut *tx).await?;
        sqlx::query("DELETE FROM market.ratings WHERE post_id = $1;")
            .bind(post_id).execute(&mut *tx).await?;
        sqlx::query("DELETE FROM market.comments WHERE post_id = $1;")
            .bind(post_id).execute(&mut *tx).await?;
        sqlx::query("DELETE FROM market.purchases WHERE post_id = $1;")
            .bind(post_id).execute(&mut *tx).await?;
        sqlx::query("DELETE FROM market.posts WHERE id = $1;")
            .bind(post_id).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Listing visibility: approved posts for everyone, plus the viewer's
    /// own unapproved posts, plus everything when the viewer moderates
    pub async fn get_posts(&self, viewer: Option<Uuid>, moderator: bool,
            owner_search: &Option<Uuid>, search_query: &Option<String>,
            offset: Option<u32>, limit: Option<u32>,
            sort_by: Option<SortPost>, sort_down: Option<bool>)
            -> Result<Vec<Post>, sqlx::Error> {
        let sort_condition = sort_by.unwrap_or(SortPost::Created).to_string();
        let mut sort_down_str = "DESC";
        if !sort_down.unwrap_or(true) { sort_down_str = "ASC"; }

        Ok(sqlx::query(("SELECT p.*,
            (SELECT AVG(stars)::float8 FROM market.ratings r WHERE r.post_id = p.id) as rating
            FROM market.posts p WHERE
                ($1 is null or p.owner_id = $1) and
                ($2 is null or p.title ILIKE '%' || $2 || '%' or p.description ILIKE '%' || $2 || '%') and
                (p.approved = true or $3 or ($4 is not null and p.owner_id = $4))
            ORDER BY ".to_owned() + &sort_condition + " " + sort_down_str + " OFFSET $5 LIMIT $6;").as_str())
                .bind(owner_search)
                .bind(search_query)
                .bind(moderator)
                .bind(viewer)
                .bind(offset.unwrap_or(0) as i32)
                .bind(cmp::min(100, limit.unwrap_or(20) as i32))
                .map(|row: PgRow| row_to_post(&row))
                .fetch_all(&self.pool).await?)
    }

    /// Record a sale. Returns false when the buyer already owns a copy
    pub async fn purchase(&self, post_id: &Uuid, buyer: &Uuid, price_cents: i64)
            -> Result<bool, sqlx::Error> {
        let result = sqlx::query(r#"INSERT INTO market.purchases(post_id, buyer_id, price_cents, time)
            VALUES($1, $2, $3, $4) ON CONFLICT DO NOTHING;"#)
            .bind(post_id).bind(buyer).bind(price_cents).bind(chrono::offset::Utc::now())
            .execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn get_purchases(&self, buyer: &Uuid, offset: Option<u32>, limit: Option<u32>)
            -> Result<Vec<Post>, sqlx::Error> {
        Ok(sqlx::query(r#"SELECT p.*,
            (SELECT AVG(stars)::float8 FROM market.ratings r WHERE r.post_id = p.id) as rating
            FROM market.posts p
            INNER JOIN market.purchases ON buyer_id = $1 and p.id = post_id
            ORDER BY time DESC OFFSET $2 LIMIT $3;"#)
                .bind(buyer)
                .bind(offset.unwrap_or(0) as i32)
                .bind(cmp::min(100, limit.unwrap_or(20) as i32))
                .map(|row: PgRow| row_to_post(&row))
                .fetch_all(&self.pool).await?)
    }

    pub async fn add_favorites(&self, user: &Uuid, post_ids: &Vec<Uuid>)
            -> Result<(), sqlx::Error> {
        // Limit post id count to 100
        let end = cmp::min(100, post_ids.len());
        let post_ids = &post_ids[0..end];

        sqlx::query(r#"INSERT INTO market.favorites(user_id, post_id) VALUES($1, unnest($2)) ON CONFLICT DO NOTHING;"#)
            .bind(user).bind(post_ids)
            .execute(&self.pool).await?;
        Ok(())
    }

    pub async fn remove_favorites(&self, user: &Uuid, post_ids: &Vec<Uuid>)
            -> Result<(), sqlx::Error> {
        // Limit post id count to 100
        let end = cmp::min(100, post_ids.len());
        let post_ids = &post_ids[0..end];

        sqlx::query(r#"DELETE FROM market.favorites WHERE user_id = $1 and post_id = ANY($2);"#)
            .bind(user).bind(post_ids)
            .execute(&self.pool).await?;
        Ok(())
    }

    pub async fn get_favorites(&self, user: &Uuid, offset: Option<u32>, limit: Option<u32>)
            -> Result<Vec<Post>, sqlx::Error> {
        Ok(sqlx::query(r#"SELECT p.*,
            (SELECT AVG(stars)::float8 FROM market.ratings r WHERE r.post_id = p.id) as rating
            FROM market.posts p
            INNER JOIN market.favorites ON user_id = $1 and p.id = post_id
            ORDER BY p.created DESC OFFSET $2 LIMIT $3;"#)
            .bind(user)
            .bind(offset.unwrap_or(0) as i32)
            .bind(cmp::min(100, limit.unwrap_or(20) as i32))
            .map(|row: PgRow| row_to_post(&row))
            .fetch_all(&self.pool).await?)
    }

    pub async fn rate_post(&self, user: &Uuid, post_id: &Uuid, stars: i32)
            -> Result<(), sqlx::Error> {
        sqlx::query(r#"INSERT INTO market.ratings(post_id, user_id, stars) VALUES($1, $2, $3)
            ON CONFLICT (user_id, post_id) DO UPDATE SET stars = $3;"#)
            .bind(post_id).bind(user).bind(stars)
            .execute(&self.pool).await?;
        Ok(())
    }

    pub async fn create_comment(&self, post_id: &Uuid, author: &Uuid, content: String)
            -> Result<Comment, sqlx::Error> {
        let row = sqlx::query(r#"INSERT INTO market.comments(post_id, author_id, content, created)
            VALUES($1, $2, $3, $4) RETURNING *;"#)
            .bind(post_id).bind(author).bind(content).bind(chrono::offset::Utc::now())
            .fetch_one(&self.pool).await?;
        Ok(row_to_comment(&row))
    }

    pub async fn get_comment(&self, comment_id: i32) -> Option<Comment> {
        match sqlx::query("SELECT * FROM market.comments WHERE id = $1;")
                .bind(comment_id).fetch_one(&self.pool).await {
            Ok(row) => Some(row_to_comment(&row)),
            Err(_err) => None
        }
    }

    pub async fn get_comments(&self, post_id: &Uuid, offset: Option<u32>, limit: Option<u32>)
            -> Result<Vec<Comment>, sqlx::Error> {
        Ok(sqlx::query("SELECT * FROM market.comments WHERE post_id = $1 ORDER BY created DESC OFFSET $2 LIMIT $3;")
            .bind(post_id)
            .bind(offset.unwrap_or(0) as i32)
            .bind(cmp::min(100, limit.unwrap_or(20) as i32))
            .map(|row: PgRow| row_to_comment(&row))
            .fetch_all(&self.pool).await?)
    }

    pub async fn delete_comment(&self, comment_id: i32) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM market.comments WHERE id = $1;")
            .bind(comment_id).execute(&self.pool).await?;
        Ok(())
    }

    /// Remove every market row tied to an account: rows on their posts,
    /// rows they authored elsewhere, then the posts themselves
    pub async fn delete_by_owner(&self, owner: &Uuid) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(r#"DELETE FROM market.favorites USING market.posts t1 WHERE t1.id = post_id AND t1.owner_id = $1;"#)
            .bind(owner).execute(&mut *tx).await?;
        sqlx::query(r#"DELETE FROM market.ratings USING market.posts t1 WHERE t1.id = post_id AND t1.owner_id = $1;"#)
            .bind(owner).execute(&mut *tx).await?;
        sqlx::query(r#"DELETE FROM market.comments USING market.posts t1 WHERE t1.id = post_id AND t1.owner_id = $1;"#)
            .bind(owner).execute(&mut *tx).await?;
        sqlx::query(r#"DELETE FROM market.purchases USING market.posts t1 WHERE t1.id = post_id AND t1.owner_id = $1;"#)
            .bind(owner).execute(&mut *tx).await?;

        sqlx::query("DELETE FROM market.favorites WHERE user_id = $1;")
            .bind(owner).execute(&mut *tx).await?;
        sqlx::query("DELETE FROM market.ratings WHERE user_id = $1;")
            .bind(owner).execute(&mut *tx).await?;
        sqlx::query("DELETE FROM market.comments WHERE author_id = $1;")
            .bind(owner).execute(&mut *tx).await?;
        sqlx::query("DELETE FROM market.purchases WHERE buyer_id = $1;")
            .bind(owner).execute(&mut *tx).await?;

        sqlx::query("DELETE FROM market.posts WHERE owner_id = $1;")
            .bind(owner).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }
}
