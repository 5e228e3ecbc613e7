//! PostgreSQL store.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use super::{CatalogStore, ContentStore, ListingStore, ReportStore, Store, StoreError, UserStore};
use crate::db;
use crate::listing::{ListingQueryBuilder, Predicate, SortSpec, Viewer, Window};
use crate::models::report::REPORT_STATUS_PENDING;
use crate::models::{
    Aggregates, AuthorRecord, EngagementEdge, Item, ItemChanges, ItemKind, ItemRecord, Lecturer,
    NewItem, NewReport, ParentRecord, Report, Role, SiteStats, Subject, User,
};

/// One row of a listing page, as produced by [`ListingQueryBuilder::build_page`].
#[derive(Debug, sqlx::FromRow)]
struct ListingRow {
    id: Uuid,
    author_id: Uuid,
    author_name: Option<String>,
    author_image: Option<String>,
    subject_id: Option<Uuid>,
    subject_name: Option<String>,
    semester: Option<i32>,
    lecturer_id: Option<Uuid>,
    lecturer_name: Option<String>,
    reply_to_id: Option<Uuid>,
    forum_id: Option<Uuid>,
    title: String,
    body: String,
    files: Json<Vec<String>>,
    is_anonymous: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    total_likes: i64,
    total_bookmarks: i64,
    total_replies: i64,
    is_liked: bool,
    is_bookmarked: bool,
    parent_kind: Option<String>,
    parent_id: Option<Uuid>,
    parent_title: Option<String>,
    parent_body: Option<String>,
    parent_created_at: Option<DateTime<Utc>>,
    parent_author_id: Option<Uuid>,
    parent_author_name: Option<String>,
    parent_author_image: Option<String>,
    parent_is_anonymous: Option<bool>,
}

impl ListingRow {
    fn into_record(self, kind: ItemKind) -> ItemRecord {
        let parent = match (
            self.parent_kind.as_deref().and_then(ItemKind::parse),
            self.parent_id,
            self.parent_author_id,
            self.parent_created_at,
        ) {
            (Some(parent_kind), Some(id), Some(author_id), Some(created_at)) => {
                Some(ParentRecord {
                    kind: parent_kind,
                    id,
                    title: self.parent_title.unwrap_or_default(),
                    body: self.parent_body.unwrap_or_default(),
                    created_at,
                    author: AuthorRecord {
                        id: author_id,
                        name: self.parent_author_name.unwrap_or_default(),
                        image: self.parent_author_image,
                    },
                    is_anonymous: self.parent_is_anonymous.unwrap_or(false),
                })
            }
            _ => None,
        };

        ItemRecord {
            kind,
            id: self.id,
            author: AuthorRecord {
                id: self.author_id,
                name: self.author_name.unwrap_or_default(),
                image: self.author_image,
            },
            subject_id: self.subject_id,
            subject_name: self.subject_name,
            semester: self.semester,
            lecturer_id: self.lecturer_id,
            lecturer_name: self.lecturer_name,
            reply_to_id: self.reply_to_id,
            forum_id: self.forum_id,
            title: self.title,
            body: self.body,
            files: self.files.0,
            is_anonymous: self.is_anonymous,
            created_at: self.created_at,
            updated_at: self.updated_at,
            parent,
            aggregates: Aggregates {
                total_likes: self.total_likes,
                total_bookmarks: self.total_bookmarks,
                total_replies: self.total_replies,
                is_liked: self.is_liked,
                is_bookmarked: self.is_bookmarked,
            },
        }
    }
}

/// A stored review or forum, normalized to the review column names.
#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: Uuid,
    author_id: Uuid,
    subject_id: Option<Uuid>,
    lecturer_id: Option<Uuid>,
    reply_to_id: Option<Uuid>,
    forum_id: Option<Uuid>,
    title: String,
    body: String,
    files: Json<Vec<String>>,
    is_anonymous: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ItemRow {
    fn into_item(self, kind: ItemKind) -> Item {
        Item {
            kind,
            id: self.id,
            author_id: self.author_id,
            subject_id: self.subject_id,
            lecturer_id: self.lecturer_id,
            reply_to_id: self.reply_to_id,
            forum_id: self.forum_id,
            title: self.title,
            body: self.body,
            files: self.files.0,
            is_anonymous: self.is_anonymous,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

fn item_columns(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Review => {
            "id, author_id, subject_id, lecturer_id, reply_to_id, forum_id, title, body, \
             files, is_anonymous, created_at, updated_at"
        }
        ItemKind::Forum => {
            "id, author_id, subject_id, NULL::uuid AS lecturer_id, NULL::uuid AS reply_to_id, \
             NULL::uuid AS forum_id, title, description AS body, files, is_anonymous, \
             created_at, updated_at"
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    image: Option<String>,
    role: String,
    is_banned: bool,
    poin: i32,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            image: row.image,
            role: Role::from_claim(&row.role),
            is_banned: row.is_banned,
            poin: row.poin,
            created_at: row.created_at,
        }
    }
}

const USER_COLUMNS: &str = "id, name, email, image, role, is_banned, poin, created_at";

#[derive(Debug, sqlx::FromRow)]
struct StatsRow {
    total_users: i64,
    total_reviews: i64,
    total_forums: i64,
    pending_reports: i64,
}

fn non_negative(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}

/// Surface foreign key violations as [`StoreError::MissingReference`].
fn missing_reference(err: sqlx::Error) -> anyhow::Error {
    match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            StoreError::MissingReference.into()
        }
        _ => err.into(),
    }
}

/// Store backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ListingStore for PgStore {
    async fn fetch(
        &self,
        kind: ItemKind,
        predicate: &Predicate,
        sort: &SortSpec,
        window: Option<Window>,
        viewer: &Viewer,
    ) -> Result<Vec<ItemRecord>> {
        let sql = ListingQueryBuilder::new(kind, predicate, *sort, *viewer).build_page(window);
        tracing::debug!(sql = %sql, "listing page query");

        let rows = sqlx::query_as::<_, ListingRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("failed to fetch {} listing", kind.label()))?;

        Ok(rows.into_iter().map(|row| row.into_record(kind)).collect())
    }

    async fn count(&self, kind: ItemKind, predicate: &Predicate) -> Result<u64> {
        let sql = ListingQueryBuilder::new(kind, predicate, SortSpec::default(), Viewer::anonymous())
            .build_count();

        let total: i64 = sqlx::query_scalar(&sql)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("failed to count {} listing", kind.label()))?;

        Ok(non_negative(total))
    }
}

#[async_trait]
impl ContentStore for PgStore {
    async fn create_item(&self, input: NewItem) -> Result<Item> {
        let id = Uuid::now_v7();
        let now = Utc::now();

        match input.kind {
            ItemKind::Review => {
                sqlx::query(
                    r#"
                    INSERT INTO reviews (id, author_id, subject_id, lecturer_id, reply_to_id,
                        forum_id, title, body, files, is_anonymous, created_at, updated_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
                    "#,
                )
                .bind(id)
                .bind(input.author_id)
                .bind(input.subject_id)
                .bind(input.lecturer_id)
                .bind(input.reply_to_id)
                .bind(input.forum_id)
                .bind(&input.title)
                .bind(&input.body)
                .bind(Json(&input.files))
                .bind(input.is_anonymous)
                .bind(now)
                .execute(&self.pool)
                .await
                .map_err(missing_reference)
                .context("failed to create review")?;
            }
            ItemKind::Forum => {
                sqlx::query(
                    r#"
                    INSERT INTO forums (id, author_id, subject_id, title, description, files,
                        is_anonymous, created_at, updated_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
                    "#,
                )
                .bind(id)
                .bind(input.author_id)
                .bind(input.subject_id)
                .bind(&input.title)
                .bind(&input.body)
                .bind(Json(&input.files))
                .bind(input.is_anonymous)
                .bind(now)
                .execute(&self.pool)
                .await
                .map_err(missing_reference)
                .context("failed to create forum")?;
            }
        }

        Ok(Item {
            kind: input.kind,
            id,
            author_id: input.author_id,
            subject_id: input.subject_id,
            lecturer_id: input.lecturer_id,
            reply_to_id: input.reply_to_id,
            forum_id: input.forum_id,
            title: input.title,
            body: input.body,
            files: input.files,
            is_anonymous: input.is_anonymous,
            created_at: now,
            updated_at: now,
        })
    }

    async fn find_item(&self, kind: ItemKind, id: Uuid) -> Result<Option<Item>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1",
            item_columns(kind),
            kind.table()
        );
        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to fetch {}", kind.label()))?;

        Ok(row.map(|r| r.into_item(kind)))
    }

    async fn update_item(
        &self,
        kind: ItemKind,
        id: Uuid,
        changes: ItemChanges,
    ) -> Result<Option<Item>> {
        let Some(mut item) = self.find_item(kind, id).await? else {
            return Ok(None);
        };
        changes.apply(&mut item, Utc::now());

        let sql = format!(
            "UPDATE {} SET title = $2, {} = $3, files = $4, is_anonymous = $5, updated_at = $6 \
             WHERE id = $1",
            kind.table(),
            kind.body_column()
        );
        sqlx::query(&sql)
            .bind(id)
            .bind(&item.title)
            .bind(&item.body)
            .bind(Json(&item.files))
            .bind(item.is_anonymous)
            .bind(item.updated_at)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to update {}", kind.label()))?;

        Ok(Some(item))
    }

    async fn delete_item(&self, kind: ItemKind, id: Uuid) -> Result<bool> {
        // Replies, engagement edges and reports go with it via ON DELETE CASCADE
        let sql = format!("DELETE FROM {} WHERE id = $1", kind.table());
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete {}", kind.label()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_engagement(&self, edge: EngagementEdge) -> Result<bool> {
        let sql = format!(
            "INSERT INTO {} (user_id, {}) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            edge.kind.table(edge.item_kind),
            edge.item_kind.edge_column()
        );
        let result = sqlx::query(&sql)
            .bind(edge.user_id)
            .bind(edge.item_id)
            .execute(&self.pool)
            .await
            .map_err(missing_reference)
            .with_context(|| format!("failed to {} {}", edge.kind.verb(), edge.item_kind.label()))?;

        Ok(result.rows_affected() == 1)
    }

    async fn remove_engagement(&self, edge: EngagementEdge) -> Result<bool> {
        let sql = format!(
            "DELETE FROM {} WHERE user_id = $1 AND {} = $2",
            edge.kind.table(edge.item_kind),
            edge.item_kind.edge_column()
        );
        let result = sqlx::query(&sql)
            .bind(edge.user_id)
            .bind(edge.item_id)
            .execute(&self.pool)
            .await
            .with_context(|| {
                format!("failed to un{} {}", edge.kind.verb(), edge.item_kind.label())
            })?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn upsert_user(&self, user: User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, image, role, is_banned, poin, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name, email = EXCLUDED.email
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.image)
        .bind(user.role.as_str())
        .bind(user.is_banned)
        .bind(user.poin)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .context("failed to upsert user")?;

        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to fetch user")?;

        Ok(row.map(User::from))
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC");
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .context("failed to list users")?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn toggle_ban(&self, id: Uuid) -> Result<Option<User>> {
        let sql = format!(
            "UPDATE users SET is_banned = NOT is_banned WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to toggle user ban")?;

        Ok(row.map(User::from))
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<User>> {
        let sql = format!("UPDATE users SET role = $2 WHERE id = $1 RETURNING {USER_COLUMNS}");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(role.as_str())
            .fetch_optional(&self.pool)
            .await
            .context("failed to update user role")?;

        Ok(row.map(User::from))
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_subjects(&self) -> Result<Vec<Subject>> {
        let subjects = sqlx::query_as::<_, Subject>(
            "SELECT id, code, name, semester FROM subjects ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to list subjects")?;

        Ok(subjects)
    }

    async fn list_lecturers(&self) -> Result<Vec<Lecturer>> {
        let lecturers =
            sqlx::query_as::<_, Lecturer>("SELECT id, name, faculty FROM lecturers ORDER BY name")
                .fetch_all(&self.pool)
                .await
                .context("failed to list lecturers")?;

        Ok(lecturers)
    }

    async fn find_subject(&self, id: Uuid) -> Result<Option<Subject>> {
        let subject = sqlx::query_as::<_, Subject>(
            "SELECT id, code, name, semester FROM subjects WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to fetch subject")?;

        Ok(subject)
    }

    async fn find_lecturer(&self, id: Uuid) -> Result<Option<Lecturer>> {
        let lecturer =
            sqlx::query_as::<_, Lecturer>("SELECT id, name, faculty FROM lecturers WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .context("failed to fetch lecturer")?;

        Ok(lecturer)
    }
}

#[async_trait]
impl ReportStore for PgStore {
    async fn create_report(&self, reporter_id: Uuid, input: NewReport) -> Result<Report> {
        let report = sqlx::query_as::<_, Report>(
            r#"
            INSERT INTO reports (id, reporter_id, review_id, lecturer_id, type, body, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, reporter_id, review_id, lecturer_id, type, body, status, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(reporter_id)
        .bind(input.id_review)
        .bind(input.id_lecturer)
        .bind(&input.report_type)
        .bind(&input.body)
        .bind(REPORT_STATUS_PENDING)
        .fetch_one(&self.pool)
        .await
        .context("failed to create report")?;

        Ok(report)
    }

    async fn reports_by(&self, reporter_id: Uuid) -> Result<Vec<Report>> {
        let reports = sqlx::query_as::<_, Report>(
            r#"
            SELECT id, reporter_id, review_id, lecturer_id, type, body, status, created_at
            FROM reports
            WHERE reporter_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(reporter_id)
        .fetch_all(&self.pool)
        .await
        .context("failed to list reports")?;

        Ok(reports)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn is_healthy(&self) -> bool {
        db::check_health(&self.pool).await
    }

    async fn stats(&self) -> Result<SiteStats> {
        let row = sqlx::query_as::<_, StatsRow>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS total_users,
                (SELECT COUNT(*) FROM reviews) AS total_reviews,
                (SELECT COUNT(*) FROM forums) AS total_forums,
                (SELECT COUNT(*) FROM reports WHERE status = $1) AS pending_reports
            "#,
        )
        .bind(REPORT_STATUS_PENDING)
        .fetch_one(&self.pool)
        .await
        .context("failed to load site stats")?;

        Ok(SiteStats {
            total_users: non_negative(row.total_users),
            total_reviews: non_negative(row.total_reviews),
            total_forums: non_negative(row.total_forums),
            pending_reports: non_negative(row.pending_reports),
        })
    }
}
