//! Intentions: the per-day task items a user tracks.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::Result;
use crate::clock::millis_to_datetime;

use super::errors::StoreError;
use super::{SqlxResultExt, Store};

const COLUMNS: &str = "id, title, date, created_at, sort_order, creator_id, \
                       completed, neverminded, sticky, froggy, anxiety_inducing";

/// A tracked task for a single day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Intention {
    pub id: i64,
    pub title: String,
    pub date: NaiveDate,
    /// Creation time in milliseconds since the Unix epoch
    pub created_at: i64,
    #[sqlx(rename = "sort_order")]
    pub order: i64,
    pub creator_id: i64,
    pub completed: bool,
    pub neverminded: bool,
    pub sticky: bool,
    /// The single most important task of the day
    pub froggy: bool,
    pub anxiety_inducing: bool,
}

impl Intention {
    /// Derived lifecycle status.
    pub fn status(&self) -> IntentionStatus {
        if self.completed {
            IntentionStatus::Completed
        } else if self.neverminded {
            IntentionStatus::Neverminded
        } else {
            IntentionStatus::Active
        }
    }

    /// Creation time as an RFC3339 string.
    pub fn created_rfc3339(&self) -> String {
        millis_to_datetime(self.created_at.max(0) as u64).to_rfc3339()
    }
}

/// Lifecycle status of an intention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentionStatus {
    Active,
    Completed,
    Neverminded,
}

impl IntentionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentionStatus::Active => "active",
            IntentionStatus::Completed => "completed",
            IntentionStatus::Neverminded => "neverminded",
        }
    }
}

/// Boolean flags that can be toggled on an intention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusField {
    Completed,
    Neverminded,
    Sticky,
    Froggy,
    AnxietyInducing,
}

impl StatusField {
    /// All fields, in the order they are presented to the assistant.
    pub const ALL: [StatusField; 5] = [
        StatusField::Completed,
        StatusField::Neverminded,
        StatusField::Sticky,
        StatusField::Froggy,
        StatusField::AnxietyInducing,
    ];

    /// Column name, also the identifier used in tool input.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusField::Completed => "completed",
            StatusField::Neverminded => "neverminded",
            StatusField::Sticky => "sticky",
            StatusField::Froggy => "froggy",
            StatusField::AnxietyInducing => "anxiety_inducing",
        }
    }

    /// Human-readable name for messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            StatusField::Completed => "completed",
            StatusField::Neverminded => "neverminded",
            StatusField::Sticky => "sticky",
            StatusField::Froggy => "frog (most important)",
            StatusField::AnxietyInducing => "anxiety-inducing",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == s)
    }
}

/// Status filter for listing intentions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    Active,
    Completed,
    Neverminded,
    #[default]
    All,
}

impl StatusFilter {
    pub const ALL: [StatusFilter; 4] = [
        StatusFilter::Active,
        StatusFilter::Completed,
        StatusFilter::Neverminded,
        StatusFilter::All,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::Active => "active",
            StatusFilter::Completed => "completed",
            StatusFilter::Neverminded => "neverminded",
            StatusFilter::All => "all",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == s)
    }

    fn sql_clause(&self) -> &'static str {
        match self {
            StatusFilter::Active => " AND completed = 0 AND neverminded = 0",
            StatusFilter::Completed => " AND completed = 1",
            StatusFilter::Neverminded => " AND neverminded = 1",
            StatusFilter::All => "",
        }
    }
}

/// Fields for creating an intention.
///
/// `date: None` means the store's current working day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewIntention {
    pub title: String,
    pub date: Option<NaiveDate>,
    pub froggy: bool,
    pub sticky: bool,
    pub anxiety_inducing: bool,
}

impl NewIntention {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn froggy(mut self) -> Self {
        self.froggy = true;
        self
    }

    pub fn sticky(mut self) -> Self {
        self.sticky = true;
        self
    }
}

/// Title and/or date changes for an existing intention.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntentionUpdate {
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
}

async fn fetch_frog(
    conn: &mut SqliteConnection,
    user_id: i64,
    date: NaiveDate,
    exclude: Option<i64>,
) -> Result<Option<Intention>> {
    sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM intentions
         WHERE creator_id = $1 AND date = $2 AND froggy = 1 AND id != $3
         ORDER BY sort_order, created_at, id LIMIT 1"
    ))
    .bind(user_id)
    .bind(date)
    .bind(exclude.unwrap_or(-1))
    .fetch_optional(conn)
    .await
    .sql_context("Failed to look up frog")
}

async fn ensure_no_frog(
    conn: &mut SqliteConnection,
    user_id: i64,
    date: NaiveDate,
    exclude: Option<i64>,
) -> Result<()> {
    match fetch_frog(conn, user_id, date, exclude).await? {
        Some(existing) => Err(StoreError::FrogExists {
            date,
            title: existing.title,
        }
        .into()),
        None => Ok(()),
    }
}

async fn insert(
    conn: &mut SqliteConnection,
    user_id: i64,
    new: &NewIntention,
    date: NaiveDate,
    created_at: i64,
) -> Result<Intention> {
    sqlx::query_as(&format!(
        "INSERT INTO intentions
            (title, date, created_at, sort_order, creator_id,
             completed, neverminded, sticky, froggy, anxiety_inducing)
         VALUES ($1, $2, $3, 0, $4, 0, 0, $5, $6, $7)
         RETURNING {COLUMNS}"
    ))
    .bind(&new.title)
    .bind(date)
    .bind(created_at)
    .bind(user_id)
    .bind(new.sticky)
    .bind(new.froggy)
    .bind(new.anxiety_inducing)
    .fetch_one(conn)
    .await
    .sql_context("Failed to insert intention")
}

async fn fetch_owned(conn: &mut SqliteConnection, user_id: i64, id: i64) -> Result<Intention> {
    let row: Option<Intention> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM intentions WHERE id = $1 AND creator_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(conn)
    .await
    .sql_context("Failed to get intention")?;

    row.ok_or_else(|| StoreError::IntentionNotFound { id }.into())
}

impl Store {
    /// Create a single intention, enforcing one frog per day.
    pub async fn create_intention(&self, user_id: i64, new: NewIntention) -> Result<Intention> {
        let date = new.date.unwrap_or_else(|| self.clock().working_day());
        let mut tx = self
            .pool()
            .begin()
            .await
            .sql_context("Failed to begin transaction")?;

        if new.froggy {
            ensure_no_frog(&mut tx, user_id, date, None).await?;
        }
        let intention = insert(&mut tx, user_id, &new, date, self.now_millis()).await?;

        tx.commit().await.sql_context("Failed to commit intention")?;

        tracing::info!(
            intention_id = intention.id,
            user_id,
            "Created intention: {}",
            intention.title
        );
        Ok(intention)
    }

    /// Create several intentions atomically.
    ///
    /// Either every intention is created or none is. Only one frog may appear in
    /// the batch and its date must not already have one.
    pub async fn create_intentions(
        &self,
        user_id: i64,
        batch: Vec<NewIntention>,
    ) -> Result<Vec<Intention>> {
        let working_day = self.clock().working_day();
        let mut tx = self
            .pool()
            .begin()
            .await
            .sql_context("Failed to begin transaction")?;

        if let Some(frog) = batch.iter().find(|n| n.froggy) {
            ensure_no_frog(&mut tx, user_id, frog.date.unwrap_or(working_day), None).await?;
        }

        let mut created = Vec::with_capacity(batch.len());
        for new in &batch {
            let date = new.date.unwrap_or(working_day);
            created.push(insert(&mut tx, user_id, new, date, self.now_millis()).await?);
        }

        tx.commit().await.sql_context("Failed to commit batch")?;

        tracing::info!(user_id, "Batch created {} intentions", created.len());
        Ok(created)
    }

    /// Get an intention owned by the user.
    pub async fn intention(&self, user_id: i64, id: i64) -> Result<Intention> {
        let mut conn = self
            .pool()
            .acquire()
            .await
            .sql_context("Failed to acquire connection")?;
        fetch_owned(&mut conn, user_id, id).await
    }

    /// List a user's intentions for one date, in display order.
    pub async fn list_intentions(
        &self,
        user_id: i64,
        date: NaiveDate,
        filter: StatusFilter,
    ) -> Result<Vec<Intention>> {
        sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM intentions
             WHERE creator_id = $1 AND date = $2{}
             ORDER BY sort_order, created_at, id",
            filter.sql_clause()
        ))
        .bind(user_id)
        .bind(date)
        .fetch_all(self.pool())
        .await
        .sql_context("Failed to list intentions")
    }

    /// List a user's intentions for an inclusive date range, newest date first.
    pub async fn list_intentions_between(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Intention>> {
        sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM intentions
             WHERE creator_id = $1 AND date >= $2 AND date <= $3
             ORDER BY date DESC, created_at, id"
        ))
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(self.pool())
        .await
        .sql_context("Failed to list intentions")
    }

    /// Set one boolean flag.
    ///
    /// Setting `froggy` fails if another intention on the same date is already the frog.
    pub async fn set_intention_flag(
        &self,
        user_id: i64,
        id: i64,
        field: StatusField,
        value: bool,
    ) -> Result<Intention> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .sql_context("Failed to begin transaction")?;

        let intention = fetch_owned(&mut tx, user_id, id).await?;
        if field == StatusField::Froggy && value {
            ensure_no_frog(&mut tx, user_id, intention.date, Some(id)).await?;
        }

        // Column names come from a closed enum, never from input.
        sqlx::query(&format!(
            "UPDATE intentions SET {} = $1 WHERE id = $2",
            field.as_str()
        ))
        .bind(value)
        .bind(id)
        .execute(&mut *tx)
        .await
        .sql_context("Failed to update intention")?;

        let updated = fetch_owned(&mut tx, user_id, id).await?;
        tx.commit().await.sql_context("Failed to commit update")?;

        tracing::info!(
            intention_id = id,
            user_id,
            "Updated intention: {}={}",
            field.as_str(),
            value
        );
        Ok(updated)
    }

    /// Change title and/or date.
    ///
    /// A frog cannot be moved onto a date that already has one.
    pub async fn update_intention(
        &self,
        user_id: i64,
        id: i64,
        update: IntentionUpdate,
    ) -> Result<Intention> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .sql_context("Failed to begin transaction")?;

        let current = fetch_owned(&mut tx, user_id, id).await?;
        let title = update.title.unwrap_or(current.title.clone());
        let date = update.date.unwrap_or(current.date);

        if current.froggy && date != current.date {
            ensure_no_frog(&mut tx, user_id, date, Some(id)).await?;
        }

        sqlx::query("UPDATE intentions SET title = $1, date = $2 WHERE id = $3")
            .bind(&title)
            .bind(date)
            .bind(id)
            .execute(&mut *tx)
            .await
            .sql_context("Failed to update intention")?;

        let updated = fetch_owned(&mut tx, user_id, id).await?;
        tx.commit().await.sql_context("Failed to commit update")?;
        Ok(updated)
    }

    /// Reorder intentions on a date: position in `ids` becomes the sort order.
    ///
    /// Every ID must belong to the user and sit on `date`.
    pub async fn reorder_intentions(
        &self,
        user_id: i64,
        date: NaiveDate,
        ids: &[i64],
    ) -> Result<Vec<Intention>> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .sql_context("Failed to begin transaction")?;

        let mut count_query =
            QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM intentions WHERE creator_id = ");
        count_query
            .push_bind(user_id)
            .push(" AND date = ")
            .push_bind(date)
            .push(" AND id IN (");
        let mut separated = count_query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let (found,): (i64,) = count_query
            .build_query_as()
            .fetch_one(&mut *tx)
            .await
            .sql_context("Failed to verify intentions")?;

        if found as usize != ids.len() {
            return Err(StoreError::IntentionsMissing {
                date,
                found: found as usize,
                expected: ids.len(),
            }
            .into());
        }

        for (position, id) in ids.iter().enumerate() {
            sqlx::query("UPDATE intentions SET sort_order = $1 WHERE id = $2")
                .bind(position as i64)
                .bind(*id)
                .execute(&mut *tx)
                .await
                .sql_context("Failed to reorder intention")?;
        }

        let mut reordered = Vec::with_capacity(ids.len());
        for id in ids {
            reordered.push(fetch_owned(&mut tx, user_id, *id).await?);
        }

        tx.commit().await.sql_context("Failed to commit reorder")?;

        tracing::info!(user_id, %date, "Reordered {} intentions", ids.len());
        Ok(reordered)
    }

    /// Permanently delete an intention, returning what was removed.
    pub async fn delete_intention(&self, user_id: i64, id: i64) -> Result<Intention> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .sql_context("Failed to begin transaction")?;

        let intention = fetch_owned(&mut tx, user_id, id).await?;
        sqlx::query("DELETE FROM intentions WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .sql_context("Failed to delete intention")?;

        tx.commit().await.sql_context("Failed to commit delete")?;

        tracing::info!(intention_id = id, user_id, "Deleted intention: {}", intention.title);
        Ok(intention)
    }

    /// Most recent date the user has any intention on.
    pub async fn latest_intention_date(&self, user_id: i64) -> Result<Option<NaiveDate>> {
        let row: (Option<NaiveDate>,) =
            sqlx::query_as("SELECT MAX(date) FROM intentions WHERE creator_id = $1")
                .bind(user_id)
                .fetch_one(self.pool())
                .await
                .sql_context("Failed to find latest intention date")?;
        Ok(row.0)
    }

    /// Copy sticky intentions from one date to another.
    ///
    /// Neverminded stickies stay behind, and a title already present as a sticky
    /// on the target date is not duplicated. Copies start out not completed.
    pub async fn copy_sticky_intentions(
        &self,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<usize> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .sql_context("Failed to begin transaction")?;

        let stickies: Vec<Intention> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM intentions
             WHERE creator_id = $1 AND date = $2 AND sticky = 1 AND neverminded = 0
             ORDER BY sort_order, created_at, id"
        ))
        .bind(user_id)
        .bind(from)
        .fetch_all(&mut *tx)
        .await
        .sql_context("Failed to list sticky intentions")?;

        let mut copied = 0;
        for sticky in stickies {
            let (existing,): (i64,) = sqlx::query_as(
                "SELECT COUNT(*) FROM intentions
                 WHERE creator_id = $1 AND date = $2 AND title = $3 AND sticky = 1",
            )
            .bind(user_id)
            .bind(to)
            .bind(&sticky.title)
            .fetch_one(&mut *tx)
            .await
            .sql_context("Failed to check for existing sticky")?;

            if existing == 0 {
                let new = NewIntention::new(sticky.title).sticky();
                insert(&mut tx, user_id, &new, to, self.now_millis()).await?;
                copied += 1;
            }
        }

        tx.commit().await.sql_context("Failed to commit sticky copy")?;
        Ok(copied)
    }

    /// Carry stickies forward one day at a time from the latest date with
    /// intentions up to `until`, so gaps of several days are filled in.
    pub async fn carry_sticky_intentions_forward(
        &self,
        user_id: i64,
        until: NaiveDate,
    ) -> Result<usize> {
        let Some(mut current) = self.latest_intention_date(user_id).await? else {
            return Ok(0);
        };

        let mut total = 0;
        while current < until {
            let next = current + Duration::days(1);
            total += self.copy_sticky_intentions(user_id, current, next).await?;
            current = next;
        }

        if total > 0 {
            tracing::debug!(user_id, %until, "Carried {total} sticky intentions forward");
        }
        Ok(total)
    }
}
