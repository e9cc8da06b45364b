//! # Account Repository
//!
//! User profiles and settings in the account store.
//!
//! The document store references accounts only by `uid`. Lookups from the
//! catalog side are advisory: an id with no account simply has no entry in
//! the returned map.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use harvest_core::{
    Account, AccountRole, AccountSettings, FarmerDetails, ProfileUpdate, SettingsUpdate,
};

const SELECT_ACCOUNTS: &str = "SELECT uid, name, email, role, mobile, bio, location, \
     profile_image, email_notifications, public_profile, show_location, created_at, updated_at \
     FROM users ";

#[derive(Debug, FromRow)]
struct AccountRow {
    uid: String,
    name: String,
    email: String,
    role: String,
    mobile: Option<String>,
    bio: Option<String>,
    location: Option<String>,
    profile_image: Option<String>,
    email_notifications: bool,
    public_profile: bool,
    show_location: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = DbError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let role: AccountRole = row
            .role
            .parse()
            .map_err(|e| DbError::invalid_data("users.role", e))?;

        Ok(Account {
            uid: row.uid,
            name: row.name,
            email: row.email,
            role,
            mobile: row.mobile,
            bio: row.bio,
            location: row.location,
            profile_image: row.profile_image,
            settings: AccountSettings {
                email_notifications: row.email_notifications,
                public_profile: row.public_profile,
                show_location: row.show_location,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for account operations.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: SqlitePool,
}

impl AccountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AccountRepository { pool }
    }

    pub async fn get(&self, uid: &str) -> DbResult<Option<Account>> {
        let mut query = QueryBuilder::<Sqlite>::new(SELECT_ACCOUNTS);
        query.push("WHERE uid = ").push_bind(uid);

        let row = query
            .build_query_as::<AccountRow>()
            .fetch_optional(&self.pool)
            .await?;

        row.map(Account::try_from).transpose()
    }

    /// Seller details for every farmer among `uids`.
    ///
    /// Unknown uids and non-farmer accounts are absent from the map.
    pub async fn farmers_by_ids(&self, uids: &[String]) -> DbResult<HashMap<String, FarmerDetails>> {
        if uids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new(SELECT_ACCOUNTS);
        query.push("WHERE uid IN (");
        let mut separated = query.separated(", ");
        for uid in uids {
            separated.push_bind(uid);
        }
        separated.push_unseparated(")");

        let rows = query
            .build_query_as::<AccountRow>()
            .fetch_all(&self.pool)
            .await?;

        let mut farmers = HashMap::new();
        for row in rows {
            let account = Account::try_from(row)?;
            if let Some(details) = FarmerDetails::from_account(&account) {
                farmers.insert(account.uid, details);
            }
        }

        debug!(requested = uids.len(), found = farmers.len(), "Resolved farmer accounts");
        Ok(farmers)
    }

    pub async fn insert(&self, account: &Account) -> DbResult<Account> {
        debug!(uid = %account.uid, role = %account.role, "Inserting account");

        sqlx::query(
            r#"
            INSERT INTO users (
                uid, name, email, role, mobile, bio, location, profile_image,
                email_notifications, public_profile, show_location,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&account.uid)
        .bind(&account.name)
        .bind(&account.email)
        .bind(account.role.as_str())
        .bind(&account.mobile)
        .bind(&account.bio)
        .bind(&account.location)
        .bind(&account.profile_image)
        .bind(account.settings.email_notifications)
        .bind(account.settings.public_profile)
        .bind(account.settings.show_location)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(account.clone())
    }

    /// Applies the non-empty fields of `update` and returns the stored account.
    pub async fn update_profile(&self, uid: &str, update: ProfileUpdate) -> DbResult<Account> {
        let mut account = self
            .get(uid)
            .await?
            .ok_or_else(|| DbError::not_found("Account", uid))?;

        update.apply_to(&mut account);
        account.updated_at = Utc::now();

        debug!(uid = %uid, "Updating profile");

        sqlx::query(
            r#"
            UPDATE users SET
                name = ?2,
                mobile = ?3,
                bio = ?4,
                location = ?5,
                profile_image = ?6,
                updated_at = ?7
            WHERE uid = ?1
            "#,
        )
        .bind(uid)
        .bind(&account.name)
        .bind(&account.mobile)
        .bind(&account.bio)
        .bind(&account.location)
        .bind(&account.profile_image)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(account)
    }

    /// Applies a partial settings edit and returns the resulting settings.
    pub async fn update_settings(
        &self,
        uid: &str,
        update: SettingsUpdate,
    ) -> DbResult<AccountSettings> {
        let mut account = self
            .get(uid)
            .await?
            .ok_or_else(|| DbError::not_found("Account", uid))?;

        update.apply_to(&mut account.settings);

        sqlx::query(
            r#"
            UPDATE users SET
                email_notifications = ?2,
                public_profile = ?3,
                show_location = ?4,
                updated_at = ?5
            WHERE uid = ?1
            "#,
        )
        .bind(uid)
        .bind(account.settings.email_notifications)
        .bind(account.settings.public_profile)
        .bind(account.settings.show_location)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(account.settings)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
