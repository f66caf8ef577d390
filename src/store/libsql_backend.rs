//! libSQL backend — async implementation of the store traits.
//!
//! Supports local file and in-memory databases. Timestamps are stored as
//! RFC 3339 text; enums as their snake_case strings.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::account::model::{Account, Generation, LifecycleState, ParticipantType, Surface};
use crate::error::StoreError;
use crate::profile::{ApprovalState, Profile, RequiredDocuments};
use crate::store::migrations;
use crate::store::traits::{AccountStore, ChallengeStore, CreateOutcome, ProfileStore};

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        migrations::run_migrations(&backend.conn).await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StoreError::Pool(format!("Failed to create in-memory database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        migrations::run_migrations(&backend.conn).await?;
        Ok(backend)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

fn surface_to_str(surface: Surface) -> &'static str {
    match surface {
        Surface::Customer => "customer",
        Surface::Vendor => "vendor",
    }
}

fn str_to_surface(s: &str) -> Option<Surface> {
    match s {
        "customer" => Some(Surface::Customer),
        "vendor" => Some(Surface::Vendor),
        _ => None,
    }
}

fn generation_to_str(generation: Generation) -> &'static str {
    match generation {
        Generation::Legacy => "legacy",
        Generation::Current => "current",
    }
}

fn str_to_generation(s: &str) -> Generation {
    match s {
        "legacy" => Generation::Legacy,
        _ => Generation::Current,
    }
}

fn participant_to_str(participant: ParticipantType) -> &'static str {
    match participant {
        ParticipantType::Unset => "unset",
        ParticipantType::Business => "business",
        ParticipantType::Retail => "retail",
        ParticipantType::BusinessAndRetail => "business_and_retail",
        ParticipantType::Delivery => "delivery",
        ParticipantType::Customer => "customer",
        ParticipantType::AdminOperator => "admin_operator",
        ParticipantType::WebOperator => "web_operator",
    }
}

fn str_to_participant(s: &str) -> ParticipantType {
    match s {
        "business" => ParticipantType::Business,
        "retail" => ParticipantType::Retail,
        "business_and_retail" => ParticipantType::BusinessAndRetail,
        "delivery" => ParticipantType::Delivery,
        "customer" => ParticipantType::Customer,
        "admin_operator" => ParticipantType::AdminOperator,
        "web_operator" => ParticipantType::WebOperator,
        _ => ParticipantType::Unset,
    }
}

fn lifecycle_to_str(state: LifecycleState) -> &'static str {
    match state {
        LifecycleState::Active => "active",
        LifecycleState::SoftDeleted => "soft_deleted",
    }
}

fn str_to_lifecycle(s: &str) -> LifecycleState {
    match s {
        "soft_deleted" => LifecycleState::SoftDeleted,
        _ => LifecycleState::Active,
    }
}

fn approval_to_str(state: ApprovalState) -> &'static str {
    match state {
        ApprovalState::Pending => "pending",
        ApprovalState::Approved => "approved",
        ApprovalState::Rejected => "rejected",
    }
}

fn str_to_approval(s: &str) -> ApprovalState {
    match s {
        "approved" => ApprovalState::Approved,
        "rejected" => ApprovalState::Rejected,
        _ => ApprovalState::Pending,
    }
}

/// Convert `Option<&str>` to libsql Value.
fn opt_text(s: Option<&str>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s.to_string()),
        None => libsql::Value::Null,
    }
}

/// Convert `Option<String>` to libsql Value.
fn opt_text_owned(s: Option<String>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s),
        None => libsql::Value::Null,
    }
}

/// Column order shared by every account SELECT.
const ACCOUNT_COLUMNS: &str = "id, phone_number, generation, surface, participant_type, \
     lifecycle_state, notification_address, created_at, updated_at";

/// Map a libsql row to an Account.
///
/// Column order matches ACCOUNT_COLUMNS.
fn row_to_account(row: &libsql::Row) -> Result<Account, libsql::Error> {
    let id_str: String = row.get(0)?;
    let phone_number: String = row.get(1)?;
    let generation_str: String = row.get(2)?;
    let surface_str: Option<String> = row.get(3).ok();
    let participant_str: String = row.get(4)?;
    let lifecycle_str: String = row.get(5)?;
    let notification_address: Option<String> = row.get(6).ok();
    let created_str: String = row.get(7)?;
    let updated_str: String = row.get(8)?;

    Ok(Account {
        id: Uuid::parse_str(&id_str).unwrap_or_else(|_| Uuid::nil()),
        phone_number,
        generation: str_to_generation(&generation_str),
        surface: surface_str.as_deref().and_then(str_to_surface),
        participant_type: str_to_participant(&participant_str),
        lifecycle_state: str_to_lifecycle(&lifecycle_str),
        notification_address,
        created_at: parse_datetime(&created_str),
        updated_at: parse_datetime(&updated_str),
    })
}

const PROFILE_COLUMNS: &str = "account_id, company_name, tax_id, business_registration, \
     tax_certificate, bank_passbook, storefront_photo, display_name, display_address, \
     contact, identity_document, approval_state, created_at, updated_at";

fn row_to_profile(row: &libsql::Row) -> Result<Profile, libsql::Error> {
    let account_id_str: String = row.get(0)?;
    let approval_str: String = row.get(11)?;
    let created_str: String = row.get(12)?;
    let updated_str: String = row.get(13)?;

    Ok(Profile {
        account_id: Uuid::parse_str(&account_id_str).unwrap_or_else(|_| Uuid::nil()),
        company_name: row.get(1).ok(),
        tax_id: row.get(2).ok(),
        documents: RequiredDocuments {
            business_registration: row.get(3).ok(),
            tax_certificate: row.get(4).ok(),
            bank_passbook: row.get(5).ok(),
            storefront_photo: row.get(6).ok(),
        },
        display_name: row.get(7).ok(),
        display_address: row.get(8).ok(),
        contact: row.get(9).ok(),
        identity_document: row.get(10).ok(),
        approval_state: str_to_approval(&approval_str),
        created_at: parse_datetime(&created_str),
        updated_at: parse_datetime(&updated_str),
    })
}

async fn collect_accounts(
    mut rows: libsql::Rows,
    context: &str,
) -> Result<Vec<Account>, StoreError> {
    let mut accounts = Vec::new();
    loop {
        match rows.next().await {
            Ok(Some(row)) => {
                let account = row_to_account(&row)
                    .map_err(|e| StoreError::Query(format!("{context} row parse: {e}")))?;
                accounts.push(account);
            }
            Ok(None) => break,
            Err(e) => return Err(StoreError::Query(format!("{context}: {e}"))),
        }
    }
    Ok(accounts)
}

// ── AccountStore ────────────────────────────────────────────────────

#[async_trait]
impl AccountStore for LibSqlBackend {
    async fn get_account(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(|e| StoreError::Query(format!("get_account: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let account = row_to_account(&row)
                    .map_err(|e| StoreError::Query(format!("get_account row parse: {e}")))?;
                Ok(Some(account))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(StoreError::Query(format!("get_account: {e}"))),
        }
    }

    async fn find_by_phone_and_surface(
        &self,
        phone_number: &str,
        surface: Surface,
    ) -> Result<Vec<Account>, StoreError> {
        let conn = self.conn();
        let rows = conn
            .query(
                &format!(
                    "SELECT {ACCOUNT_COLUMNS} FROM accounts \
                     WHERE phone_number = ?1 AND surface = ?2 \
                     ORDER BY updated_at DESC"
                ),
                params![phone_number, surface_to_str(surface)],
            )
            .await
            .map_err(|e| StoreError::Query(format!("find_by_phone_and_surface: {e}")))?;

        collect_accounts(rows, "find_by_phone_and_surface").await
    }

    async fn find_by_phone(&self, phone_number: &str) -> Result<Vec<Account>, StoreError> {
        let conn = self.conn();
        let rows = conn
            .query(
                &format!(
                    "SELECT {ACCOUNT_COLUMNS} FROM accounts \
                     WHERE phone_number = ?1 \
                     ORDER BY updated_at DESC"
                ),
                params![phone_number],
            )
            .await
            .map_err(|e| StoreError::Query(format!("find_by_phone: {e}")))?;

        collect_accounts(rows, "find_by_phone").await
    }

    async fn create_if_absent(&self, account: &Account) -> Result<CreateOutcome, StoreError> {
        let conn = self.conn();
        let result = conn
            .execute(
                "INSERT INTO accounts (id, phone_number, generation, surface, participant_type, \
                 lifecycle_state, notification_address, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    account.id.to_string(),
                    account.phone_number.clone(),
                    generation_to_str(account.generation),
                    opt_text(account.surface.map(surface_to_str)),
                    participant_to_str(account.participant_type),
                    lifecycle_to_str(account.lifecycle_state),
                    opt_text_owned(account.notification_address.clone()),
                    account.created_at.to_rfc3339(),
                    account.updated_at.to_rfc3339(),
                ],
            )
            .await;

        match result {
            Ok(_) => {
                debug!(account_id = %account.id, phone = %account.phone_number, "Account inserted");
                Ok(CreateOutcome::Created)
            }
            Err(e) if e.to_string().contains("UNIQUE constraint failed") => {
                debug!(phone = %account.phone_number, "Conditional create lost the race");
                Ok(CreateOutcome::Conflict)
            }
            Err(e) => Err(StoreError::Query(format!("create_if_absent: {e}"))),
        }
    }

    async fn update_account(&self, account: &Account) -> Result<(), StoreError> {
        let conn = self.conn();
        // generation is immutable and deliberately absent from the SET list.
        let affected = conn
            .execute(
                "UPDATE accounts SET participant_type = ?1, lifecycle_state = ?2, \
                 notification_address = ?3, updated_at = ?4 WHERE id = ?5",
                params![
                    participant_to_str(account.participant_type),
                    lifecycle_to_str(account.lifecycle_state),
                    opt_text_owned(account.notification_address.clone()),
                    account.updated_at.to_rfc3339(),
                    account.id.to_string(),
                ],
            )
            .await
            .map_err(|e| StoreError::Query(format!("update_account: {e}")))?;

        if affected == 0 {
            return Err(StoreError::NotFound {
                entity: "account".to_string(),
                id: account.id.to_string(),
            });
        }
        debug!(account_id = %account.id, "Account updated");
        Ok(())
    }
}

// ── ProfileStore ────────────────────────────────────────────────────

#[async_trait]
impl ProfileStore for LibSqlBackend {
    async fn get_profile(&self, account_id: Uuid) -> Result<Option<Profile>, StoreError> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE account_id = ?1"),
                params![account_id.to_string()],
            )
            .await
            .map_err(|e| StoreError::Query(format!("get_profile: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let profile = row_to_profile(&row)
                    .map_err(|e| StoreError::Query(format!("get_profile row parse: {e}")))?;
                Ok(Some(profile))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(StoreError::Query(format!("get_profile: {e}"))),
        }
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO profiles (account_id, company_name, tax_id, business_registration, \
             tax_certificate, bank_passbook, storefront_photo, display_name, display_address, \
             contact, identity_document, approval_state, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14) \
             ON CONFLICT(account_id) DO UPDATE SET \
             company_name = excluded.company_name, tax_id = excluded.tax_id, \
             business_registration = excluded.business_registration, \
             tax_certificate = excluded.tax_certificate, \
             bank_passbook = excluded.bank_passbook, \
             storefront_photo = excluded.storefront_photo, \
             display_name = excluded.display_name, \
             display_address = excluded.display_address, \
             contact = excluded.contact, \
             identity_document = excluded.identity_document, \
             approval_state = excluded.approval_state, \
             updated_at = excluded.updated_at",
            params![
                profile.account_id.to_string(),
                opt_text_owned(profile.company_name.clone()),
                opt_text_owned(profile.tax_id.clone()),
                opt_text_owned(profile.documents.business_registration.clone()),
                opt_text_owned(profile.documents.tax_certificate.clone()),
                opt_text_owned(profile.documents.bank_passbook.clone()),
                opt_text_owned(profile.documents.storefront_photo.clone()),
                opt_text_owned(profile.display_name.clone()),
                opt_text_owned(profile.display_address.clone()),
                opt_text_owned(profile.contact.clone()),
                opt_text_owned(profile.identity_document.clone()),
                approval_to_str(profile.approval_state),
                profile.created_at.to_rfc3339(),
                profile.updated_at.to_rfc3339(),
            ],
        )
        .await
        .map_err(|e| StoreError::Query(format!("upsert_profile: {e}")))?;

        debug!(account_id = %profile.account_id, "Profile upserted");
        Ok(())
    }
}

// ── ChallengeStore ──────────────────────────────────────────────────

#[async_trait]
impl ChallengeStore for LibSqlBackend {
    async fn put_challenge(
        &self,
        phone_number: &str,
        surface: Surface,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO login_challenges (phone_number, surface, code, expires_at) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(phone_number, surface) DO UPDATE SET \
             code = excluded.code, expires_at = excluded.expires_at",
            params![
                phone_number,
                surface_to_str(surface),
                code,
                expires_at.to_rfc3339(),
            ],
        )
        .await
        .map_err(|e| StoreError::Query(format!("put_challenge: {e}")))?;
        Ok(())
    }

    async fn take_challenge(
        &self,
        phone_number: &str,
        surface: Surface,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let conn = self.conn();
        let affected = conn
            .execute(
                "DELETE FROM login_challenges \
                 WHERE phone_number = ?1 AND surface = ?2 AND code = ?3 AND expires_at > ?4",
                params![
                    phone_number,
                    surface_to_str(surface),
                    code,
                    now.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| StoreError::Query(format!("take_challenge: {e}")))?;

        Ok(affected > 0)
    }
}
