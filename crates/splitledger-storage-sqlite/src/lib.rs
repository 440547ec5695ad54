//! SQLite-backed persistence for the expense ledger.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};
use uuid::Uuid;

use splitledger_core::membership::MembershipProvider;
use splitledger_core::storage::{LedgerStore, StorageError};
use splitledger_domain::{
    Expense, ExpenseCategory, ExpenseId, ExpenseSplit, GroupId, Money, Settlement, SettlementId,
    UserId,
};

/// SQLite-backed [`LedgerStore`] and [`MembershipProvider`].
///
/// Cheap to clone; clones share one connection. Identifiers are stored as
/// uuid text, timestamps as RFC 3339 text, and amounts as minor-unit
/// integers.
#[derive(Clone)]
pub struct SqliteLedgerStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLedgerStore {
    /// Opens or creates the ledger database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(backend)?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(backend)?;
        info!(path = %path.display(), "ledger database opened");
        Self::from_connection(conn)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(backend)?;
        info!("in-memory ledger database opened");
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        create_schema(&conn).map_err(backend)?;
        debug!("ledger schema ensured");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Registers a group so membership and ledger queries can resolve it.
    pub fn create_group(&self) -> Result<GroupId, StorageError> {
        let conn = self.lock()?;
        let group = GroupId::new();
        conn.execute(
            "INSERT INTO groups (id, created_at) VALUES (?1, ?2)",
            params![group.to_string(), Utc::now().to_rfc3339()],
        )
        .map_err(backend)?;
        Ok(group)
    }

    /// Adds a member to the group, reactivating them if they left earlier.
    pub fn add_member(&self, group: GroupId, user: UserId) -> Result<(), StorageError> {
        let conn = self.lock()?;
        require_group(&conn, group)?;
        conn.execute(
            "INSERT INTO memberships (group_id, user_id, active) VALUES (?1, ?2, 1)
             ON CONFLICT (group_id, user_id) DO UPDATE SET active = 1",
            params![group.to_string(), user.to_string()],
        )
        .map_err(backend)?;
        Ok(())
    }

    /// Marks a member inactive without erasing their ledger history.
    pub fn deactivate_member(&self, group: GroupId, user: UserId) -> Result<(), StorageError> {
        let conn = self.lock()?;
        require_group(&conn, group)?;
        let updated = conn
            .execute(
                "UPDATE memberships SET active = 0 WHERE group_id = ?1 AND user_id = ?2",
                params![group.to_string(), user.to_string()],
            )
            .map_err(backend)?;
        if updated == 0 {
            return Err(StorageError::UnknownUser(user));
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Backend("sqlite connection lock poisoned".into()))
    }
}

impl LedgerStore for SqliteLedgerStore {
    fn insert_expense(
        &self,
        expense: &Expense,
        splits: &[ExpenseSplit],
    ) -> Result<(), StorageError> {
        let mut conn = self.lock()?;
        require_group(&conn, expense.group)?;
        let tx = conn.transaction().map_err(backend)?;
        tx.execute(
            "INSERT INTO expenses
                 (id, group_id, paid_by, title, description, amount, date, category, receipt, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                expense.id.to_string(),
                expense.group.to_string(),
                expense.paid_by.to_string(),
                expense.title,
                expense.description,
                expense.amount.minor_units(),
                expense.date.to_string(),
                expense.category.key(),
                expense.receipt,
                expense.created_at.to_rfc3339(),
            ],
        )
        .map_err(backend)?;
        for split in splits {
            tx.execute(
                "INSERT INTO expense_splits (expense_id, user_id, amount_owed, is_settled)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    split.expense.to_string(),
                    split.user.to_string(),
                    split.amount_owed.minor_units(),
                    split.is_settled,
                ],
            )
            .map_err(backend)?;
        }
        tx.commit().map_err(backend)?;
        Ok(())
    }

    fn delete_expense(&self, expense: ExpenseId) -> Result<(), StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(backend)?;
        tx.execute(
            "DELETE FROM expense_splits WHERE expense_id = ?1",
            params![expense.to_string()],
        )
        .map_err(backend)?;
        tx.execute(
            "DELETE FROM expenses WHERE id = ?1",
            params![expense.to_string()],
        )
        .map_err(backend)?;
        tx.commit().map_err(backend)?;
        Ok(())
    }

    fn expense(&self, expense: ExpenseId) -> Result<Option<Expense>, StorageError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, group_id, paid_by, title, description, amount, date, category, receipt, created_at
             FROM expenses WHERE id = ?1",
            params![expense.to_string()],
            expense_from_row,
        )
        .optional()
        .map_err(backend)
    }

    fn splits_for_expense(&self, expense: ExpenseId) -> Result<Vec<ExpenseSplit>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT expense_id, user_id, amount_owed, is_settled
                 FROM expense_splits WHERE expense_id = ?1 ORDER BY rowid",
            )
            .map_err(backend)?;
        let splits = stmt
            .query_map(params![expense.to_string()], split_from_row)
            .map_err(backend)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(backend)?;
        Ok(splits)
    }

    fn insert_settlement(&self, settlement: &Settlement) -> Result<(), StorageError> {
        let conn = self.lock()?;
        require_group(&conn, settlement.group)?;
        conn.execute(
            "INSERT INTO settlements (id, group_id, from_user, to_user, amount, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                settlement.id.to_string(),
                settlement.group.to_string(),
                settlement.from_user.to_string(),
                settlement.to_user.to_string(),
                settlement.amount.minor_units(),
                settlement.created_at.to_rfc3339(),
            ],
        )
        .map_err(backend)?;
        Ok(())
    }

    fn expenses_in_group(&self, group: GroupId) -> Result<Vec<Expense>, StorageError> {
        let conn = self.lock()?;
        require_group(&conn, group)?;
        let mut stmt = conn
            .prepare(
                "SELECT id, group_id, paid_by, title, description, amount, date, category, receipt, created_at
                 FROM expenses WHERE group_id = ?1 ORDER BY rowid",
            )
            .map_err(backend)?;
        let expenses = stmt
            .query_map(params![group.to_string()], expense_from_row)
            .map_err(backend)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(backend)?;
        Ok(expenses)
    }

    fn splits_in_group(&self, group: GroupId) -> Result<Vec<ExpenseSplit>, StorageError> {
        let conn = self.lock()?;
        require_group(&conn, group)?;
        let mut stmt = conn
            .prepare(
                "SELECT s.expense_id, s.user_id, s.amount_owed, s.is_settled
                 FROM expense_splits s
                 JOIN expenses e ON e.id = s.expense_id
                 WHERE e.group_id = ?1 ORDER BY s.rowid",
            )
            .map_err(backend)?;
        let splits = stmt
            .query_map(params![group.to_string()], split_from_row)
            .map_err(backend)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(backend)?;
        Ok(splits)
    }

    fn settlements_in_group(&self, group: GroupId) -> Result<Vec<Settlement>, StorageError> {
        let conn = self.lock()?;
        require_group(&conn, group)?;
        let mut stmt = conn
            .prepare(
                "SELECT id, group_id, from_user, to_user, amount, created_at
                 FROM settlements WHERE group_id = ?1 ORDER BY rowid",
            )
            .map_err(backend)?;
        let settlements = stmt
            .query_map(params![group.to_string()], settlement_from_row)
            .map_err(backend)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(backend)?;
        Ok(settlements)
    }
}

impl MembershipProvider for SqliteLedgerStore {
    fn is_active_member(&self, group: GroupId, user: UserId) -> Result<bool, StorageError> {
        let conn = self.lock()?;
        require_group(&conn, group)?;
        let active = conn
            .query_row(
                "SELECT active FROM memberships WHERE group_id = ?1 AND user_id = ?2",
                params![group.to_string(), user.to_string()],
                |row| row.get::<_, bool>(0),
            )
            .optional()
            .map_err(backend)?;
        Ok(active.unwrap_or(false))
    }

    fn active_members(&self, group: GroupId) -> Result<Vec<UserId>, StorageError> {
        let conn = self.lock()?;
        require_group(&conn, group)?;
        let mut stmt = conn
            .prepare(
                "SELECT user_id FROM memberships
                 WHERE group_id = ?1 AND active = 1 ORDER BY rowid",
            )
            .map_err(backend)?;
        let users = stmt
            .query_map(params![group.to_string()], |row| text_uuid(row, 0))
            .map_err(backend)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(backend)?;
        Ok(users.into_iter().map(UserId::from).collect())
    }

    fn groups_for(&self, user: UserId) -> Result<Vec<GroupId>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT group_id FROM memberships
                 WHERE user_id = ?1 AND active = 1 ORDER BY group_id",
            )
            .map_err(backend)?;
        let groups = stmt
            .query_map(params![user.to_string()], |row| text_uuid(row, 0))
            .map_err(backend)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(backend)?;
        Ok(groups.into_iter().map(GroupId::from).collect())
    }
}

fn create_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS groups (
            id TEXT PRIMARY KEY,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS memberships (
            group_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 1,
            PRIMARY KEY (group_id, user_id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS expenses (
            id TEXT PRIMARY KEY,
            group_id TEXT NOT NULL,
            paid_by TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            amount INTEGER NOT NULL,
            date TEXT NOT NULL,
            category TEXT NOT NULL,
            receipt TEXT,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS expense_splits (
            expense_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            amount_owed INTEGER NOT NULL,
            is_settled INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (expense_id, user_id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settlements (
            id TEXT PRIMARY KEY,
            group_id TEXT NOT NULL,
            from_user TEXT NOT NULL,
            to_user TEXT NOT NULL,
            amount INTEGER NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_expenses_group ON expenses(group_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_splits_expense ON expense_splits(expense_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_settlements_group ON settlements(group_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_memberships_user ON memberships(user_id)",
        [],
    )?;

    Ok(())
}

fn require_group(conn: &Connection, group: GroupId) -> Result<(), StorageError> {
    let known: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM groups WHERE id = ?1",
            params![group.to_string()],
            |row| row.get(0),
        )
        .map_err(backend)?;
    if known == 0 {
        return Err(StorageError::UnknownGroup(group));
    }
    Ok(())
}

fn expense_from_row(row: &Row<'_>) -> Result<Expense, rusqlite::Error> {
    let key: String = row.get(7)?;
    let category = ExpenseCategory::from_key(&key).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            7,
            Type::Text,
            format!("unknown expense category: {key}").into(),
        )
    })?;
    Ok(Expense {
        id: ExpenseId::from(text_uuid(row, 0)?),
        group: GroupId::from(text_uuid(row, 1)?),
        paid_by: UserId::from(text_uuid(row, 2)?),
        title: row.get(3)?,
        description: row.get(4)?,
        amount: Money::from_minor(row.get(5)?),
        date: text_date(row, 6)?,
        category,
        receipt: row.get(8)?,
        created_at: text_datetime(row, 9)?,
    })
}

fn split_from_row(row: &Row<'_>) -> Result<ExpenseSplit, rusqlite::Error> {
    Ok(ExpenseSplit {
        expense: ExpenseId::from(text_uuid(row, 0)?),
        user: UserId::from(text_uuid(row, 1)?),
        amount_owed: Money::from_minor(row.get(2)?),
        is_settled: row.get(3)?,
    })
}

fn settlement_from_row(row: &Row<'_>) -> Result<Settlement, rusqlite::Error> {
    Ok(Settlement {
        id: SettlementId::from(text_uuid(row, 0)?),
        group: GroupId::from(text_uuid(row, 1)?),
        from_user: UserId::from(text_uuid(row, 2)?),
        to_user: UserId::from(text_uuid(row, 3)?),
        amount: Money::from_minor(row.get(4)?),
        created_at: text_datetime(row, 5)?,
    })
}

fn text_uuid(row: &Row<'_>, idx: usize) -> Result<Uuid, rusqlite::Error> {
    let text: String = row.get(idx)?;
    Uuid::parse_str(&text)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

fn text_date(row: &Row<'_>, idx: usize) -> Result<NaiveDate, rusqlite::Error> {
    let text: String = row.get(idx)?;
    NaiveDate::parse_from_str(&text, "%Y-%m-%d")
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

fn text_datetime(row: &Row<'_>, idx: usize) -> Result<DateTime<Utc>, rusqlite::Error> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|stamp| stamp.with_timezone(&Utc))
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

fn backend(err: rusqlite::Error) -> StorageError {
    StorageError::Backend(err.to_string())
}
