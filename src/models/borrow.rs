//! Borrow record model and related types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};

use crate::error::RuleViolation;

/// Borrow record lifecycle: `Borrowed` -> `Returned` (terminal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum BorrowStatus {
    #[serde(alias = "borrowed")]
    Borrowed,
    #[serde(alias = "returned")]
    Returned,
}

impl BorrowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowStatus::Borrowed => "borrowed",
            BorrowStatus::Returned => "returned",
        }
    }
}

impl std::fmt::Display for BorrowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BorrowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "borrowed" => Ok(BorrowStatus::Borrowed),
            "returned" => Ok(BorrowStatus::Returned),
            _ => Err(format!("Invalid borrow status: {}", s)),
        }
    }
}

// SQLx conversion for BorrowStatus (stored as TEXT)
impl sqlx::Type<Postgres> for BorrowStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for BorrowStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for BorrowStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Borrow record from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowRecord {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: BorrowStatus,
}

impl BorrowRecord {
    pub fn is_active(&self) -> bool {
        self.status == BorrowStatus::Borrowed
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_active() && self.due_date < now
    }

    /// Close the record. A returned record never changes again.
    pub fn mark_returned(&mut self, at: DateTime<Utc>) -> Result<(), RuleViolation> {
        if !self.is_active() {
            return Err(RuleViolation::NotBorrowed);
        }
        self.status = BorrowStatus::Returned;
        self.return_date = Some(at);
        Ok(())
    }
}

/// Borrow record about to be inserted
#[derive(Debug, Clone)]
pub struct NewBorrowRecord {
    pub user_id: i32,
    pub book_id: i32,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
}

impl NewBorrowRecord {
    pub fn new(user_id: i32, book_id: i32, borrow_date: DateTime<Utc>, loan_period: Duration) -> Self {
        Self {
            user_id,
            book_id,
            borrow_date,
            due_date: borrow_date + loan_period,
        }
    }
}

/// Borrow record listing parameters
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BorrowQuery {
    /// Only records in this status
    pub status: Option<BorrowStatus>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
