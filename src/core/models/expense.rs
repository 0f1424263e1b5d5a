use super::member::MemberId;
use crate::core::money::{Currency, Money};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A shared expense paid by one member on behalf of the whole group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub group_id: String,
    pub name: String,
    pub notes: Option<String>,
    pub payer: MemberId,
    pub amount: Money,
    pub currency: Currency,
    pub date: NaiveDate,
    pub created_by: MemberId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for recording a new expense; ids and timestamps are assigned by the service.
#[derive(Clone, Debug)]
pub struct NewExpense {
    pub group_id: String,
    pub name: String,
    pub notes: Option<String>,
    pub payer: MemberId,
    pub amount: Money,
    pub currency: Currency,
    pub date: NaiveDate,
}

/// Editable descriptive fields. Amount, payer and currency are fixed once
/// the splits exist; changing them means deleting and re-adding the expense.
#[derive(Clone, Debug, Default)]
pub struct ExpenseDetailsUpdate {
    pub name: Option<String>,
    pub notes: Option<Option<String>>,
    pub date: Option<NaiveDate>,
}
