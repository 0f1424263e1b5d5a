pub mod audit;
pub mod balance;
pub mod expense;
pub mod group;
pub mod member;
pub mod settlement;
pub mod split;

pub use audit::{AppLog, GroupAudit};
pub use balance::{BalanceEntry, BalanceReport, BalanceTotals, Balances};
pub use expense::{Expense, ExpenseDetailsUpdate, NewExpense};
pub use group::Group;
pub use member::MemberId;
pub use settlement::{SettlementOutcome, SettlementState};
pub use split::{MemberShare, Split};
