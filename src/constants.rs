pub const GROUP_CREATED: &str = "GROUP_CREATED";
pub const GROUP_DELETED: &str = "GROUP_DELETED";
pub const MEMBER_ADDED: &str = "MEMBER_ADDED";
pub const MEMBER_REMOVED: &str = "MEMBER_REMOVED";
pub const EXPENSE_ADDED: &str = "EXPENSE_ADDED";
pub const EXPENSE_UPDATED: &str = "EXPENSE_UPDATED";
pub const EXPENSE_DELETED: &str = "EXPENSE_DELETED";
pub const SPLIT_SETTLED: &str = "SPLIT_SETTLED";
pub const BALANCE_QUERIED: &str = "BALANCE_QUERIED";

pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_NOTES_LENGTH: usize = 500;
