use crate::core::models::MemberId;

pub fn user_balances_key(member: &MemberId) -> String {
    format!("user_balances:{}", member)
}
