pub mod accumulate;
pub mod card_info;
pub mod check_prs;
pub mod pending;
