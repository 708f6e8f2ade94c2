pub mod absence;
pub mod board;
pub mod id;
pub mod leave_balance;
pub mod role;
