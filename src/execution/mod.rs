pub mod submission_queue;
pub mod swap;
pub mod trade_executor;
pub mod units;
pub mod wallet_selector;

pub use submission_queue::SubmissionQueue;
pub use swap::{ApprovalRule, SwapOrder, SwapOutcome, SwapRunner};
pub use trade_executor::TradeExecutor;
pub use units::{from_base_units, to_base_units};
pub use wallet_selector::select_wallet;
