pub mod pass_guard;
pub mod position_close;
pub mod profit_exit;
pub mod scheduler;
pub mod signal_detector;

pub use pass_guard::PassGuard;
pub use position_close::{is_dust, CloseSummary, PositionCloseMonitor};
pub use profit_exit::{principal_target, should_take_principal, ExitSummary, ProfitExitMonitor};
pub use scheduler::{run_periodic, PeriodicPass};
pub use signal_detector::{AddressOutcome, DetectionSummary, SignalDetector};
