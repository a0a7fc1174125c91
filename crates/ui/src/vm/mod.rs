mod home_vm;
mod result_vm;
mod time_fmt;
mod tryout_vm;

pub use home_vm::{AttemptCardVm, PackageCardVm, map_attempt_cards, map_package_cards};
pub use result_vm::{ResultRowVm, ResultVm, map_result};
pub use time_fmt::{format_countdown, format_datetime, format_elapsed};
pub use tryout_vm::{BadgeKind, BadgeVm, LOW_TIME_SECS, OptionVm, TryoutVm, finish_reason_label};
