pub mod admin;
pub mod bystander;
pub mod home;
pub mod judge;
pub mod judge_login;

use std::time::Duration;

/// How often a screen wakes up to drain its inbox while nothing else repaints it.
pub const INBOX_REFRESH: Duration = Duration::from_millis(250);
