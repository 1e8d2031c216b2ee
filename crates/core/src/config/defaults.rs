//! Default values and functions for configuration

pub(crate) const DEFAULT_LOG_LEVEL: &str = "warn";

pub(crate) fn default_event_channel_capacity() -> usize {
    1024
}

pub(crate) fn default_follow_symlinks() -> bool {
    false
}

pub(crate) fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
