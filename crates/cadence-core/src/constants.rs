/// Configuration keys shared between the settings loader and its callers
pub const LOGGING_SECTION: &str = "logging";
pub const LOGGING_LEVEL_KEY: &str = const_str::concat!(LOGGING_SECTION, ".", "level");

pub const RECURRENCE_SECTION: &str = "recurrence";
pub const RECURRENCE_MODE_KEY: &str = const_str::concat!(RECURRENCE_SECTION, ".", "mode");
pub const RECURRENCE_MAX_EMPTY_STEPS_KEY: &str =
    const_str::concat!(RECURRENCE_SECTION, ".", "max_empty_steps");
pub const RECURRENCE_MAX_INSTANCES_KEY: &str =
    const_str::concat!(RECURRENCE_SECTION, ".", "max_instances");

/// Consecutive steps without a single instance before a cursor gives up.
pub const DEFAULT_MAX_EMPTY_STEPS: u32 = 10_000;

/// Upper bound on instances printed by the command line front-end.
pub const DEFAULT_MAX_INSTANCES: u32 = 1_000;
