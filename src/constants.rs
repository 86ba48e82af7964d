/// Hour of day at which the time-of-day boost peaks.
pub const OPTIMAL_HOUR: f64 = 21.0;

/// Default upper bound of the time-of-day boost, in percent.
pub const DEFAULT_MAX_BOOST_EFFECT: f64 = 75.0;

/// Default base decay constant (λ per hour) before load adjustment.
pub const DEFAULT_BASE_DECAY_CONSTANT: f64 = 0.2;

/// Default steepness of the time-of-day bell curve.
pub const DEFAULT_AGGRESSION_FACTOR: f64 = 0.5;

/// Default weight of the time-of-day bonus in combined reports.
pub const DEFAULT_TIME_OF_DAY_FACTOR: f64 = 0.3;

/// Maximum items accepted by one batch scoring request.
pub const MAX_BATCH_SIZE: usize = 500;

/// Maximum length of a caller-supplied profile id.
pub const MAX_PROFILE_ID_LEN: usize = 128;
