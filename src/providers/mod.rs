pub mod caching;
pub mod frankfurter;
pub mod util;

pub use caching::CachingRateProvider;
pub use frankfurter::FrankfurterProvider;
