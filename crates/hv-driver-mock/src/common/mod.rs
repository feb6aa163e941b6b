//! Common infrastructure for the simulated supply.
//!
//! - **mode**: Operational modes (Instant, Realistic)
//! - **timing**: Transport-like delays
//! - **errors**: Error injection framework
//! - **rng**: Seeded random number generator
//! - **journal**: Record of every call made to the supply

pub mod errors;
pub mod journal;
pub mod mode;
pub mod rng;
pub mod timing;

pub use errors::{ErrorConfig, ErrorScenario};
pub use journal::{CallJournal, MockCall};
pub use mode::MockMode;
pub use rng::MockRng;
pub use timing::TimingConfig;
