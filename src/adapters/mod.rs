// Adapters: concrete clocks and billing page sources.

pub mod clock;
pub mod file;
pub mod http;

pub use clock::{FixedClock, SystemClock};
pub use file::FileBillingSource;
pub use http::HttpBillingSource;
