mod health_check;
mod newsletters;
mod stats;
mod subscriptions;
mod unsubscribe;

pub use health_check::*;
pub use newsletters::*;
pub use stats::*;
pub use subscriptions::*;
pub use unsubscribe::*;
