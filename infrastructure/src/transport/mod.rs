//! Chat transport adapters.

mod coze;
mod mock;

pub use coze::CozeHttpTransport;
pub use mock::MockStreamTransport;
