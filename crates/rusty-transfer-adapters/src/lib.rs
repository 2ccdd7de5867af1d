pub mod clock;
pub mod config;
pub mod eip1193;
pub mod explorer;

pub use clock::SystemClockAdapter;
pub use config::{RuntimeProfile, TransferAdapterConfig};
pub use eip1193::Eip1193Adapter;
pub use explorer::{ExplorerAdapter, SharedLedger};
