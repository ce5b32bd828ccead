pub mod account;
pub mod candle;
pub mod config;
pub mod config_loader;
pub mod error;
pub mod events;
pub mod position;
pub mod signal;
pub mod traits;

pub use account::AccountState;
pub use candle::{aggregate, Candle, Timeframe};
pub use config::EngineConfig;
pub use config_loader::ConfigLoader;
pub use error::EngineError;
pub use events::EngineEvent;
pub use position::{CloseReason, ClosedTrade, PendingOrder, Position, Side};
pub use signal::{Polarity, Sentiment, SetupKind, SignalDetail, Trend};
pub use traits::CandleFeed;
