pub mod actor;
pub mod risk;
pub mod session;
pub mod tick;

pub use actor::{spawn, EngineActor, EngineCommand, EngineHandle};
pub use risk::RiskGuard;
pub use session::TradeSession;
pub use tick::{Engine, EngineStatus};
