pub mod batch;
pub mod connectivity;
pub mod error;
pub mod gateway;
pub mod history;
pub mod session;

pub use batch::{BatchEvent, BatchSession, BatchSnapshot};
pub use connectivity::{ConnectivityEvent, ConnectivityMonitor, ServerStatus};
pub use error::SessionError;
pub use gateway::{HttpGateway, SentimentGateway, DEFAULT_REQUEST_TIMEOUT};
pub use history::{HistoryEntry, RollingHistory};
pub use session::{
    AnalysisEvent, AnalysisSession, AnalysisSnapshot, SessionOptions, SessionPhase,
    HISTORY_CAPACITY,
};
