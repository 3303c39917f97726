pub mod checker;
pub mod engine;
pub mod plan;

pub use crate::domain::model::{
    CheckReport, Endpoint, HandshakeReport, ProbeResult, SessionInfo, SessionState, EXIT_FAILURE,
    EXIT_SUCCESS,
};
pub use crate::domain::ports::{ConfigProvider, ConnectRequest, SessionClient};
pub use crate::utils::error::Result;
pub use plan::{CheckPlan, ProbeTarget};
