use crate::phase::SessionPhase;
use relay_core::BusError;

#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("bus: {0}")]
    Bus(#[from] BusError),

    #[error("config: {0}")]
    Config(String),

    #[error("serde: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid transition: from={from}, to={to}")]
    InvalidTransition {
        from: SessionPhase,
        to: SessionPhase,
    },
}

pub type SessionResult<T> = Result<T, SessionError>;
