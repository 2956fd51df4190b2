use puddel_protocol::ProtocolError;
use puddel_types::ParamsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("failed to read scenario: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse scenario: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid params: {0}")]
    Params(#[from] ParamsError),

    #[error("scenario refers to unknown {kind} {name:?}")]
    Unknown { kind: &'static str, name: String },

    #[error("scenario is invalid: {0}")]
    Invalid(String),

    #[error("{step} failed: {source}")]
    Step {
        step: String,
        #[source]
        source: ProtocolError,
    },
}

impl SimError {
    pub(crate) fn step(step: impl Into<String>) -> impl FnOnce(ProtocolError) -> Self {
        let step = step.into();
        move |source| Self::Step { step, source }
    }
}
