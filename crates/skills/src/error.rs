use clawpanel_client::ClientError;

/// Failures inside a controller flow. Entry points never return these; they
/// render them into state via `Display`.
#[derive(Debug, thiserror::Error)]
pub enum SkillsError {
    /// The gateway rejected the call or the transport failed. Shown verbatim.
    #[error(transparent)]
    Rpc(#[from] ClientError),

    /// A merge-patch was attempted without the hash of the document it was
    /// computed against.
    #[error("config hash missing; reload and retry")]
    MissingBaseHash,

    #[error("config field name is empty")]
    EmptyField,

    #[error("unexpected gateway response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The gateway ran the installer and reported failure.
    #[error("{0}")]
    Install(String),

    #[error("{0} skills are read-only")]
    ReadOnly(clawpanel_protocol::skills::SkillSource),
}

pub type Result<T> = std::result::Result<T, SkillsError>;
