#[derive(thiserror::Error, Debug)]
pub enum SynthError {
    #[error("Cross region deployment is not supported yet: {hostname} -> {region} (client region is {client_region})")]
    CrossRegion {
        hostname: String,
        region: String,
        client_region: String,
    },
    #[error("Cross account deployment is not supported yet: {hostname} -> {account} (client account is {client_account})")]
    CrossAccount {
        hostname: String,
        account: String,
        client_account: String,
    },
    #[error("duplicate proxy hostname {0:?}. Every deployment must use a unique hostname")]
    DuplicateHostname(String),
    #[error("configuration error: {0}")]
    ConfigError(String),
    #[error("unresolved variable ${{{0}}}. Define it in your env file or in the environment")]
    UnresolvedVariable(String),
    #[error("Invalid stack name {name}\n{reason}")]
    InvalidStackName { name: String, reason: String },
    #[error("Invalid resource name {name:?}\n{reason}")]
    InvalidLogicalId { name: String, reason: String },
    #[error("resource {0:?} is declared twice in the same template")]
    DuplicateLogicalId(String),
    #[error("Validation failed on resource '{logical_id}'\n{reason}")]
    ValidationError { logical_id: String, reason: String },
    #[error("target group {0:?} would be created without targets")]
    EmptyTargetGroup(String),
    #[error("failed to serialize {context}: {source}")]
    SerializeError {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("{context}: {source}")]
    IoError {
        context: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to deploy stack {stack}\n{reason}")]
    DeployError { stack: String, reason: String },
}

impl SynthError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        SynthError::IoError { context: context.into(), source }
    }

    pub fn serialize(context: impl Into<String>, source: serde_json::Error) -> Self {
        SynthError::SerializeError { context: context.into(), source }
    }
}

pub type Result<T, E = SynthError> = std::result::Result<T, E>;
