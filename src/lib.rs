//! Synthesizes the CloudFormation stacks of a PrivateLink reverse proxy: a client VPC
//! reaching private API gateways, each in front of a TLS backend, through VPC
//! endpoint services.

pub mod assembly;
pub mod config;
pub mod deploy;
pub mod driver;
pub mod error;
pub mod network;
pub mod regions;
pub mod resources;
pub mod stacks;
pub mod template;
pub mod userdata;
pub mod variables;

pub use config::{AppConfig, DeploymentDescriptor, Environment};
pub use driver::{synthesize, CloudAssembly, ProvisionedDeployment};
pub use error::{Result, SynthError};
