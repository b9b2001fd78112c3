use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SynthError};
use crate::network::{Ipv4Cidr, MAX_AZS};
use crate::regions::{verify_account, verify_region};
use crate::variables::Variables;

/// where a stack is deployed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub account: String,
    pub region: String,
}

impl Environment {
    fn verify(&self, what: &str) -> Result<()> {
        verify_region(&self.region).map_err(|e| SynthError::ConfigError(format!("{what}: {e}")))?;
        verify_account(&self.account).map_err(|e| SynthError::ConfigError(format!("{what}: {e}")))?;
        Ok(())
    }
}

/// one environment the reverse proxy is deployed to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentDescriptor {
    pub env: Environment,
    /// the first label of the proxy's domain name. The proxy is reachable from the
    /// client VPC as `<proxy_hostname>.<proxy_domain_name>`.
    /// Also used as the prefix of this deployment's stack names, so it must be unique.
    pub proxy_hostname: String,
    /// address block of the VPC hosting the entry load balancer and the API gateway endpoint
    pub entry_vpc_cidr: Ipv4Cidr,
}

impl DeploymentDescriptor {
    pub fn proxy_fqdn(&self, proxy_domain_name: &str) -> String {
        format!("{}.{}", self.proxy_hostname, proxy_domain_name)
    }

    pub fn certificate_stack_name(&self) -> String {
        format!("{}-CertificateStack", self.proxy_hostname)
    }

    pub fn backend_stack_name(&self) -> String {
        format!("{}-BackendStack", self.proxy_hostname)
    }

    pub fn api_gateway_stack_name(&self) -> String {
        format!("{}-ApiGatewayStack", self.proxy_hostname)
    }
}

fn default_max_azs() -> usize {
    2
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// route53 zone used to DNS validate the proxy certificates.
    /// Must be provided as the actual ID without the `/hostedzone/` prefix.
    pub hosted_zone_id: String,
    /// must be a subdomain of the zone above, eg: `proxy.domain.com`
    pub proxy_domain_name: String,
    /// the host name the backend serves with its self-signed certificate
    pub backend_fqdn: String,
    pub client_vpc_cidr: Ipv4Cidr,
    pub backend_vpc_cidr: Ipv4Cidr,
    pub client_env: Environment,
    /// AZs every VPC spans, 1 to 3
    #[serde(default = "default_max_azs")]
    pub max_azs: usize,
    /// optional bootstrap script for the backend instance. When empty (default),
    /// the built-in script is used. Relative paths are relative to the config file.
    #[serde(default)]
    pub backend_userdata: Option<PathBuf>,
    #[serde(default)]
    pub deployments: Vec<DeploymentDescriptor>,
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P, vars: &Variables) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SynthError::io(format!("Failed to read config file {}", path.display()), e))?;
        let mut config = Self::from_toml_str(&contents, vars)?;
        if let (Some(script), Some(dir)) = (config.backend_userdata.as_mut(), path.parent()) {
            if script.is_relative() {
                *script = dir.join(&*script);
            }
        }
        Ok(config)
    }

    /// parses the config, resolving every `${NAME}` placeholder in string values first
    pub fn from_toml_str(contents: &str, vars: &Variables) -> Result<Self> {
        let mut raw: toml::Value = toml::from_str(contents)?;
        resolve_placeholders(&mut raw, vars)?;
        let config: AppConfig = raw.try_into()?;
        Ok(config)
    }

    /// checks everything that can be checked before any stack is built.
    /// Region mismatches between deployments and the client are not checked here,
    /// the client stack refuses them when it wires each deployment.
    pub fn validate(&self) -> Result<()> {
        if self.hosted_zone_id.is_empty() || self.hosted_zone_id.starts_with("/hostedzone/") {
            return Err(SynthError::ConfigError(format!(
                "hosted_zone_id {:?} must be the zone id without the /hostedzone/ prefix", self.hosted_zone_id
            )));
        }
        verify_domain("proxy_domain_name", &self.proxy_domain_name)?;
        verify_domain("backend_fqdn", &self.backend_fqdn)?;
        if self.max_azs == 0 || self.max_azs > MAX_AZS {
            return Err(SynthError::ConfigError(format!("max_azs must be between 1 and {MAX_AZS}, got {}", self.max_azs)));
        }
        self.client_env.verify("client_env")?;
        for (i, deployment) in self.deployments.iter().enumerate() {
            verify_hostname(&deployment.proxy_hostname)?;
            deployment.env.verify(&format!("deployment {}", deployment.proxy_hostname))?;
            if self.deployments[..i].iter().any(|d| d.proxy_hostname == deployment.proxy_hostname) {
                return Err(SynthError::DuplicateHostname(deployment.proxy_hostname.clone()));
            }
        }
        Ok(())
    }
}

fn resolve_placeholders(value: &mut toml::Value, vars: &Variables) -> Result<()> {
    match value {
        toml::Value::String(s) => {
            *s = vars.resolve(s)?;
        }
        toml::Value::Array(items) => {
            for item in items.iter_mut() {
                resolve_placeholders(item, vars)?;
            }
        }
        toml::Value::Table(table) => {
            for (_, item) in table.iter_mut() {
                resolve_placeholders(item, vars)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// proxy hostnames become a DNS label, and the prefix of stack names
fn verify_hostname(hostname: &str) -> Result<()> {
    let restriction = "Must be 1 to 63 lowercase letters, digits or hyphens, starting with a letter and not ending with a hyphen";
    let valid = !hostname.is_empty()
        && hostname.len() <= 63
        && hostname.starts_with(|c: char| c.is_ascii_lowercase())
        && !hostname.ends_with('-')
        && hostname.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !valid {
        return Err(SynthError::ConfigError(format!("Invalid proxy hostname {:?}\n{restriction}", hostname)));
    }
    Ok(())
}

fn verify_domain(field: &str, domain: &str) -> Result<()> {
    if domain.is_empty() {
        return Err(SynthError::ConfigError(format!("{field} must not be empty")));
    }
    if domain.ends_with('.') || domain.starts_with('.') || domain.contains("..") {
        return Err(SynthError::ConfigError(format!("{field} {:?} is not a valid domain name", domain)));
    }
    Ok(())
}
