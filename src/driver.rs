use crate::config::{AppConfig, DeploymentDescriptor};
use crate::error::Result;
use crate::network::VpcHandle;
use crate::stacks::{
    api_gateway_stack, backend_stack, certificate_stack, client_stack, ApiGatewayProps, BackendProps, CertificateProps,
    ClientProps, EndpointServiceExport, Stack,
};
use crate::userdata;

/// a deployment after its certificate, backend and api gateway stacks were built,
/// with what the client needs to connect to it.
#[derive(Debug, Clone)]
pub struct ProvisionedDeployment {
    pub descriptor: DeploymentDescriptor,
    pub proxy_fqdn: String,
    pub entry_vpc: VpcHandle,
    pub endpoint_service: EndpointServiceExport,
}

/// every stack of a synthesis, in the order they have to be deployed
#[derive(Debug, Clone, Default)]
pub struct CloudAssembly {
    pub stacks: Vec<Stack>,
}

impl CloudAssembly {
    pub fn stack(&self, name: &str) -> Option<&Stack> {
        self.stacks.iter().find(|s| s.name == name)
    }

    pub fn stack_names(&self) -> Vec<&str> {
        self.stacks.iter().map(|s| s.name.as_str()).collect()
    }
}

/// builds the certificate, backend and api gateway stacks of one deployment
pub fn provision_deployment(
    config: &AppConfig,
    descriptor: &DeploymentDescriptor,
    userdata_script: &str,
) -> Result<(Vec<Stack>, ProvisionedDeployment)> {
    let _span = tracing::info_span!("deployment", hostname = %descriptor.proxy_hostname, region = %descriptor.env.region).entered();
    let proxy_fqdn = descriptor.proxy_fqdn(&config.proxy_domain_name);
    let hostname = descriptor.proxy_hostname.as_str();

    let (cert_stack, certificate) = certificate_stack(&CertificateProps {
        stack_name: &descriptor.certificate_stack_name(),
        env: &descriptor.env,
        hosted_zone_id: &config.hosted_zone_id,
        domain_name: &proxy_fqdn,
    })?;
    let (backend, backend_nlb) = backend_stack(&BackendProps {
        stack_name: &descriptor.backend_stack_name(),
        env: &descriptor.env,
        name_prefix: hostname,
        vpc_cidr: config.backend_vpc_cidr,
        max_azs: config.max_azs,
        backend_fqdn: &config.backend_fqdn,
        userdata_script,
        certificate: &certificate,
    })?;
    let (gateway, entry_vpc, endpoint_service) = api_gateway_stack(&ApiGatewayProps {
        stack_name: &descriptor.api_gateway_stack_name(),
        env: &descriptor.env,
        name_prefix: hostname,
        proxy_fqdn: &proxy_fqdn,
        entry_vpc_cidr: descriptor.entry_vpc_cidr,
        max_azs: config.max_azs,
        certificate: &certificate,
        backend: &backend_nlb,
    })?;

    let provisioned = ProvisionedDeployment {
        descriptor: descriptor.clone(),
        proxy_fqdn,
        entry_vpc,
        endpoint_service,
    };
    Ok((vec![cert_stack, backend, gateway], provisioned))
}

/// validates the configuration, builds every deployment, then the client stack
/// that connects to all of them. Stops at the first error.
pub fn synthesize(config: &AppConfig) -> Result<CloudAssembly> {
    config.validate()?;
    let script = userdata::load(config.backend_userdata.as_deref())?;

    let mut assembly = CloudAssembly::default();
    let mut provisioned = Vec::with_capacity(config.deployments.len());
    for descriptor in config.deployments.iter() {
        let (stacks, deployment) = provision_deployment(config, descriptor, &script)?;
        assembly.stacks.extend(stacks);
        provisioned.push(deployment);
    }

    let client = client_stack(&ClientProps {
        env: &config.client_env,
        proxy_domain_name: &config.proxy_domain_name,
        vpc_cidr: config.client_vpc_cidr,
        max_azs: config.max_azs,
    }, &provisioned)?;
    assembly.stacks.push(client);
    tracing::info!(stacks = assembly.stacks.len(), "synthesized");
    Ok(assembly)
}
