use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::Environment;
use crate::error::Result;
use crate::network::{VpcHandle, SubnetHandle};
use crate::resources::ec2::Instance;
use crate::resources::iam::{InstanceProfile, Role};
use crate::resources::name_tag;
use crate::template::{get_ref, validate_stack_name, Parameter, StrVal, Template};

pub mod api_gateway;
pub mod backend;
pub mod certificate;
pub mod client;

pub use api_gateway::{api_gateway_stack, endpoint_ip_targets, ApiGatewayProps, EndpointServiceExport};
pub use backend::{backend_stack, BackendProps, LoadBalancerHandle};
pub use certificate::{certificate_stack, CertificateHandle, CertificateProps};
pub use client::{check_same_environment, client_stack, ClientProps};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StackKind {
    Certificate,
    Backend,
    ApiGateway,
    Client,
}

impl fmt::Display for StackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StackKind::Certificate => "certificate",
            StackKind::Backend => "backend",
            StackKind::ApiGateway => "api-gateway",
            StackKind::Client => "client",
        };
        f.write_str(s)
    }
}

/// one independently deployable template, and where it goes
#[derive(Debug, Clone)]
pub struct Stack {
    pub name: String,
    pub kind: StackKind,
    pub env: Environment,
    pub template: Template,
    /// stacks whose exports this one imports. They must be deployed first.
    pub dependencies: Vec<String>,
}

impl Stack {
    pub fn new(name: &str, kind: StackKind, env: &Environment, template: Template, dependencies: Vec<String>) -> Result<Self> {
        validate_stack_name(name)?;
        for dep in dependencies.iter() {
            validate_stack_name(dep)?;
        }
        Ok(Self { name: name.to_string(), kind, env: env.clone(), template, dependencies })
    }
}

/// exports are global per account and region, so they are prefixed with the
/// name of the stack that owns them.
pub fn export_name(stack_name: &str, output: &str) -> String {
    format!("{stack_name}-{output}")
}

const AMAZON_LINUX_2_ARM64: &str = "/aws/service/ami-amazon-linux-latest/amzn2-ami-hvm-arm64-gp2";

pub(crate) struct InstanceSpec<'a> {
    /// prefix of every logical id this declares
    pub id: &'a str,
    /// the `Name` tag
    pub name: &'a str,
    pub subnet: &'a SubnetHandle,
    pub security_group: StrVal,
    pub user_data: Option<String>,
}

/// declares a graviton instance running the latest Amazon Linux 2 with a role that
/// lets operators reach it through SSM session manager. Returns the instance logical id.
pub(crate) fn declare_ssm_instance(template: &mut Template, spec: InstanceSpec) -> Result<String> {
    let ami = template.add_parameter(&format!("{}Ami", spec.id), Parameter {
        ty: "AWS::SSM::Parameter::Value<AWS::EC2::Image::Id>".into(),
        default: Some(AMAZON_LINUX_2_ARM64.into()),
        description: Some(format!("AMI of the {} instance", spec.name)),
    })?;
    let role = template.add(&format!("{}Role", spec.id), &Role::ssm_managed_instance())?;
    let profile = template.add(&format!("{}InstanceProfile", spec.id), &InstanceProfile { roles: vec![role] })?;
    let instance_id = format!("{}Instance", spec.id);
    template.add(&instance_id, &Instance {
        image_id: ami,
        instance_type: "t4g.small".into(),
        subnet_id: spec.subnet.subnet_id(),
        availability_zone: spec.subnet.availability_zone(),
        security_group_ids: vec![spec.security_group],
        iam_instance_profile: profile,
        user_data: spec.user_data,
        tags: name_tag(spec.name),
    })?;
    Ok(instance_id)
}

/// the subnet single instances of a VPC are placed in
pub(crate) fn first_default_subnet<'a>(vpc: &'a VpcHandle) -> Result<&'a SubnetHandle> {
    vpc.default_subnets().into_iter().next().ok_or_else(|| {
        crate::error::SynthError::ConfigError(format!("VPC {} has no subnets", vpc.logical_id))
    })
}

pub(crate) fn instance_id_output(template: &mut Template, output: &str, instance_logical_id: &str) -> Result<()> {
    template.add_output(output, Some("ssm start-session --target <this id>"), &get_ref(instance_logical_id), None)
}
