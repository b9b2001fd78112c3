use crate::config::Environment;
use crate::error::Result;
use crate::network::{declare_vpc, declare_vpc_security_group, subnet_ids, Ipv4Cidr, SubnetGroup, SubnetType, VpcProps};
use crate::resources::elbv2::{Listener, ListenerAction, ListenerCertificate, LoadBalancer, TargetDescription, TargetGroup};
use crate::template::{get_att, import_value, StrVal, Template};
use crate::userdata;

use super::{
    declare_ssm_instance, export_name, first_default_subnet, instance_id_output, CertificateHandle, InstanceSpec, Stack,
    StackKind,
};

pub struct BackendProps<'a> {
    pub stack_name: &'a str,
    pub env: &'a Environment,
    /// prefix of the physical names (load balancer, target group, security group) so
    /// that several deployments can share an account
    pub name_prefix: &'a str,
    pub vpc_cidr: Ipv4Cidr,
    pub max_azs: usize,
    /// the name the backend serves under, substituted into the bootstrap script
    pub backend_fqdn: &'a str,
    /// bootstrap script before substitution
    pub userdata_script: &'a str,
    pub certificate: &'a CertificateHandle,
}

/// an internal network load balancer terminating TLS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBalancerHandle {
    pub name: String,
    pub stack_name: String,
    pub arn_export: String,
    pub port: u16,
    pub protocol: String,
}

impl LoadBalancerHandle {
    pub fn arn(&self) -> StrVal {
        import_value(&self.arn_export)
    }
}

pub fn backend_stack(props: &BackendProps) -> Result<(Stack, LoadBalancerHandle)> {
    let _span = tracing::info_span!("backend_stack", stack = props.stack_name).entered();
    let mut template = Template::new(format!("Backend service for {}", props.certificate.domain_name));
    let vpc = declare_vpc(&mut template, &VpcProps {
        logical_id: "BackendVpc".into(),
        vpc_name: "backend".into(),
        cidr: props.vpc_cidr,
        max_azs: props.max_azs,
        subnet_groups: vec![
            SubnetGroup::new("backend-app", SubnetType::PrivateWithEgress),
            SubnetGroup::new("backend-public", SubnetType::Public),
        ],
    })?;
    let sg_name = format!("{}-backendSecurityGroup", props.name_prefix);
    let security_group = declare_vpc_security_group(&mut template, &vpc, "BackendSecurityGroup", Some(&sg_name), 443)?;

    let script = userdata::render(props.userdata_script, props.backend_fqdn)?;
    let instance = declare_ssm_instance(&mut template, InstanceSpec {
        id: "Backend",
        name: "backend-app",
        subnet: first_default_subnet(&vpc)?,
        security_group,
        user_data: Some(userdata::encode(&script)),
    })?;

    let app_subnets = vpc.default_subnets();
    let nlb_name = format!("{}-nlb-backend", props.name_prefix);
    let nlb = template.add("BackendNlb", &LoadBalancer::internal_network(nlb_name.as_str(), subnet_ids(&app_subnets)))?;
    let target_group = template.add("BackendTargetGroup", &TargetGroup {
        name: format!("{}-tg-backend", props.name_prefix),
        port: 443,
        protocol: "TLS".into(),
        target_type: "ip".into(),
        vpc_id: vpc.vpc_id(),
        targets: vec![TargetDescription::ip(get_att(&instance, "PrivateIp"))],
        health_check_protocol: None,
        health_check_path: None,
        matcher: None,
    })?;
    template.add("BackendListener", &Listener {
        load_balancer_arn: nlb.clone(),
        port: 443,
        protocol: "TLS".into(),
        certificates: vec![ListenerCertificate { certificate_arn: props.certificate.arn() }],
        default_actions: vec![ListenerAction::forward(target_group)],
    })?;

    instance_id_output(&mut template, "BackendInstanceId", &instance)?;
    let arn_export = export_name(props.stack_name, "LoadBalancerArn");
    template.add_output("LoadBalancerArn", Some(nlb_name.as_str()), &nlb, Some(arn_export.as_str()))?;

    let deps = vec![props.certificate.stack_name.clone()];
    let stack = Stack::new(props.stack_name, StackKind::Backend, props.env, template, deps)?;
    let handle = LoadBalancerHandle {
        name: nlb_name,
        stack_name: props.stack_name.to_string(),
        arn_export,
        port: 443,
        protocol: "TLS".into(),
    };
    tracing::info!(nlb = %handle.name, fqdn = props.backend_fqdn, "declared backend");
    Ok((stack, handle))
}
