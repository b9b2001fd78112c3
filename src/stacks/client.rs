use crate::config::{DeploymentDescriptor, Environment};
use crate::driver::ProvisionedDeployment;
use crate::error::{Result, SynthError};
use crate::network::{
    aws_service_name, declare_interface_endpoint, declare_vpc, declare_vpc_security_group, Ipv4Cidr, SubnetGroup,
    SubnetType, VpcProps,
};
use crate::resources::route53::{AliasTarget, HostedZone, HostedZoneVpc, RecordSet};
use crate::template::{logical_id, region, select, split, StrVal, Template};

use super::{declare_ssm_instance, first_default_subnet, instance_id_output, InstanceSpec, Stack, StackKind};

pub const CLIENT_STACK_NAME: &str = "ClientStack";

pub struct ClientProps<'a> {
    pub env: &'a Environment,
    pub proxy_domain_name: &'a str,
    pub vpc_cidr: Ipv4Cidr,
    pub max_azs: usize,
}

/// interface endpoints and exports only work within one account and region, so a
/// deployment the client can't reach stops the whole synthesis.
pub fn check_same_environment(descriptor: &DeploymentDescriptor, client_env: &Environment) -> Result<()> {
    if descriptor.env.region != client_env.region {
        return Err(SynthError::CrossRegion {
            hostname: descriptor.proxy_hostname.clone(),
            region: descriptor.env.region.clone(),
            client_region: client_env.region.clone(),
        });
    }
    if descriptor.env.account != client_env.account {
        return Err(SynthError::CrossAccount {
            hostname: descriptor.proxy_hostname.clone(),
            account: descriptor.env.account.clone(),
            client_account: client_env.account.clone(),
        });
    }
    Ok(())
}

/// `DnsEntries` items look like `<hosted zone id>:<dns name>`
fn endpoint_alias(dns_entries: &StrVal) -> AliasTarget {
    let first_entry = select(0, dns_entries.to_json());
    AliasTarget {
        dns_name: select(1, split(":", &first_entry)),
        hosted_zone_id: select(0, split(":", &first_entry)),
        evaluate_target_health: false,
    }
}

pub fn client_stack(props: &ClientProps, deployments: &[ProvisionedDeployment]) -> Result<Stack> {
    let _span = tracing::info_span!("client_stack", deployments = deployments.len()).entered();
    let mut template = Template::new(format!("Client VPC reaching {} proxies under {}", deployments.len(), props.proxy_domain_name));
    let vpc = declare_vpc(&mut template, &VpcProps {
        logical_id: "ClientVpc".into(),
        vpc_name: "client".into(),
        cidr: props.vpc_cidr,
        max_azs: props.max_azs,
        subnet_groups: vec![SubnetGroup::new("client", SubnetType::PrivateIsolated)],
    })?;
    let zone = template.add("PrivateHostedZone", &HostedZone {
        name: props.proxy_domain_name.to_string(),
        vpcs: vec![HostedZoneVpc { vpc_id: vpc.vpc_id(), vpc_region: region() }],
    })?;

    let mut dependencies = vec![];
    for deployment in deployments {
        let hostname = &deployment.descriptor.proxy_hostname;
        check_same_environment(&deployment.descriptor, props.env)?;
        let endpoint = declare_interface_endpoint(
            &mut template,
            &vpc,
            &logical_id(&["VPCEndpoint", hostname]),
            deployment.endpoint_service.service_name(),
            false,
            None,
        )?;
        let alias = format!("{hostname}.{}", props.proxy_domain_name);
        template.add(
            &logical_id(&["AliasRecord", hostname]),
            &RecordSet::alias_a(zone.clone(), &alias, endpoint_alias(&endpoint.dns_entries())),
        )?;
        template.add_output(&logical_id(&["Alias", hostname]), None, &StrVal::from(alias.as_str()), None)?;
        dependencies.push(deployment.endpoint_service.stack_name.clone());
        tracing::info!(%hostname, %alias, "wired deployment");
    }

    let security_group = declare_vpc_security_group(&mut template, &vpc, "ClientSecurityGroup", Some("clientSecurityGroup"), 443)?;
    // the client has no internet access, session manager goes through these
    for (id, service) in [("SsmEndpoint", "ssm"), ("SsmMessagesEndpoint", "ssmmessages"), ("Ec2MessagesEndpoint", "ec2messages")] {
        declare_interface_endpoint(&mut template, &vpc, id, aws_service_name(service), true, Some(vec![security_group.clone()]))?;
    }
    let instance = declare_ssm_instance(&mut template, InstanceSpec {
        id: "Client",
        name: "client",
        subnet: first_default_subnet(&vpc)?,
        security_group,
        user_data: None,
    })?;
    instance_id_output(&mut template, "ClientInstanceId", &instance)?;

    Stack::new(CLIENT_STACK_NAME, StackKind::Client, props.env, template, dependencies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor(region: &str, account: &str) -> DeploymentDescriptor {
        DeploymentDescriptor {
            env: Environment { account: account.into(), region: region.into() },
            proxy_hostname: "app".into(),
            entry_vpc_cidr: "172.16.1.0/24".parse().unwrap(),
        }
    }

    #[test]
    fn region_mismatch_names_the_hostname() {
        let client = Environment { account: "123456789012".into(), region: "us-east-1".into() };
        let err = check_same_environment(&descriptor("eu-west-1", "123456789012"), &client).unwrap_err();
        assert!(matches!(err, SynthError::CrossRegion { .. }));
        assert_eq!(
            err.to_string(),
            "Cross region deployment is not supported yet: app -> eu-west-1 (client region is us-east-1)"
        );
    }

    #[test]
    fn account_mismatch_is_rejected() {
        let client = Environment { account: "123456789012".into(), region: "us-east-1".into() };
        let err = check_same_environment(&descriptor("us-east-1", "210987654321"), &client).unwrap_err();
        assert!(matches!(err, SynthError::CrossAccount { .. }));
        assert!(check_same_environment(&descriptor("us-east-1", "123456789012"), &client).is_ok());
    }

    #[test]
    fn alias_targets_the_first_dns_entry() {
        let alias = endpoint_alias(&crate::template::get_att("VPCEndpointapp", "DnsEntries"));
        let entry = json!({ "Fn::Select": [0, { "Fn::GetAtt": ["VPCEndpointapp", "DnsEntries"] }] });
        assert_eq!(alias.dns_name.to_json(), json!({ "Fn::Select": [1, { "Fn::Split": [":", entry] }] }));
        assert_eq!(alias.hosted_zone_id.to_json(), json!({ "Fn::Select": [0, { "Fn::Split": [":", entry] }] }));
    }

    #[test]
    fn no_deployments_still_builds_the_client() {
        let env = Environment { account: "123456789012".into(), region: "us-east-1".into() };
        let stack = client_stack(&ClientProps {
            env: &env,
            proxy_domain_name: "proxy.domain.com",
            vpc_cidr: "172.16.0.0/24".parse().unwrap(),
            max_azs: 2,
        }, &[]).unwrap();
        assert_eq!(stack.name, "ClientStack");
        assert!(stack.dependencies.is_empty());
        assert_eq!(stack.template.resources_of_type("AWS::Route53::RecordSet").count(), 0);
        assert_eq!(stack.template.resources_of_type("AWS::EC2::VPCEndpoint").count(), 3);
        assert!(stack.template.outputs.contains_key("ClientInstanceId"));
    }
}
