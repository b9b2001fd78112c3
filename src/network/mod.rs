use serde::{Deserialize, Serialize};

use crate::error::{Result, SynthError};
use crate::resources::ec2::{
    Eip, InternetGateway, NatGateway, Route, RouteTable, SecurityGroup, SecurityGroupRule, Subnet,
    SubnetRouteTableAssociation, Vpc, VpcEndpoint, VpcGatewayAttachment,
};
use crate::resources::name_tag;
use crate::template::{get_att, get_azs, get_ref, join, logical_id, region, select, StrVal, Template};

mod cidr;
pub use cidr::Ipv4Cidr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubnetType {
    /// routes to an internet gateway, and hosts one NAT gateway per AZ
    Public,
    /// routes outbound traffic through the NAT gateway of its AZ
    PrivateWithEgress,
    /// no route outside of the VPC
    PrivateIsolated,
}

#[derive(Debug, Clone)]
pub struct SubnetGroup {
    pub name: String,
    pub subnet_type: SubnetType,
}

impl SubnetGroup {
    pub fn new(name: &str, subnet_type: SubnetType) -> Self {
        Self { name: name.to_string(), subnet_type }
    }
}

#[derive(Debug, Clone)]
pub struct VpcProps {
    pub logical_id: String,
    /// the `Name` tag of the VPC
    pub vpc_name: String,
    pub cidr: Ipv4Cidr,
    /// one subnet of every group is created in each of the first `max_azs` AZs of the region
    pub max_azs: usize,
    pub subnet_groups: Vec<SubnetGroup>,
}

#[derive(Debug, Clone)]
pub struct SubnetHandle {
    pub logical_id: String,
    pub group: String,
    pub subnet_type: SubnetType,
    pub cidr: Ipv4Cidr,
    pub az_index: usize,
}

impl SubnetHandle {
    pub fn subnet_id(&self) -> StrVal {
        get_ref(&self.logical_id)
    }

    pub fn availability_zone(&self) -> StrVal {
        select(self.az_index, get_azs())
    }
}

/// a VPC declared in some template, with enough information to place
/// other resources inside of it.
#[derive(Debug, Clone)]
pub struct VpcHandle {
    pub logical_id: String,
    pub name: String,
    pub cidr: Ipv4Cidr,
    pub subnets: Vec<SubnetHandle>,
}

impl VpcHandle {
    pub fn vpc_id(&self) -> StrVal {
        get_ref(&self.logical_id)
    }

    pub fn subnets_of(&self, subnet_type: SubnetType) -> Vec<&SubnetHandle> {
        self.subnets.iter().filter(|s| s.subnet_type == subnet_type).collect()
    }

    /// the subnets workloads go into by default: private ones with egress if there
    /// are any, otherwise isolated ones, otherwise public ones. Only the first group
    /// of that type is used so the result holds one subnet per AZ.
    pub fn default_subnets(&self) -> Vec<&SubnetHandle> {
        for ty in [SubnetType::PrivateWithEgress, SubnetType::PrivateIsolated, SubnetType::Public] {
            let of_type = self.subnets_of(ty);
            if let Some(first) = of_type.first() {
                let group = first.group.clone();
                return of_type.into_iter().filter(|s| s.group == group).collect();
            }
        }
        vec![]
    }
}

/// most AZs a VPC may span. Every commercial region has at least this many,
/// so `Fn::Select` into `Fn::GetAZs` never runs past the end of the list.
pub const MAX_AZS: usize = 3;

pub fn subnet_ids(subnets: &[&SubnetHandle]) -> Vec<StrVal> {
    subnets.iter().map(|s| s.subnet_id()).collect()
}

fn validate_vpc_props(props: &VpcProps) -> Result<()> {
    if props.max_azs == 0 || props.max_azs > MAX_AZS {
        return Err(SynthError::ConfigError(format!(
            "VPC {} must span between 1 and {MAX_AZS} AZs, got {}", props.logical_id, props.max_azs
        )));
    }
    if props.subnet_groups.is_empty() {
        return Err(SynthError::ConfigError(format!("VPC {} must have at least one subnet group", props.logical_id)));
    }
    for (i, group) in props.subnet_groups.iter().enumerate() {
        if props.subnet_groups[..i].iter().any(|g| g.name == group.name) {
            return Err(SynthError::ConfigError(format!("VPC {} has duplicate subnet group {}", props.logical_id, group.name)));
        }
    }
    let has_public = props.subnet_groups.iter().any(|g| g.subnet_type == SubnetType::Public);
    let needs_nat = props.subnet_groups.iter().any(|g| g.subnet_type == SubnetType::PrivateWithEgress);
    if needs_nat && !has_public {
        return Err(SynthError::ConfigError(format!(
            "VPC {} has PRIVATE_WITH_EGRESS subnets but no PUBLIC subnet group to place NAT gateways in",
            props.logical_id
        )));
    }
    Ok(())
}

/// declares a VPC, its subnets, route tables and gateways. The VPC block is split
/// evenly across every (subnet group, AZ) pair, in group order.
pub fn declare_vpc(template: &mut Template, props: &VpcProps) -> Result<VpcHandle> {
    validate_vpc_props(props)?;
    let vpc_id_str = &props.logical_id;
    let blocks = props.cidr
        .split(props.subnet_groups.len() * props.max_azs)
        .map_err(|e| SynthError::ConfigError(format!("VPC {}: {e}", props.logical_id)))?;

    let vpc = Vpc {
        cidr_block: props.cidr.to_string(),
        enable_dns_hostnames: true,
        enable_dns_support: true,
        instance_tenancy: "default".into(),
        tags: name_tag(props.vpc_name.as_str()),
    };
    let vpc_id = template.add(vpc_id_str, &vpc)?;

    let public_group = props.subnet_groups.iter().find(|g| g.subnet_type == SubnetType::Public);
    let igw_attachment = format!("{vpc_id_str}VPCGW");
    if public_group.is_some() {
        let igw_id = format!("{vpc_id_str}IGW");
        let igw = template.add(&igw_id, &InternetGateway { tags: name_tag(props.vpc_name.as_str()) })?;
        template.add(&igw_attachment, &VpcGatewayAttachment { vpc_id: vpc_id.clone(), internet_gateway_id: igw })?;
    }
    let nat_gateway_id = |az_index: usize| -> Option<String> {
        public_group.map(|g| format!("{}NATGateway", subnet_logical_id(vpc_id_str, &g.name, az_index)))
    };

    let mut handle = VpcHandle {
        logical_id: vpc_id_str.clone(),
        name: props.vpc_name.clone(),
        cidr: props.cidr,
        subnets: vec![],
    };
    let mut blocks = blocks.into_iter();
    for group in props.subnet_groups.iter() {
        for az_index in 0..props.max_azs {
            let cidr = match blocks.next() {
                Some(c) => c,
                None => return Err(SynthError::ConfigError(format!("VPC {} ran out of address space", props.logical_id))),
            };
            let subnet_name = subnet_logical_id(vpc_id_str, &group.name, az_index);
            let subnet = SubnetHandle {
                logical_id: subnet_name.clone(),
                group: group.name.clone(),
                subnet_type: group.subnet_type,
                cidr,
                az_index,
            };
            let tag = format!("{}/{}Subnet{}", props.vpc_name, group.name, az_index + 1);
            template.add(&subnet_name, &Subnet {
                vpc_id: vpc_id.clone(),
                cidr_block: cidr.to_string(),
                availability_zone: subnet.availability_zone(),
                map_public_ip_on_launch: group.subnet_type == SubnetType::Public,
                tags: name_tag(tag.as_str()),
            })?;
            let rtb_name = format!("{subnet_name}RouteTable");
            let rtb = template.add(&rtb_name, &RouteTable { vpc_id: vpc_id.clone(), tags: name_tag(tag.as_str()) })?;
            let assoc_name = format!("{subnet_name}RouteTableAssociation");
            template.add(&assoc_name, &SubnetRouteTableAssociation { route_table_id: rtb.clone(), subnet_id: subnet.subnet_id() })?;

            match group.subnet_type {
                SubnetType::Public => {
                    let route_name = format!("{subnet_name}DefaultRoute");
                    template.add_with_deps(&route_name, &Route {
                        route_table_id: rtb,
                        destination_cidr_block: "0.0.0.0/0".into(),
                        gateway_id: Some(get_ref(&format!("{vpc_id_str}IGW"))),
                        nat_gateway_id: None,
                    }, &[igw_attachment.as_str()])?;
                    let eip_name = format!("{subnet_name}EIP");
                    template.add(&eip_name, &Eip { domain: "vpc".into(), tags: name_tag(tag.as_str()) })?;
                    let nat_name = format!("{subnet_name}NATGateway");
                    template.add_with_deps(&nat_name, &NatGateway {
                        subnet_id: subnet.subnet_id(),
                        allocation_id: get_att(&eip_name, "AllocationId"),
                        tags: name_tag(tag.as_str()),
                    }, &[route_name.as_str(), assoc_name.as_str()])?;
                }
                SubnetType::PrivateWithEgress => {
                    let nat = nat_gateway_id(az_index).ok_or_else(|| {
                        SynthError::ConfigError(format!("VPC {} has no NAT gateway for AZ {az_index}", props.logical_id))
                    })?;
                    template.add(&format!("{subnet_name}DefaultRoute"), &Route {
                        route_table_id: rtb,
                        destination_cidr_block: "0.0.0.0/0".into(),
                        gateway_id: None,
                        nat_gateway_id: Some(get_ref(&nat)),
                    })?;
                }
                SubnetType::PrivateIsolated => {}
            }
            handle.subnets.push(subnet);
        }
    }
    tracing::debug!(vpc = %handle.logical_id, cidr = %handle.cidr, subnets = handle.subnets.len(), "declared vpc");
    Ok(handle)
}

fn subnet_logical_id(vpc_logical_id: &str, group: &str, az_index: usize) -> String {
    logical_id(&[vpc_logical_id, group, "Subnet", &(az_index + 1).to_string()])
}

/// `com.amazonaws.<region>.<service>`
pub fn aws_service_name(service: &str) -> StrVal {
    join(".", &["com.amazonaws".into(), region(), service.into()])
}

/// declares a security group admitting TCP on `port` from the whole VPC, and
/// all outbound traffic.
pub fn declare_vpc_security_group(
    template: &mut Template,
    vpc: &VpcHandle,
    logical_id: &str,
    group_name: Option<&str>,
    port: u16,
) -> Result<StrVal> {
    let sg = SecurityGroup {
        group_description: format!("{}/{}", vpc.name, logical_id),
        group_name: group_name.map(|n| n.to_string()),
        vpc_id: vpc.vpc_id(),
        security_group_ingress: vec![SecurityGroupRule::tcp(vpc.cidr.to_string(), port)],
        security_group_egress: vec![SecurityGroupRule::all_outbound()],
    };
    template.add(logical_id, &sg)?;
    Ok(get_att(logical_id, "GroupId"))
}

#[derive(Debug, Clone)]
pub struct InterfaceEndpointHandle {
    pub logical_id: String,
    /// an interface endpoint gets one network interface in every subnet it's placed in
    pub network_interface_count: usize,
}

impl InterfaceEndpointHandle {
    pub fn endpoint_id(&self) -> StrVal {
        get_ref(&self.logical_id)
    }

    pub fn network_interface_ids(&self) -> StrVal {
        get_att(&self.logical_id, "NetworkInterfaceIds")
    }

    pub fn dns_entries(&self) -> StrVal {
        get_att(&self.logical_id, "DnsEntries")
    }
}

/// declares an interface endpoint in the VPC's default subnets. When no security
/// groups are given, a group admitting 443 from the VPC is created for it.
pub fn declare_interface_endpoint(
    template: &mut Template,
    vpc: &VpcHandle,
    logical_id: &str,
    service_name: StrVal,
    private_dns_enabled: bool,
    security_groups: Option<Vec<StrVal>>,
) -> Result<InterfaceEndpointHandle> {
    let subnets = vpc.default_subnets();
    let security_group_ids = match security_groups {
        Some(groups) => groups,
        None => vec![declare_vpc_security_group(template, vpc, &format!("{logical_id}SecurityGroup"), None, 443)?],
    };
    let endpoint = VpcEndpoint {
        service_name,
        vpc_id: vpc.vpc_id(),
        vpc_endpoint_type: "Interface".into(),
        subnet_ids: subnet_ids(&subnets),
        security_group_ids,
        private_dns_enabled,
    };
    template.add(logical_id, &endpoint)?;
    Ok(InterfaceEndpointHandle { logical_id: logical_id.to_string(), network_interface_count: subnets.len() })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(groups: Vec<SubnetGroup>) -> VpcProps {
        VpcProps {
            logical_id: "VpcBackend".into(),
            vpc_name: "backend".into(),
            cidr: "172.16.100.0/24".parse().unwrap(),
            max_azs: 2,
            subnet_groups: groups,
        }
    }

    #[test]
    fn az_count_is_bounded() {
        for max_azs in [0, MAX_AZS + 1, usize::MAX] {
            let mut t = Template::default();
            let mut p = props(vec![SubnetGroup::new("apigatewayEntry", SubnetType::PrivateIsolated)]);
            p.max_azs = max_azs;
            assert!(matches!(declare_vpc(&mut t, &p), Err(SynthError::ConfigError(_))));
        }
    }

    #[test]
    fn isolated_vpc_has_no_gateways() {
        let mut t = Template::default();
        let vpc = declare_vpc(&mut t, &props(vec![SubnetGroup::new("apigatewayEntry", SubnetType::PrivateIsolated)])).unwrap();
        assert_eq!(vpc.subnets.len(), 2);
        assert_eq!(vpc.subnets[0].cidr.to_string(), "172.16.100.0/25");
        assert_eq!(vpc.subnets[1].cidr.to_string(), "172.16.100.128/25");
        assert_eq!(t.resources_of_type("AWS::EC2::InternetGateway").count(), 0);
        assert_eq!(t.resources_of_type("AWS::EC2::NatGateway").count(), 0);
        assert_eq!(t.resources_of_type("AWS::EC2::Route").count(), 0);
        assert_eq!(t.resources_of_type("AWS::EC2::RouteTable").count(), 2);
    }

    #[test]
    fn egress_subnets_route_through_nat_in_same_az() {
        let mut t = Template::default();
        let vpc = declare_vpc(&mut t, &props(vec![
            SubnetGroup::new("backend-app", SubnetType::PrivateWithEgress),
            SubnetGroup::new("backend-public", SubnetType::Public),
        ])).unwrap();
        assert_eq!(vpc.subnets.len(), 4);
        assert_eq!(t.resources_of_type("AWS::EC2::NatGateway").count(), 2);
        assert_eq!(t.resources_of_type("AWS::EC2::EIP").count(), 2);
        assert_eq!(t.resources_of_type("AWS::EC2::InternetGateway").count(), 1);

        let route = t.resource("VpcBackendbackendappSubnet2DefaultRoute").unwrap();
        assert_eq!(route.properties["NatGatewayId"]["Ref"], "VpcBackendbackendpublicSubnet2NATGateway");
        let public_route = t.resource("VpcBackendbackendpublicSubnet1DefaultRoute").unwrap();
        assert_eq!(public_route.properties["GatewayId"]["Ref"], "VpcBackendIGW");
        assert_eq!(public_route.depends_on, vec!["VpcBackendVPCGW".to_string()]);

        let defaults: Vec<_> = vpc.default_subnets().iter().map(|s| s.logical_id.clone()).collect();
        assert_eq!(defaults, vec!["VpcBackendbackendappSubnet1", "VpcBackendbackendappSubnet2"]);
    }

    #[test]
    fn egress_without_public_group_is_rejected() {
        let mut t = Template::default();
        let err = declare_vpc(&mut t, &props(vec![SubnetGroup::new("app", SubnetType::PrivateWithEgress)])).unwrap_err();
        assert!(matches!(err, SynthError::ConfigError(_)));
    }

    #[test]
    fn too_small_block_is_a_config_error() {
        let mut t = Template::default();
        let mut p = props(vec![SubnetGroup::new("a", SubnetType::PrivateIsolated)]);
        p.cidr = "10.0.0.0/28".parse().unwrap();
        assert!(matches!(declare_vpc(&mut t, &p), Err(SynthError::ConfigError(_))));
    }

    #[test]
    fn interface_endpoint_spans_default_subnets() {
        let mut t = Template::default();
        let vpc = declare_vpc(&mut t, &props(vec![SubnetGroup::new("entry", SubnetType::PrivateIsolated)])).unwrap();
        let ep = declare_interface_endpoint(&mut t, &vpc, "ApiEndpoint", aws_service_name("execute-api"), true, None).unwrap();
        assert_eq!(ep.network_interface_count, 2);
        let saved = t.resource("ApiEndpoint").unwrap();
        assert_eq!(saved.properties["VpcEndpointType"], "Interface");
        assert_eq!(saved.properties["PrivateDnsEnabled"], true);
        assert_eq!(saved.properties["SubnetIds"].as_array().unwrap().len(), 2);
        let sg = t.resource("ApiEndpointSecurityGroup").unwrap();
        assert_eq!(sg.properties["SecurityGroupIngress"][0]["CidrIp"], "172.16.100.0/24");
        assert_eq!(sg.properties["SecurityGroupIngress"][0]["FromPort"], 443);
    }
}
