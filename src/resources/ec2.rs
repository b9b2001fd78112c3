use serde::Serialize;

use super::{is_false, Tag};
use crate::template::{CfnResource, StrVal};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Vpc {
    pub cidr_block: String,
    pub enable_dns_hostnames: bool,
    pub enable_dns_support: bool,
    pub instance_tenancy: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl CfnResource for Vpc {
    const TYPE: &'static str = "AWS::EC2::VPC";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Subnet {
    pub vpc_id: StrVal,
    pub cidr_block: String,
    pub availability_zone: StrVal,
    pub map_public_ip_on_launch: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl CfnResource for Subnet {
    const TYPE: &'static str = "AWS::EC2::Subnet";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RouteTable {
    pub vpc_id: StrVal,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl CfnResource for RouteTable {
    const TYPE: &'static str = "AWS::EC2::RouteTable";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubnetRouteTableAssociation {
    pub route_table_id: StrVal,
    pub subnet_id: StrVal,
}

impl CfnResource for SubnetRouteTableAssociation {
    const TYPE: &'static str = "AWS::EC2::SubnetRouteTableAssociation";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Route {
    pub route_table_id: StrVal,
    pub destination_cidr_block: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_id: Option<StrVal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nat_gateway_id: Option<StrVal>,
}

impl CfnResource for Route {
    const TYPE: &'static str = "AWS::EC2::Route";

    fn validate(&self) -> Result<(), String> {
        match (&self.gateway_id, &self.nat_gateway_id) {
            (Some(_), None) | (None, Some(_)) => Ok(()),
            _ => Err(format!("Route to {} must have exactly one target", self.destination_cidr_block)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InternetGateway {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl CfnResource for InternetGateway {
    const TYPE: &'static str = "AWS::EC2::InternetGateway";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VpcGatewayAttachment {
    pub vpc_id: StrVal,
    pub internet_gateway_id: StrVal,
}

impl CfnResource for VpcGatewayAttachment {
    const TYPE: &'static str = "AWS::EC2::VPCGatewayAttachment";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Eip {
    pub domain: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl CfnResource for Eip {
    const TYPE: &'static str = "AWS::EC2::EIP";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NatGateway {
    pub subnet_id: StrVal,
    pub allocation_id: StrVal,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl CfnResource for NatGateway {
    const TYPE: &'static str = "AWS::EC2::NatGateway";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecurityGroupRule {
    pub ip_protocol: String,
    pub cidr_ip: StrVal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SecurityGroupRule {
    pub fn tcp<S: Into<StrVal>>(cidr: S, port: u16) -> Self {
        let cidr = cidr.into();
        let description = cidr.as_literal().map(|c| format!("from {c}:{port}"));
        Self { ip_protocol: "tcp".into(), cidr_ip: cidr, from_port: Some(port), to_port: Some(port), description }
    }

    pub fn all_outbound() -> Self {
        Self {
            ip_protocol: "-1".into(),
            cidr_ip: "0.0.0.0/0".into(),
            from_port: None,
            to_port: None,
            description: Some("Allow all outbound traffic by default".into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecurityGroup {
    pub group_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    pub vpc_id: StrVal,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security_group_ingress: Vec<SecurityGroupRule>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security_group_egress: Vec<SecurityGroupRule>,
}

impl CfnResource for SecurityGroup {
    const TYPE: &'static str = "AWS::EC2::SecurityGroup";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VpcEndpoint {
    pub service_name: StrVal,
    pub vpc_id: StrVal,
    pub vpc_endpoint_type: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subnet_ids: Vec<StrVal>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security_group_ids: Vec<StrVal>,
    #[serde(skip_serializing_if = "is_false")]
    pub private_dns_enabled: bool,
}

impl CfnResource for VpcEndpoint {
    const TYPE: &'static str = "AWS::EC2::VPCEndpoint";

    fn validate(&self) -> Result<(), String> {
        if self.vpc_endpoint_type == "Interface" && self.subnet_ids.is_empty() {
            return Err("Interface endpoints must be placed in at least one subnet".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VpcEndpointService {
    pub network_load_balancer_arns: Vec<StrVal>,
    pub acceptance_required: bool,
}

impl CfnResource for VpcEndpointService {
    const TYPE: &'static str = "AWS::EC2::VPCEndpointService";

    fn validate(&self) -> Result<(), String> {
        if self.network_load_balancer_arns.is_empty() {
            return Err("Endpoint services must expose at least one network load balancer".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Instance {
    pub image_id: StrVal,
    pub instance_type: String,
    pub subnet_id: StrVal,
    pub availability_zone: StrVal,
    pub security_group_ids: Vec<StrVal>,
    pub iam_instance_profile: StrVal,
    /// base64 encoded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl CfnResource for Instance {
    const TYPE: &'static str = "AWS::EC2::Instance";
}
