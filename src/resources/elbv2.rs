use serde::Serialize;

use super::verify_elb_name;
use crate::template::{CfnResource, StrVal};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoadBalancerAttribute {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoadBalancer {
    pub name: String,
    #[serde(rename = "Type")]
    pub ty: String,
    pub scheme: String,
    pub subnets: Vec<StrVal>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub load_balancer_attributes: Vec<LoadBalancerAttribute>,
}

impl LoadBalancer {
    /// an internal network load balancer. Cross zone load balancing is
    /// enabled so every target receives traffic from every AZ.
    pub fn internal_network(name: impl Into<String>, subnets: Vec<StrVal>) -> Self {
        Self {
            name: name.into(),
            ty: "network".into(),
            scheme: "internal".into(),
            subnets,
            load_balancer_attributes: vec![LoadBalancerAttribute {
                key: "load_balancing.cross_zone.enabled".into(),
                value: "true".into(),
            }],
        }
    }
}

impl CfnResource for LoadBalancer {
    const TYPE: &'static str = "AWS::ElasticLoadBalancingV2::LoadBalancer";

    fn validate(&self) -> Result<(), String> {
        verify_elb_name("load balancer", &self.name)?;
        if self.name.starts_with("internal-") {
            return Err(format!("Invalid load balancer name {:?}\nMust not begin with 'internal-'", self.name));
        }
        if self.subnets.is_empty() {
            return Err("Load balancers must be placed in at least one subnet".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListenerCertificate {
    pub certificate_arn: StrVal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListenerAction {
    #[serde(rename = "Type")]
    pub ty: String,
    pub target_group_arn: StrVal,
}

impl ListenerAction {
    pub fn forward(target_group_arn: StrVal) -> Self {
        Self { ty: "forward".into(), target_group_arn }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Listener {
    pub load_balancer_arn: StrVal,
    pub port: u16,
    pub protocol: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub certificates: Vec<ListenerCertificate>,
    pub default_actions: Vec<ListenerAction>,
}

impl CfnResource for Listener {
    const TYPE: &'static str = "AWS::ElasticLoadBalancingV2::Listener";

    fn validate(&self) -> Result<(), String> {
        if (self.protocol == "TLS" || self.protocol == "HTTPS") && self.certificates.is_empty() {
            return Err(format!("{} listeners on port {} require a certificate", self.protocol, self.port));
        }
        if self.default_actions.is_empty() {
            return Err("Listeners must have at least one default action".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TargetDescription {
    pub id: StrVal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl TargetDescription {
    pub fn ip(address: StrVal) -> Self {
        Self { id: address, port: None }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Matcher {
    pub http_code: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TargetGroup {
    pub name: String,
    pub port: u16,
    pub protocol: String,
    pub target_type: String,
    pub vpc_id: StrVal,
    pub targets: Vec<TargetDescription>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check_protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matcher: Option<Matcher>,
}

impl CfnResource for TargetGroup {
    const TYPE: &'static str = "AWS::ElasticLoadBalancingV2::TargetGroup";

    fn validate(&self) -> Result<(), String> {
        verify_elb_name("target group", &self.name)?;
        if self.targets.is_empty() {
            return Err(format!("Target group {} must have at least one target", self.name));
        }
        if self.health_check_path.is_some() && self.health_check_protocol.as_deref() == Some("TCP") {
            return Err("TCP health checks cannot have a path".to_string());
        }
        Ok(())
    }
}
