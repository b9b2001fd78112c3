use serde::Serialize;

use crate::template::{CfnResource, StrVal};

#[derive(Debug, Clone, Serialize)]
pub struct HostedZoneVpc {
    #[serde(rename = "VPCId")]
    pub vpc_id: StrVal,
    #[serde(rename = "VPCRegion")]
    pub vpc_region: StrVal,
}

/// a hosted zone. Associating it with at least one VPC makes it private.
#[derive(Debug, Clone, Serialize)]
pub struct HostedZone {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "VPCs", skip_serializing_if = "Vec::is_empty")]
    pub vpcs: Vec<HostedZoneVpc>,
}

impl CfnResource for HostedZone {
    const TYPE: &'static str = "AWS::Route53::HostedZone";

    fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("Hosted zone must have a name. Example mywebsite.com".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AliasTarget {
    #[serde(rename = "DNSName")]
    pub dns_name: StrVal,
    #[serde(rename = "HostedZoneId")]
    pub hosted_zone_id: StrVal,
    #[serde(rename = "EvaluateTargetHealth")]
    pub evaluate_target_health: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecordSet {
    pub hosted_zone_id: StrVal,
    pub name: String,
    #[serde(rename = "Type")]
    pub record_type: String,
    pub alias_target: AliasTarget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl RecordSet {
    pub fn alias_a(hosted_zone_id: StrVal, name: &str, alias_target: AliasTarget) -> Self {
        let name = fully_qualified(name);
        Self {
            hosted_zone_id,
            comment: Some(name.trim_end_matches('.').to_string()),
            name,
            record_type: "A".into(),
            alias_target,
        }
    }
}

impl CfnResource for RecordSet {
    const TYPE: &'static str = "AWS::Route53::RecordSet";

    fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() || self.name == "." {
            return Err("Route53 record must have a name. Example mysubdomain.mywebsite.com".to_string());
        }
        Ok(())
    }
}

/// record and zone names must end in '.'
pub fn fully_qualified(name: &str) -> String {
    let mut name = name.to_string();
    if !name.ends_with('.') {
        name.push('.');
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::get_ref;

    #[test]
    fn alias_records_are_fully_qualified() {
        let target = AliasTarget { dns_name: "x".into(), hosted_zone_id: "y".into(), evaluate_target_health: false };
        let record = RecordSet::alias_a(get_ref("Zone"), "app.proxy.domain.com", target);
        assert_eq!(record.name, "app.proxy.domain.com.");
        assert_eq!(record.comment.as_deref(), Some("app.proxy.domain.com"));
        let v = serde_json::to_value(&record).unwrap();
        assert_eq!(v["Type"], "A");
        assert_eq!(v["AliasTarget"]["DNSName"], "x");
    }

    #[test]
    fn fully_qualified_is_idempotent() {
        assert_eq!(fully_qualified("a.com"), "a.com.");
        assert_eq!(fully_qualified("a.com."), "a.com.");
    }
}
