use serde::Serialize;
use serde_json::{json, Value};

use crate::template::{join, partition, CfnResource, StrVal};

#[derive(Debug, Clone)]
pub struct PolicyStatement {
    pub effect: String,
    pub actions: Vec<String>,
    pub resources: Vec<String>,
    pub principal: Option<Value>,
    pub condition: Option<Value>,
}

impl PolicyStatement {
    pub fn allow(actions: &[&str], resources: &[&str]) -> Self {
        Self {
            effect: "Allow".into(),
            actions: actions.iter().map(|a| a.to_string()).collect(),
            resources: resources.iter().map(|r| r.to_string()).collect(),
            principal: None,
            condition: None,
        }
    }

    pub fn to_json(&self) -> Value {
        let mut out = json!({
            "Effect": self.effect,
            "Action": self.actions,
            "Resource": self.resources,
        });
        if let Some(p) = &self.principal {
            out["Principal"] = p.clone();
        }
        if let Some(c) = &self.condition {
            out["Condition"] = c.clone();
        }
        out
    }
}

pub fn policy_document(statements: &[PolicyStatement]) -> Value {
    let statements: Vec<Value> = statements.iter().map(PolicyStatement::to_json).collect();
    json!({
        "Version": "2012-10-17",
        "Statement": statements,
    })
}

/// a trust policy letting the given service, eg: `ec2.amazonaws.com`, assume a role
pub fn service_assume_role(service: &str) -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Effect": "Allow",
            "Principal": { "Service": service },
            "Action": "sts:AssumeRole",
        }],
    })
}

pub fn aws_managed_policy(name: &str) -> StrVal {
    join("", &["arn:".into(), partition(), format!(":iam::aws:policy/{name}").into()])
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InlinePolicy {
    pub policy_name: String,
    pub policy_document: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Role {
    pub assume_role_policy_document: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub managed_policy_arns: Vec<StrVal>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub policies: Vec<InlinePolicy>,
}

impl Role {
    /// a role that EC2 instances can assume, managed through SSM session manager
    pub fn ssm_managed_instance() -> Self {
        Self {
            assume_role_policy_document: service_assume_role("ec2.amazonaws.com"),
            managed_policy_arns: vec![aws_managed_policy("AmazonSSMManagedInstanceCore")],
            policies: vec![],
        }
    }
}

impl CfnResource for Role {
    const TYPE: &'static str = "AWS::IAM::Role";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstanceProfile {
    pub roles: Vec<StrVal>,
}

impl CfnResource for InstanceProfile {
    const TYPE: &'static str = "AWS::IAM::InstanceProfile";

    fn validate(&self) -> Result<(), String> {
        if self.roles.len() != 1 {
            return Err("An instance profile can contain exactly one role".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statements_only_carry_what_is_set() {
        let s = PolicyStatement::allow(&["ec2:DescribeNetworkInterfaces"], &["*"]).to_json();
        assert_eq!(s, json!({ "Effect": "Allow", "Action": ["ec2:DescribeNetworkInterfaces"], "Resource": ["*"] }));
        let mut s = PolicyStatement::allow(&["execute-api:Invoke"], &["execute-api:/*"]);
        s.principal = Some(json!("*"));
        assert_eq!(s.to_json()["Principal"], "*");
    }

    #[test]
    fn managed_policy_arn_is_partition_aware() {
        let arn = aws_managed_policy("AmazonSSMManagedInstanceCore").to_json();
        assert_eq!(arn, json!({ "Fn::Join": ["", ["arn:", { "Ref": "AWS::Partition" }, ":iam::aws:policy/AmazonSSMManagedInstanceCore"]] }));
    }
}
