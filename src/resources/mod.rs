use serde::Serialize;

use crate::template::StrVal;

pub mod acm;
pub mod apigateway;
pub mod custom;
pub mod ec2;
pub mod elbv2;
pub mod iam;
pub mod lambda;
pub mod route53;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    pub value: StrVal,
}

/// the `Name` tag that the EC2 console displays for a resource
pub fn name_tag<S: Into<StrVal>>(name: S) -> Vec<Tag> {
    vec![Tag { key: "Name".to_string(), value: name.into() }]
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// load balancer and target group names share the same rules.
fn verify_elb_name(kind: &str, name: &str) -> Result<(), String> {
    if name.is_empty() || name.len() > 32 {
        return Err(format!("Invalid {kind} name {:?}\nMust contain between 1 and 32 characters", name));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(format!("Invalid {kind} name {:?}\nMust contain only alphanumeric characters and hyphens", name));
    }
    if name.starts_with('-') || name.ends_with('-') {
        return Err(format!("Invalid {kind} name {:?}\nMust not begin or end with a hyphen", name));
    }
    Ok(())
}
