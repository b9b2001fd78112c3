use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::template::{CfnResource, StrVal};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EndpointConfiguration {
    pub types: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vpc_endpoint_ids: Vec<StrVal>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RestApi {
    pub name: String,
    pub description: String,
    pub endpoint_configuration: EndpointConfiguration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<Value>,
}

impl CfnResource for RestApi {
    const TYPE: &'static str = "AWS::ApiGateway::RestApi";

    fn validate(&self) -> Result<(), String> {
        let private = self.endpoint_configuration.types.iter().any(|t| t == "PRIVATE");
        if private && self.policy.is_none() {
            return Err(format!("Private API {} needs a resource policy, otherwise nothing can invoke it", self.name));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VpcLink {
    pub name: String,
    pub target_arns: Vec<StrVal>,
}

impl CfnResource for VpcLink {
    const TYPE: &'static str = "AWS::ApiGateway::VpcLink";

    fn validate(&self) -> Result<(), String> {
        if self.target_arns.len() != 1 {
            return Err(format!("VPC link {} must target exactly one network load balancer", self.name));
        }
        Ok(())
    }
}

/// `AWS::ApiGateway::Resource`, a path segment of a rest API
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiResource {
    pub parent_id: StrVal,
    pub path_part: String,
    pub rest_api_id: StrVal,
}

impl CfnResource for ApiResource {
    const TYPE: &'static str = "AWS::ApiGateway::Resource";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Integration {
    #[serde(rename = "Type")]
    pub ty: String,
    pub integration_http_method: String,
    pub connection_type: String,
    pub connection_id: StrVal,
    pub uri: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub request_parameters: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MethodResponse {
    pub status_code: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Method {
    pub http_method: String,
    pub resource_id: StrVal,
    pub rest_api_id: StrVal,
    pub authorization_type: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub request_parameters: BTreeMap<String, bool>,
    pub integration: Integration,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub method_responses: Vec<MethodResponse>,
}

impl CfnResource for Method {
    const TYPE: &'static str = "AWS::ApiGateway::Method";

    fn validate(&self) -> Result<(), String> {
        // every integration.request.* mapping must read from a declared method.request.* parameter
        for (target, source) in self.integration.request_parameters.iter() {
            if source.starts_with("method.request.") && !self.request_parameters.contains_key(source) {
                return Err(format!("Integration parameter {target} maps from {source} which the method does not declare"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Deployment {
    pub rest_api_id: StrVal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CfnResource for Deployment {
    const TYPE: &'static str = "AWS::ApiGateway::Deployment";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Stage {
    pub rest_api_id: StrVal,
    pub deployment_id: StrVal,
    pub stage_name: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,
}

impl CfnResource for Stage {
    const TYPE: &'static str = "AWS::ApiGateway::Stage";

    fn validate(&self) -> Result<(), String> {
        if self.stage_name.is_empty() || !self.stage_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(format!("Invalid stage name {:?}", self.stage_name));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DomainName {
    pub domain_name: String,
    pub regional_certificate_arn: StrVal,
    pub endpoint_configuration: EndpointConfiguration,
    pub security_policy: String,
}

impl CfnResource for DomainName {
    const TYPE: &'static str = "AWS::ApiGateway::DomainName";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BasePathMapping {
    pub domain_name: StrVal,
    pub rest_api_id: StrVal,
    pub stage: StrVal,
}

impl CfnResource for BasePathMapping {
    const TYPE: &'static str = "AWS::ApiGateway::BasePathMapping";
}
