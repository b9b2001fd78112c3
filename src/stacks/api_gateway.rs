use std::collections::BTreeMap;

use serde_json::json;

use crate::config::Environment;
use crate::error::{Result, SynthError};
use crate::network::{
    aws_service_name, declare_interface_endpoint, declare_vpc, subnet_ids, Ipv4Cidr, SubnetGroup, SubnetType, VpcHandle,
    VpcProps,
};
use crate::resources::apigateway::{
    ApiResource, BasePathMapping, Deployment, DomainName, EndpointConfiguration, Integration, Method, MethodResponse,
    RestApi, Stage, VpcLink,
};
use crate::resources::custom::{private_ip_address, EndpointNetworkInterfaces, ENDPOINT_IPS_HANDLER};
use crate::resources::ec2::VpcEndpointService;
use crate::resources::elbv2::{
    Listener, ListenerAction, ListenerCertificate, LoadBalancer, Matcher, TargetDescription, TargetGroup,
};
use crate::resources::iam::{aws_managed_policy, policy_document, service_assume_role, InlinePolicy, PolicyStatement, Role};
use crate::resources::lambda::Function;
use crate::template::{get_att, get_ref, import_value, sub, StrVal, Template};

use super::{export_name, CertificateHandle, LoadBalancerHandle, Stack, StackKind};

const STAGE_NAME: &str = "dev";
const PROXY_URI: &str = "https://${stageVariables.proxyFqdn}";

pub struct ApiGatewayProps<'a> {
    pub stack_name: &'a str,
    pub env: &'a Environment,
    pub name_prefix: &'a str,
    /// custom domain of the api, and the value of the `proxyFqdn` stage variable
    pub proxy_fqdn: &'a str,
    pub entry_vpc_cidr: Ipv4Cidr,
    pub max_azs: usize,
    pub certificate: &'a CertificateHandle,
    pub backend: &'a LoadBalancerHandle,
}

/// the endpoint service clients connect their interface endpoints to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointServiceExport {
    pub stack_name: String,
    pub service_name_export: String,
}

impl EndpointServiceExport {
    /// `com.amazonaws.vpce.<region>.vpce-svc-...`
    pub fn service_name(&self) -> StrVal {
        import_value(&self.service_name_export)
    }
}

/// one IP target per network interface of an interface endpoint. The addresses are
/// read from the custom resource `lookup_logical_id` at deploy time, so only the
/// interface count has to be known now.
pub fn endpoint_ip_targets(target_group: &str, lookup_logical_id: &str, interface_count: usize) -> Result<Vec<TargetDescription>> {
    if interface_count == 0 {
        return Err(SynthError::EmptyTargetGroup(target_group.to_string()));
    }
    Ok((0..interface_count)
        .map(|i| TargetDescription::ip(private_ip_address(lookup_logical_id, i)))
        .collect())
}

fn proxy_integration(vpc_link: &StrVal, uri: &str, request_parameters: BTreeMap<String, String>) -> Integration {
    Integration {
        ty: "HTTP_PROXY".into(),
        integration_http_method: "ANY".into(),
        connection_type: "VPC_LINK".into(),
        connection_id: vpc_link.clone(),
        uri: uri.to_string(),
        request_parameters,
    }
}

/// the lambda backed lookup of the private addresses of `endpoint_nics`
fn declare_endpoint_ip_lookup(template: &mut Template, logical_id: &str, endpoint_nics: StrVal) -> Result<()> {
    let role_id = format!("{logical_id}Role");
    template.add(&role_id, &Role {
        assume_role_policy_document: service_assume_role("lambda.amazonaws.com"),
        managed_policy_arns: vec![aws_managed_policy("service-role/AWSLambdaBasicExecutionRole")],
        policies: vec![InlinePolicy {
            policy_name: "DescribeNetworkInterfaces".into(),
            policy_document: policy_document(&[PolicyStatement::allow(&["ec2:DescribeNetworkInterfaces"], &["*"])]),
        }],
    })?;
    let function_id = format!("{logical_id}Function");
    let mut function = Function::inline_python(ENDPOINT_IPS_HANDLER, get_att(&role_id, "Arn"));
    function.description = Some("Looks up the private IP addresses of VPC endpoint network interfaces".into());
    template.add(&function_id, &function)?;
    template.add(logical_id, &EndpointNetworkInterfaces {
        service_token: get_att(&function_id, "Arn"),
        network_interface_ids: endpoint_nics,
    })?;
    Ok(())
}

pub fn api_gateway_stack(props: &ApiGatewayProps) -> Result<(Stack, VpcHandle, EndpointServiceExport)> {
    let _span = tracing::info_span!("api_gateway_stack", stack = props.stack_name).entered();
    let mut template = Template::new(format!("Private API gateway entry for {}", props.proxy_fqdn));
    let vpc = declare_vpc(&mut template, &VpcProps {
        logical_id: "EntryVpc".into(),
        vpc_name: "apigatewayEntry".into(),
        cidr: props.entry_vpc_cidr,
        max_azs: props.max_azs,
        subnet_groups: vec![SubnetGroup::new("apigatewayEntry", SubnetType::PrivateIsolated)],
    })?;
    let endpoint = declare_interface_endpoint(&mut template, &vpc, "ApiEndpoint", aws_service_name("execute-api"), true, None)?;

    // entry load balancer, forwarding to the addresses of the execute-api endpoint
    let entry_subnets = vpc.default_subnets();
    let nlb = template.add(
        "EntryNlb",
        &LoadBalancer::internal_network(format!("{}-nlb-entry-apigateway", props.name_prefix), subnet_ids(&entry_subnets)),
    )?;
    declare_endpoint_ip_lookup(&mut template, "GetEndpointIps", endpoint.network_interface_ids())?;
    let tg_name = format!("{}-tg-apigateway", props.name_prefix);
    let targets = endpoint_ip_targets(&tg_name, "GetEndpointIps", endpoint.network_interface_count)?;
    tracing::debug!(targets = targets.len(), "derived endpoint ip targets");
    let target_group = template.add("EntryTargetGroup", &TargetGroup {
        name: tg_name,
        port: 443,
        protocol: "TLS".into(),
        target_type: "ip".into(),
        vpc_id: vpc.vpc_id(),
        targets,
        health_check_protocol: Some("HTTPS".into()),
        health_check_path: Some("/ping".into()),
        matcher: Some(Matcher { http_code: "200".into() }),
    })?;
    template.add("EntryListener", &Listener {
        load_balancer_arn: nlb.clone(),
        port: 443,
        protocol: "TLS".into(),
        certificates: vec![ListenerCertificate { certificate_arn: props.certificate.arn() }],
        default_actions: vec![ListenerAction::forward(target_group)],
    })?;
    let endpoint_service_id = "EntryEndpointService";
    template.add(endpoint_service_id, &VpcEndpointService {
        network_load_balancer_arns: vec![nlb],
        acceptance_required: false,
    })?;

    // private rest api, proxying everything to the backend load balancer
    let vpc_link = template.add("BackendVpcLink", &VpcLink {
        name: format!("{}-nlb-backend", props.name_prefix),
        target_arns: vec![props.backend.arn()],
    })?;
    let mut statement = PolicyStatement::allow(&["execute-api:Invoke"], &["execute-api:/*"]);
    statement.principal = Some(json!("*"));
    statement.condition = Some(json!({ "StringEquals": { "aws:sourceVpce": endpoint.endpoint_id().to_json() } }));
    let api = template.add("ReverseProxyApi", &RestApi {
        name: format!("{}-reverse-proxy", props.name_prefix),
        description: "This service serves an internal api gateway".into(),
        endpoint_configuration: EndpointConfiguration {
            types: vec!["PRIVATE".into()],
            vpc_endpoint_ids: vec![endpoint.endpoint_id()],
        },
        policy: Some(policy_document(&[statement])),
    })?;
    let root = get_att("ReverseProxyApi", "RootResourceId");
    template.add("ReverseProxyApiRootANY", &Method {
        http_method: "ANY".into(),
        resource_id: root.clone(),
        rest_api_id: api.clone(),
        authorization_type: "NONE".into(),
        request_parameters: BTreeMap::new(),
        integration: proxy_integration(&vpc_link, PROXY_URI, BTreeMap::new()),
        method_responses: vec![],
    })?;
    let proxy_resource = template.add("ReverseProxyApiProxy", &ApiResource {
        parent_id: root,
        path_part: "{proxy+}".into(),
        rest_api_id: api.clone(),
    })?;
    let mut method_params = BTreeMap::new();
    method_params.insert("method.request.path.proxy".to_string(), true);
    let mut integration_params = BTreeMap::new();
    integration_params.insert("integration.request.path.proxy".to_string(), "method.request.path.proxy".to_string());
    template.add("ReverseProxyApiProxyANY", &Method {
        http_method: "ANY".into(),
        resource_id: proxy_resource,
        rest_api_id: api.clone(),
        authorization_type: "NONE".into(),
        request_parameters: method_params,
        integration: proxy_integration(&vpc_link, &format!("{PROXY_URI}/{{proxy}}"), integration_params),
        method_responses: vec![MethodResponse { status_code: "200".into() }],
    })?;
    // a deployment snapshots the methods that exist when it's created
    let deployment = template.add_with_deps(
        "ReverseProxyApiDeployment",
        &Deployment { rest_api_id: api.clone(), description: None },
        &["ReverseProxyApiRootANY", "ReverseProxyApiProxyANY"],
    )?;
    let mut variables = BTreeMap::new();
    variables.insert("proxyFqdn".to_string(), props.proxy_fqdn.to_string());
    let stage = template.add("ReverseProxyApiStage", &Stage {
        rest_api_id: api.clone(),
        deployment_id: deployment,
        stage_name: STAGE_NAME.into(),
        variables,
    })?;
    let domain = template.add("ProxyDomainName", &DomainName {
        domain_name: props.proxy_fqdn.to_string(),
        regional_certificate_arn: props.certificate.arn(),
        endpoint_configuration: EndpointConfiguration { types: vec!["REGIONAL".into()], vpc_endpoint_ids: vec![] },
        security_policy: "TLS_1_2".into(),
    })?;
    template.add("ProxyBasePathMapping", &BasePathMapping { domain_name: domain, rest_api_id: api, stage })?;

    let service_name = sub(&format!("com.amazonaws.vpce.${{AWS::Region}}.${{{}}}", endpoint_service_id));
    let service_name_export = export_name(props.stack_name, "vpcEndpointServiceName");
    template.add_output("vpcEndpointServiceName", Some("connect interface endpoints to this service"), &service_name, Some(service_name_export.as_str()))?;
    template.add_output("EntryVpcId", None, &get_ref(&vpc.logical_id), Some(export_name(props.stack_name, "EntryVpcId").as_str()))?;

    let deps = vec![props.certificate.stack_name.clone(), props.backend.stack_name.clone()];
    let stack = Stack::new(props.stack_name, StackKind::ApiGateway, props.env, template, deps)?;
    let export = EndpointServiceExport {
        stack_name: props.stack_name.to_string(),
        service_name_export,
    };
    tracing::info!(fqdn = props.proxy_fqdn, entry_vpc = %vpc.cidr, "declared api gateway");
    Ok((stack, vpc, export))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn derives_exactly_one_target_per_interface() {
        for k in 1..=4 {
            let targets = endpoint_ip_targets("tg", "GetEndpointIps", k).unwrap();
            assert_eq!(targets.len(), k);
            let last = targets[k - 1].id.to_json();
            assert_eq!(last, json!({ "Fn::GetAtt": ["GetEndpointIps", format!("NetworkInterfaces.{}.PrivateIpAddress", k - 1)] }));
        }
    }

    #[test]
    fn no_interfaces_is_an_error() {
        match endpoint_ip_targets("app-tg-apigateway", "GetEndpointIps", 0) {
            Err(SynthError::EmptyTargetGroup(name)) => assert_eq!(name, "app-tg-apigateway"),
            x => panic!("expected empty target group error, got {:?}", x),
        }
    }
}
