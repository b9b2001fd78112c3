use privatelink_proxy::assembly::write_assembly;
use privatelink_proxy::stacks::StackKind;
use privatelink_proxy::variables::Variables;
use privatelink_proxy::{synthesize, AppConfig, SynthError};
use serde_json::Value;

const BASE: &str = r#"
hosted_zone_id = "Z0123456789ABCDEFGHIJ"
proxy_domain_name = "proxy.domain.com"
backend_fqdn = "backend.internal.com"
client_vpc_cidr = "172.16.0.0/24"
backend_vpc_cidr = "172.16.100.0/24"

[client_env]
account = "123456789012"
region = "us-east-1"
"#;

fn deployment(hostname: &str, region: &str, cidr: &str) -> String {
    format!(
        "\n[[deployments]]\nproxy_hostname = \"{hostname}\"\nentry_vpc_cidr = \"{cidr}\"\nenv = {{ account = \"123456789012\", region = \"{region}\" }}\n"
    )
}

fn config(deployments: &[(&str, &str, &str)]) -> AppConfig {
    let mut toml = BASE.to_string();
    for (hostname, region, cidr) in deployments {
        toml.push_str(&deployment(hostname, region, cidr));
    }
    AppConfig::from_toml_str(&toml, &Variables::default()).unwrap()
}

fn template_json(assembly: &privatelink_proxy::CloudAssembly, stack: &str) -> Value {
    serde_json::to_value(&assembly.stack(stack).unwrap().template).unwrap()
}

fn resources_of_type<'a>(template: &'a Value, ty: &str) -> Vec<(&'a String, &'a Value)> {
    template["Resources"].as_object().unwrap().iter().filter(|(_, r)| r["Type"] == ty).collect()
}

#[test]
fn single_deployment_end_to_end() {
    let assembly = synthesize(&config(&[("app", "us-east-1", "172.16.1.0/24")])).unwrap();
    assert_eq!(assembly.stack_names(), vec!["app-CertificateStack", "app-BackendStack", "app-ApiGatewayStack", "ClientStack"]);

    let cert = template_json(&assembly, "app-CertificateStack");
    let certs = resources_of_type(&cert, "AWS::CertificateManager::Certificate");
    assert_eq!(certs.len(), 1);
    assert_eq!(certs[0].1["Properties"]["DomainName"], "app.proxy.domain.com");

    let client = template_json(&assembly, "ClientStack");
    let records = resources_of_type(&client, "AWS::Route53::RecordSet");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].1["Properties"]["Name"], "app.proxy.domain.com.");
    assert_eq!(client["Outputs"]["Aliasapp"]["Value"], "app.proxy.domain.com");

    // the endpoint to the proxy, plus ssm, ssmmessages and ec2messages
    let endpoints = resources_of_type(&client, "AWS::EC2::VPCEndpoint");
    assert_eq!(endpoints.len(), 4);
    let to_proxy: Vec<_> = endpoints.iter()
        .filter(|(_, e)| e["Properties"]["ServiceName"]["Fn::ImportValue"] == "app-ApiGatewayStack-vpcEndpointServiceName")
        .collect();
    assert_eq!(to_proxy.len(), 1);
    assert_eq!(to_proxy[0].0.as_str(), "VPCEndpointapp");
}

#[test]
fn imports_match_exports() {
    let assembly = synthesize(&config(&[("app", "us-east-1", "172.16.1.0/24"), ("api", "us-east-1", "172.16.2.0/24")])).unwrap();
    let mut exports = vec![];
    for stack in assembly.stacks.iter() {
        exports.extend(stack.template.export_names().into_iter().map(String::from));
    }
    for stack in assembly.stacks.iter() {
        let body = stack.template.to_json_pretty().unwrap();
        let json: Value = serde_json::from_str(&body).unwrap();
        let mut imports = vec![];
        collect_imports(&json, &mut imports);
        for import in imports {
            assert!(exports.contains(&import), "{} imports {import} which no stack exports", stack.name);
        }
    }
}

fn collect_imports(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                if k == "Fn::ImportValue" {
                    if let Some(s) = v.as_str() {
                        out.push(s.to_string());
                    }
                }
                collect_imports(v, out);
            }
        }
        Value::Array(items) => items.iter().for_each(|v| collect_imports(v, out)),
        _ => {}
    }
}

#[test]
fn cross_region_deployment_aborts() {
    let err = synthesize(&config(&[("app", "eu-west-1", "172.16.1.0/24")])).unwrap_err();
    match &err {
        SynthError::CrossRegion { hostname, region, client_region } => {
            assert_eq!(hostname, "app");
            assert_eq!(region, "eu-west-1");
            assert_eq!(client_region, "us-east-1");
        }
        x => panic!("expected cross region error, got {:?}", x),
    }
    assert!(err.to_string().contains("app -> eu-west-1"));
}

#[test]
fn n_deployments_make_3n_plus_1_stacks_in_order() {
    for n in 0..=3 {
        let hostnames = ["app", "api", "web"];
        let cidrs = ["172.16.1.0/24", "172.16.2.0/24", "172.16.3.0/24"];
        let deployments: Vec<_> = (0..n).map(|i| (hostnames[i], "us-east-1", cidrs[i])).collect();
        let assembly = synthesize(&config(&deployments)).unwrap();
        assert_eq!(assembly.stacks.len(), 3 * n + 1);
        for (i, hostname) in hostnames.iter().take(n).enumerate() {
            let triple = &assembly.stacks[3 * i..3 * i + 3];
            assert_eq!(triple[0].kind, StackKind::Certificate);
            assert_eq!(triple[1].kind, StackKind::Backend);
            assert_eq!(triple[2].kind, StackKind::ApiGateway);
            assert_eq!(triple[0].name, format!("{hostname}-CertificateStack"));
        }
        let client = &assembly.stacks[3 * n];
        assert_eq!(client.kind, StackKind::Client);
        assert_eq!(client.dependencies.len(), n);
    }
}

#[test]
fn entry_target_group_has_one_target_per_endpoint_interface() {
    for max_azs in 1..=3 {
        let mut cfg = config(&[("app", "us-east-1", "172.16.1.0/24")]);
        cfg.max_azs = max_azs;
        let assembly = synthesize(&cfg).unwrap();
        let gateway = template_json(&assembly, "app-ApiGatewayStack");
        let endpoint_subnets = gateway["Resources"]["ApiEndpoint"]["Properties"]["SubnetIds"].as_array().unwrap().len();
        assert_eq!(endpoint_subnets, max_azs);
        let targets = gateway["Resources"]["EntryTargetGroup"]["Properties"]["Targets"].as_array().unwrap();
        assert_eq!(targets.len(), endpoint_subnets);
        let last = &targets[max_azs - 1]["Id"]["Fn::GetAtt"];
        assert_eq!(last[1], format!("NetworkInterfaces.{}.PrivateIpAddress", max_azs - 1));
    }
}

#[test]
fn az_counts_past_the_region_minimum_are_rejected() {
    for max_azs in [8, usize::MAX] {
        let mut cfg = config(&[("app", "us-east-1", "172.16.1.0/24")]);
        cfg.max_azs = max_azs;
        assert!(matches!(synthesize(&cfg), Err(SynthError::ConfigError(_))));
    }
}

#[test]
fn duplicate_hostnames_are_rejected() {
    let cfg = config(&[("app", "us-east-1", "172.16.1.0/24"), ("app", "us-east-1", "172.16.2.0/24")]);
    assert!(matches!(synthesize(&cfg), Err(SynthError::DuplicateHostname(h)) if h == "app"));
}

#[test]
fn private_api_is_locked_to_its_endpoint() {
    let assembly = synthesize(&config(&[("app", "us-east-1", "172.16.1.0/24")])).unwrap();
    let gateway = template_json(&assembly, "app-ApiGatewayStack");
    let api = &gateway["Resources"]["ReverseProxyApi"]["Properties"];
    assert_eq!(api["EndpointConfiguration"]["Types"][0], "PRIVATE");
    let condition = &api["Policy"]["Statement"][0]["Condition"]["StringEquals"]["aws:sourceVpce"];
    assert_eq!(condition["Ref"], "ApiEndpoint");

    let stage = &gateway["Resources"]["ReverseProxyApiStage"]["Properties"];
    assert_eq!(stage["StageName"], "dev");
    assert_eq!(stage["Variables"]["proxyFqdn"], "app.proxy.domain.com");
    let proxy = &gateway["Resources"]["ReverseProxyApiProxyANY"]["Properties"]["Integration"];
    assert_eq!(proxy["Uri"], "https://${stageVariables.proxyFqdn}/{proxy}");
    assert_eq!(proxy["ConnectionType"], "VPC_LINK");

    let service_name = &gateway["Outputs"]["vpcEndpointServiceName"];
    assert_eq!(service_name["Value"]["Fn::Sub"], "com.amazonaws.vpce.${AWS::Region}.${EntryEndpointService}");
    assert_eq!(service_name["Export"]["Name"], "app-ApiGatewayStack-vpcEndpointServiceName");
    assert!(gateway["Resources"]["EntryEndpointService"].is_object());
}

#[test]
fn writes_the_assembly() {
    let assembly = synthesize(&config(&[("app", "us-east-1", "172.16.1.0/24")])).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let written = write_assembly(&assembly, dir.path()).unwrap();
    assert_eq!(written.len(), 6);

    let client: Value = serde_json::from_str(&std::fs::read_to_string(dir.path().join("ClientStack.template.json")).unwrap()).unwrap();
    assert_eq!(client["AWSTemplateFormatVersion"], "2010-09-09");

    let manifest: Value = serde_json::from_str(&std::fs::read_to_string(dir.path().join("manifest.json")).unwrap()).unwrap();
    let names: Vec<_> = manifest["stacks"].as_array().unwrap().iter().map(|s| s["stack_name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["app-CertificateStack", "app-BackendStack", "app-ApiGatewayStack", "ClientStack"]);

    let script = std::fs::read_to_string(dir.path().join("deploy.sh")).unwrap();
    assert!(script.starts_with("#!/usr/bin/env bash"));
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(dir.path().join("deploy.sh")).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }
}

#[test]
fn sample_config_synthesizes() {
    let vars = Variables::from_pairs([
        ("HOSTED_ZONE_ID", "Z0123456789ABCDEFGHIJ"),
        ("ACCOUNT_ID", "123456789012"),
        ("AWS_REGION", "us-east-1"),
    ]);
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config/proxy.toml");
    let cfg = AppConfig::load(path, &vars).unwrap();
    assert_eq!(synthesize(&cfg).unwrap().stacks.len(), 4);
}
