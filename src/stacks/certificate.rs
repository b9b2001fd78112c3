use crate::config::Environment;
use crate::error::Result;
use crate::resources::acm::Certificate;
use crate::template::{import_value, StrVal, Template};

use super::{export_name, Stack, StackKind};

pub struct CertificateProps<'a> {
    pub stack_name: &'a str,
    pub env: &'a Environment,
    /// zone ACM writes its validation records to
    pub hosted_zone_id: &'a str,
    pub domain_name: &'a str,
}

/// a DNS validated certificate for one domain, usable by any stack in the same
/// account and region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateHandle {
    pub domain_name: String,
    pub hosted_zone_id: String,
    pub stack_name: String,
    pub arn_export: String,
}

impl CertificateHandle {
    pub fn arn(&self) -> StrVal {
        import_value(&self.arn_export)
    }
}

pub fn certificate_stack(props: &CertificateProps) -> Result<(Stack, CertificateHandle)> {
    let _span = tracing::info_span!("certificate_stack", stack = props.stack_name).entered();
    let mut template = Template::new(format!("TLS certificate for {}", props.domain_name));
    let cert = template.add("Certificate", &Certificate::dns_validated(props.domain_name, props.hosted_zone_id))?;
    let arn_export = export_name(props.stack_name, "CertificateArn");
    template.add_output("CertificateArn", Some(props.domain_name), &cert, Some(arn_export.as_str()))?;

    let stack = Stack::new(props.stack_name, StackKind::Certificate, props.env, template, vec![])?;
    let handle = CertificateHandle {
        domain_name: props.domain_name.to_string(),
        hosted_zone_id: props.hosted_zone_id.to_string(),
        stack_name: props.stack_name.to_string(),
        arn_export,
    };
    tracing::info!(domain = %handle.domain_name, "declared certificate");
    Ok((stack, handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn exports_the_certificate_arn() {
        let env = Environment { account: "123456789012".into(), region: "us-east-1".into() };
        let (stack, handle) = certificate_stack(&CertificateProps {
            stack_name: "app-CertificateStack",
            env: &env,
            hosted_zone_id: "Z0123456789",
            domain_name: "app.proxy.domain.com",
        }).unwrap();
        assert_eq!(stack.kind, StackKind::Certificate);
        assert!(stack.dependencies.is_empty());
        let cert = stack.template.resource("Certificate").unwrap();
        assert_eq!(cert.properties["DomainName"], "app.proxy.domain.com");
        assert_eq!(cert.properties["DomainValidationOptions"][0]["HostedZoneId"], "Z0123456789");
        assert_eq!(stack.template.export_names(), vec!["app-CertificateStack-CertificateArn"]);
        assert_eq!(handle.arn().to_json(), json!({ "Fn::ImportValue": "app-CertificateStack-CertificateArn" }));
    }

    #[test]
    fn bad_zone_ids_fail_validation() {
        let env = Environment { account: "123456789012".into(), region: "us-east-1".into() };
        let err = certificate_stack(&CertificateProps {
            stack_name: "app-CertificateStack",
            env: &env,
            hosted_zone_id: "/hostedzone/Z0123456789",
            domain_name: "app.proxy.domain.com",
        }).unwrap_err();
        assert!(err.to_string().starts_with("Validation failed on resource 'Certificate'"));
    }
}
