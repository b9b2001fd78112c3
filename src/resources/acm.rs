use serde::Serialize;

use crate::template::{CfnResource, StrVal};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DomainValidationOption {
    pub domain_name: String,
    pub hosted_zone_id: String,
}

/// an ACM certificate validated through DNS records that ACM writes
/// into a route53 hosted zone in the same account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Certificate {
    /// the domain you're requesting a certificate for. Must be fully qualified. Can have 1 optional wildcard.
    /// Examples of valid values:
    /// - www.mysite.com
    /// - mysite.com
    /// - *.mysite.com
    /// Examples of invalid values:
    /// - *.something.*.mysite.com
    /// - cannotendwithdot.com.
    pub domain_name: String,
    pub validation_method: String,
    pub domain_validation_options: Vec<DomainValidationOption>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<super::Tag>,
}

impl Certificate {
    pub fn dns_validated(domain_name: &str, hosted_zone_id: &str) -> Self {
        Self {
            domain_name: domain_name.to_string(),
            validation_method: "DNS".into(),
            domain_validation_options: vec![DomainValidationOption {
                domain_name: domain_name.to_string(),
                hosted_zone_id: hosted_zone_id.to_string(),
            }],
            tags: super::name_tag(StrVal::from(domain_name)),
        }
    }
}

impl CfnResource for Certificate {
    const TYPE: &'static str = "AWS::CertificateManager::Certificate";

    fn validate(&self) -> Result<(), String> {
        if self.domain_name.is_empty() {
            return Err("Must provide a domain name".to_string());
        }
        if self.domain_name.ends_with('.') {
            return Err(format!("Domain name must not end with a dot. {} is invalid.", self.domain_name));
        }
        if self.domain_name.contains("*") {
            if self.domain_name.matches("*").count() > 1 {
                return Err(format!("Must only provide 1 wildcard. {} is invalid.", self.domain_name));
            }
            if !self.domain_name.starts_with("*.") {
                return Err(format!("If using a wildcard, it must be the first component of your domain, eg: \"*.something.com\". {} is invalid.", self.domain_name));
            }
        }
        for opt in self.domain_validation_options.iter() {
            if opt.hosted_zone_id.is_empty() {
                return Err(format!("Must provide the hosted zone ID of where {} resides", opt.domain_name));
            }
            if opt.hosted_zone_id.starts_with("/hostedzone/") {
                return Err(format!("Hosted zone ID must be provided without the /hostedzone/ prefix. {} is invalid.", opt.hosted_zone_id));
            }
        }
        Ok(())
    }
}
