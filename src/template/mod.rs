use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SynthError};

mod intrinsics;
pub use intrinsics::*;

/// a declaration that can be placed in the `Resources` section of a template.
pub trait CfnResource: Serialize {
    /// the cloudformation resource type, eg: `AWS::EC2::VPC`
    const TYPE: &'static str;

    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SavedResource {
    #[serde(rename = "Type")]
    pub ty: String,
    #[serde(rename = "Properties")]
    pub properties: Value,
    #[serde(rename = "DependsOn", default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(rename = "Type")]
    pub ty: String,
    #[serde(rename = "Default", skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputExport {
    #[serde(rename = "Name")]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceOutput {
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Value")]
    pub value: Value,
    #[serde(rename = "Export", skip_serializing_if = "Option::is_none")]
    pub export: Option<OutputExport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub version: String,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Parameters", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, Parameter>,
    #[serde(rename = "Resources")]
    pub resources: BTreeMap<String, SavedResource>,
    #[serde(rename = "Outputs", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, ResourceOutput>,
}

impl Default for Template {
    fn default() -> Self {
        Self {
            version: "2010-09-09".to_string(),
            description: None,
            parameters: Default::default(),
            resources: Default::default(),
            outputs: Default::default(),
        }
    }
}

impl Template {
    pub fn new(description: impl Into<String>) -> Self {
        Self { description: Some(description.into()), ..Default::default() }
    }

    /// validates and declares a resource. Returns a `Ref` to it.
    pub fn add<R: CfnResource>(&mut self, logical_id: &str, resource: &R) -> Result<StrVal> {
        self.add_with_deps(logical_id, resource, &[])
    }

    pub fn add_with_deps<R: CfnResource>(&mut self, logical_id: &str, resource: &R, depends_on: &[&str]) -> Result<StrVal> {
        verify_resource_name(logical_id)?;
        if self.resources.contains_key(logical_id) {
            return Err(SynthError::DuplicateLogicalId(logical_id.to_string()));
        }
        for dep in depends_on {
            if !self.resources.contains_key(*dep) {
                return Err(SynthError::ValidationError {
                    logical_id: logical_id.to_string(),
                    reason: format!("depends on {dep} which is not declared in this template"),
                });
            }
        }
        if let Err(reason) = resource.validate() {
            return Err(SynthError::ValidationError { logical_id: logical_id.to_string(), reason });
        }
        let properties = serde_json::to_value(resource)
            .map_err(|e| SynthError::serialize(format!("resource {logical_id}"), e))?;
        let saved = SavedResource {
            ty: R::TYPE.to_string(),
            properties,
            depends_on: depends_on.iter().map(|d| d.to_string()).collect(),
        };
        self.resources.insert(logical_id.to_string(), saved);
        Ok(get_ref(logical_id))
    }

    pub fn add_parameter(&mut self, name: &str, parameter: Parameter) -> Result<StrVal> {
        verify_resource_name(name)?;
        self.parameters.insert(name.to_string(), parameter);
        Ok(get_ref(name))
    }

    pub fn add_output(&mut self, name: &str, description: Option<&str>, value: &StrVal, export_name: Option<&str>) -> Result<()> {
        verify_resource_name(name)?;
        if self.outputs.contains_key(name) {
            return Err(SynthError::DuplicateLogicalId(name.to_string()));
        }
        let output = ResourceOutput {
            description: description.map(|d| d.to_string()),
            value: value.to_json(),
            export: export_name.map(|n| OutputExport { name: n.to_string() }),
        };
        self.outputs.insert(name.to_string(), output);
        Ok(())
    }

    pub fn resource(&self, logical_id: &str) -> Option<&SavedResource> {
        self.resources.get(logical_id)
    }

    pub fn resources_of_type<'a>(&'a self, ty: &'a str) -> impl Iterator<Item = (&'a String, &'a SavedResource)> + 'a {
        self.resources.iter().filter(move |(_, r)| r.ty == ty)
    }

    pub fn export_names(&self) -> Vec<&str> {
        self.outputs.values().filter_map(|o| o.export.as_ref().map(|e| e.name.as_str())).collect()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        // pretty so that it looks nice if a user needs to look at the stack in the Cfn console
        serde_json::to_string_pretty(self).map_err(|e| SynthError::serialize("template", e))
    }
}

pub fn verify_resource_name(resource_name: &str) -> Result<()> {
    let reason = if resource_name.len() > 255 {
        "must be less than 255 characters"
    } else if resource_name.is_empty() {
        "Must contain at least 1 character"
    } else if !resource_name.chars().all(|c| c.is_ascii_alphanumeric()) {
        "Must contain only alphanumeric characters [A-Za-z0-9]"
    } else {
        return Ok(());
    };
    Err(SynthError::InvalidLogicalId { name: resource_name.to_string(), reason: reason.to_string() })
}

/// builds a logical id out of the given parts, dropping everything that
/// cloudformation doesn't allow in a logical id.
pub fn logical_id(parts: &[&str]) -> String {
    parts.iter().flat_map(|p| p.chars()).filter(|c| c.is_ascii_alphanumeric()).collect()
}

pub fn validate_stack_name(stack_name: &str) -> Result<()> {
    // A stack name can contain only alphanumeric characters (case sensitive) and hyphens.
    // It must start with an alphabetical character and can't be longer than 128 characters.
    let restriction = "Must only consist of alphanumeric characters and hyphens, Must start with an alphabetical character, and cannot be longer than 128 characters.";
    let invalid = || SynthError::InvalidStackName { name: stack_name.to_string(), reason: restriction.to_string() };
    match stack_name.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return Err(invalid()),
    }
    if !stack_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(invalid());
    }
    if stack_name.len() > 128 {
        return Err(invalid());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    #[serde(rename_all = "PascalCase")]
    struct Thing {
        name: String,
    }

    impl CfnResource for Thing {
        const TYPE: &'static str = "Test::Thing";

        fn validate(&self) -> Result<(), String> {
            if self.name.is_empty() {
                return Err("Must provide a name".to_string());
            }
            Ok(())
        }
    }

    #[test]
    fn add_serializes_type_and_properties() {
        let mut t = Template::new("test");
        let r = t.add("MyThing", &Thing { name: "abc".into() }).unwrap();
        assert_eq!(r.to_json(), json!({ "Ref": "MyThing" }));
        let v = serde_json::to_value(&t).unwrap();
        assert_eq!(v["AWSTemplateFormatVersion"], "2010-09-09");
        assert_eq!(v["Resources"]["MyThing"], json!({ "Type": "Test::Thing", "Properties": { "Name": "abc" } }));
        assert!(v.get("Outputs").is_none());
    }

    #[test]
    fn rejects_bad_and_duplicate_logical_ids() {
        let mut t = Template::default();
        let thing = Thing { name: "abc".into() };
        assert!(matches!(t.add("my-thing", &thing), Err(SynthError::InvalidLogicalId { .. })));
        t.add("MyThing", &thing).unwrap();
        assert!(matches!(t.add("MyThing", &thing), Err(SynthError::DuplicateLogicalId(_))));
    }

    #[test]
    fn validation_errors_name_the_resource() {
        let mut t = Template::default();
        let err = t.add("Empty", &Thing { name: "".into() }).unwrap_err();
        assert_eq!(err.to_string(), "Validation failed on resource 'Empty'\nMust provide a name");
    }

    #[test]
    fn depends_on_must_exist() {
        let mut t = Template::default();
        let thing = Thing { name: "abc".into() };
        assert!(t.add_with_deps("Second", &thing, &["First"]).is_err());
        t.add("First", &thing).unwrap();
        t.add_with_deps("Second", &thing, &["First"]).unwrap();
        assert_eq!(t.resource("Second").unwrap().depends_on, vec!["First".to_string()]);
    }

    #[test]
    fn outputs_carry_exports() {
        let mut t = Template::default();
        t.add_output("CertArn", Some("the cert"), &get_ref("Cert"), Some("app-CertificateStack-CertificateArn")).unwrap();
        assert_eq!(t.export_names(), vec!["app-CertificateStack-CertificateArn"]);
        let v = serde_json::to_value(&t).unwrap();
        assert_eq!(v["Outputs"]["CertArn"]["Export"]["Name"], "app-CertificateStack-CertificateArn");
    }

    #[test]
    fn stack_names() {
        assert!(validate_stack_name("app-CertificateStack").is_ok());
        assert!(validate_stack_name("1-stack").is_err());
        assert!(validate_stack_name("my_stack").is_err());
        assert!(validate_stack_name("").is_err());
        assert!(validate_stack_name(&"a".repeat(129)).is_err());
    }

    #[test]
    fn logical_ids_drop_punctuation() {
        assert_eq!(logical_id(&["VPCEndpoint", "my-app"]), "VPCEndpointmyapp");
    }
}
