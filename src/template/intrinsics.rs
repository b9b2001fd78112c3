use serde::{Serialize, Serializer};
use serde_json::{json, Value};

/// a string property in a template. Either a literal, or an intrinsic
/// function that cloudformation resolves at deploy time.
#[derive(Debug, Clone, PartialEq)]
pub enum StrVal {
    Val(String),
    Intrinsic(Value),
}

impl Default for StrVal {
    fn default() -> Self {
        StrVal::Val(String::new())
    }
}

impl Serialize for StrVal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StrVal::Val(s) => serializer.serialize_str(s),
            StrVal::Intrinsic(v) => v.serialize(serializer),
        }
    }
}

impl From<&str> for StrVal {
    fn from(value: &str) -> Self {
        StrVal::Val(value.to_string())
    }
}

impl From<String> for StrVal {
    fn from(value: String) -> Self {
        StrVal::Val(value)
    }
}

impl From<&String> for StrVal {
    fn from(value: &String) -> Self {
        StrVal::Val(value.clone())
    }
}

impl StrVal {
    pub fn to_json(&self) -> Value {
        match self {
            StrVal::Val(s) => Value::String(s.clone()),
            StrVal::Intrinsic(v) => v.clone(),
        }
    }

    pub fn as_literal(&self) -> Option<&str> {
        match self {
            StrVal::Val(s) => Some(s),
            StrVal::Intrinsic(_) => None,
        }
    }
}

pub fn get_ref(logical_id: &str) -> StrVal {
    StrVal::Intrinsic(json!({ "Ref": logical_id }))
}

pub fn get_att(logical_id: &str, attribute: &str) -> StrVal {
    StrVal::Intrinsic(json!({ "Fn::GetAtt": [logical_id, attribute] }))
}

pub fn import_value(export_name: &str) -> StrVal {
    StrVal::Intrinsic(json!({ "Fn::ImportValue": export_name }))
}

pub fn sub(template: &str) -> StrVal {
    StrVal::Intrinsic(json!({ "Fn::Sub": template }))
}

pub fn join(delimiter: &str, parts: &[StrVal]) -> StrVal {
    let parts: Vec<Value> = parts.iter().map(StrVal::to_json).collect();
    StrVal::Intrinsic(json!({ "Fn::Join": [delimiter, parts] }))
}

/// selects index `i` from a list valued expression, eg: a `Fn::GetAtt` of a list attribute.
pub fn select(i: usize, list: Value) -> StrVal {
    StrVal::Intrinsic(json!({ "Fn::Select": [i, list] }))
}

pub fn split(delimiter: &str, source: &StrVal) -> Value {
    json!({ "Fn::Split": [delimiter, source.to_json()] })
}

/// the availability zones of the stack's region
pub fn get_azs() -> Value {
    json!({ "Fn::GetAZs": "" })
}

pub fn region() -> StrVal {
    get_ref("AWS::Region")
}

pub fn partition() -> StrVal {
    get_ref("AWS::Partition")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_serialize_as_plain_strings() {
        let v = serde_json::to_value(StrVal::from("hello")).unwrap();
        assert_eq!(v, json!("hello"));
    }

    #[test]
    fn intrinsics_serialize_as_functions() {
        assert_eq!(get_ref("MyVpc").to_json(), json!({ "Ref": "MyVpc" }));
        assert_eq!(get_att("MyNlb", "DNSName").to_json(), json!({ "Fn::GetAtt": ["MyNlb", "DNSName"] }));
        let joined = join(".", &["com.amazonaws".into(), region(), "execute-api".into()]);
        assert_eq!(joined.to_json(), json!({ "Fn::Join": [".", ["com.amazonaws", { "Ref": "AWS::Region" }, "execute-api"]] }));
        assert_eq!(select(1, get_azs()).to_json(), json!({ "Fn::Select": [1, { "Fn::GetAZs": "" }] }));
        assert_eq!(sub("${AWS::Region}.${Svc}").to_json(), json!({ "Fn::Sub": "${AWS::Region}.${Svc}" }));
    }
}
