use serde::Serialize;

use crate::template::{CfnResource, StrVal};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Code {
    pub zip_file: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Function {
    pub handler: String,
    pub runtime: String,
    pub role: StrVal,
    pub code: Code,
    pub memory_size: u32,
    pub timeout: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Function {
    /// a function whose source is embedded in the template.
    /// Uses the same defaults as `aws lambda create-function` for memory,
    /// but a longer timeout since these are mostly custom resource handlers
    /// that call other AWS APIs.
    pub fn inline_python(source: &str, role: StrVal) -> Self {
        Self {
            handler: "index.handler".into(),
            runtime: "python3.12".into(),
            role,
            code: Code { zip_file: source.to_string() },
            memory_size: 128,
            timeout: 30,
            description: None,
        }
    }
}

impl CfnResource for Function {
    const TYPE: &'static str = "AWS::Lambda::Function";

    fn validate(&self) -> Result<(), String> {
        // inline code is limited to 4096 characters
        if self.code.zip_file.len() > 4096 {
            return Err(format!("Inline function code is {} characters, maximum is 4096", self.code.zip_file.len()));
        }
        if self.memory_size < 128 || self.memory_size > 10240 {
            return Err(format!("Invalid memory size {}. Must be between 128 and 10240", self.memory_size));
        }
        if self.timeout == 0 || self.timeout > 900 {
            return Err(format!("Invalid timeout {}. Must be between 1 and 900 seconds", self.timeout));
        }
        Ok(())
    }
}
