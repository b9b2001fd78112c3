use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::driver::CloudAssembly;
use crate::error::{Result, SynthError};
use crate::stacks::{Stack, StackKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub stack_name: String,
    pub kind: StackKind,
    pub account: String,
    pub region: String,
    pub template_file: String,
    pub dependencies: Vec<String>,
}

/// lists the stacks of an assembly in deployment order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub stacks: Vec<ManifestEntry>,
}

pub fn template_file_name(stack: &Stack) -> String {
    format!("{}.template.json", stack.name)
}

pub fn manifest(assembly: &CloudAssembly) -> Manifest {
    let stacks = assembly.stacks.iter().map(|s| ManifestEntry {
        stack_name: s.name.clone(),
        kind: s.kind,
        account: s.env.account.clone(),
        region: s.env.region.clone(),
        template_file: template_file_name(s),
        dependencies: s.dependencies.clone(),
    }).collect();
    Manifest { stacks }
}

/// a script deploying every stack in order with the aws cli
pub fn deploy_script(assembly: &CloudAssembly) -> String {
    let mut out = String::new();
    out.push_str("#!/usr/bin/env bash\n");
    out.push_str("set -euo pipefail\n");
    out.push_str("cd \"$(dirname \"$0\")\"\n\n");
    out.push_str("# deploy:\n");
    for stack in assembly.stacks.iter() {
        let region = &stack.env.region;
        let name = &stack.name;
        let file = template_file_name(stack);
        out.push_str(&format!(
            "AWS_REGION={region} aws --region {region} cloudformation deploy --stack-name {name} --template-file ./{file} --capabilities CAPABILITY_NAMED_IAM\n"
        ));
    }
    out
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .map_err(|e| SynthError::io(format!("Failed to create {}", path.display()), e))?;
    file.write_all(contents.as_bytes())
        .and_then(|_| file.flush())
        .map_err(|e| SynthError::io(format!("Failed to write {}", path.display()), e))
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .map_err(|e| SynthError::io(format!("Failed to make {} executable", path.display()), e))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

/// writes one template per stack, the manifest, and deploy.sh into `out_dir`.
/// Returns the paths written.
pub fn write_assembly(assembly: &CloudAssembly, out_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)
        .map_err(|e| SynthError::io(format!("Failed to create output directory {}", out_dir.display()), e))?;
    let mut written = vec![];
    for stack in assembly.stacks.iter() {
        let path = out_dir.join(template_file_name(stack));
        write_file(&path, &stack.template.to_json_pretty()?)?;
        tracing::debug!(path = %path.display(), "wrote template");
        written.push(path);
    }

    let manifest_path = out_dir.join("manifest.json");
    let manifest = serde_json::to_string_pretty(&manifest(assembly))
        .map_err(|e| SynthError::serialize("manifest", e))?;
    write_file(&manifest_path, &manifest)?;
    written.push(manifest_path);

    let script_path = out_dir.join("deploy.sh");
    write_file(&script_path, &deploy_script(assembly))?;
    make_executable(&script_path)?;
    written.push(script_path);
    tracing::info!(out = %out_dir.display(), files = written.len(), "wrote cloud assembly");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use crate::template::Template;

    fn assembly() -> CloudAssembly {
        let env = Environment { account: "123456789012".into(), region: "us-east-1".into() };
        let cert = Stack::new("app-CertificateStack", StackKind::Certificate, &env, Template::new("cert"), vec![]).unwrap();
        let client = Stack::new("ClientStack", StackKind::Client, &env, Template::new("client"), vec!["app-CertificateStack".into()]).unwrap();
        CloudAssembly { stacks: vec![cert, client] }
    }

    #[test]
    fn script_deploys_in_order() {
        let script = deploy_script(&assembly());
        let cert = script.find("--stack-name app-CertificateStack ").unwrap();
        let client = script.find("--stack-name ClientStack ").unwrap();
        assert!(cert < client);
        assert!(script.contains("--template-file ./ClientStack.template.json --capabilities CAPABILITY_NAMED_IAM"));
    }

    #[test]
    fn manifest_records_dependencies() {
        let m = manifest(&assembly());
        assert_eq!(m.stacks.len(), 2);
        assert_eq!(m.stacks[1].dependencies, vec!["app-CertificateStack".to_string()]);
        assert_eq!(m.stacks[1].template_file, "ClientStack.template.json");
    }
}
