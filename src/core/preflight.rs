//! Preflight checks for external tools

use std::collections::BTreeSet;

use super::settings::RunConfig;
use crate::error::WorkspaceError;

/// Programs that run the rest of their argument list as a command
const WRAPPERS: &[&str] = &["fakeroot"];

/// Programs the run will invoke, given its configuration
///
/// For a wrapper such as `fakeroot`, the wrapped program is required too.
pub fn required_tools(config: &RunConfig) -> Vec<String> {
    let mut tools = BTreeSet::new();
    let mut add = |argv: &[String]| {
        let Some(program) = argv.first() else {
            return;
        };
        tools.insert(program.clone());
        if WRAPPERS.contains(&program.as_str()) {
            if let Some(wrapped) = argv[1..].iter().find(|a| !a.starts_with('-')) {
                tools.insert(wrapped.clone());
            }
        }
    };

    add(&config.tools.workspace_build);
    add(&config.tools.generator);
    add(&config.tools.packaging);
    if config.resolve_deps {
        add(&config.tools.resolver);
    }
    if config.aggregate.is_some() {
        add(std::slice::from_ref(&config.tools.archive));
    }
    if config.publish.is_some() {
        add(std::slice::from_ref(&config.tools.copy));
        add(std::slice::from_ref(&config.tools.remote_shell));
    }

    tools.into_iter().collect()
}

/// Verify every tool resolves on `PATH`
pub fn check_tools<S: AsRef<str>>(tools: &[S]) -> Result<(), WorkspaceError> {
    for tool in tools {
        let tool = tool.as_ref();
        match which::which(tool) {
            Ok(path) => tracing::debug!("Found {tool} at {}", path.display()),
            Err(_) => {
                return Err(WorkspaceError::ToolNotFound {
                    tool: tool.to_string(),
                })
            }
        }
    }
    Ok(())
}
