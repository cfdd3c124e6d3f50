//! Installer Template
//!
//! Renders the installer script shipped to each device, substituting the
//! destination policy id. Only simple variable substitution is used.

use anyhow::{Context, Result};
use minijinja::{context, Environment};

/// Render `template` with the policy id interpolated, returning the bytes
/// uploaded to each device.
pub fn render_installer(template: &str, policy_id: &str) -> Result<Vec<u8>> {
    let env = Environment::new();
    let rendered = env
        .render_str(template, context! { policy_id })
        .context("Failed to render installer template")?;

    Ok(rendered.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_id_is_substituted() {
        let rendered =
            render_installer("msiexec /i agent.msi POLICYID={{ policy_id }}", "42").unwrap();
        assert_eq!(
            String::from_utf8(rendered).unwrap(),
            "msiexec /i agent.msi POLICYID=42"
        );
    }

    #[test]
    fn test_template_without_variables_passes_through() {
        let rendered = render_installer("Write-Host 'hello'", "42").unwrap();
        assert_eq!(String::from_utf8(rendered).unwrap(), "Write-Host 'hello'");
    }
}
