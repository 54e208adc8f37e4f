//! Azure endpoint construction. Request bodies speak the OpenAI wire
//! format and come from `openai::payload`.

/// Endpoint for a deployment-scoped operation, e.g. `chat/completions`.
pub(crate) fn deployment_url(
    resource: &str,
    deployment: &str,
    operation: &str,
    api_version: &str,
) -> String {
    format!(
        "https://{resource}.openai.azure.com/openai/deployments/{deployment}/{operation}?api-version={api_version}"
    )
}
