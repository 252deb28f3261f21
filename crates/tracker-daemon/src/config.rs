/// Runtime configuration for the tracking daemon.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Base URL of the results API.
    pub api_url: String,
    /// Bearer token for the API, if the deployment requires one.
    pub api_token: Option<String>,
}
