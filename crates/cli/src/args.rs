//! Command line arguments.

use std::path::PathBuf;

use abstractions::{HttpMethod, RequestInformation};
use clap::Parser;

/// Issue one request through the HTTP request adapter and write the response
/// body to stdout.
#[derive(Debug, Parser)]
#[command(name = "fetch", version)]
pub struct Args {
    /// URL template, e.g. `{+baseurl}/users/{id}{?%24top}`.
    pub template: String,

    /// HTTP method.
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: HttpMethod,

    /// Substituted for `{+baseurl}` in the template.
    #[arg(long, env = "FETCH_BASE_URL")]
    pub base_url: String,

    /// Path parameter as `name=value`. Repeatable.
    #[arg(short = 'p', long = "path", value_parser = parse_pair)]
    pub path_parameters: Vec<(String, String)>,

    /// Query parameter as `name=value`. Repeatable.
    #[arg(short = 'q', long = "query", value_parser = parse_pair)]
    pub query_parameters: Vec<(String, String)>,

    /// Request header as `Name: value`. Repeatable.
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Request body. `@path` reads the body from a file.
    #[arg(short = 'd', long)]
    pub data: Option<String>,

    /// Content type of the request body.
    #[arg(long, default_value = "application/json")]
    pub content_type: String,

    /// Bearer token sent to allowed hosts.
    #[arg(long, env = "FETCH_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Host the token may be sent to. Repeatable; none means any host.
    #[arg(long = "allowed-host")]
    pub allowed_hosts: Vec<String>,

    /// JSON file with client options.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Record the full request URL on spans.
    #[arg(long)]
    pub include_euii: bool,

    /// OTLP gRPC endpoint to export spans to.
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

impl Args {
    /// Builds the request description. The body is passed in already read.
    pub fn request_information(&self, body: Option<Vec<u8>>) -> RequestInformation {
        let mut request = RequestInformation::new(self.method, self.template.as_str());
        for (name, value) in &self.path_parameters {
            request.add_path_parameter(name.as_str(), value.as_str());
        }
        for (name, value) in &self.query_parameters {
            request.add_query_parameter(name.as_str(), value.as_str());
        }
        for (name, value) in &self.headers {
            request.add_header(name, value.as_str());
        }
        if let Some(body) = body {
            request.set_content(body, &self.content_type);
        }
        request
    }
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    raw.split_once(':')
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected 'Name: value', got '{raw}'"))
}
