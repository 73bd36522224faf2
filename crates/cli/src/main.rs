//! `fetch` entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse configuration**: command line flags, plus optional
//!    [`ClientOptions`] from a JSON file. Flags win.
//! 2. **Wire observability**: `tracing-subscriber` with a JSON layer and, when
//!    an endpoint is given, an OpenTelemetry OTLP exporter.
//! 3. **Construct infrastructure**: the `reqwest` client, transport and
//!    authentication provider, injected into an [`HttpRequestAdapter`].
//! 4. **Send**: one request through the raw-bytes primitive variant, with the
//!    body written to stdout.

mod args;
mod telemetry;

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use abstractions::{
    AdapterError, AnonymousAuthenticationProvider, AuthenticationProvider,
    BaseBearerTokenAuthenticationProvider, ErrorMap, ParseNodeFactoryRegistry, PrimitiveKind,
    StaticAccessTokenProvider,
};
use anyhow::{bail, Context};
use clap::Parser;
use http_adapter::{ClientFactory, ClientOptions, HttpRequestAdapter, ReqwestTransport};

use crate::args::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let options = load_options(&args)?;
    let telemetry = telemetry::init(args.otlp_endpoint.as_deref())?;

    let result = run(args, options).await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "request failed");
    }
    telemetry.shutdown();
    result
}

fn load_options(args: &Args) -> anyhow::Result<ClientOptions> {
    let mut options = match &args.config {
        Some(path) => read_options(path)?,
        None => ClientOptions::default(),
    };
    if args.include_euii {
        options.observability.include_euii_attributes = true;
    }
    Ok(options)
}

fn read_options(path: &Path) -> anyhow::Result<ClientOptions> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid config file {}", path.display()))
}

fn read_body(data: Option<&str>) -> anyhow::Result<Option<Vec<u8>>> {
    match data {
        Some(data) => match data.strip_prefix('@') {
            Some(path) => std::fs::read(path)
                .map(Some)
                .with_context(|| format!("failed to read request body from {path}")),
            None => Ok(Some(data.as_bytes().to_vec())),
        },
        None => Ok(None),
    }
}

async fn run(args: Args, options: ClientOptions) -> anyhow::Result<()> {
    let client = ClientFactory::create_with_default_options(&options)
        .context("failed to create HTTP client")?;

    let authentication: Arc<dyn AuthenticationProvider> = match &args.token {
        Some(token) => Arc::new(BaseBearerTokenAuthenticationProvider::new(
            StaticAccessTokenProvider::new(token.as_str(), args.allowed_hosts.clone()),
        )),
        None => Arc::new(AnonymousAuthenticationProvider),
    };

    let mut adapter = HttpRequestAdapter::new(
        authentication,
        Arc::new(ParseNodeFactoryRegistry::new()),
        Arc::new(ReqwestTransport::new(client)),
    )
    .with_observability_options(options.observability.clone());
    adapter.set_base_url(args.base_url.as_str());

    let body = read_body(args.data.as_deref())?;
    let request = args.request_information(body);
    tracing::info!(method = %args.method, template = %args.template, "sending request");

    match adapter
        .send_primitive(request, PrimitiveKind::Bytes, &ErrorMap::new())
        .await
    {
        Ok(Some(value)) => {
            if let Some(bytes) = value.as_bytes() {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(bytes).context("failed to write response body")?;
                stdout.flush().context("failed to write response body")?;
            }
            Ok(())
        }
        Ok(None) => {
            tracing::info!("no content");
            Ok(())
        }
        Err(AdapterError::Api(api)) => {
            let status = api.response_status_code.unwrap_or_default();
            bail!("server returned status {status}: {api}")
        }
        Err(e) => Err(e).context("request failed"),
    }
}
