use log::trace;

use super::{FetchError, SourceProvider};
use crate::directive::SourceKind;

/// Fetches directives' sources over HTTP(S).
///
/// `ureq` is blocking, so each request runs on tokio's blocking pool while the
/// rewriter keeps awaiting the other blocks.
#[derive(Debug, Clone)]
pub struct RemoteSource {
    agent: ureq::Agent,
}

impl Default for RemoteSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteSource {
    pub fn new() -> Self {
        let agent = ureq::AgentBuilder::new()
            .user_agent(concat!("markdown-remote-code/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { agent }
    }
}

impl SourceProvider for RemoteSource {
    async fn fetch(&self, _kind: SourceKind, locator: &str) -> Result<String, FetchError> {
        let agent = self.agent.clone();
        let url = locator.to_string();
        trace!("GET {url}");

        tokio::task::spawn_blocking(move || get_text(&agent, &url))
            .await
            .map_err(|err| FetchError::Transport {
                locator: locator.to_string(),
                message: err.to_string(),
            })?
    }
}

fn get_text(agent: &ureq::Agent, url: &str) -> Result<String, FetchError> {
    match agent.get(url).call() {
        Ok(response) => response.into_string().map_err(|err| FetchError::Transport {
            locator: url.to_string(),
            message: err.to_string(),
        }),
        Err(ureq::Error::Status(status, _)) => Err(FetchError::Status {
            locator: url.to_string(),
            status,
        }),
        Err(ureq::Error::Transport(transport)) => Err(FetchError::Transport {
            locator: url.to_string(),
            message: transport.to_string(),
        }),
    }
}
