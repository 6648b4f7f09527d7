//! URL validation and connection bootstrap.
//!
//! Malformed input is a caller-visible, synchronous failure: the URL is
//! validated before the connector is consulted, so no actor (and no
//! terminate hook) ever exists for a bad URL.

use url::Url;

use crate::actor::ConnectionHandle;
use crate::config::Config;
use crate::error::StartError;
use crate::handler::Handler;
use crate::transport::{Connector, event_channel};

/// Parse a WebSocket URL, accepting only the `ws` and `wss` schemes.
pub(crate) fn validate_url(url: &str) -> Result<Url, StartError> {
    let parsed = Url::parse(url).map_err(|_| StartError::Url {
        url: url.to_owned(),
    })?;
    match parsed.scheme() {
        "ws" | "wss" => Ok(parsed),
        _ => Err(StartError::Url {
            url: url.to_owned(),
        }),
    }
}

/// Validate `url`, open a connection through `connector`, and spawn a
/// connection actor in phase `Open` bound to `handler` and `state`.
///
/// # Errors
///
/// [`StartError::Url`] for a malformed URL or non-`ws`/`wss` scheme
/// (decided before the connector runs), [`StartError::Connect`] when the
/// connector fails. No actor is spawned on either failure.
pub async fn start<C, H>(
    connector: &C,
    url: &str,
    handler: H,
    state: H::State,
) -> Result<ConnectionHandle<H>, StartError>
where
    C: Connector,
    H: Handler,
{
    start_with_config(connector, url, handler, state, Config::default()).await
}

/// [`start`] with an explicit [`Config`].
pub async fn start_with_config<C, H>(
    connector: &C,
    url: &str,
    handler: H,
    state: H::State,
    config: Config,
) -> Result<ConnectionHandle<H>, StartError>
where
    C: Connector,
    H: Handler,
{
    let parsed = validate_url(url)?;
    let (sink, events) = event_channel();
    let transport = connector.connect(&parsed, sink).await?;
    tracing::debug!(url = %parsed, "connected, spawning connection actor");
    Ok(ConnectionHandle::spawn(
        transport, events, handler, state, config,
    ))
}
