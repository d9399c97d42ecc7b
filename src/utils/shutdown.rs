use std::future::Future;

use anyhow::{anyhow, Result};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::RefreshError;

/// Keep the agent up until `shutdown` resolves.
///
/// The refresh loop ending (fail-stop policy) only stops token maintenance:
/// the server keeps shipping logs with whatever token is still cached. A
/// failing server ends the process. `cancel` is fired on the way out, and the
/// remaining tasks are awaited.
pub async fn run_until_shutdown<F>(
    mut refresher: JoinHandle<Result<(), RefreshError>>,
    mut http_server: JoinHandle<Result<()>>,
    shutdown: F,
    cancel: CancellationToken,
) -> Result<()>
where
    F: Future<Output = std::io::Result<()>>,
{
    tokio::pin!(shutdown);
    let mut refresher_done = false;
    let mut server_done = false;
    let mut requested = false;
    let mut refresh_failure: Option<RefreshError> = None;

    while !(refresher_done && server_done) {
        tokio::select! {
            signal = &mut shutdown => {
                if let Err(err) = signal {
                    warn!("waiting for shutdown signal failed: {}", err);
                }
                info!("shutdown requested");
                requested = true;
                break;
            }
            done = &mut refresher, if !refresher_done => {
                refresher_done = true;
                match done {
                    Ok(Ok(())) => info!("token maintenance finished"),
                    Ok(Err(err)) => {
                        error!("token maintenance stopped: {}; cached token is still served", err);
                        refresh_failure = Some(err);
                    }
                    Err(err) => error!("token maintenance task panicked: {}", err),
                }
            }
            served = &mut http_server, if !server_done => {
                server_done = true;
                let failure = match served {
                    Ok(Ok(())) => None,
                    Ok(Err(err)) => Some(err),
                    Err(err) => Some(anyhow!("http server task panicked: {}", err)),
                };
                if let Some(err) = failure {
                    cancel.cancel();
                    if !refresher_done {
                        let _ = refresher.await;
                    }
                    return Err(err);
                }
            }
        }
    }

    cancel.cancel();
    if !refresher_done {
        if let Ok(Err(err)) = refresher.await {
            warn!("token maintenance ended with: {}", err);
        }
    }
    if !server_done {
        http_server.await.map_err(|e| anyhow!("http server task panicked: {}", e))??;
    }

    match refresh_failure {
        // nothing left running, report why
        Some(err) if !requested => Err(err.into()),
        _ => Ok(()),
    }
}
