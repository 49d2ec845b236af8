// SPDX-FileCopyrightText: 2026 deskrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signal handling for graceful shutdown.

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Installs handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is received.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = interrupted(tokio::signal::ctrl_c());

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => {}
                        _ = sigterm.recv() => {
                            info!("received SIGTERM, initiating shutdown");
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to install SIGTERM handler, waiting for Ctrl+C only");
                    ctrl_c.await;
                }
            }
        }

        #[cfg(not(unix))]
        ctrl_c.await;

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Resolves once `listener` reports Ctrl+C. A listener that fails to install
/// is logged and never resolves.
async fn interrupted<F>(listener: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    match listener.await {
        Ok(()) => info!("received SIGINT (Ctrl+C), initiating shutdown"),
        Err(e) => {
            warn!(error = %e, "failed to listen for Ctrl+C, it will not stop the server");
            std::future::pending::<()>().await;
        }
    }
}
