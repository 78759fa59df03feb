//! OS shutdown signals for the interactive session

use std::fmt;

use tokio::sync::mpsc;

/// Why the session is being torn down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// Ctrl-C
    Interrupt,
    /// SIGTERM
    Terminate,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupt => f.write_str("SIGINT"),
            Self::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Channel of shutdown requests fed by signal listener tasks
pub struct ShutdownSignal {
    receiver: mpsc::Receiver<ShutdownReason>,
}

impl ShutdownSignal {
    /// Start listening for SIGINT (and SIGTERM on unix)
    pub fn setup() -> Result<Self, std::io::Error> {
        let (tx, rx) = mpsc::channel(4);

        let tx_int = tx.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if tx_int.send(ShutdownReason::Interrupt).await.is_err() {
                    break;
                }
            }
        });

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let mut sigterm = signal(SignalKind::terminate())?;
            tokio::spawn(async move {
                while sigterm.recv().await.is_some() {
                    if tx.send(ShutdownReason::Terminate).await.is_err() {
                        break;
                    }
                }
            });
        }
        #[cfg(not(unix))]
        drop(tx);

        Ok(Self { receiver: rx })
    }

    /// Build from an existing channel, for driving the loop in tests
    pub fn from_receiver(receiver: mpsc::Receiver<ShutdownReason>) -> Self {
        Self { receiver }
    }

    /// Wait for the next shutdown request. Cancel-safe.
    pub async fn recv(&mut self) -> Option<ShutdownReason> {
        self.receiver.recv().await
    }
}
