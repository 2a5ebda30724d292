// ────────────────────────────────
// src/server/builder.rs
// Supervises the whole listener set: ports × stacks, plus shutdown.
// ────────────────────────────────
use crate::config::Config;
use crate::server::listener::{self, ListenTarget};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

/// Owns every listener task for the configured ports and stacks.
///
/// Spawning is fire-and-forget: the supervisor never waits for a bind to
/// complete before starting the next, and a failed bind surfaces only as a
/// log line from the listener task itself. `run` then parks on the shutdown
/// channel until the auto-close timer or a [`SupervisorHandle`] fires it.
pub struct Supervisor {
    config: Config,
    ports: Vec<u16>,
    auto_close: Option<Duration>,
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
    tasks: Vec<JoinHandle<()>>,
}

/// Cloneable remote control for a running supervisor. `main` wires the
/// interrupt signals to it; test harnesses use it to cancel deterministically.
#[derive(Clone)]
pub struct SupervisorHandle {
    shutdown_tx: Arc<watch::Sender<bool>>,
}

impl SupervisorHandle {
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

impl Supervisor {
    pub fn new(config: Config, ports: Vec<u16>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let auto_close = config.auto_close();

        Self {
            config,
            ports,
            auto_close,
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
            tasks: Vec::new(),
        }
    }

    /// Override the configured auto-close timer. Test harnesses want
    /// sub-minute durations; `None` disables the timer entirely.
    pub fn with_auto_close(mut self, after: Option<Duration>) -> Self {
        self.auto_close = after;
        self
    }

    pub fn handle(&self) -> SupervisorHandle {
        SupervisorHandle {
            shutdown_tx: self.shutdown_tx.clone(),
        }
    }

    /// Spawn one TCP/UDP listener pair per (port, stack), fully
    /// concurrently. An explicit bind address pins one stack, so targets on
    /// the other stack are skipped rather than doomed to fail.
    pub fn start(&mut self) {
        for &port in &self.ports {
            for &stack in self.config.family.stacks() {
                if let Some(addr) = self.config.bind_address {
                    if !stack.matches(addr) {
                        continue;
                    }
                }

                let target = ListenTarget {
                    port,
                    stack,
                    bind_address: self.config.bind_address,
                };
                self.tasks
                    .extend(listener::spawn_pair(target, self.shutdown_rx.clone()));
            }
        }

        info!(
            "Started {} listener task(s) across {} port(s)",
            self.tasks.len(),
            self.ports.len()
        );
    }

    /// Park until shutdown, then drain every listener task.
    ///
    /// Shutdown comes from the auto-close timer, a handle, or whatever the
    /// caller wired to one (typically the interrupt signals). Individual
    /// connections are never cancelled here; they end with their peer.
    pub async fn run(mut self) -> Result<()> {
        if self.tasks.is_empty() {
            self.start();
        }

        if let Some(after) = self.auto_close {
            info!("Auto-close enabled: exiting after {:?}", after);
            let shutdown_tx = self.shutdown_tx.clone();
            tokio::spawn(async move {
                tokio::time::sleep(after).await;
                info!("Auto-close timer reached, exiting");
                let _ = shutdown_tx.send(true);
            });
        }

        let _ = self.shutdown_rx.wait_for(|stop| *stop).await;

        futures::future::join_all(self.tasks.drain(..)).await;
        info!("All listeners stopped");
        Ok(())
    }
}
