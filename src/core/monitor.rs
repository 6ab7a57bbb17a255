//! Background usage monitor
//!
//! Periodically projects the usage dashboard and hands each snapshot to a
//! callback. Each poll is independent; a failed cycle is logged and the loop
//! keeps going.

use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, select, tick, Sender};
use tracing::{debug, warn};

use crate::core::usage::{UsageEngine, UsageInfo};

/// Handle to a running monitor thread
pub struct MonitorHandle {
    stop_tx: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    /// Stop the loop and wait for the thread to finish
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.stop_tx.send(());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("usage monitor thread panicked");
            }
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

pub struct UsageMonitor;

impl UsageMonitor {
    /// Poll `engine` every `interval`, starting immediately
    pub fn spawn<F>(engine: UsageEngine, interval: Duration, mut callback: F) -> MonitorHandle
    where
        F: FnMut(Vec<UsageInfo>) + Send + 'static,
    {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let thread = std::thread::spawn(move || {
            let ticker = tick(interval);
            let mut poll = |cycle: u64| match engine.aggregate_usage_info() {
                Ok(snapshot) => {
                    debug!(cycle, parts = snapshot.len(), "usage snapshot");
                    callback(snapshot);
                }
                Err(err) => warn!(cycle, error = %err, "usage monitor cycle failed"),
            };

            let mut cycle = 0;
            poll(cycle);
            loop {
                select! {
                    recv(stop_rx) -> _ => break,
                    recv(ticker) -> _ => {
                        cycle += 1;
                        poll(cycle);
                    }
                }
            }
            debug!(cycles = cycle + 1, "usage monitor stopped");
        });

        MonitorHandle {
            stop_tx,
            thread: Some(thread),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::inventory::Inventory;
    use crate::core::machines::Machines;
    use crate::core::repo::Repository;
    use crate::core::store::MemoryStore;
    use crate::entities::inventory::InventoryItem;
    use crate::entities::machine::Machine;
    use std::sync::Arc;

    #[test]
    fn test_monitor_delivers_snapshots_until_stopped() {
        let repo = Repository::new(Arc::new(MemoryStore::new()));
        let item = Inventory::new(repo.clone())
            .create(InventoryItem::wear_part("Lamp", "hours", 10.0, "test"))
            .unwrap();
        let machines = Machines::new(repo.clone());
        let machine = machines.create(Machine::new("Spectrometer", "UV-1", "test")).unwrap();
        machines.install_part(&machine.id, &item.id, false, "test").unwrap();

        let (tx, rx) = crossbeam_channel::unbounded();
        let handle = UsageMonitor::spawn(
            UsageEngine::new(repo),
            Duration::from_millis(10),
            move |snapshot| {
                let _ = tx.send(snapshot.len());
            },
        );

        for _ in 0..3 {
            let parts = rx.recv_timeout(Duration::from_secs(2)).unwrap();
            assert_eq!(parts, 1);
        }
        handle.stop();

        while rx.try_recv().is_ok() {}
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }
}
