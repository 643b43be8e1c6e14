//! Background route loading.
//!
//! Each navigation ticket is loaded on its own short-lived thread with its
//! own database connection, so loads overlap and may finish in any order.
//! Results come back over a channel tagged with the ticket's sequence
//! number; the session decides which of them still matter.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use tracing::{debug, error};

use crate::db::Database;
use crate::error::AppError;
use crate::navigation::NavigationTicket;
use crate::session::{self, RouteData};

#[derive(Debug)]
pub struct LoadResult {
    pub seq: u64,
    pub outcome: Result<RouteData, AppError>,
}

pub struct Loader {
    db_path: PathBuf,
    latency: Duration,
    tx: Sender<LoadResult>,
    rx: Receiver<LoadResult>,
}

impl Loader {
    /// `latency` is added before every load (simulated network delay).
    pub fn new(db_path: PathBuf, latency: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            db_path,
            latency,
            tx,
            rx,
        }
    }

    pub fn dispatch(&self, ticket: NavigationTicket) {
        let tx = self.tx.clone();
        let db_path = self.db_path.clone();
        let latency = self.latency;
        let seq = ticket.seq;

        let spawned = thread::Builder::new()
            .name(format!("loader-{}", seq))
            .spawn(move || {
                if !latency.is_zero() {
                    thread::sleep(latency);
                }
                let outcome = match Database::open_at(&db_path) {
                    Ok(db) => session::load_route(&db, &ticket.location),
                    Err(err) => Err(AppError::fetch_failed(
                        ticket.location.href(),
                        format!("{:#}", err),
                    )),
                };
                debug!(seq, ok = outcome.is_ok(), "load finished");
                // the receiver is gone once the app has quit
                let _ = tx.send(LoadResult { seq, outcome });
            });

        if let Err(err) = spawned {
            error!(seq, error = %err, "failed to spawn loader thread");
            let _ = self.tx.send(LoadResult {
                seq,
                outcome: Err(AppError::fetch_failed("loader", err)),
            });
        }
    }

    /// Results that have arrived so far, in arrival order.
    pub fn drain(&self) -> Vec<LoadResult> {
        self.rx.try_iter().collect()
    }
}
