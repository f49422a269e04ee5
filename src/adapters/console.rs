//! Console request transport for host runs.
//!
//! A reader thread turns stdin lines into request paths and hands them to
//! the scheduler over an `mpsc` channel.  Responses are printed to stdout
//! from the scheduler thread.  The hub core itself stays single-threaded;
//! this thread only moves strings.

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use log::{info, warn};

use crate::app::commands::Response;
use crate::app::ports::RequestPort;

pub struct ConsoleTransport {
    rx: Receiver<String>,
    closed: bool,
}

impl ConsoleTransport {
    /// Spawn the stdin reader thread.
    pub fn spawn() -> io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("console-rx".into())
            .spawn(move || {
                for line in io::stdin().lock().lines() {
                    let Ok(line) = line else { break };
                    let line = line.trim().to_owned();
                    if line.is_empty() {
                        continue;
                    }
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            })?;
        info!("Console: type a request path (e.g. /status)");
        Ok(Self { rx, closed: false })
    }

    /// True once stdin has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl RequestPort for ConsoleTransport {
    fn poll(&mut self) -> Option<String> {
        match self.rx.try_recv() {
            Ok(line) => Some(line),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.closed = true;
                None
            }
        }
    }

    fn respond(&mut self, response: Response) {
        let mut out = io::stdout().lock();
        let res = match response {
            Response::Json(value) => writeln!(out, "{}", value),
            Response::Bytes { body, .. } => out.write_all(&body),
            Response::NotFound(msg) => writeln!(out, "404 {}", msg),
        };
        if let Err(e) = res.and_then(|()| out.flush()) {
            warn!("Console: write failed ({})", e);
        }
    }
}
