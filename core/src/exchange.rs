/*
 * exchange.rs
 * Copyright (C) 2026 Edgeflush contributors
 *
 * This file is part of Edgeflush, a client for edge cache invalidation.
 *
 * Edgeflush is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Edgeflush is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Edgeflush.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Lifecycle of one request/response exchange.
//!
//! [`Exchange`] is a synchronous state machine fed by whatever transport drives it;
//! [`drive`] is the built-in driver over the real network. The first terminal event
//! wins: completion consumes the callback and the body buffer, and every event after
//! that is discarded. Exactly one outcome reaches the caller per exchange.

use std::io;
use std::mem;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::{self, Instant};

use crate::error::PurgeError;
use crate::logger::Logger;
use crate::request::RequestOptions;
use crate::wire::{self, ResponseEvents, ResponseParser};

/// Completion callback. Invoked exactly once, after the exchange has released its
/// connection and buffers.
pub type OnComplete = Box<dyn FnOnce(Outcome) + Send + 'static>;

/// Terminal result of one exchange.
#[derive(Debug)]
pub struct Outcome {
    /// The failure that ended the exchange, when one did. Aborted and prematurely
    /// closed connections carry no error; their 400 status is the whole signal.
    pub error: Option<PurgeError>,
    /// Origin status for a normal end, otherwise 400 (failed), 408 (timed out),
    /// or 422 (body failure).
    pub status: u16,
    /// The target as originally given.
    pub uri: String,
    /// Accumulated body. None when the failure preceded the response or the
    /// exchange timed out; otherwise present, possibly empty.
    pub body: Option<String>,
}

impl Outcome {
    /// True for an error-free exchange with a 2xx status.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Request on its way out, no response seen yet.
    Sending,
    /// Header section received, body accumulating.
    ReceivingBody { status: u16 },
    /// Terminal. Absorbs every later event.
    Done,
}

/// State machine for one exchange.
///
/// Response events arrive through the [`ResponseEvents`] impl, transport-level
/// events through the `on_*` intake methods. Each intake checks the phase first,
/// so a second terminal event can never produce a second outcome.
pub struct Exchange {
    uri: String,
    phase: Phase,
    body: BytesMut,
    on_complete: Option<OnComplete>,
    log: Arc<dyn Logger>,
}

impl Exchange {
    pub fn new(uri: String, log: Arc<dyn Logger>, on_complete: OnComplete) -> Self {
        Self {
            uri,
            phase: Phase::Sending,
            body: BytesMut::new(),
            on_complete: Some(on_complete),
            log,
        }
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Transport failure. Before the response this is a transport error; after it,
    /// a body error carrying whatever had accumulated.
    pub fn on_error(&mut self, error: io::Error) {
        match self.phase {
            Phase::Sending => self.complete(Some(PurgeError::Transport(error)), 400, None),
            Phase::ReceivingBody { .. } => {
                let body = self.take_body();
                self.complete(Some(PurgeError::Body(error)), 422, Some(body));
            }
            Phase::Done => self.discard("error"),
        }
    }

    /// The deadline expired. A timed-out body is not reported, whatever had arrived.
    pub fn on_timeout(&mut self) {
        match self.phase {
            Phase::Sending | Phase::ReceivingBody { .. } => {
                self.complete(Some(PurgeError::Timeout), 408, None);
            }
            Phase::Done => self.discard("timeout"),
        }
    }

    /// The exchange was aborted. Not an error; the 400 status carries the signal.
    pub fn on_aborted(&mut self) {
        match self.phase {
            Phase::Sending | Phase::ReceivingBody { .. } => {
                let body = self.take_body();
                self.complete(None, 400, Some(body));
            }
            Phase::Done => self.discard("aborted"),
        }
    }

    /// The connection closed before the response ended. Mid-body this mirrors an
    /// abort; before any response it surfaces as a transport failure.
    pub fn on_close(&mut self) {
        match self.phase {
            Phase::Sending => {
                let error =
                    io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed before response");
                self.complete(Some(PurgeError::Transport(error)), 400, None);
            }
            Phase::ReceivingBody { .. } => {
                let body = self.take_body();
                self.complete(None, 400, Some(body));
            }
            Phase::Done => self.discard("close"),
        }
    }

    /// Decode the accumulated body. Decoding happens once, here, so multi-byte
    /// sequences split across chunks stay intact.
    fn take_body(&mut self) -> String {
        String::from_utf8_lossy(&mem::take(&mut self.body)).into_owned()
    }

    fn discard(&self, event: &str) {
        self.log
            .debug(format_args!("multiple invalidations: {} for {}", event, self.uri));
    }

    /// Single completion point. The terminal phase is set before anything else, so
    /// re-entrant events hit the guard; the callback is consumed on the way out.
    fn complete(&mut self, error: Option<PurgeError>, status: u16, body: Option<String>) {
        self.phase = Phase::Done;
        self.body = BytesMut::new();
        if (200..300).contains(&status) {
            self.log
                .info(format_args!("exchange complete: ( {}, {} )", status, self.uri));
        } else {
            self.log
                .warn(format_args!("exchange complete: ( {}, {} )", status, self.uri));
        }
        if let Some(on_complete) = self.on_complete.take() {
            on_complete(Outcome {
                error,
                status,
                uri: self.uri.clone(),
                body,
            });
        }
    }
}

impl ResponseEvents for Exchange {
    fn on_response(&mut self, status: u16) {
        match self.phase {
            Phase::Sending => self.phase = Phase::ReceivingBody { status },
            Phase::ReceivingBody { .. } => {}
            Phase::Done => self.discard("response"),
        }
    }

    fn on_chunk(&mut self, data: &[u8]) {
        match self.phase {
            Phase::ReceivingBody { .. } => self.body.extend_from_slice(data),
            // No response yet, so nothing is listening for data.
            Phase::Sending => {}
            Phase::Done => self.discard("chunk"),
        }
    }

    fn on_end(&mut self) {
        match self.phase {
            Phase::ReceivingBody { status } => {
                let body = self.take_body();
                self.complete(None, status, Some(body));
            }
            Phase::Sending => {}
            Phase::Done => self.discard("end"),
        }
    }
}

/// Run one exchange over the live transport. The deadline covers the whole
/// exchange, connection establishment included, and stays armed until the body
/// ends. Every path out of here leaves the exchange terminal and drops the
/// connection.
pub(crate) async fn drive(options: RequestOptions, timeout: Duration, exchange: &mut Exchange) {
    let deadline = Instant::now() + timeout;
    let head = wire::write_request(&options);

    let connect = options.agent.connect(&options.hostname, options.port);
    let mut stream = match time::timeout_at(deadline, connect).await {
        Err(_) => {
            exchange.on_timeout();
            return;
        }
        Ok(Err(error)) => {
            exchange.on_error(error);
            return;
        }
        Ok(Ok(stream)) => stream,
    };

    let send = async {
        stream.write_all(head.as_bytes()).await?;
        stream.flush().await
    };
    match time::timeout_at(deadline, send).await {
        Err(_) => {
            exchange.on_timeout();
            return;
        }
        Ok(Err(error)) => {
            exchange.on_error(error);
            return;
        }
        Ok(Ok(())) => {}
    }

    let mut parser = ResponseParser::new();
    let mut read_buf = BytesMut::with_capacity(8192);
    let mut scratch = [0u8; 8192];
    while !exchange.is_done() {
        let n = match time::timeout_at(deadline, stream.read(&mut scratch)).await {
            Err(_) => {
                exchange.on_timeout();
                return;
            }
            Ok(Err(error)) => {
                exchange.on_error(error);
                return;
            }
            Ok(Ok(n)) => n,
        };
        if n == 0 {
            if !parser.close(exchange) {
                exchange.on_close();
            }
            return;
        }
        read_buf.extend_from_slice(&scratch[..n]);
        if let Err(error) = parser.receive(&mut read_buf, exchange) {
            exchange.on_error(error);
            return;
        }
    }
}
