/*
 * client.rs
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

//! Client for an edge cache invalidation API.
//!
//! Configure once, then issue purge or soft-purge actions against URLs. Each call
//! runs one exchange on its own connection and reports exactly one outcome, either
//! through a completion callback (`issue`) or as an awaited value (`perform` and
//! the per-action wrappers).

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;

use crate::error::PurgeError;
use crate::exchange::{self, Exchange, Outcome};
use crate::logger::{Logger, NopLogger};
use crate::net::Agent;
use crate::request::{self, Action, Target};

const DEFAULT_PORT: u16 = 443;
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Client configuration plus the entry points for issuing actions.
///
/// Cloning is cheap and clones share the agent, so a cloned client reuses TLS
/// sessions with its source. Configuration is meant to be settled before the
/// first action is issued.
#[derive(Clone)]
pub struct EdgeClient {
    token: Option<String>,
    auth: Option<String>,
    agent: Agent,
    log: Arc<dyn Logger>,
    port: u16,
    timeout: Duration,
}

impl EdgeClient {
    /// New client with the default port (443), timeout (10 s), a fresh agent, and
    /// a silent logger.
    pub fn new(token: Option<String>, auth: Option<String>) -> Self {
        Self {
            token,
            auth,
            agent: Agent::new(),
            log: Arc::new(NopLogger),
            port: DEFAULT_PORT,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    /// Set the port requests connect to. 443 selects TLS; anything else is plain
    /// TCP. Default 443.
    pub fn set_port(&mut self, port: u16) -> &mut Self {
        self.port = port;
        self
    }

    /// Set the per-exchange deadline, covering connect through end of body.
    /// Default 10 s.
    pub fn set_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = timeout;
        self
    }

    /// Replace the silent default logger. The initialization record is emitted
    /// through the logger being installed.
    pub fn set_logger(&mut self, log: Arc<dyn Logger>) -> &mut Self {
        self.log = log;
        self.log.info(format_args!("client initialized"));
        self
    }

    /// Share an agent with other clients, pooling their TLS session state.
    pub fn set_agent(&mut self, agent: Agent) -> &mut Self {
        self.agent = agent;
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn auth(&self) -> Option<&str> {
        self.auth.as_deref()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Issue an action against a target. Construction problems (unparseable or
    /// hostless targets) are returned synchronously and nothing is spawned; once
    /// this returns Ok the callback will be invoked exactly once with the outcome.
    ///
    /// Must be called within a tokio runtime.
    pub fn issue<F>(&self, action: Action, target: impl Into<Target>, on_complete: F) -> Result<(), PurgeError>
    where
        F: FnOnce(Outcome) + Send + 'static,
    {
        let target = target.into();
        let options = request::build(self, action, &target)?;
        self.log
            .info(format_args!("issuing: ( {}, {} )", action, target));
        self.log
            .debug(format_args!("creating request: {:?}", options));
        let mut exchange = Exchange::new(
            target.as_str().to_string(),
            Arc::clone(&self.log),
            Box::new(on_complete),
        );
        let timeout = self.timeout;
        tokio::spawn(async move {
            exchange::drive(options, timeout, &mut exchange).await;
        });
        Ok(())
    }

    /// Awaitable form of [`issue`](Self::issue).
    pub async fn perform(&self, action: Action, target: impl Into<Target>) -> Result<Outcome, PurgeError> {
        let target = target.into();
        let uri = target.as_str().to_string();
        let (tx, rx) = oneshot::channel();
        self.issue(action, target, move |outcome| {
            let _ = tx.send(outcome);
        })?;
        match rx.await {
            Ok(outcome) => Ok(outcome),
            // The exchange task went away without completing. Reported in the
            // same shape as any other pre-response transport failure.
            Err(_) => Ok(Outcome {
                error: Some(PurgeError::Transport(std::io::Error::new(
                    std::io::ErrorKind::ConnectionAborted,
                    "exchange task failed",
                ))),
                status: 400,
                uri,
                body: None,
            }),
        }
    }

    /// Purge a URL from the edge cache.
    pub async fn purge_by_url(&self, target: impl Into<Target>) -> Result<Outcome, PurgeError> {
        self.perform(Action::Purge, target).await
    }

    /// Soft-purge a URL: mark it stale instead of evicting it.
    pub async fn soft_purge_by_url(&self, target: impl Into<Target>) -> Result<Outcome, PurgeError> {
        self.perform(Action::SoftPurge, target).await
    }
}
