/*
 * stream.rs
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

//! Batch pipeline over the client: jobs in, results out, one exchange at a time
//! in submission order.
//!
//! Every completed exchange republishes its result. When an exchange carries an
//! error the pipeline publishes the result, then the error, then stops; jobs
//! already queued behind it are dropped. Closing the job sender drains the queue
//! and ends the result stream.

use serde::Serialize;
use tokio::sync::mpsc;

use crate::client::EdgeClient;
use crate::error::PurgeError;
use crate::exchange::Outcome;
use crate::request::{Action, Target};

/// One unit of work for the pipeline.
#[derive(Debug, Clone)]
pub struct Job {
    pub action: Action,
    pub uri: Target,
}

impl Job {
    pub fn new(action: Action, uri: impl Into<Target>) -> Self {
        Self {
            action,
            uri: uri.into(),
        }
    }
}

/// Result republished for each completed exchange.
#[derive(Debug, Clone, Serialize)]
pub struct StreamResult {
    pub status: u16,
    pub uri: String,
    pub body: Option<String>,
}

/// Receiving half of a pipeline.
pub type StreamReceiver = mpsc::UnboundedReceiver<Result<StreamResult, PurgeError>>;

/// Returns a pipeline accepting (action, target) jobs.
///
/// Must be called within a tokio runtime.
pub fn create_stream(client: EdgeClient) -> (mpsc::UnboundedSender<Job>, StreamReceiver) {
    let (job_tx, mut job_rx) = mpsc::unbounded_channel::<Job>();
    let (result_tx, result_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(Job { action, uri }) = job_rx.recv().await {
            if !run_job(&client, action, uri, &result_tx).await {
                break;
            }
        }
    });
    (job_tx, result_rx)
}

/// Returns a pipeline with the action fixed up front; it accepts bare targets.
pub fn create_url_stream(
    client: EdgeClient,
    action: Action,
) -> (mpsc::UnboundedSender<Target>, StreamReceiver) {
    let (target_tx, mut target_rx) = mpsc::unbounded_channel::<Target>();
    let (result_tx, result_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(uri) = target_rx.recv().await {
            if !run_job(&client, action, uri, &result_tx).await {
                break;
            }
        }
    });
    (target_tx, result_rx)
}

/// Process one job. Returns false when the pipeline should stop: the exchange
/// errored, construction failed, or the consumer went away.
async fn run_job(
    client: &EdgeClient,
    action: Action,
    uri: Target,
    results: &mpsc::UnboundedSender<Result<StreamResult, PurgeError>>,
) -> bool {
    match client.perform(action, uri).await {
        Err(error) => {
            let _ = results.send(Err(error));
            false
        }
        Ok(outcome) => {
            let Outcome {
                error,
                status,
                uri,
                body,
            } = outcome;
            if results.send(Ok(StreamResult { status, uri, body })).is_err() {
                return false;
            }
            match error {
                Some(error) => {
                    let _ = results.send(Err(error));
                    false
                }
                None => true,
            }
        }
    }
}
