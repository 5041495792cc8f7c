/*
 * lib.rs
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

//! Core client for edge cache invalidation.
//!
//! Each action (purge or soft purge of a URL) runs as one exchange: the request is
//! derived from the client configuration, sent over its own connection, and exactly
//! one outcome reaches the caller whichever way the exchange ends: normal response,
//! transport failure, body failure, timeout, abort, or premature close. On top of
//! the single-exchange client, [`stream`] offers an ordered batch pipeline.

pub mod client;
pub mod error;
pub mod exchange;
pub mod logger;
pub mod net;
pub mod request;
pub mod stream;
pub mod wire;

pub use client::EdgeClient;
pub use error::PurgeError;
pub use exchange::{Exchange, OnComplete, Outcome};
pub use logger::{Level, Logger, NopLogger, TracingLogger};
pub use net::Agent;
pub use request::{Action, RequestOptions, Target};
pub use stream::{create_stream, create_url_stream, Job, StreamReceiver, StreamResult};
pub use wire::{ResponseEvents, ResponseParser};
