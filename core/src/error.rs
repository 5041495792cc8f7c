/*
 * error.rs
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

//! Error taxonomy for purge operations. Aborted connections and premature closes are
//! reported through the outcome status, not as errors, so they have no variant here.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PurgeError {
    /// The action name is outside the supported set.
    #[error("no action")]
    UnsupportedAction,

    /// The target could not be reduced to a hostname and path.
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    /// Connection-level failure before any response arrived.
    #[error("transport failure: {0}")]
    Transport(#[source] io::Error),

    /// No terminal response event within the configured window.
    #[error("socket timeout")]
    Timeout,

    /// Failure while the response body was being received.
    #[error("body failure: {0}")]
    Body(#[source] io::Error),
}
