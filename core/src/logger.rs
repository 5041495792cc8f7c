/*
 * logger.rs
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

//! Logging capability injected into the client. Callers provide any object with the six
//! leveled sinks; the default is a no-op, so an unconfigured client stays silent.

use std::fmt;

/// Severity accepted by [`Logger::log`], most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Fatal,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Receiver for client diagnostics. The leveled sinks all funnel into [`Logger::log`],
/// so an implementation only has to route by level.
pub trait Logger: Send + Sync {
    fn log(&self, level: Level, message: fmt::Arguments<'_>);

    fn fatal(&self, message: fmt::Arguments<'_>) {
        self.log(Level::Fatal, message);
    }

    fn error(&self, message: fmt::Arguments<'_>) {
        self.log(Level::Error, message);
    }

    fn warn(&self, message: fmt::Arguments<'_>) {
        self.log(Level::Warn, message);
    }

    fn info(&self, message: fmt::Arguments<'_>) {
        self.log(Level::Info, message);
    }

    fn debug(&self, message: fmt::Arguments<'_>) {
        self.log(Level::Debug, message);
    }

    fn trace(&self, message: fmt::Arguments<'_>) {
        self.log(Level::Trace, message);
    }
}

/// Default logger: discards everything.
pub struct NopLogger;

impl Logger for NopLogger {
    fn log(&self, _level: Level, _message: fmt::Arguments<'_>) {}
}

/// Forwards to the `tracing` macros under the `edgeflush` target. Fatal collapses into
/// error, which is the highest level tracing knows.
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: Level, message: fmt::Arguments<'_>) {
        match level {
            Level::Fatal | Level::Error => tracing::error!(target: "edgeflush", "{}", message),
            Level::Warn => tracing::warn!(target: "edgeflush", "{}", message),
            Level::Info => tracing::info!(target: "edgeflush", "{}", message),
            Level::Debug => tracing::debug!(target: "edgeflush", "{}", message),
            Level::Trace => tracing::trace!(target: "edgeflush", "{}", message),
        }
    }
}
