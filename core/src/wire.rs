/*
 * wire.rs
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

//! HTTP/1.1 wire layer: request head serialization and a push parser for the response.
//!
//! The parser is fed from a byte buffer and surfaces three events: header section
//! complete, body data, body end. Framing (Content-Length, chunked, read-until-close,
//! the 204/304 no-body rule) is resolved internally when the blank line is seen, so
//! the consumer only ever deals with lifecycle events. Malformed framing is an
//! `InvalidData` error; the consumer maps it onto the exchange phase.

use std::io;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::{Buf, BytesMut};

use crate::request::RequestOptions;

/// Events surfaced by [`ResponseParser`], in lifecycle order.
pub trait ResponseEvents {
    /// Header section complete. A body, possibly empty, follows.
    fn on_response(&mut self, status: u16);
    /// One run of body data, in arrival order.
    fn on_chunk(&mut self, data: &[u8]);
    /// The body ended normally. Emitted at most once.
    fn on_end(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    StatusLine,
    Headers,
    FixedBody,
    UntilClose,
    ChunkSize,
    ChunkData,
    ChunkEnd,
    Trailers,
    Complete,
}

/// Push parser for one HTTP/1.1 response. Feed bytes via `receive`; partial input
/// stays in the buffer until the rest arrives. `close` resolves end-of-stream.
pub struct ResponseParser {
    state: ParseState,
    status: u16,
    content_length: Option<u64>,
    chunked: bool,
    /// Bytes left in the fixed body or the current chunk.
    remaining: u64,
}

impl ResponseParser {
    pub fn new() -> Self {
        Self {
            state: ParseState::StatusLine,
            status: 0,
            content_length: None,
            chunked: false,
            remaining: 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state == ParseState::Complete
    }

    fn find_crlf(buf: &[u8]) -> Option<usize> {
        buf.windows(2).position(|pair| pair == b"\r\n")
    }

    /// Split one CRLF-terminated line off the front of buf, CRLF included; the
    /// returned length excludes it. None when the line is still incomplete.
    fn split_line(buf: &mut BytesMut) -> Option<(BytesMut, usize)> {
        let line_end = Self::find_crlf(buf)?;
        let line = buf.split_to(line_end + 2);
        Some((line, line_end))
    }

    /// Consume as much of buf as possible, emitting events for each completed token.
    pub fn receive<E: ResponseEvents>(
        &mut self,
        buf: &mut BytesMut,
        events: &mut E,
    ) -> io::Result<()> {
        while !buf.is_empty() {
            match self.state {
                ParseState::StatusLine => {
                    let (line, line_end) = match Self::split_line(buf) {
                        Some(parts) => parts,
                        None => return Ok(()),
                    };
                    let line_str = std::str::from_utf8(&line[..line_end]).map_err(|_| {
                        io::Error::new(io::ErrorKind::InvalidData, "invalid status line")
                    })?;
                    // HTTP/1.1 200 OK; the reason phrase is ignored.
                    let mut parts = line_str.splitn(3, ' ');
                    let _version = parts.next();
                    self.status = parts
                        .next()
                        .and_then(|code| code.parse::<u16>().ok())
                        .ok_or_else(|| {
                            io::Error::new(io::ErrorKind::InvalidData, "invalid status line")
                        })?;
                    self.state = ParseState::Headers;
                }
                ParseState::Headers => {
                    let (line, line_end) = match Self::split_line(buf) {
                        Some(parts) => parts,
                        None => return Ok(()),
                    };
                    if line_end == 0 {
                        self.enter_body(events);
                        continue;
                    }
                    let line_str = std::str::from_utf8(&line[..line_end]).map_err(|_| {
                        io::Error::new(io::ErrorKind::InvalidData, "invalid header line")
                    })?;
                    if let Some((name, value)) = line_str.split_once(':') {
                        self.framing_header(name.trim(), value.trim())?;
                    }
                }
                ParseState::FixedBody => {
                    let take = self.remaining.min(buf.len() as u64) as usize;
                    let chunk = buf.split_to(take);
                    events.on_chunk(&chunk);
                    self.remaining -= take as u64;
                    if self.remaining == 0 {
                        self.state = ParseState::Complete;
                        events.on_end();
                    }
                }
                ParseState::UntilClose => {
                    let chunk = buf.split_to(buf.len());
                    events.on_chunk(&chunk);
                    return Ok(());
                }
                ParseState::ChunkSize => {
                    let (line, line_end) = match Self::split_line(buf) {
                        Some(parts) => parts,
                        None => return Ok(()),
                    };
                    let line_str = std::str::from_utf8(&line[..line_end]).map_err(|_| {
                        io::Error::new(io::ErrorKind::InvalidData, "invalid chunk size")
                    })?;
                    let hex = match line_str.split_once(';') {
                        Some((size, _extensions)) => size,
                        None => line_str,
                    };
                    let size = u64::from_str_radix(hex.trim(), 16).map_err(|_| {
                        io::Error::new(io::ErrorKind::InvalidData, "invalid chunk size")
                    })?;
                    if size == 0 {
                        self.state = ParseState::Trailers;
                    } else {
                        self.remaining = size;
                        self.state = ParseState::ChunkData;
                    }
                }
                ParseState::ChunkData => {
                    let take = self.remaining.min(buf.len() as u64) as usize;
                    let chunk = buf.split_to(take);
                    events.on_chunk(&chunk);
                    self.remaining -= take as u64;
                    if self.remaining == 0 {
                        self.state = ParseState::ChunkEnd;
                    }
                }
                ParseState::ChunkEnd => {
                    if buf.len() < 2 {
                        return Ok(());
                    }
                    let crlf = buf.split_to(2);
                    if &crlf[..] != b"\r\n" {
                        return Err(io::Error::new(
                            io::ErrorKind::InvalidData,
                            "invalid chunk terminator",
                        ));
                    }
                    self.state = ParseState::ChunkSize;
                }
                ParseState::Trailers => {
                    let line_end = match Self::find_crlf(buf) {
                        Some(n) => n,
                        None => return Ok(()),
                    };
                    // Trailers are consumed and dropped.
                    buf.advance(line_end + 2);
                    if line_end == 0 {
                        self.state = ParseState::Complete;
                        events.on_end();
                    }
                }
                ParseState::Complete => return Ok(()),
            }
        }
        Ok(())
    }

    /// Signal end of stream. Returns true when EOF was the normal end of the body
    /// (read-until-close mode, or the response had already completed); `on_end` has
    /// fired by then. False means the stream closed mid-response.
    pub fn close<E: ResponseEvents>(&mut self, events: &mut E) -> bool {
        match self.state {
            ParseState::UntilClose => {
                self.state = ParseState::Complete;
                events.on_end();
                true
            }
            ParseState::Complete => true,
            _ => false,
        }
    }

    /// Record framing headers while scanning the header section. Other headers pass
    /// through unexamined.
    fn framing_header(&mut self, name: &str, value: &str) -> io::Result<()> {
        if name.eq_ignore_ascii_case("content-length") {
            let length = value.parse::<u64>().map_err(|_| {
                io::Error::new(io::ErrorKind::InvalidData, "invalid content length")
            })?;
            self.content_length = Some(length);
        } else if name.eq_ignore_ascii_case("transfer-encoding")
            && value.to_ascii_lowercase().contains("chunked")
        {
            self.chunked = true;
        }
        Ok(())
    }

    /// Blank line seen: announce the response, then pick the body mode. Chunked wins
    /// over Content-Length; 204 and 304 never carry a body; with no framing at all
    /// the body runs until the connection closes. An interim 1xx head is dropped
    /// unannounced and parsing resumes at the status line behind it.
    fn enter_body<E: ResponseEvents>(&mut self, events: &mut E) {
        if (100..200).contains(&self.status) {
            self.content_length = None;
            self.chunked = false;
            self.state = ParseState::StatusLine;
            return;
        }
        events.on_response(self.status);
        if self.chunked {
            self.state = ParseState::ChunkSize;
        } else if let Some(length) = self.content_length {
            if length == 0 {
                self.state = ParseState::Complete;
                events.on_end();
            } else {
                self.remaining = length;
                self.state = ParseState::FixedBody;
            }
        } else if self.status == 204 || self.status == 304 {
            self.state = ParseState::Complete;
            events.on_end();
        } else {
            self.state = ParseState::UntilClose;
        }
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize the request head. The request carries no body, so this is the whole
/// request. One exchange per connection, hence Connection: close.
pub fn write_request(options: &RequestOptions) -> String {
    let mut head = format!("{} {} HTTP/1.1\r\n", options.method, options.path);
    if options.port == 443 || options.port == 80 {
        head.push_str(&format!("Host: {}\r\n", options.hostname));
    } else {
        head.push_str(&format!("Host: {}:{}\r\n", options.hostname, options.port));
    }
    for (name, value) in &options.headers {
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    if let Some(auth) = &options.auth {
        head.push_str(&format!("Authorization: Basic {}\r\n", STANDARD.encode(auth)));
    }
    head.push_str("Connection: close\r\n\r\n");
    head
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::Agent;

    #[derive(Default)]
    struct Events {
        response: Option<u16>,
        chunks: Vec<Vec<u8>>,
        ended: bool,
    }

    impl ResponseEvents for Events {
        fn on_response(&mut self, status: u16) {
            self.response = Some(status);
        }

        fn on_chunk(&mut self, data: &[u8]) {
            self.chunks.push(data.to_vec());
        }

        fn on_end(&mut self) {
            assert!(!self.ended, "end emitted twice");
            self.ended = true;
        }
    }

    impl Events {
        fn body(&self) -> String {
            let joined: Vec<u8> = self.chunks.iter().flatten().copied().collect();
            String::from_utf8(joined).unwrap()
        }
    }

    fn feed(parser: &mut ResponseParser, events: &mut Events, data: &[u8]) -> io::Result<()> {
        let mut buf = BytesMut::from(data);
        parser.receive(&mut buf, events)
    }

    #[test]
    fn content_length_body_in_one_feed() {
        let mut parser = ResponseParser::new();
        let mut events = Events::default();
        feed(
            &mut parser,
            &mut events,
            b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello",
        )
        .unwrap();
        assert_eq!(events.response, Some(200));
        assert_eq!(events.body(), "hello");
        assert!(events.ended);
        assert!(parser.is_complete());
    }

    #[test]
    fn byte_at_a_time_feed() {
        let mut parser = ResponseParser::new();
        let mut events = Events::default();
        let mut buf = BytesMut::new();
        for byte in b"HTTP/1.1 404 Not Found\r\nContent-Length: 2\r\n\r\nno".iter() {
            buf.extend_from_slice(&[*byte]);
            parser.receive(&mut buf, &mut events).unwrap();
        }
        assert_eq!(events.response, Some(404));
        assert_eq!(events.body(), "no");
        assert!(events.ended);
    }

    #[test]
    fn chunked_body_with_trailers() {
        let mut parser = ResponseParser::new();
        let mut events = Events::default();
        feed(
            &mut parser,
            &mut events,
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n\
              5\r\nhello\r\n6;ext=1\r\n world\r\n0\r\nX-Trailer: t\r\n\r\n",
        )
        .unwrap();
        assert_eq!(events.response, Some(200));
        assert_eq!(events.body(), "hello world");
        assert!(events.ended);
        assert!(parser.is_complete());
    }

    #[test]
    fn zero_content_length_ends_immediately() {
        let mut parser = ResponseParser::new();
        let mut events = Events::default();
        feed(
            &mut parser,
            &mut events,
            b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n",
        )
        .unwrap();
        assert_eq!(events.response, Some(200));
        assert!(events.ended);
        assert!(events.chunks.is_empty());
    }

    #[test]
    fn status_204_has_no_body() {
        let mut parser = ResponseParser::new();
        let mut events = Events::default();
        feed(&mut parser, &mut events, b"HTTP/1.1 204 No Content\r\n\r\n").unwrap();
        assert_eq!(events.response, Some(204));
        assert!(events.ended);
    }

    #[test]
    fn unframed_body_runs_until_close() {
        let mut parser = ResponseParser::new();
        let mut events = Events::default();
        feed(&mut parser, &mut events, b"HTTP/1.1 200 OK\r\n\r\npartial").unwrap();
        assert_eq!(events.response, Some(200));
        assert_eq!(events.body(), "partial");
        assert!(!events.ended);
        assert!(parser.close(&mut events));
        assert!(events.ended);
        assert!(parser.is_complete());
    }

    #[test]
    fn close_mid_fixed_body_is_premature() {
        let mut parser = ResponseParser::new();
        let mut events = Events::default();
        feed(
            &mut parser,
            &mut events,
            b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nfour",
        )
        .unwrap();
        assert_eq!(events.body(), "four");
        assert!(!parser.close(&mut events));
        assert!(!events.ended);
    }

    #[test]
    fn close_after_completion_is_normal() {
        let mut parser = ResponseParser::new();
        let mut events = Events::default();
        feed(
            &mut parser,
            &mut events,
            b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n",
        )
        .unwrap();
        assert!(parser.close(&mut events));
    }

    #[test]
    fn malformed_status_line_errors() {
        let mut parser = ResponseParser::new();
        let mut events = Events::default();
        let result = feed(&mut parser, &mut events, b"BOGUS\r\n\r\n");
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::InvalidData);
        assert_eq!(events.response, None);
    }

    #[test]
    fn malformed_chunk_size_errors_after_partial_body() {
        let mut parser = ResponseParser::new();
        let mut events = Events::default();
        let result = feed(
            &mut parser,
            &mut events,
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n7\r\npartial\r\nzz!\r\n",
        );
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::InvalidData);
        assert_eq!(events.response, Some(200));
        assert_eq!(events.body(), "partial");
        assert!(!events.ended);
    }

    #[test]
    fn invalid_content_length_errors() {
        let mut parser = ResponseParser::new();
        let mut events = Events::default();
        let result = feed(
            &mut parser,
            &mut events,
            b"HTTP/1.1 200 OK\r\nContent-Length: many\r\n\r\n",
        );
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn interim_1xx_is_skipped() {
        let mut parser = ResponseParser::new();
        let mut events = Events::default();
        feed(&mut parser, &mut events, b"HTTP/1.1 100 Continue\r\n\r\n").unwrap();
        assert_eq!(events.response, None);
        feed(
            &mut parser,
            &mut events,
            b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok",
        )
        .unwrap();
        assert_eq!(events.response, Some(200));
        assert_eq!(events.body(), "ok");
        assert!(events.ended);
        assert!(parser.is_complete());
    }

    #[test]
    fn framing_headers_match_case_insensitively() {
        let mut parser = ResponseParser::new();
        let mut events = Events::default();
        feed(
            &mut parser,
            &mut events,
            b"HTTP/1.1 200 OK\r\ncontent-LENGTH: 2\r\n\r\nok",
        )
        .unwrap();
        assert_eq!(events.body(), "ok");
        assert!(events.ended);
    }

    fn options(port: u16, auth: Option<&str>) -> RequestOptions {
        RequestOptions {
            method: "PURGE",
            hostname: "h.test".to_string(),
            path: "/x".to_string(),
            headers: vec![
                ("accept", "application/json".to_string()),
                ("Fastly-Key", "k".to_string()),
            ],
            port,
            auth: auth.map(str::to_string),
            agent: Agent::new(),
        }
    }

    #[test]
    fn request_head_with_auth_and_custom_port() {
        let head = write_request(&options(8080, Some("user:pass")));
        assert_eq!(
            head,
            "PURGE /x HTTP/1.1\r\n\
             Host: h.test:8080\r\n\
             accept: application/json\r\n\
             Fastly-Key: k\r\n\
             Authorization: Basic dXNlcjpwYXNz\r\n\
             Connection: close\r\n\r\n"
        );
    }

    #[test]
    fn request_head_on_default_port_omits_host_suffix() {
        let head = write_request(&options(443, None));
        assert!(head.contains("Host: h.test\r\n"));
        assert!(!head.contains("Authorization"));
    }
}
