//-
// Copyright (c) 2020, Jason Lingle
//
// This file is part of Crymap.
//
// Crymap is free software: you can  redistribute it and/or modify it under the
// terms of  the GNU General Public  License as published by  the Free Software
// Foundation, either version  3 of the License, or (at  your option) any later
// version.
//
// Crymap is distributed  in the hope that  it will be useful,  but WITHOUT ANY
// WARRANTY; without  even the implied  warranty of MERCHANTABILITY  or FITNESS
// FOR  A PARTICULAR  PURPOSE.  See the  GNU General  Public  License for  more
// details.
//
// You should have received a copy of the GNU General Public License along with
// Crymap. If not, see <http://www.gnu.org/licenses/>.

use std::io;

use chrono::prelude::*;
use lazy_static::lazy_static;
use log::warn;
use regex::bytes::Regex;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::response::Response;
use super::response_pipeline::ResponsePipeline;
use super::syntax as s;
use crate::store::model::Flag;
use crate::store::AppendSink;
use crate::support::error::Error;

lazy_static! {
    static ref LITERAL_AT_END: Regex = Regex::new(r"\{([0-9]+)\}$").unwrap();
}

const READ_CHUNK: usize = 4096;

/// The start of a command, as read off the wire.
#[derive(Debug, PartialEq, Eq)]
pub enum CommandStart {
    /// A complete command, with every literal folded into a quoted string.
    Line(String),
    /// The start of an `APPEND` whose message literal has not been read.
    ///
    /// No continuation has been sent. The caller must either send one and
    /// consume exactly `size` octets followed by the rest of the line, or
    /// reject the command (in which case a conforming client sends nothing
    /// further for it).
    Append {
        tag: String,
        mailbox: String,
        flags: Vec<Flag>,
        date: Option<DateTime<FixedOffset>>,
        size: u32,
    },
}

/// Buffered line and literal reader over the read half of the transport.
pub struct RequestReader<R> {
    io: R,
    buf: Vec<u8>,
    /// The number of bytes at the front of `buf` already consumed.
    consumed: usize,
    max_line: usize,
}

impl<R: AsyncRead + Unpin> RequestReader<R> {
    pub fn new(io: R, max_line: usize) -> Self {
        RequestReader {
            io,
            buf: Vec::with_capacity(READ_CHUNK),
            consumed: 0,
            max_line,
        }
    }

    /// Whether input beyond what has been consumed is already buffered.
    pub fn has_buffered(&self) -> bool {
        self.consumed < self.buf.len()
    }

    /// Returns the underlying reader, discarding anything buffered.
    pub fn into_inner(self) -> R {
        self.io
    }

    /// Reads one line, without its line ending.
    ///
    /// Fails with `LineTooLong` if no line feed turns up within the
    /// configured maximum.
    pub async fn read_line(&mut self) -> Result<Vec<u8>, Error> {
        let mut scanned = 0;
        loop {
            let pending = &self.buf[self.consumed..];
            if let Some(lf) = memchr::memchr(b'\n', &pending[scanned..]) {
                let end = scanned + lf;
                let mut line = pending[..end].to_vec();
                if Some(&b'\r') == line.last() {
                    line.pop();
                }
                self.consumed += end + 1;
                return Ok(line);
            }

            scanned = pending.len();
            if scanned > self.max_line {
                return Err(Error::LineTooLong);
            }

            self.fill().await?;
        }
    }

    /// Reads exactly `n` bytes, ignoring line structure.
    pub async fn read_exact(&mut self, n: usize) -> io::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(n);
        while out.len() < n {
            if !self.has_buffered() {
                self.fill().await?;
            }
            let take = (n - out.len()).min(self.buf.len() - self.consumed);
            out.extend_from_slice(&self.buf[self.consumed..self.consumed + take]);
            self.consumed += take;
        }
        Ok(out)
    }

    /// Streams exactly `n` bytes into `sink`.
    ///
    /// The outer result reflects the transport. If the sink fails, the rest
    /// of the data is still consumed (to keep the protocol in sync) and the
    /// sink's error is returned in the inner result.
    pub async fn read_exact_into(
        &mut self,
        mut n: usize,
        sink: &mut dyn AppendSink,
    ) -> io::Result<io::Result<()>> {
        let mut sink_result = Ok(());
        while n > 0 {
            if !self.has_buffered() {
                self.fill().await?;
            }
            let take = n.min(self.buf.len() - self.consumed);
            if sink_result.is_ok() {
                sink_result =
                    sink.write(&self.buf[self.consumed..self.consumed + take]);
            }
            self.consumed += take;
            n -= take;
        }
        Ok(sink_result)
    }

    /// Reads one logical command.
    ///
    /// While the line read so far ends with a literal specifier `{n}`, this
    /// sends `+ Continue.`, reads the `n` octets, appends them to the
    /// command as a quoted string, and carries on with the next line. The
    /// exception is a literal that starts the message of an `APPEND`, which
    /// is left on the wire for the command to consume itself.
    pub async fn read_command(
        &mut self,
        pipeline: &ResponsePipeline,
    ) -> Result<CommandStart, Error> {
        let mut command = Vec::new();
        loop {
            let line = self.read_line().await?;
            let literal = LITERAL_AT_END.captures(&line).and_then(|c| {
                let whole = c.get(0)?;
                let len = std::str::from_utf8(c.get(1)?.as_bytes())
                    .ok()?
                    .parse::<u32>()
                    .ok()?;
                Some((whole.start(), len))
            });

            let (before, len) = match literal {
                Some(literal) => literal,
                None => {
                    command.extend_from_slice(&line);
                    return Ok(CommandStart::Line(
                        String::from_utf8_lossy(&command).into_owned(),
                    ));
                },
            };

            command.extend_from_slice(&line[..before]);
            if let Some(append) = append_start(&command, len) {
                return Ok(append);
            }

            if command.len() + len as usize > self.max_line {
                warn!("Rejecting {}-byte literal in command line", len);
                return Err(Error::LineTooLong);
            }

            pipeline
                .submit_and_wait(Response::Continuation("Continue.".to_owned()))
                .await?;
            let data = self.read_exact(len as usize).await?;
            command.extend_from_slice(&s::quote_literal(&data));
        }
    }

    async fn fill(&mut self) -> io::Result<()> {
        if self.consumed > 0 && self.consumed == self.buf.len() {
            self.buf.clear();
            self.consumed = 0;
        } else if self.consumed >= READ_CHUNK {
            self.buf.drain(..self.consumed);
            self.consumed = 0;
        }

        // Read into a separate chunk so that `buf` stays consistent if this
        // future is dropped, as happens to reads racing the IDLE tick.
        let mut chunk = [0u8; READ_CHUNK];
        let nread = self.io.read(&mut chunk).await?;
        if 0 == nread {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Client disconnected",
            ));
        }

        self.buf.extend_from_slice(&chunk[..nread]);
        Ok(())
    }
}

/// If `before_literal` is `tag APPEND args` with well-formed arguments,
/// returns the `APPEND` start it describes.
fn append_start(before_literal: &[u8], size: u32) -> Option<CommandStart> {
    let text = std::str::from_utf8(before_literal).ok()?;
    let (tag, command, args) = s::command_line(text)?;
    if !command.eq_ignore_ascii_case("APPEND") {
        return None;
    }

    let args = s::parse_args(args)?;
    let (mailbox, flags, date) = s::append_args(&args)?;
    Some(CommandStart::Append {
        tag: tag.to_owned(),
        mailbox,
        flags,
        date,
        size,
    })
}
