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

//! The per-connection session loop.
//!
//! The command processor does everything which can be done synchronously.
//! This module owns the transport and drives the parts of the protocol that
//! have to wait for the client or the network: reading commands, the
//! `STARTTLS` handshake, the `AUTHENTICATE` exchange, the `APPEND` payload,
//! and `IDLE`.

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use tokio::io::{AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::Notify;

use super::command_processor::CommandProcessor;
use super::request_reader::{CommandStart, RequestReader};
use super::response::Response;
use super::response_pipeline::{ResponsePipeline, StreamSink};
use super::syntax as s;
use crate::sasl::{SaslRegistry, SaslStep};
use crate::store::model::*;
use crate::store::MailStore;
use crate::support::async_io::Transport;
use crate::support::error::Error;
use crate::support::log_prefix::LogPrefix;
use crate::support::system_config::SystemConfig;

/// Everything sessions share: configuration and the collaborators.
#[derive(Clone)]
pub struct Server {
    config: Arc<SystemConfig>,
    store: Arc<dyn MailStore>,
    sasl: Arc<SaslRegistry>,
}

impl Server {
    pub fn new(
        config: SystemConfig,
        store: Arc<dyn MailStore>,
        sasl: SaslRegistry,
    ) -> Self {
        Server {
            config: Arc::new(config),
            store,
            sasl: Arc::new(sasl),
        }
    }

    /// Sets up a session over `transport`. Nothing is sent until the session
    /// is run.
    pub fn session<T: Transport>(&self, transport: T) -> Session<T> {
        let log_prefix = LogPrefix::new("imap".to_owned());
        let secure = transport.is_secure();
        let tls_available = transport.tls_available();
        if secure {
            log_prefix.set_secure();
        }

        let (read_half, write_half) = tokio::io::split(transport);
        let sink = StreamSink::new(write_half);
        let pipeline = ResponsePipeline::new(sink.clone(), log_prefix.clone());
        let shutdown = Arc::new(Notify::new());
        {
            let shutdown = Arc::clone(&shutdown);
            let log_prefix = log_prefix.clone();
            pipeline.set_error_handler(move |e| {
                warn!("{} Write to client failed, closing: {}", log_prefix, e);
                shutdown.notify_one();
            });
        }

        let mut processor = CommandProcessor::new(
            log_prefix.clone(),
            Arc::clone(&self.config),
            Arc::clone(&self.store),
            Arc::clone(&self.sasl),
            pipeline.clone(),
        );
        processor.set_transport_state(secure, tls_available);

        Session {
            log_prefix,
            config: Arc::clone(&self.config),
            processor,
            pipeline,
            sink,
            shutdown,
            reader: Some(RequestReader::new(
                read_half,
                self.config.max_command_line,
            )),
        }
    }
}

type Reader<T> = RequestReader<ReadHalf<T>>;

/// One client connection.
pub struct Session<T: Transport> {
    log_prefix: LogPrefix,
    config: Arc<SystemConfig>,
    processor: CommandProcessor,
    pipeline: ResponsePipeline,
    sink: StreamSink<WriteHalf<T>>,
    shutdown: Arc<Notify>,
    reader: Option<Reader<T>>,
}

/// Lets code outside the session loop end the session.
///
/// Must be used from within the Tokio runtime the session runs on.
#[derive(Clone)]
pub struct SessionHandle {
    pipeline: ResponsePipeline,
    shutdown: Arc<Notify>,
}

impl SessionHandle {
    /// Sends `* BYE <text>` and disconnects once it has been written.
    pub fn close(&self, text: &str) {
        let shutdown = Arc::clone(&self.shutdown);
        self.pipeline.submit(
            Response::Bye(text.to_owned()),
            Some(Box::new(move || shutdown.notify_one())),
        );
        // A halted pipeline drops the callback
        if self.pipeline.is_halted() {
            self.shutdown.notify_one();
        }
    }

    /// Called by an external idle-timeout watchdog.
    pub fn idle_timeout(&self) {
        self.close("Idle timeout, closing connection.");
    }
}

enum Flow {
    Continue,
    StartTls,
    Disconnect,
}

impl<T: Transport> Session<T> {
    /// Identifies the peer in log messages.
    pub fn set_peer(&self, peer: impl Into<String>) {
        self.log_prefix.set_peer(peer.into());
    }

    /// Makes the session refuse every command but `LOGOUT`, e.g. because
    /// the peer is blocked.
    pub fn reject(&mut self) {
        self.processor.reject();
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            pipeline: self.pipeline.clone(),
            shutdown: Arc::clone(&self.shutdown),
        }
    }

    /// Runs the session to completion.
    ///
    /// The client going away is a normal end of the session and is not
    /// reported as an error.
    pub async fn run(mut self) -> Result<(), Error> {
        let reader = match self.reader.take() {
            Some(reader) => reader,
            None => return Ok(()),
        };

        info!("{} Connection established", self.log_prefix);
        let result = self.serve(reader).await;
        let _ = self.pipeline.flush().await;
        if let Some(mut writer) = self.sink.take().await {
            let _ = writer.shutdown().await;
        }

        match result {
            Ok(()) => {
                info!("{} Connection closed", self.log_prefix);
                Ok(())
            },
            Err(e) if e.is_disconnect() => {
                info!("{} Connection closed by client", self.log_prefix);
                Ok(())
            },
            Err(e) => {
                error!("{} Session failed: {}", self.log_prefix, e);
                Err(e)
            },
        }
    }

    async fn serve(&mut self, mut reader: Reader<T>) -> Result<(), Error> {
        self.pipeline
            .submit_and_wait(Response::Untagged(Status::ok(
                self.config.greeting_text(),
            )))
            .await?;

        loop {
            match self.command_loop(&mut reader).await {
                Ok(Flow::StartTls) => reader = self.start_tls(reader).await?,
                Ok(_) => return Ok(()),
                Err(Error::LineTooLong) => {
                    warn!("{} Command line too long", self.log_prefix);
                    self.pipeline
                        .submit_and_wait(Response::Bye(
                            "Command line too long.".to_owned(),
                        ))
                        .await?;
                    return Err(Error::LineTooLong);
                },
                Err(e) => return Err(e),
            }
        }
    }

    async fn command_loop(
        &mut self,
        reader: &mut Reader<T>,
    ) -> Result<Flow, Error> {
        loop {
            let command = match self.next_command(reader).await? {
                Some(command) => command,
                None => return Ok(Flow::Disconnect),
            };

            let flow = match command {
                CommandStart::Line(line) => {
                    self.dispatch_line(reader, &line).await?
                },
                CommandStart::Append {
                    tag,
                    mailbox,
                    flags,
                    date,
                    size,
                } => {
                    self.append(reader, &tag, &mailbox, flags, date, size)
                        .await?;
                    Flow::Continue
                },
            };

            match flow {
                Flow::Continue => (),
                flow => return Ok(flow),
            }
        }
    }

    /// Waits for the next command, giving up on the idle timeout or when the
    /// session is closed from outside.
    async fn next_command(
        &mut self,
        reader: &mut Reader<T>,
    ) -> Result<Option<CommandStart>, Error> {
        let read = with_timeout(
            self.config.idle_timeout_secs,
            reader.read_command(&self.pipeline),
        );

        tokio::select! {
            result = read => match result {
                Some(command) => command.map(Some),
                None => {
                    info!("{} Idle timeout", self.log_prefix);
                    self.pipeline
                        .submit_and_wait(Response::Bye(
                            "Idle timeout, closing connection.".to_owned(),
                        ))
                        .await?;
                    Ok(None)
                },
            },
            _ = self.shutdown.notified() => Ok(None),
        }
    }

    async fn dispatch_line(
        &mut self,
        reader: &mut Reader<T>,
        line: &str,
    ) -> Result<Flow, Error> {
        let (tag, command, args) = match s::command_line(line) {
            Some(parsed) => parsed,
            None => {
                self.pipeline.send(Response::Untagged(Status::bad(format!(
                    "Error: Command '{}' not recognized.",
                    line
                ))));
                return Ok(Flow::Continue);
            },
        };

        // Arguments are never logged; they may hold passwords
        debug!("{} >> {} {}", self.log_prefix, tag, command);

        if let Some(status) = self.processor.rejection(command) {
            self.send_tagged(tag, status);
            return Ok(Flow::Continue);
        }

        match command.to_ascii_uppercase().as_str() {
            "STARTTLS" => match self.processor.start_tls_check() {
                Ok(status) => {
                    self.pipeline
                        .submit_and_wait(Response::Tagged(tag.to_owned(), status))
                        .await?;
                    Ok(Flow::StartTls)
                },
                Err(status) => {
                    self.send_tagged(tag, status);
                    Ok(Flow::Continue)
                },
            },
            "AUTHENTICATE" => {
                self.authenticate(reader, tag, args).await?;
                Ok(Flow::Continue)
            },
            "IDLE" => self.idle(reader, tag).await,
            _ => {
                // A panicking store call becomes an internal error
                let status = match panic::catch_unwind(AssertUnwindSafe(|| {
                    self.processor.handle_command(command, args)
                })) {
                    Ok(status) => status,
                    Err(payload) => self.internal_error(panic_message(&*payload)),
                };
                if self.processor.too_many_bad_commands() {
                    // The BYE replaces the tagged response
                    warn!(
                        "{} Too many bad commands, disconnecting",
                        self.log_prefix
                    );
                    self.pipeline
                        .submit_and_wait(Response::Bye(
                            "Too many bad commands, closing transmission \
                             channel."
                                .to_owned(),
                        ))
                        .await?;
                    Ok(Flow::Disconnect)
                } else if self.processor.logged_out() {
                    self.pipeline
                        .submit_and_wait(Response::Tagged(tag.to_owned(), status))
                        .await?;
                    Ok(Flow::Disconnect)
                } else {
                    self.send_tagged(tag, status);
                    Ok(Flow::Continue)
                }
            },
        }
    }

    fn send_tagged(&self, tag: &str, status: Status) {
        self.pipeline.send(Response::Tagged(tag.to_owned(), status));
    }

    /// Reports an unexpected failure of the current command, returning the
    /// status to use as its tagged response.
    fn internal_error(&self, what: &str) -> Status {
        error!("{} Internal error: {}", self.log_prefix, what);
        self.pipeline.send(Response::Untagged(Status::bad(format!(
            "Internal server error: {}",
            what
        ))));
        Status::no("Internal server error.")
    }

    async fn start_tls(&mut self, reader: Reader<T>) -> Result<Reader<T>, Error> {
        self.pipeline.flush().await?;
        if reader.has_buffered() {
            warn!(
                "{} Discarding input pipelined after STARTTLS",
                self.log_prefix
            );
        }

        let write_half = self.sink.take().await.ok_or(Error::Disconnected)?;
        let mut transport = reader.into_inner().unsplit(write_half);
        transport.start_tls().await?;
        self.processor.tls_established();

        let (read_half, write_half) = tokio::io::split(transport);
        self.sink.restore(write_half).await;
        Ok(RequestReader::new(read_half, self.config.max_command_line))
    }

    async fn authenticate(
        &mut self,
        reader: &mut Reader<T>,
        tag: &str,
        args: &str,
    ) -> Result<(), Error> {
        let (mut exchange, initial) =
            match self.processor.authenticate_start(args) {
                Ok(started) => started,
                Err(status) => {
                    self.send_tagged(tag, status);
                    return Ok(());
                },
            };

        let mut client = initial.unwrap_or_default();
        let status = loop {
            match exchange.step(&client) {
                SaslStep::Success(identity) => {
                    break self.processor.authenticate_finish(&identity);
                },
                SaslStep::Failure => {
                    warn!("{} SASL authentication failed", self.log_prefix);
                    break Status::no("Authentication credentials invalid.");
                },
                SaslStep::Challenge(challenge) => {
                    self.pipeline
                        .submit_and_wait(Response::Continuation(base64::encode(
                            &challenge,
                        )))
                        .await?;

                    let line = reader.read_line().await?;
                    let line = String::from_utf8_lossy(&line);
                    let line = line.trim();
                    if "*" == line {
                        break Status::bad("Authentication canceled.");
                    }

                    match base64::decode(line) {
                        Ok(response) => client = response,
                        Err(_) => {
                            warn!(
                                "{} Undecodable AUTHENTICATE response",
                                self.log_prefix
                            );
                            break Status::no(format!(
                                "Invalid client response '{}'.",
                                line
                            ));
                        },
                    }
                },
            }
        };

        self.send_tagged(tag, status);
        Ok(())
    }

    async fn append(
        &mut self,
        reader: &mut Reader<T>,
        tag: &str,
        mailbox: &str,
        flags: Vec<Flag>,
        date: Option<chrono::DateTime<chrono::FixedOffset>>,
        size: u32,
    ) -> Result<(), Error> {
        let start = Instant::now();
        let mut sink =
            match self.processor.append_start(mailbox, flags, date, size) {
                Ok(sink) => sink,
                Err(status) => {
                    self.send_tagged(tag, status);
                    return Ok(());
                },
            };

        self.pipeline
            .submit_and_wait(Response::Continuation(
                "Ready for literal data.".to_owned(),
            ))
            .await?;
        let written = reader.read_exact_into(size as usize, &mut *sink).await?;
        let rest = reader.read_line().await?;
        if !rest.is_empty() {
            warn!(
                "{} Ignoring {} bytes after APPEND literal",
                self.log_prefix,
                rest.len()
            );
        }

        let status = match written {
            Ok(()) => self.processor.append_finish(sink, start),
            Err(e) => {
                self.internal_error(&format!("Writing APPEND data failed: {}", e))
            },
        };

        self.send_tagged(tag, status);
        Ok(())
    }

    async fn idle(
        &mut self,
        reader: &mut Reader<T>,
        tag: &str,
    ) -> Result<Flow, Error> {
        let done = match self.processor.idle_start() {
            Ok(done) => done,
            Err(status) => {
                self.send_tagged(tag, status);
                return Ok(Flow::Continue);
            },
        };

        self.pipeline
            .submit_and_wait(Response::Continuation("idling".to_owned()))
            .await?;

        let period = Duration::from_secs(self.config.idle_tick_secs.max(1));
        let mut ticker =
            tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        loop {
            tokio::select! {
                line = reader.read_line() => {
                    let line = line?;
                    let line = String::from_utf8_lossy(&line);
                    if s::is_done(&line) {
                        self.send_tagged(tag, done);
                        return Ok(Flow::Continue);
                    }
                    warn!(
                        "{} Ignoring {:?} while idling",
                        self.log_prefix, line
                    );
                },
                _ = ticker.tick() => self.processor.idle_tick(),
                _ = self.shutdown.notified() => return Ok(Flow::Disconnect),
            }
        }
    }
}

/// Awaits `fut`, giving up after `secs` seconds unless `secs` is 0.
async fn with_timeout<F: Future>(secs: u64, fut: F) -> Option<F::Output> {
    if 0 == secs {
        Some(fut.await)
    } else {
        tokio::time::timeout(Duration::from_secs(secs), fut).await.ok()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("Unknown failure")
}
