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
use std::pin::Pin;
use std::task;

use futures::future::{self, BoxFuture, FutureExt};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// The byte stream a session runs over.
///
/// This is the transport collaborator: the engine reads lines and literals
/// from it, writes responses to it, and asks it to switch from cleartext to
/// TLS in place when the client issues `STARTTLS`. The handshake itself is
/// entirely the implementation's business.
///
/// The engine splits the transport into read and write halves for the
/// duration of normal operation and rejoins them around the TLS upgrade, so
/// implementations need not support concurrent use beyond what
/// `tokio::io::split` already provides.
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send + 'static {
    /// Whether the connection is currently encrypted.
    fn is_secure(&self) -> bool;

    /// Whether `start_tls` can be expected to work.
    fn tls_available(&self) -> bool;

    /// Performs the server side of a TLS handshake over the current stream,
    /// after which all reads and writes are encrypted.
    ///
    /// The engine guarantees that no buffered input is pending and all output
    /// has been flushed when this is called.
    fn start_tls(&mut self) -> BoxFuture<'_, io::Result<()>>;
}

/// A `Transport` over an arbitrary stream that never supports TLS.
///
/// Suitable for connections which are already encrypted by an outer layer
/// (`secure` = true) or for plain cleartext deployments.
pub struct PlainTransport<S> {
    stream: S,
    secure: bool,
}

impl<S> PlainTransport<S> {
    pub fn new(stream: S, secure: bool) -> Self {
        PlainTransport { stream, secure }
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin + Send + 'static> Transport
    for PlainTransport<S>
{
    fn is_secure(&self) -> bool {
        self.secure
    }

    fn tls_available(&self) -> bool {
        false
    }

    fn start_tls(&mut self) -> BoxFuture<'_, io::Result<()>> {
        future::ready(Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "TLS not available on this transport",
        )))
        .boxed()
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for PlainTransport<S> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> task::Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_read(cx, buf)
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for PlainTransport<S> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
        buf: &[u8],
    ) -> task::Poll<io::Result<usize>> {
        Pin::new(&mut self.stream).poll_write(cx, buf)
    }

    fn poll_flush(
        mut self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> task::Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_flush(cx)
    }

    fn poll_shutdown(
        mut self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> task::Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_shutdown(cx)
    }
}
