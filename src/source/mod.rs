//! Source reader boundary and input opening
//!
//! The container demuxer itself lives behind the `Source` trait; this
//! module only resolves where the bytes come from.

#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Stdin};
use std::net::{TcpStream, UdpSocket};
use std::path::PathBuf;

use crate::config::SourceOptions;
use crate::error::{Error, Result};
use crate::pipeline::types::{EncodedUnit, StreamInfo};

/// Trait for demultiplexing sources
pub trait Source {
    /// Metadata of every stream announced in the container header
    fn streams(&self) -> &[StreamInfo];

    /// Pull the next encoded unit, `Ok(None)` on a clean end of stream.
    fn read_next(&mut self) -> Result<Option<EncodedUnit>>;
}

/// Where the input bytes come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputLocation {
    File(PathBuf),
    /// `host:port` of a TCP server pushing a stream
    Tcp(String),
    /// Local `host:port` to receive datagrams on
    Udp(String),
    Stdin,
}

/// `host:port` part of a network URL, without path or query options,
/// e.g. `tcp://host:1234?listen`.
fn network_address(rest: &str) -> &str {
    rest.split(['?', '/']).next().unwrap_or(rest)
}

impl InputLocation {
    /// Resolve an input URL.
    ///
    /// Fails for `scheme://` URLs whose protocol has no reader here.
    pub fn parse(url: &str) -> Result<Self> {
        if url == "-" || url == "pipe:" || url == "pipe:0" {
            return Ok(InputLocation::Stdin);
        }
        if let Some(rest) = url.strip_prefix("tcp://") {
            return Ok(InputLocation::Tcp(network_address(rest).to_string()));
        }
        if let Some(rest) = url.strip_prefix("udp://") {
            // udp://@:1234 listens on every interface
            let addr = network_address(rest).trim_start_matches('@');
            let addr = if addr.starts_with(':') {
                format!("0.0.0.0{}", addr)
            } else {
                addr.to_string()
            };
            return Ok(InputLocation::Udp(addr));
        }
        if let Some(path) = url.strip_prefix("file://") {
            return Ok(InputLocation::File(PathBuf::from(path)));
        }
        if url.contains("://") {
            return Err(Error::Open {
                url: url.to_string(),
                reason: "unsupported protocol".to_string(),
            });
        }
        let path = url.strip_prefix("file:").unwrap_or(url);
        Ok(InputLocation::File(PathBuf::from(path)))
    }

    /// Whether the demuxer may seek inside this input.
    pub fn is_seekable(&self) -> bool {
        matches!(self, InputLocation::File(_))
    }
}

impl std::fmt::Display for InputLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputLocation::File(path) => write!(f, "{}", path.display()),
            InputLocation::Tcp(addr) => write!(f, "tcp://{}", addr),
            InputLocation::Udp(addr) => write!(f, "udp://{}", addr),
            InputLocation::Stdin => write!(f, "stdin"),
        }
    }
}

/// Byte stream feeding the demuxer.
pub enum InputStream {
    File(File),
    Tcp(TcpStream),
    Udp(UdpSocket),
    Stdin(Stdin),
}

impl InputStream {
    /// Open the input, applying the read timeout to network inputs.
    pub fn open(location: &InputLocation, options: &SourceOptions) -> io::Result<Self> {
        match location {
            InputLocation::File(path) => Ok(InputStream::File(File::open(path)?)),
            InputLocation::Tcp(addr) => {
                let stream = TcpStream::connect(addr.as_str())?;
                stream.set_read_timeout(Some(options.read_timeout))?;
                Ok(InputStream::Tcp(stream))
            }
            InputLocation::Udp(addr) => {
                let socket = UdpSocket::bind(addr.as_str())?;
                socket.set_read_timeout(Some(options.read_timeout))?;
                Ok(InputStream::Udp(socket))
            }
            InputLocation::Stdin => Ok(InputStream::Stdin(io::stdin())),
        }
    }
}

impl Read for InputStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            InputStream::File(file) => file.read(buf),
            InputStream::Tcp(stream) => stream.read(buf),
            // one datagram per read
            InputStream::Udp(socket) => socket.recv(buf),
            InputStream::Stdin(stdin) => stdin.read(buf),
        }
    }
}

impl Seek for InputStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            InputStream::File(file) => file.seek(pos),
            _ => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "input is not seekable",
            )),
        }
    }
}
