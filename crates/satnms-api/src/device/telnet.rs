// UHP Telnet CLI session
//
// Line-oriented command/response over TCP: connect, answer the login
// prompts if credentials are configured, then send one command at a time
// and read until the CLI prompt returns. Telnet option negotiation is
// refused and stripped from the data stream.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, trace, warn};

use crate::error::Error;

const IAC: u8 = 255;
const DONT: u8 = 254;
const DO: u8 = 253;
const WONT: u8 = 252;
const WILL: u8 = 251;
const SB: u8 = 250;
const SE: u8 = 240;

/// Replies that mean the command failed even though the transport worked.
pub const DEFAULT_FAILURE_SENTINELS: &[&str] = &[
    "No reply",
    "controller is not accessible",
    "Unknown command",
    "Bad parameter",
];

/// Connection settings for a Telnet session.
#[derive(Debug, Clone)]
pub struct TelnetConfig {
    pub port: u16,
    pub connect_timeout: Duration,
    /// Upper bound for one command's reply to reach the prompt.
    pub read_timeout: Duration,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub failure_sentinels: Vec<String>,
}

impl Default for TelnetConfig {
    fn default() -> Self {
        Self {
            port: 23,
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(15),
            username: None,
            password: None,
            failure_sentinels: DEFAULT_FAILURE_SENTINELS
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
        }
    }
}

// ── Option negotiation ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NegState {
    Data,
    Iac,
    Option(u8),
    Sub,
    SubIac,
}

/// Streaming Telnet filter.
///
/// Separates user data from IAC sequences. Every `DO` is answered with
/// `WONT` and every `WILL` with `DONT`; subnegotiations are dropped.
/// Sequences split across reads are carried over in `state`.
#[derive(Debug)]
pub struct NegotiationFilter {
    state: NegState,
}

impl Default for NegotiationFilter {
    fn default() -> Self {
        Self {
            state: NegState::Data,
        }
    }
}

impl NegotiationFilter {
    /// Filter one chunk. Returns `(data, replies)`.
    pub fn feed(&mut self, input: &[u8]) -> (Vec<u8>, Vec<u8>) {
        let mut data = Vec::with_capacity(input.len());
        let mut replies = Vec::new();

        for &byte in input {
            self.state = match (self.state, byte) {
                (NegState::Data, IAC) => NegState::Iac,
                (NegState::Data, b) => {
                    data.push(b);
                    NegState::Data
                }
                (NegState::Iac, IAC) => {
                    data.push(IAC);
                    NegState::Data
                }
                (NegState::Iac, cmd @ (DO | DONT | WILL | WONT)) => NegState::Option(cmd),
                (NegState::Iac, SB) => NegState::Sub,
                (NegState::Iac, _) => NegState::Data,
                (NegState::Option(cmd), opt) => {
                    match cmd {
                        DO => replies.extend_from_slice(&[IAC, WONT, opt]),
                        WILL => replies.extend_from_slice(&[IAC, DONT, opt]),
                        _ => {}
                    }
                    NegState::Data
                }
                (NegState::Sub, IAC) => NegState::SubIac,
                (NegState::Sub, _) => NegState::Sub,
                (NegState::SubIac, SE) => NegState::Data,
                (NegState::SubIac, _) => NegState::Sub,
            };
        }

        (data, replies)
    }
}

// ── Reply helpers ────────────────────────────────────────────────────

/// Whether the buffered text ends at a CLI prompt (`name#` or `name>`).
pub fn ends_with_prompt(text: &str) -> bool {
    let last = text.rsplit('\n').next().unwrap_or(text).trim_end();
    !last.is_empty() && (last.ends_with('#') || last.ends_with('>'))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoginStage {
    Username,
    Password,
    Ready,
}

/// Which login prompt, if any, the buffered text currently ends at.
fn login_stage(text: &str) -> Option<LoginStage> {
    let last = text
        .rsplit('\n')
        .next()
        .unwrap_or(text)
        .trim_end()
        .to_ascii_lowercase();
    if last.ends_with("username:") || last.ends_with("login:") {
        Some(LoginStage::Username)
    } else if last.ends_with("password:") {
        Some(LoginStage::Password)
    } else if ends_with_prompt(text) {
        Some(LoginStage::Ready)
    } else {
        None
    }
}

/// Strip the echoed command (first line) and the trailing prompt line.
pub fn clean_reply(raw: &str, command: &str) -> String {
    let normalized = raw.replace('\r', "");
    let mut lines: Vec<&str> = normalized.lines().collect();

    if lines.first().is_some_and(|l| l.trim() == command.trim()) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|l| ends_with_prompt(l)) {
        lines.pop();
    }

    lines.join("\n").trim().to_owned()
}

// ── Session ──────────────────────────────────────────────────────────

/// An open Telnet connection to one modem.
///
/// Close explicitly with [`close()`](Self::close). Dropping an open session
/// aborts the socket, so error paths never leak connections.
pub struct TelnetSession {
    peer: String,
    stream: Option<TcpStream>,
    filter: NegotiationFilter,
    config: TelnetConfig,
}

impl TelnetSession {
    /// Connect to `host`, authenticate if credentials are configured,
    /// and wait for the first prompt.
    pub async fn connect(host: &str, config: TelnetConfig) -> Result<Self, Error> {
        let peer = format!("{host}:{}", config.port);
        debug!(%peer, "opening telnet session");

        let stream = tokio::time::timeout(
            config.connect_timeout,
            TcpStream::connect((host, config.port)),
        )
        .await
        .map_err(|_| Error::Timeout {
            timeout_secs: config.connect_timeout.as_secs(),
        })?
        .map_err(|source| Error::Io {
            peer: peer.clone(),
            source,
        })?;

        let mut session = Self {
            peer,
            stream: Some(stream),
            filter: NegotiationFilter::default(),
            config,
        };
        session.login().await?;
        Ok(session)
    }

    /// `host:port` of the device.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Answer login prompts until the CLI prompt appears.
    ///
    /// Credentials are only sent when the device asks for them. A prompt
    /// repeated after it was answered, or a dropped or silent connection
    /// once the password went out, is a rejected login.
    async fn login(&mut self) -> Result<(), Error> {
        let mut sent_username = false;
        let mut sent_password = false;

        loop {
            let text = match self.read_until(|t| login_stage(t).is_some()).await {
                Err(Error::SessionClosed { .. } | Error::Timeout { .. }) if sent_password => {
                    return Err(self.login_rejected());
                }
                other => other?,
            };

            match login_stage(&text) {
                Some(LoginStage::Username) => {
                    if sent_username {
                        return Err(self.login_rejected());
                    }
                    let Some(user) = self.config.username.clone() else {
                        let peer = &self.peer;
                        return Err(Error::Authentication {
                            message: format!("{peer} asks for a username but none is configured"),
                        });
                    };
                    self.write_line(&user).await?;
                    sent_username = true;
                }
                Some(LoginStage::Password) => {
                    if sent_password {
                        return Err(self.login_rejected());
                    }
                    let password = self.config.password.clone();
                    let secret = password.as_ref().map_or("", |p| p.expose_secret());
                    self.write_line(secret).await?;
                    sent_password = true;
                }
                Some(LoginStage::Ready) | None => break,
            }
        }

        debug!(peer = %self.peer, authenticated = sent_password, "telnet session ready");
        Ok(())
    }

    fn login_rejected(&self) -> Error {
        Error::Authentication {
            message: format!("telnet login to {} rejected", self.peer),
        }
    }

    /// Send one command and return its cleaned reply.
    ///
    /// Replies containing a failure sentinel are returned as
    /// [`Error::DeviceReply`].
    pub async fn command(&mut self, command: &str) -> Result<String, Error> {
        trace!(peer = %self.peer, command, "telnet command");
        self.write_line(command).await?;
        let raw = self.read_until(ends_with_prompt).await?;
        let reply = clean_reply(&raw, command);

        if let Some(sentinel) = self
            .config
            .failure_sentinels
            .iter()
            .find(|s| reply.contains(s.as_str()))
        {
            warn!(peer = %self.peer, command, sentinel = %sentinel, "device reported failure");
            return Err(Error::DeviceReply {
                peer: self.peer.clone(),
                command: command.to_owned(),
                reply,
            });
        }

        Ok(reply)
    }

    /// Run commands in order, stopping at the first failure.
    pub async fn run_script(&mut self, commands: &[String]) -> Result<Vec<String>, Error> {
        let mut replies = Vec::with_capacity(commands.len());
        for cmd in commands {
            replies.push(self.command(cmd).await?);
        }
        Ok(replies)
    }

    /// Send a command that makes the device drop the connection (e.g. reboot).
    ///
    /// The session is closed afterwards regardless of what the device sends.
    pub async fn command_and_disconnect(mut self, command: &str) -> Result<(), Error> {
        self.write_line(command).await?;
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
        debug!(peer = %self.peer, command, "session closed by command");
        Ok(())
    }

    /// Log out and close the socket.
    pub async fn close(mut self) -> Result<(), Error> {
        if self.stream.is_some() {
            let _ = self.write_line("exit").await;
        }
        if let Some(mut stream) = self.stream.take() {
            stream.shutdown().await.map_err(|source| Error::Io {
                peer: self.peer.clone(),
                source,
            })?;
        }
        debug!(peer = %self.peer, "telnet session closed");
        Ok(())
    }

    // ── Private I/O ──────────────────────────────────────────────────

    fn stream(&mut self) -> Result<&mut TcpStream, Error> {
        let peer = self.peer.clone();
        self.stream
            .as_mut()
            .ok_or(Error::SessionClosed { peer })
    }

    async fn write_line(&mut self, line: &str) -> Result<(), Error> {
        let peer = self.peer.clone();
        let stream = self.stream()?;
        stream
            .write_all(format!("{line}\r\n").as_bytes())
            .await
            .map_err(|source| Error::Io { peer, source })
    }

    /// Read until `done` accepts the accumulated text or the read timeout expires.
    async fn read_until(&mut self, done: impl Fn(&str) -> bool) -> Result<String, Error> {
        let timeout = self.config.read_timeout;
        let deadline = tokio::time::Instant::now() + timeout;
        let mut received = Vec::new();
        let mut buf = [0u8; 4096];

        loop {
            let peer = self.peer.clone();
            let stream = self.stream()?;
            let read = tokio::time::timeout_at(deadline, stream.read(&mut buf))
                .await
                .map_err(|_| Error::Timeout {
                    timeout_secs: timeout.as_secs(),
                })?
                .map_err(|source| Error::Io {
                    peer: peer.clone(),
                    source,
                })?;

            if read == 0 {
                self.stream = None;
                return Err(Error::SessionClosed { peer });
            }

            let chunk = buf.get(..read).unwrap_or_default();
            let (data, replies) = self.filter.feed(chunk);
            if !replies.is_empty() {
                let stream = self.stream()?;
                stream
                    .write_all(&replies)
                    .await
                    .map_err(|source| Error::Io {
                        peer: peer.clone(),
                        source,
                    })?;
            }
            received.extend_from_slice(&data);

            // Decoded from the whole buffer so characters split across
            // reads come out intact.
            let text = String::from_utf8_lossy(&received);
            if done(&text) {
                return Ok(text.into_owned());
            }
        }
    }
}

impl Drop for TelnetSession {
    fn drop(&mut self) {
        if self.stream.take().is_some() {
            debug!(peer = %self.peer, "telnet session dropped without close; socket aborted");
        }
    }
}
