//! src/platforms/twitch_irc/client.rs

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter, split};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;

use tokio_native_tls::native_tls;
use tokio_native_tls::TlsConnector;
use tracing::{info, error, debug};

use crate::Error;
use crate::eventbus::ROLE_MODERATOR;
use crate::platforms::ChatSender;

const TWITCH_IRC_HOST: &str = "irc.chat.twitch.tv";
const TWITCH_IRC_TLS_PORT: u16 = 6697;

/// Twitch drops PRIVMSG bodies longer than this.
pub const TWITCH_MAX_MSG_LENGTH: usize = 500;

/// Minimal representation of a parsed IRC message from Twitch.
#[derive(Debug, Clone)]
pub struct ParsedTwitchMsg {
    pub tags: Option<String>,
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
    pub trailing: Option<String>,
}

impl ParsedTwitchMsg {
    pub fn parse_irc_line(line: &str) -> Self {
        let mut rest = line.trim();
        let mut tags = None;
        let mut prefix = None;
        let mut command = String::new();
        let mut params = Vec::new();
        let mut trailing = None;

        // 1) extract tags
        if rest.starts_with('@') {
            if let Some(space_pos) = rest.find(' ') {
                tags = Some(rest[..space_pos].to_string());
                rest = &rest[space_pos + 1..];
            } else {
                return Self {
                    tags: Some(rest.to_string()),
                    prefix: None,
                    command,
                    params,
                    trailing,
                };
            }
        }

        // 2) extract prefix
        if rest.starts_with(':') {
            if let Some(space_pos) = rest.find(' ') {
                prefix = Some(rest[..space_pos].trim_start_matches(':').to_string());
                rest = &rest[space_pos + 1..];
            } else {
                return Self {
                    tags,
                    prefix: Some(rest.trim_start_matches(':').to_string()),
                    command,
                    params,
                    trailing,
                };
            }
        }

        // 3) command
        let mut parts = rest.splitn(2, ' ');
        if let Some(cmd) = parts.next() {
            command = cmd.to_string();
        }
        rest = parts.next().unwrap_or("");

        // 4) trailing after " :" (or a leading ":" when there are no params)
        if let Some(stripped) = rest.strip_prefix(':') {
            trailing = Some(stripped.to_string());
        } else if let Some(idx) = rest.find(" :") {
            trailing = Some(rest[idx + 2..].to_string());
            let before = rest[..idx].trim();
            if !before.is_empty() {
                params.extend(before.split_whitespace().map(|s| s.to_string()));
            }
        } else {
            params.extend(rest.split_whitespace().map(|s| s.to_string()));
        }

        Self { tags, prefix, command, params, trailing }
    }

    /// Login part of a `nick!user@host` prefix.
    pub fn prefix_login(&self) -> Option<String> {
        let prefix = self.prefix.as_ref()?;
        let excl = prefix.find('!')?;
        Some(prefix[..excl].to_lowercase())
    }
}

/// Higher-level event from the IRC read loop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IrcIncomingEvent {
    pub command: String,
    pub channel: Option<String>,
    pub user_login: Option<String>,
    pub user_id: Option<String>,
    pub display_name: Option<String>,
    /// Badge names, plus `moderator` when the `mod=1` tag is set.
    pub roles: Vec<String>,
    pub text: Option<String>,
    pub raw_line: String,
}

impl IrcIncomingEvent {
    pub fn from_parsed(parsed: &ParsedTwitchMsg, raw_line: &str) -> Self {
        let command = parsed.command.to_uppercase();
        let mut evt = IrcIncomingEvent {
            command: command.clone(),
            raw_line: raw_line.to_string(),
            ..Default::default()
        };

        match command.as_str() {
            "PRIVMSG" => {
                evt.channel = parsed.params.first().cloned();
                evt.text = parsed.trailing.clone();
                evt.user_login = parsed.prefix_login();

                if let Some(ref t) = parsed.tags {
                    evt.user_id = extract_tag_value(t, "user-id").filter(|v| !v.is_empty());
                    evt.display_name = extract_tag_value(t, "display-name").filter(|v| !v.is_empty());
                    evt.roles = extract_roles(t);
                }
                if evt.display_name.is_none() {
                    evt.display_name = evt.user_login.clone();
                }
            }
            "JOIN" | "PART" => {
                evt.channel = parsed.params.first().cloned();
                evt.user_login = parsed.prefix_login();
            }
            _ => {}
        }
        evt
    }
}

/// Low-level IRC client that connects to Twitch via TLS.
pub struct TwitchIrcClient {
    /// For sending raw lines out:
    raw_outgoing: mpsc::UnboundedSender<String>,

    /// We store the incoming event channel as an **Option** so we can `take()` if needed.
    pub incoming: Option<mpsc::UnboundedReceiver<IrcIncomingEvent>>,

    read_task: JoinHandle<()>,
    write_task: JoinHandle<()>,
}

impl TwitchIrcClient {
    /// Tries to connect to `irc.chat.twitch.tv:6697` with TLS, does PASS/NICK,
    /// spawns read/write tasks, and returns a `TwitchIrcClient`.
    pub async fn connect(
        username: &str,
        oauth_token: &str,
    ) -> io::Result<Self> {
        // 1) raw TCP connect
        let tcp = TcpStream::connect((TWITCH_IRC_HOST, TWITCH_IRC_TLS_PORT))
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("TCP connect error: {e}")))?;

        // 2) TLS handshake
        let native_connector = native_tls::TlsConnector::new()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("TLSConnector::new() => {e}")))?;
        let connector = TlsConnector::from(native_connector);

        let tls_stream = connector.connect(TWITCH_IRC_HOST, tcp).await
            .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("TLS connect() => {e}")))?;

        let (read_half, write_half) = split(tls_stream);

        // 3) channels
        let (tx_outgoing, rx_outgoing) = mpsc::unbounded_channel::<String>();
        let (tx_incoming, rx_incoming) = mpsc::unbounded_channel::<IrcIncomingEvent>();

        // 4) spawn writer
        let write_task = tokio::spawn(Self::writer_loop(write_half, rx_outgoing));

        // send PASS/NICK/CAP:
        tx_outgoing.send(format!("PASS {}", oauth_token)).ok();
        tx_outgoing.send(format!("NICK {}", username.to_lowercase())).ok();
        tx_outgoing.send("CAP REQ :twitch.tv/commands twitch.tv/tags twitch.tv/membership".to_string()).ok();

        // 5) spawn reader
        let read_task = tokio::spawn(Self::reader_loop(
            read_half,
            tx_incoming,
            tx_outgoing.clone(),
        ));

        Ok(Self {
            raw_outgoing: tx_outgoing,
            incoming: Some(rx_incoming),
            read_task,
            write_task,
        })
    }

    async fn reader_loop<R>(
        read_half: R,
        tx_incoming: mpsc::UnboundedSender<IrcIncomingEvent>,
        tx_outgoing: mpsc::UnboundedSender<String>,
    )
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        let mut reader = BufReader::new(read_half);
        let mut line_buffer = String::new();

        loop {
            line_buffer.clear();
            match reader.read_line(&mut line_buffer).await {
                Ok(0) => {
                    info!("(TwitchIrcClient) read_loop => EOF");
                    break;
                }
                Ok(_) => {
                    let line = line_buffer.trim_end();
                    if line.is_empty() {
                        continue;
                    }
                    debug!("<< {}", line);

                    let parsed = ParsedTwitchMsg::parse_irc_line(line);

                    // respond to PING
                    if parsed.command.eq_ignore_ascii_case("PING") {
                        let trail = parsed.trailing.unwrap_or_else(|| "tmi.twitch.tv".to_string());
                        tx_outgoing.send(format!("PONG :{}", trail)).ok();
                        debug!("Auto PONG -> {}", trail);
                        continue;
                    }

                    let evt = IrcIncomingEvent::from_parsed(&parsed, line);
                    if tx_incoming.send(evt).is_err() {
                        debug!("(TwitchIrcClient) incoming receiver dropped");
                        break;
                    }
                }
                Err(e) => {
                    error!("(TwitchIrcClient) read error => {:?}", e);
                    break;
                }
            }
        }

        info!("(TwitchIrcClient) reader_loop ended.");
    }

    async fn writer_loop<W>(
        mut write_half: W,
        mut rx_outgoing: mpsc::UnboundedReceiver<String>,
    )
    where
        W: tokio::io::AsyncWrite + Unpin,
    {
        let mut writer = BufWriter::new(&mut write_half);

        while let Some(line) = rx_outgoing.recv().await {
            if line.starts_with("PASS ") {
                debug!(">> PASS ***");
            } else {
                debug!(">> {}", line);
            }
            if let Err(e) = writer.write_all(line.as_bytes()).await {
                error!("writer error => {:?}", e);
                break;
            }
            if let Err(e) = writer.write_all(b"\r\n").await {
                error!("writer error => {:?}", e);
                break;
            }
            if let Err(e) = writer.flush().await {
                error!("writer flush error => {:?}", e);
                break;
            }
        }

        info!("(TwitchIrcClient) writer_loop ended.");
    }

    /// A cloneable handle for sending lines from other tasks.
    pub fn sender(&self) -> TwitchIrcSender {
        TwitchIrcSender::new(self.raw_outgoing.clone())
    }

    /// The raw writer, for repointing an existing `TwitchIrcSender`.
    pub fn sender_handle(&self) -> mpsc::UnboundedSender<String> {
        self.raw_outgoing.clone()
    }

    pub fn join_channel(&self, channel: &str) {
        let _ = self.raw_outgoing.send(format!("JOIN {}", channel));
    }

    /// Aborts the read/write tasks by dropping channels and calling .abort().
    pub fn shutdown(self) {
        self.read_task.abort();
        self.write_task.abort();
    }
}

/// Outbound handle, detached from the client's lifetime. Clones share the
/// writer, which is swapped in place when the connection is re-established.
#[derive(Clone)]
pub struct TwitchIrcSender {
    raw_outgoing: Arc<RwLock<mpsc::UnboundedSender<String>>>,
}

impl TwitchIrcSender {
    pub fn new(raw_outgoing: mpsc::UnboundedSender<String>) -> Self {
        Self { raw_outgoing: Arc::new(RwLock::new(raw_outgoing)) }
    }

    /// Points every clone at a new connection's writer.
    pub async fn replace(&self, raw_outgoing: mpsc::UnboundedSender<String>) {
        *self.raw_outgoing.write().await = raw_outgoing;
    }

    pub async fn send_raw_line(&self, line: String) -> Result<(), Error> {
        self.raw_outgoing
            .read()
            .await
            .send(line)
            .map_err(|_| Error::Platform("Twitch IRC writer is closed".into()))
    }
}

#[async_trait]
impl ChatSender for TwitchIrcSender {
    async fn send_chat(&self, channel: &str, text: &str) -> Result<(), Error> {
        self.send_raw_line(format_privmsg(channel, text)).await
    }
}

/// Builds a PRIVMSG line. Line breaks are flattened and the body is cut to
/// Twitch's limit on a char boundary.
pub fn format_privmsg(channel: &str, message: &str) -> String {
    let flat = message.replace(['\r', '\n'], " ");
    let body: String = flat.chars().take(TWITCH_MAX_MSG_LENGTH).collect();
    format!("PRIVMSG {} :{}", channel, body)
}

/// Helper to extract `key=value` from a tag string like `@badge-info=;user-id=1234;...`
fn extract_tag_value(tag_str: &str, key: &str) -> Option<String> {
    let kvpairs = tag_str.trim_start_matches('@').split(';');
    for kv in kvpairs {
        let mut parts = kv.splitn(2, '=');
        let left = parts.next().unwrap_or("");
        let right = parts.next().unwrap_or("");
        if left == key {
            return Some(right.to_string());
        }
    }
    None
}

/// `badges=broadcaster/1,subscriber/12` -> ["broadcaster", "subscriber"]
fn extract_roles(tag_str: &str) -> Vec<String> {
    let mut roles: Vec<String> = extract_tag_value(tag_str, "badges")
        .unwrap_or_default()
        .split(',')
        .filter_map(|badge| badge.split('/').next())
        .filter(|name| !name.is_empty())
        .map(|name| name.to_lowercase())
        .collect();

    if extract_tag_value(tag_str, "mod").as_deref() == Some("1")
        && !roles.iter().any(|r| r == ROLE_MODERATOR)
    {
        roles.push(ROLE_MODERATOR.to_string());
    }
    roles
}
