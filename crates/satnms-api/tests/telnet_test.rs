#![allow(clippy::unwrap_used)]
// Integration tests for `TelnetSession` against a scripted fake modem.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use satnms_api::{Error, TelnetConfig, TelnetSession};

const PROMPT: &str = "UHP-200#";

/// Spawn a fake CLI that greets, optionally asks for credentials, then
/// answers each line from `reply_for`. Every received line is forwarded
/// on the returned channel.
async fn fake_modem(
    login: Option<(&'static str, &'static str)>,
    reply_for: fn(&str) -> String,
) -> (u16, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let (read_half, mut write_half) = socket.into_split();
        let mut lines = BufReader::new(read_half);

        // Option negotiation the client must refuse.
        write_half.write_all(&[255, 251, 1, 255, 253, 24]).await.unwrap();

        if let Some((user, pass)) = login {
            write_half.write_all(b"UHP login\r\nUsername: ").await.unwrap();
            let got_user = next_line(&mut lines).await;
            write_half.write_all(b"Password: ").await.unwrap();
            let got_pass = next_line(&mut lines).await;
            if got_user != user || got_pass != pass {
                // Re-prompt the way the modem does, then wait for the
                // client to give up.
                write_half
                    .write_all(b"\r\nAccess denied\r\nUsername: ")
                    .await
                    .unwrap();
                let _ = read_line(&mut lines).await;
                return;
            }
        }

        write_half
            .write_all(format!("\r\n{PROMPT}").as_bytes())
            .await
            .unwrap();

        loop {
            let Some(line) = read_line(&mut lines).await else {
                break;
            };
            if line.is_empty() {
                continue;
            }
            let _ = tx.send(line.clone());
            if line == "exit" {
                break;
            }
            let reply = reply_for(&line);
            let out = format!("{line}\r\n{reply}\r\n{PROMPT}");
            if write_half.write_all(out.as_bytes()).await.is_err() {
                break;
            }
        }
    });

    (port, rx)
}

async fn next_line(reader: &mut BufReader<OwnedReadHalf>) -> String {
    read_line(reader).await.unwrap()
}

/// Read one line as raw bytes. The client's WONT/DONT replies arrive inline
/// ahead of the first line, so non-printable bytes are dropped.
async fn read_line(reader: &mut BufReader<OwnedReadHalf>) -> Option<String> {
    let mut raw = Vec::new();
    let n = reader.read_until(b'\n', &mut raw).await.ok()?;
    if n == 0 {
        return None;
    }
    Some(
        raw.iter()
            .filter(|b| b.is_ascii_graphic() || **b == b' ')
            .map(|b| char::from(*b))
            .collect::<String>()
            .trim()
            .to_owned(),
    )
}

fn config(port: u16) -> TelnetConfig {
    TelnetConfig {
        port,
        connect_timeout: Duration::from_secs(2),
        read_timeout: Duration::from_secs(2),
        ..TelnetConfig::default()
    }
}

fn echo_reply(line: &str) -> String {
    match line {
        "sh stat" => "Demodulator: locked\r\nTx: on".into(),
        "bogus" => "Unknown command".into(),
        _ => "OK".into(),
    }
}

// ── Session tests ───────────────────────────────────────────────────

#[tokio::test]
async fn test_command_returns_clean_reply() {
    let (port, mut rx) = fake_modem(None, echo_reply).await;
    let mut session = TelnetSession::connect("127.0.0.1", config(port)).await.unwrap();

    let reply = session.command("sh stat").await.unwrap();
    assert_eq!(reply, "Demodulator: locked\nTx: on");

    session.close().await.unwrap();
    assert_eq!(rx.recv().await.unwrap(), "sh stat");
    assert_eq!(rx.recv().await.unwrap(), "exit");
}

#[tokio::test]
async fn test_login_with_credentials() {
    let (port, _rx) = fake_modem(Some(("admin", "uhp")), echo_reply).await;
    let cfg = TelnetConfig {
        username: Some("admin".into()),
        password: Some("uhp".to_string().into()),
        ..config(port)
    };

    let mut session = TelnetSession::connect("127.0.0.1", cfg).await.unwrap();
    assert_eq!(session.command("pro 1 run").await.unwrap(), "OK");
}

#[tokio::test]
async fn test_login_rejected() {
    let (port, _rx) = fake_modem(Some(("admin", "uhp")), echo_reply).await;
    let cfg = TelnetConfig {
        username: Some("admin".into()),
        password: Some("wrong".to_string().into()),
        ..config(port)
    };

    let result = TelnetSession::connect("127.0.0.1", cfg).await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected login rejection, got: {:?}",
        result.err()
    );
}

#[tokio::test]
async fn test_credentials_not_sent_without_login_prompt() {
    let (port, mut rx) = fake_modem(None, echo_reply).await;
    let cfg = TelnetConfig {
        username: Some("admin".into()),
        password: Some("uhp".to_string().into()),
        ..config(port)
    };

    let mut session = TelnetSession::connect("127.0.0.1", cfg).await.unwrap();
    assert_eq!(session.command("pro 1 run").await.unwrap(), "OK");
    assert_eq!(rx.recv().await.unwrap(), "pro 1 run");
}

#[tokio::test]
async fn test_multibyte_reply_split_across_reads() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let reply = "Станция";
    let bytes = reply.as_bytes();

    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let (read_half, mut write_half) = socket.into_split();
        let mut lines = BufReader::new(read_half);
        write_half.write_all(PROMPT.as_bytes()).await.unwrap();

        let command = next_line(&mut lines).await;
        // Cut the reply inside its second character.
        let mut first = format!("{command}\r\n").into_bytes();
        first.extend_from_slice(&bytes[..3]);
        write_half.write_all(&first).await.unwrap();
        write_half.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let mut rest = bytes[3..].to_vec();
        rest.extend_from_slice(format!("\r\n{PROMPT}").as_bytes());
        write_half.write_all(&rest).await.unwrap();
        let _ = read_line(&mut lines).await;
    });

    let mut session = TelnetSession::connect("127.0.0.1", config(port)).await.unwrap();
    assert_eq!(session.command("sh name").await.unwrap(), reply);
}

#[tokio::test]
async fn test_failure_sentinel_is_device_reply_error() {
    let (port, _rx) = fake_modem(None, echo_reply).await;
    let mut session = TelnetSession::connect("127.0.0.1", config(port)).await.unwrap();

    match session.command("bogus").await {
        Err(Error::DeviceReply { command, reply, .. }) => {
            assert_eq!(command, "bogus");
            assert!(reply.contains("Unknown command"));
        }
        other => panic!("expected DeviceReply, got: {other:?}"),
    }

    // The session stays usable after an in-band failure.
    assert_eq!(session.command("pro 1 run").await.unwrap(), "OK");
}

#[tokio::test]
async fn test_run_script_in_order() {
    let (port, mut rx) = fake_modem(None, echo_reply).await;
    let mut session = TelnetSession::connect("127.0.0.1", config(port)).await.unwrap();

    let script = vec!["pro 1 type manual".to_owned(), "pro 1 run".to_owned()];
    let replies = session.run_script(&script).await.unwrap();
    assert_eq!(replies, vec!["OK", "OK"]);

    assert_eq!(rx.recv().await.unwrap(), "pro 1 type manual");
    assert_eq!(rx.recv().await.unwrap(), "pro 1 run");
}

#[tokio::test]
async fn test_connection_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let result = TelnetSession::connect("127.0.0.1", config(port)).await;
    assert!(matches!(result, Err(Error::Io { .. })));
}
