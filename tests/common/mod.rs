//! Integration test infrastructure.
//!
//! Spawns tinyircd instances and drives them with raw line-based TCP
//! clients, so tests assert on the exact wire replies.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// A spawned server instance. The process is killed on drop.
pub struct TestServer {
    child: Child,
    port: u16,
}

#[allow(dead_code)]
impl TestServer {
    /// Spawn a server on `port` with state and logs under `data_dir`.
    pub async fn spawn(
        port: u16,
        data_dir: &Path,
        password: Option<&str>,
    ) -> anyhow::Result<Self> {
        Self::spawn_with_config(port, data_dir, password, "").await
    }

    /// Like `spawn`, with extra TOML sections appended to the config.
    pub async fn spawn_with_config(
        port: u16,
        data_dir: &Path,
        password: Option<&str>,
        extra: &str,
    ) -> anyhow::Result<Self> {
        let state_dir = data_dir.join("state");
        let log_dir = data_dir.join("log");
        let password_line = match password {
            Some(p) => format!("password = \"{p}\"\n"),
            None => String::new(),
        };
        let config = format!(
            r#"
[server]
name = "test.server"
{password_line}
[listen]
ports = [{port}]

[storage]
state_dir = "{}"
log_dir = "{}"

{extra}
"#,
            state_dir.display(),
            log_dir.display(),
        );
        let config_path = data_dir.join("config.toml");
        std::fs::write(&config_path, config)?;

        let binary = PathBuf::from(env!("CARGO_BIN_EXE_tinyircd"));
        let child = Command::new(binary)
            .arg(&config_path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        let server = Self { child, port };
        server.wait_ready().await?;
        Ok(server)
    }

    pub fn address(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }

    async fn wait_ready(&self) -> anyhow::Result<()> {
        for _ in 0..100 {
            if TcpStream::connect(self.address()).await.is_ok() {
                return Ok(());
            }
            sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server on port {} never became ready", self.port);
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// A raw line-oriented client connection.
pub struct TestClient {
    reader: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

#[allow(dead_code)]
impl TestClient {
    pub async fn connect(addr: &str) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let (read_half, writer) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half).lines(),
            writer,
        })
    }

    /// Send one raw line, CRLF appended.
    pub async fn send(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\r\n").await?;
        Ok(())
    }

    /// Receive the next line, with a timeout.
    pub async fn recv(&mut self) -> anyhow::Result<String> {
        let line = timeout(RECV_TIMEOUT, self.reader.next_line())
            .await??
            .ok_or_else(|| anyhow::anyhow!("connection closed"))?;
        Ok(line)
    }

    /// Read lines until one contains `needle`, returning that line.
    pub async fn recv_until(&mut self, needle: &str) -> anyhow::Result<String> {
        loop {
            let line = self.recv().await?;
            if line.contains(needle) {
                return Ok(line);
            }
        }
    }

    /// Assert that no line containing `needle` arrives within a short
    /// window.
    pub async fn assert_silent(&mut self, needle: &str) -> anyhow::Result<()> {
        let result = timeout(Duration::from_millis(300), async {
            loop {
                match self.reader.next_line().await {
                    Ok(Some(line)) if line.contains(needle) => break line,
                    Ok(Some(_)) => {}
                    // EOF or read error: nothing more will match, so wait
                    // out the window.
                    _ => std::future::pending::<()>().await,
                }
            }
        })
        .await;
        match result {
            Err(_) => Ok(()),
            Ok(line) => anyhow::bail!("unexpected line: {line}"),
        }
    }

    /// Register with `nick` and wait for the end of the welcome burst.
    pub async fn register(&mut self, nick: &str) -> anyhow::Result<()> {
        self.send(&format!("NICK {nick}")).await?;
        self.send(&format!("USER {nick} * * :{nick} realname"))
            .await?;
        // 422: no MOTD file is configured in test servers.
        self.recv_until(" 422 ").await?;
        Ok(())
    }

    /// Register and join one channel, draining the join burst.
    pub async fn register_and_join(&mut self, nick: &str, channel: &str) -> anyhow::Result<()> {
        self.register(nick).await?;
        self.send(&format!("JOIN {channel}")).await?;
        self.recv_until("End of NAMES list").await?;
        Ok(())
    }
}
