//! Integration tests for the idle PING and timeout behavior, with the
//! timers shortened through the config.

mod common;

use common::{TestClient, TestServer};

const FAST_LIMITS: &str = r#"
[limits]
ping_after_secs = 1
idle_timeout_secs = 3
sweep_interval_secs = 1
"#;

#[tokio::test]
async fn test_idle_registered_client_is_pinged_then_dropped() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let server = TestServer::spawn_with_config(17901, dir.path(), None, FAST_LIMITS).await?;

    let mut apa = TestClient::connect(&server.address()).await?;
    apa.register("apa").await?;

    // Going quiet draws a PING; answering it resets the clock.
    assert_eq!(apa.recv_until("PING").await?, "PING :test.server");
    apa.send("PONG :test.server").await?;

    // Going quiet again: another PING, then the timeout.
    assert_eq!(apa.recv_until("PING").await?, "PING :test.server");
    assert_eq!(apa.recv_until("ERROR").await?, "ERROR :ping timeout");
    Ok(())
}

#[tokio::test]
async fn test_idle_unregistered_client_is_dropped_without_ping() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let server = TestServer::spawn_with_config(17902, dir.path(), None, FAST_LIMITS).await?;

    let mut quiet = TestClient::connect(&server.address()).await?;
    quiet.send("NICK apa").await?;

    // No grace PING before registration: the first line is the goodbye.
    assert_eq!(quiet.recv().await?, "ERROR :ping timeout");
    Ok(())
}
