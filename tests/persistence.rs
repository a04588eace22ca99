//! Integration tests for channel state persistence across restarts.

mod common;

use common::{TestClient, TestServer};

#[tokio::test]
async fn test_topic_and_key_survive_restart() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let port = 17801;

    {
        let server = TestServer::spawn(port, dir.path(), None).await?;
        let mut apa = TestClient::connect(&server.address()).await?;
        apa.register_and_join("apa", "#fisk").await?;

        apa.send("TOPIC #fisk :fish of the day").await?;
        apa.recv_until("TOPIC").await?;
        apa.send("MODE #fisk +k nors").await?;
        apa.recv_until("MODE").await?;

        apa.send("QUIT :done").await?;
        apa.recv_until("ERROR").await?;
        // Server is killed when it goes out of scope.
    }

    let server = TestServer::spawn(port, dir.path(), None).await?;
    let mut lemur = TestClient::connect(&server.address()).await?;
    lemur.register("lemur").await?;

    // The key set in the previous incarnation still guards the channel.
    lemur.send("JOIN #fisk").await?;
    assert_eq!(
        lemur.recv().await?,
        ":test.server 475 lemur #fisk :Cannot join channel (+k) - bad key"
    );

    lemur.send("JOIN #fisk nors").await?;
    lemur.recv_until("JOIN").await?;
    assert_eq!(
        lemur.recv_until(" 332 ").await?,
        ":test.server 332 lemur #fisk :fish of the day"
    );
    Ok(())
}
