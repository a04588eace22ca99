//! Integration tests for channel membership, topics, keys and messaging.

mod common;

use common::{TestClient, TestServer};

#[tokio::test]
async fn test_join_burst_and_names() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let server = TestServer::spawn(17701, dir.path(), None).await?;

    let mut apa = TestClient::connect(&server.address()).await?;
    apa.register("apa").await?;
    apa.send("JOIN #fisk").await?;

    assert_eq!(apa.recv().await?, ":apa!apa@127.0.0.1 JOIN #fisk");
    assert_eq!(
        apa.recv().await?,
        ":test.server 331 apa #fisk :No topic is set"
    );
    assert_eq!(apa.recv().await?, ":test.server 353 apa = #fisk :apa");
    assert_eq!(
        apa.recv().await?,
        ":test.server 366 apa #fisk :End of NAMES list"
    );

    // A second member sees the join and gets a sorted member list.
    let mut lemur = TestClient::connect(&server.address()).await?;
    lemur.register("lemur").await?;
    lemur.send("JOIN #fisk").await?;
    assert_eq!(
        apa.recv_until("JOIN").await?,
        ":lemur!lemur@127.0.0.1 JOIN #fisk"
    );
    assert_eq!(
        lemur.recv_until(" 353 ").await?,
        ":test.server 353 lemur = #fisk :apa lemur"
    );
    Ok(())
}

#[tokio::test]
async fn test_privmsg_routing() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let server = TestServer::spawn(17702, dir.path(), None).await?;

    let mut apa = TestClient::connect(&server.address()).await?;
    let mut lemur = TestClient::connect(&server.address()).await?;
    apa.register_and_join("apa", "#fisk").await?;
    lemur.register_and_join("lemur", "#fisk").await?;
    apa.recv_until("JOIN #fisk").await?;

    // Channel message: relayed to the other member, never echoed back.
    apa.send("PRIVMSG #fisk :hello over there").await?;
    assert_eq!(
        lemur.recv_until("PRIVMSG").await?,
        ":apa!apa@127.0.0.1 PRIVMSG #fisk :hello over there"
    );
    apa.assert_silent("hello over there").await?;

    // Direct message by nick.
    lemur.send("PRIVMSG apa :hello back").await?;
    assert_eq!(
        apa.recv_until("PRIVMSG").await?,
        ":lemur!lemur@127.0.0.1 PRIVMSG apa :hello back"
    );

    // Unknown target.
    apa.send("PRIVMSG ghost :anyone home").await?;
    assert_eq!(
        apa.recv().await?,
        ":test.server 401 apa ghost :No such nick/channel"
    );

    // Missing text.
    apa.send("PRIVMSG #fisk").await?;
    assert_eq!(apa.recv().await?, ":test.server 412 apa :No text to send");
    Ok(())
}

#[tokio::test]
async fn test_away_interception() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let server = TestServer::spawn(17703, dir.path(), None).await?;

    let mut apa = TestClient::connect(&server.address()).await?;
    let mut lemur = TestClient::connect(&server.address()).await?;
    apa.register("apa").await?;
    lemur.register("lemur").await?;

    lemur.send("AWAY :gone fishing").await?;
    assert_eq!(
        lemur.recv().await?,
        ":test.server 306 lemur :You have been marked as being away"
    );

    // PRIVMSG to an away user is delivered, preceded by 301 to the sender.
    apa.send("PRIVMSG lemur :you there").await?;
    assert_eq!(
        apa.recv().await?,
        ":test.server 301 apa lemur :gone fishing"
    );
    assert_eq!(
        lemur.recv_until("PRIVMSG").await?,
        ":apa!apa@127.0.0.1 PRIVMSG lemur :you there"
    );

    // NOTICE gets the same courtesy reply.
    apa.send("NOTICE lemur :still there").await?;
    assert_eq!(
        apa.recv().await?,
        ":test.server 301 apa lemur :gone fishing"
    );
    assert_eq!(
        lemur.recv_until("NOTICE").await?,
        ":apa!apa@127.0.0.1 NOTICE lemur :still there"
    );

    lemur.send("AWAY").await?;
    assert_eq!(
        lemur.recv().await?,
        ":test.server 305 lemur :You are no longer marked as being away"
    );
    Ok(())
}

#[tokio::test]
async fn test_topic_set_and_query() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let server = TestServer::spawn(17704, dir.path(), None).await?;

    let mut apa = TestClient::connect(&server.address()).await?;
    let mut lemur = TestClient::connect(&server.address()).await?;
    apa.register_and_join("apa", "#fisk").await?;
    lemur.register_and_join("lemur", "#fisk").await?;
    apa.recv_until("JOIN #fisk").await?;

    apa.send("TOPIC #fisk :fish of the day").await?;
    assert_eq!(
        apa.recv_until("TOPIC").await?,
        ":apa!apa@127.0.0.1 TOPIC #fisk :fish of the day"
    );
    assert_eq!(
        lemur.recv_until("TOPIC").await?,
        ":apa!apa@127.0.0.1 TOPIC #fisk :fish of the day"
    );

    lemur.send("TOPIC #fisk").await?;
    assert_eq!(
        lemur.recv().await?,
        ":test.server 332 lemur #fisk :fish of the day"
    );

    // Reading a topic requires membership.
    let mut outsider = TestClient::connect(&server.address()).await?;
    outsider.register("gnu").await?;
    outsider.send("TOPIC #fisk").await?;
    assert_eq!(
        outsider.recv().await?,
        ":test.server 442 #fisk :You're not on that channel"
    );
    Ok(())
}

#[tokio::test]
async fn test_channel_key() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let server = TestServer::spawn(17705, dir.path(), None).await?;

    let mut apa = TestClient::connect(&server.address()).await?;
    apa.register_and_join("apa", "#fisk").await?;

    apa.send("MODE #fisk +k nors").await?;
    assert_eq!(
        apa.recv_until("MODE").await?,
        ":apa!apa@127.0.0.1 MODE #fisk +k nors"
    );

    let mut lemur = TestClient::connect(&server.address()).await?;
    lemur.register("lemur").await?;
    lemur.send("JOIN #fisk").await?;
    assert_eq!(
        lemur.recv().await?,
        ":test.server 475 lemur #fisk :Cannot join channel (+k) - bad key"
    );

    // Non-members see that a key exists but not its value.
    lemur.send("MODE #fisk").await?;
    assert_eq!(lemur.recv().await?, ":test.server 324 lemur #fisk +k");

    lemur.send("JOIN #fisk nors").await?;
    lemur.recv_until("End of NAMES list").await?;

    // Members see the key value.
    lemur.send("MODE #fisk").await?;
    assert_eq!(lemur.recv().await?, ":test.server 324 lemur #fisk +k nors");

    lemur.send("MODE #fisk -k").await?;
    assert_eq!(
        lemur.recv_until("MODE").await?,
        ":lemur!lemur@127.0.0.1 MODE #fisk -k"
    );
    Ok(())
}

#[tokio::test]
async fn test_part_and_channel_disappearance() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let server = TestServer::spawn(17706, dir.path(), None).await?;

    let mut apa = TestClient::connect(&server.address()).await?;
    let mut lemur = TestClient::connect(&server.address()).await?;
    apa.register_and_join("apa", "#fisk").await?;
    lemur.register_and_join("lemur", "#fisk").await?;
    apa.recv_until("JOIN #fisk").await?;

    apa.send("PART #fisk :going away").await?;
    assert_eq!(
        apa.recv_until("PART").await?,
        ":apa!apa@127.0.0.1 PART #fisk :going away"
    );
    assert_eq!(
        lemur.recv_until("PART").await?,
        ":apa!apa@127.0.0.1 PART #fisk :going away"
    );

    // Parting a channel twice is an error.
    apa.send("PART #fisk").await?;
    assert_eq!(
        apa.recv().await?,
        ":test.server 442 apa #fisk :You're not on that channel"
    );

    // When the last member leaves, the channel is gone from LIST.
    lemur.send("PART #fisk :me too").await?;
    lemur.recv_until("PART").await?;
    lemur.send("LIST").await?;
    assert_eq!(lemur.recv().await?, ":test.server 323 lemur :End of LIST");
    Ok(())
}

#[tokio::test]
async fn test_list_and_queries() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let server = TestServer::spawn(17707, dir.path(), None).await?;

    let mut apa = TestClient::connect(&server.address()).await?;
    let mut lemur = TestClient::connect(&server.address()).await?;
    apa.register_and_join("apa", "#fisk").await?;
    lemur.register_and_join("lemur", "#fisk").await?;
    apa.recv_until("JOIN #fisk").await?;
    lemur.send("JOIN #nors").await?;
    lemur.recv_until("End of NAMES list").await?;

    apa.send("LIST").await?;
    assert_eq!(apa.recv().await?, ":test.server 322 apa #fisk 2 :");
    assert_eq!(apa.recv().await?, ":test.server 322 apa #nors 1 :");
    assert_eq!(apa.recv().await?, ":test.server 323 apa :End of LIST");

    apa.send("WHO #fisk").await?;
    assert_eq!(
        apa.recv().await?,
        ":test.server 352 apa #fisk apa 127.0.0.1 test.server apa H :0 apa realname"
    );
    assert_eq!(
        apa.recv().await?,
        ":test.server 352 apa #fisk lemur 127.0.0.1 test.server lemur H :0 lemur realname"
    );
    assert_eq!(
        apa.recv().await?,
        ":test.server 315 apa #fisk :End of WHO list"
    );

    apa.send("WHOIS lemur").await?;
    assert_eq!(
        apa.recv().await?,
        ":test.server 311 apa lemur lemur 127.0.0.1 * :lemur realname"
    );
    assert_eq!(
        apa.recv().await?,
        ":test.server 312 apa lemur test.server :test.server"
    );
    assert_eq!(
        apa.recv().await?,
        ":test.server 319 apa lemur :#fisk #nors"
    );
    assert_eq!(
        apa.recv().await?,
        ":test.server 318 apa lemur :End of WHOIS list"
    );

    // The single online nick still arrives as a trailing parameter.
    apa.send("ISON lemur ghost").await?;
    assert_eq!(apa.recv().await?, ":test.server 303 apa :lemur");
    Ok(())
}

#[tokio::test]
async fn test_join_zero_parts_everything() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let server = TestServer::spawn(17708, dir.path(), None).await?;

    let mut apa = TestClient::connect(&server.address()).await?;
    let mut lemur = TestClient::connect(&server.address()).await?;
    apa.register_and_join("apa", "#fisk").await?;
    apa.send("JOIN #nors").await?;
    apa.recv_until("End of NAMES list").await?;
    lemur.register_and_join("lemur", "#fisk").await?;
    apa.recv_until("JOIN #fisk").await?;

    apa.send("JOIN 0").await?;
    assert_eq!(apa.recv().await?, ":apa!apa@127.0.0.1 PART #fisk");
    assert_eq!(apa.recv().await?, ":apa!apa@127.0.0.1 PART #nors");
    assert_eq!(
        lemur.recv_until("PART").await?,
        ":apa!apa@127.0.0.1 PART #fisk"
    );

    // No longer a member afterwards.
    apa.send("TOPIC #fisk").await?;
    assert_eq!(
        apa.recv().await?,
        ":test.server 442 #fisk :You're not on that channel"
    );
    Ok(())
}

#[tokio::test]
async fn test_case_insensitive_names() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let server = TestServer::spawn(17709, dir.path(), None).await?;

    let mut apa = TestClient::connect(&server.address()).await?;
    let mut lemur = TestClient::connect(&server.address()).await?;
    apa.register_and_join("apa", "#Fisk").await?;
    lemur.register("lemur").await?;

    // Same channel under protocol folding, including []\~ vs {}|^.
    lemur.send("JOIN #FISK").await?;
    assert_eq!(
        apa.recv_until("JOIN").await?,
        ":lemur!lemur@127.0.0.1 JOIN #FISK"
    );

    // Nick lookup folds as well.
    apa.send("PRIVMSG LEMUR :hi there").await?;
    assert_eq!(
        lemur.recv_until("PRIVMSG").await?,
        ":apa!apa@127.0.0.1 PRIVMSG LEMUR :hi there"
    );

    // WHOIS reports the channel's display name, not the folded key.
    lemur.send("WHOIS apa").await?;
    assert_eq!(
        lemur.recv_until(" 319 ").await?,
        ":test.server 319 lemur apa :#Fisk"
    );
    Ok(())
}

#[tokio::test]
async fn test_rejected_key_join_leaves_no_channel() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let server = TestServer::spawn(17710, dir.path(), None).await?;

    // Set a key, then leave so the channel only survives on disk.
    let mut apa = TestClient::connect(&server.address()).await?;
    apa.register_and_join("apa", "#nors").await?;
    apa.send("MODE #nors +k hemlig").await?;
    apa.recv_until("MODE").await?;
    apa.send("PART #nors").await?;
    apa.recv_until("PART").await?;

    // A keyless join revives the persisted key, gets rejected, and must
    // not leave an empty channel behind.
    let mut lemur = TestClient::connect(&server.address()).await?;
    lemur.register("lemur").await?;
    lemur.send("JOIN #nors").await?;
    assert_eq!(
        lemur.recv().await?,
        ":test.server 475 lemur #nors :Cannot join channel (+k) - bad key"
    );
    lemur.send("LIST").await?;
    assert_eq!(lemur.recv().await?, ":test.server 323 lemur :End of LIST");

    // The right key still works, with the persisted state intact.
    lemur.send("JOIN #nors hemlig").await?;
    lemur.recv_until("End of NAMES list").await?;
    lemur.send("MODE #nors").await?;
    assert_eq!(lemur.recv().await?, ":test.server 324 lemur #nors +k hemlig");
    Ok(())
}
