use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures_util::{SinkExt, StreamExt};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

#[derive(Parser)]
#[command(name = "courier-test-app")]
#[command(about = "A smoke-test client for the Courier gateway")]
#[command(version = "1.0")]
struct Cli {
    #[arg(long, default_value = "http://localhost:7700")]
    server_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the gateway health endpoint
    Health,
    /// Connect and print incoming events until interrupted
    Listen {
        #[arg(long)]
        token: String,
    },
    /// Send a message to a room and wait for the fan-out echo
    SendMessage {
        #[arg(long)]
        token: String,
        #[arg(long)]
        room_id: String,
        #[arg(long)]
        text: String,
    },
    /// Exercise a two-party conversation end to end
    TestConversation {
        #[arg(long)]
        sender_token: String,
        #[arg(long)]
        receiver_token: String,
        #[arg(long)]
        room_id: String,
        #[arg(long, default_value_t = 3)]
        messages: u32,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserSummary {
    id: String,
    display_name: Option<String>,
}

struct GatewayClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    user_id: String,
}

impl GatewayClient {
    async fn connect(server_url: &str, token: &str) -> Result<Self> {
        let url = format!("{}/ws?token={}", ws_base(server_url), token);
        let (mut stream, _) = connect_async(&url)
            .await
            .context("failed to connect to gateway")?;

        let hello = next_event(&mut stream).await.context("awaiting hello")?;
        if hello["type"] != "hello" {
            anyhow::bail!("expected hello event, got: {hello}");
        }
        let user: UserSummary =
            serde_json::from_value(hello["user"].clone()).context("failed to parse hello user")?;
        println!(
            "Connected as {} ({})",
            user.display_name.as_deref().unwrap_or("unnamed"),
            user.id
        );

        Ok(Self {
            stream,
            user_id: user.id,
        })
    }

    async fn send(&mut self, event: Value) -> Result<()> {
        self.stream
            .send(Message::Text(event.to_string()))
            .await
            .context("failed to send event")
    }

    async fn recv(&mut self) -> Result<Value> {
        next_event(&mut self.stream).await
    }

    async fn recv_expect(&mut self, event_type: &str) -> Result<Value> {
        let event = tokio::time::timeout(Duration::from_secs(10), self.recv())
            .await
            .with_context(|| format!("timed out waiting for {event_type} event"))??;
        if event["type"] != event_type {
            anyhow::bail!("expected {event_type} event, got: {event}");
        }
        Ok(event)
    }
}

fn ws_base(server_url: &str) -> String {
    if let Some(rest) = server_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = server_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        format!("ws://{server_url}")
    }
}

async fn next_event(stream: &mut WebSocketStream<MaybeTlsStream<TcpStream>>) -> Result<Value> {
    loop {
        let message = stream
            .next()
            .await
            .context("gateway closed the connection")?
            .context("websocket receive error")?;
        match message {
            Message::Text(text) => {
                return serde_json::from_str(&text).context("failed to parse gateway event")
            }
            Message::Close(_) => anyhow::bail!("gateway closed the connection"),
            _ => continue,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    println!("Courier Gateway Test App");
    println!("========================");

    match cli.command {
        Commands::Health => check_health(&cli.server_url).await,
        Commands::Listen { token } => listen(&cli.server_url, &token).await,
        Commands::SendMessage {
            token,
            room_id,
            text,
        } => send_message(&cli.server_url, &token, &room_id, &text).await,
        Commands::TestConversation {
            sender_token,
            receiver_token,
            room_id,
            messages,
        } => {
            test_conversation(
                &cli.server_url,
                &sender_token,
                &receiver_token,
                &room_id,
                messages,
            )
            .await
        }
    }
}

async fn check_health(server_url: &str) -> Result<()> {
    println!("Checking {server_url}/health");

    let client = Client::new();
    let response = client
        .get(format!("{server_url}/health"))
        .send()
        .await
        .context("health request failed")?;

    if response.status() != StatusCode::OK {
        anyhow::bail!("unexpected health status: {}", response.status());
    }

    let body: Value = response
        .json()
        .await
        .context("failed to parse health body")?;
    println!(
        "Gateway healthy at {}",
        body["timestamp"].as_str().unwrap_or("unknown time")
    );
    Ok(())
}

async fn listen(server_url: &str, token: &str) -> Result<()> {
    let mut client = GatewayClient::connect(server_url, token).await?;

    println!("Listening for events (Ctrl+C to stop)...");
    loop {
        let event = client.recv().await?;
        println!("{}", serde_json::to_string_pretty(&event)?);
    }
}

async fn send_message(server_url: &str, token: &str, room_id: &str, text: &str) -> Result<()> {
    let mut client = GatewayClient::connect(server_url, token).await?;

    client
        .send(json!({ "type": "send-message", "roomId": room_id, "text": text }))
        .await?;

    // Senders are members of the rooms they post to, so the fan-out echo
    // doubles as the delivery receipt.
    let event = client.recv_expect("new-message").await?;
    println!(
        "Message accepted: {} at {}",
        event["message"]["id"].as_str().unwrap_or("unknown"),
        event["message"]["createdAt"].as_str().unwrap_or("unknown"),
    );
    Ok(())
}

async fn test_conversation(
    server_url: &str,
    sender_token: &str,
    receiver_token: &str,
    room_id: &str,
    count: u32,
) -> Result<()> {
    println!("Connecting both parties...");
    let mut receiver = GatewayClient::connect(server_url, receiver_token).await?;
    let mut sender = GatewayClient::connect(server_url, sender_token).await?;

    println!("Sender {} -> room {}", sender.user_id, room_id);

    sender
        .send(json!({ "type": "typing", "roomId": room_id, "isTyping": true }))
        .await?;
    let typing = receiver.recv_expect("user-typing").await?;
    println!(
        "Receiver saw typing from {}",
        typing["userId"].as_str().unwrap_or("unknown")
    );

    for index in 1..=count {
        let text = format!("smoke test message {index}");
        sender
            .send(json!({ "type": "send-message", "roomId": room_id, "text": text }))
            .await?;

        let event = receiver.recv_expect("new-message").await?;
        let received = event["message"]["text"].as_str().unwrap_or_default();
        if received != text {
            anyhow::bail!("message arrived out of order: expected '{text}', got '{received}'");
        }
        println!("Delivered: {received}");
    }

    sender
        .send(json!({ "type": "typing", "roomId": room_id, "isTyping": false }))
        .await?;
    receiver.recv_expect("user-typing").await?;

    receiver
        .send(json!({ "type": "fetch-messages", "roomId": room_id, "limit": count }))
        .await?;
    let history = receiver.recv_expect("messages").await?;
    let fetched = history["messages"]
        .as_array()
        .map(|messages| messages.len())
        .unwrap_or(0);
    println!("History confirms {fetched} messages");

    println!("Conversation test passed");
    Ok(())
}
