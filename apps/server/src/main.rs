use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use courier_config::{load as load_config, AppConfig};
use courier_gateway::create_router;
use courier_rooms::CreateRoomRequest;
use courier_runtime::{telemetry, BackendServices};
use courier_users::{CreateUserRequest, TokenVerifier};
use sqlx::Row;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tracing::info;

/// Validity of the bearer tokens the seed command prints.
const SEED_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Parser)]
#[command(name = "courier-backend")]
#[command(about = "Courier realtime messaging backend (serves by default)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server (default)
    Serve,
    /// Dump users, rooms, and messages from the database
    DumpData,
    /// Clear all data from the database
    ClearData,
    /// Seed demo users and a shared room, printing their tokens
    SeedData,
    /// Start interactive console
    Console,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server().await,
        Commands::DumpData => dump_data().await,
        Commands::ClearData => clear_data().await,
        Commands::SeedData => seed_data().await,
        Commands::Console => run_console().await,
    }
}

async fn run_server() -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    info!("starting Courier backend");

    let config = load_config().context("failed to load configuration")?;

    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    let app = create_router(services.gateway.clone());

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(courier_runtime::shutdown_signal())
        .await
        .context("http server error")?;

    info!("backend shut down");
    Ok(())
}

async fn dump_data() -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    info!("dumping users, rooms, and messages from database");

    let config = load_config().context("failed to load configuration")?;

    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    dump_tables(&services).await
}

async fn clear_data() -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    info!("clearing all data from database");

    let config = load_config().context("failed to load configuration")?;

    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    clear_tables(&services).await
}

async fn seed_data() -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    info!("seeding database with demo data");

    let config = load_config().context("failed to load configuration")?;

    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    seed_demo_data(&services, &config).await
}

async fn dump_tables(services: &BackendServices) -> anyhow::Result<()> {
    let users = sqlx::query(
        r#"
        SELECT id, public_id, email, display_name, is_online, last_active_at, created_at
        FROM users
        ORDER BY created_at ASC
        "#,
    )
    .fetch_all(&services.db_pool)
    .await
    .context("failed to fetch users")?;

    println!("=== USERS ===");
    if users.is_empty() {
        println!("No users found in database");
    } else {
        println!("Found {} users:", users.len());
        println!(
            "{:<5} {:<28} {:<28} {:<20} {:<8} {:<25}",
            "ID", "Public ID", "Email", "Display Name", "Online", "Last Active"
        );
        println!("{}", "-".repeat(120));

        for user in users {
            let id: i64 = user.get("id");
            let public_id: String = user.get("public_id");
            let email: Option<String> = user.get("email");
            let display_name: Option<String> = user.get("display_name");
            let is_online: bool = user.get("is_online");
            let last_active_at: Option<String> = user.get("last_active_at");

            println!(
                "{:<5} {:<28} {:<28} {:<20} {:<8} {:<25}",
                id,
                public_id,
                email.as_deref().unwrap_or("NULL"),
                display_name.as_deref().unwrap_or("NULL"),
                is_online,
                last_active_at.as_deref().unwrap_or("NULL"),
            );
        }
    }

    println!("\n=== ROOMS ===");
    let rooms = sqlx::query(
        r#"
        SELECT id, public_id, name, kind, created_by, last_message, last_message_at
        FROM rooms
        ORDER BY created_at ASC
        "#,
    )
    .fetch_all(&services.db_pool)
    .await
    .context("failed to fetch rooms")?;

    if rooms.is_empty() {
        println!("No rooms found in database");
    } else {
        println!("Found {} rooms:", rooms.len());
        println!(
            "{:<5} {:<28} {:<24} {:<8} {:<10} {:<32} {:<25}",
            "ID", "Public ID", "Name", "Kind", "Creator", "Last Message", "Last Message At"
        );
        println!("{}", "-".repeat(140));

        for room in rooms {
            let id: i64 = room.get("id");
            let public_id: String = room.get("public_id");
            let name: String = room.get("name");
            let kind: String = room.get("kind");
            let created_by: i64 = room.get("created_by");
            let last_message: Option<String> = room.get("last_message");
            let last_message_at: Option<String> = room.get("last_message_at");

            println!(
                "{:<5} {:<28} {:<24} {:<8} {:<10} {:<32} {:<25}",
                id,
                public_id,
                name,
                kind,
                created_by,
                last_message.as_deref().unwrap_or("NULL"),
                last_message_at.as_deref().unwrap_or("NULL"),
            );
        }
    }

    println!("\n=== ROOM MEMBERS ===");
    let members = sqlx::query(
        r#"
        SELECT room_id, user_id, joined_at
        FROM room_members
        ORDER BY joined_at ASC
        "#,
    )
    .fetch_all(&services.db_pool)
    .await
    .context("failed to fetch room members")?;

    if members.is_empty() {
        println!("No room members found in database");
    } else {
        println!("Found {} room members:", members.len());
        println!("{:<10} {:<10} {:<25}", "Room ID", "User ID", "Joined At");
        println!("{}", "-".repeat(50));

        for member in members {
            let room_id: i64 = member.get("room_id");
            let user_id: i64 = member.get("user_id");
            let joined_at: String = member.get("joined_at");

            println!("{:<10} {:<10} {:<25}", room_id, user_id, joined_at);
        }
    }

    println!("\n=== MESSAGES ===");
    let messages = sqlx::query(
        r#"
        SELECT id, public_id, room_id, user_id, text, image_url, created_at
        FROM messages
        ORDER BY created_at ASC
        "#,
    )
    .fetch_all(&services.db_pool)
    .await
    .context("failed to fetch messages")?;

    if messages.is_empty() {
        println!("No messages found in database");
    } else {
        println!("Found {} messages:", messages.len());
        println!(
            "{:<5} {:<28} {:<10} {:<10} {:<45} {:<32} {:<25}",
            "ID",
            "Public ID",
            "Room ID",
            "User ID",
            "Text (truncated)",
            "Image URL",
            "Created At"
        );
        println!("{}", "-".repeat(160));

        for message in messages {
            let id: i64 = message.get("id");
            let public_id: String = message.get("public_id");
            let room_id: i64 = message.get("room_id");
            let user_id: i64 = message.get("user_id");
            let text: String = message.get("text");
            let image_url: Option<String> = message.get("image_url");
            let created_at: String = message.get("created_at");

            let text_display = if text.len() > 42 {
                format!("{}...", &text[..39])
            } else {
                text
            };

            println!(
                "{:<5} {:<28} {:<10} {:<10} {:<45} {:<32} {:<25}",
                id,
                public_id,
                room_id,
                user_id,
                text_display,
                image_url.as_deref().unwrap_or("NULL"),
                created_at
            );
        }
    }

    Ok(())
}

async fn clear_tables(services: &BackendServices) -> anyhow::Result<()> {
    // Children first so the foreign keys stay satisfied.
    let messages = sqlx::query("DELETE FROM messages")
        .execute(&services.db_pool)
        .await
        .context("failed to delete messages")?;

    let members = sqlx::query("DELETE FROM room_members")
        .execute(&services.db_pool)
        .await
        .context("failed to delete room members")?;

    let rooms = sqlx::query("DELETE FROM rooms")
        .execute(&services.db_pool)
        .await
        .context("failed to delete rooms")?;

    let users = sqlx::query("DELETE FROM users")
        .execute(&services.db_pool)
        .await
        .context("failed to delete users")?;

    println!("Database cleared:");
    println!("- {} messages deleted", messages.rows_affected());
    println!("- {} room memberships deleted", members.rows_affected());
    println!("- {} rooms deleted", rooms.rows_affected());
    println!("- {} users deleted", users.rows_affected());

    Ok(())
}

async fn seed_demo_data(services: &BackendServices, config: &AppConfig) -> anyhow::Result<()> {
    let directory = &services.gateway.directory;

    let mut seeded = Vec::new();
    for (email, name) in [
        ("alice@example.com", "Alice"),
        ("bob@example.com", "Bob"),
        ("carol@example.com", "Carol"),
    ] {
        let request = CreateUserRequest {
            email: Some(email.to_string()),
            display_name: Some(name.to_string()),
            avatar_url: None,
        };
        let user = directory
            .create_user(&request)
            .await
            .with_context(|| format!("failed to seed user {email}"))?;
        seeded.push(user);
    }

    let request = CreateRoomRequest {
        name: "Lounge".to_string(),
        kind: None,
        member_ids: seeded[1..]
            .iter()
            .map(|user| user.public_id.clone())
            .collect(),
    };
    let room = services
        .gateway
        .rooms
        .create_room(seeded[0].id, &request)
        .await
        .context("failed to seed room")?;

    println!(
        "Seeded {} users sharing room '{}' ({})",
        seeded.len(),
        room.name,
        room.id
    );
    println!();
    println!("{:<10} {:<28} Token", "Name", "User ID");
    println!("{}", "-".repeat(100));
    let issuer = TokenVerifier::from_config(&config.auth).with_duration(SEED_TOKEN_TTL);
    for user in &seeded {
        let token = issuer
            .generate_token(&user.public_id)
            .context("failed to issue token")?;
        println!(
            "{:<10} {:<28} {}",
            user.display_name.as_deref().unwrap_or("-"),
            user.public_id,
            token
        );
    }
    println!();
    println!("Connect with: ws://<address>/ws?token=<TOKEN>");

    Ok(())
}

async fn run_console() -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    info!("starting interactive console");

    let config = load_config().context("failed to load configuration")?;

    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    println!("Courier Interactive Console");
    println!("Type commands like '/help', '/users', '/rooms', '/messages', '/quit'");
    println!("Use Ctrl+C or '/quit' to exit");
    println!("---");

    let stdin = tokio::io::stdin();
    let mut reader = BufReader::new(stdin);
    let mut line = String::new();

    loop {
        print!("> ");
        std::io::Write::flush(&mut std::io::stdout())?;

        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            break; // EOF
        }

        let command = line.trim();
        if command.is_empty() {
            continue;
        }

        match command {
            "/quit" | "/exit" | "/q" => {
                println!("Goodbye!");
                break;
            }
            "/help" | "/h" => {
                println!("Available commands:");
                println!("  /help, /h          - Show this help");
                println!("  /users, /u         - List all users");
                println!("  /rooms, /r         - List all rooms");
                println!("  /messages, /m      - List recent messages");
                println!("  /seed, /s          - Seed demo users and a room");
                println!("  /dump, /d          - Dump all data");
                println!("  /clear, /cl        - Clear all data");
                println!("  /quit, /exit, /q   - Exit console");
            }
            "/users" | "/u" => {
                let users = services
                    .gateway
                    .directory
                    .list_users()
                    .await
                    .context("failed to fetch users")?;

                if users.is_empty() {
                    println!("No users found");
                } else {
                    println!("Users:");
                    for user in users {
                        println!(
                            "  {}: {} ({})",
                            user.public_id,
                            user.display_name.as_deref().unwrap_or("unnamed"),
                            if user.is_online { "online" } else { "offline" }
                        );
                    }
                }
            }
            "/rooms" | "/r" => {
                let rooms = sqlx::query(
                    r#"
                    SELECT public_id, name, kind, last_message
                    FROM rooms
                    ORDER BY created_at ASC
                    "#,
                )
                .fetch_all(&services.db_pool)
                .await
                .context("failed to fetch rooms")?;

                if rooms.is_empty() {
                    println!("No rooms found");
                } else {
                    println!("Rooms:");
                    for room in rooms {
                        let public_id: String = room.get("public_id");
                        let name: String = room.get("name");
                        let kind: String = room.get("kind");
                        let last_message: Option<String> = room.get("last_message");
                        println!(
                            "  {}: {} [{}] (last: {})",
                            public_id,
                            name,
                            kind,
                            last_message.as_deref().unwrap_or("none")
                        );
                    }
                }
            }
            "/messages" | "/m" => {
                let messages = sqlx::query(
                    r#"
                    SELECT m.text, m.created_at, u.public_id AS author
                    FROM messages m
                    JOIN users u ON u.id = m.user_id
                    ORDER BY m.created_at DESC
                    LIMIT 20
                    "#,
                )
                .fetch_all(&services.db_pool)
                .await
                .context("failed to fetch messages")?;

                if messages.is_empty() {
                    println!("No messages found");
                } else {
                    println!("Recent messages (newest first):");
                    for message in messages {
                        let author: String = message.get("author");
                        let text: String = message.get("text");
                        let created_at: String = message.get("created_at");
                        println!("  [{}] {}: {}", created_at, author, text);
                    }
                }
            }
            "/seed" | "/s" => {
                if let Err(error) = seed_demo_data(&services, &config).await {
                    println!("Seed failed: {error:#}");
                }
            }
            "/dump" | "/d" => {
                dump_tables(&services).await?;
            }
            "/clear" | "/cl" => {
                clear_tables(&services).await?;
            }
            _ => {
                println!("Unknown command: {}", command);
                println!("Type '/help' for available commands");
            }
        }
    }

    Ok(())
}
