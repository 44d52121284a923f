use anyhow::Context;
use clap::{Parser, Subcommand};
use dialoguer::theme::ColorfulTheme;
use serde::Serialize;

use agentpass::{logger, Client};

#[derive(Debug, Parser)]
#[command(name = "agentpass", version, about = "Talk to the AgentPass API")]
struct Args {
    /// API to talk to
    #[arg(long, env = "AGENTPASS_BASE_URL", default_value = agentpass::api::DEFAULT_BASE_URL)]
    base_url: String,
    /// Bearer token for authenticated endpoints
    #[arg(long, env = "AGENTPASS_TOKEN", hide_env_values = true)]
    token: Option<String>,
    /// Log every request
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create an account and print its token
    Register {
        email: String,
        name: String,
        /// Prompted for if missing
        #[arg(long)]
        password: Option<String>,
    },
    /// Log in and print the token
    Login {
        email: String,
        /// Prompted for if missing
        #[arg(long)]
        password: Option<String>,
    },
    /// Create a passport
    CreatePassport { name: String, public_key: String },
    /// Show a passport
    Passport { id: String },
    /// Show the public part of a passport
    PublicPassport { id: String },
    /// Check a signature against a passport's public key
    Verify {
        id: String,
        challenge: String,
        signature: String,
    },
    /// Show the trust score of a passport
    Trust { id: String },
    /// Send a message between passports
    Send {
        from: String,
        to: String,
        subject: String,
        body: String,
    },
    /// List the inbox of a passport
    Inbox { id: String },
}

async fn prompt_password(email: &str) -> anyhow::Result<String> {
    let prompt = format!("Enter password for `{email}`");
    tokio::task::spawn_blocking(move || {
        dialoguer::Password::with_theme(&ColorfulTheme::default())
            .with_prompt(&prompt)
            .allow_empty_password(false)
            .report(false)
            .interact()
    })
    .await
    .context("join password prompt")?
    .context("read password")
}

fn print_json<T: Serialize>(value: Option<T>) -> anyhow::Result<()> {
    match value {
        Some(value) => {
            let text = serde_json::to_string_pretty(&value).context("serialize response")?;
            println!("{}", text);
        }
        None => log::warn!("server returned no content"),
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // load before parsing so `.env` values reach the `env` args
    let dotenv = dotenv::dotenv();
    let args = Args::parse();

    logger::init(args.verbose).context("initialize logger")?;

    match dotenv {
        Ok(path) => log::debug!("loaded .env from {}", path.to_string_lossy()),
        Err(err) => log::debug!("couldn't load .env file: {:?}", err),
    };

    let client = Client::new(Some(&args.base_url), args.token.as_deref())
        .context("invalid http client configuration")?;

    match args.command {
        Command::Register {
            email,
            name,
            password,
        } => {
            let password = match password {
                Some(password) => password,
                None => prompt_password(&email).await?,
            };
            let token = client
                .register(&email, &password, &name)
                .await
                .context("register")?;
            println!("{}", token);
        }
        Command::Login { email, password } => {
            let password = match password {
                Some(password) => password,
                None => prompt_password(&email).await?,
            };
            let token = client.login(&email, &password).await.context("login")?;
            println!("{}", token);
        }
        Command::CreatePassport { name, public_key } => {
            print_json(
                client
                    .create_passport(&name, &public_key)
                    .await
                    .context("create passport")?,
            )?;
        }
        Command::Passport { id } => {
            print_json(client.get_passport(&id).await.context("get passport")?)?;
        }
        Command::PublicPassport { id } => {
            print_json(
                client
                    .get_public_passport(&id)
                    .await
                    .context("get public passport")?,
            )?;
        }
        Command::Verify {
            id,
            challenge,
            signature,
        } => {
            print_json(
                client
                    .verify(&id, &challenge, &signature)
                    .await
                    .context("verify signature")?,
            )?;
        }
        Command::Trust { id } => {
            print_json(client.get_trust(&id).await.context("get trust score")?)?;
        }
        Command::Send {
            from,
            to,
            subject,
            body,
        } => {
            print_json(
                client
                    .send_message(&from, &to, &subject, &body)
                    .await
                    .context("send message")?,
            )?;
        }
        Command::Inbox { id } => {
            print_json(client.get_messages(&id).await.context("get messages")?)?;
        }
    }

    Ok(())
}
