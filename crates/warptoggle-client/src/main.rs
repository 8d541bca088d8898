//! warptoggle CLI entry point.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use warptoggle_client::cli::{Cli, Command};
use warptoggle_client::config::ClientConfig;
use warptoggle_client::error::{ClientError, ClientResult};
use warptoggle_client::output::{render_stale, render_state};
use warptoggle_client::socket::SocketClient;
use warptoggle_protocol::{Request, Response, ToggleIntent};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(Level::WARN.to_string()))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<ExitCode> {
    let config = if let Some(ref path) = cli.config {
        ClientConfig::load_from(path).map_err(ClientError::Config)?
    } else {
        ClientConfig::load().unwrap_or_default()
    };

    if let Some(Command::Server) = cli.command {
        return warptoggle_client::commands::server::run(&cli, &config)
            .await
            .map(|()| ExitCode::SUCCESS);
    }

    let socket_path = cli
        .socket_path
        .clone()
        .or_else(|| config.server.socket_path.clone())
        .unwrap_or_else(warptoggle_server::default_socket_path);
    let timeout = Duration::from_secs(cli.timeout.unwrap_or(config.server.timeout));
    let client = SocketClient::new(socket_path, timeout);

    match cli.command {
        None => show_state(&cli, &config, &client).await,
        Some(Command::Toggle) => {
            // Intent is computed from the daemon's belief at dispatch
            // time: flip whatever the last observation said.
            let state = match client.send(Request::GetState).await {
                Ok(Response::State(info)) => info.state,
                Ok(_) => return Err(ClientError::Protocol("unexpected response".into())),
                Err(e) => return Err(e),
            };
            send_intent(&client, ToggleIntent::flipping(state)).await
        }
        Some(Command::Connect) => send_intent(&client, ToggleIntent::Connect).await,
        Some(Command::Disconnect) => send_intent(&client, ToggleIntent::Disconnect).await,
        Some(Command::Check) => match client.send(Request::CheckNow).await? {
            Response::Ack => Ok(ExitCode::SUCCESS),
            _ => Err(ClientError::Protocol("unexpected response".into())),
        },
        Some(Command::Status) => match client.send(Request::Status).await? {
            Response::Status(status) => {
                println!("uptime:   {}s", status.uptime_seconds);
                println!("cli:      {}", status.cli_path);
                println!("state:    {}", status.state.state);
                println!("polling:  {}", status.state.polling);
                if status.state.consecutive_failures > 0 {
                    println!("failures: {}", status.state.consecutive_failures);
                }
                if let Some(error) = status.state.last_error {
                    println!("error:    {}", error);
                }
                Ok(ExitCode::SUCCESS)
            }
            _ => Err(ClientError::Protocol("unexpected response".into())),
        },
        Some(Command::Ping) => {
            if client.ping().await {
                println!("daemon is alive");
                Ok(ExitCode::SUCCESS)
            } else {
                println!("daemon is not responding");
                Ok(ExitCode::FAILURE)
            }
        }
        Some(Command::Server) => unreachable!("handled above"),
    }
}

/// Default action: print the daemon's belief in the selected format.
///
/// When the daemon is unreachable a placeholder is printed instead of a
/// hard error, so status bars degrade gracefully; the exit code still
/// signals the condition.
async fn show_state(cli: &Cli, config: &ClientConfig, client: &SocketClient) -> ClientResult<ExitCode> {
    match client.send(Request::GetState).await {
        Ok(Response::State(info)) => {
            println!("{}", render_state(&info, &config.display, cli.output_format()));
            Ok(ExitCode::SUCCESS)
        }
        Ok(_) => Err(ClientError::Protocol("unexpected response".into())),
        Err(ClientError::Connection(_)) | Err(ClientError::Timeout(_)) => {
            println!("{}", render_stale(&config.display, cli.output_format()));
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e),
    }
}

async fn send_intent(client: &SocketClient, intent: ToggleIntent) -> ClientResult<ExitCode> {
    match client.send(Request::Toggle { intent }).await? {
        Response::Ack => Ok(ExitCode::SUCCESS),
        _ => Err(ClientError::Protocol("unexpected response".into())),
    }
}
