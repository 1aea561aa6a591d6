use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::Password;
use ipweather_core::{Config, ServiceId};
use reqwest::Client;

use crate::client::{discover_public_ip, request_temperature};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "ipweather", version, about = "Temperature at your public IP's location")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store or clear the API key for a service in the config file.
    Configure {
        /// Service short name: "openweather" or "ipify".
        service: String,
    },

    /// Discover this machine's public IP and ask the server for its temperature.
    Show {
        /// Server URL; defaults to `endpoints.server` from the config file.
        #[arg(long)]
        server: Option<String>,

        /// Use this IP instead of asking the IP echo service.
        #[arg(long)]
        ip: Option<String>,
    },

    /// Print this machine's public IP.
    Ip,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load()?;
        let http = Client::new();

        match self.command {
            Command::Configure { service } => {
                let id = ServiceId::try_from(service.as_str())?;
                configure(&mut config, id)?;
            }
            Command::Show { server, ip } => {
                let ip = match ip {
                    Some(ip) => ip,
                    None => discover_public_ip(&http, &config.endpoints.ip_echo).await?,
                };
                println!("My IP is: {ip}");

                let server = server.unwrap_or_else(|| config.endpoints.server.clone());
                let temperature = request_temperature(&http, &server, &ip).await?;
                println!("Temperature: {temperature} °C");
            }
            Command::Ip => {
                let ip = discover_public_ip(&http, &config.endpoints.ip_echo).await?;
                println!("{ip}");
            }
        }

        Ok(())
    }
}

fn configure(config: &mut Config, id: ServiceId) -> anyhow::Result<()> {
    let key = Password::new(&format!("API key for {id} (leave empty to clear):"))
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    if key.trim().is_empty() {
        config.remove_api_key(id);
    } else {
        config.upsert_api_key(id, key.trim().to_string());
    }

    let path = config.save()?;
    println!("Saved {id} settings to {}", path.display());
    println!("Note: {} in the environment takes precedence over this file.", id.env_var());

    Ok(())
}
