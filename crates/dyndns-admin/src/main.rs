// # dyndns-admin - Client Registration CLI
//
// Registers and revokes dyndns client credentials. All registration logic
// lives in dyndns-core; this binary parses arguments, generates the token,
// and prints results.
//
// ## Usage
//
// ```bash
// export GCP_ACCESS_TOKEN=$(gcloud auth print-access-token)
//
// # Register a client; prints "<token> <name> <zone>"
// dyndns-admin register laptop.computers example-com --project example-project
//
// # Revoke every credential for a client
// dyndns-admin revoke laptop.computers example-com --project example-project
// ```

use clap::{ArgAction, Parser, Subcommand};
use rand::RngCore;
use tracing_subscriber::EnvFilter;

use dyndns_core::{Error, registration};
use dyndns_store_datastore::DatastoreCredentials;
use dyndns_zone_clouddns::CloudDnsZones;

#[derive(Parser)]
#[command(name = "dyndns-admin", about = "Manage dyndns client registrations", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// GCP project owning the credential store and managed zones
    #[arg(long, global = true, env = "GCP_PROJECT")]
    project: Option<String>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Register a client and print its freshly generated token
    Register {
        /// Host label, sans zone name (e.g. laptop.computers)
        name: String,
        /// Managed zone identifier (e.g. example-com)
        zone: String,
    },
    /// Revoke every credential registered for a client
    Revoke {
        /// Host label, sans zone name
        name: String,
        /// Managed zone identifier
        zone: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("ERROR: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let project = cli
        .project
        .ok_or_else(|| anyhow::anyhow!("no project given; pass --project or set GCP_PROJECT"))?;
    let access_token = std::env::var("GCP_ACCESS_TOKEN")
        .map_err(|_| anyhow::anyhow!("GCP_ACCESS_TOKEN is not set"))?;

    tracing::debug!(%project, "using project");

    let store = DatastoreCredentials::new(project.as_str(), access_token.as_str())?;
    let zones = CloudDnsZones::new(project.as_str(), access_token.as_str())?;

    match cli.command {
        Command::Register { name, zone } => {
            let token = generate_token();
            let credential =
                match registration::register(&store, &zones, &name, &zone, token).await {
                    Ok(credential) => credential,
                    Err(Error::ZoneNotFound(zone)) => {
                        anyhow::bail!("did not find zone {zone}")
                    }
                    Err(Error::AlreadyRegistered {
                        host_label,
                        zone_id,
                    }) => anyhow::bail!("{host_label} in {zone_id} already exists"),
                    Err(err) => return Err(err.into()),
                };

            println!(
                "{} {} {}",
                credential.token, credential.host_label, credential.zone_id
            );
        }

        Command::Revoke { name, zone } => {
            let revoked = match registration::revoke(&store, &zones, &name, &zone).await {
                Ok(revoked) => revoked,
                Err(Error::ZoneNotFound(zone)) => anyhow::bail!("did not find zone {zone}"),
                Err(err) => return Err(err.into()),
            };

            for credential in revoked {
                println!(
                    "revoked {} entry for {} in {}",
                    credential.key, name, zone
                );
            }
        }
    }

    Ok(())
}

/// Freshly generated credential token: 32 random bytes as hex
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
