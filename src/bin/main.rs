//! Replays a recorded SurrealDB response through the datasource pipeline.
//!
//! # Examples
//!
//! ```bash
//! # Print the frames of a metric query as JSON
//! surreal-datasource-replay \
//!   --request request.json \
//!   --response response.json \
//!   --from 2024-01-01T00:00:00Z \
//!   --to 2024-01-01T01:00:00Z \
//!   --interval 1m
//!
//! # Write one Arrow IPC stream per frame
//! surreal-datasource-replay --request request.json --response response.json \
//!   --from 2024-01-01T00:00:00Z --to 2024-01-01T01:00:00Z --arrow-dir frames/
//!
//! # Show the connection the host's instance settings resolve to
//! surreal-datasource-replay --request request.json --response response.json \
//!   --from 2024-01-01T00:00:00Z --to 2024-01-01T01:00:00Z \
//!   --instance instance.json --secure-data secure.json
//! ```

use clap::Parser;
use frameshape_core::{encode_frame, parse_interval};
use std::collections::HashMap;
use surreal_datasource::{
    config::{CliArgs, Settings},
    DataQuery, Datasource, RecordedExecutor, TimeRange,
};
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliArgs::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::new(&cli)?;
    debug!(?settings, "loaded settings");

    let instance = match &cli.instance {
        Some(path) => std::fs::read(path)?,
        None => Vec::new(),
    };
    let secure_data: HashMap<String, String> = match &cli.secure_data {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => HashMap::new(),
    };
    let connection = settings.connection.clone().with_instance(&instance, &secure_data)?;
    info!(
        endpoint = %connection.rpc_endpoint(),
        signin = %serde_json::Value::Object(connection.redacted_signin_params()),
        "resolved connection, replaying recorded response"
    );

    let request = std::fs::read_to_string(&cli.request)?;
    let recorded: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&cli.response)?)?;

    let query = DataQuery {
        ref_id: cli.ref_id.clone(),
        json: request,
        time_range: TimeRange {
            from: cli.from,
            to: cli.to,
        },
        interval: parse_interval(&cli.interval)?,
    };

    let datasource = Datasource::new(Box::new(RecordedExecutor::new(recorded)), settings.query);
    let response = datasource.query_data(std::slice::from_ref(&query)).await;

    for (ref_id, result) in response.responses {
        let frames = match result {
            Ok(frames) => frames,
            Err(e) => {
                error!(%ref_id, "{}", e);
                return Err(e.into());
            }
        };

        match &cli.arrow_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                for (index, frame) in frames.iter().enumerate() {
                    let path = dir.join(format!("{ref_id}-{index}.arrow"));
                    std::fs::write(&path, encode_frame(frame, Some(&ref_id))?)?;
                    info!(frame = %frame.name, path = %path.display(), "wrote frame");
                }
            }
            None => println!("{}", serde_json::to_string_pretty(&frames)?),
        }
    }

    Ok(())
}
