use std::io::{self, Read};

use executor_bytecode::encoding::{
    bytecode_encoder::BytecodeEncoder,
    evm::encoder_builders::ExecutorBytecodeEncoderBuilder,
    models::{ExchangeParam, PriceRoute, WethCallData},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

mod lib {
    pub mod cli;
    pub mod logging;
}

use lib::cli::{Cli, Parser};

#[derive(Deserialize)]
struct Request {
    price_route: PriceRoute,
    exchange_params: Vec<ExchangeParam>,
    #[serde(default)]
    weth_call_data: Option<WethCallData>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    lib::logging::init_logging();

    // Read from stdin until EOF
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|e| format!("Failed to read from stdin: {}", e))?;

    if buffer.trim().is_empty() {
        return Err("No input provided. Expected a JSON request on stdin (see --help)".into());
    }

    let encoded = encode(&buffer, &cli)?;

    println!(
        "{}",
        serde_json::to_string(&encoded)
            .map_err(|e| format!("Failed to serialize output: {}", e))?
    );

    Ok(())
}

fn encode(input: &str, cli: &Cli) -> Result<Value, Box<dyn std::error::Error>> {
    let request: Request = serde_json::from_str(input)?;

    let mut builder = ExecutorBytecodeEncoderBuilder::new().chain(cli.chain);
    if let Some(path) = &cli.config_path {
        builder = builder.executor_config_path(path.clone());
    }
    let encoder = builder.build()?;

    let transaction = encoder.encode_transaction(
        &request.price_route,
        &request.exchange_params,
        request.weth_call_data.as_ref(),
    )?;
    info!(chain = %cli.chain, bytes = transaction.data.len(), "encoded executor bytecode");

    Ok(serde_json::json!({
        "to": format!("{:#x}", transaction.to),
        "value": format!("0x{}", transaction.value.to_str_radix(16)),
        "data": format!("0x{}", hex::encode(&transaction.data)),
    }))
}
