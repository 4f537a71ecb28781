use crate::encoding::{
    bytecode_encoder::BytecodeEncoder,
    errors::EncodingError,
    evm::{bytecode_encoders::ExecutorBytecodeEncoder, config::ExecutorConfig},
    models::Chain,
};

/// Builder pattern for constructing an `ExecutorBytecodeEncoder` with customizable options.
///
/// Either a chain (to load its configuration from a file) or an explicit configuration must be
/// set before building.
pub struct ExecutorBytecodeEncoderBuilder {
    chain: Option<Chain>,
    executor_config_path: Option<String>,
    config: Option<ExecutorConfig>,
}

impl Default for ExecutorBytecodeEncoderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutorBytecodeEncoderBuilder {
    pub fn new() -> Self {
        ExecutorBytecodeEncoderBuilder { chain: None, executor_config_path: None, config: None }
    }

    pub fn chain(mut self, chain: Chain) -> Self {
        self.chain = Some(chain);
        self
    }

    /// Sets the `executor_config_path` manually.
    /// If it's not set, the default path will be used (config/executor_addresses.json)
    pub fn executor_config_path(mut self, executor_config_path: String) -> Self {
        self.executor_config_path = Some(executor_config_path);
        self
    }

    /// Sets the configuration explicitly. Takes precedence over the chain and the config path.
    pub fn config(mut self, config: ExecutorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Builds the `ExecutorBytecodeEncoder` instance.
    /// Returns an error if neither a configuration nor a chain has been set.
    pub fn build(self) -> Result<Box<dyn BytecodeEncoder>, EncodingError> {
        let config = match (self.config, self.chain) {
            (Some(config), _) => config,
            (None, Some(chain)) => ExecutorConfig::for_chain(chain, self.executor_config_path)?,
            (None, None) => {
                return Err(EncodingError::FatalError(
                    "Please set the chain or the executor config before building the encoder"
                        .to_string(),
                ))
            }
        };
        Ok(Box::new(ExecutorBytecodeEncoder::new(config)))
    }
}
