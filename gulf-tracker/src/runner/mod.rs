//! Run execution: asks the providers and grades their answers

pub mod generator;

pub use generator::{
    slots_from_config, ConsoleProgress, CredentialSource, EnvCredentials, Generator,
    GeneratorConfig, NoOpProgress, ProgressCallback, ProviderSlot,
};
