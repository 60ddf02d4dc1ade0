pub mod prepare_env;

#[cfg(test)]
pub mod mocks;
