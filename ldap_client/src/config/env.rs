// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 ldap_client Authors
use crate::config::ConfigLoadError;
use config::{ConfigError, Environment, Map, Source, Value};
use log::*;
use std::collections::HashMap;

pub static ENV_PREFIX: &str = "LDAP_CLIENT";

/// Parameters taken from `LDAP_CLIENT_*` environment variables, nested under
/// the `client` table so it layers over file sources.
#[derive(Clone, Debug)]
pub struct EnvConfig {
    map: HashMap<String, Value>,
}

impl EnvConfig {
    pub fn new() -> Result<Self, ConfigLoadError> {
        let env_source = Environment::with_prefix(ENV_PREFIX)
            .separator(".")
            .prefix_separator("_");

        let collected = env_source.collect()?;
        collected
            .iter()
            .for_each(|(c, v)| debug!("Environment parameter {c}={v}"));

        Ok(EnvConfig {
            map: Map::from([("client".to_string(), Value::from(collected))]),
        })
    }
}

impl Source for EnvConfig {
    fn collect(&self) -> Result<Map<String, Value>, ConfigError> {
        Ok(self.map.clone())
    }

    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new(self.clone())
    }
}
