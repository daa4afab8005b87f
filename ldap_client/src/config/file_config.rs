// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 ldap_client Authors
use crate::config::{ConfigLoadError, EnvConfig, RawParams};
use config::{Config, File, FileFormat};
use glob::glob;
use log::*;
use serde_derive::Deserialize;
use std::{
    env,
    path::{Path, PathBuf},
};

pub static DEFAULT_PARAMS_FILE: &str = "/etc/ldap_client/client.toml";
pub static DEFAULT_PARAMS_SNIPPETS_DIR: &str = "/etc/ldap_client/client.d";
pub static PARAMS_OVERRIDE_ENV_VAR: &str = "LDAP_CLIENT_CONFIG";

// Keeps track of whether the user named a single file or a whole directory.
#[derive(Debug)]
pub enum ParamsSource {
    File(PathBuf),
    Directory(PathBuf),
}

/// Collects [`RawParams`] from TOML files, snippet directories and the
/// environment, later sources overriding earlier ones.
///
/// Files carry their options under a `[client]` table:
///
/// ```toml
/// [client]
/// uri = "ldap://ldap1 ldap://ldap2"
/// base = "dc=example,dc=com"
/// ssl = true
/// ssl_cert = "ca.pem"
/// ```
#[derive(Debug, Default)]
pub struct ParamsBuilder {
    sources: Vec<ParamsSource>,
    with_env: bool,
}

impl ParamsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a single file as a parameter source.
    pub fn file(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.sources.push(ParamsSource::File(path.into()));
        self
    }

    /// Adds every file in a directory, in glob order.
    pub fn directory(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.sources.push(ParamsSource::Directory(path.into()));
        self
    }

    /// Layer `LDAP_CLIENT_*` environment variables over the file sources.
    pub fn environment(&mut self) -> &mut Self {
        self.with_env = true;
        self
    }

    pub fn load_default_locations(&mut self) -> &mut Self {
        self.file(DEFAULT_PARAMS_FILE)
            .directory(DEFAULT_PARAMS_SNIPPETS_DIR)
            .environment()
    }

    /// Consumes the configured sources and deserializes the parameters.
    pub fn build(&mut self) -> Result<RawParams, ConfigLoadError> {
        #[derive(Debug, Deserialize)]
        struct FileParams {
            #[serde(default)]
            client: RawParams,
        }

        let mut builder = Config::builder();

        // A file named in LDAP_CLIENT_CONFIG replaces every file source
        if let Ok(env_file) = env::var(PARAMS_OVERRIDE_ENV_VAR) {
            if !env_file.is_empty() {
                let path = Path::new(&env_file);
                if !path.exists() {
                    warn!(
                        "Parameter file set in {PARAMS_OVERRIDE_ENV_VAR} \
                         environment variable not found"
                    );
                    return Err(ConfigLoadError::MissingEnvConfigFile {
                        file: path.display().to_string(),
                    });
                }
                warn!(
                    "Parameters replaced by {}: {}",
                    PARAMS_OVERRIDE_ENV_VAR,
                    path.display()
                );
                builder = builder.add_source(
                    File::new(&env_file, FileFormat::Toml).required(true),
                );
                if self.with_env {
                    builder = builder.add_source(EnvConfig::new()?);
                }
                let p: FileParams = builder.build()?.try_deserialize()?;
                return Ok(p.client);
            }
        }

        for (index, source) in self.sources.iter().enumerate() {
            match source {
                ParamsSource::File(path) => {
                    debug!(
                        "Loading parameters from FILE (#{}): {}",
                        index,
                        path.display()
                    );
                    builder = builder.add_source(
                        File::new(
                            &path.display().to_string(),
                            FileFormat::Toml,
                        )
                        .required(false),
                    );
                }
                ParamsSource::Directory(path) => {
                    debug!(
                        "Loading parameters from DIRECTORY (#{}): {}",
                        index,
                        path.display()
                    );
                    builder = builder.add_source(
                        glob(&path.join("*").display().to_string())?
                            .filter_map(|entry| entry.ok())
                            .map(|path| {
                                File::new(
                                    &path.display().to_string(),
                                    FileFormat::Toml,
                                )
                                .required(false)
                            })
                            .collect::<Vec<_>>(),
                    );
                }
            }
        }

        if self.with_env {
            builder = builder.add_source(EnvConfig::new()?);
        }

        let p: FileParams = builder.build()?.try_deserialize()?;
        debug!("Parameter loading finished");
        Ok(p.client)
    }
}

pub fn load_default_files() -> Result<RawParams, ConfigLoadError> {
    ParamsBuilder::new().load_default_locations().build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_single_file() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let file_path = dir.path().join("client.toml");
        let mut file = std::fs::File::create(&file_path)
            .expect("failed to create params file");
        writeln!(
            file,
            "[client]\n\
             uri = \"ldap://ldap1\"\n\
             base = \"dc=example,dc=com\"\n\
             ssl = true\n\
             ssl_cert = \"ca.pem\"\n\
             port = 10636"
        )
        .expect("failed to write params file");

        let params = ParamsBuilder::new()
            .file(&file_path)
            .build()
            .expect("failed to build params");

        assert_eq!(params.uri.as_deref(), Some("ldap://ldap1"));
        assert_eq!(params.base.as_deref(), Some("dc=example,dc=com"));
        assert_eq!(params.ssl, Some(true));
        assert_eq!(params.ssl_cert.as_deref(), Some("ca.pem"));
        assert_eq!(params.port, Some(10636));
        assert_eq!(params.scope, None);
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let mut file1 = std::fs::File::create(dir.path().join("a.toml"))
            .expect("failed to create params file");
        writeln!(file1, "[client]\nuri = \"ldap://first\"\nscope = \"one\"")
            .expect("failed to write params file");
        let mut file2 = std::fs::File::create(dir.path().join("b.toml"))
            .expect("failed to create params file");
        writeln!(file2, "[client]\nuri = \"ldap://second\"\npam = true")
            .expect("failed to write params file");

        let params = ParamsBuilder::new()
            .directory(dir.path())
            .build()
            .expect("failed to build params");

        assert_eq!(params.uri.as_deref(), Some("ldap://second"));
        assert_eq!(params.scope.as_deref(), Some("one"));
        assert_eq!(params.pam, Some(true));
    }

    #[test]
    fn test_missing_files_are_optional() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let params = ParamsBuilder::new()
            .file(dir.path().join("missing.toml"))
            .directory(dir.path().join("missing.d"))
            .build()
            .expect("failed to build params");
        assert_eq!(params, RawParams::default());
    }
}
