// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 ldap_client Authors
use crate::{config::ResolvedConfig, platform::PlatformPolicy};

pub static MANAGED_HEADER: &str =
    "# This file is managed by ldap_client. Local changes will be overwritten.";

/// Render the client configuration file.
///
/// The output only depends on its arguments, so equal inputs always give
/// byte-identical files.
pub fn render(cfg: &ResolvedConfig, policy: &PlatformPolicy) -> String {
    let mut lines = vec![
        MANAGED_HEADER.to_string(),
        String::new(),
        format!("URI {}", cfg.uri),
        format!("BASE {}", cfg.base),
        format!("ldap_version {}", cfg.version),
        format!("port {}", cfg.port),
        format!("scope {}", cfg.scope),
        format!("timelimit {}", cfg.timelimit),
        format!("bind_timelimit {}", cfg.bind_timelimit),
        format!("idle_timelimit {}", cfg.idle_timelimit),
    ];

    if let Some(binddn) = &cfg.binddn {
        lines.push(format!("binddn {binddn}"));
    }
    if let Some(bindpw) = &cfg.bindpw {
        lines.push(format!("bindpw {bindpw}"));
    }

    lines.push(String::new());
    lines.push(format!("ssl {}", if cfg.ssl { "on" } else { "off" }));
    lines.push(format!(
        "tls_checkpeer {}",
        if cfg.tls_checkpeer { "yes" } else { "no" }
    ));
    lines.push(format!("tls_ciphers {}", cfg.tls_ciphers));
    if cfg.ssl {
        lines.push(format!("tls_cacertdir {}", policy.cert_dir.display()));
        if let Some(cert) = &cfg.ssl_cert {
            lines.push(format!(
                "tls_cacert {}",
                policy.cert_path(cert).display()
            ));
        }
    }

    lines.push(String::new());
    lines.push(format!("nss_schema {}", cfg.schema));

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{resolve, RawParams};

    #[test]
    fn test_render_plain() {
        let raw =
            RawParams::new("ldap://ldap1 ldap://ldap2", "dc=example,dc=com");
        let cfg = resolve(&raw).expect("failed to resolve");
        let text = render(&cfg, &PlatformPolicy::debian());

        assert!(text.starts_with(MANAGED_HEADER));
        assert!(text.ends_with("nss_schema rfc2307bis\n"));
        for line in [
            "URI ldap://ldap1 ldap://ldap2",
            "BASE dc=example,dc=com",
            "ldap_version 3",
            "port 389",
            "scope sub",
            "timelimit 30",
            "bind_timelimit 30",
            "idle_timelimit 3600",
            "ssl off",
            "tls_checkpeer yes",
            "tls_ciphers TLSv1",
        ] {
            assert!(text.lines().any(|l| l == line), "missing '{line}'");
        }
        assert!(!text.contains("binddn"));
        assert!(!text.contains("tls_cacertdir"));
    }

    #[test]
    fn test_render_ssl_and_bind() {
        let mut raw = RawParams::new("ldaps://ldap1", "dc=example,dc=com");
        raw.ssl = Some(true);
        raw.ssl_cert = Some("ca.pem".into());
        raw.tls_checkpeer = Some(false);
        raw.binddn = Some("cn=proxy,dc=example,dc=com".into());
        raw.bindpw = Some("secret".into());
        raw.scope = Some("one".into());
        let cfg = resolve(&raw).expect("failed to resolve");
        let text = render(&cfg, &PlatformPolicy::redhat());

        for line in [
            "port 636",
            "scope one",
            "binddn cn=proxy,dc=example,dc=com",
            "bindpw secret",
            "ssl on",
            "tls_checkpeer no",
            "tls_cacertdir /etc/openldap/cacerts",
            "tls_cacert /etc/openldap/cacerts/ca.pem",
        ] {
            assert!(text.lines().any(|l| l == line), "missing '{line}'");
        }
    }

    #[test]
    fn test_render_deterministic() {
        let mut raw = RawParams::new("ldap://ldap1", "dc=example,dc=com");
        raw.ssl = Some(true);
        raw.ssl_cert = Some("ca.pem".into());
        let policy = PlatformPolicy::debian();
        let a = render(&resolve(&raw).expect("failed to resolve"), &policy);
        let b = render(&resolve(&raw).expect("failed to resolve"), &policy);
        assert_eq!(a.as_bytes(), b.as_bytes());
    }
}
