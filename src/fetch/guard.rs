//! 出站请求的地址校验，阻止对内网与本机地址的请求伪造

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use reqwest::Url;

use crate::fetch::FetchError;
use crate::types::SourceIdentity;

/// 一律拒绝的主机名
const BLOCKED_HOSTS: &[&str] = &["localhost", "metadata.google.internal"];
/// 一律拒绝的主机名后缀
const BLOCKED_SUFFIXES: &[&str] = &[".localhost", ".local", ".internal"];

/// URL守卫
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlGuard {
    allow_private_hosts: bool,
}

impl UrlGuard {
    pub fn new(allow_private_hosts: bool) -> Self {
        Self {
            allow_private_hosts,
        }
    }

    /// 不做DNS解析的静态检查：协议、主机名与字面IP
    pub fn check(&self, url: &Url) -> Result<(), FetchError> {
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(FetchError::Rejected(format!(
                "scheme `{}` is not allowed",
                url.scheme()
            )));
        }

        let host = url
            .host_str()
            .map(|h| h.trim_start_matches('[').trim_end_matches(']').to_lowercase())
            .filter(|h| !h.is_empty())
            .ok_or_else(|| FetchError::Rejected("url has no host".to_string()))?;

        if self.allow_private_hosts {
            return Ok(());
        }

        if BLOCKED_HOSTS.contains(&host.as_str())
            || BLOCKED_SUFFIXES.iter().any(|suffix| host.ends_with(suffix))
        {
            return Err(FetchError::Rejected(format!("host `{}` is internal", host)));
        }

        if let Ok(ip) = host.parse::<IpAddr>() {
            if is_forbidden_ip(&ip) {
                return Err(FetchError::Rejected(format!(
                    "address `{}` is not publicly routable",
                    ip
                )));
            }
        }

        Ok(())
    }

    /// 规范化调用方给出的参考来源并做静态检查
    pub fn check_source(&self, raw: &str) -> Result<SourceIdentity, FetchError> {
        let source =
            SourceIdentity::parse(raw).map_err(|e| FetchError::Rejected(e.to_string()))?;
        let url = Url::parse(source.url()).map_err(|e| FetchError::Rejected(e.to_string()))?;
        self.check(&url)?;
        Ok(source)
    }

    /// 解析主机名后再检查全部地址，防止域名指向内网
    pub async fn check_resolved(&self, url: &Url) -> Result<(), FetchError> {
        self.check(url)?;
        if self.allow_private_hosts {
            return Ok(());
        }

        let host = url
            .host_str()
            .map(|h| h.trim_start_matches('[').trim_end_matches(']').to_string())
            .unwrap_or_default();
        let port = url.port_or_known_default().unwrap_or(443);

        let addresses = tokio::net::lookup_host((host.as_str(), port))
            .await
            .map_err(|e| FetchError::Network(format!("failed to resolve `{}`: {}", host, e)))?;

        for address in addresses {
            if is_forbidden_ip(&address.ip()) {
                return Err(FetchError::Rejected(format!(
                    "host `{}` resolves to non-public address `{}`",
                    host,
                    address.ip()
                )));
            }
        }
        Ok(())
    }
}

fn is_forbidden_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_forbidden_v4(v4),
        IpAddr::V6(v6) => is_forbidden_v6(v6),
    }
}

fn is_forbidden_v4(ip: &Ipv4Addr) -> bool {
    let octets = ip.octets();
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.is_multicast()
        || ip.is_documentation()
        // 100.64.0.0/10 运营商级NAT
        || (octets[0] == 100 && (octets[1] & 0b1100_0000) == 64)
        || octets[0] == 0
}

fn is_forbidden_v6(ip: &Ipv6Addr) -> bool {
    if let Some(mapped) = ip.to_ipv4_mapped() {
        return is_forbidden_v4(&mapped);
    }
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        || ip.is_multicast()
        // fc00::/7 唯一本地地址
        || (first & 0xfe00) == 0xfc00
        // fe80::/10 链路本地地址
        || (first & 0xffc0) == 0xfe80
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(raw: &str) -> Result<(), FetchError> {
        UrlGuard::default().check(&Url::parse(raw).unwrap())
    }

    #[test]
    fn test_rejects_internal_destinations() {
        for raw in [
            "http://127.0.0.1/",
            "http://localhost:8080/admin",
            "http://api.localhost/",
            "http://printer.local/",
            "http://metadata.google.internal/computeMetadata",
            "http://10.0.0.8/",
            "http://172.16.4.2/",
            "http://192.168.1.1/",
            "http://169.254.169.254/latest/meta-data",
            "http://100.64.1.1/",
            "http://0.0.0.0/",
            "http://[::1]/",
            "http://[fd00::1]/",
            "http://[fe80::1]/",
            "http://[::ffff:127.0.0.1]/",
        ] {
            assert!(
                matches!(check(raw), Err(FetchError::Rejected(_))),
                "{} should be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_rejects_non_http_schemes() {
        assert!(matches!(
            check("file:///etc/passwd"),
            Err(FetchError::Rejected(_))
        ));
        assert!(matches!(
            check("ftp://example.com/"),
            Err(FetchError::Rejected(_))
        ));
    }

    #[test]
    fn test_allows_public_hosts() {
        assert!(check("https://example-blog.test/").is_ok());
        assert!(check("https://www.techcrunch.com/2024/01/post").is_ok());
        assert!(check("http://93.184.216.34/").is_ok());
    }

    #[test]
    fn test_private_hosts_can_be_allowed() {
        let guard = UrlGuard::new(true);
        assert!(guard.check(&Url::parse("http://127.0.0.1:3000/").unwrap()).is_ok());
        assert!(matches!(
            guard.check(&Url::parse("file:///etc/passwd").unwrap()),
            Err(FetchError::Rejected(_))
        ));
    }

    #[test]
    fn test_check_source_normalizes_and_rejects() {
        let guard = UrlGuard::default();
        let source = guard.check_source("https://www.Example-Blog.test/posts/1").unwrap();
        assert_eq!(source.domain(), "example-blog.test");

        assert!(matches!(guard.check_source("   "), Err(FetchError::Rejected(_))));
        assert!(matches!(
            guard.check_source("http://192.168.0.10/"),
            Err(FetchError::Rejected(_))
        ));
        assert!(UrlGuard::new(true).check_source("http://192.168.0.10/").is_ok());
    }
}
