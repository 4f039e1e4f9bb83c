use crate::constants::{DEFAULT_STUN_PORT, DEFAULT_STUN_SERVER};

/// Peer connection configuration.
///
/// The default carries the single vendor STUN server; embedders on a
/// known network supply their own list.
#[derive(Clone, Debug, PartialEq)]
pub struct RTCConfiguration {
    /// STUN servers as `host[:port]`; the port defaults to 3478.
    pub stun_servers: Vec<String>,

    /// SHA-256 fingerprint of the DTLS certificate the embedder's
    /// handshake engine will present. A random placeholder is
    /// generated per connection when absent.
    pub certificate_fingerprint: Option<[u8; 32]>,
}

impl Default for RTCConfiguration {
    fn default() -> Self {
        Self {
            stun_servers: vec![DEFAULT_STUN_SERVER.to_owned()],
            certificate_fingerprint: None,
        }
    }
}

impl RTCConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stun_servers(mut self, stun_servers: Vec<String>) -> Self {
        self.stun_servers = stun_servers;
        self
    }

    pub fn with_certificate_fingerprint(mut self, fingerprint: [u8; 32]) -> Self {
        self.certificate_fingerprint = Some(fingerprint);
        self
    }

    /// STUN servers split into `(host, port)` pairs, applying the
    /// default port to bare hostnames.
    pub fn stun_server_addrs(&self) -> Vec<(String, u16)> {
        self.stun_servers
            .iter()
            .map(|entry| match entry.rsplit_once(':') {
                Some((host, port)) => match port.parse::<u16>() {
                    Ok(port) => (host.to_owned(), port),
                    Err(_) => (entry.clone(), DEFAULT_STUN_PORT),
                },
                None => (entry.clone(), DEFAULT_STUN_PORT),
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_stun_server() {
        let config = RTCConfiguration::default();
        assert_eq!(config.stun_servers, vec![DEFAULT_STUN_SERVER.to_owned()]);
        assert_eq!(
            config.stun_server_addrs(),
            vec![(DEFAULT_STUN_SERVER.to_owned(), DEFAULT_STUN_PORT)]
        );
    }

    #[test]
    fn test_stun_server_addrs() {
        let config = RTCConfiguration::default().with_stun_servers(vec![
            "stun.example.org".to_owned(),
            "stun.example.org:19302".to_owned(),
        ]);
        assert_eq!(
            config.stun_server_addrs(),
            vec![
                ("stun.example.org".to_owned(), 3478),
                ("stun.example.org".to_owned(), 19302),
            ]
        );
    }
}
