use std::net::{Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};

use log::debug;
use tokio::net::{UdpSocket, lookup_host};
use tokio::time::timeout;

use crate::engine::models::ServerStatus;

pub mod query;

use self::query::{info_request, parse_info_response};

const QUERY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct NetworkClient {
    timeout: Duration,
    fallback_name: String,
}

impl NetworkClient {
    pub fn new(fallback_name: impl Into<String>) -> Self {
        Self {
            timeout: QUERY_TIMEOUT,
            fallback_name: fallback_name.into(),
        }
    }

    #[cfg(test)]
    fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Query the server's info packet. Any failure means the server is unreachable.
    pub async fn server_status(&self, host: &str, port: u16) -> Result<ServerStatus, String> {
        let (ip, addr) = resolve_ipv4(host, port).await?;
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
            .await
            .map_err(|e| format!("failed to bind socket: {e}"))?;
        socket
            .connect(addr)
            .await
            .map_err(|e| format!("failed to connect socket to {addr}: {e}"))?;

        let request = info_request(ip, port);
        let started = Instant::now();
        socket
            .send(&request)
            .await
            .map_err(|e| format!("failed to send query: {e}"))?;

        let mut buf = [0u8; 2048];
        let len = timeout(self.timeout, socket.recv(&mut buf))
            .await
            .map_err(|_| format!("no reply from {addr} within {:?}", self.timeout))?
            .map_err(|e| format!("failed to receive reply: {e}"))?;
        let ping = started.elapsed();

        let info = parse_info_response(&request, &buf[..len])?;
        debug!(
            "query: {} players={}/{} ping={:?} mode={:?} lang={:?} locked={}",
            addr, info.players, info.max_players, ping, info.gamemode, info.language, info.password
        );
        let name = if info.hostname.trim().is_empty() {
            self.fallback_name.clone()
        } else {
            info.hostname
        };
        Ok(ServerStatus {
            online: true,
            players: u32::from(info.players),
            max_players: u32::from(info.max_players),
            ping_ms: u32::try_from(ping.as_millis()).unwrap_or(u32::MAX),
            name,
        })
    }
}

async fn resolve_ipv4(host: &str, port: u16) -> Result<(Ipv4Addr, SocketAddr), String> {
    let addrs = lookup_host((host, port))
        .await
        .map_err(|e| format!("failed to resolve {host}: {e}"))?;
    addrs
        .filter_map(|addr| match addr {
            SocketAddr::V4(v4) => Some((*v4.ip(), addr)),
            SocketAddr::V6(_) => None,
        })
        .next()
        .ok_or_else(|| format!("{host} has no IPv4 address"))
}
