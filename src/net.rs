//! Local network address discovery
//!
//! Only used to print a LAN URL in the startup banner.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use tokio::net::UdpSocket;

/// Best guess at this machine's LAN address
///
/// Connecting a UDP socket picks the outbound interface without sending any
/// packet. Falls back to loopback when there is no route.
pub async fn local_ip() -> IpAddr {
    match detect().await {
        Ok(ip) => ip,
        Err(e) => {
            tracing::debug!(error = %e, "Local address discovery failed");
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        }
    }
}

async fn detect() -> std::io::Result<IpAddr> {
    let socket = UdpSocket::bind(SocketAddr::from(([0, 0, 0, 0], 0))).await?;
    socket.connect(SocketAddr::from(([8, 8, 8, 8], 80))).await?;
    Ok(socket.local_addr()?.ip())
}
