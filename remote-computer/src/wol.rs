//! Wake-on-LAN magic packets.
//!
//! A magic packet is six `0xFF` bytes followed by the target's hardware
//! address repeated sixteen times, sent as a UDP broadcast.

use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use log::debug;
use tokio::net::UdpSocket;

use crate::error::ConnectionError;
use crate::validate::MacAddress;

/// Size of a magic packet in bytes.
pub const MAGIC_PACKET_LEN: usize = 6 + 16 * 6;

/// A validated wake request.
#[derive(Debug, Clone)]
pub struct WakeRequest {
    pub mac: MacAddress,
    pub target: SocketAddr,
}

/// Build the magic packet for `mac`.
pub fn magic_packet(mac: &MacAddress) -> [u8; MAGIC_PACKET_LEN] {
    let mut packet = [0xFF; MAGIC_PACKET_LEN];
    for chunk in packet[6..].chunks_exact_mut(6) {
        chunk.copy_from_slice(&mac.octets());
    }
    packet
}

/// Sends magic packets.
pub trait WakeSender: Send + Sync {
    fn send_magic_packet(
        &self,
        request: &WakeRequest,
    ) -> impl Future<Output = Result<(), ConnectionError>> + Send;
}

/// Broadcasts magic packets over UDP.
#[derive(Debug, Clone, Copy, Default)]
pub struct UdpWakeSender;

impl WakeSender for UdpWakeSender {
    async fn send_magic_packet(&self, request: &WakeRequest) -> Result<(), ConnectionError> {
        let wake_failed = |source| ConnectionError::WakeFailed {
            mac: request.mac.to_string(),
            source,
        };

        let bind: SocketAddr = match request.target.ip() {
            IpAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            IpAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };

        let socket = UdpSocket::bind(bind).await.map_err(wake_failed)?;
        socket.set_broadcast(true).map_err(wake_failed)?;

        let packet = magic_packet(&request.mac);
        let sent = socket
            .send_to(&packet, request.target)
            .await
            .map_err(wake_failed)?;

        debug!("Sent {} byte magic packet for {} to {}", sent, request.mac, request.target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate_mac;

    #[test]
    fn test_magic_packet_layout() {
        let mac = validate_mac("00-11-22-33-44-55").unwrap();
        let packet = magic_packet(&mac);
        assert_eq!(packet.len(), 102);
        assert_eq!(&packet[..6], &[0xFF; 6]);
        for chunk in packet[6..].chunks(6) {
            assert_eq!(chunk, &[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        }
    }

    #[tokio::test]
    async fn test_udp_sender_delivers_packet() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let target = receiver.local_addr().unwrap();
        let mac = validate_mac("1a:2b:3c:4d:5e:6f").unwrap();

        let request = WakeRequest {
            mac: mac.clone(),
            target,
        };
        tokio_test::assert_ok!(UdpWakeSender.send_magic_packet(&request).await);

        let mut buf = [0u8; 256];
        let (len, _) = receiver.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], &magic_packet(&mac)[..]);
    }
}
