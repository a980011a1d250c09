//! SA-MP query protocol, information packet only.
//!
//! Request: `"SAMP"`, the server IPv4 octets, the port as u16 LE, then the
//! opcode. The reply echoes those 11 bytes followed by the payload.

use std::net::Ipv4Addr;

pub const HEADER_LEN: usize = 11;
const MAGIC: &[u8; 4] = b"SAMP";
const INFO_OPCODE: u8 = b'i';

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerInfo {
    pub password: bool,
    pub players: u16,
    pub max_players: u16,
    pub hostname: String,
    pub gamemode: String,
    pub language: String,
}

pub fn info_request(ip: Ipv4Addr, port: u16) -> [u8; HEADER_LEN] {
    let mut packet = [0u8; HEADER_LEN];
    packet[..4].copy_from_slice(MAGIC);
    packet[4..8].copy_from_slice(&ip.octets());
    packet[8..10].copy_from_slice(&port.to_le_bytes());
    packet[10] = INFO_OPCODE;
    packet
}

pub fn parse_info_response(request: &[u8], response: &[u8]) -> Result<ServerInfo, String> {
    if response.len() < HEADER_LEN || response[..HEADER_LEN] != request[..HEADER_LEN] {
        return Err("reply does not match the info request".into());
    }
    let mut reader = Reader {
        buf: &response[HEADER_LEN..],
    };
    Ok(ServerInfo {
        password: reader.u8()? != 0,
        players: reader.u16()?,
        max_players: reader.u16()?,
        hostname: reader.string()?,
        gamemode: reader.string()?,
        language: reader.string()?,
    })
}

struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], String> {
        if self.buf.len() < len {
            return Err(format!(
                "truncated reply: wanted {len} bytes, {} left",
                self.buf.len()
            ));
        }
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    fn u8(&mut self) -> Result<u8, String> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, String> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn string(&mut self) -> Result<String, String> {
        let raw = self.take(4)?;
        let len = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize;
        Ok(String::from_utf8_lossy(self.take(len)?).into_owned())
    }
}

#[cfg(test)]
pub(crate) fn encode_info_response(request: &[u8], info: &ServerInfo) -> Vec<u8> {
    let mut out = request[..HEADER_LEN].to_vec();
    out.push(u8::from(info.password));
    out.extend_from_slice(&info.players.to_le_bytes());
    out.extend_from_slice(&info.max_players.to_le_bytes());
    for field in [&info.hostname, &info.gamemode, &info.language] {
        out.extend_from_slice(&(field.len() as u32).to_le_bytes());
        out.extend_from_slice(field.as_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ServerInfo {
        ServerInfo {
            password: false,
            players: 75,
            max_players: 200,
            hostname: "Indonesia Roleplay Server".into(),
            gamemode: "RP".into(),
            language: "Bahasa".into(),
        }
    }

    #[test]
    fn request_layout_matches_protocol() {
        let packet = info_request(Ipv4Addr::new(192, 168, 1, 100), 7777);
        assert_eq!(&packet[..4], b"SAMP");
        assert_eq!(&packet[4..8], &[192, 168, 1, 100]);
        assert_eq!(&packet[8..10], &[0x61, 0x1e]);
        assert_eq!(packet[10], b'i');
    }

    #[test]
    fn parses_info_reply() {
        let request = info_request(Ipv4Addr::LOCALHOST, 7777);
        let reply = encode_info_response(&request, &sample());
        assert_eq!(parse_info_response(&request, &reply).unwrap(), sample());
    }

    #[test]
    fn rejects_reply_for_other_server() {
        let request = info_request(Ipv4Addr::LOCALHOST, 7777);
        let other = info_request(Ipv4Addr::LOCALHOST, 7778);
        let reply = encode_info_response(&other, &sample());
        assert!(parse_info_response(&request, &reply).is_err());
    }

    #[test]
    fn rejects_truncated_reply() {
        let request = info_request(Ipv4Addr::LOCALHOST, 7777);
        let reply = encode_info_response(&request, &sample());
        let err = parse_info_response(&request, &reply[..reply.len() - 3]).unwrap_err();
        assert!(err.contains("truncated"), "{err}");
    }
}
