/// Tamanho do payload de cada Echo Request (bloco fixo de zeros).
pub const PAYLOAD_LEN: usize = 48;

/// Tamanho do pacote serializado: type + code + checksum + ident + seq + payload.
pub const PACKET_LEN: usize = 2 + 3 * 2 + PAYLOAD_LEN;

/// Tamanho assumido do cabeçalho IPv4 na resposta (sem opções).
pub const IP_HEADER_LEN: usize = 20;

/// Offset do campo TTL dentro do cabeçalho IPv4.
pub const TTL_OFFSET: usize = 8;

pub const ECHO_REPLY: u8 = 0;
pub const ECHO_REQUEST: u8 = 8;

/// Calcula o checksum ICMP (RFC 792 / RFC 1071).
///
/// Buffers de tamanho ímpar são tratados como se tivessem um zero a mais
/// no final, sem alterar o buffer de quem chamou.
pub fn checksum(mut data: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    while data.len() >= 2 {
        sum = sum.wrapping_add(u16::from_be_bytes([data[0], data[1]]) as u32);
        data = &data[2..];
    }
    if !data.is_empty() {
        sum = sum.wrapping_add((data[0] as u32) << 8);
    }
    while (sum >> 16) != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    !(sum as u16)
}

/// Identificador da sessão: os 16 bits baixos do PID.
pub fn identifier_from_pid(pid: u32) -> u16 {
    u16::from_be_bytes([(pid >> 8) as u8, pid as u8])
}

/// Echo Request (type=8, code=0) com payload fixo de 48 bytes zerados.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoRequest {
    pub identifier: u16,
    pub sequence: u16,
}

impl EchoRequest {
    const PAYLOAD: [u8; PAYLOAD_LEN] = [0; PAYLOAD_LEN];

    pub fn new(identifier: u16, sequence: u16) -> Self {
        EchoRequest { identifier, sequence }
    }

    /// Serializa em big-endian e grava o checksum nos bytes 2..4.
    pub fn to_bytes(&self) -> [u8; PACKET_LEN] {
        let mut pkt = [0u8; PACKET_LEN];

        // Type=8 (Echo Request), Code=0, checksum zerado durante o cálculo
        pkt[0] = ECHO_REQUEST;
        pkt[1] = 0;
        pkt[4..6].copy_from_slice(&self.identifier.to_be_bytes());
        pkt[6..8].copy_from_slice(&self.sequence.to_be_bytes());
        pkt[8..].copy_from_slice(&Self::PAYLOAD);

        let csum = checksum(&pkt);
        pkt[2..4].copy_from_slice(&csum.to_be_bytes());

        pkt
    }
}

/// Cabeçalho ICMP decodificado de um datagrama recebido.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoReply {
    pub icmp_type: u8,
    pub code: u8,
    pub identifier: u16,
    pub sequence: u16,
}

impl EchoReply {
    /// Decodifica o cabeçalho ICMP, pulando o cabeçalho IPv4 (IHL) se houver.
    pub fn parse(buf: &[u8]) -> Option<EchoReply> {
        let start = if buf.len() >= IP_HEADER_LEN && (buf[0] >> 4) == 4 {
            (buf[0] & 0x0F) as usize * 4
        } else {
            0
        };

        let icmp = buf.get(start..)?;
        if icmp.len() < 8 {
            return None;
        }

        Some(EchoReply {
            icmp_type: icmp[0],
            code: icmp[1],
            identifier: u16::from_be_bytes([icmp[4], icmp[5]]),
            sequence: u16::from_be_bytes([icmp[6], icmp[7]]),
        })
    }

    pub fn answers(&self, request: &EchoRequest) -> bool {
        self.icmp_type == ECHO_REPLY
            && self.code == 0
            && self.identifier == request.identifier
            && self.sequence == request.sequence
    }
}

/// TTL lido do cabeçalho IP do datagrama (0 se curto demais).
pub fn ttl(buf: &[u8]) -> u8 {
    buf.get(TTL_OFFSET).copied().unwrap_or(0)
}
