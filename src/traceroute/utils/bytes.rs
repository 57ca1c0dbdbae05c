use pnet::packet::icmp::Icmp;
use pnet::packet::udp::Udp;

pub trait ToBytes {
    fn to_bytes(&self) -> Vec<u8>;
}

impl ToBytes for Udp {
    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes: Vec<u8> = Vec::with_capacity(self.length as usize);

        bytes.extend_from_slice(self.source.to_be_bytes().as_ref());
        bytes.extend_from_slice(self.destination.to_be_bytes().as_ref());
        bytes.extend_from_slice(self.length.to_be_bytes().as_ref());
        bytes.extend_from_slice(self.checksum.to_be_bytes().as_ref());
        bytes.extend_from_slice(&self.payload);

        bytes
    }
}

impl ToBytes for Icmp {
    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes: Vec<u8> = Vec::with_capacity(4 + self.payload.len());
        bytes.push(self.icmp_type.0);
        bytes.push(self.icmp_code.0);
        bytes.extend_from_slice(self.checksum.to_be_bytes().as_ref());
        bytes.extend_from_slice(self.payload.as_ref());
        bytes
    }
}
