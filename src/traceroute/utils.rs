pub mod dns;
pub mod bytes;
pub mod packet_utils;

/// Identifier stamped on every ICMP probe of a session, derived from the process id.
pub fn session_identifier() -> u16 {
    (std::process::id() & 0xffff) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_identifier_is_stable_within_a_process() {
        assert_eq!(session_identifier(), session_identifier());
        assert_eq!(session_identifier() as u32, std::process::id() & 0xffff);
    }
}
