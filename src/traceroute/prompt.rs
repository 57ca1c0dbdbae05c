use std::io;
use std::io::{BufRead, Write};
use std::time::Duration;

use crate::traceroute::probe::ProbeProtocol;

pub const DEFAULT_HOST: &str = "www.lancaster.ac.uk";
pub const DEFAULT_MAX_WAIT_PROBE: Duration = Duration::from_secs(1);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptedOptions {
    pub host: String,
    pub max_wait_probe: Duration,
    pub protocol: ProbeProtocol,
}

/// Asks for destination, per-probe timeout (seconds) and protocol.
///
/// Empty answers take the defaults; answers that cannot be used are reported
/// and replaced by the default as well.
pub fn prompt_options<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<PromptedOptions> {
    writeln!(output, "Please enter the IP or host name[default({DEFAULT_HOST})]:")?;
    output.flush()?;
    let host = read_answer(input)?;
    let host = if host.is_empty() { DEFAULT_HOST.to_string() } else { host };

    writeln!(output, "Please enter the timeout[default:1s]:")?;
    output.flush()?;
    let timeout = read_answer(input)?;
    let max_wait_probe = match parse_timeout(&timeout) {
        Some(max_wait_probe) => max_wait_probe,
        None => {
            writeln!(output, "Invalid timeout '{timeout}', default(1s)")?;
            DEFAULT_MAX_WAIT_PROBE
        }
    };

    writeln!(output, "Please choose protocol (ICMP or UDP)[default ICMP]:")?;
    output.flush()?;
    let protocol = read_answer(input)?;
    let protocol = if protocol.is_empty() {
        ProbeProtocol::default()
    } else {
        match protocol.parse::<ProbeProtocol>() {
            Ok(protocol) => protocol,
            Err(_) => {
                writeln!(output, "Please enter 'ICMP' or 'UDP', default(ICMP)")?;
                ProbeProtocol::default()
            }
        }
    };

    Ok(PromptedOptions {
        host,
        max_wait_probe,
        protocol,
    })
}

/// Empty input means the default; otherwise a positive number of seconds.
pub fn parse_timeout(answer: &str) -> Option<Duration> {
    if answer.is_empty() {
        return Some(DEFAULT_MAX_WAIT_PROBE);
    }

    let seconds = answer.parse::<f64>().ok()?;
    Duration::try_from_secs_f64(seconds)
        .ok()
        .filter(|max_wait_probe| !max_wait_probe.is_zero())
}

fn read_answer<R: BufRead>(input: &mut R) -> io::Result<String> {
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().to_string())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn prompt(answers: &str) -> (PromptedOptions, String) {
        let mut input = Cursor::new(answers.as_bytes().to_vec());
        let mut output = Vec::new();
        let options = prompt_options(&mut input, &mut output).unwrap();
        (options, String::from_utf8(output).unwrap())
    }

    #[test]
    fn empty_answers_take_defaults() {
        let (options, _) = prompt("\n\n\n");
        assert_eq!(options, PromptedOptions {
            host: DEFAULT_HOST.to_string(),
            max_wait_probe: Duration::from_secs(1),
            protocol: ProbeProtocol::ICMP,
        });
    }

    #[test]
    fn closed_input_takes_defaults() {
        let (options, _) = prompt("");
        assert_eq!(options.host, DEFAULT_HOST);
        assert_eq!(options.protocol, ProbeProtocol::ICMP);
    }

    #[test]
    fn explicit_answers_are_used() {
        let (options, output) = prompt("example.com\n2\nUDP\n");
        assert_eq!(options.host, "example.com");
        assert_eq!(options.max_wait_probe, Duration::from_secs(2));
        assert_eq!(options.protocol, ProbeProtocol::UDP);
        assert!(!output.contains("default(ICMP)\n"));
    }

    #[test]
    fn unknown_protocol_is_rejected_and_defaults_to_icmp() {
        let (options, output) = prompt("example.com\n1\nTCP\n");
        assert_eq!(options.protocol, ProbeProtocol::ICMP);
        assert!(output.contains("Please enter 'ICMP' or 'UDP', default(ICMP)"));
    }

    #[test]
    fn unusable_timeout_falls_back_to_one_second() {
        let (options, output) = prompt("example.com\nsoon\nICMP\n");
        assert_eq!(options.max_wait_probe, Duration::from_secs(1));
        assert!(output.contains("Invalid timeout 'soon'"));
    }

    #[test]
    fn timeouts() {
        assert_eq!(parse_timeout("0.5"), Some(Duration::from_millis(500)));
        assert_eq!(parse_timeout("3"), Some(Duration::from_secs(3)));
        assert_eq!(parse_timeout("0"), None);
        assert_eq!(parse_timeout("-1"), None);
        assert_eq!(parse_timeout("NaN"), None);
    }
}
