//! The FIB-update control protocol.
//!
//! A control packet's name field carries a plain-ASCII command of the
//! form `VERB:prefix:face_id`, e.g. `ADD:/a/b:2`. `VERB` is exactly three
//! bytes (`ADD` or `DEL`), `face_id` is up to four decimal digits. This
//! mirrors `original_source/src/main/control_plane.c`'s tokenization
//! byte-for-byte (verb, then a ':' at index 3, then the prefix up to the
//! next ':', then the face id to the end of the name).

use crate::error::Error;
use crate::name::Name;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Add,
    Del,
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verb::Add => "ADD",
            Verb::Del => "DEL",
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FibCommand {
    pub verb: Verb,
    pub prefix: Name,
    pub face: u8,
}

impl FibCommand {
    /// Parses the raw name bytes of a control packet into a command.
    pub fn parse(name: &[u8]) -> Result<Self, Error> {
        if name.len() < 3 {
            return Err(Error::Control("command too short: no verb".into()));
        }
        if name.get(3) != Some(&b':') {
            return Err(Error::Control("missing ':' after verb".into()));
        }
        let verb = match &name[0..3] {
            b"ADD" => Verb::Add,
            b"DEL" => Verb::Del,
            other => {
                return Err(Error::UnknownVerb(String::from_utf8_lossy(other).into_owned()))
            }
        };

        let rest = &name[4..];
        let sep = rest
            .iter()
            .rposition(|&b| b == b':')
            .ok_or_else(|| Error::Control("missing ':' before face id".into()))?;
        let prefix_bytes = &rest[..sep];
        let face_bytes = &rest[sep + 1..];

        if face_bytes.is_empty() || face_bytes.len() > 4 || !face_bytes.iter().all(u8::is_ascii_digit) {
            return Err(Error::Control("invalid face id".into()));
        }
        let face_str = std::str::from_utf8(face_bytes)
            .map_err(|_| Error::Control("face id is not ASCII".into()))?;
        let face: u16 = face_str
            .parse()
            .map_err(|_| Error::Control("face id is not a number".into()))?;
        if face > u8::MAX as u16 {
            return Err(Error::Control(format!("face id {} out of range", face)));
        }

        let prefix =
            Name::from_bytes(prefix_bytes).map_err(|e| Error::Control(format!("bad prefix: {}", e)))?;

        Ok(Self {
            verb,
            prefix,
            face: face as u8,
        })
    }

    /// Encodes this command back into the `VERB:prefix:face_id` text form.
    pub fn encode(&self) -> Vec<u8> {
        format!("{}:{}:{}", self.verb, self.prefix, self.face).into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_add_and_del() {
        let cmd = FibCommand::parse(b"ADD:/a/b:3").unwrap();
        assert_eq!(cmd.verb, Verb::Add);
        assert_eq!(cmd.prefix.as_bytes(), b"/a/b");
        assert_eq!(cmd.face, 3);

        let cmd = FibCommand::parse(b"DEL:/a/b:3").unwrap();
        assert_eq!(cmd.verb, Verb::Del);
    }

    #[test]
    fn round_trips_through_encode() {
        let cmd = FibCommand::parse(b"ADD:/x:200").unwrap();
        let encoded = cmd.encode();
        let reparsed = FibCommand::parse(&encoded).unwrap();
        assert_eq!(reparsed.face, 200);
        assert_eq!(reparsed.prefix.as_bytes(), b"/x");
    }

    #[test]
    fn rejects_unknown_verb_and_bad_face() {
        assert!(FibCommand::parse(b"XXX:/a:1").is_err());
        assert!(FibCommand::parse(b"ADD:/a:notanumber").is_err());
        assert!(FibCommand::parse(b"ADD:/a:99999").is_err());
        assert!(FibCommand::parse(b"AD").is_err());
    }
}
