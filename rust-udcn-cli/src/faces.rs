//! Turns the `-p`/`-m` flags into the router's face table.
//!
//! Grounded on `original_source/src/main/control_plane.c`'s
//! `port_addr[face].local_addr` bookkeeping: each enabled port gets an
//! index (its bit position in the ports mask) and, optionally, a MAC
//! address supplied positionally via `-m`. Rewriting outgoing frames
//! with that MAC is NIC-layer work this crate does not perform; the
//! table exists so the control plane can validate that a face a command
//! names is actually enabled.

use anyhow::{bail, Context, Result};

#[derive(Debug, Clone)]
pub struct Face {
    pub id: u8,
    pub mac: Option<[u8; 6]>,
}

pub struct FaceTable {
    pub faces: Vec<Face>,
}

impl FaceTable {
    pub fn face_ids(&self) -> Vec<u8> {
        self.faces.iter().map(|f| f.id).collect()
    }

    /// Id/MAC pairs for every enabled face, for the control plane's
    /// unknown-or-zero-MAC face rejection.
    pub fn face_entries(&self) -> Vec<(u8, Option<[u8; 6]>)> {
        self.faces.iter().map(|f| (f.id, f.mac)).collect()
    }
}

/// Parses a hex bitmask like `"0x7"` or `"7"` into the list of set bit
/// positions (face ids), and an optional space-separated MAC list that
/// must have exactly as many entries as there are set bits.
pub fn build_face_table(ports: &str, macs: Option<&str>) -> Result<FaceTable> {
    let trimmed = ports.trim_start_matches("0x").trim_start_matches("0X");
    let mask = u64::from_str_radix(trimmed, 16).context("ports bitmask must be hexadecimal")?;
    if mask == 0 {
        bail!("ports bitmask must enable at least one face");
    }

    let ids: Vec<u8> = (0..64u8).filter(|&i| mask & (1u64 << i) != 0).collect();

    let macs: Vec<Option<[u8; 6]>> = match macs {
        None => vec![None; ids.len()],
        Some(list) => {
            let parsed: Result<Vec<[u8; 6]>> =
                list.split_whitespace().map(parse_mac).collect();
            let parsed = parsed?;
            if parsed.len() != ids.len() {
                bail!(
                    "expected {} MAC address(es) for {} enabled port(s), got {}",
                    ids.len(),
                    ids.len(),
                    parsed.len()
                );
            }
            parsed.into_iter().map(Some).collect()
        }
    };

    let faces = ids
        .into_iter()
        .zip(macs)
        .map(|(id, mac)| Face { id, mac })
        .collect();

    Ok(FaceTable { faces })
}

fn parse_mac(s: &str) -> Result<[u8; 6]> {
    let mut out = [0u8; 6];
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 6 {
        bail!("invalid MAC address {:?}", s);
    }
    for (i, p) in parts.iter().enumerate() {
        out[i] = u8::from_str_radix(p, 16).with_context(|| format!("invalid MAC octet {:?}", p))?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mask_into_face_ids() {
        let table = build_face_table("0x5", None).unwrap();
        assert_eq!(table.face_ids(), vec![0, 2]);
    }

    #[test]
    fn mismatched_mac_count_is_rejected() {
        assert!(build_face_table("0x3", Some("00:00:00:00:00:01")).is_err());
    }

    #[test]
    fn zero_mask_is_rejected() {
        assert!(build_face_table("0x0", None).is_err());
    }
}
