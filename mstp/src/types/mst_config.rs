use core::fmt;

use hmac::{Hmac, Mac};
use md5::Md5;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

type HmacMd5 = Hmac<Md5>;

/// The HMAC-MD5 key used for the configuration digest (802.1Q Table 13-2).
pub const MST_CONFIG_DIGEST_KEY: [u8; 16] = [
    0x13, 0xac, 0x06, 0xa6, 0x2e, 0x47, 0xfd, 0x51, 0xf9, 0x5d, 0x2b, 0xa2, 0x43, 0xcd, 0x03, 0x46,
];

/// Number of entries in the VLAN to tree table, one per 12-bit VID.
pub const VLAN_TABLE_LEN: usize = 4096;

/// Maximum length of the configuration name.
pub const MST_CONFIG_NAME_LEN: usize = 32;

/// Length of the encoded MST configuration identifier.
pub const MST_CONFIG_ID_LEN: usize = 51;

/// The MST configuration identifier that decides region membership.
///
/// Two bridges are in the same region when their identifiers are equal octet
/// for octet.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct MstConfigId {
    /// Configuration identifier format selector, always zero.
    pub format_selector: u8,
    /// Configuration name, zero padded.
    pub name: [u8; MST_CONFIG_NAME_LEN],
    /// Revision level.
    pub revision: u16,
    /// HMAC-MD5 digest over the VLAN to tree table.
    pub digest: [u8; 16],
}

impl Default for MstConfigId {
    fn default() -> Self {
        MstConfigId {
            format_selector: 0,
            name: [0; MST_CONFIG_NAME_LEN],
            revision: 0,
            digest: VlanTable::default().digest(),
        }
    }
}

impl MstConfigId {
    /// Build an identifier from a name, revision and table.
    pub fn new(name: &str, revision: u16, table: &VlanTable) -> Result<Self> {
        let mut id = MstConfigId {
            revision,
            digest: table.digest(),
            ..Default::default()
        };
        id.set_name(name)?;
        Ok(id)
    }

    /// Replace the configuration name.
    pub fn set_name(&mut self, name: &str) -> Result<()> {
        let bytes = name.as_bytes();
        if bytes.len() > MST_CONFIG_NAME_LEN {
            return Err(Error::InvalidConfigName { len: bytes.len() });
        }
        self.name = [0; MST_CONFIG_NAME_LEN];
        self.name[..bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// The configuration name with the zero padding removed.
    pub fn name_str(&self) -> String {
        let end = self
            .name
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(MST_CONFIG_NAME_LEN);
        String::from_utf8_lossy(&self.name[..end]).into_owned()
    }

    /// Encode the identifier in its 51-byte wire form.
    pub fn to_bytes(&self) -> [u8; MST_CONFIG_ID_LEN] {
        let mut buf = [0; MST_CONFIG_ID_LEN];
        buf[0] = self.format_selector;
        buf[1..33].copy_from_slice(&self.name);
        buf[33..35].copy_from_slice(&self.revision.to_be_bytes());
        buf[35..51].copy_from_slice(&self.digest);
        buf
    }

    /// Decode the identifier from its 51-byte wire form.
    ///
    /// # Panics
    ///
    /// `bytes` is shorter than 51 octets.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut id = MstConfigId {
            format_selector: bytes[0],
            revision: u16::from_be_bytes([bytes[33], bytes[34]]),
            ..Default::default()
        };
        id.name.copy_from_slice(&bytes[1..33]);
        id.digest.copy_from_slice(&bytes[35..51]);
        id
    }
}

impl fmt::Display for MstConfigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{} digest=", self.name_str(), self.revision)?;
        for b in self.digest.iter() {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

/// The VLAN to tree assignment of a bridge.
///
/// Entry `vid` holds the MSTID serving that VLAN; zero is the CIST. The
/// reserved VIDs 0 and 4095 always map to the CIST.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanTable {
    entries: Vec<u16>,
}

impl Default for VlanTable {
    fn default() -> Self {
        VlanTable {
            entries: vec![0; VLAN_TABLE_LEN],
        }
    }
}

impl fmt::Debug for VlanTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let assigned = self.entries.iter().filter(|t| **t != 0).count();
        f.debug_struct("VlanTable")
            .field("assigned", &assigned)
            .finish()
    }
}

impl VlanTable {
    /// The tree serving `vid`.
    ///
    /// # Panics
    ///
    /// `vid` does not fit in 12 bits.
    pub fn tree(&self, vid: u16) -> u16 {
        self.entries[vid as usize]
    }

    /// Assign `vid` to `tree`. The caller checks that the tree exists.
    pub fn set_tree(&mut self, vid: u16, tree: u16) -> Result<()> {
        if vid == 0 || vid >= 4095 {
            return Err(Error::OutOfRange {
                name: "vlan id",
                value: vid as u32,
                min: 1,
                max: 4094,
            });
        }
        self.entries[vid as usize] = tree;
        Ok(())
    }

    /// Iterate over `(vid, tree)` for every VLAN not on the CIST.
    pub fn assignments(&self) -> impl Iterator<Item = (u16, u16)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, t)| **t != 0)
            .map(|(vid, t)| (vid as u16, *t))
    }

    /// Compute the configuration digest: HMAC-MD5 over the 4096 big-endian
    /// two-octet table entries.
    pub fn digest(&self) -> [u8; 16] {
        let Ok(mut mac) = HmacMd5::new_from_slice(&MST_CONFIG_DIGEST_KEY) else {
            unreachable!("HMAC takes keys of any length")
        };
        for entry in self.entries.iter() {
            mac.update(&entry.to_be_bytes());
        }
        let mut out = [0; 16];
        out.copy_from_slice(&mac.finalize().into_bytes());
        out
    }
}
