use super::{Error, FORMAT_VERSION, SIGNATURE};
use derive_more::Constructor;
use static_assertions::const_assert_eq;
use std::convert::TryInto;

pub const HEADER_SIZE: usize = 32;

const SIGNATURE_AT: usize = 0;
const VERSION_AT: usize = 4;
const CODE_LEN_AT: usize = 8;
const DATA_LEN_AT: usize = 16;
const STRINGS_LEN_AT: usize = 24;

const_assert_eq!(STRINGS_LEN_AT + 8, HEADER_SIZE);

// Segment lengths, as stored in a program file. All fields are little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Constructor)]
pub struct Header {
    pub code_len: u64,
    pub data_len: u64,
    pub strings_len: u64,
}

fn read_u64(raw: &[u8; HEADER_SIZE], at: usize) -> u64 {
    let mut bs = [0; 8];
    bs.copy_from_slice(&raw[at..at + 8]);
    u64::from_le_bytes(bs)
}

impl Header {
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut raw = [0; HEADER_SIZE];
        raw[SIGNATURE_AT..VERSION_AT].copy_from_slice(SIGNATURE);
        raw[VERSION_AT..CODE_LEN_AT].copy_from_slice(&FORMAT_VERSION.to_le_bytes());
        raw[CODE_LEN_AT..DATA_LEN_AT].copy_from_slice(&self.code_len.to_le_bytes());
        raw[DATA_LEN_AT..STRINGS_LEN_AT].copy_from_slice(&self.data_len.to_le_bytes());
        raw[STRINGS_LEN_AT..HEADER_SIZE].copy_from_slice(&self.strings_len.to_le_bytes());
        raw
    }

    pub fn decode(raw: &[u8; HEADER_SIZE]) -> Result<Self, Error> {
        if &raw[SIGNATURE_AT..VERSION_AT] != SIGNATURE {
            return Err(Error::BadSignature);
        }

        let version = i32::from_le_bytes(
            raw[VERSION_AT..CODE_LEN_AT]
                .try_into()
                .map_err(|_| Error::BadSignature)?,
        );
        if version != FORMAT_VERSION {
            return Err(Error::BadVersion(version));
        }

        Ok(Header::new(
            read_u64(raw, CODE_LEN_AT),
            read_u64(raw, DATA_LEN_AT),
            read_u64(raw, STRINGS_LEN_AT),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout() {
        let raw = Header::new(40, 3, 16).encode();
        assert_eq!(&raw[0..4], SIGNATURE);
        assert_eq!(&raw[4..8], &FORMAT_VERSION.to_le_bytes());
        assert_eq!(&raw[8..16], &[40, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&raw[16..24], &[3, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&raw[24..32], &[16, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(Header::decode(&raw).unwrap(), Header::new(40, 3, 16));
    }

    #[test]
    fn bad_signature() {
        let mut raw = Header::new(0, 0, 0).encode();
        raw[0] ^= 0xFF;
        assert!(matches!(Header::decode(&raw), Err(Error::BadSignature)));
    }

    #[test]
    fn bad_version() {
        let mut raw = Header::new(0, 0, 0).encode();
        raw[4..8].copy_from_slice(&(FORMAT_VERSION + 1).to_le_bytes());
        assert!(matches!(
            Header::decode(&raw),
            Err(Error::BadVersion(v)) if v == FORMAT_VERSION + 1
        ));
    }
}
