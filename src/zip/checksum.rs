use crc32fast::Hasher;

use crate::error::ZipError;

/// Running CRC-32 over decompressed bytes, checked once the data ends.
///
/// The expected value is only supplied at [`verify`](Self::verify) time,
/// since entries with a data descriptor learn it after their data.
#[derive(Default, Clone)]
pub(crate) struct Crc32Check {
    hasher: Hasher,
}

impl Crc32Check {
    pub(crate) fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    pub(crate) fn verify(&self, expected: u32) -> Result<(), ZipError> {
        let actual = self.hasher.clone().finalize();
        if actual != expected {
            return Err(ZipError::ChecksumMismatch { expected, actual });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_across_updates() {
        let mut check = Crc32Check::default();
        check.update(b"hello ");
        check.update(b"world");
        check.verify(crc32fast::hash(b"hello world")).unwrap();
    }

    #[test]
    fn mismatch_reports_both_values() {
        let mut check = Crc32Check::default();
        check.update(b"data");
        let actual = crc32fast::hash(b"data");
        match check.verify(actual ^ 1) {
            Err(ZipError::ChecksumMismatch { expected, actual: got }) => {
                assert_eq!(expected, actual ^ 1);
                assert_eq!(got, actual);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn empty_input_has_zero_crc() {
        Crc32Check::default().verify(0).unwrap();
    }
}
