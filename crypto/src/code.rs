//! One-time verification codes.

use crate::CryptoError;

/// Source of cryptographically secure random bytes.
pub trait EntropySource: Send + Sync {
    fn fill(&self, buf: &mut [u8]) -> Result<(), CryptoError>;
}

/// The operating system CSPRNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, buf: &mut [u8]) -> Result<(), CryptoError> {
        getrandom::getrandom(buf).map_err(|e| CryptoError::Entropy(e.to_string()))
    }
}

/// Produces fixed-length lowercase hex codes.
///
/// A failing entropy source is an error; there is no weaker fallback.
pub struct CodeGenerator {
    length: usize,
    entropy: Box<dyn EntropySource>,
}

impl CodeGenerator {
    /// Generator backed by OS entropy. `length` is in hex characters.
    pub fn new(length: usize) -> Result<Self, CryptoError> {
        Self::with_entropy(length, Box::new(OsEntropy))
    }

    pub fn with_entropy(length: usize, entropy: Box<dyn EntropySource>) -> Result<Self, CryptoError> {
        if length == 0 || length % 2 != 0 {
            return Err(CryptoError::InvalidCodeLength(length));
        }
        Ok(Self { length, entropy })
    }

    pub fn generate(&self) -> Result<String, CryptoError> {
        let mut bytes = vec![0u8; self.length / 2];
        self.entropy.fill(&mut bytes)?;
        Ok(hex::encode(bytes))
    }
}

impl std::fmt::Debug for CodeGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeGenerator")
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl EntropySource for Broken {
        fn fill(&self, _buf: &mut [u8]) -> Result<(), CryptoError> {
            Err(CryptoError::Entropy("device not ready".into()))
        }
    }

    #[test]
    fn generates_requested_length() {
        let gen = CodeGenerator::new(24).unwrap();
        let code = gen.generate().unwrap();
        assert_eq!(code.len(), 24);
        assert!(code.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
    }

    #[test]
    fn successive_codes_differ() {
        let gen = CodeGenerator::new(24).unwrap();
        assert_ne!(gen.generate().unwrap(), gen.generate().unwrap());
    }

    #[test]
    fn odd_or_zero_length_rejected() {
        assert!(matches!(
            CodeGenerator::new(23),
            Err(CryptoError::InvalidCodeLength(23))
        ));
        assert!(matches!(
            CodeGenerator::new(0),
            Err(CryptoError::InvalidCodeLength(0))
        ));
    }

    #[test]
    fn entropy_failure_propagates() {
        let gen = CodeGenerator::with_entropy(24, Box::new(Broken)).unwrap();
        assert!(matches!(gen.generate(), Err(CryptoError::Entropy(_))));
    }
}
