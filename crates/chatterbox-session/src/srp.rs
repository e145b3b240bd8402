//! SRP-6a over the RFC 5054 2048-bit group with SHA-256.
//!
//! ```text
//! x = H(s | H(I ":" P))          v = g^x
//! k = H(N | PAD(g))              u = H(PAD(A) | PAD(B))
//! A = g^a                        S = (B - k·v)^(a + u·x)
//! K = H(S)                       M = H(H(N) xor H(g) | H(I) | s | A | B | K)
//! ```
//!
//! All arithmetic is mod `N`. Byte strings are big-endian; `PAD` left-pads
//! to the length of `N`.

use num_bigint::BigUint;
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::{Credentials, Ephemeral, Registration, SessionError, Srp};

/// RFC 5054 2048-bit group modulus, big-endian.
const N_2048: [u8; 256] = [
    0xAC, 0x6B, 0xDB, 0x41, 0x32, 0x4A, 0x9A, 0x9B, 0xF1, 0x66, 0xDE, 0x5E,
    0x13, 0x89, 0x58, 0x2F, 0xAF, 0x72, 0xB6, 0x65, 0x19, 0x87, 0xEE, 0x07,
    0xFC, 0x31, 0x92, 0x94, 0x3D, 0xB5, 0x60, 0x50, 0xA3, 0x73, 0x29, 0xCB,
    0xB4, 0xA0, 0x99, 0xED, 0x81, 0x93, 0xE0, 0x75, 0x77, 0x67, 0xA1, 0x3D,
    0xD5, 0x23, 0x12, 0xAB, 0x4B, 0x03, 0x31, 0x0D, 0xCD, 0x7F, 0x48, 0xA9,
    0xDA, 0x04, 0xFD, 0x50, 0xE8, 0x08, 0x39, 0x69, 0xED, 0xB7, 0x67, 0xB0,
    0xCF, 0x60, 0x95, 0x17, 0x9A, 0x16, 0x3A, 0xB3, 0x66, 0x1A, 0x05, 0xFB,
    0xD5, 0xFA, 0xAA, 0xE8, 0x29, 0x18, 0xA9, 0x96, 0x2F, 0x0B, 0x93, 0xB8,
    0x55, 0xF9, 0x79, 0x93, 0xEC, 0x97, 0x5E, 0xEA, 0xA8, 0x0D, 0x74, 0x0A,
    0xDB, 0xF4, 0xFF, 0x74, 0x73, 0x59, 0xD0, 0x41, 0xD5, 0xC3, 0x3E, 0xA7,
    0x1D, 0x28, 0x1E, 0x44, 0x6B, 0x14, 0x77, 0x3B, 0xCA, 0x97, 0xB4, 0x3A,
    0x23, 0xFB, 0x80, 0x16, 0x76, 0xBD, 0x20, 0x7A, 0x43, 0x6C, 0x64, 0x81,
    0xF1, 0xD2, 0xB9, 0x07, 0x87, 0x17, 0x46, 0x1A, 0x5B, 0x9D, 0x32, 0xE6,
    0x88, 0xF8, 0x77, 0x48, 0x54, 0x45, 0x23, 0xB5, 0x24, 0xB0, 0xD5, 0x7D,
    0x5E, 0xA7, 0x7A, 0x27, 0x75, 0xD2, 0xEC, 0xFA, 0x03, 0x2C, 0xFB, 0xDB,
    0xF5, 0x2F, 0xB3, 0x78, 0x61, 0x60, 0x27, 0x90, 0x04, 0xE5, 0x7A, 0xE6,
    0xAF, 0x87, 0x4E, 0x73, 0x03, 0xCE, 0x53, 0x29, 0x9C, 0xCC, 0x04, 0x1C,
    0x7B, 0xC3, 0x08, 0xD8, 0x2A, 0x56, 0x98, 0xF3, 0xA8, 0xD0, 0xC3, 0x82,
    0x71, 0xAE, 0x35, 0xF8, 0xE9, 0xDB, 0xFB, 0xB6, 0x94, 0xB5, 0xC8, 0x03,
    0xD8, 0x9F, 0x7A, 0xE4, 0x35, 0xDE, 0x23, 0x6D, 0x52, 0x5F, 0x54, 0x75,
    0x9B, 0x65, 0xE3, 0x72, 0xFC, 0xD6, 0x8E, 0xF2, 0x0F, 0xA7, 0x11, 0x1F,
    0x9E, 0x4A, 0xFF, 0x73,
];

const GENERATOR: u32 = 2;

/// Length in bytes of the random client secret `a`.
const SECRET_LEN: usize = 32;

/// Length in bytes of a registration salt.
const SALT_LEN: usize = 16;

/// Stock [`Srp`] implementation.
#[derive(Debug, Clone)]
pub struct Srp6a {
    n: BigUint,
    g: BigUint,
}

impl Srp6a {
    /// Uses the RFC 5054 2048-bit group, generator 2.
    pub fn new() -> Self {
        Self {
            n: BigUint::from_bytes_be(&N_2048),
            g: BigUint::from(GENERATOR),
        }
    }

    fn pad(&self, value: &BigUint) -> Vec<u8> {
        let len = self.n.bits().div_ceil(8) as usize;
        let bytes = value.to_bytes_be();
        let mut padded = vec![0u8; len.saturating_sub(bytes.len())];
        padded.extend_from_slice(&bytes);
        padded
    }

    fn multiplier(&self) -> BigUint {
        hash_to_int(&[&self.n.to_bytes_be(), &self.pad(&self.g)])
    }

    fn scrambler(&self, client_public: &BigUint, server_public: &BigUint) -> BigUint {
        hash_to_int(&[&self.pad(client_public), &self.pad(server_public)])
    }

    fn private_key(&self, credentials: &Credentials, salt: &[u8]) -> BigUint {
        let inner = hash(&[
            credentials.name.as_bytes(),
            b":",
            credentials.password.as_bytes(),
        ]);
        hash_to_int(&[salt, &inner])
    }
}

impl Default for Srp6a {
    fn default() -> Self {
        Self::new()
    }
}

impl Srp for Srp6a {
    fn initiate(&self) -> Result<Ephemeral, SessionError> {
        let secret: [u8; SECRET_LEN] = rand::rng().random();
        let a = BigUint::from_bytes_be(&secret);
        let public = self.g.modpow(&a, &self.n);

        if is_zero(&public) {
            return Err(SessionError::Srp("degenerate client ephemeral".into()));
        }

        Ok(Ephemeral {
            public: public.to_bytes_be(),
            secret: secret.to_vec(),
        })
    }

    fn complete(
        &self,
        ephemeral: &Ephemeral,
        credentials: &Credentials,
        salt: &[u8],
        server_public: &[u8],
    ) -> Result<Vec<u8>, SessionError> {
        let b_pub = BigUint::from_bytes_be(server_public);
        if is_zero(&(&b_pub % &self.n)) {
            return Err(SessionError::SafetyCheckFailed);
        }

        let a_pub = BigUint::from_bytes_be(&ephemeral.public);
        let a = BigUint::from_bytes_be(&ephemeral.secret);
        let u = self.scrambler(&a_pub, &b_pub);
        let x = self.private_key(credentials, salt);

        let kv = (self.multiplier() * self.g.modpow(&x, &self.n)) % &self.n;
        let base = ((&b_pub % &self.n) + &self.n - kv) % &self.n;
        let premaster = base.modpow(&(a + u * x), &self.n);

        Ok(hash(&[&self.pad(&premaster)]))
    }

    fn client_proof(
        &self,
        identity: &str,
        salt: &[u8],
        client_public: &[u8],
        server_public: &[u8],
        shared_key: &[u8],
    ) -> Result<Vec<u8>, SessionError> {
        let a_pub = BigUint::from_bytes_be(client_public);
        let b_pub = BigUint::from_bytes_be(server_public);
        if is_zero(&(&b_pub % &self.n)) || is_zero(&self.scrambler(&a_pub, &b_pub)) {
            return Err(SessionError::SafetyCheckFailed);
        }

        let h_n = hash(&[&self.n.to_bytes_be()]);
        let h_g = hash(&[&self.g.to_bytes_be()]);
        let h_ng: Vec<u8> = h_n.iter().zip(&h_g).map(|(n, g)| n ^ g).collect();
        let h_i = hash(&[identity.as_bytes()]);

        Ok(hash(&[
            &h_ng,
            &h_i,
            salt,
            client_public,
            server_public,
            shared_key,
        ]))
    }

    fn new_registration(
        &self,
        credentials: &Credentials,
    ) -> Result<Registration, SessionError> {
        let salt: [u8; SALT_LEN] = rand::rng().random();
        let x = self.private_key(credentials, &salt);
        let verifier = self.g.modpow(&x, &self.n);

        Ok(Registration {
            salt: salt.to_vec(),
            verifier: verifier.to_bytes_be(),
        })
    }
}

fn hash(parts: &[&[u8]]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().to_vec()
}

fn is_zero(value: &BigUint) -> bool {
    value.bits() == 0
}

fn hash_to_int(parts: &[&[u8]]) -> BigUint {
    BigUint::from_bytes_be(&hash(parts))
}
