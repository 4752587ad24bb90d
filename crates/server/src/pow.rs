use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

const CHALLENGE_TTL: Duration = Duration::from_secs(300);

/// 提交评价时的防刷 PoW。每个 challenge 只能在 TTL 内
/// 兑换一次。
#[derive(Clone)]
pub struct PowGuard {
    secrets: Arc<Mutex<HashMap<String, SystemTime>>>,
    difficulty: usize,
}

impl PowGuard {
    pub fn new(difficulty: usize) -> Self {
        Self {
            secrets: Arc::new(Mutex::new(HashMap::new())),
            difficulty,
        }
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    fn secrets(&self) -> MutexGuard<'_, HashMap<String, SystemTime>> {
        self.secrets.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn generate_challenge(&self) -> String {
        let secret = format!("{:x}", rand::random::<u128>());
        let now = SystemTime::now();
        let mut map = self.secrets();
        map.retain(|_, expiry| *expiry > now);
        map.insert(secret.clone(), now + CHALLENGE_TTL);
        secret
    }

    /// `response` 格式为 `secret|nonce`
    pub fn verify_response(&self, response: &str) -> bool {
        match response.split_once('|') {
            Some((secret, nonce)) => self.verify(secret, nonce),
            None => false,
        }
    }

    pub fn verify(&self, secret: &str, nonce: &str) -> bool {
        match self.secrets().remove(secret) {
            Some(expiry) if SystemTime::now() <= expiry => {}
            _ => return false,
        }

        let hash = hex::encode(Sha256::digest(format!("{}{}", secret, nonce)));
        hash.starts_with(&"0".repeat(self.difficulty))
    }
}
