use rocket::request::{FromRequest, Outcome, Request};

use crate::config::SecurityConfig;

/// Password check guarding destructive operations.
#[derive(Debug, Clone)]
pub struct DeleteGate {
    hash: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// No password configured; deletion is switched off.
    Disabled,
    Denied,
    Granted,
}

impl DeleteGate {
    pub fn new(hash: Option<String>) -> Self {
        DeleteGate { hash }
    }

    /// A configured hash is used as-is. A plaintext password is hashed once
    /// here so it never has to be compared directly.
    pub fn from_config(config: &SecurityConfig, cost: u32) -> Result<Self, String> {
        if let Some(hash) = config.delete_password_hash.as_deref().filter(|h| !h.is_empty()) {
            return Ok(DeleteGate::new(Some(hash.to_string())));
        }
        match config.delete_password.as_deref().filter(|p| !p.is_empty()) {
            Some(plain) => Ok(DeleteGate::new(Some(hash_password(plain, cost)?))),
            None => {
                log::warn!("No delete password configured; data deletion is disabled");
                Ok(DeleteGate::new(None))
            }
        }
    }

    pub fn enabled(&self) -> bool {
        self.hash.is_some()
    }

    pub fn check(&self, candidate: &str) -> GateDecision {
        match &self.hash {
            None => GateDecision::Disabled,
            Some(hash) if verify_password(candidate, hash) => GateDecision::Granted,
            Some(_) => GateDecision::Denied,
        }
    }
}

pub fn hash_password(password: &str, cost: u32) -> Result<String, String> {
    bcrypt::hash(password, cost).map_err(|e| e.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// Remote address of the caller, or "unknown" when Rocket can't tell.
pub struct ClientIp(pub String);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for ClientIp {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let ip = request
            .client_ip()
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Outcome::Success(ClientIp(ip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn security(plain: Option<&str>, hash: Option<String>) -> SecurityConfig {
        SecurityConfig {
            delete_password: plain.map(str::to_string),
            delete_password_hash: hash,
            ..SecurityConfig::default()
        }
    }

    #[test]
    fn test_plaintext_password_is_hashed() {
        let gate = DeleteGate::from_config(&security(Some("s3cret"), None), 4).unwrap();
        assert!(gate.enabled());
        assert_eq!(gate.check("s3cret"), GateDecision::Granted);
        assert_eq!(gate.check("S3cret"), GateDecision::Denied);
        assert_eq!(gate.check(""), GateDecision::Denied);
    }

    #[test]
    fn test_hash_wins_over_plaintext() {
        let hash = hash_password("from-hash", 4).unwrap();
        let gate = DeleteGate::from_config(&security(Some("from-plain"), Some(hash)), 4).unwrap();
        assert_eq!(gate.check("from-hash"), GateDecision::Granted);
        assert_eq!(gate.check("from-plain"), GateDecision::Denied);
    }

    #[test]
    fn test_no_password_disables() {
        let gate = DeleteGate::from_config(&security(None, None), 4).unwrap();
        assert!(!gate.enabled());
        assert_eq!(gate.check("anything"), GateDecision::Disabled);

        let blank = DeleteGate::from_config(&security(Some(""), Some(String::new())), 4).unwrap();
        assert!(!blank.enabled());
    }

    #[test]
    fn test_malformed_hash_denies() {
        let gate = DeleteGate::new(Some("not-a-bcrypt-hash".to_string()));
        assert_eq!(gate.check("not-a-bcrypt-hash"), GateDecision::Denied);
    }

    #[test]
    fn test_clone_checks_on_worker_thread() {
        let gate = DeleteGate::new(Some(hash_password("s3cret", 4).unwrap()));
        let g = gate.clone();
        let decision = std::thread::spawn(move || g.check("s3cret")).join().unwrap();
        assert_eq!(decision, GateDecision::Granted);
        assert_eq!(gate.check("wrong"), GateDecision::Denied);
    }
}
