//! What each role observed during a session

use std::fmt;

/// Which side of the exchange a report belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Initiator,
    Responder,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Initiator => write!(f, "initiator"),
            Role::Responder => write!(f, "responder"),
        }
    }
}

/// One message event, in the order the role performed it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exchange {
    Sent(String),
    Received(String),
}

/// Outcome of one role running to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleReport {
    pub role: Role,
    pub rounds: u32,
    pub transcript: Vec<Exchange>,
}

impl RoleReport {
    pub(crate) fn new(role: Role) -> Self {
        Self {
            role,
            rounds: 0,
            transcript: Vec::new(),
        }
    }

    /// Messages this role sent, in order
    pub fn sent(&self) -> Vec<&str> {
        self.transcript
            .iter()
            .filter_map(|e| match e {
                Exchange::Sent(m) => Some(m.as_str()),
                Exchange::Received(_) => None,
            })
            .collect()
    }

    /// Messages this role received, in order
    pub fn received(&self) -> Vec<&str> {
        self.transcript
            .iter()
            .filter_map(|e| match e {
                Exchange::Received(m) => Some(m.as_str()),
                Exchange::Sent(_) => None,
            })
            .collect()
    }

    /// True if sends and receives strictly alternate, starting with the
    /// direction this role speaks in first
    pub fn alternates(&self) -> bool {
        let sends_first = self.role == Role::Initiator;
        self.transcript.iter().enumerate().all(|(i, e)| {
            let expect_send = (i % 2 == 0) == sends_first;
            matches!(e, Exchange::Sent(_)) == expect_send
        })
    }
}

/// Both sides of a completed session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub initiator: RoleReport,
    pub responder: RoleReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_names() {
        assert_eq!(Role::Initiator.to_string(), "initiator");
        assert_eq!(Role::Responder.to_string(), "responder");
    }

    #[test]
    fn test_alternation_detects_double_send() {
        let mut report = RoleReport::new(Role::Initiator);
        report.transcript = vec![
            Exchange::Sent("PING".into()),
            Exchange::Sent("PING".into()),
            Exchange::Received("PONG".into()),
        ];
        assert!(!report.alternates());
    }

    #[test]
    fn test_responder_alternation_starts_with_receive() {
        let mut report = RoleReport::new(Role::Responder);
        report.transcript = vec![
            Exchange::Received("PING".into()),
            Exchange::Sent("PONG".into()),
        ];
        assert!(report.alternates());
        assert_eq!(report.sent(), vec!["PONG"]);
        assert_eq!(report.received(), vec!["PING"]);

        report.transcript.reverse();
        assert!(!report.alternates());
    }
}
