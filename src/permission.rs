//! Camera permission check.
//!
//! The camera must not be bound until access is confirmed. The check
//! first asks for the current status and only prompts if access has not
//! already been granted.

/// Current state of camera access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    /// Access allowed.
    Granted,
    /// Access refused.
    Denied,
}

/// Source of truth for camera access.
pub trait PermissionProvider {
    /// Status without prompting.
    fn status(&self) -> PermissionStatus;

    /// Prompts for access and returns the answer.
    fn request(&mut self) -> PermissionStatus;
}

/// Returns true once access is granted, prompting if needed.
pub fn ensure_granted(provider: &mut dyn PermissionProvider) -> bool {
    if provider.status() == PermissionStatus::Granted {
        return true;
    }
    let answer = provider.request();
    tracing::info!(?answer, "Camera permission requested");
    answer == PermissionStatus::Granted
}

/// Fixed answer, set from the command line.
#[derive(Debug, Clone)]
pub struct StaticPermission {
    answer: PermissionStatus,
    prompted: bool,
    requests: u32,
}

impl StaticPermission {
    /// Already granted; never prompts.
    pub fn granted() -> Self {
        Self {
            answer: PermissionStatus::Granted,
            prompted: true,
            requests: 0,
        }
    }

    /// Not yet granted; a prompt returns `answer`.
    pub fn prompt(answer: PermissionStatus) -> Self {
        Self {
            answer,
            prompted: false,
            requests: 0,
        }
    }

    /// Number of prompts shown.
    pub fn requests(&self) -> u32 {
        self.requests
    }
}

impl PermissionProvider for StaticPermission {
    fn status(&self) -> PermissionStatus {
        if self.prompted {
            self.answer
        } else {
            PermissionStatus::Denied
        }
    }

    fn request(&mut self) -> PermissionStatus {
        self.requests += 1;
        self.prompted = true;
        self.answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_granted_skips_prompt() {
        let mut permission = StaticPermission::granted();
        assert!(ensure_granted(&mut permission));
        assert_eq!(permission.requests(), 0);
    }

    #[test]
    fn test_prompt_then_remember() {
        let mut permission = StaticPermission::prompt(PermissionStatus::Granted);
        assert!(ensure_granted(&mut permission));
        assert!(ensure_granted(&mut permission));
        assert_eq!(permission.requests(), 1);
    }

    #[test]
    fn test_denied_prompts_every_time() {
        let mut permission = StaticPermission::prompt(PermissionStatus::Denied);
        assert!(!ensure_granted(&mut permission));
        assert!(!ensure_granted(&mut permission));
        assert_eq!(permission.requests(), 2);
    }
}
