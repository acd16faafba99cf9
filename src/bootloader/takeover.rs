use crate::hal::Deadline;

/// Deadline after which the existing application is started.
///
/// Armed on construction. Once disarmed it stays disarmed: there is no way
/// to start the underlying deadline again.
pub struct Takeover<T> {
    deadline: T,
    armed: bool,
}

impl<T: Deadline> Takeover<T> {
    pub fn arm(mut deadline: T) -> Self {
        deadline.start();
        Self {
            deadline,
            armed: true,
        }
    }

    /// Wrap a deadline that is already counting.
    pub fn running(deadline: T) -> Self {
        Self {
            deadline,
            armed: true,
        }
    }

    pub fn disarm(&mut self) {
        if self.armed {
            self.deadline.cancel();
            self.armed = false;
        }
    }

    pub fn expired(&mut self) -> bool {
        self.armed && self.deadline.expired()
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }
}
