use crate::error::Result;
use crate::repo::RulesRepo;
use smsforward_core::ForwardRule;
use std::thread;
use std::time::Duration;

/// Polls the stored rule and yields it whenever it differs from the last
/// value seen. The first call yields the current value.
pub struct RuleWatcher<'a> {
    repo: RulesRepo<'a>,
    interval: Duration,
    last: Option<Option<ForwardRule>>,
}

impl<'a> RuleWatcher<'a> {
    pub fn new(repo: RulesRepo<'a>, interval: Duration) -> Self {
        Self {
            repo,
            interval,
            last: None,
        }
    }
}

impl Iterator for RuleWatcher<'_> {
    type Item = Result<Option<ForwardRule>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let current = match self.repo.load() {
                Ok(current) => current,
                Err(err) => return Some(Err(err)),
            };
            if self.last.as_ref() != Some(&current) {
                self.last = Some(current.clone());
                return Some(Ok(current));
            }
            thread::sleep(self.interval);
        }
    }
}
