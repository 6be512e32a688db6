use crate::domain::{normalize, ForwardRule, Region, Source, SourcePattern, RULE_ID};
use crate::error::CoreError;
use crate::ports::{ListenerControl, RuleStore};
use crate::rules::RedirectState;
use tracing::{debug, info};

/// Owns the lifecycle of the forwarding rule. Mutating operations take
/// `&mut self` so a controller is the single writer of its store.
pub struct RedirectController<'a, S, L> {
    store: &'a S,
    listener: &'a L,
    region: Region,
    advanced_mode: bool,
}

impl<'a, S, L> RedirectController<'a, S, L>
where
    S: RuleStore,
    L: ListenerControl,
{
    pub fn new(store: &'a S, listener: &'a L, region: Region) -> Self {
        Self {
            store,
            listener,
            region,
            advanced_mode: false,
        }
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn advanced_mode(&self) -> bool {
        self.advanced_mode
    }

    pub fn set_advanced_mode(&mut self, enabled: bool) {
        self.advanced_mode = enabled;
    }

    pub fn toggle_mode(&mut self) -> bool {
        self.advanced_mode = !self.advanced_mode;
        self.advanced_mode
    }

    pub fn rule(&self) -> Result<Option<ForwardRule>, CoreError> {
        self.store.get().map_err(CoreError::store)
    }

    /// Always derived from a fresh read of the store.
    pub fn current_state(&self) -> Result<RedirectState, CoreError> {
        Ok(RedirectState::of(self.rule()?.as_ref()))
    }

    /// Sets the source and returns what to display for it. In advanced mode
    /// `raw` is kept verbatim as a pattern.
    pub fn set_source(&mut self, now: i64, raw: &str) -> Result<String, CoreError> {
        let source = self.parse_source(raw)?;
        let visual = source.visual_text().to_string();

        let mut rule = self.editable_rule(now)?;
        debug!(kind = source.kind().as_str(), "source updated");
        rule.source = Some(source);
        rule.updated_at = now;
        self.store.upsert(&rule).map_err(CoreError::store)?;
        Ok(visual)
    }

    pub fn set_destination(&mut self, now: i64, raw: &str) -> Result<String, CoreError> {
        let destination = normalize(raw, &self.region)?;
        let visual = destination.visual.as_str().to_string();

        let mut rule = self.editable_rule(now)?;
        debug!("destination updated");
        rule.destination = Some(destination);
        rule.updated_at = now;
        self.store.upsert(&rule).map_err(CoreError::store)?;
        Ok(visual)
    }

    /// Arms the stored rule. Nothing is written when validation fails.
    pub fn activate(&mut self, now: i64) -> Result<ForwardRule, CoreError> {
        self.activate_with(now, None, None)
    }

    /// Arms a rule built from the stored one with `source` and `destination`
    /// replaced when given. Checks run in order: presence, parsing, then
    /// source against destination. The rule is written once, armed, and only
    /// when every check passes.
    pub fn activate_with(
        &mut self,
        now: i64,
        source: Option<&str>,
        destination: Option<&str>,
    ) -> Result<ForwardRule, CoreError> {
        let stored = self.rule()?;
        if let Some(rule) = stored.as_ref().filter(|rule| rule.activated) {
            if source.is_none() && destination.is_none() {
                return Ok(rule.clone());
            }
            return Err(CoreError::RuleArmed);
        }

        let present = |inline: Option<&str>, stored_set: bool| match inline {
            Some(raw) => !raw.trim().is_empty(),
            None => stored_set,
        };
        let stored_source = stored.as_ref().is_some_and(|rule| rule.source.is_some());
        let stored_destination = stored
            .as_ref()
            .is_some_and(|rule| rule.destination.is_some());
        if !present(source, stored_source) {
            return Err(CoreError::EmptySource);
        }
        if !present(destination, stored_destination) {
            return Err(CoreError::EmptyDestination);
        }

        let mut rule = stored.unwrap_or_else(|| ForwardRule::new(now));
        if let Some(raw) = source {
            rule.source = Some(self.parse_source(raw)?);
        }
        if let Some(raw) = destination {
            rule.destination = Some(normalize(raw, &self.region)?);
        }
        rule.validate_for_activation()?;

        rule.activated = true;
        rule.updated_at = now;
        self.store.upsert(&rule).map_err(CoreError::store)?;
        self.listener.start_listening();
        info!("forwarding armed");
        Ok(rule)
    }

    /// Deletes the rule and stops the listener. Returns whether a rule existed.
    pub fn deactivate(&mut self) -> Result<bool, CoreError> {
        let removed = self
            .store
            .delete_by_id(RULE_ID)
            .map_err(CoreError::store)?;
        self.listener.stop_listening();
        if removed > 0 {
            info!("forwarding disabled");
        }
        Ok(removed > 0)
    }

    fn parse_source(&self, raw: &str) -> Result<Source, CoreError> {
        if self.advanced_mode {
            Ok(Source::Pattern(SourcePattern::new(raw)?))
        } else {
            Ok(Source::Literal(normalize(raw, &self.region)?))
        }
    }

    fn editable_rule(&self, now: i64) -> Result<ForwardRule, CoreError> {
        match self.rule()? {
            Some(rule) if rule.activated => Err(CoreError::RuleArmed),
            Some(rule) => Ok(rule),
            None => Ok(ForwardRule::new(now)),
        }
    }
}
