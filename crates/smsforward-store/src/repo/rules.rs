use crate::error::{Result, StoreError};
use rusqlite::{params, Connection, OptionalExtension};
use smsforward_core::{
    ForwardRule, PhoneNumber, RuleStore, Source, SourceKind, SourcePattern, UnifiedNumber,
    VisualNumber, RULE_ID,
};

type RuleRow = (
    i64,
    Option<String>,
    String,
    String,
    String,
    String,
    bool,
    i64,
    i64,
);

pub struct RulesRepo<'a> {
    conn: &'a Connection,
}

impl<'a> RulesRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn load(&self) -> Result<Option<ForwardRule>> {
        let row: Option<RuleRow> = self
            .conn
            .query_row(
                "SELECT id, source_kind, source_unified, source_visual,
                        destination_unified, destination_visual, activated,
                        created_at, updated_at
                 FROM forward_rules
                 WHERE id = ?1;",
                [RULE_ID],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                        row.get(6)?,
                        row.get(7)?,
                        row.get(8)?,
                    ))
                },
            )
            .optional()?;

        row.map(rule_from_row).transpose()
    }

    pub fn save(&self, rule: &ForwardRule) -> Result<i64> {
        if rule.id != RULE_ID {
            return Err(StoreError::InvalidRow(format!(
                "rule id must be {RULE_ID}, got {}",
                rule.id
            )));
        }

        let (source_kind, source_unified, source_visual) = match &rule.source {
            Some(source) => (
                Some(source.kind().as_str()),
                source.unified_text(),
                source.visual_text(),
            ),
            None => (None, "", ""),
        };
        let (destination_unified, destination_visual) = match &rule.destination {
            Some(number) => (number.unified.as_str(), number.visual.as_str()),
            None => ("", ""),
        };

        self.conn.execute(
            "INSERT OR REPLACE INTO forward_rules
             (id, source_kind, source_unified, source_visual,
              destination_unified, destination_visual, activated, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                rule.id,
                source_kind,
                source_unified,
                source_visual,
                destination_unified,
                destination_visual,
                rule.activated,
                rule.created_at,
                rule.updated_at
            ],
        )?;
        Ok(rule.id)
    }

    pub fn delete(&self, id: i64) -> Result<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM forward_rules WHERE id = ?1;", [id])?;
        Ok(removed)
    }

    pub fn count_rows(&self) -> Result<i64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM forward_rules;", [], |row| row.get(0))?;
        Ok(count)
    }
}

impl RuleStore for RulesRepo<'_> {
    type Error = StoreError;

    fn get(&self) -> Result<Option<ForwardRule>> {
        self.load()
    }

    fn upsert(&self, rule: &ForwardRule) -> Result<i64> {
        self.save(rule)
    }

    fn delete_by_id(&self, id: i64) -> Result<usize> {
        self.delete(id)
    }

    fn count(&self) -> Result<i64> {
        self.count_rows()
    }
}

fn rule_from_row(row: RuleRow) -> Result<ForwardRule> {
    let (
        id,
        source_kind,
        source_unified,
        source_visual,
        destination_unified,
        destination_visual,
        activated,
        created_at,
        updated_at,
    ) = row;

    let source = match source_kind.as_deref() {
        None => None,
        Some(kind) if kind == SourceKind::Literal.as_str() => Some(Source::Literal(PhoneNumber {
            unified: UnifiedNumber::from_stored(source_unified),
            visual: VisualNumber::from_stored(source_visual),
        })),
        Some(kind) if kind == SourceKind::Pattern.as_str() => {
            Some(Source::Pattern(SourcePattern::new(&source_unified)?))
        }
        Some(other) => {
            return Err(StoreError::InvalidRow(format!("unknown source kind {other}")));
        }
    };

    let destination = if destination_unified.is_empty() {
        None
    } else {
        Some(PhoneNumber {
            unified: UnifiedNumber::from_stored(destination_unified),
            visual: VisualNumber::from_stored(destination_visual),
        })
    };

    Ok(ForwardRule {
        id,
        source,
        destination,
        activated,
        created_at,
        updated_at,
    })
}
